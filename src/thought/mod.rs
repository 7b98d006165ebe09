pub mod store;
pub mod types;
pub mod views;

/// Generate a client-side id: UUID v7, time-ordered with a random tail.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Current time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Split pasted multi-note text into note blocks separated by blank lines.
pub fn split_notes(text: &str) -> Vec<String> {
    let mut notes = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                notes.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        notes.push(current.join("\n"));
    }
    notes
}
