use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncReadExt;

use thoughtweave::session::Session;

use super::report_write;

/// Import blank-line separated notes from a file, or stdin when `file` is `-`.
pub async fn import(session: &Session, file: &Path) -> Result<()> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("failed to read notes from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read import file: {}", file.display()))?
    };

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} notes")?
            .progress_chars("##-"),
    );

    let bar = pb.clone();
    let report = session
        .import_notes(&text, move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await?;
    pb.finish_and_clear();

    for committed in &report.imported {
        report_write(&committed.write);
    }
    println!(
        "Imported {} of {} note(s).",
        report.imported.len(),
        report.total
    );
    if let Some((index, error)) = &report.failed {
        eprintln!("Stopped at note {}: {error}", index + 1);
    }
    Ok(())
}

/// Write all thoughts and favorites as JSON to stdout.
pub fn export(session: &Session) -> Result<()> {
    let snapshot = session.snapshot();
    let json = serde_json::to_string_pretty(&snapshot)?;
    println!("{json}");

    eprintln!(
        "Exported {} thoughts and {} favorites.",
        snapshot.thoughts.len(),
        snapshot.favorites.len()
    );
    Ok(())
}
