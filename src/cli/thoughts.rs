use anyhow::Result;

use thoughtweave::session::Session;
use thoughtweave::thought::types::Thought;

use super::{preview, report_write};

/// Classify `text` and store it as a new thought.
pub async fn add(session: &Session, text: &str) -> Result<()> {
    let committed = session.add_thought(text).await?;
    report_write(&committed.write);
    print_thought(&committed.value);
    Ok(())
}

/// List thoughts, optionally narrowed by a search term or a tag.
pub fn list(session: &Session, filter: Option<&str>, tag: Option<&str>) -> Result<()> {
    match (filter, tag) {
        (_, Some(tag)) => {
            session.filter_by_tag(tag);
        }
        (Some(filter), None) => {
            session.commit_search(filter);
        }
        (None, None) => {}
    }

    let visible = session.visible_thoughts();
    if visible.is_empty() {
        println!("No thoughts found.");
        return Ok(());
    }

    let active = session.active_filter();
    if active.is_empty() {
        println!("{} thought(s)\n", visible.len());
    } else {
        println!("{} thought(s) matching \"{active}\"\n", visible.len());
    }
    for thought in &visible {
        print_thought(thought);
    }
    Ok(())
}

/// Print the tag cloud, most frequent first.
pub fn tags(session: &Session, limit: Option<usize>) -> Result<()> {
    let mut cloud = session.tag_cloud();
    if let Some(limit) = limit {
        cloud.truncate(limit);
    }
    if cloud.is_empty() {
        println!("No tags yet.");
        return Ok(());
    }

    let width = cloud.iter().map(|t| t.tag.chars().count()).max().unwrap_or(0);
    for entry in &cloud {
        println!("  {:<width$}  {}", entry.tag, entry.count);
    }
    Ok(())
}

/// Ask a question across all thoughts and show the cited sources.
pub async fn synthesize(session: &Session, query: &str) -> Result<()> {
    let answer = session.synthesize(query).await?;
    println!("{}\n", answer.summary);

    if answer.sources.is_empty() {
        println!("(no sources cited)");
        return Ok(());
    }
    println!("Sources:");
    for source in &answer.sources {
        println!("  - {} [{}]", source.title, source.id);
    }
    Ok(())
}

fn print_thought(thought: &Thought) {
    let tags = if thought.tags.is_empty() {
        String::new()
    } else {
        format!(
            "  {}",
            thought
                .tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    println!("  {} ({}){tags}", thought.title, thought.created_at);
    println!("     {}", preview(&thought.content, 120));
    println!("     id: {}", thought.id);
    println!();
}
