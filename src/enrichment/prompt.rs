//! Prompt text and response schemas for the enrichment requests.

use serde_json::{json, Value};

use crate::thought::types::Thought;

pub fn classify_prompt(text: &str) -> String {
    format!(
        "Read the note below. Give it a short descriptive title and a few lowercase \
         keyword tags for organizing it, and repeat the note text unchanged.\n\n\
         Note:\n---\n{text}\n---\n"
    )
}

pub fn classify_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "Concise descriptive title, 3 to 7 words."
            },
            "content": {
                "type": "STRING",
                "description": "The note text exactly as given."
            },
            "tags": {
                "type": "ARRAY",
                "description": "3 to 5 lowercase keyword tags.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["title", "content", "tags"]
    })
}

pub fn synthesis_prompt(query: &str, thoughts: &[Thought]) -> String {
    let context: String = thoughts
        .iter()
        .map(|t| {
            format!(
                "ID: {}\nTitle: {}\nContent: {}\nTags: [{}]\n---\n",
                t.id,
                t.title,
                t.content,
                t.tags.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You help a person make sense of their own notes. Using only the notes below, \
         answer their question with a thorough summary, and list the ID of every note \
         you drew on.\n\nQuestion: \"{query}\"\n\nNotes:\n---\n{context}\n---\n"
    )
}

pub fn synthesis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "Answer to the question, grounded in the notes."
            },
            "sourceIds": {
                "type": "ARRAY",
                "description": "IDs of the notes used.",
                "items": { "type": "STRING" }
            }
        },
        "required": ["summary", "sourceIds"]
    })
}

pub fn daily_summary_prompt(theme: &str, thoughts: &[Thought]) -> String {
    let context = thoughts
        .iter()
        .map(|t| format!("- {}", t.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "These notes are all about \"{theme}\". Write a short reflection of two or three \
         sentences that captures what they add up to.\n\n\
         Notes on \"{theme}\":\n---\n{context}\n---\n"
    )
}

pub fn daily_summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "theme": {
                "type": "STRING",
                "description": "The theme the reflection is about."
            },
            "summary": {
                "type": "STRING",
                "description": "Two or three sentence reflection."
            }
        },
        "required": ["theme", "summary"]
    })
}
