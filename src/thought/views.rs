//! Derived views over the thought set.
//!
//! Everything here is a pure function of its inputs and is recomputed on demand.
//! Two different tag-matching rules live in this module and must not be conflated:
//! [`filter_thoughts`] matches `#tag` filters by *substring*, while
//! [`thoughts_for_theme`] requires *exact* case-insensitive equality.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::thought::types::{ResolvedSynthesis, SynthesisResult, TagAggregate, Thought};

/// Count tags case-insensitively, highest count first. Ties keep first-seen order.
pub fn aggregate_tags(thoughts: &[Thought]) -> Vec<TagAggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut aggregates: Vec<TagAggregate> = Vec::new();

    for thought in thoughts {
        for tag in &thought.tags {
            let key = tag.to_lowercase();
            match index.get(&key) {
                Some(&i) => aggregates[i].count += 1,
                None => {
                    index.insert(key.clone(), aggregates.len());
                    aggregates.push(TagAggregate { tag: key, count: 1 });
                }
            }
        }
    }

    // sort_by is stable
    aggregates.sort_by(|a, b| b.count.cmp(&a.count));
    tracing::debug!(distinct_tags = aggregates.len(), "tags aggregated");
    aggregates
}

/// Apply a search filter. `#foo` matches tags containing `foo`; anything else matches
/// title or content. Blank filters return the full sequence.
pub fn filter_thoughts<'a>(thoughts: &'a [Thought], filter: &str) -> Vec<&'a Thought> {
    if filter.trim().is_empty() {
        return thoughts.iter().collect();
    }

    let needle = filter.to_lowercase();
    if let Some(tag) = needle.strip_prefix('#') {
        return thoughts
            .iter()
            .filter(|t| t.tags.iter().any(|candidate| candidate.to_lowercase().contains(tag)))
            .collect();
    }

    thoughts
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle) || t.content.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Candidate themes: the top `limit` tags, leaving out `exclude` unless it is the only tag.
pub fn theme_candidates<'a>(
    aggregates: &'a [TagAggregate],
    exclude: Option<&str>,
    limit: usize,
) -> Vec<&'a TagAggregate> {
    let excluded = exclude.map(str::to_lowercase);
    let available: Vec<&TagAggregate> = aggregates
        .iter()
        .filter(|a| excluded.as_deref() != Some(a.tag.as_str()))
        .collect();

    let pool = if available.is_empty() {
        aggregates.iter().collect()
    } else {
        available
    };
    pool.into_iter().take(limit).collect()
}

/// Pick a theme uniformly among the candidates. `None` when there are no tags at all.
pub fn select_theme<R: Rng + ?Sized>(
    aggregates: &[TagAggregate],
    exclude: Option<&str>,
    limit: usize,
    rng: &mut R,
) -> Option<String> {
    theme_candidates(aggregates, exclude, limit)
        .choose(rng)
        .map(|a| a.tag.clone())
}

/// Every thought carrying `theme` as a tag (exact, case-insensitive).
pub fn thoughts_for_theme(thoughts: &[Thought], theme: &str) -> Vec<Thought> {
    thoughts.iter().filter(|t| t.has_tag(theme)).cloned().collect()
}

/// Resolve cited ids to thoughts, silently dropping ids that no longer exist.
pub fn resolve_sources(result: &SynthesisResult, thoughts: &[Thought]) -> ResolvedSynthesis {
    let sources: Vec<Thought> = result
        .source_ids
        .iter()
        .filter_map(|id| thoughts.iter().find(|t| &t.id == id).cloned())
        .collect();

    let dropped = result.source_ids.len() - sources.len();
    if dropped > 0 {
        tracing::debug!(dropped, "synthesis cited unknown thought ids");
    }

    ResolvedSynthesis {
        summary: result.summary.clone(),
        sources,
    }
}
