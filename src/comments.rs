//! Per-section comment threads.
//!
//! All threads live in one JSON document in the store. Every operation
//! loads the document, applies its change and writes it back. Timestamps
//! are Unix milliseconds and "now" is passed in by the caller.

use crate::store::{load_or_default, save_json, KeyValueStore, StoreError, COMMENTS_KEY};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;
const YEAR_MS: i64 = 31_536_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub section_id: String,
    pub author: String,
    pub timestamp: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub edited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub section_id: String,
    pub comments: Vec<Comment>,
}

/// Builds a comment id of the form `comment-<millis>-<9 base36 chars>`.
pub fn generate_comment_id(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("comment-{}-{}", now.timestamp_millis(), suffix)
}

pub fn load_comments<S: KeyValueStore + ?Sized>(store: &S) -> Vec<CommentThread> {
    load_or_default(store, COMMENTS_KEY)
}

pub fn save_comments<S: KeyValueStore + ?Sized>(
    store: &mut S,
    threads: &[CommentThread],
) -> Result<(), StoreError> {
    save_json(store, COMMENTS_KEY, threads)
}

/// Comments of one section, oldest first.
pub fn section_comments<S: KeyValueStore + ?Sized>(store: &S, section_id: &str) -> Vec<Comment> {
    load_comments(store)
        .into_iter()
        .find(|thread| thread.section_id == section_id)
        .map(|thread| thread.comments)
        .unwrap_or_default()
}

/// Appends a comment to a section, creating its thread if needed.
pub fn add_comment<S: KeyValueStore + ?Sized>(
    store: &mut S,
    section_id: &str,
    author: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Comment, StoreError> {
    let mut threads = load_comments(&*store);
    let comment = Comment {
        id: generate_comment_id(now),
        section_id: section_id.to_string(),
        author: author.to_string(),
        timestamp: now.timestamp_millis(),
        content: content.to_string(),
        edited: false,
        edited_at: None,
    };

    match threads.iter_mut().find(|thread| thread.section_id == section_id) {
        Some(thread) => thread.comments.push(comment.clone()),
        None => threads.push(CommentThread {
            section_id: section_id.to_string(),
            comments: vec![comment.clone()],
        }),
    }

    save_comments(store, &threads)?;
    tracing::info!(section = section_id, id = %comment.id, "Added comment");
    Ok(comment)
}

/// Replaces a comment's content and marks it edited. `None` when no comment
/// has this id.
pub fn edit_comment<S: KeyValueStore + ?Sized>(
    store: &mut S,
    comment_id: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Option<Comment>, StoreError> {
    let mut threads = load_comments(&*store);

    let edited = threads
        .iter_mut()
        .flat_map(|thread| thread.comments.iter_mut())
        .find(|comment| comment.id == comment_id)
        .map(|comment| {
            comment.content = content.to_string();
            comment.edited = true;
            comment.edited_at = Some(now.timestamp_millis());
            comment.clone()
        });

    if edited.is_some() {
        save_comments(store, &threads)?;
    }
    Ok(edited)
}

/// Removes a comment; returns whether one was found. Emptied threads are
/// kept.
pub fn delete_comment<S: KeyValueStore + ?Sized>(
    store: &mut S,
    comment_id: &str,
) -> Result<bool, StoreError> {
    let mut threads = load_comments(&*store);

    for thread in threads.iter_mut() {
        if let Some(index) = thread.comments.iter().position(|c| c.id == comment_id) {
            thread.comments.remove(index);
            save_comments(store, &threads)?;
            return Ok(true);
        }
    }

    Ok(false)
}

pub fn comment_count<S: KeyValueStore + ?Sized>(store: &S, section_id: &str) -> usize {
    section_comments(store, section_id).len()
}

/// Ids of sections that have at least one comment.
pub fn sections_with_comments<S: KeyValueStore + ?Sized>(store: &S) -> Vec<String> {
    load_comments(store)
        .into_iter()
        .filter(|thread| !thread.comments.is_empty())
        .map(|thread| thread.section_id)
        .collect()
}

/// Relative display time: `Just now`, `5m ago`, `3h ago`, `2d ago`, then a
/// calendar date (with the year once it is more than a year old).
pub fn format_timestamp(timestamp: i64, now: DateTime<Utc>) -> String {
    let now_ms = now.timestamp_millis();
    let diff = now_ms - timestamp;

    let minutes = diff.div_euclid(MINUTE_MS);
    let hours = diff.div_euclid(HOUR_MS);
    let days = diff.div_euclid(DAY_MS);

    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    if days < 7 {
        return format!("{}d ago", days);
    }

    let date = match DateTime::<Utc>::from_timestamp_millis(timestamp) {
        Some(date) => date,
        None => return "Unknown".to_string(),
    };
    if timestamp < now_ms - YEAR_MS {
        date.format("%b %-d, %Y").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}
