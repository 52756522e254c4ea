//! Trimming of linked side-conversations

use convotrim_core::{scorer, LinkedConfig, LinkedContext, Message};
use std::collections::HashSet;

const LONG_MESSAGE_CHARS: usize = 100;

/// Reduce each linked conversation to its tail plus a few notable messages.
///
/// Only the first `max_contexts` contexts are kept. Each keeps its last
/// `recent` messages and up to `max_important` older messages that ask a
/// question, say "important", or are long. The result holds at most
/// `max_messages` messages in chronological order; when over the cap, the
/// oldest of the recent messages give way. Inputs are never modified.
pub fn optimize_linked(contexts: &[LinkedContext], config: &LinkedConfig) -> Vec<LinkedContext> {
    contexts
        .iter()
        .take(config.max_contexts)
        .map(|context| {
            let messages = trim_context(&context.messages, config);
            tracing::debug!(
                chat_id = %context.chat_id,
                original = context.messages.len(),
                kept = messages.len(),
                "trimmed linked context"
            );
            LinkedContext {
                chat_id: context.chat_id.clone(),
                subject: context.subject.clone(),
                messages,
            }
        })
        .collect()
}

fn is_notable(message: &Message) -> bool {
    let text = message.text();
    text.contains('?')
        || text.to_lowercase().contains("important")
        || text.chars().count() > LONG_MESSAGE_CHARS
}

fn trim_context(messages: &[Message], config: &LinkedConfig) -> Vec<Message> {
    let recent_start = messages.len().saturating_sub(config.recent);

    let mut important: Vec<(usize, f64)> = messages[..recent_start]
        .iter()
        .enumerate()
        .filter(|(_, m)| is_notable(m))
        .map(|(i, m)| (i, scorer::score(m)))
        .collect();
    important.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    important.truncate(config.max_important);

    // Important picks first so the cap trims recent messages, oldest first
    let mut seen_text: HashSet<&str> = HashSet::new();
    let mut picked: Vec<usize> = Vec::new();
    for i in important.iter().map(|(i, _)| *i) {
        if seen_text.insert(messages[i].text()) {
            picked.push(i);
        }
    }
    let mut recent: Vec<usize> = Vec::new();
    for i in recent_start..messages.len() {
        if seen_text.insert(messages[i].text()) {
            recent.push(i);
        }
    }

    let room = config.max_messages.saturating_sub(picked.len());
    let skip = recent.len().saturating_sub(room);
    picked.extend(recent.into_iter().skip(skip));
    picked.truncate(config.max_messages);
    picked.sort_unstable();
    picked.into_iter().map(|i| messages[i].clone()).collect()
}
