//! Deterministic head/tail compression with importance rescue

use crate::types::{reduction_ratio, CompressionOutcome};
use convotrim_core::{scorer, CompressionConfig, Message};

/// Bound the number of messages while keeping the conversation's edges.
///
/// Keeps the first `keep_first` and last `keep_last` messages verbatim,
/// rescues the `max_important` highest scoring messages from the middle in
/// their original order, and records everything else as one
/// [`Message::CompressionMarker`] placed just before the tail.
pub fn compress(messages: &[Message], config: &CompressionConfig) -> CompressionOutcome {
    let original = messages.len();
    if original <= config.threshold || config.keep_first + config.keep_last >= original {
        return CompressionOutcome {
            messages: messages.to_vec(),
            was_compressed: false,
            ratio: 0.0,
        };
    }

    let head = &messages[..config.keep_first];
    let tail_start = original - config.keep_last;
    let middle = &messages[config.keep_first..tail_start];
    let tail = &messages[tail_start..];

    let important = select_important(middle, config.max_important);
    let dropped = middle.len() - important.len();

    let mut result = Vec::with_capacity(head.len() + important.len() + 1 + tail.len());
    result.extend_from_slice(head);
    result.extend(important.iter().map(|&i| middle[i].clone()));
    if dropped > 0 {
        result.push(Message::CompressionMarker {
            dropped_count: dropped,
        });
    }
    result.extend_from_slice(tail);

    let ratio = reduction_ratio(original, result.len());
    tracing::debug!(
        original,
        compressed = result.len(),
        dropped,
        ratio,
        "compressed message window"
    );

    CompressionOutcome {
        messages: result,
        was_compressed: true,
        ratio,
    }
}

/// Indices of the top-scoring messages, in chronological order
fn select_important(middle: &[Message], limit: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = middle
        .iter()
        .enumerate()
        .map(|(i, m)| (i, scorer::score(m)))
        .collect();

    // Stable sort keeps earlier messages first among equal scores
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    let mut indices: Vec<usize> = scored.into_iter().map(|(i, _)| i).collect();
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn conversation(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                let at = start() + Duration::seconds(i as i64);
                if i % 2 == 0 {
                    Message::user(format!("note {}", i), at)
                } else {
                    Message::model(format!("ack {}", i), at)
                }
            })
            .collect()
    }

    #[test]
    fn test_identity_at_threshold() {
        let config = CompressionConfig::default();
        for len in [0, 1, 12, 20] {
            let messages = conversation(len);
            let outcome = compress(&messages, &config);
            assert!(!outcome.was_compressed);
            assert_eq!(outcome.messages, messages);
            assert_eq!(outcome.ratio, 0.0);
        }
    }

    #[test]
    fn test_boundaries_preserved() {
        let config = CompressionConfig::default();
        let messages = conversation(40);
        let outcome = compress(&messages, &config);

        assert!(outcome.was_compressed);
        assert_eq!(&outcome.messages[..2], &messages[..2]);
        let n = outcome.messages.len();
        assert_eq!(&outcome.messages[n - 10..], &messages[30..]);
    }

    #[test]
    fn test_marker_counts_dropped_messages() {
        let config = CompressionConfig::default();
        let messages = conversation(25);
        let outcome = compress(&messages, &config);

        // 2 head + 3 important + marker + 10 tail
        assert_eq!(outcome.messages.len(), 16);
        assert_eq!(
            outcome.messages[5],
            Message::CompressionMarker { dropped_count: 10 }
        );
        assert!((outcome.ratio - 9.0 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_important_messages_rescued_in_order() {
        let config = CompressionConfig::default();
        let mut messages = conversation(30);
        messages[12] = Message::user(
            "Important: remember the solution to the error?",
            start() + Duration::seconds(12),
        );
        messages[5] = Message::user("why does it fail?", start() + Duration::seconds(5));

        let outcome = compress(&messages, &config);
        let rescued = &outcome.messages[2..5];
        let pos_question = rescued.iter().position(|m| *m == messages[5]).unwrap();
        let pos_important = rescued.iter().position(|m| *m == messages[12]).unwrap();
        assert!(pos_question < pos_important);
    }

    #[test]
    fn test_no_marker_when_middle_fits() {
        let config = CompressionConfig {
            keep_first: 2,
            keep_last: 10,
            max_important: 5,
            threshold: 10,
        };
        let messages = conversation(15);
        let outcome = compress(&messages, &config);
        assert!(outcome.was_compressed);
        assert_eq!(outcome.messages, messages);
        assert!(outcome.messages.iter().all(Message::is_real));
    }

    #[test]
    fn test_second_pass_is_noop() {
        let config = CompressionConfig::default();
        let first = compress(&conversation(50), &config);
        let second = compress(&first.messages, &config);
        assert!(!second.was_compressed);
        assert_eq!(second.messages, first.messages);
    }

    #[test]
    fn test_real_messages_stay_chronological() {
        let config = CompressionConfig::default();
        let outcome = compress(&conversation(60), &config);
        let stamps: Vec<_> = outcome.messages.iter().filter_map(Message::timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
