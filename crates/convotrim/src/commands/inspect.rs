use chrono::{Duration, Utc};
use convotrim_core::{inspect, Message};

/// Placeholder history so reference resolution has something to index into
fn synthetic_history(len: usize) -> Vec<Message> {
    let start = Utc::now() - Duration::minutes(len as i64);
    (0..len)
        .map(|i| Message::user(format!("message {}", i + 1), start + Duration::minutes(i as i64)))
        .collect()
}

pub fn run(query: &str, history_len: usize) -> anyhow::Result<()> {
    let history = synthetic_history(history_len);
    let analysis = inspect(query, &history);

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
