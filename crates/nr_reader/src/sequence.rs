use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Identifies one request issued for a logical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: String,
    seq: u64,
}

impl RequestTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Hands out monotonically increasing sequence numbers per key so that a
/// response can be dropped when a newer request for the same key exists.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    latest: Arc<Mutex<HashMap<String, u64>>>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: &str) -> RequestTicket {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        let seq = latest.entry(key.to_string()).or_insert(0);
        *seq += 1;
        RequestTicket { key: key.to_string(), seq: *seq }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        latest.get(&ticket.key).copied() == Some(ticket.seq)
    }

    /// Runs `fut` under a fresh ticket; `None` if a newer request for `key`
    /// was issued before it completed.
    pub async fn run<F, T>(&self, key: &str, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let ticket = self.issue(key);
        let output = fut.await;
        if self.is_current(&ticket) {
            Some(output)
        } else {
            tracing::debug!("Discarding stale response for {} (seq {})", ticket.key, ticket.seq);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tickets_per_key() {
        let sequencer = RequestSequencer::new();
        let a1 = sequencer.issue("post-a");
        let b1 = sequencer.issue("post-b");
        let a2 = sequencer.issue("post-a");

        assert_eq!(a2.seq(), 2);
        assert!(!sequencer.is_current(&a1));
        assert!(sequencer.is_current(&a2));
        assert!(sequencer.is_current(&b1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_is_discarded() {
        let sequencer = RequestSequencer::new();

        let slow = {
            let sequencer = sequencer.clone();
            tokio::spawn(async move {
                sequencer
                    .run("post-1", async {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        "old"
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fast = sequencer.run("post-1", async { "new" }).await;

        assert_eq!(fast, Some("new"));
        assert_eq!(slow.await.unwrap(), None);
    }
}
