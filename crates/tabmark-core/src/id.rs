use std::sync::atomic::{AtomicI64, Ordering};

/// Time-based id source for tabs and bookmarks.
///
/// Ids are epoch milliseconds rendered as decimal strings. Two ids minted in
/// the same millisecond are bumped so every id is strictly greater than the
/// previous one.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}
