use std::collections::{HashMap, VecDeque};
use std::time::Instant;

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// Bounded in-process cache: a `HashMap` for O(1) lookup plus a recency
/// deque for LRU eviction, the same two-structure shape the rolling window
/// uses for its O(1) max tracking rather than reaching for an LRU crate.
pub struct L1Cache {
    entries: HashMap<String, Entry>,
    recency: VecDeque<String>,
    capacity: usize,
}

impl L1Cache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            capacity,
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(key.to_string());
    }

    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            if let Some(pos) = self.recency.iter().position(|k| k == key) {
                self.recency.remove(pos);
            }
            return None;
        }
        self.touch(key);
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value, ttl: std::time::Duration) {
        self.entries.insert(
            key.to_string(),
            Entry { value, expires_at: Instant::now() + ttl },
        );
        self.touch(key);
        self.evict_over_capacity();
    }

    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
    }

    pub fn invalidate_by_prefix(&mut self, prefix: &str) {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in doomed {
            self.delete(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }
}
