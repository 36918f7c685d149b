//! Content-addressed result cache.
//!
//! Keys are SHA-256 digests over the whitespace-trimmed input plus the model
//! identifier, so "  hello  " and "hello" land on the same entry while the
//! same input against a different model does not. Capacity is injected at
//! construction; `None` means unbounded. Eviction is least-recently-used.
//!
//! The cache also holds a fingerprint of the generation parameters in force.
//! Replacing the parameters replaces the fingerprint, and any change drops
//! every entry wholesale so no result produced under old parameters can be
//! served as current.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::pipeline::types::{GenerationOptions, UiDescription};

/// Cache key: SHA-256 over trimmed input, a separator byte, and the model.
pub fn cache_key(input: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.trim().as_bytes());
    hasher.update([0x1f]);
    hasher.update(model.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest of the serialized generation parameters.
pub fn params_fingerprint(options: &GenerationOptions) -> String {
    // GenerationOptions is a flat struct of primitives; serialization
    // cannot fail.
    let serialized = serde_json::to_string(options).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

struct CachedResult {
    description: UiDescription,
    created_at: DateTime<Utc>,
    last_used: u64,
}

pub struct ResultCache {
    entries: HashMap<String, CachedResult>,
    capacity: Option<usize>,
    params_fingerprint: String,
    tick: u64,
}

impl ResultCache {
    pub fn new(capacity: Option<usize>, params_fingerprint: String) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            params_fingerprint,
            tick: 0,
        }
    }

    /// Look up a validated description. A hit refreshes recency.
    pub fn get(&mut self, key: &str) -> Option<UiDescription> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        entry.last_used = tick;
        Some(entry.description.clone())
    }

    /// Insert (or overwrite) a validated description, evicting the
    /// least-recently-used entry while over capacity.
    pub fn put(&mut self, key: String, description: UiDescription) {
        self.tick += 1;
        self.entries.insert(
            key,
            CachedResult {
                description,
                created_at: Utc::now(),
                last_used: self.tick,
            },
        );

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        self.entries.remove(&key);
                    }
                    None => break,
                }
            }
        }
    }

    /// Replace the parameter fingerprint. A changed fingerprint empties the
    /// cache so no entry computed under old parameters survives.
    pub fn set_params_fingerprint(&mut self, fingerprint: String) {
        if self.params_fingerprint != fingerprint {
            tracing::info!(
                entries = self.entries.len(),
                "generation parameters changed, clearing result cache"
            );
            self.entries.clear();
            self.params_fingerprint = fingerprint;
        }
    }

    pub fn created_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.created_at)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
