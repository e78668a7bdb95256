//! Report cache port trait.
//!
//! Values are serialized report payloads; keys combine user and symbol so
//! users never see each other's reports. Writes overwrite unconditionally
//! (last writer wins).

use std::time::Duration;

pub trait CachePort {
    /// Fetch a live (non-expired) entry.
    fn get(&self, key: &str) -> Option<String>;

    fn put(&self, key: &str, value: String, ttl: Duration);
}
