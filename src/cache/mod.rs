//! Cache module for memoizing raw API responses in memory
//!
//! This module provides a time-bounded cache keyed by request URL. Entries are
//! opaque byte payloads; a background reaper evicts them once they are older
//! than the configured interval. Nothing is persisted across runs.

mod ttl;

pub use ttl::TtlCache;
