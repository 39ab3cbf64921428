//! In-memory TTL cache with a background reaper
//!
//! Entries are stamped when they are written and removed by a background task
//! that wakes once per interval. Reads never look at an entry's age, so a value
//! can still be served for up to one extra sweep period after it expires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A stored payload together with its insertion time
#[derive(Debug)]
struct CacheEntry {
    value: Vec<u8>,
    created_at: Instant,
}

type EntryMap = RwLock<HashMap<String, CacheEntry>>;

/// Stop flag and join handle for the background reaper task
#[derive(Debug)]
struct Reaper {
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Thread-safe key/value cache whose entries expire after a fixed interval
///
/// The interval is both the reaper's sweep period and the expiry threshold, so
/// an entry lives between `interval` and `2 * interval` while the reaper runs.
/// Handles are cheap to clone and all clones share the same entries and reaper.
/// Dropping the last handle stops the reaper.
#[derive(Debug, Clone)]
pub struct TtlCache {
    entries: Arc<EntryMap>,
    reaper: Arc<Reaper>,
    interval: Duration,
}

impl TtlCache {
    /// Creates an empty cache and starts its reaper on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero or if called outside of a Tokio runtime.
    pub fn new(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "cache interval must be non-zero");

        let entries = Arc::new(RwLock::new(HashMap::new()));
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(reap_loop(Arc::clone(&entries), interval, stop_rx));
        debug!(?interval, "cache reaper started");

        Self {
            entries,
            reaper: Arc::new(Reaper {
                stop_tx,
                handle: Mutex::new(Some(handle)),
            }),
            interval,
        }
    }

    /// Inserts or overwrites the value stored under `key`
    pub fn put(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };
        self.entries.write().insert(key.into(), entry);
    }

    /// Returns a copy of the value stored under `key`, if it has not been reaped
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().get(key).map(|entry| entry.value.clone())
    }

    /// Signals the reaper to exit
    ///
    /// Returns `true` for the call that actually stopped the reaper and `false`
    /// once it is already stopped. Never blocks; use [`TtlCache::shutdown`] to
    /// also wait for the task to finish.
    pub fn stop(&self) -> bool {
        let already_stopped = self.reaper.stop_tx.send_replace(true);
        if !already_stopped {
            debug!("cache reaper stop requested");
        }
        !already_stopped
    }

    /// Stops the reaper and waits for its task to exit
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.reaper.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                debug!(%err, "cache reaper task ended abnormally");
            }
        }
    }

    /// Whether the reaper is still evicting entries
    ///
    /// False once stop has been requested or the reaper task has ended, e.g.
    /// because the runtime it was spawned on shut down.
    pub fn is_running(&self) -> bool {
        if *self.reaper.stop_tx.borrow() {
            return false;
        }
        self.reaper
            .handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Sweep period and expiry threshold
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of entries currently stored, expired-but-unswept ones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Background task: sweeps once per interval until the stop flag is raised
async fn reap_loop(entries: Arc<EntryMap>, interval: Duration, mut stop_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick, which completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            changed = stop_rx.changed() => {
                // A closed channel means every handle is gone
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let removed = sweep(&entries, interval, Instant::now());
                if removed > 0 {
                    debug!(removed, remaining = entries.read().len(), "swept expired cache entries");
                }
            }
        }
    }

    debug!("cache reaper stopped");
}

/// Removes every entry older than `interval` as of `now`, under one write lock
fn sweep(entries: &EntryMap, interval: Duration, now: Instant) -> usize {
    let mut entries = entries.write();
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= interval);
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_INTERVAL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_put_then_get_returns_value() {
        let cache = TtlCache::new(LONG_INTERVAL);
        cache.put("https://example.com", b"testdata".to_vec());

        assert_eq!(cache.get("https://example.com"), Some(b"testdata".to_vec()));
    }

    #[tokio::test]
    async fn test_get_missing_key_returns_none() {
        let cache = TtlCache::new(LONG_INTERVAL);

        assert!(cache.get("https://example.com/path").is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_value() {
        let cache = TtlCache::new(LONG_INTERVAL);
        cache.put("key", "first");
        cache.put("key", "second");

        assert_eq!(cache.get("key"), Some(b"second".to_vec()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_value_is_a_hit() {
        let cache = TtlCache::new(LONG_INTERVAL);
        cache.put("empty", Vec::new());

        assert_eq!(cache.get("empty"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = TtlCache::new(LONG_INTERVAL);
        let other = cache.clone();
        other.put("shared", "value");

        assert_eq!(cache.get("shared"), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let cache = TtlCache::new(LONG_INTERVAL);
        assert!(cache.is_running());

        assert!(cache.stop(), "first stop should stop the reaper");
        assert!(!cache.stop(), "second stop should report already stopped");
        assert!(!cache.clone().stop());
        assert!(!cache.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_after_stop_completes() {
        let cache = TtlCache::new(LONG_INTERVAL);
        cache.stop();

        tokio::time::timeout(Duration::from_secs(1), cache.shutdown())
            .await
            .expect("shutdown should join the reaper promptly");
        // A second shutdown has nothing left to join
        tokio::time::timeout(Duration::from_secs(1), cache.shutdown())
            .await
            .expect("repeated shutdown should return immediately");
    }

    #[tokio::test]
    async fn test_get_does_not_expire_entries_itself() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.stop();
        cache.put("stale", "value");

        tokio::time::sleep(Duration::from_millis(40)).await;

        // Logically expired, but only the reaper may remove it
        assert_eq!(cache.get("stale"), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_interval_is_reported() {
        let cache = TtlCache::new(Duration::from_millis(250));
        assert_eq!(cache.interval(), Duration::from_millis(250));
        assert_eq!(cache.clone().interval(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_present_entry_survives_after_stop() {
        let interval = Duration::from_millis(20);
        let cache = TtlCache::new(interval);
        cache.put("a", "1");

        assert!(cache.stop());
        tokio::time::sleep(interval * 5).await;

        assert_eq!(cache.get("a"), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_reaper() {
        let cache = TtlCache::new(Duration::from_millis(5));
        let other = cache.clone();
        let entries = Arc::downgrade(&cache.entries);

        drop(cache);
        tokio::time::sleep(Duration::from_millis(30)).await;
        // One handle left, the reaper still owns the map
        assert!(other.is_running());
        assert!(entries.upgrade().is_some());

        drop(other);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(entries.upgrade().is_none(), "reaper should release the map after the last drop");
    }

    #[test]
    fn test_not_running_once_runtime_is_gone() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("Failed to build runtime");
        let cache = runtime.block_on(async { TtlCache::new(Duration::from_secs(60)) });
        assert!(cache.is_running());

        drop(runtime);

        assert!(!cache.is_running());
        // Stop still reports the transition even though the task is gone
        assert!(cache.stop());
    }

    #[tokio::test]
    #[should_panic(expected = "non-zero")]
    async fn test_zero_interval_panics() {
        let _ = TtlCache::new(Duration::ZERO);
    }

    #[test]
    fn test_sweep_removes_only_entries_older_than_interval() {
        let interval = Duration::from_secs(5);
        let now = Instant::now();
        let entries: EntryMap = RwLock::new(HashMap::new());
        {
            let mut map = entries.write();
            map.insert(
                "old".to_string(),
                CacheEntry {
                    value: b"old".to_vec(),
                    created_at: now,
                },
            );
        }

        // Exactly at the threshold the entry is still fresh
        assert_eq!(sweep(&entries, interval, now + interval), 0);
        assert_eq!(entries.read().len(), 1);

        let later = now + interval + Duration::from_millis(1);
        entries.write().insert(
            "new".to_string(),
            CacheEntry {
                value: b"new".to_vec(),
                created_at: later,
            },
        );

        assert_eq!(sweep(&entries, interval, later), 1);
        let map = entries.read();
        assert!(map.contains_key("new"));
        assert!(!map.contains_key("old"));
    }

    #[test]
    fn test_sweep_on_empty_map() {
        let entries: EntryMap = RwLock::new(HashMap::new());
        assert_eq!(sweep(&entries, Duration::from_secs(1), Instant::now()), 0);
    }
}
