//! Asset prefetch cache.
//!
//! Warms product imagery ahead of the feed position so swipes never wait on
//! the network. Concurrent requests for the same url are collapsed into one
//! upstream fetch; followers wait on a broadcast channel for the leader's
//! outcome. Failed fetches are logged and NOT cached, so a later request
//! retries the url.
//!
//! The actual transport is behind [`ResourceFetcher`] so the cache can be
//! driven by any client, and tests run against an in-memory mock.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Pause between batches so the transport is never saturated by a long
/// preload queue.
const BATCH_PAUSE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Error)]
pub enum PrefetchError {
    #[error("empty url")]
    EmptyUrl,
    #[error("fetch failed for {url}")]
    Fetch { url: String },
}

/// Transport abstraction for fetching raw asset bytes.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

pub struct PrefetchCache {
    fetcher: Arc<dyn ResourceFetcher>,
    cache: DashMap<String, Arc<Vec<u8>>>,
    in_flight: DashMap<String, broadcast::Sender<Option<Arc<Vec<u8>>>>>,
}

impl PrefetchCache {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            cache: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    /// Fetch one url into the cache, or return the cached bytes.
    ///
    /// The first caller for a url becomes the leader and performs the fetch;
    /// callers arriving while it is in flight await the leader's outcome
    /// instead of fetching again.
    pub async fn preload(&self, url: &str) -> Result<Arc<Vec<u8>>, PrefetchError> {
        if url.is_empty() {
            return Err(PrefetchError::EmptyUrl);
        }
        if let Some(bytes) = self.cache.get(url) {
            return Ok(bytes.clone());
        }

        let follower_rx = match self.in_flight.entry(url.to_string()) {
            Entry::Occupied(entry) => Some(entry.get().subscribe()),
            Entry::Vacant(entry) => {
                let (tx, _) = broadcast::channel(1);
                entry.insert(tx);
                None
            }
        };

        if let Some(mut rx) = follower_rx {
            return match rx.recv().await {
                Ok(Some(bytes)) => Ok(bytes),
                _ => Err(PrefetchError::Fetch { url: url.to_string() }),
            };
        }

        let outcome = match self.fetcher.fetch(url).await {
            Ok(bytes) => {
                let bytes = Arc::new(bytes);
                self.cache.insert(url.to_string(), bytes.clone());
                debug!(%url, size = bytes.len(), "prefetched");
                Some(bytes)
            }
            Err(err) => {
                warn!(%url, error = %err, "prefetch failed");
                None
            }
        };

        // Remove before sending: a new caller either sees the cached value
        // or starts a fresh generation, never a closed channel.
        if let Some((_, tx)) = self.in_flight.remove(url) {
            let _ = tx.send(outcome.clone());
        }

        outcome.ok_or_else(|| PrefetchError::Fetch { url: url.to_string() })
    }

    /// Preload a list of urls in fixed-size concurrent batches, pausing
    /// briefly between batches. Results align with the input order; a
    /// failed url yields `None` in its slot.
    pub async fn preload_batch(
        &self,
        urls: &[String],
        batch_size: usize,
    ) -> Vec<Option<Arc<Vec<u8>>>> {
        if urls.is_empty() {
            return Vec::new();
        }

        let batch_size = batch_size.max(1);
        let mut results = Vec::with_capacity(urls.len());
        let mut batches = urls.chunks(batch_size).peekable();

        while let Some(batch) = batches.next() {
            let fetched = join_all(batch.iter().map(|url| self.preload(url))).await;
            results.extend(fetched.into_iter().map(Result::ok));

            if batches.peek().is_some() {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        results
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.cache.get(url).map(|bytes| bytes.clone())
    }

    pub fn clear(&self) {
        self.cache.clear();
        self.in_flight.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockFetcher {
        calls: AtomicUsize,
        fail_urls: Vec<String>,
        delay: Duration,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_urls: Vec::new(),
                delay: Duration::ZERO,
            }
        }

        fn failing(urls: &[&str]) -> Self {
            Self {
                fail_urls: urls.iter().map(|u| u.to_string()).collect(),
                ..Self::new()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResourceFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_urls.iter().any(|u| u == url) {
                anyhow::bail!("connection reset");
            }
            Ok(url.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_preload_caches_bytes() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = PrefetchCache::new(fetcher.clone());

        let bytes = cache.preload("http://img/a.jpg").await.unwrap();
        assert_eq!(&*bytes, b"http://img/a.jpg");
        assert!(cache.is_cached("http://img/a.jpg"));

        cache.preload("http://img/a.jpg").await.unwrap();
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let cache = PrefetchCache::new(Arc::new(MockFetcher::new()));
        assert!(matches!(
            cache.preload("").await,
            Err(PrefetchError::EmptyUrl)
        ));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached_and_retries() {
        struct FailOnce {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl ResourceFetcher for FailOnce {
            async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("timeout");
                }
                Ok(url.as_bytes().to_vec())
            }
        }

        let cache = PrefetchCache::new(Arc::new(FailOnce {
            calls: AtomicUsize::new(0),
        }));

        assert!(cache.preload("http://img/a.jpg").await.is_err());
        assert!(!cache.is_cached("http://img/a.jpg"));

        // The url stays retryable after a failure.
        assert!(cache.preload("http://img/a.jpg").await.is_ok());
        assert!(cache.is_cached("http://img/a.jpg"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_millis(20)));
        let cache = PrefetchCache::new(fetcher.clone());

        let (a, b) = tokio::join!(
            cache.preload("http://img/a.jpg"),
            cache.preload("http://img/a.jpg"),
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_marks_failures() {
        let fetcher = Arc::new(MockFetcher::failing(&["http://img/bad.jpg"]));
        let cache = PrefetchCache::new(fetcher.clone());

        let urls: Vec<String> = [
            "http://img/a.jpg",
            "http://img/bad.jpg",
            "http://img/b.jpg",
            "http://img/c.jpg",
        ]
        .iter()
        .map(|u| u.to_string())
        .collect();

        let results = cache.preload_batch(&urls, DEFAULT_BATCH_SIZE).await;
        assert_eq!(results.len(), 4);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
        assert!(results[3].is_some());
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_dedupes_repeated_urls() {
        let fetcher = Arc::new(MockFetcher::slow(Duration::from_millis(5)));
        let cache = PrefetchCache::new(fetcher.clone());

        let urls: Vec<String> = vec![
            "http://img/a.jpg".to_string(),
            "http://img/a.jpg".to_string(),
            "http://img/a.jpg".to_string(),
        ];
        let results = cache.preload_batch(&urls, DEFAULT_BATCH_SIZE).await;
        assert!(results.iter().all(Option::is_some));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_empties_cache() {
        let cache = PrefetchCache::new(Arc::new(MockFetcher::new()));
        cache.preload("http://img/a.jpg").await.unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_cached("http://img/a.jpg"));
    }
}
