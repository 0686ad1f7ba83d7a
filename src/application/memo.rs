//! Result cache for expensive reads.
//!
//! Results are stored as JSON under `{name}-{sha256(args)}` with the
//! configured TTL. The cache is strictly best effort: any cache failure is
//! logged and the computation runs directly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::port::outbound::cache::CacheIndex;

pub struct Memo {
    cache: Arc<dyn CacheIndex>,
    ttl: Duration,
}

impl Memo {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheIndex>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Cache key for a call.
    pub fn key<A: Serialize>(name: &str, args: &A) -> Result<String> {
        let encoded = serde_json::to_vec(args)?;
        let digest = Sha256::digest(&encoded);
        Ok(format!("{name}-{}", hex::encode(digest)))
    }

    /// Cached result of `name(args)`, computing and storing it on a miss.
    pub async fn get_or_compute<T, A, F, Fut>(&self, name: &str, args: &A, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        A: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = match Self::key(name, args) {
            Ok(key) => key,
            Err(err) => {
                warn!(call = %name, error = %err, "Uncacheable arguments, calling directly");
                return compute().await;
            }
        };

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str(&cached) {
                Ok(value) => {
                    debug!(call = %name, "Result served from cache");
                    return Ok(value);
                }
                Err(err) => warn!(call = %name, error = %err, "Discarding undecodable cached result"),
            },
            Ok(None) => debug!(call = %name, "No cached result"),
            Err(err) => {
                warn!(call = %name, error = %err, "Cache read failed, calling directly");
                return compute().await;
            }
        }

        let value = compute().await?;
        match serde_json::to_string(&value) {
            Ok(encoded) => {
                if let Err(err) = self.cache.set_ex(&key, &encoded, self.ttl).await {
                    warn!(call = %name, error = %err, "Failed to cache result");
                }
            }
            Err(err) => warn!(call = %name, error = %err, "Result not serializable"),
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapter::outbound::memory::MemoryCacheIndex;
    use crate::error::Error;
    use crate::port::outbound::cache::CacheOp;

    fn memo(cache: &Arc<MemoryCacheIndex>, ttl: Duration) -> Memo {
        Memo::new(cache.clone(), ttl)
    }

    #[test]
    fn key_depends_on_name_and_args() {
        let a = Memo::key("members", &("lb1", "/P/web")).unwrap();
        let b = Memo::key("members", &("lb1", "/P/api")).unwrap();
        let c = Memo::key("pools", &("lb1", "/P/web")).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("members-"));
        assert_eq!(a.len(), "members-".len() + 64);
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let cache = Arc::new(MemoryCacheIndex::new());
        let memo = memo(&cache, Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let value: Vec<String> = memo
                .get_or_compute("members", &"lb1", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["n1".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["n1"]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_results_are_recomputed() {
        let cache = Arc::new(MemoryCacheIndex::new());
        let memo = memo(&cache, Duration::from_millis(0));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let _: u32 = memo
                .get_or_compute("count", &1, || async move {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_failure_falls_back_to_direct_call() {
        let cache = Arc::new(MemoryCacheIndex::new());
        let key = Memo::key("members", &"lb1").unwrap();
        // A set under the key makes string reads fail.
        cache.apply(vec![CacheOp::sadd(&key, "x")]).await.unwrap();
        let memo = memo(&cache, Duration::from_secs(60));

        let value: String = memo
            .get_or_compute("members", &"lb1", || async { Ok("direct".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "direct");
    }

    #[tokio::test]
    async fn compute_errors_are_not_cached() {
        let cache = Arc::new(MemoryCacheIndex::new());
        let memo = memo(&cache, Duration::from_secs(60));

        let result: Result<String> = memo
            .get_or_compute("members", &"lb1", || async { Err(Error::NotFound("lb1".into())) })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(cache.keys().is_empty());
    }
}
