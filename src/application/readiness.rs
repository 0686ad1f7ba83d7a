//! Gate for read paths: nothing is served until a full pass has warmed the
//! cache index.

use std::sync::Arc;

use crate::application::reconcile::keyspace::WARM_KEY;
use crate::error::{Error, Result};
use crate::port::outbound::cache::CacheIndex;

pub struct Readiness {
    cache: Arc<dyn CacheIndex>,
}

impl Readiness {
    #[must_use]
    pub fn new(cache: Arc<dyn CacheIndex>) -> Self {
        Self { cache }
    }

    pub async fn is_warm(&self) -> Result<bool> {
        self.cache.exists(WARM_KEY).await
    }

    /// `NotReady` until the warm marker exists.
    pub async fn ensure_warm(&self) -> Result<()> {
        if self.is_warm().await? {
            Ok(())
        } else {
            Err(Error::NotReady)
        }
    }
}
