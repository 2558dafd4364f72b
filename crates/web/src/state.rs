//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::storage::MediaStore;

/// Everything a handler needs, behind one `Arc` so cloning per request is a
/// pointer bump.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: SiteConfig,
    pool: PgPool,
    media: MediaStore,
}

impl AppState {
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool) -> Self {
        let media = MediaStore::new(config.media_root.clone());
        let inner = Inner {
            config,
            pool,
            media,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Filesystem store backing `/media`.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }
}
