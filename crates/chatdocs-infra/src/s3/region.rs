//! Region-bound client holder.
//!
//! S3 requests must be signed for the bucket's own region. The configured
//! region is only a starting guess: the bucket's real location is looked up
//! lazily and, when it differs, a new client is built and published. Callers
//! take an `Arc` snapshot of the current client and keep using it for the
//! whole operation, so a rebind never changes a client mid-request.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chatdocs_types::error::StorageError;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A client together with the region it was built for.
#[derive(Debug)]
pub struct Bound<C> {
    pub region: String,
    pub client: C,
}

type ClientBuilder<C> = Box<dyn Fn(&str) -> C + Send + Sync>;

pub struct RegionBinding<C> {
    current: RwLock<Arc<Bound<C>>>,
    /// Time of the last lookup attempt. Holding the lock means a lookup is running.
    last_check: Mutex<Option<Instant>>,
    checked_once: AtomicBool,
    recheck_interval: Duration,
    build: ClientBuilder<C>,
}

impl<C: Send + Sync> RegionBinding<C> {
    /// Bind to `initial_region` right away. `build` creates a client for a region.
    pub fn new(
        initial_region: impl Into<String>,
        recheck_interval: Duration,
        build: impl Fn(&str) -> C + Send + Sync + 'static,
    ) -> Self {
        let region = initial_region.into();
        let client = build(&region);
        Self {
            current: RwLock::new(Arc::new(Bound { region, client })),
            last_check: Mutex::new(None),
            checked_once: AtomicBool::new(false),
            recheck_interval,
            build: Box::new(build),
        }
    }

    /// Snapshot of the current client.
    pub fn current(&self) -> Arc<Bound<C>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn region(&self) -> String {
        self.current().region.clone()
    }

    /// Return a client snapshot, looking up the bucket region first when a
    /// check is due.
    ///
    /// `detect` receives the current snapshot and resolves the bucket's
    /// region. Only one lookup runs at a time. Until the first lookup has
    /// finished, callers wait for it; afterwards a caller that finds a lookup
    /// in progress proceeds with the current client. A failed lookup is
    /// logged and the current client is kept.
    pub async fn refresh_with<F, Fut>(&self, detect: F) -> Arc<Bound<C>>
    where
        F: FnOnce(Arc<Bound<C>>) -> Fut,
        Fut: Future<Output = Result<String, StorageError>>,
    {
        let mut last_check = match self.last_check.try_lock() {
            Ok(guard) => guard,
            Err(_) if self.checked_once.load(Ordering::Acquire) => return self.current(),
            Err(_) => self.last_check.lock().await,
        };

        if let Some(at) = *last_check {
            if at.elapsed() < self.recheck_interval {
                return self.current();
            }
        }

        let snapshot = self.current();
        let outcome = detect(snapshot.clone()).await;
        *last_check = Some(Instant::now());

        let bound = match outcome {
            Ok(region) if region == snapshot.region => {
                debug!(region = %region, "Bucket region unchanged");
                snapshot
            }
            Ok(region) => {
                info!(from = %snapshot.region, to = %region, "Rebinding object store client to bucket region");
                let bound = Arc::new(Bound {
                    client: (self.build)(&region),
                    region,
                });
                *self
                    .current
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = bound.clone();
                bound
            }
            Err(e) => {
                warn!(region = %snapshot.region, error = %e, "Bucket region lookup failed, keeping current client");
                snapshot
            }
        };
        self.checked_once.store(true, Ordering::Release);
        bound
    }
}
