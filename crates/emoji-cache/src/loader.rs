//! Background emoji loading.
//!
//! The render path must never wait on the network. It asks the loader for
//! an image; if the image is not in memory yet, a load request is queued
//! for a fixed pool of workers and the caller draws a placeholder. Workers
//! report each finished request on a completion channel so the renderer
//! knows when to repaint.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chat_client::ResourceFetcher;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::EmojiError;
use crate::cache::EmojiCache;
use crate::record::{EmojiImage, EmojiRecord};
use crate::registry::NegativeResourceRegistry;

const COMPLETION_CHANNEL_CAPACITY: usize = 512;

/// Notification that a queued load finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCompletion {
    pub identifier: String,
    pub url: String,
    /// Whether an image is now available for the request.
    pub loaded: bool,
}

struct LoadRequest {
    record: Arc<EmojiRecord>,
    want_animated: bool,
    key: String,
}

/// Bounded worker pool that populates emoji records in the background.
pub struct EmojiLoader {
    tx: mpsc::Sender<LoadRequest>,
    pending: Arc<Mutex<HashSet<String>>>,
    registry: Arc<NegativeResourceRegistry>,
}

impl EmojiLoader {
    /// Spawn `workers` tasks sharing a queue of `capacity` requests.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(
        cache: Arc<EmojiCache<F>>,
        workers: usize,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<LoadCompletion>)
    where
        F: ResourceFetcher + 'static,
    {
        let (tx, rx) = mpsc::channel::<LoadRequest>(capacity.max(1));
        let (done_tx, done_rx) = mpsc::channel::<LoadCompletion>(COMPLETION_CHANNEL_CAPACITY);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let pending = Arc::new(Mutex::new(HashSet::new()));
        let registry = Arc::clone(cache.registry());

        let workers = workers.max(1);
        for worker in 0..workers {
            tokio::spawn(worker_loop(
                worker,
                Arc::clone(&cache),
                Arc::clone(&rx),
                done_tx.clone(),
                Arc::clone(&pending),
            ));
        }
        tracing::info!(workers, capacity, "Emoji loader started");

        (
            Self {
                tx,
                pending,
                registry,
            },
            done_rx,
        )
    }

    /// Return the image if it is already loaded, otherwise queue a load and
    /// return `None` so the caller can draw a placeholder.
    pub fn image_or_request(
        &self,
        record: &Arc<EmojiRecord>,
        want_animated: bool,
    ) -> Option<EmojiImage> {
        let image = record.loaded_image(want_animated);
        if image.is_none() || record.needs_load() {
            if let Err(e) = self.request(record, want_animated) {
                tracing::debug!(identifier = record.identifier(), error = %e, "Emoji load not queued");
            }
        }
        image
    }

    /// Queue a load. Returns `Ok(false)` when nothing needs doing, the URL
    /// is already known unreachable, or the record is already queued.
    pub fn request(&self, record: &Arc<EmojiRecord>, want_animated: bool) -> Result<bool, EmojiError> {
        if !record.needs_load() {
            return Ok(false);
        }
        if self.registry.contains(record.url()) {
            record.mark_unreachable();
            return Ok(false);
        }

        let key = request_key(record);
        if !lock_pending(&self.pending).insert(key.clone()) {
            return Ok(false);
        }

        let request = LoadRequest {
            record: Arc::clone(record),
            want_animated,
            key: key.clone(),
        };
        match self.tx.try_send(request) {
            Ok(()) => Ok(true),
            Err(e) => {
                lock_pending(&self.pending).remove(&key);
                match e {
                    TrySendError::Full(_) => Err(EmojiError::QueueFull),
                    TrySendError::Closed(_) => Err(EmojiError::LoaderClosed),
                }
            }
        }
    }

    /// Number of requests queued or in flight.
    pub fn pending(&self) -> usize {
        lock_pending(&self.pending).len()
    }
}

async fn worker_loop<F: ResourceFetcher>(
    worker: usize,
    cache: Arc<EmojiCache<F>>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<LoadRequest>>>,
    done_tx: mpsc::Sender<LoadCompletion>,
    pending: Arc<Mutex<HashSet<String>>>,
) {
    loop {
        let request = { rx.lock().await.recv().await };
        let Some(request) = request else {
            break;
        };

        let loaded = cache
            .get_image(&request.record, request.want_animated)
            .await
            .is_some();
        lock_pending(&pending).remove(&request.key);

        let completion = LoadCompletion {
            identifier: request.record.identifier().to_string(),
            url: request.record.url().to_string(),
            loaded,
        };
        if let Err(TrySendError::Full(c)) = done_tx.try_send(completion) {
            tracing::debug!(identifier = %c.identifier, "Completion channel full, dropping notice");
        }
    }

    tracing::debug!(worker, "Emoji loader worker stopped");
}

fn request_key(record: &EmojiRecord) -> String {
    format!("{}\u{1f}{}", record.identifier(), record.url())
}

fn lock_pending(pending: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    match pending.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
