//! Engine startup: environment, HTTP collaborators, worker tasks.

use std::sync::Arc;

use chat_client::{IdentityClient, ResourceClient};
use emoji_cache::{EmojiCache, EmojiLoader, NegativeResourceRegistry};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::dispatcher;
use crate::engine::ChatEngine;
use crate::events::EngineInput;
use crate::surface::RenderSurface;

pub type HttpChatEngine<S> = ChatEngine<IdentityClient, ResourceClient, S>;

/// A started engine: the input channel plus its background tasks.
pub struct RunningEngine<S> {
    pub engine: Arc<HttpChatEngine<S>>,
    pub inputs: mpsc::Sender<EngineInput>,
    pub dispatcher: JoinHandle<()>,
    pub completions: JoinHandle<()>,
}

/// Load `.env` from the working directory or one of its parents.
pub fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Wire HTTP collaborators, the emoji loader pool and the dispatcher.
///
/// Must be called from within a tokio runtime.
pub fn start<S>(config: &EngineConfig, surface: Arc<S>) -> RunningEngine<S>
where
    S: RenderSurface + 'static,
{
    let mut lookup = IdentityClient::new(config.identity_base_url.clone());
    if let Some(client_id) = &config.identity_client_id {
        lookup = lookup.with_client_id(client_id.clone());
    }

    let registry = Arc::new(NegativeResourceRegistry::new());
    let cache = Arc::new(EmojiCache::new(ResourceClient::new(), registry));
    let (loader, completions) = EmojiLoader::start(
        Arc::clone(&cache),
        config.emoji_workers,
        config.emoji_queue_capacity,
    );
    let completions = dispatcher::forward_completions(completions, Arc::clone(&surface));

    let engine = Arc::new(
        ChatEngine::new(lookup, config.casing_settings(), cache, surface).with_loader(loader),
    );
    let (inputs, dispatcher) = dispatcher::spawn(Arc::clone(&engine));

    tracing::info!(
        policy = %config.casing_policy,
        infer_from_body = config.infer_casing_from_body,
        lookup = %config.identity_base_url,
        "Engine started"
    );

    RunningEngine {
        engine,
        inputs,
        dispatcher,
        completions,
    }
}
