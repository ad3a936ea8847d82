//! Event dispatch.
//!
//! All inputs go through one channel and are handled by a single task, so
//! per-user post counts follow arrival order. Emoji completions are
//! forwarded to the surface by a separate task.

use std::sync::Arc;

use chat_client::{IdentityLookup, ResourceFetcher};
use emoji_cache::LoadCompletion;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::engine::ChatEngine;
use crate::events::EngineInput;
use crate::surface::RenderSurface;

/// Maximum number of inputs waiting for the dispatcher.
pub const INPUT_QUEUE_CAPACITY: usize = 1024;

/// Start the dispatcher task. It stops once every sender is dropped.
pub fn spawn<L, F, S>(
    engine: Arc<ChatEngine<L, F, S>>,
) -> (mpsc::Sender<EngineInput>, JoinHandle<()>)
where
    L: IdentityLookup + 'static,
    F: ResourceFetcher + 'static,
    S: RenderSurface + 'static,
{
    let (tx, rx) = mpsc::channel::<EngineInput>(INPUT_QUEUE_CAPACITY);
    let handle = tokio::spawn(dispatch_loop(engine, rx));
    tracing::info!("Dispatcher started (capacity={INPUT_QUEUE_CAPACITY})");
    (tx, handle)
}

async fn dispatch_loop<L, F, S>(engine: Arc<ChatEngine<L, F, S>>, mut rx: mpsc::Receiver<EngineInput>)
where
    L: IdentityLookup,
    F: ResourceFetcher,
    S: RenderSurface,
{
    let mut handled: u64 = 0;
    while let Some(input) = rx.recv().await {
        engine.handle(input).await;
        handled += 1;
    }
    tracing::info!(handled, "Dispatcher stopped");
}

/// Relay emoji load completions to the surface until the loader shuts down.
pub fn forward_completions<S>(
    mut completions: mpsc::Receiver<LoadCompletion>,
    surface: Arc<S>,
) -> JoinHandle<()>
where
    S: RenderSurface + 'static,
{
    tokio::spawn(async move {
        while let Some(completion) = completions.recv().await {
            surface.emoji_loaded(&completion);
        }
        tracing::debug!("Emoji completion forwarder stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chat_client::{ClientError, ProbeResult};
    use chat_core::{CasingPolicy, CasingSettings, ChatMessage};
    use emoji_cache::{EmojiCache, NegativeResourceRegistry};

    use super::*;
    use crate::events::{ChatEvent, ConfigEvent};

    struct NoLookup;

    impl IdentityLookup for NoLookup {
        async fn lookup_display_name(&self, _login: &str) -> Result<String, ClientError> {
            Err(ClientError::MissingField("display_name"))
        }
    }

    struct NoFetch;

    impl ResourceFetcher for NoFetch {
        async fn probe(&self, _url: &str) -> ProbeResult {
            ProbeResult::Unreachable
        }

        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
            Err(ClientError::MissingField("body"))
        }
    }

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<ChatMessage>>,
        completions: Mutex<Vec<LoadCompletion>>,
    }

    impl RenderSurface for Recorder {
        fn add_message(&self, message: ChatMessage) {
            self.messages.lock().unwrap().push(message);
        }

        fn ban_user(&self, _channel: &str, _host_mask: &str) {}

        fn unban_user(&self, _channel: &str, _host_mask: &str) {}

        fn emoji_loaded(&self, completion: &LoadCompletion) {
            self.completions.lock().unwrap().push(completion.clone());
        }
    }

    fn engine(policy: CasingPolicy) -> Arc<ChatEngine<NoLookup, NoFetch, Recorder>> {
        let cache = Arc::new(EmojiCache::new(NoFetch, Arc::new(NegativeResourceRegistry::new())));
        Arc::new(ChatEngine::new(
            NoLookup,
            CasingSettings {
                policy,
                infer_from_body: false,
            },
            cache,
            Arc::new(Recorder::default()),
        ))
    }

    fn message(sender: &str, body: &str) -> EngineInput {
        ChatEvent::Message {
            channel: "#chan".into(),
            sender: sender.into(),
            body: body.into(),
        }
        .into()
    }

    #[tokio::test]
    async fn preserves_arrival_order() {
        let engine = engine(CasingPolicy::FirstCap);
        let (tx, handle) = spawn(Arc::clone(&engine));

        for i in 0..50 {
            tx.send(message("bob", &format!("line {i}"))).await.unwrap();
        }
        tx.send(ConfigEvent::SessionReset.into()).await.unwrap();
        tx.send(message("BOB", "after reset")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let messages = engine.surface().messages.lock().unwrap();
        assert_eq!(messages.len(), 51);
        for (i, msg) in messages.iter().take(50).enumerate() {
            assert_eq!(msg.body(), format!("line {i}"));
            assert_eq!(msg.post_count(), i as u32 + 1);
            assert_eq!(msg.display_username(), "Bob");
        }
        assert_eq!(messages[50].post_count(), 1);
    }

    #[tokio::test]
    async fn forwards_completions_to_surface() {
        let surface = Arc::new(Recorder::default());
        let (tx, rx) = mpsc::channel(4);
        let handle = forward_completions(rx, Arc::clone(&surface));

        tx.send(LoadCompletion {
            identifier: "Kappa".into(),
            url: "https://cdn.example.com/25".into(),
            loaded: true,
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        let completions = surface.completions.lock().unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].identifier, "Kappa");
    }
}
