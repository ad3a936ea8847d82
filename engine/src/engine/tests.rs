use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chat_client::{ClientError, ProbeResult};
use chat_core::CasingPolicy;
use emoji_cache::{EmojiKind, LoadCompletion};

use super::*;

#[derive(Default)]
struct FakeLookup {
    names: HashMap<String, String>,
    calls: AtomicUsize,
}

impl IdentityLookup for FakeLookup {
    async fn lookup_display_name(&self, login: &str) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.names.get(login).cloned().ok_or(ClientError::ApiError {
            status: 404,
            message: "unknown login".into(),
        })
    }
}

#[derive(Default)]
struct DeadFetcher {
    probes: AtomicUsize,
}

impl ResourceFetcher for DeadFetcher {
    async fn probe(&self, _url: &str) -> ProbeResult {
        self.probes.fetch_add(1, Ordering::SeqCst);
        ProbeResult::Unreachable
    }

    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, ClientError> {
        Err(ClientError::MissingField("body"))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Painted {
    Message(ChatMessage),
    Ban(String, String),
    Unban(String, String),
    Connection(bool),
}

#[derive(Default)]
struct RecordingSurface {
    painted: Mutex<Vec<Painted>>,
}

impl RecordingSurface {
    fn take(&self) -> Vec<Painted> {
        std::mem::take(&mut *self.painted.lock().unwrap())
    }

    fn messages(&self) -> Vec<ChatMessage> {
        self.take()
            .into_iter()
            .filter_map(|p| match p {
                Painted::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn add_message(&self, message: ChatMessage) {
        self.painted.lock().unwrap().push(Painted::Message(message));
    }

    fn ban_user(&self, channel: &str, host_mask: &str) {
        self.painted
            .lock()
            .unwrap()
            .push(Painted::Ban(channel.into(), host_mask.into()));
    }

    fn unban_user(&self, channel: &str, host_mask: &str) {
        self.painted
            .lock()
            .unwrap()
            .push(Painted::Unban(channel.into(), host_mask.into()));
    }

    fn connection_changed(&self, connected: bool) {
        self.painted.lock().unwrap().push(Painted::Connection(connected));
    }
}

type TestEngine = ChatEngine<FakeLookup, DeadFetcher, RecordingSurface>;

fn engine_with(lookup: FakeLookup, policy: CasingPolicy) -> TestEngine {
    let cache = Arc::new(EmojiCache::new(
        DeadFetcher::default(),
        Arc::new(NegativeResourceRegistry::new()),
    ));
    ChatEngine::new(
        lookup,
        CasingSettings {
            policy,
            infer_from_body: false,
        },
        cache,
        Arc::new(RecordingSurface::default()),
    )
}

fn msg(sender: &str, body: &str) -> ChatEvent {
    ChatEvent::Message {
        channel: "#chan".into(),
        sender: sender.into(),
        body: body.into(),
    }
}

fn emoji(identifier: &str, url: &str) -> EmojiDefinition {
    EmojiDefinition {
        emoji: identifier.into(),
        url: url.into(),
        kind: EmojiKind::TwitchV3,
        replaces: None,
        width: None,
        height: None,
        tint: None,
        animated: false,
        animated_gif: false,
    }
}

#[tokio::test]
async fn join_keeps_raw_handle_and_counts() {
    let engine = engine_with(FakeLookup::default(), CasingPolicy::AllCaps);

    engine
        .on_event(ChatEvent::Join {
            channel: "#chan".into(),
            sender: "carol".into(),
        })
        .await;
    engine.on_event(msg("carol", "hello")).await;

    let messages = engine.surface().messages();
    assert_eq!(messages[0].message_type(), MessageType::Join);
    assert_eq!(messages[0].display_username(), "carol");
    assert_eq!(messages[0].body(), "joined #chan.");
    assert_eq!(messages[0].post_count(), 1);
    assert_eq!(messages[1].display_username(), "CAROL");
    assert_eq!(messages[1].post_count(), 2);
}

#[tokio::test]
async fn actions_and_manual_lines_are_posted() {
    let lookup = FakeLookup {
        names: HashMap::from([("dave".to_string(), "DaVe".to_string())]),
        ..Default::default()
    };
    let engine = engine_with(lookup, CasingPolicy::RemoteLookup);

    engine
        .on_event(ChatEvent::Action {
            channel: "#chan".into(),
            sender: "dave".into(),
            action: "waves".into(),
        })
        .await;
    engine
        .on_event(ChatEvent::Manual {
            sender: "operator".into(),
            body: "stream starting".into(),
        })
        .await;

    let messages = engine.surface().messages();
    assert_eq!(messages[0].message_type(), MessageType::Action);
    assert_eq!(messages[0].display_username(), "DaVe");
    assert_eq!(messages[1].message_type(), MessageType::Manual);
    assert_eq!(messages[1].display_username(), "operator");
    assert_eq!(engine.resolver().lookup_failures(), 0);
    assert_eq!(engine.resolver().cached("dave").as_deref(), Some("DaVe"));
    assert!(engine.resolver().cached("operator").is_none());
}

#[tokio::test]
async fn moderation_and_connection_bypass_assembler() {
    let engine = engine_with(FakeLookup::default(), CasingPolicy::None);

    engine
        .on_event(ChatEvent::ChannelBan {
            channel: "#chan".into(),
            host_mask: "*!*@spam.example".into(),
        })
        .await;
    engine
        .on_event(ChatEvent::ChannelUnban {
            channel: "#chan".into(),
            host_mask: "*!*@spam.example".into(),
        })
        .await;
    engine.on_event(ChatEvent::Connected).await;
    engine
        .on_event(ChatEvent::PrivateMessage {
            sender: "eve".into(),
            body: "psst".into(),
        })
        .await;
    engine.on_event(ChatEvent::Disconnected).await;

    assert_eq!(
        engine.surface().take(),
        vec![
            Painted::Ban("#chan".into(), "*!*@spam.example".into()),
            Painted::Unban("#chan".into(), "*!*@spam.example".into()),
            Painted::Connection(true),
            Painted::Connection(false),
        ]
    );
    assert_eq!(engine.assembler().post_count("eve"), 0);
}

#[tokio::test]
async fn casing_change_clears_cached_names() {
    let engine = engine_with(FakeLookup::default(), CasingPolicy::AllCaps);
    engine.on_event(msg("bob", "one")).await;

    engine.apply_config(ConfigEvent::CasingChanged {
        policy: CasingPolicy::FirstCap,
        infer_from_body: false,
    });
    assert!(engine.resolver().is_empty());
    engine.on_event(msg("bob", "two")).await;

    let messages = engine.surface().messages();
    assert_eq!(messages[0].display_username(), "BOB");
    assert_eq!(messages[1].display_username(), "Bob");
    // Counts survive a casing change.
    assert_eq!(messages[1].post_count(), 2);
}

#[tokio::test]
async fn session_reset_restarts_counts_and_casing() {
    let engine = engine_with(FakeLookup::default(), CasingPolicy::AllLower);
    for _ in 0..5 {
        engine.on_event(msg("Zed", "spam")).await;
    }
    engine.resolver().set_policy(CasingPolicy::AllCaps);

    engine.handle(ConfigEvent::SessionReset.into()).await;
    engine.on_event(msg("Zed", "back")).await;

    let messages = engine.surface().messages();
    assert_eq!(messages[4].post_count(), 5);
    assert_eq!(messages[5].post_count(), 1);
    assert_eq!(messages[5].display_username(), "ZED");
}

#[tokio::test]
async fn emoji_sources_change_keeps_negative_registry() {
    let engine = engine_with(FakeLookup::default(), CasingPolicy::None);
    engine.add_emoji(emoji("Kappa", "https://cdn.example.com/emoticons/25/1.0"));
    engine.add_emoji(emoji("Broken", "not a url"));
    assert_eq!(engine.emoji().len(), 1);

    engine.registry().insert("https://cdn.example.com/gone.png");
    engine.handle(ConfigEvent::EmojiSourcesChanged.into()).await;

    assert!(engine.emoji().is_empty());
    assert!(engine.registry().contains("https://cdn.example.com/gone.png"));
}

#[tokio::test]
async fn posted_messages_warm_their_emojis() {
    let cache = Arc::new(EmojiCache::new(
        DeadFetcher::default(),
        Arc::new(NegativeResourceRegistry::new()),
    ));
    let (loader, mut done) = EmojiLoader::start(Arc::clone(&cache), 1, 8);
    let engine = ChatEngine::new(
        FakeLookup::default(),
        CasingSettings::default(),
        cache,
        Arc::new(RecordingSurface::default()),
    )
    .with_loader(loader);

    engine.add_emoji(emoji("Kappa", "https://cdn.example.com/emoticons/25/1.0"));
    engine.on_event(msg("bob", "hi Kappa")).await;

    let completion: LoadCompletion = tokio::time::timeout(Duration::from_secs(5), done.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completion.identifier, "Kappa");
    assert!(!completion.loaded);
    assert!(engine.registry().contains("https://cdn.example.com/emoticons/25/1.0"));
    assert_eq!(engine.surface().messages().len(), 1);
}
