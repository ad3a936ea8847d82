//! Chat event handling.
//!
//! [`ChatEngine`] ties the username resolver, the message assembler and the
//! emoji cache together and pushes results to a [`RenderSurface`].

use std::sync::Arc;

use chat_client::{IdentityLookup, ResourceFetcher};
use chat_core::{CasingSettings, ChatMessage, MessageAssembler, MessageType, UsernameResolver};
use emoji_cache::{EmojiCache, EmojiLoader, NegativeResourceRegistry};

use crate::events::{ChatEvent, ConfigEvent, EmojiDefinition, EngineInput};
use crate::surface::RenderSurface;

pub struct ChatEngine<L, F, S> {
    resolver: UsernameResolver<L>,
    assembler: MessageAssembler,
    emoji: Arc<EmojiCache<F>>,
    loader: Option<EmojiLoader>,
    surface: Arc<S>,
}

impl<L, F, S> ChatEngine<L, F, S>
where
    L: IdentityLookup,
    F: ResourceFetcher,
    S: RenderSurface,
{
    pub fn new(
        lookup: L,
        settings: CasingSettings,
        emoji: Arc<EmojiCache<F>>,
        surface: Arc<S>,
    ) -> Self {
        Self {
            resolver: UsernameResolver::new(lookup, settings),
            assembler: MessageAssembler::new(),
            emoji,
            loader: None,
            surface,
        }
    }

    /// Queue background loads for emojis found in assembled messages.
    pub fn with_loader(mut self, loader: EmojiLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn resolver(&self) -> &UsernameResolver<L> {
        &self.resolver
    }

    pub fn assembler(&self) -> &MessageAssembler {
        &self.assembler
    }

    pub fn emoji(&self) -> &Arc<EmojiCache<F>> {
        &self.emoji
    }

    pub fn registry(&self) -> &Arc<NegativeResourceRegistry> {
        self.emoji.registry()
    }

    pub fn loader(&self) -> Option<&EmojiLoader> {
        self.loader.as_ref()
    }

    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    pub async fn handle(&self, input: EngineInput) {
        match input {
            EngineInput::Chat(event) => self.on_event(event).await,
            EngineInput::Config(event) => self.apply_config(event),
            EngineInput::Emoji(def) => self.add_emoji(def),
        }
    }

    pub async fn on_event(&self, event: ChatEvent) {
        match event {
            ChatEvent::Join { channel, sender } => {
                let body = format!("joined {channel}.");
                self.post(MessageType::Join, &sender, body).await;
            }
            ChatEvent::Action { sender, action, .. } => {
                self.post(MessageType::Action, &sender, action).await;
            }
            ChatEvent::Message { sender, body, .. } => {
                self.post(MessageType::Normal, &sender, body).await;
            }
            ChatEvent::Manual { sender, body } => {
                self.post(MessageType::Manual, &sender, body).await;
            }
            ChatEvent::PrivateMessage { sender, body } => {
                tracing::info!(%sender, %body, "Private message");
            }
            ChatEvent::ChannelBan { channel, host_mask } => {
                tracing::info!(%channel, %host_mask, "Ban");
                self.surface.ban_user(&channel, &host_mask);
            }
            ChatEvent::ChannelUnban { channel, host_mask } => {
                tracing::info!(%channel, %host_mask, "Unban");
                self.surface.unban_user(&channel, &host_mask);
            }
            ChatEvent::Connected => {
                tracing::info!("Chat connected");
                self.surface.connection_changed(true);
            }
            ChatEvent::Disconnected => {
                tracing::info!("Chat disconnected");
                self.surface.connection_changed(false);
            }
        }
    }

    /// Apply an operator configuration change. Caches are only ever cleared here.
    pub fn apply_config(&self, event: ConfigEvent) {
        match event {
            ConfigEvent::CasingChanged {
                policy,
                infer_from_body,
            } => {
                self.resolver.set_settings(CasingSettings {
                    policy,
                    infer_from_body,
                });
                self.resolver.clear();
                tracing::info!(%policy, infer_from_body, "Casing settings changed");
            }
            ConfigEvent::EmojiSourcesChanged => {
                self.emoji.clear();
                tracing::info!("Emoji sources changed, records dropped");
            }
            ConfigEvent::SessionReset => {
                self.resolver.clear();
                self.assembler.reset();
                tracing::info!("Session reset");
            }
        }
    }

    pub fn add_emoji(&self, def: EmojiDefinition) {
        let identifier = def.emoji.clone();
        match def.into_record() {
            Ok(record) => {
                self.emoji.insert(record);
            }
            Err(e) => tracing::warn!(%identifier, error = %e, "Rejected emoji definition"),
        }
    }

    async fn post(&self, message_type: MessageType, sender: &str, body: String) {
        let username = self.resolver.resolve(sender, &body, message_type).await;
        let message = self.assembler.assemble(message_type, &username, body);
        self.warm_emojis(&message);
        self.surface.add_message(message);
    }

    fn warm_emojis(&self, message: &ChatMessage) {
        let Some(loader) = &self.loader else {
            return;
        };
        for found in self.emoji.scan(message.body()) {
            if let Err(e) = loader.request(&found.record, true) {
                tracing::debug!(identifier = found.record.identifier(), error = %e, "Emoji warm-up skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests;
