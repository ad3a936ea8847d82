//! Render surface seam.
//!
//! The engine never paints anything. It hands finished messages and
//! moderation notices to a [`RenderSurface`], which owns the actual
//! display (overlay window, web socket, stdout...).

use std::io::Write;
use std::sync::Mutex;

use chat_core::ChatMessage;
use emoji_cache::LoadCompletion;
use serde::Serialize;

pub trait RenderSurface: Send + Sync {
    fn add_message(&self, message: ChatMessage);

    fn ban_user(&self, channel: &str, host_mask: &str);

    fn unban_user(&self, channel: &str, host_mask: &str);

    fn connection_changed(&self, _connected: bool) {}

    /// A background emoji load finished; repaint lines that use it.
    fn emoji_loaded(&self, _completion: &LoadCompletion) {}
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum SurfaceLine<'a> {
    Message(&'a ChatMessage),
    Ban {
        channel: &'a str,
        #[serde(rename = "hostMask")]
        host_mask: &'a str,
    },
    Unban {
        channel: &'a str,
        #[serde(rename = "hostMask")]
        host_mask: &'a str,
    },
    Connection {
        connected: bool,
    },
    EmojiLoaded {
        identifier: &'a str,
        url: &'a str,
        loaded: bool,
    },
}

/// Writes every surface call as one JSON object per line.
pub struct JsonLinesSurface<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, line: &SurfaceLine<'_>) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = write_line(&mut *out, line) {
            tracing::error!(error = %e, "Failed to write surface output");
        }
    }
}

fn write_line<W: Write>(out: &mut W, line: &SurfaceLine<'_>) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, line)?;
    out.write_all(b"\n")?;
    out.flush()
}

impl<W: Write + Send> RenderSurface for JsonLinesSurface<W> {
    fn add_message(&self, message: ChatMessage) {
        self.emit(&SurfaceLine::Message(&message));
    }

    fn ban_user(&self, channel: &str, host_mask: &str) {
        self.emit(&SurfaceLine::Ban { channel, host_mask });
    }

    fn unban_user(&self, channel: &str, host_mask: &str) {
        self.emit(&SurfaceLine::Unban { channel, host_mask });
    }

    fn connection_changed(&self, connected: bool) {
        self.emit(&SurfaceLine::Connection { connected });
    }

    fn emoji_loaded(&self, completion: &LoadCompletion) {
        self.emit(&SurfaceLine::EmojiLoaded {
            identifier: &completion.identifier,
            url: &completion.url,
            loaded: completion.loaded,
        });
    }
}
