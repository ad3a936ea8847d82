//! Chat message assembly and username resolution.
//!
//! Turns raw chat handles into stable display names according to the
//! configured [`CasingPolicy`] and stamps each message with the sender's
//! running post count.

pub mod assembler;
pub mod casing;
pub mod models;

pub use assembler::MessageAssembler;
pub use casing::{CasingSettings, UsernameResolver};
pub use models::{CasingPolicy, ChatMessage, MessageType, ParsePolicyError};
