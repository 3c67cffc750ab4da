//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that dispatches keys to
//!   [`crate::commands`] and the [`crate::core::app::App`], and runs chat
//!   turns in the background.
//! - [`renderer`], [`transcript`] and [`markdown`]: frame composition.
//! - [`theme`]: styles.
//! - [`picker`]: list selection state for models, templates and chats.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod markdown;
pub mod picker;
pub mod renderer;
pub mod theme;
pub mod transcript;
