//! Session state published from the identity provider.
//!
//! The [`SessionSlot`] is the single observable value holding the current
//! session; the [`SessionMirror`] is its only writer.

mod mirror;
mod slot;

pub use mirror::{ProviderInitError, SessionConfig, SessionMirror};
pub use slot::{Readiness, SessionSlot};
