pub mod firebase_provider;
pub mod provider;
pub mod static_provider;

// Re-export from provider.rs so we can do "use crate::identity::*;"
pub use provider::*;
