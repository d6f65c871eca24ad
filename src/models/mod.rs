pub mod provider_user;
pub mod session;

pub use provider_user::ProviderUser;
pub use session::{SessionState, SessionUser};
