mod middleware;
mod route_guard;

pub use middleware::{is_asset, is_navigation, navigation_guard, site_file};
pub use route_guard::{Decision, GuardConfig, RouteGuard};
