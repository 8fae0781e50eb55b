//! Built-in route guards.

use super::core::GuardContext;

/// Allows entry when the application state holds a truthy value under `key`.
///
/// ```
/// use mojo_pages::router::{Router, guards::require_flag};
///
/// let router = Router::new()
///     .route("/login", "login")
///     .guarded_route("/account", "account", require_flag("signed_in"));
/// # let _ = router;
/// ```
pub fn require_flag(key: impl Into<String>) -> impl Fn(&GuardContext<'_>) -> bool + 'static {
	let key = key.into();
	move |ctx: &GuardContext<'_>| ctx.state.flag(&key)
}

/// Allows entry when `permission` was granted in the application state.
pub fn require_permission(
	permission: impl Into<String>,
) -> impl Fn(&GuardContext<'_>) -> bool + 'static {
	let permission = permission.into();
	move |ctx: &GuardContext<'_>| ctx.state.has_permission(&permission)
}
