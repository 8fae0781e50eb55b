//! Route table and matching.

use std::fmt;
use std::rc::Rc;

use super::pattern::RoutePattern;
use super::{Params, Query};
use crate::context::AppState;
use crate::error::RouterError;

/// What a guard sees when deciding whether a navigation may proceed.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
	/// Page the route is bound to.
	pub page_name: &'a str,
	/// Matched route parameters.
	pub params: &'a Params,
	/// Query parameters of the navigation.
	pub query: &'a Query,
	/// Application state.
	pub state: &'a AppState,
}

/// Entry guard predicate. Returning `false` rejects the navigation.
pub type Guard = Rc<dyn Fn(&GuardContext<'_>) -> bool>;

/// A registered route.
#[derive(Clone)]
pub struct RouteEntry {
	pattern: RoutePattern,
	page_name: String,
	guard: Option<Guard>,
}

impl fmt::Debug for RouteEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteEntry")
			.field("pattern", &self.pattern.pattern())
			.field("page_name", &self.page_name)
			.field("has_guard", &self.guard.is_some())
			.finish()
	}
}

impl RouteEntry {
	/// Returns the compiled pattern.
	pub fn pattern(&self) -> &RoutePattern {
		&self.pattern
	}

	/// Returns the bound page name.
	pub fn page_name(&self) -> &str {
		&self.page_name
	}

	/// Returns `true` if a guard is attached.
	pub fn has_guard(&self) -> bool {
		self.guard.is_some()
	}

	/// Attaches a guard, replacing any previous one.
	pub fn set_guard<G>(&mut self, guard: G) -> &mut Self
	where
		G: Fn(&GuardContext<'_>) -> bool + 'static,
	{
		self.guard = Some(Rc::new(guard));
		self
	}
}

/// Result of matching an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
	/// Page bound to the matching route.
	pub page_name: String,
	/// URL-decoded parameters.
	pub params: Params,
	/// The matching pattern as written.
	pub pattern: String,
	entry: usize,
}

/// Ordered route table.
///
/// Entries are tested in registration order and the first match wins. There
/// is no specificity ranking: with `/users/:id` registered before
/// `/users/new`, the address `/users/new` matches the first with
/// `id = "new"`.
#[derive(Clone, Default)]
pub struct Router {
	entries: Vec<RouteEntry>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("entries", &self.entries)
			.finish()
	}
}

impl Router {
	/// Creates an empty router.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a route.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid. Use [`add_route`](Self::add_route)
	/// for fallible registration.
	pub fn route(mut self, pattern: &str, page_name: &str) -> Self {
		if let Err(e) = self.add_route(pattern, page_name) {
			panic!("{e}");
		}
		self
	}

	/// Adds a route with an entry guard.
	///
	/// # Panics
	///
	/// Panics if the pattern is invalid.
	pub fn guarded_route<G>(mut self, pattern: &str, page_name: &str, guard: G) -> Self
	where
		G: Fn(&GuardContext<'_>) -> bool + 'static,
	{
		match self.add_route(pattern, page_name) {
			Ok(entry) => {
				entry.set_guard(guard);
			}
			Err(e) => panic!("{e}"),
		}
		self
	}

	/// Adds a route and returns it for further configuration.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidPattern`] if the pattern does not compile.
	pub fn add_route(
		&mut self,
		pattern: &str,
		page_name: &str,
	) -> Result<&mut RouteEntry, RouterError> {
		let pattern = RoutePattern::new(pattern)?;
		tracing::debug!(pattern = %pattern, page = page_name, "route registered");
		self.entries.push(RouteEntry {
			pattern,
			page_name: page_name.to_string(),
			guard: None,
		});
		let index = self.entries.len() - 1;
		Ok(&mut self.entries[index])
	}

	/// Returns the entries in registration order.
	pub fn entries(&self) -> &[RouteEntry] {
		&self.entries
	}

	/// Returns the number of routes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if no routes are registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns `true` if some route is bound to `page_name`.
	pub fn routes_page(&self, page_name: &str) -> bool {
		self.entries.iter().any(|entry| entry.page_name == page_name)
	}

	/// Matches a path against the routes in registration order.
	pub fn match_route(&self, path: &str) -> Option<RouteMatch> {
		let found = self
			.entries
			.iter()
			.enumerate()
			.find_map(|(index, entry)| entry.pattern.matches(path).map(|params| (index, params)));

		match found {
			Some((index, params)) => {
				let entry = &self.entries[index];
				tracing::trace!(address = path, pattern = %entry.pattern, page = %entry.page_name, "route matched");
				Some(RouteMatch {
					page_name: entry.page_name.clone(),
					params,
					pattern: entry.pattern.pattern().to_string(),
					entry: index,
				})
			}
			None => {
				tracing::trace!(address = path, "no route matched");
				None
			}
		}
	}

	/// Matches a path, failing with [`RouterError::NotFound`].
	pub fn resolve(&self, path: &str) -> Result<RouteMatch, RouterError> {
		self.match_route(path)
			.ok_or_else(|| RouterError::NotFound(path.to_string()))
	}

	/// Runs the matched route's guard. Routes without a guard always pass.
	pub fn check_guard(&self, route_match: &RouteMatch, query: &Query, state: &AppState) -> bool {
		let Some(guard) = self
			.entries
			.get(route_match.entry)
			.and_then(|entry| entry.guard.as_ref())
		else {
			return true;
		};
		guard(&GuardContext {
			page_name: &route_match.page_name,
			params: &route_match.params,
			query,
			state,
		})
	}

	/// Returns the first route bound to `page_name` that accepts `params`,
	/// along with the path built from it.
	pub(crate) fn route_for_page(
		&self,
		page_name: &str,
		params: &Params,
	) -> Option<(String, RouteMatch)> {
		self.entries
			.iter()
			.enumerate()
			.filter(|(_, entry)| entry.page_name == page_name)
			.find_map(|(index, entry)| {
				let path = entry.pattern.reverse(params).ok()?;
				let route_match = RouteMatch {
					page_name: entry.page_name.clone(),
					params: params.clone(),
					pattern: entry.pattern.pattern().to_string(),
					entry: index,
				};
				Some((path, route_match))
			})
	}

	/// Builds the path of the first route bound to `page_name` that accepts
	/// `params`.
	///
	/// # Errors
	///
	/// [`RouterError::UnroutedPage`] if no route is bound to the page, and
	/// [`RouterError::MissingParameter`] if every bound route lacks a
	/// parameter.
	pub fn reverse(&self, page_name: &str, params: &Params) -> Result<String, RouterError> {
		let mut first_missing = None;
		for entry in self.entries.iter().filter(|e| e.page_name == page_name) {
			match entry.pattern.reverse(params) {
				Ok(path) => return Ok(path),
				Err(param) => {
					first_missing.get_or_insert(param);
				}
			}
		}
		match first_missing {
			Some(param) => Err(RouterError::MissingParameter {
				page: page_name.to_string(),
				param,
			}),
			None => Err(RouterError::UnroutedPage(page_name.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::router::guards::require_flag;
	use rstest::rstest;

	fn users_router() -> Router {
		Router::new()
			.route("/", "home")
			.route("/users/:id", "user")
			.route("/users/new", "new-user")
	}

	#[rstest]
	fn test_first_registered_wins() {
		let router = users_router();

		let matched = router.match_route("/users/new").unwrap();

		assert_eq!(matched.page_name, "user");
		assert_eq!(matched.params["id"], "new");
		assert_eq!(matched.pattern, "/users/:id");
	}

	#[rstest]
	#[case("/users/42", Some("user"))]
	#[case("/users/42/extra", None)]
	#[case("/", Some("home"))]
	#[case("/missing", None)]
	fn test_match_route(#[case] path: &str, #[case] expected: Option<&str>) {
		let router = users_router();
		assert_eq!(
			router.match_route(path).map(|m| m.page_name),
			expected.map(str::to_string)
		);
	}

	#[rstest]
	fn test_resolve_not_found() {
		assert_eq!(
			users_router().resolve("/nope"),
			Err(RouterError::NotFound("/nope".to_string()))
		);
	}

	#[rstest]
	#[should_panic(expected = "invalid route pattern")]
	fn test_route_panics_on_invalid_pattern() {
		let _ = Router::new().route("/users/{id", "user");
	}

	#[rstest]
	fn test_add_route_is_fallible() {
		let mut router = Router::new();
		assert!(router.add_route("no-slash", "x").is_err());
		assert!(router.is_empty());
	}

	#[rstest]
	fn test_guard_sees_state() {
		let router = Router::new().guarded_route("/admin", "admin", require_flag("staff"));
		let state = AppState::default();
		let matched = router.match_route("/admin").unwrap();

		assert!(!router.check_guard(&matched, &Query::new(), &state));
		state.set("staff", true);
		assert!(router.check_guard(&matched, &Query::new(), &state));
	}

	#[rstest]
	fn test_unguarded_route_passes() {
		let router = users_router();
		let matched = router.match_route("/users/1").unwrap();
		assert!(router.check_guard(&matched, &Query::new(), &AppState::default()));
	}

	#[rstest]
	fn test_reverse() {
		let router = users_router();
		let params: Params = [("id".to_string(), "42".to_string())].into();

		assert_eq!(router.reverse("user", &params), Ok("/users/42".to_string()));
		assert_eq!(router.reverse("home", &Params::new()), Ok("/".to_string()));
		assert_eq!(
			router.reverse("user", &Params::new()),
			Err(RouterError::MissingParameter {
				page: "user".to_string(),
				param: "id".to_string()
			})
		);
		assert_eq!(
			router.reverse("settings", &Params::new()),
			Err(RouterError::UnroutedPage("settings".to_string()))
		);
	}

	#[rstest]
	fn test_reverse_falls_through_to_later_route() {
		let router = Router::new()
			.route("/posts/:slug", "post")
			.route("/posts", "post");

		assert_eq!(router.reverse("post", &Params::new()), Ok("/posts".to_string()));
	}
}
