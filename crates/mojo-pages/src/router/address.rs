//! Mapping between full location hrefs and route addresses.
//!
//! The three [`RouterMode`]s store the same `(path, query)` pair in different
//! parts of the URL:
//!
//! | Mode | href for `/users/42?tab=posts` |
//! |------|--------------------------------|
//! | `Hash` | `https://host/#/users/42?tab=posts` |
//! | `History` (base `/app`) | `https://host/app/users/42?tab=posts` |
//! | `Query` (key `page`) | `https://host/?page=%2Fusers%2F42&tab=posts` |

use url::Url;

use super::Query;
use super::query::{normalize_path, parse_query, serialize_query, split_address};
use crate::config::{AppConfig, RouterMode};

/// A route address: path plus query.
///
/// The path stays percent-encoded; route parameters are decoded after
/// matching so that an encoded `/` never splits a segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
	/// Route path, always starting with `/`.
	pub path: String,
	/// Query parameters.
	pub query: Query,
}

impl Location {
	/// Creates a location.
	pub fn new(path: impl Into<String>, query: Query) -> Self {
		Self {
			path: normalize_path(&path.into()),
			query,
		}
	}

	/// Parses `path?query`.
	pub fn parse(address: &str) -> Self {
		let (path, query) = split_address(address);
		Self { path, query }
	}

	/// Formats as `path?query`, omitting an empty query.
	pub fn to_address(&self) -> String {
		if self.query.is_empty() {
			self.path.clone()
		} else {
			format!("{}?{}", self.path, serialize_query(&self.query))
		}
	}
}

/// Reads and writes route addresses in hrefs according to the router mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addressing {
	mode: RouterMode,
	base_path: String,
	query_param: String,
}

impl Addressing {
	/// Creates an addressing scheme.
	pub fn new(mode: RouterMode, base_path: &str, query_param: &str) -> Self {
		let base_path = base_path.trim_end_matches('/').to_string();
		Self {
			mode,
			base_path,
			query_param: query_param.to_string(),
		}
	}

	/// Creates the scheme described by `config`.
	pub fn from_config(config: &AppConfig) -> Self {
		Self::new(config.router_mode, &config.base_path, &config.query_param)
	}

	/// Returns the mode.
	pub fn mode(&self) -> RouterMode {
		self.mode
	}

	/// Extracts the route address from an href.
	///
	/// Unparseable hrefs read as `/`.
	pub fn location(&self, href: &str) -> Location {
		let Ok(url) = Url::parse(href) else {
			tracing::warn!(href, "unparseable location href");
			return Location::new("/", Query::new());
		};

		match self.mode {
			RouterMode::Hash => Location::parse(url.fragment().unwrap_or_default()),
			RouterMode::History => {
				let path = url.path();
				let path = match path.strip_prefix(&self.base_path) {
					Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
					_ => path,
				};
				Location::new(path, parse_query(url.query().unwrap_or_default()))
			}
			RouterMode::Query => {
				let mut query = parse_query(url.query().unwrap_or_default());
				let path = query
					.remove(&self.query_param)
					.unwrap_or_else(|| "/".to_string());
				Location::new(path, query)
			}
		}
	}

	/// Returns `current_href` rewritten to point at `location`.
	///
	/// Parts of the URL the mode does not use are kept.
	pub fn href(&self, current_href: &str, location: &Location) -> String {
		let Ok(mut url) = Url::parse(current_href) else {
			tracing::warn!(href = current_href, "unparseable location href");
			return location.to_address();
		};

		match self.mode {
			RouterMode::Hash => url.set_fragment(Some(&location.to_address())),
			RouterMode::History => {
				url.set_path(&format!("{}{}", self.base_path, location.path));
				let query = serialize_query(&location.query);
				url.set_query((!query.is_empty()).then_some(query.as_str()));
				url.set_fragment(None);
			}
			RouterMode::Query => {
				let mut query = location.query.clone();
				query.insert(self.query_param.clone(), location.path.clone());
				url.set_query(Some(&serialize_query(&query)));
				url.set_fragment(None);
			}
		}
		url.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn location(address: &str) -> Location {
		Location::parse(address)
	}

	#[rstest]
	#[case(RouterMode::Hash, "http://localhost/#/users/42?tab=posts", "/users/42?tab=posts")]
	#[case(RouterMode::Hash, "http://localhost/", "/")]
	#[case(RouterMode::Hash, "http://localhost/#users", "/users")]
	#[case(RouterMode::History, "http://localhost/app/users/42?tab=posts", "/users/42?tab=posts")]
	#[case(RouterMode::History, "http://localhost/app", "/")]
	#[case(RouterMode::History, "http://localhost/apple", "/apple")]
	#[case(RouterMode::History, "http://localhost/app/search/a%20b", "/search/a%20b")]
	#[case(RouterMode::Query, "http://localhost/?page=%2Fusers%2F42&tab=posts", "/users/42?tab=posts")]
	#[case(RouterMode::Query, "http://localhost/?tab=posts", "/?tab=posts")]
	fn test_location(#[case] mode: RouterMode, #[case] href: &str, #[case] expected: &str) {
		let addressing = Addressing::new(mode, "/app/", "page");
		assert_eq!(addressing.location(href), location(expected));
	}

	#[rstest]
	#[case(RouterMode::Hash, "http://localhost/index.html?v=1", "http://localhost/index.html?v=1#/users/42?tab=posts")]
	#[case(RouterMode::History, "http://localhost/app/old#top", "http://localhost/app/users/42?tab=posts")]
	#[case(RouterMode::Query, "http://localhost/", "http://localhost/?page=%2Fusers%2F42&tab=posts")]
	fn test_href(#[case] mode: RouterMode, #[case] current: &str, #[case] expected: &str) {
		let addressing = Addressing::new(mode, "/app", "page");
		assert_eq!(addressing.href(current, &location("/users/42?tab=posts")), expected);
	}

	#[rstest]
	#[case(RouterMode::Hash)]
	#[case(RouterMode::History)]
	#[case(RouterMode::Query)]
	fn test_href_then_location(#[case] mode: RouterMode) {
		let addressing = Addressing::new(mode, "/", "page");
		let target = location("/search/a%20b?q=x%26y&sort=asc");

		let href = addressing.href("http://localhost/", &target);

		assert_eq!(addressing.location(&href), target);
	}
}
