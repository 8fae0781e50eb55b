//! The navigation controller.
//!
//! [`Navigator`] owns the page container and the page cache. Each call to
//! [`Navigator::navigate`] runs the whole transition under a lock, so
//! concurrent requests are applied one after the other:
//!
//! 1. resolve the target through the [`Router`](crate::router::Router),
//!    falling back to the configured not-found page;
//! 2. run the route guard, redirecting to the denied page on rejection;
//! 3. exit the previous page;
//! 4. fetch or create the target page, deliver its parameters and enter it;
//! 5. render it and swap it into the page container;
//! 6. publish the change and write the address back to the history.

mod controller;
mod registry;

pub use controller::Navigator;
pub use registry::{PageFactory, PageRegistry};

use crate::router::{Params, Query};

/// Where to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
	/// A route address such as `/users/42?tab=posts`.
	Address(String),
	/// A page by name. The address is built by reverse routing.
	Page {
		/// Page name.
		name: String,
		/// Route parameters.
		params: Params,
		/// Query parameters.
		query: Query,
	},
}

impl NavTarget {
	/// Targets a route address.
	pub fn address(address: impl Into<String>) -> Self {
		Self::Address(address.into())
	}

	/// Targets a page by name.
	pub fn page(name: impl Into<String>) -> Self {
		Self::Page {
			name: name.into(),
			params: Params::new(),
			query: Query::new(),
		}
	}

	/// Adds a route parameter to a page target. Addresses are unchanged.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		if let Self::Page { params, .. } = &mut self {
			params.insert(key.into(), value.into());
		}
		self
	}

	/// Adds a query parameter to a page target. Addresses are unchanged.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		if let Self::Page { query, .. } = &mut self {
			query.insert(key.into(), value.into());
		}
		self
	}
}

impl From<&str> for NavTarget {
	fn from(address: &str) -> Self {
		Self::address(address)
	}
}

impl From<String> for NavTarget {
	fn from(address: String) -> Self {
		Self::Address(address)
	}
}

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
	/// The page is now active. `generation` counts completed navigations.
	Activated {
		/// Page shown.
		page_name: String,
		/// Navigation counter after this one.
		generation: u64,
	},
	/// No route matched; the not-found page is shown.
	NotFound {
		/// Address that failed to match.
		address: String,
		/// The not-found page.
		page_name: String,
	},
	/// A guard rejected the target.
	Denied {
		/// Page that was requested.
		page_name: String,
		/// Denied page shown instead; `None` leaves the previous page active.
		redirected_to: Option<String>,
	},
	/// The location change was written by the controller itself.
	Ignored,
}
