//! Route pattern matching and addressing.
//!
//! The router turns an address into `(page name, params)` and is independent
//! of where the address lives in the URL; [`Addressing`] handles that part for
//! each [`RouterMode`](crate::config::RouterMode).
//!
//! ```
//! use mojo_pages::router::Router;
//!
//! let router = Router::new()
//!     .route("/", "home")
//!     .route("/users/:id", "user")
//!     .route("/files/{name}.{ext}", "file");
//!
//! let matched = router.match_route("/users/a%20b").unwrap();
//! assert_eq!(matched.page_name, "user");
//! assert_eq!(matched.params["id"], "a b");
//! assert!(router.match_route("/users/42/extra").is_none());
//! ```

mod address;
#[cfg(target_arch = "wasm32")]
mod browser;
mod core;
pub mod guards;
mod history;
mod pattern;
mod query;

use std::collections::BTreeMap;

pub use address::{Addressing, Location};
#[cfg(target_arch = "wasm32")]
pub use browser::{BrowserHistory, LOCATION_EVENTS, LocationListener};
pub use self::core::{Guard, GuardContext, RouteEntry, RouteMatch, Router};
pub use history::{History, MemoryHistory};
pub use pattern::RoutePattern;
pub use query::{parse_query, serialize_query, split_address};

/// Route parameters by name.
pub type Params = BTreeMap<String, String>;

/// Query parameters by name.
pub type Query = BTreeMap<String, String>;
