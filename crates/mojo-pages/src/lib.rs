//! Mojo Pages - client-side views, pages and routing
//!
//! A small framework for single-page applications built from template-driven
//! views. Views render logic-less templates against a JSON data bag, nest into
//! named containers, and map DOM interactions to named action handlers
//! through event delegation. Pages are views bound to routes; the navigation
//! controller activates them in a strict order and keeps one instance per
//! page name.
//!
//! ## Architecture
//!
//! - [`dom`]: in-memory host document with bubbling async events
//! - [`view`]: the view lifecycle engine
//! - [`delegation`]: action attributes and their handlers
//! - [`router`]: route patterns, reverse routing and the three addressing modes
//! - [`page`]: route-bound views with activation hooks and saved state
//! - [`navigation`]: the navigation controller and page cache
//! - [`bus`]: notifications and diagnostics
//! - [`config`]: TOML-loadable settings
//! - [`logging`]: tracing subscriber setup
//!
//! ## Example
//!
//! ```
//! use mojo_pages::prelude::*;
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let app = Application::builder()
//!     .document(Document::with_body(r#"<div id="app"></div>"#))
//!     .route("/", "home")
//!     .route("/users/:id", "user")
//!     .page("home", |ctx| Page::with_view(View::builder(ctx).inline("<h1>Home</h1>").build()))
//!     .page("user", |ctx| {
//!         Page::with_view(
//!             View::builder(ctx)
//!                 .inline("<h1>User {{id}}</h1>")
//!                 .data(json!({ "id": "?" }))
//!                 .build(),
//!         )
//!     })
//!     .build()
//!     .unwrap();
//!
//! app.start().await.unwrap();
//! app.navigate("/users/42").await.unwrap();
//!
//! let user = app.active_page().unwrap();
//! assert_eq!(user.name(), "user");
//! assert_eq!(user.param("id").as_deref(), Some("42"));
//! # });
//! ```

#![warn(missing_docs)]

mod app;
pub mod bus;
pub mod config;
pub mod context;
pub mod delegation;
pub mod dom;
pub mod error;
pub mod logging;
pub mod navigation;
pub mod page;
pub mod prelude;
pub mod resource;
pub mod router;
pub mod view;

pub use app::{Application, ApplicationBuilder};
pub use context::AppContext;
pub use mojo_pages_template as template;
