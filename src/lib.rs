//! # Mojo
//!
//! Client-side views, pages and routing for single-page applications.
//!
//! This crate re-exports [`mojo_pages`], the framework crate. See its
//! documentation for the architecture; the short version:
//!
//! - a [`View`](view::View) renders a logic-less template against its data,
//!   nests child views into named containers and dispatches delegated DOM
//!   events to named action handlers;
//! - a [`Page`](page::Page) is a view bound to a route, with activation hooks;
//! - the [`Router`](router::Router) maps addresses to pages in hash, history
//!   or query-parameter mode;
//! - the [`Navigator`](navigation::Navigator) swaps pages in a strict
//!   exit-then-enter order and keeps one instance per page.
//!
//! ## Feature Flags
//!
//! - `subscriber` - lets [`logging::init`] install a `tracing` subscriber
//!   (fmt with `RUST_LOG` filtering on native targets, the browser console
//!   on `wasm32`)
//!
//! ## Quick Start
//!
//! ```
//! use mojo::prelude::*;
//!
//! # block_on(async {
//! let app = Application::builder()
//!     .document(Document::with_body(r#"<div id="app"></div>"#))
//!     .route("/", "home")
//!     .page("home", |ctx| Page::with_view(View::builder(ctx).inline("<h1>Hello</h1>").build()))
//!     .build()
//!     .unwrap();
//!
//! app.start().await.unwrap();
//! assert!(app.context().document().body().inner_html().contains("<h1>Hello</h1>"));
//! # });
//! # fn block_on(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub use mojo_pages::*;
