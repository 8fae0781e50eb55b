//! Browser history and location forwarding.
//!
//! Run with `wasm-pack test --headless --chrome crates/mojo-pages`.

#[cfg(target_arch = "wasm32")]
mod browser_tests {
	use futures::StreamExt;
	use futures::channel::mpsc;
	use mojo_pages::prelude::*;
	use mojo_pages::router::{BrowserHistory, History, LocationListener};
	use wasm_bindgen_test::*;

	wasm_bindgen_test_configure!(run_in_browser);

	fn with_hash(history: &BrowserHistory, hash: &str) -> String {
		let href = history.href();
		let base = href.split('#').next().unwrap_or_default();
		format!("{base}{hash}")
	}

	fn set_hash(hash: &str) {
		web_sys::window().unwrap().location().set_hash(hash).unwrap();
	}

	#[wasm_bindgen_test]
	fn test_push_and_replace_update_the_location() {
		// Arrange
		let history = BrowserHistory::new().unwrap();
		let pushed = with_hash(&history, "#/about");
		let replaced = with_hash(&history, "#/users/1");

		// Act & Assert
		history.push(&pushed);
		assert_eq!(history.href(), pushed);
		history.replace(&replaced);
		assert_eq!(history.href(), replaced);
	}

	#[wasm_bindgen_test]
	async fn test_hash_edit_reaches_the_listener() {
		// Arrange
		let (tx, mut rx) = mpsc::unbounded();
		let listener = LocationListener::new(move || {
			let _ = tx.unbounded_send(());
		})
		.unwrap();

		// Act
		set_hash("#/edited");

		// Assert
		assert!(rx.next().await.is_some());
		drop(listener);
	}

	#[wasm_bindgen_test]
	async fn test_application_follows_hash_edits() {
		// Arrange
		set_hash("#/");
		let app = Application::builder()
			.document(Document::with_body(r#"<div id="app"></div>"#))
			.route("/", "home")
			.route("/about", "about")
			.page("home", |ctx| {
				Page::with_view(View::builder(ctx).inline("<h1>Home</h1>").build())
			})
			.page("about", |ctx| {
				Page::with_view(View::builder(ctx).inline("<h1>About</h1>").build())
			})
			.build()
			.unwrap();
		app.start().await.unwrap();
		let _forwarding = app.listen_for_location_changes().unwrap();
		let (tx, mut rx) = mpsc::unbounded();
		let _observer = LocationListener::new(move || {
			let _ = tx.unbounded_send(());
		})
		.unwrap();

		// Act
		set_hash("#/about");
		rx.next().await;
		// Settles any navigation the forwarded event is still running; the
		// controller ignores an href it already shows.
		app.handle_location_change().await.unwrap();

		// Assert
		assert_eq!(app.active_page().unwrap().name(), "about");
		assert!(app.history().href().ends_with("#/about"));
	}
}
