//! Browser-backed history and location listening.
//!
//! Only compiled for `wasm32`; native hosts and tests use
//! [`MemoryHistory`](super::MemoryHistory).

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, Window};

use super::history::History;

/// [`History`] over the window's `History` and `Location` objects.
#[derive(Debug, Clone)]
pub struct BrowserHistory {
	window: Window,
}

impl BrowserHistory {
	/// Returns the history of the current window, or `None` outside a
	/// browsing context (workers, headless runners without a window).
	pub fn new() -> Option<Self> {
		web_sys::window().map(|window| Self { window })
	}

	fn session(&self) -> Option<web_sys::History> {
		match self.window.history() {
			Ok(history) => Some(history),
			Err(err) => {
				tracing::warn!(?err, "window history is unavailable");
				None
			}
		}
	}
}

impl History for BrowserHistory {
	fn href(&self) -> String {
		self.window.location().href().unwrap_or_else(|err| {
			tracing::warn!(?err, "failed to read location href");
			String::new()
		})
	}

	fn push(&self, href: &str) {
		let Some(session) = self.session() else {
			return;
		};
		if let Err(err) = session.push_state_with_url(&JsValue::NULL, "", Some(href)) {
			tracing::warn!(href, ?err, "pushState rejected");
		}
	}

	fn replace(&self, href: &str) {
		let Some(session) = self.session() else {
			return;
		};
		if let Err(err) = session.replace_state_with_url(&JsValue::NULL, "", Some(href)) {
			tracing::warn!(href, ?err, "replaceState rejected");
		}
	}

	/// Asks the browser to go back. The move completes asynchronously and is
	/// reported through `popstate`, so this always returns `None`.
	fn back(&self) -> Option<String> {
		if let Some(Err(err)) = self.session().map(|session| session.back()) {
			tracing::warn!(?err, "history.back failed");
		}
		None
	}

	/// Asks the browser to go forward; see [`back`](Self::back).
	fn forward(&self) -> Option<String> {
		if let Some(Err(err)) = self.session().map(|session| session.forward()) {
			tracing::warn!(?err, "history.forward failed");
		}
		None
	}
}

/// Window event types that signal an address change made outside the
/// application.
pub const LOCATION_EVENTS: [&str; 2] = ["popstate", "hashchange"];

/// Keeps `popstate` and `hashchange` listeners registered on the window.
///
/// The listeners are removed when this value is dropped; call
/// [`forget`](Self::forget) to keep them for the lifetime of the page.
pub struct LocationListener {
	window: Window,
	callback: Option<Closure<dyn FnMut(Event)>>,
}

impl LocationListener {
	/// Calls `on_change` whenever the user moves through history or edits
	/// the hash.
	///
	/// # Errors
	///
	/// Returns the JavaScript exception if there is no window or a listener
	/// could not be added.
	pub fn new<F>(mut on_change: F) -> Result<Self, JsValue>
	where
		F: FnMut() + 'static,
	{
		let window =
			web_sys::window().ok_or_else(|| JsValue::from_str("no window in this context"))?;
		let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
			tracing::trace!(event = %event.type_(), "location changed");
			on_change();
		});
		for event in LOCATION_EVENTS {
			window.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
		}
		Ok(Self {
			window,
			callback: Some(callback),
		})
	}

	/// Leaks the listeners so they outlive this value.
	pub fn forget(mut self) {
		if let Some(callback) = self.callback.take() {
			callback.forget();
		}
	}
}

impl std::fmt::Debug for LocationListener {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocationListener")
			.field("events", &LOCATION_EVENTS)
			.finish_non_exhaustive()
	}
}

impl Drop for LocationListener {
	fn drop(&mut self) {
		let Some(callback) = self.callback.take() else {
			return;
		};
		for event in LOCATION_EVENTS {
			if let Err(err) = self
				.window
				.remove_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			{
				tracing::warn!(event, ?err, "failed to remove location listener");
			}
		}
	}
}
