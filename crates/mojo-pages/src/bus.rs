//! Application event bus.
//!
//! Collaborators learn about navigation and recovered failures by subscribing
//! here. Delivery is synchronous and in subscription order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::resource::Disposable;
use crate::router::{Params, Query};
use crate::view::ViewId;

/// Category of a recovered failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
	/// A template could not be fetched or parsed; the view rendered empty.
	TemplateResolution,
	/// No route matched an address.
	RouteNotFound,
	/// A route guard rejected a navigation.
	GuardRejection,
	/// An action handler returned an error.
	ActionHandler,
	/// A lifecycle hook returned an error.
	LifecycleHook,
	/// A child view's placeholder was missing from its parent's output.
	MissingContainer,
}

/// A failure that was handled locally and reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	/// Failure category.
	pub kind: DiagnosticKind,
	/// Human-readable description.
	pub message: String,
	/// View the failure happened in, if any.
	pub view_id: Option<ViewId>,
	/// Page involved, if any.
	pub page: Option<String>,
}

impl Diagnostic {
	/// Creates a diagnostic with no view or page attached.
	pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			view_id: None,
			page: None,
		}
	}

	/// Attaches the view id.
	pub fn with_view(mut self, view_id: ViewId) -> Self {
		self.view_id = Some(view_id);
		self
	}

	/// Attaches the page name.
	pub fn with_page(mut self, page: impl Into<String>) -> Self {
		self.page = Some(page.into());
		self
	}
}

/// Notifications published on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
	/// A navigation completed.
	RouteChanged {
		/// Page now active.
		page_name: String,
		/// Route parameters, URL-decoded.
		params: Params,
		/// Query parameters, URL-decoded.
		query: Query,
	},
	/// A page entered.
	PageActivated {
		/// Page name.
		page_name: String,
	},
	/// A page exited.
	PageDeactivated {
		/// Page name.
		page_name: String,
	},
	/// A route guard rejected a navigation.
	NavigationDenied {
		/// Page that was requested.
		page_name: String,
		/// Page shown instead, if a denied page is configured.
		redirect_to: Option<String>,
	},
	/// A failure was recovered.
	Diagnostic(Diagnostic),
}

type Handler = Rc<dyn Fn(&AppEvent)>;

#[derive(Default)]
struct BusInner {
	handlers: RefCell<Vec<(u64, Handler)>>,
	next_id: Cell<u64>,
}

/// Publish/subscribe hub shared through the [`AppContext`](crate::AppContext).
#[derive(Clone, Default)]
pub struct EventBus(Rc<BusInner>);

impl fmt::Debug for EventBus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventBus")
			.field("subscribers", &self.subscriber_count())
			.finish()
	}
}

impl EventBus {
	/// Creates an empty bus.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a handler.
	///
	/// The handler stays registered until the returned [`Subscription`] is
	/// dropped or disposed.
	#[must_use = "dropping the subscription unsubscribes immediately"]
	pub fn subscribe<F>(&self, handler: F) -> Subscription
	where
		F: Fn(&AppEvent) + 'static,
	{
		let id = self.0.next_id.get();
		self.0.next_id.set(id + 1);
		self.0.handlers.borrow_mut().push((id, Rc::new(handler)));
		Subscription {
			bus: Rc::downgrade(&self.0),
			id: Some(id),
		}
	}

	/// Delivers `event` to every current subscriber.
	///
	/// Handlers may subscribe or unsubscribe while running; such changes take
	/// effect from the next event.
	pub fn emit(&self, event: AppEvent) {
		let handlers: Vec<Handler> = self
			.0
			.handlers
			.borrow()
			.iter()
			.map(|(_, handler)| Rc::clone(handler))
			.collect();
		for handler in handlers {
			handler(&event);
		}
	}

	/// Returns the number of registered handlers.
	pub fn subscriber_count(&self) -> usize {
		self.0.handlers.borrow().len()
	}
}

/// Handle for a bus registration.
pub struct Subscription {
	bus: Weak<BusInner>,
	id: Option<u64>,
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription").field("id", &self.id).finish()
	}
}

impl Subscription {
	/// Removes the handler from the bus.
	pub fn unsubscribe(mut self) {
		self.release();
	}

	fn release(&mut self) {
		let (Some(id), Some(bus)) = (self.id.take(), self.bus.upgrade()) else {
			return;
		};
		bus.handlers.borrow_mut().retain(|(entry, _)| *entry != id);
	}
}

impl Disposable for Subscription {
	fn dispose(&mut self) {
		self.release();
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.release();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn activated(name: &str) -> AppEvent {
		AppEvent::PageActivated {
			page_name: name.to_string(),
		}
	}

	#[rstest]
	fn test_emit_reaches_subscribers_in_order() {
		// Arrange
		let bus = EventBus::new();
		let log = Rc::new(RefCell::new(Vec::new()));
		let first_log = Rc::clone(&log);
		let _first = bus.subscribe(move |_| first_log.borrow_mut().push("first"));
		let second_log = Rc::clone(&log);
		let _second = bus.subscribe(move |_| second_log.borrow_mut().push("second"));

		// Act
		bus.emit(activated("home"));

		// Assert
		assert_eq!(*log.borrow(), vec!["first", "second"]);
	}

	#[rstest]
	fn test_dropping_subscription_unsubscribes() {
		let bus = EventBus::new();
		let hits = Rc::new(Cell::new(0));
		let counter = Rc::clone(&hits);
		let subscription = bus.subscribe(move |_| counter.set(counter.get() + 1));

		bus.emit(activated("a"));
		drop(subscription);
		bus.emit(activated("b"));

		assert_eq!(hits.get(), 1);
		assert_eq!(bus.subscriber_count(), 0);
	}

	#[rstest]
	fn test_dispose_is_idempotent() {
		let bus = EventBus::new();
		let mut subscription = bus.subscribe(|_| {});

		subscription.dispose();
		subscription.dispose();

		assert_eq!(bus.subscriber_count(), 0);
	}

	#[rstest]
	fn test_subscription_outliving_bus() {
		let bus = EventBus::new();
		let subscription = bus.subscribe(|_| {});

		drop(bus);

		subscription.unsubscribe();
	}
}
