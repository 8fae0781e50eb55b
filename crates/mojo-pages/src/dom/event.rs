//! DOM events and bubbling dispatch.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::node::Node;

struct EventInner {
	event_type: String,
	target: Node,
	current_target: RefCell<Option<Node>>,
	propagation_stopped: Cell<bool>,
	default_prevented: Cell<bool>,
}

/// A bubbling event.
///
/// Cloning shares the same event, so flags set by one listener are visible
/// to the dispatcher and later listeners.
#[derive(Clone)]
pub struct Event(Rc<EventInner>);

impl std::fmt::Debug for Event {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Event")
			.field("type", &self.0.event_type)
			.field("target", &self.0.target.tag_name())
			.field("propagation_stopped", &self.0.propagation_stopped.get())
			.field("default_prevented", &self.0.default_prevented.get())
			.finish()
	}
}

impl Event {
	/// Creates an undispatched event aimed at `target`.
	pub fn new(event_type: &str, target: Node) -> Self {
		Self(Rc::new(EventInner {
			event_type: event_type.to_string(),
			target,
			current_target: RefCell::new(None),
			propagation_stopped: Cell::new(false),
			default_prevented: Cell::new(false),
		}))
	}

	/// Returns the event type, e.g. `"click"`.
	pub fn event_type(&self) -> &str {
		&self.0.event_type
	}

	/// Returns the node the event was dispatched at.
	pub fn target(&self) -> &Node {
		&self.0.target
	}

	/// Returns the node whose listeners are currently running.
	pub fn current_target(&self) -> Option<Node> {
		self.0.current_target.borrow().clone()
	}

	/// Stops bubbling after the current node's listeners finish.
	pub fn stop_propagation(&self) {
		self.0.propagation_stopped.set(true);
	}

	/// Returns `true` once [`stop_propagation`](Self::stop_propagation) was called.
	pub fn is_propagation_stopped(&self) -> bool {
		self.0.propagation_stopped.get()
	}

	/// Marks the default action as cancelled.
	pub fn prevent_default(&self) {
		self.0.default_prevented.set(true);
	}

	/// Returns `true` once [`prevent_default`](Self::prevent_default) was called.
	pub fn is_default_prevented(&self) -> bool {
		self.0.default_prevented.get()
	}

	/// Walks from the target to the root, awaiting each listener in turn.
	pub async fn dispatch(&self) {
		let path: Vec<Node> = self.0.target.ancestors().collect();
		for node in path {
			*self.0.current_target.borrow_mut() = Some(node.clone());
			for listener in node.listeners_for(&self.0.event_type) {
				listener(self.clone()).await;
			}
			if self.is_propagation_stopped() {
				break;
			}
		}
		*self.0.current_target.borrow_mut() = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_event_bubbles_target_first() {
		// Arrange
		let log = Rc::new(RefCell::new(Vec::new()));
		let outer = Node::element("div");
		let inner = Node::element("button");
		outer.append_child(&inner);
		for (node, name) in [(&outer, "outer"), (&inner, "inner")] {
			let log = Rc::clone(&log);
			node.add_event_listener("click", move |_| {
				let log = Rc::clone(&log);
				Box::pin(async move {
					log.borrow_mut().push(name);
				})
			});
		}

		// Act
		inner.dispatch_event("click").await;

		// Assert
		assert_eq!(*log.borrow(), vec!["inner", "outer"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_stop_propagation_halts_bubbling() {
		let hits = Rc::new(Cell::new(0));
		let outer = Node::element("div");
		let inner = Node::element("span");
		outer.append_child(&inner);
		inner.add_event_listener("click", |event| {
			event.stop_propagation();
			Box::pin(async {})
		});
		let outer_hits = Rc::clone(&hits);
		outer.add_event_listener("click", move |_| {
			outer_hits.set(outer_hits.get() + 1);
			Box::pin(async {})
		});

		let event = inner.dispatch_event("click").await;

		assert!(event.is_propagation_stopped());
		assert_eq!(hits.get(), 0);
	}
}
