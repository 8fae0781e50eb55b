//! Disposable resources owned by views.
//!
//! Anything that must not outlive a view (timers, observers, bus
//! subscriptions, listeners on nodes the view does not own) is registered in
//! the view's [`ResourceScope`]. Destroying the view disposes the scope.

use std::cell::RefCell;
use std::fmt;

use crate::dom::{ListenerId, Node};

/// A resource that can be released.
///
/// `dispose` may be called more than once; calls after the first do nothing.
pub trait Disposable {
	/// Releases the resource.
	fn dispose(&mut self);
}

/// Runs a closure on disposal.
///
/// ```
/// use mojo_pages::resource::{OnDispose, ResourceScope};
/// use std::{cell::Cell, rc::Rc};
///
/// let stopped = Rc::new(Cell::new(false));
/// let scope = ResourceScope::new();
/// let flag = Rc::clone(&stopped);
/// scope.add(OnDispose::new(move || flag.set(true)));
///
/// scope.dispose_all();
/// assert!(stopped.get());
/// ```
pub struct OnDispose(Option<Box<dyn FnOnce()>>);

impl OnDispose {
	/// Wraps `release`.
	pub fn new(release: impl FnOnce() + 'static) -> Self {
		Self(Some(Box::new(release)))
	}
}

impl Disposable for OnDispose {
	fn dispose(&mut self) {
		if let Some(release) = self.0.take() {
			release();
		}
	}
}

/// Removes a DOM listener on disposal.
#[derive(Debug)]
pub struct ListenerGuard {
	node: Node,
	id: Option<ListenerId>,
}

impl ListenerGuard {
	/// Tracks listener `id` registered on `node`.
	pub fn new(node: Node, id: ListenerId) -> Self {
		Self { node, id: Some(id) }
	}
}

impl Disposable for ListenerGuard {
	fn dispose(&mut self) {
		if let Some(id) = self.id.take() {
			self.node.remove_event_listener(id);
		}
	}
}

/// An ordered set of resources released together.
#[derive(Default)]
pub struct ResourceScope {
	resources: RefCell<Vec<Box<dyn Disposable>>>,
}

impl fmt::Debug for ResourceScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResourceScope")
			.field("len", &self.len())
			.finish()
	}
}

impl ResourceScope {
	/// Creates an empty scope.
	pub fn new() -> Self {
		Self::default()
	}

	/// Takes ownership of `resource`.
	pub fn add(&self, resource: impl Disposable + 'static) {
		self.resources.borrow_mut().push(Box::new(resource));
	}

	/// Registers a release closure.
	pub fn on_dispose(&self, release: impl FnOnce() + 'static) {
		self.add(OnDispose::new(release));
	}

	/// Returns the number of live resources.
	pub fn len(&self) -> usize {
		self.resources.borrow().len()
	}

	/// Returns `true` if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.resources.borrow().is_empty()
	}

	/// Disposes every resource, most recently added first.
	///
	/// Resources registered by a disposer while this runs are disposed too.
	pub fn dispose_all(&self) {
		loop {
			let drained = std::mem::take(&mut *self.resources.borrow_mut());
			if drained.is_empty() {
				break;
			}
			for mut resource in drained.into_iter().rev() {
				resource.dispose();
			}
		}
	}
}

impl Drop for ResourceScope {
	fn drop(&mut self) {
		self.dispose_all();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::rc::Rc;

	#[rstest]
	fn test_dispose_all_reverse_order() {
		// Arrange
		let log = Rc::new(RefCell::new(Vec::new()));
		let scope = ResourceScope::new();
		for name in ["timer", "observer", "subscription"] {
			let log = Rc::clone(&log);
			scope.on_dispose(move || log.borrow_mut().push(name));
		}

		// Act
		scope.dispose_all();

		// Assert
		assert_eq!(*log.borrow(), vec!["subscription", "observer", "timer"]);
		assert!(scope.is_empty());
	}

	#[rstest]
	fn test_listener_guard_removes_listener() {
		let node = Node::element("div");
		let id = node.add_event_listener("scroll", |_| Box::pin(async {}));
		let scope = ResourceScope::new();
		scope.add(ListenerGuard::new(node.clone(), id));

		scope.dispose_all();

		assert_eq!(node.listener_count(), 0);
	}

	#[rstest]
	fn test_resources_added_during_disposal_are_released() {
		let scope = Rc::new(ResourceScope::new());
		let released = Rc::new(RefCell::new(Vec::new()));
		let inner_scope = Rc::clone(&scope);
		let inner_released = Rc::clone(&released);
		scope.on_dispose(move || {
			let late = Rc::clone(&inner_released);
			inner_scope.on_dispose(move || late.borrow_mut().push("late"));
			inner_released.borrow_mut().push("first");
		});

		scope.dispose_all();

		assert_eq!(*released.borrow(), vec!["first", "late"]);
		assert!(scope.is_empty());
	}
}
