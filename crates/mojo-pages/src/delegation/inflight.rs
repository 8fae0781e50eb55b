//! Re-entrancy guard for async actions.

use std::cell::Cell;
use std::rc::Rc;

/// Tracks whether an async operation is running, so a second click on the
/// same button while the first request is pending can be ignored.
///
/// ```
/// use mojo_pages::delegation::InFlight;
///
/// let saving = InFlight::new();
/// let guard = saving.try_begin().unwrap();
/// assert!(saving.try_begin().is_none());
/// drop(guard);
/// assert!(!saving.is_active());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InFlight(Rc<Cell<bool>>);

impl InFlight {
	/// Creates an idle tracker.
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the operation as started, or returns `None` if it already is.
	pub fn try_begin(&self) -> Option<InFlightGuard> {
		if self.0.replace(true) {
			return None;
		}
		Some(InFlightGuard(Rc::clone(&self.0)))
	}

	/// Returns `true` while a guard is alive.
	pub fn is_active(&self) -> bool {
		self.0.get()
	}
}

/// Marks the operation finished when dropped.
#[derive(Debug)]
#[must_use = "the operation is marked finished as soon as the guard is dropped"]
pub struct InFlightGuard(Rc<Cell<bool>>);

impl Drop for InFlightGuard {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_clones_share_state() {
		let a = InFlight::new();
		let b = a.clone();

		let guard = a.try_begin();
		assert!(guard.is_some());
		assert!(b.is_active());
		assert!(b.try_begin().is_none());

		drop(guard);
		assert!(b.try_begin().is_some());
	}
}
