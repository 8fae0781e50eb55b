//! Browser history abstraction.

use std::cell::{Cell, RefCell};

/// The host's session history.
///
/// The navigation controller writes to it after each navigation. Changes made
/// by the user (back/forward, editing the hash) are reported back by the host
/// through [`Application::handle_location_change`](crate::Application::handle_location_change).
pub trait History {
	/// Returns the current href.
	fn href(&self) -> String;

	/// Adds an entry and makes it current, discarding any forward entries.
	fn push(&self, href: &str);

	/// Replaces the current entry.
	fn replace(&self, href: &str);

	/// Moves one entry back. Returns the new href, or `None` at the start or
	/// when the host completes the move asynchronously.
	fn back(&self) -> Option<String>;

	/// Moves one entry forward. Returns the new href, or `None` at the end or
	/// when the host completes the move asynchronously.
	fn forward(&self) -> Option<String>;
}

/// In-memory history for tests and non-browser hosts.
#[derive(Debug)]
pub struct MemoryHistory {
	entries: RefCell<Vec<String>>,
	index: Cell<usize>,
}

impl MemoryHistory {
	/// Creates a history holding a single entry.
	pub fn new(initial_href: impl Into<String>) -> Self {
		Self {
			entries: RefCell::new(vec![initial_href.into()]),
			index: Cell::new(0),
		}
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Always `false`; a history holds at least one entry.
	pub fn is_empty(&self) -> bool {
		false
	}

	/// Returns every entry, oldest first.
	pub fn entries(&self) -> Vec<String> {
		self.entries.borrow().clone()
	}

	/// Replaces the current href as if the user edited the address bar.
	///
	/// Unlike [`push`](History::push) this represents an external change; the
	/// host is expected to report it to the application.
	pub fn set_href(&self, href: impl Into<String>) {
		self.push(&href.into());
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new("http://localhost/")
	}
}

impl History for MemoryHistory {
	fn href(&self) -> String {
		self.entries.borrow()[self.index.get()].clone()
	}

	fn push(&self, href: &str) {
		let mut entries = self.entries.borrow_mut();
		entries.truncate(self.index.get() + 1);
		entries.push(href.to_string());
		self.index.set(entries.len() - 1);
	}

	fn replace(&self, href: &str) {
		self.entries.borrow_mut()[self.index.get()] = href.to_string();
	}

	fn back(&self) -> Option<String> {
		let index = self.index.get().checked_sub(1)?;
		self.index.set(index);
		Some(self.href())
	}

	fn forward(&self) -> Option<String> {
		let index = self.index.get() + 1;
		if index >= self.entries.borrow().len() {
			return None;
		}
		self.index.set(index);
		Some(self.href())
	}
}
