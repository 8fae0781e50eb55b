//! Action handlers and the context they receive.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::dom::{Event, Node};
use crate::view::View;

/// A boxed action handler.
pub type ActionHandler = Rc<dyn Fn(ActionContext) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

/// What an action handler sees.
#[derive(Debug, Clone)]
pub struct ActionContext {
	/// View whose handler runs.
	pub view: View,
	/// The DOM event.
	pub event: Event,
	/// Element carrying the action attribute.
	pub element: Node,
	/// Normalized action name.
	pub action: String,
	/// The element's `data-*` attributes, prefix stripped and dashes turned
	/// into underscores. Action attributes and framework markers are left
	/// out.
	pub data: BTreeMap<String, String>,
}

impl ActionContext {
	/// Returns one `data-*` value.
	pub fn data(&self, key: &str) -> Option<&str> {
		self.data.get(key).map(String::as_str)
	}

	/// Returns the element's form value.
	pub fn value(&self) -> Option<String> {
		self.element.value()
	}
}

/// Action handlers of a view, keyed by normalized name.
#[derive(Clone, Default)]
pub struct ActionMap {
	handlers: HashMap<String, ActionHandler>,
}

impl fmt::Debug for ActionMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<&String> = self.handlers.keys().collect();
		names.sort();
		f.debug_struct("ActionMap").field("actions", &names).finish()
	}
}

impl ActionMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` under the normalized form of `name`, replacing any
	/// previous handler.
	pub fn insert<F, Fut>(&mut self, name: &str, handler: F)
	where
		F: Fn(ActionContext) -> Fut + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		let handler: ActionHandler = Rc::new(move |ctx| handler(ctx).boxed_local());
		self.handlers.insert(normalize_action_name(name), handler);
	}

	/// Looks up a handler by any spelling of its name.
	pub fn get(&self, name: &str) -> Option<ActionHandler> {
		self.handlers.get(&normalize_action_name(name)).cloned()
	}

	/// Returns `true` if a handler answers to `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.handlers.contains_key(&normalize_action_name(name))
	}

	/// Returns the number of handlers.
	pub fn len(&self) -> usize {
		self.handlers.len()
	}

	/// Returns `true` if no handler is registered.
	pub fn is_empty(&self) -> bool {
		self.handlers.is_empty()
	}
}

/// Normalizes an action name to snake case.
///
/// ```
/// use mojo_pages::delegation::normalize_action_name;
///
/// assert_eq!(normalize_action_name("save-item"), "save_item");
/// assert_eq!(normalize_action_name("saveItem"), "save_item");
/// assert_eq!(normalize_action_name(" save_item "), "save_item");
/// ```
pub fn normalize_action_name(name: &str) -> String {
	let mut out = String::with_capacity(name.len() + 4);
	let mut prev_lower = false;
	for c in name.trim().chars() {
		match c {
			'-' | ' ' | '.' | '_' => {
				if !out.is_empty() && !out.ends_with('_') {
					out.push('_');
				}
				prev_lower = false;
			}
			c if c.is_uppercase() => {
				if prev_lower && !out.ends_with('_') {
					out.push('_');
				}
				out.extend(c.to_lowercase());
				prev_lower = false;
			}
			c => {
				out.push(c);
				prev_lower = c.is_lowercase() || c.is_ascii_digit();
			}
		}
	}
	while out.ends_with('_') {
		out.pop();
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("save", "save")]
	#[case("save-item", "save_item")]
	#[case("saveItem", "save_item")]
	#[case("save_item", "save_item")]
	#[case("SaveItem", "save_item")]
	#[case("load2Items", "load2_items")]
	#[case("--save--item--", "save_item")]
	fn test_normalize_action_name(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(normalize_action_name(input), expected);
	}

	#[rstest]
	fn test_map_lookup_accepts_any_spelling() {
		// Arrange
		let mut map = ActionMap::new();

		// Act
		map.insert("saveItem", |_ctx| async { Ok(()) });

		// Assert
		assert!(map.contains("save-item"));
		assert!(map.contains("save_item"));
		assert!(map.get("saveItem").is_some());
		assert!(!map.contains("save"));
		assert_eq!(map.len(), 1);
	}
}
