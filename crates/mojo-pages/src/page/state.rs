//! DOM state kept across page deactivation.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::dom::Node;

/// State of one form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
	/// Text-like value.
	Value(String),
	/// Checkbox or radio state.
	Checked(bool),
}

/// What a page remembers while inactive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedState {
	/// Scroll offset of the page root.
	pub scroll_top: i64,
	/// Form controls keyed by id, else by name. Radio buttons use
	/// `name=value`.
	pub fields: BTreeMap<String, FieldState>,
	/// Value returned by
	/// [`PageBehavior::capture_state`](super::PageBehavior::capture_state).
	pub custom: Option<Value>,
}

impl SavedState {
	/// Records the scroll offset and form controls under `root`.
	pub fn capture(root: &Node) -> Self {
		let mut fields = BTreeMap::new();
		for node in root.descendants() {
			if let Some((key, state)) = field_state(&node) {
				fields.insert(key, state);
			}
		}
		Self {
			scroll_top: root.scroll_top(),
			fields,
			custom: None,
		}
	}

	/// Writes the recorded values back into matching controls under `root`.
	/// Controls that no longer exist are skipped.
	pub fn restore(&self, root: &Node) {
		root.set_scroll_top(self.scroll_top);
		if self.fields.is_empty() {
			return;
		}
		for node in root.descendants() {
			let Some(key) = field_key(&node) else {
				continue;
			};
			match self.fields.get(&key) {
				Some(FieldState::Value(value)) => node.set_value(value.clone()),
				Some(FieldState::Checked(checked)) => node.set_checked(*checked),
				None => {}
			}
		}
	}
}

fn is_checkable(node: &Node) -> bool {
	matches!(
		node.attribute("type").as_deref(),
		Some("checkbox") | Some("radio")
	)
}

fn field_key(node: &Node) -> Option<String> {
	if !matches!(node.tag_name(), Some("input" | "textarea" | "select")) {
		return None;
	}
	if node.attribute("type").as_deref() == Some("radio")
		&& let Some(name) = node.attribute("name")
	{
		let value = node.attribute("value").unwrap_or_default();
		return Some(format!("{name}={value}"));
	}
	node.id().or_else(|| node.attribute("name"))
}

fn field_state(node: &Node) -> Option<(String, FieldState)> {
	let key = field_key(node)?;
	if is_checkable(node) {
		return Some((key, FieldState::Checked(node.checked())));
	}
	Some((key, FieldState::Value(node.value().unwrap_or_default())))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::parse_fragment;
	use rstest::rstest;

	fn form() -> Node {
		let root = Node::element("div");
		root.replace_children(parse_fragment(
			r#"<form>
				<input id="title">
				<textarea name="notes"></textarea>
				<input type="checkbox" id="done">
				<input type="radio" name="size" value="s">
				<input type="radio" name="size" value="l">
				<input>
			</form>"#,
		));
		root
	}

	#[rstest]
	fn test_capture_and_restore_into_fresh_markup() {
		// Arrange
		let before = form();
		before.set_scroll_top(120);
		before.query_selector("#title").unwrap().set_value("Groceries");
		before.query_selector("[name=notes]").unwrap().set_value("milk");
		before.query_selector("#done").unwrap().set_checked(true);
		before.query_selector("[value=l]").unwrap().set_checked(true);

		// Act
		let saved = SavedState::capture(&before);
		let after = form();
		saved.restore(&after);

		// Assert
		assert_eq!(after.scroll_top(), 120);
		assert_eq!(after.query_selector("#title").unwrap().value().as_deref(), Some("Groceries"));
		assert_eq!(after.query_selector("[name=notes]").unwrap().value().as_deref(), Some("milk"));
		assert!(after.query_selector("#done").unwrap().checked());
		assert!(after.query_selector("[value=l]").unwrap().checked());
		assert!(!after.query_selector("[value=s]").unwrap().checked());
		assert_eq!(saved.fields.len(), 5);
		assert_eq!(saved.fields["size=l"], FieldState::Checked(true));
	}
}
