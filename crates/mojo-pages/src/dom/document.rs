//! The host document.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::node::{Node, NodeInner};

struct DocumentInner {
	root: Node,
	head: Node,
	body: Node,
	focused: RefCell<Weak<NodeInner>>,
}

/// The document views are mounted into.
///
/// Holds the `<html>`/`<head>`/`<body>` skeleton and the focus state. Cloning
/// shares the same document.
#[derive(Clone)]
pub struct Document(Rc<DocumentInner>);

impl std::fmt::Debug for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Document")
			.field("body_children", &self.0.body.child_count())
			.finish()
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl Document {
	/// Creates an empty document.
	pub fn new() -> Self {
		let root = Node::document_root();
		let html = Node::element("html");
		let head = Node::element("head");
		let body = Node::element("body");
		root.append_child(&html);
		html.append_child(&head);
		html.append_child(&body);
		Self(Rc::new(DocumentInner {
			root,
			head,
			body,
			focused: RefCell::new(Weak::new()),
		}))
	}

	/// Creates a document whose body holds `body_html`.
	pub fn with_body(body_html: &str) -> Self {
		let document = Self::new();
		document.body().set_inner_html(body_html);
		document
	}

	/// Returns the document node.
	pub fn root(&self) -> &Node {
		&self.0.root
	}

	/// Returns `<head>`.
	pub fn head(&self) -> &Node {
		&self.0.head
	}

	/// Returns `<body>`.
	pub fn body(&self) -> &Node {
		&self.0.body
	}

	/// Returns `true` if `node` is attached to this document.
	pub fn contains(&self, node: &Node) -> bool {
		self.0.root.contains(node)
	}

	/// Finds an attached element by id.
	pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
		self.0.root.get_element_by_id(id)
	}

	/// Finds the first attached element matching a compound selector.
	pub fn query_selector(&self, selector: &str) -> Option<Node> {
		self.0.root.query_selector(selector)
	}

	/// Moves focus to `node`.
	pub fn focus(&self, node: &Node) {
		*self.0.focused.borrow_mut() = node.downgrade();
	}

	/// Clears focus.
	pub fn blur(&self) {
		*self.0.focused.borrow_mut() = Weak::new();
	}

	/// Returns the focused element if it is still attached.
	pub fn active_element(&self) -> Option<Node> {
		Node::from_weak(&self.0.focused.borrow()).filter(|node| self.contains(node))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_with_body_and_lookup() {
		let document = Document::with_body(r#"<main id="app"><p class="x">hi</p></main>"#);

		let app = document.get_element_by_id("app").unwrap();
		assert_eq!(app.tag_name(), Some("main"));
		assert!(document.contains(&app));
		assert_eq!(document.query_selector("p.x").unwrap().text_content(), "hi");
	}

	#[rstest]
	fn test_detached_focus_is_not_active() {
		let document = Document::with_body(r#"<input id="name">"#);
		let input = document.get_element_by_id("name").unwrap();

		document.focus(&input);
		assert!(document.active_element().unwrap().ptr_eq(&input));

		input.detach();
		assert!(document.active_element().is_none());
	}
}
