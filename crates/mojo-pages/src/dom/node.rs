//! DOM nodes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;

use super::event::Event;
use super::parse::{DEFAULT_CONTEXT, parse_fragment_in};
use super::selector::Selector;

/// Callback stored for an event listener.
///
/// Listeners return a future so that async handlers can be awaited by the
/// dispatcher instead of being fire-and-forget.
pub type Listener = Rc<dyn Fn(Event) -> LocalBoxFuture<'static, ()>>;

/// Identifier of a registered listener, unique per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
	Document,
	Element(String),
	Text,
}

struct ListenerEntry {
	id: ListenerId,
	event_type: String,
	callback: Listener,
}

pub(crate) struct NodeInner {
	kind: NodeKind,
	attrs: RefCell<Vec<(String, String)>>,
	text: RefCell<String>,
	children: RefCell<Vec<Node>>,
	parent: RefCell<Weak<NodeInner>>,
	listeners: RefCell<Vec<ListenerEntry>>,
	next_listener_id: Cell<u64>,
	value: RefCell<Option<String>>,
	checked: Cell<Option<bool>>,
	scroll_top: Cell<i64>,
}

/// A node in the host document tree.
///
/// `Node` is a cheap reference-counted handle; cloning it does not copy the
/// subtree. Children are owned by their parent, and the parent link is weak.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeInner>);

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.kind {
			NodeKind::Document => f.write_str("#document"),
			NodeKind::Text => write!(f, "#text({:?})", self.0.text.borrow()),
			NodeKind::Element(tag) => f
				.debug_struct("Element")
				.field("tag", tag)
				.field("attrs", &self.0.attrs.borrow())
				.field("children", &self.0.children.borrow().len())
				.finish(),
		}
	}
}

impl PartialEq for Node {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for Node {}

impl Node {
	fn with_kind(kind: NodeKind) -> Self {
		Self(Rc::new(NodeInner {
			kind,
			attrs: RefCell::new(Vec::new()),
			text: RefCell::new(String::new()),
			children: RefCell::new(Vec::new()),
			parent: RefCell::new(Weak::new()),
			listeners: RefCell::new(Vec::new()),
			next_listener_id: Cell::new(0),
			value: RefCell::new(None),
			checked: Cell::new(None),
			scroll_top: Cell::new(0),
		}))
	}

	/// Creates a detached element.
	pub fn element(tag: &str) -> Self {
		Self::with_kind(NodeKind::Element(tag.to_ascii_lowercase()))
	}

	/// Creates a detached text node.
	pub fn text(content: impl Into<String>) -> Self {
		let node = Self::with_kind(NodeKind::Text);
		*node.0.text.borrow_mut() = content.into();
		node
	}

	pub(crate) fn document_root() -> Self {
		Self::with_kind(NodeKind::Document)
	}

	pub(crate) fn downgrade(&self) -> Weak<NodeInner> {
		Rc::downgrade(&self.0)
	}

	pub(crate) fn from_weak(weak: &Weak<NodeInner>) -> Option<Self> {
		weak.upgrade().map(Self)
	}

	/// Returns `true` if both handles point at the same node.
	pub fn ptr_eq(&self, other: &Node) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Returns the lowercase tag name, or `None` for text and document nodes.
	pub fn tag_name(&self) -> Option<&str> {
		match &self.0.kind {
			NodeKind::Element(tag) => Some(tag),
			_ => None,
		}
	}

	/// Returns `true` for element nodes.
	pub fn is_element(&self) -> bool {
		matches!(self.0.kind, NodeKind::Element(_))
	}

	/// Returns `true` for text nodes.
	pub fn is_text(&self) -> bool {
		matches!(self.0.kind, NodeKind::Text)
	}

	// Attributes

	/// Returns an attribute value.
	pub fn attribute(&self, name: &str) -> Option<String> {
		self.0
			.attrs
			.borrow()
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.clone())
	}

	/// Returns `true` if the attribute is present.
	pub fn has_attribute(&self, name: &str) -> bool {
		self.0.attrs.borrow().iter().any(|(key, _)| key == name)
	}

	/// Sets an attribute, keeping the original position when it already exists.
	pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
		let value = value.into();
		let mut attrs = self.0.attrs.borrow_mut();
		match attrs.iter_mut().find(|(key, _)| key == name) {
			Some(entry) => entry.1 = value,
			None => attrs.push((name.to_ascii_lowercase(), value)),
		}
	}

	/// Removes an attribute. Returns `true` if it was present.
	pub fn remove_attribute(&self, name: &str) -> bool {
		let mut attrs = self.0.attrs.borrow_mut();
		let before = attrs.len();
		attrs.retain(|(key, _)| key != name);
		attrs.len() != before
	}

	/// Returns all attributes in insertion order.
	pub fn attributes(&self) -> Vec<(String, String)> {
		self.0.attrs.borrow().clone()
	}

	/// Returns the `id` attribute.
	pub fn id(&self) -> Option<String> {
		self.attribute("id")
	}

	/// Returns `true` if the `class` attribute contains `class`.
	pub fn has_class(&self, class: &str) -> bool {
		self.attribute("class")
			.is_some_and(|value| value.split_whitespace().any(|c| c == class))
	}

	// Tree structure

	/// Returns the parent node.
	pub fn parent(&self) -> Option<Node> {
		Self::from_weak(&self.0.parent.borrow())
	}

	/// Returns a snapshot of the child list.
	pub fn children(&self) -> Vec<Node> {
		self.0.children.borrow().clone()
	}

	/// Returns the number of children.
	pub fn child_count(&self) -> usize {
		self.0.children.borrow().len()
	}

	/// Iterates from this node up to the tree root, this node first.
	pub fn ancestors(&self) -> Ancestors {
		Ancestors {
			next: Some(self.clone()),
		}
	}

	/// Returns the topmost ancestor.
	pub fn root(&self) -> Node {
		self.ancestors().last().unwrap_or_else(|| self.clone())
	}

	/// Returns `true` if `other` is this node or one of its descendants.
	pub fn contains(&self, other: &Node) -> bool {
		other.ancestors().any(|node| node.ptr_eq(self))
	}

	/// Returns all descendants in document order, excluding this node.
	pub fn descendants(&self) -> Vec<Node> {
		let mut out = Vec::new();
		let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
		while let Some(node) = stack.pop() {
			stack.extend(node.children().into_iter().rev());
			out.push(node);
		}
		out
	}

	/// Appends `child`, moving it out of its current parent first.
	///
	/// Appending a node into its own subtree is refused and logged.
	pub fn append_child(&self, child: &Node) {
		if child.contains(self) {
			tracing::warn!(?child, "refusing to append a node into its own subtree");
			return;
		}
		child.detach();
		*child.0.parent.borrow_mut() = self.downgrade();
		self.0.children.borrow_mut().push(child.clone());
	}

	/// Removes `child` from this node. Returns `true` if it was a child.
	pub fn remove_child(&self, child: &Node) -> bool {
		let removed = {
			let mut children = self.0.children.borrow_mut();
			let before = children.len();
			children.retain(|c| !c.ptr_eq(child));
			children.len() != before
		};
		if removed {
			*child.0.parent.borrow_mut() = Weak::new();
		}
		removed
	}

	/// Detaches this node from its parent, if any.
	pub fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.remove_child(self);
		}
	}

	/// Removes every child.
	pub fn clear_children(&self) {
		let children = std::mem::take(&mut *self.0.children.borrow_mut());
		for child in children {
			*child.0.parent.borrow_mut() = Weak::new();
		}
	}

	/// Replaces all children with `nodes`.
	pub fn replace_children(&self, nodes: Vec<Node>) {
		self.clear_children();
		for node in &nodes {
			self.append_child(node);
		}
	}

	// Content

	/// Returns the concatenated text of this subtree.
	pub fn text_content(&self) -> String {
		match self.0.kind {
			NodeKind::Text => self.0.text.borrow().clone(),
			_ => self
				.children()
				.iter()
				.map(Node::text_content)
				.collect::<String>(),
		}
	}

	/// Replaces the subtree with a single text node.
	pub fn set_text_content(&self, text: impl Into<String>) {
		match self.0.kind {
			NodeKind::Text => *self.0.text.borrow_mut() = text.into(),
			_ => self.replace_children(vec![Node::text(text)]),
		}
	}

	/// Parses `html` in the context of this element and replaces the
	/// children with the result.
	pub fn set_inner_html(&self, html: &str) {
		let context = self.tag_name().unwrap_or(DEFAULT_CONTEXT);
		self.replace_children(parse_fragment_in(html, context));
	}

	/// Serializes the children.
	pub fn inner_html(&self) -> String {
		let mut out = String::new();
		for child in self.children() {
			child.serialize_into(&mut out);
		}
		out
	}

	/// Serializes this node and its subtree.
	pub fn outer_html(&self) -> String {
		let mut out = String::new();
		self.serialize_into(&mut out);
		out
	}

	fn serialize_into(&self, out: &mut String) {
		match &self.0.kind {
			NodeKind::Document => {
				for child in self.children() {
					child.serialize_into(out);
				}
			}
			NodeKind::Text => {
				let raw_parent = self
					.parent()
					.and_then(|p| p.tag_name().map(|t| t == "script" || t == "style"))
					.unwrap_or(false);
				let text = self.0.text.borrow();
				if raw_parent {
					out.push_str(&text);
				} else {
					escape_text_into(&text, out);
				}
			}
			NodeKind::Element(tag) => {
				out.push('<');
				out.push_str(tag);
				for (key, value) in self.0.attrs.borrow().iter() {
					out.push(' ');
					out.push_str(key);
					out.push_str("=\"");
					escape_attr_into(value, out);
					out.push('"');
				}
				out.push('>');
				if VOID_ELEMENTS.contains(&tag.as_str()) {
					return;
				}
				for child in self.children() {
					child.serialize_into(out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}

	// Form and scroll state

	/// Returns the current form value.
	///
	/// Falls back to the `value` attribute, then to the text content for
	/// `<textarea>`.
	pub fn value(&self) -> Option<String> {
		if let Some(value) = self.0.value.borrow().clone() {
			return Some(value);
		}
		if self.tag_name() == Some("textarea") {
			return Some(self.text_content());
		}
		self.attribute("value")
	}

	/// Sets the live form value without touching the `value` attribute.
	pub fn set_value(&self, value: impl Into<String>) {
		*self.0.value.borrow_mut() = Some(value.into());
	}

	/// Returns the checked state, falling back to the `checked` attribute.
	pub fn checked(&self) -> bool {
		self.0
			.checked
			.get()
			.unwrap_or_else(|| self.has_attribute("checked"))
	}

	/// Sets the live checked state.
	pub fn set_checked(&self, checked: bool) {
		self.0.checked.set(Some(checked));
	}

	/// Returns the vertical scroll offset.
	pub fn scroll_top(&self) -> i64 {
		self.0.scroll_top.get()
	}

	/// Sets the vertical scroll offset.
	pub fn set_scroll_top(&self, offset: i64) {
		self.0.scroll_top.set(offset);
	}

	// Queries

	/// Finds the first descendant element with the given id.
	pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
		self.descendants()
			.into_iter()
			.find(|node| node.id().as_deref() == Some(id))
	}

	/// Finds the first descendant matching a CSS selector.
	///
	/// An invalid selector matches nothing and is logged.
	pub fn query_selector(&self, selector: &str) -> Option<Node> {
		let selector = parse_selector(selector)?;
		self.descendants()
			.into_iter()
			.find(|node| selector.matches(node))
	}

	/// Finds every descendant matching a CSS selector.
	pub fn query_selector_all(&self, selector: &str) -> Vec<Node> {
		let Some(selector) = parse_selector(selector) else {
			return Vec::new();
		};
		self.descendants()
			.into_iter()
			.filter(|node| selector.matches(node))
			.collect()
	}

	// Events

	/// Registers an event listener and returns its id.
	pub fn add_event_listener<F>(&self, event_type: &str, callback: F) -> ListenerId
	where
		F: Fn(Event) -> LocalBoxFuture<'static, ()> + 'static,
	{
		let id = ListenerId(self.0.next_listener_id.get());
		self.0.next_listener_id.set(id.0 + 1);
		self.0.listeners.borrow_mut().push(ListenerEntry {
			id,
			event_type: event_type.to_string(),
			callback: Rc::new(callback),
		});
		id
	}

	/// Removes a listener. Returns `true` if it was registered.
	pub fn remove_event_listener(&self, id: ListenerId) -> bool {
		let mut listeners = self.0.listeners.borrow_mut();
		let before = listeners.len();
		listeners.retain(|entry| entry.id != id);
		listeners.len() != before
	}

	/// Returns the total number of listeners on this node.
	pub fn listener_count(&self) -> usize {
		self.0.listeners.borrow().len()
	}

	/// Returns the number of listeners for one event type.
	pub fn listener_count_for(&self, event_type: &str) -> usize {
		self.0
			.listeners
			.borrow()
			.iter()
			.filter(|entry| entry.event_type == event_type)
			.count()
	}

	pub(crate) fn listeners_for(&self, event_type: &str) -> Vec<Listener> {
		self.0
			.listeners
			.borrow()
			.iter()
			.filter(|entry| entry.event_type == event_type)
			.map(|entry| Rc::clone(&entry.callback))
			.collect()
	}

	/// Dispatches a bubbling event with this node as the target.
	///
	/// Every listener on the path is awaited in order before the next one
	/// runs. Returns the event so callers can inspect its flags.
	pub async fn dispatch_event(&self, event_type: &str) -> Event {
		let event = Event::new(event_type, self.clone());
		event.dispatch().await;
		event
	}
}

fn parse_selector(selector: &str) -> Option<Selector> {
	match Selector::parse(selector) {
		Ok(selector) => Some(selector),
		Err(err) => {
			tracing::warn!(selector, error = %err, "invalid selector");
			None
		}
	}
}

fn escape_text_into(text: &str, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(c),
		}
	}
}

fn escape_attr_into(value: &str, out: &mut String) {
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
}

/// Iterator over a node and its ancestors.
pub struct Ancestors {
	next: Option<Node>,
}

impl Iterator for Ancestors {
	type Item = Node;

	fn next(&mut self) -> Option<Node> {
		let current = self.next.take()?;
		self.next = current.parent();
		Some(current)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_append_moves_node_between_parents() {
		let a = Node::element("div");
		let b = Node::element("div");
		let child = Node::element("span");

		a.append_child(&child);
		b.append_child(&child);

		assert_eq!(a.child_count(), 0);
		assert_eq!(b.child_count(), 1);
		assert!(child.parent().unwrap().ptr_eq(&b));
	}

	#[rstest]
	fn test_append_refuses_cycles() {
		let outer = Node::element("div");
		let inner = Node::element("div");
		outer.append_child(&inner);

		inner.append_child(&outer);

		assert!(outer.parent().is_none());
		assert_eq!(inner.child_count(), 0);
	}

	#[rstest]
	fn test_serialization_escapes_and_void_elements() {
		let div = Node::element("div");
		div.set_attribute("title", "a \"b\" & c");
		div.append_child(&Node::text("1 < 2"));
		div.append_child(&Node::element("br"));

		assert_eq!(
			div.outer_html(),
			r#"<div title="a &quot;b&quot; &amp; c">1 &lt; 2<br></div>"#
		);
	}

	#[rstest]
	fn test_value_falls_back_to_attribute() {
		let input = Node::element("input");
		input.set_attribute("value", "initial");
		assert_eq!(input.value().as_deref(), Some("initial"));

		input.set_value("typed");
		assert_eq!(input.value().as_deref(), Some("typed"));
		assert_eq!(input.attribute("value").as_deref(), Some("initial"));
	}

	#[rstest]
	fn test_descendants_in_document_order() {
		let root = Node::element("div");
		root.set_inner_html("<p id=\"a\"><span id=\"b\"></span></p><p id=\"c\"></p>");

		let ids: Vec<_> = root
			.descendants()
			.iter()
			.filter_map(Node::id)
			.collect();

		assert_eq!(ids, vec!["a", "b", "c"]);
	}

	#[rstest]
	fn test_listener_registration_and_removal() {
		let node = Node::element("button");
		let first = node.add_event_listener("click", |_| Box::pin(async {}));
		node.add_event_listener("input", |_| Box::pin(async {}));

		assert_eq!(node.listener_count(), 2);
		assert_eq!(node.listener_count_for("click"), 1);
		assert!(node.remove_event_listener(first));
		assert!(!node.remove_event_listener(first));
		assert_eq!(node.listener_count(), 1);
	}
}
