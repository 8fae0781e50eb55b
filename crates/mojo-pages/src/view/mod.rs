//! The view lifecycle engine.
//!
//! A [`View`] owns a root element, a JSON data bag, a template source, its
//! child views and the resources it allocated. Its lifecycle:
//!
//! ```text
//! Constructed -> Initialized -> Rendered -> Mounted -> (update)* -> Destroying -> Destroyed
//! ```
//!
//! Children are declared with a container name and rendered into the element
//! carrying the matching `data-container` attribute in the parent's output.
//! Every view root carries `data-view-id`.

mod behavior;
mod lifecycle;
mod template;

use std::fmt;

pub use behavior::ViewBehavior;
pub use lifecycle::{View, ViewBuilder};
pub use template::{TemplateFn, TemplateLoader, TemplateSource, TemplateStore};

use crate::dom::Node;

/// Attribute identifying a view root.
pub const VIEW_ID_ATTR: &str = "data-view-id";

/// Attribute naming a child container inside a template.
pub const CONTAINER_ATTR: &str = "data-container";

/// Identifier of a view, unique within an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub(crate) u64);

impl ViewId {
	/// Returns the numeric id, as written to `data-view-id`.
	pub fn get(self) -> u64 {
		self.0
	}
}

impl fmt::Display for ViewId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "view {}", self.0)
	}
}

/// Lifecycle state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
	/// Built, `on_init` not yet run.
	Constructed,
	/// `on_init` ran.
	Initialized,
	/// Output built but not attached.
	Rendered,
	/// Attached with events bound.
	Mounted,
	/// Teardown in progress.
	Destroying,
	/// Torn down; the view can no longer render.
	Destroyed,
}

/// Where [`View::mount`] attaches the root.
#[derive(Debug, Clone, Default)]
pub enum MountTarget {
	/// Append to the document body.
	#[default]
	Body,
	/// Append to the first element matching a selector, or to the body if
	/// nothing matches.
	Selector(String),
	/// Append to this element.
	Element(Node),
	/// Replace this element's children with the root.
	Replace(Node),
}

impl From<&str> for MountTarget {
	fn from(selector: &str) -> Self {
		Self::Selector(selector.to_string())
	}
}

impl From<String> for MountTarget {
	fn from(selector: String) -> Self {
		Self::Selector(selector)
	}
}

impl From<Node> for MountTarget {
	fn from(node: Node) -> Self {
		Self::Element(node)
	}
}

impl From<&Node> for MountTarget {
	fn from(node: &Node) -> Self {
		Self::Element(node.clone())
	}
}
