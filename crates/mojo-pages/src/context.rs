//! Application context.
//!
//! [`AppContext`] carries what the rest of the framework shares: the
//! configuration, the document, the event bus, the template store and the
//! application state. It is passed explicitly to every view and page factory.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::bus::{AppEvent, Diagnostic, EventBus};
use crate::config::AppConfig;
use crate::dom::Document;
use crate::view::{TemplateLoader, TemplateStore, ViewId};

/// Mutable application-wide state consulted by route guards.
///
/// Holds arbitrary JSON values plus a permission set.
#[derive(Debug, Default)]
pub struct AppState {
	values: RefCell<Map<String, Value>>,
	permissions: RefCell<BTreeSet<String>>,
}

impl AppState {
	/// Returns a value.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.values.borrow().get(key).cloned()
	}

	/// Stores a value.
	pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
		self.values.borrow_mut().insert(key.into(), value.into());
	}

	/// Removes a value and returns it.
	pub fn remove(&self, key: &str) -> Option<Value> {
		self.values.borrow_mut().remove(key)
	}

	/// Returns `true` if `key` holds a truthy value.
	///
	/// `null`, `false`, `0`, `""`, `[]` and `{}` are falsy.
	pub fn flag(&self, key: &str) -> bool {
		match self.values.borrow().get(key) {
			None | Some(Value::Null) => false,
			Some(Value::Bool(b)) => *b,
			Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
			Some(Value::String(s)) => !s.is_empty(),
			Some(Value::Array(a)) => !a.is_empty(),
			Some(Value::Object(o)) => !o.is_empty(),
		}
	}

	/// Grants a permission.
	pub fn grant(&self, permission: impl Into<String>) {
		self.permissions.borrow_mut().insert(permission.into());
	}

	/// Revokes a permission.
	pub fn revoke(&self, permission: &str) {
		self.permissions.borrow_mut().remove(permission);
	}

	/// Returns `true` if the permission was granted.
	pub fn has_permission(&self, permission: &str) -> bool {
		self.permissions.borrow().contains(permission)
	}
}

struct ContextInner {
	config: AppConfig,
	document: Document,
	bus: EventBus,
	templates: TemplateStore,
	state: AppState,
	next_view_id: Cell<u64>,
}

/// Shared handle to the application's collaborators.
///
/// Cloning is cheap and yields the same context.
#[derive(Clone)]
pub struct AppContext(Rc<ContextInner>);

impl fmt::Debug for AppContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppContext")
			.field("config", &self.0.config)
			.field("bus", &self.0.bus)
			.field("templates", &self.0.templates)
			.finish()
	}
}

impl AppContext {
	/// Creates a context with the default configuration, an empty document and
	/// no template loader.
	pub fn new() -> Self {
		Self::builder().build()
	}

	/// Starts building a context.
	pub fn builder() -> AppContextBuilder {
		AppContextBuilder::default()
	}

	/// Returns the configuration.
	pub fn config(&self) -> &AppConfig {
		&self.0.config
	}

	/// Returns the document.
	pub fn document(&self) -> &Document {
		&self.0.document
	}

	/// Returns the event bus.
	pub fn bus(&self) -> &EventBus {
		&self.0.bus
	}

	/// Returns the template store.
	pub fn templates(&self) -> &TemplateStore {
		&self.0.templates
	}

	/// Returns the application state.
	pub fn state(&self) -> &AppState {
		&self.0.state
	}

	/// Publishes an event.
	pub fn emit(&self, event: AppEvent) {
		self.0.bus.emit(event);
	}

	/// Publishes a diagnostic.
	pub fn report(&self, diagnostic: Diagnostic) {
		self.0.bus.emit(AppEvent::Diagnostic(diagnostic));
	}

	pub(crate) fn next_view_id(&self) -> ViewId {
		let id = self.0.next_view_id.get() + 1;
		self.0.next_view_id.set(id);
		ViewId(id)
	}
}

impl Default for AppContext {
	fn default() -> Self {
		Self::new()
	}
}

/// Builder for [`AppContext`].
#[derive(Default)]
pub struct AppContextBuilder {
	config: Option<AppConfig>,
	document: Option<Document>,
	loader: Option<Rc<dyn TemplateLoader>>,
}

impl AppContextBuilder {
	/// Sets the configuration.
	pub fn config(mut self, config: AppConfig) -> Self {
		self.config = Some(config);
		self
	}

	/// Sets the document.
	pub fn document(mut self, document: Document) -> Self {
		self.document = Some(document);
		self
	}

	/// Installs the loader used for external templates.
	pub fn template_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
		self.loader = Some(Rc::new(loader));
		self
	}

	pub(crate) fn shared_template_loader(mut self, loader: Option<Rc<dyn TemplateLoader>>) -> Self {
		self.loader = loader;
		self
	}

	/// Builds the context.
	pub fn build(self) -> AppContext {
		AppContext(Rc::new(ContextInner {
			config: self.config.unwrap_or_default(),
			document: self.document.unwrap_or_default(),
			bus: EventBus::new(),
			templates: TemplateStore::new(self.loader),
			state: AppState::default(),
			next_view_id: Cell::new(0),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case(json!(true), true)]
	#[case(json!(1), true)]
	#[case(json!("yes"), true)]
	#[case(json!([0]), true)]
	#[case(json!(false), false)]
	#[case(json!(0), false)]
	#[case(json!(""), false)]
	#[case(json!([]), false)]
	#[case(json!({}), false)]
	#[case(json!(null), false)]
	fn test_flag_truthiness(#[case] value: Value, #[case] expected: bool) {
		let state = AppState::default();
		state.set("flag", value);
		assert_eq!(state.flag("flag"), expected);
	}

	#[rstest]
	fn test_permissions() {
		let state = AppState::default();
		state.grant("admin");
		assert!(state.has_permission("admin"));

		state.revoke("admin");
		assert!(!state.has_permission("admin"));
	}

	#[rstest]
	fn test_view_ids_are_unique() {
		let ctx = AppContext::new();
		let a = ctx.next_view_id();
		let b = ctx.clone().next_view_id();
		assert_ne!(a, b);
	}
}
