//! Page factories and the instance cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::AppContext;
use crate::error::NavigationError;
use crate::page::{Page, PagePhase};

/// Builds a page instance on first access.
pub type PageFactory = Rc<dyn Fn(&AppContext) -> Page>;

/// Registered pages and their live instances.
///
/// At most one instance exists per name until [`drain`](Self::drain).
#[derive(Default)]
pub struct PageRegistry {
	factories: HashMap<String, PageFactory>,
	order: Vec<String>,
	cache: RefCell<HashMap<String, Page>>,
}

impl fmt::Debug for PageRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PageRegistry")
			.field("pages", &self.order)
			.field("instantiated", &self.cache.borrow().len())
			.finish()
	}
}

impl PageRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a factory under `name`, replacing any previous one.
	pub fn register<F>(&mut self, name: &str, factory: F)
	where
		F: Fn(&AppContext) -> Page + 'static,
	{
		if self.factories.insert(name.to_string(), Rc::new(factory)).is_none() {
			self.order.push(name.to_string());
		}
	}

	/// Returns `true` if a factory is registered under `name`.
	pub fn is_registered(&self, name: &str) -> bool {
		self.factories.contains_key(name)
	}

	/// Returns the registered names in registration order.
	pub fn names(&self) -> &[String] {
		&self.order
	}

	/// Returns the phase of `name`, or `None` if it is not registered.
	pub fn phase(&self, name: &str) -> Option<PagePhase> {
		if let Some(page) = self.cache.borrow().get(name) {
			return Some(page.phase());
		}
		self.is_registered(name).then_some(PagePhase::Registered)
	}

	/// Returns the live instance of `name` without creating one.
	pub fn cached(&self, name: &str) -> Option<Page> {
		self.cache.borrow().get(name).cloned()
	}

	/// Returns the instance of `name`, building and initializing it on first
	/// access.
	///
	/// # Errors
	///
	/// [`NavigationError::UnknownPage`] if no factory is registered.
	pub async fn get_or_create(&self, ctx: &AppContext, name: &str) -> Result<Page, NavigationError> {
		if let Some(page) = self.cached(name) {
			return Ok(page);
		}
		let factory = self
			.factories
			.get(name)
			.cloned()
			.ok_or_else(|| NavigationError::UnknownPage(name.to_string()))?;

		let page = factory(ctx);
		page.assign_name(name);
		self.cache
			.borrow_mut()
			.insert(name.to_string(), page.clone());
		tracing::debug!(page = name, "page instantiated");
		page.view().init().await;
		Ok(page)
	}

	/// Removes and returns every live instance.
	pub fn drain(&self) -> Vec<Page> {
		let mut cache = self.cache.borrow_mut();
		self.order
			.iter()
			.filter_map(|name| cache.remove(name))
			.collect()
	}
}
