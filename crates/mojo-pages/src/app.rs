//! Application assembly.

use std::rc::Rc;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::dom::{Document, Node};
use crate::error::{AppError, ConfigError, NavigationError, RouterError};
use crate::navigation::{NavTarget, NavigationOutcome, Navigator, PageRegistry};
use crate::page::Page;
use crate::router::{GuardContext, History, MemoryHistory, Router};
use crate::view::TemplateLoader;

/// A running application: the context plus the navigation controller.
///
/// ```
/// use mojo_pages::{Application, dom::Document, page::Page, view::View};
///
/// # futures::executor::block_on(async {
/// let app = Application::builder()
///     .document(Document::with_body(r#"<div id="app"></div>"#))
///     .route("/", "home")
///     .page("home", |ctx| Page::with_view(View::builder(ctx).inline("<h1>Home</h1>").build()))
///     .build()
///     .unwrap();
///
/// app.start().await.unwrap();
/// assert_eq!(app.active_page().unwrap().name(), "home");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Application {
	ctx: AppContext,
	navigator: Rc<Navigator>,
}

impl Application {
	/// Starts building an application.
	pub fn builder() -> ApplicationBuilder {
		ApplicationBuilder::default()
	}

	/// Returns the shared context.
	pub fn context(&self) -> &AppContext {
		&self.ctx
	}

	/// Returns the navigation controller.
	pub fn navigator(&self) -> &Navigator {
		&self.navigator
	}

	/// Returns the route table.
	pub fn router(&self) -> &Router {
		self.navigator.router()
	}

	/// Returns the history the application writes addresses to.
	pub fn history(&self) -> &Rc<dyn History> {
		self.navigator.history()
	}

	/// Shows the page for the current address.
	///
	/// # Errors
	///
	/// See [`Navigator::navigate`].
	pub async fn start(&self) -> Result<NavigationOutcome, NavigationError> {
		self.navigator.start().await
	}

	/// Navigates to an address or a page.
	///
	/// # Errors
	///
	/// See [`Navigator::navigate`].
	pub async fn navigate(
		&self,
		target: impl Into<NavTarget>,
	) -> Result<NavigationOutcome, NavigationError> {
		self.navigator.navigate(target).await
	}

	/// Follows a location change made by the host.
	///
	/// # Errors
	///
	/// See [`Navigator::navigate`].
	pub async fn handle_location_change(&self) -> Result<NavigationOutcome, NavigationError> {
		self.navigator.handle_location_change().await
	}

	/// Forwards the window's `popstate` and `hashchange` events to
	/// [`handle_location_change`](Self::handle_location_change).
	///
	/// Each event spawns the navigation on the local executor; failures are
	/// logged. Dropping the returned listener unregisters it.
	///
	/// # Errors
	///
	/// Returns the JavaScript exception if the listeners cannot be added.
	#[cfg(target_arch = "wasm32")]
	pub fn listen_for_location_changes(
		&self,
	) -> Result<crate::router::LocationListener, wasm_bindgen::JsValue> {
		let app = self.clone();
		crate::router::LocationListener::new(move || {
			let app = app.clone();
			wasm_bindgen_futures::spawn_local(async move {
				if let Err(err) = app.handle_location_change().await {
					tracing::warn!(error = %err, "location change navigation failed");
				}
			});
		})
	}

	/// Tears every page down.
	pub async fn shutdown(&self) {
		self.navigator.shutdown().await;
	}

	/// Returns the active page.
	pub fn active_page(&self) -> Option<Page> {
		self.navigator.active_page()
	}

	/// Returns the live instance of `name`, if it was ever shown.
	pub fn page(&self, name: &str) -> Option<Page> {
		self.navigator.registry().cached(name)
	}
}

/// Builder for [`Application`].
#[derive(Default)]
pub struct ApplicationBuilder {
	config: AppConfig,
	document: Option<Document>,
	router: Router,
	route_errors: Vec<RouterError>,
	registry: PageRegistry,
	history: Option<Rc<dyn History>>,
	template_loader: Option<Rc<dyn TemplateLoader>>,
}

impl ApplicationBuilder {
	/// Sets the configuration.
	pub fn config(mut self, config: AppConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the document. Defaults to an empty one.
	pub fn document(mut self, document: Document) -> Self {
		self.document = Some(document);
		self
	}

	/// Adds a route.
	///
	/// An invalid `pattern` is reported by [`build`](Self::build).
	pub fn route(mut self, pattern: &str, page_name: &str) -> Self {
		if let Err(e) = self.router.add_route(pattern, page_name) {
			self.route_errors.push(e);
		}
		self
	}

	/// Adds a route with an entry guard.
	///
	/// An invalid `pattern` is reported by [`build`](Self::build).
	pub fn guarded_route<G>(mut self, pattern: &str, page_name: &str, guard: G) -> Self
	where
		G: Fn(&GuardContext<'_>) -> bool + 'static,
	{
		match self.router.add_route(pattern, page_name) {
			Ok(entry) => {
				entry.set_guard(guard);
			}
			Err(e) => self.route_errors.push(e),
		}
		self
	}

	/// Replaces the route table.
	pub fn router(mut self, router: Router) -> Self {
		self.router = router;
		self
	}

	/// Registers a page factory.
	pub fn page<F>(mut self, name: &str, factory: F) -> Self
	where
		F: Fn(&AppContext) -> Page + 'static,
	{
		self.registry.register(name, factory);
		self
	}

	/// Sets the history. Defaults to the window's history in the browser and
	/// to a [`MemoryHistory`] at `http://localhost/` elsewhere.
	pub fn history(mut self, history: Rc<dyn History>) -> Self {
		self.history = Some(history);
		self
	}

	/// Sets the loader for external templates.
	pub fn template_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
		self.template_loader = Some(Rc::new(loader));
		self
	}

	/// Validates the configuration, locates the containers and assembles the
	/// application. Nothing is rendered until [`Application::start`].
	///
	/// # Errors
	///
	/// [`AppError::Config`] for an invalid configuration or any route pattern
	/// that did not compile,
	/// [`AppError::MissingRootContainer`] if the root selector matches
	/// nothing, and [`AppError::MissingPageContainer`] if the page container
	/// selector matches nothing inside the root.
	pub fn build(self) -> Result<Application, AppError> {
		self.config.validate()?;
		if !self.route_errors.is_empty() {
			return Err(ConfigError::Routes(self.route_errors).into());
		}
		let document = self.document.unwrap_or_default();

		let root = document
			.query_selector(&self.config.root_selector)
			.ok_or_else(|| AppError::MissingRootContainer(self.config.root_selector.clone()))?;
		let page_container = page_container(&root, self.config.page_container.as_deref())?;

		for page in self.router.entries().iter().map(|entry| entry.page_name()) {
			if !self.registry.is_registered(page) {
				tracing::warn!(page, "route bound to a page with no factory");
			}
		}

		let ctx = AppContext::builder()
			.config(self.config)
			.document(document)
			.shared_template_loader(self.template_loader)
			.build();
		let history = self.history.unwrap_or_else(default_history);
		let navigator = Navigator::new(
			ctx.clone(),
			self.router,
			self.registry,
			history,
			page_container,
		);
		tracing::debug!(pages = ?navigator.registry().names(), "application built");

		Ok(Application {
			ctx,
			navigator: Rc::new(navigator),
		})
	}
}

#[cfg(target_arch = "wasm32")]
fn default_history() -> Rc<dyn History> {
	match crate::router::BrowserHistory::new() {
		Some(history) => Rc::new(history),
		None => {
			tracing::warn!("no browser window; falling back to in-memory history");
			Rc::new(MemoryHistory::default())
		}
	}
}

#[cfg(not(target_arch = "wasm32"))]
fn default_history() -> Rc<dyn History> {
	Rc::new(MemoryHistory::default())
}

fn page_container(root: &Node, selector: Option<&str>) -> Result<Node, AppError> {
	let Some(selector) = selector else {
		return Ok(root.clone());
	};
	root.query_selector(selector)
		.ok_or_else(|| AppError::MissingPageContainer(selector.to_string()))
}
