//! Ordered page transitions.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures::lock::Mutex;

use super::registry::PageRegistry;
use super::{NavTarget, NavigationOutcome};
use crate::bus::{AppEvent, Diagnostic, DiagnosticKind};
use crate::context::AppContext;
use crate::dom::Node;
use crate::error::{NavigationError, RouterError};
use crate::page::Page;
use crate::router::{Addressing, History, Location, Params, Query, RouteMatch, Router};
use crate::view::MountTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressSync {
	Push,
	Replace,
}

/// A target after routing: which page to show with which arguments.
struct Resolved {
	page_name: String,
	route: Option<RouteMatch>,
	params: Params,
	query: Query,
	location: Location,
}

/// Drives page activation.
///
/// Created by [`ApplicationBuilder::build`](crate::ApplicationBuilder::build);
/// most applications reach it through [`Application`](crate::Application).
pub struct Navigator {
	ctx: AppContext,
	router: Router,
	registry: PageRegistry,
	addressing: Addressing,
	history: Rc<dyn History>,
	page_container: Node,
	lock: Mutex<()>,
	active: RefCell<Option<Page>>,
	location: RefCell<Option<Location>>,
	generation: Cell<u64>,
	last_synced_href: RefCell<Option<String>>,
	shut_down: Cell<bool>,
}

impl fmt::Debug for Navigator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Navigator")
			.field("router", &self.router)
			.field("registry", &self.registry)
			.field("addressing", &self.addressing)
			.field("active", &self.active.borrow().as_ref().map(|page| page.name().to_string()))
			.field("generation", &self.generation.get())
			.finish()
	}
}

impl Navigator {
	pub(crate) fn new(
		ctx: AppContext,
		router: Router,
		registry: PageRegistry,
		history: Rc<dyn History>,
		page_container: Node,
	) -> Self {
		let addressing = Addressing::from_config(ctx.config());
		Self {
			ctx,
			router,
			registry,
			addressing,
			history,
			page_container,
			lock: Mutex::new(()),
			active: RefCell::new(None),
			location: RefCell::new(None),
			generation: Cell::new(0),
			last_synced_href: RefCell::new(None),
			shut_down: Cell::new(false),
		}
	}

	/// Returns the route table.
	pub fn router(&self) -> &Router {
		&self.router
	}

	/// Returns the page registry.
	pub fn registry(&self) -> &PageRegistry {
		&self.registry
	}

	/// Returns the history the controller writes to.
	pub fn history(&self) -> &Rc<dyn History> {
		&self.history
	}

	/// Returns the element pages are mounted into.
	pub fn page_container(&self) -> &Node {
		&self.page_container
	}

	/// Returns the active page.
	pub fn active_page(&self) -> Option<Page> {
		self.active.borrow().clone()
	}

	/// Returns the location of the active page.
	pub fn current_location(&self) -> Option<Location> {
		self.location.borrow().clone()
	}

	/// Returns the number of completed navigations.
	pub fn generation(&self) -> u64 {
		self.generation.get()
	}

	/// Shows the page for the history's current href, or the configured
	/// default route when the href addresses `/`.
	///
	/// # Errors
	///
	/// See [`navigate`](Self::navigate).
	pub async fn start(&self) -> Result<NavigationOutcome, NavigationError> {
		let _guard = self.lock.lock().await;
		self.ensure_running()?;
		let location = self.addressing.location(&self.history.href());
		let default_route = &self.ctx.config().default_route;
		let address = if location.path == "/" && default_route != "/" {
			let mut target = Location::parse(default_route);
			target.query.extend(location.query);
			target.to_address()
		} else {
			location.to_address()
		};
		tracing::info!(address = %address, mode = ?self.addressing.mode(), "starting navigation");
		self.run(NavTarget::Address(address), AddressSync::Replace).await
	}

	/// Navigates to `target` and pushes the new address onto the history.
	///
	/// Waits for any navigation in progress to finish first. Hooks must not
	/// await a navigation themselves, since the lock is not reentrant; spawn
	/// it instead.
	///
	/// # Errors
	///
	/// - [`NavigationError::Router`] if no route matches and no not-found page
	///   is configured, or a page target cannot be reversed into an address;
	/// - [`NavigationError::UnknownPage`] if the target page has no factory;
	/// - [`NavigationError::View`] if the page's view was destroyed;
	/// - [`NavigationError::ShutDown`] after [`shutdown`](Self::shutdown).
	pub async fn navigate(
		&self,
		target: impl Into<NavTarget>,
	) -> Result<NavigationOutcome, NavigationError> {
		let target = target.into();
		let _guard = self.lock.lock().await;
		self.ensure_running()?;
		self.run(target, AddressSync::Push).await
	}

	/// Follows a location change made outside the controller (back/forward,
	/// a hash edit).
	///
	/// Returns [`NavigationOutcome::Ignored`] when the history still shows the
	/// address this controller wrote last.
	///
	/// # Errors
	///
	/// See [`navigate`](Self::navigate).
	pub async fn handle_location_change(&self) -> Result<NavigationOutcome, NavigationError> {
		let _guard = self.lock.lock().await;
		self.ensure_running()?;
		let href = self.history.href();
		if self.last_synced_href.borrow().as_deref() == Some(href.as_str()) {
			tracing::trace!(href = %href, "ignoring self-written location");
			return Ok(NavigationOutcome::Ignored);
		}
		let location = self.addressing.location(&href);
		self.run(NavTarget::Address(location.to_address()), AddressSync::Replace)
			.await
	}

	/// Exits the active page, destroys every cached page and empties the
	/// page container. Later navigations fail with
	/// [`NavigationError::ShutDown`].
	pub async fn shutdown(&self) {
		let _guard = self.lock.lock().await;
		if self.shut_down.replace(true) {
			return;
		}
		let active = self.active.borrow_mut().take();
		if let Some(page) = active {
			page.exit().await;
			self.ctx.emit(AppEvent::PageDeactivated {
				page_name: page.name().to_string(),
			});
		}
		for page in self.registry.drain() {
			page.dispose().await;
		}
		self.page_container.clear_children();
		*self.location.borrow_mut() = None;
		tracing::info!("navigation shut down");
	}

	fn ensure_running(&self) -> Result<(), NavigationError> {
		if self.shut_down.get() {
			return Err(NavigationError::ShutDown);
		}
		Ok(())
	}

	async fn run(
		&self,
		target: NavTarget,
		sync: AddressSync,
	) -> Result<NavigationOutcome, NavigationError> {
		let address = match &target {
			NavTarget::Address(address) => Some(address.clone()),
			NavTarget::Page { .. } => None,
		};

		let Some(resolved) = self.resolve(target)? else {
			return self.show_not_found(address.unwrap_or_default(), sync).await;
		};

		if let Some(route) = &resolved.route
			&& !self
				.router
				.check_guard(route, &resolved.query, self.ctx.state())
		{
			return self.deny(resolved, sync).await;
		}

		let page_name = resolved.page_name.clone();
		let generation = self.activate(resolved, sync).await?;
		Ok(NavigationOutcome::Activated {
			page_name,
			generation,
		})
	}

	/// Maps a target to a page. `Ok(None)` means no route matched.
	fn resolve(&self, target: NavTarget) -> Result<Option<Resolved>, NavigationError> {
		match target {
			NavTarget::Address(address) => {
				let location = Location::parse(&address);
				let Some(route) = self.router.match_route(&location.path) else {
					return Ok(None);
				};
				if !self.registry.is_registered(&route.page_name) {
					return Err(NavigationError::UnknownPage(route.page_name));
				}
				Ok(Some(Resolved {
					page_name: route.page_name.clone(),
					params: route.params.clone(),
					query: location.query.clone(),
					route: Some(route),
					location,
				}))
			}
			NavTarget::Page {
				name,
				params,
				query,
			} => {
				if !self.registry.is_registered(&name) {
					return Err(NavigationError::UnknownPage(name));
				}
				if let Some((path, route)) = self.router.route_for_page(&name, &params) {
					return Ok(Some(Resolved {
						page_name: name,
						location: Location::new(path, query.clone()),
						route: Some(route),
						params,
						query,
					}));
				}
				if self.router.routes_page(&name) {
					let err = self.router.reverse(&name, &params).err();
					return Err(err.unwrap_or(RouterError::UnroutedPage(name)).into());
				}
				// Unrouted pages keep the address that is currently shown.
				let location = self.addressing.location(&self.history.href());
				Ok(Some(Resolved {
					page_name: name,
					route: None,
					params,
					query,
					location,
				}))
			}
		}
	}

	async fn show_not_found(
		&self,
		address: String,
		sync: AddressSync,
	) -> Result<NavigationOutcome, NavigationError> {
		tracing::warn!(address = %address, "no route matches address");
		self.ctx.report(Diagnostic::new(
			DiagnosticKind::RouteNotFound,
			format!("no route matches '{address}'"),
		));

		let page_name = match &self.ctx.config().not_found_page {
			Some(page) if self.registry.is_registered(page) => page.clone(),
			_ => return Err(RouterError::NotFound(address).into()),
		};
		let location = Location::parse(&address);
		self.activate(
			Resolved {
				page_name: page_name.clone(),
				route: None,
				params: Params::new(),
				query: location.query.clone(),
				location,
			},
			sync,
		)
		.await?;
		Ok(NavigationOutcome::NotFound { address, page_name })
	}

	async fn deny(
		&self,
		resolved: Resolved,
		sync: AddressSync,
	) -> Result<NavigationOutcome, NavigationError> {
		let page_name = resolved.page_name;
		tracing::warn!(page = %page_name, address = %resolved.location.to_address(), "route guard rejected navigation");
		self.ctx.report(
			Diagnostic::new(
				DiagnosticKind::GuardRejection,
				format!("guard rejected navigation to '{page_name}'"),
			)
			.with_page(page_name.as_str()),
		);

		let redirect = self
			.ctx
			.config()
			.denied_page
			.clone()
			.filter(|denied| *denied != page_name && self.registry.is_registered(denied));
		self.ctx.emit(AppEvent::NavigationDenied {
			page_name: page_name.clone(),
			redirect_to: redirect.clone(),
		});

		match redirect {
			Some(denied) => {
				self.activate(
					Resolved {
						page_name: denied.clone(),
						route: None,
						params: Params::new(),
						query: resolved.query,
						location: resolved.location,
					},
					sync,
				)
				.await?;
				Ok(NavigationOutcome::Denied {
					page_name,
					redirected_to: Some(denied),
				})
			}
			None => {
				self.restore_address();
				Ok(NavigationOutcome::Denied {
					page_name,
					redirected_to: None,
				})
			}
		}
	}

	/// Steps 3 to 6: exit, enter, swap, publish. Returns the new generation.
	async fn activate(
		&self,
		resolved: Resolved,
		sync: AddressSync,
	) -> Result<u64, NavigationError> {
		let Resolved {
			page_name,
			route,
			params,
			query,
			location,
		} = resolved;

		let previous = self.active.borrow().clone();
		let same_page = previous
			.as_ref()
			.is_some_and(|page| page.name() == page_name);
		if let Some(previous) = previous.as_ref().filter(|_| !same_page) {
			previous.exit().await;
			self.ctx.emit(AppEvent::PageDeactivated {
				page_name: previous.name().to_string(),
			});
		}

		let route = route.map(|route| route.pattern);
		let page = match self
			.swap_in(&page_name, route, params.clone(), query.clone(), same_page)
			.await
		{
			Ok(page) => page,
			Err(err) => {
				if let Some(previous) = previous.as_ref().filter(|_| !same_page) {
					self.reinstate(previous, &page_name, &err).await;
				}
				return Err(err);
			}
		};

		if let Some(previous) = previous.as_ref().filter(|_| !same_page) {
			previous.view().unmount();
		}
		if !same_page {
			page.restore_dom_state();
		}

		*self.active.borrow_mut() = Some(page);
		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		if !same_page {
			self.ctx.emit(AppEvent::PageActivated {
				page_name: page_name.clone(),
			});
		}
		self.ctx.emit(AppEvent::RouteChanged {
			page_name: page_name.clone(),
			params,
			query,
		});
		self.sync_address(&location, sync);
		*self.location.borrow_mut() = Some(location);
		tracing::info!(page = %page_name, generation, "navigation completed");
		Ok(generation)
	}

	/// Steps 4 and 5: fetch or create the target, deliver parameters, enter,
	/// then render and mount it into the page container.
	///
	/// A page that entered but could not be shown is exited again.
	async fn swap_in(
		&self,
		page_name: &str,
		route: Option<String>,
		params: Params,
		query: Query,
		same_page: bool,
	) -> Result<Page, NavigationError> {
		let page = self.registry.get_or_create(&self.ctx, page_name).await?;
		page.deliver(route, params, query).await;
		if same_page {
			page.bump_activation();
		} else {
			page.enter().await;
		}

		let view = page.view();
		let shown = match view.render().await {
			Ok(()) => {
				view.mount(MountTarget::Replace(self.page_container.clone()))
					.await
			}
			Err(err) => Err(err),
		};
		if let Err(err) = shown {
			if !same_page {
				page.exit().await;
			}
			return Err(err.into());
		}
		Ok(page)
	}

	/// Re-enters the page that was exited for a navigation that then failed.
	/// Its view never left the page container.
	async fn reinstate(&self, previous: &Page, failed: &str, err: &NavigationError) {
		tracing::warn!(
			page = %failed,
			restored = previous.name(),
			error = %err,
			"page activation failed; returning to the previous page"
		);
		previous.enter().await;
		self.ctx.emit(AppEvent::PageActivated {
			page_name: previous.name().to_string(),
		});
		self.restore_address();
	}

	/// Puts the address the controller last wrote back into the history.
	fn restore_address(&self) {
		let synced = self.last_synced_href.borrow().clone();
		if let Some(href) = synced
			&& self.history.href() != href
		{
			self.history.replace(&href);
		}
	}

	fn sync_address(&self, location: &Location, sync: AddressSync) {
		let current = self.history.href();
		let href = self.addressing.href(&current, location);
		if href != current {
			match sync {
				AddressSync::Push => self.history.push(&href),
				AddressSync::Replace => self.history.replace(&href),
			}
		}
		*self.last_synced_href.borrow_mut() = Some(href);
	}
}
