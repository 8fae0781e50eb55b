//! Page instances and activity tokens.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use super::behavior::PageBehavior;
use super::state::SavedState;
use super::PagePhase;
use crate::bus::{Diagnostic, DiagnosticKind};
use crate::router::{Params, Query};
use crate::view::View;

pub(crate) struct PageInner {
	name: OnceCell<String>,
	view: View,
	behavior: Rc<dyn PageBehavior>,
	route: RefCell<Option<String>>,
	params: RefCell<Params>,
	query: RefCell<Query>,
	phase: Cell<PagePhase>,
	saved: RefCell<Option<SavedState>>,
	activation: Cell<u64>,
}

/// A view bound to a page name and the parameters of the navigation that
/// showed it.
///
/// `Page` is a reference-counted handle. Instances are created by the
/// factories registered with the application and cached by name.
#[derive(Clone)]
pub struct Page(Rc<PageInner>);

impl fmt::Debug for Page {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Page")
			.field("name", &self.name())
			.field("phase", &self.phase())
			.field("view", &self.0.view.id())
			.field("params", &*self.0.params.borrow())
			.finish()
	}
}

impl Page {
	/// Wraps `view` with activation hooks.
	pub fn new(view: View, behavior: impl PageBehavior + 'static) -> Self {
		Self(Rc::new(PageInner {
			name: OnceCell::new(),
			view,
			behavior: Rc::new(behavior),
			route: RefCell::new(None),
			params: RefCell::new(Params::new()),
			query: RefCell::new(Query::new()),
			phase: Cell::new(PagePhase::Instantiated),
			saved: RefCell::new(None),
			activation: Cell::new(0),
		}))
	}

	/// Wraps `view` without activation hooks.
	pub fn with_view(view: View) -> Self {
		Self::new(view, ())
	}

	/// Returns the page name, or `""` before the registry assigned it.
	pub fn name(&self) -> &str {
		self.0.name.get().map(String::as_str).unwrap_or_default()
	}

	/// Returns the page's view.
	pub fn view(&self) -> &View {
		&self.0.view
	}

	/// Returns the parameters of the current navigation.
	pub fn params(&self) -> Params {
		self.0.params.borrow().clone()
	}

	/// Returns one parameter.
	pub fn param(&self, name: &str) -> Option<String> {
		self.0.params.borrow().get(name).cloned()
	}

	/// Returns the query of the current navigation.
	pub fn query(&self) -> Query {
		self.0.query.borrow().clone()
	}

	/// Returns the pattern that matched the current navigation.
	pub fn route(&self) -> Option<String> {
		self.0.route.borrow().clone()
	}

	/// Returns the activation phase.
	pub fn phase(&self) -> PagePhase {
		self.0.phase.get()
	}

	/// Returns `true` while the page is shown.
	pub fn is_active(&self) -> bool {
		self.0.phase.get() == PagePhase::Active
	}

	/// Returns the state captured when the page was last left.
	pub fn saved_state(&self) -> Option<SavedState> {
		self.0.saved.borrow().clone()
	}

	/// Returns a token that stays current until the page is left or
	/// re-entered.
	///
	/// Async work started from a hook checks it before touching the page, so
	/// results arriving after the user moved on are dropped.
	pub fn activity(&self) -> ActivityToken {
		ActivityToken {
			page: Rc::downgrade(&self.0),
			activation: self.0.activation.get(),
		}
	}

	/// Returns `true` if both handles refer to the same instance.
	pub fn ptr_eq(&self, other: &Page) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	pub(crate) fn assign_name(&self, name: &str) {
		if self.0.name.set(name.to_string()).is_err() && self.name() != name {
			tracing::warn!(
				page = self.name(),
				requested = name,
				"page instance already named; keeping the first name"
			);
		}
	}

	/// Stores the navigation's route and parameters and runs `on_params`.
	pub(crate) async fn deliver(&self, route: Option<String>, params: Params, query: Query) {
		*self.0.route.borrow_mut() = route;
		*self.0.params.borrow_mut() = params.clone();
		*self.0.query.borrow_mut() = query.clone();
		self.run_hook("on_params", self.0.behavior.on_params(self, &params, &query))
			.await;
	}

	pub(crate) async fn enter(&self) {
		let custom = self
			.0
			.saved
			.borrow()
			.as_ref()
			.and_then(|saved| saved.custom.clone());
		if let Some(custom) = custom {
			self.0.behavior.restore_state(self, &custom);
		}
		self.0.phase.set(PagePhase::Active);
		self.bump_activation();
		tracing::debug!(page = self.name(), "page entering");
		self.run_hook("on_enter", self.0.behavior.on_enter(self)).await;
	}

	pub(crate) async fn exit(&self) {
		let mut saved = self
			.0
			.view
			.element()
			.map(|root| SavedState::capture(&root))
			.unwrap_or_default();
		saved.custom = self.0.behavior.capture_state(self);
		*self.0.saved.borrow_mut() = Some(saved);
		self.0.phase.set(PagePhase::Inactive);
		self.bump_activation();
		tracing::debug!(page = self.name(), "page exiting");
		self.run_hook("on_exit", self.0.behavior.on_exit(self)).await;
	}

	pub(crate) fn bump_activation(&self) {
		self.0.activation.set(self.0.activation.get() + 1);
	}

	/// Writes captured scroll offsets and form values back into the freshly
	/// mounted view.
	pub(crate) fn restore_dom_state(&self) {
		let saved = self.0.saved.borrow();
		if let (Some(saved), Some(root)) = (saved.as_ref(), self.0.view.element()) {
			saved.restore(&root);
		}
	}

	pub(crate) async fn dispose(&self) {
		if self.phase() == PagePhase::Disposed {
			return;
		}
		self.0.view.destroy().await;
		self.0.phase.set(PagePhase::Disposed);
		self.bump_activation();
		tracing::debug!(page = self.name(), "page disposed");
	}

	async fn run_hook<F>(&self, hook: &'static str, result: F)
	where
		F: Future<Output = anyhow::Result<()>>,
	{
		if let Err(err) = result.await {
			tracing::error!(page = self.name(), hook, error = %format!("{err:#}"), "page hook failed");
			let view = &self.0.view;
			view.context().report(
				Diagnostic::new(DiagnosticKind::LifecycleHook, format!("{hook}: {err:#}"))
					.with_view(view.id())
					.with_page(self.name()),
			);
		}
	}
}

/// Reports whether a page is still in the activation it was taken from.
#[derive(Debug, Clone)]
pub struct ActivityToken {
	page: Weak<PageInner>,
	activation: u64,
}

impl ActivityToken {
	/// Returns `true` if the page is active and was not left or re-entered
	/// since the token was taken.
	pub fn is_current(&self) -> bool {
		self.page.upgrade().is_some_and(|page| {
			page.phase.get() == PagePhase::Active && page.activation.get() == self.activation
		})
	}
}
