//! View construction, rendering, mounting and teardown.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use mojo_pages_template::Template;
use serde_json::{Map, Value};

use super::behavior::ViewBehavior;
use super::template::TemplateSource;
use super::{CONTAINER_ATTR, MountTarget, VIEW_ID_ATTR, ViewId, ViewState};
use crate::bus::{Diagnostic, DiagnosticKind};
use crate::context::AppContext;
use crate::delegation::{self, ActionContext, ActionMap};
use crate::dom::{Document, Node};
use crate::error::{TemplateResolutionError, ViewError};
use crate::resource::{ListenerGuard, ResourceScope};

struct Child {
	container: String,
	view: View,
}

pub(crate) struct ViewInner {
	id: ViewId,
	ctx: AppContext,
	tag: String,
	class: Option<String>,
	template: TemplateSource,
	compiled: RefCell<Option<Rc<Template>>>,
	behavior: Rc<dyn ViewBehavior>,
	actions: ActionMap,
	data: RefCell<Map<String, Value>>,
	element: RefCell<Option<Node>>,
	parent: RefCell<Weak<ViewInner>>,
	children: RefCell<Vec<Child>>,
	state: Cell<ViewState>,
	initialized: Cell<bool>,
	dirty: Cell<bool>,
	resources: ResourceScope,
	bindings: ResourceScope,
}

/// A renderable node.
///
/// `View` is a reference-counted handle; clones refer to the same view. The
/// parent link is weak, so a view is kept alive by its parent or by whoever
/// holds a handle.
#[derive(Clone)]
pub struct View(pub(crate) Rc<ViewInner>);

impl fmt::Debug for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("View")
			.field("id", &self.0.id)
			.field("state", &self.0.state.get())
			.field("template", &self.0.template)
			.field("children", &self.0.children.borrow().len())
			.finish()
	}
}

impl PartialEq for View {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for View {}

impl View {
	/// Starts building a view.
	pub fn builder(ctx: &AppContext) -> ViewBuilder {
		ViewBuilder::new(ctx)
	}

	/// Returns the id.
	pub fn id(&self) -> ViewId {
		self.0.id
	}

	/// Returns the application context.
	pub fn context(&self) -> &AppContext {
		&self.0.ctx
	}

	/// Returns the lifecycle state.
	pub fn state(&self) -> ViewState {
		self.0.state.get()
	}

	/// Returns `true` while the view is attached with events bound.
	pub fn is_mounted(&self) -> bool {
		self.0.state.get() == ViewState::Mounted
	}

	/// Returns `true` once teardown started.
	pub fn is_destroyed(&self) -> bool {
		matches!(
			self.0.state.get(),
			ViewState::Destroying | ViewState::Destroyed
		)
	}

	/// Returns `true` if data changed since the last render.
	pub fn is_dirty(&self) -> bool {
		self.0.dirty.get()
	}

	/// Returns `true` if both handles refer to the same view.
	pub fn ptr_eq(&self, other: &View) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Returns the root element once rendered.
	pub fn element(&self) -> Option<Node> {
		self.0.element.borrow().clone()
	}

	/// Returns a snapshot of the data bag as a JSON object.
	pub fn data(&self) -> Value {
		Value::Object(self.0.data.borrow().clone())
	}

	/// Returns one data value.
	pub fn get(&self, key: &str) -> Option<Value> {
		self.0.data.borrow().get(key).cloned()
	}

	/// Returns the registered action handlers.
	pub fn actions(&self) -> &ActionMap {
		&self.0.actions
	}

	/// Returns the scope for resources that must not outlive the view.
	pub fn resources(&self) -> &ResourceScope {
		&self.0.resources
	}

	/// Returns the number of live resources and event bindings in this
	/// subtree.
	pub fn resource_count(&self) -> usize {
		self.0.resources.len()
			+ self.0.bindings.len()
			+ self
				.children()
				.iter()
				.map(View::resource_count)
				.sum::<usize>()
	}

	// Tree

	/// Returns the parent view.
	pub fn parent(&self) -> Option<View> {
		self.0.parent.borrow().upgrade().map(View)
	}

	/// Returns the children in declaration order.
	pub fn children(&self) -> Vec<View> {
		self.0
			.children
			.borrow()
			.iter()
			.map(|child| child.view.clone())
			.collect()
	}

	/// Returns the first child declared for `container`.
	pub fn child(&self, container: &str) -> Option<View> {
		self.0
			.children
			.borrow()
			.iter()
			.find(|child| child.container == container)
			.map(|child| child.view.clone())
	}

	/// Declares `child` to render into the `data-container="{container}"`
	/// element of this view's output.
	///
	/// The child shows up on the next render of this view.
	///
	/// # Errors
	///
	/// Fails if either view is destroyed, if the child already has a parent,
	/// or if the child is this view or one of its ancestors.
	pub fn add_child(&self, container: impl Into<String>, child: View) -> Result<(), ViewError> {
		self.ensure_alive()?;
		child.ensure_alive()?;
		if child.parent().is_some() {
			return Err(ViewError::AlreadyAttached(child.id()));
		}
		let mut ancestor = Some(self.clone());
		while let Some(view) = ancestor {
			if view.ptr_eq(&child) {
				return Err(ViewError::Cycle {
					parent: self.id(),
					child: child.id(),
				});
			}
			ancestor = view.parent();
		}

		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(Child {
			container: container.into(),
			view: child,
		});
		Ok(())
	}

	/// Removes `child` without destroying it. Its root leaves the DOM.
	pub fn remove_child(&self, child: &View) -> bool {
		let removed = {
			let mut children = self.0.children.borrow_mut();
			let before = children.len();
			children.retain(|entry| !entry.view.ptr_eq(child));
			children.len() != before
		};
		if removed {
			*child.0.parent.borrow_mut() = Weak::new();
			child.unmount();
		}
		removed
	}

	// Lifecycle

	fn ensure_alive(&self) -> Result<(), ViewError> {
		if self.is_destroyed() {
			return Err(ViewError::Destroyed(self.id()));
		}
		Ok(())
	}

	/// Runs `on_init` if it has not run yet.
	pub async fn init(&self) {
		if self.0.initialized.replace(true) {
			return;
		}
		self.run_hook("on_init", self.0.behavior.on_init(self)).await;
		if self.0.state.get() == ViewState::Constructed {
			self.0.state.set(ViewState::Initialized);
		}
		tracing::debug!(view_id = %self.id(), "view initialized");
	}

	/// Builds this view's output and renders its children into their
	/// containers.
	///
	/// Rendering replaces any previous output. With unchanged data the
	/// resulting markup is identical. The root element itself is kept across
	/// renders, so a mounted view stays mounted.
	///
	/// # Errors
	///
	/// [`ViewError::Destroyed`] once the view is torn down.
	pub async fn render(&self) -> Result<(), ViewError> {
		self.render_tree().await
	}

	fn render_tree(&self) -> LocalBoxFuture<'static, Result<(), ViewError>> {
		let view = self.clone();
		async move {
			view.ensure_alive()?;
			view.init().await;
			view.run_hook("on_before_render", view.0.behavior.on_before_render(&view))
				.await;

			let markup = view.resolve_markup().await;
			let root = view.root_element();
			let document = view.0.ctx.document().clone();
			let preserved = Preserved::capture(&document, &root);

			root.set_inner_html(&markup);
			view.render_children(&root).await;
			preserved.restore(&document, &root);

			view.0.dirty.set(false);
			if matches!(
				view.0.state.get(),
				ViewState::Constructed | ViewState::Initialized
			) {
				view.0.state.set(ViewState::Rendered);
			}
			view.run_hook("on_after_render", view.0.behavior.on_after_render(&view))
				.await;
			tracing::debug!(view_id = %view.id(), "view rendered");
			Ok::<(), ViewError>(())
		}
		.boxed_local()
	}

	async fn render_children(&self, root: &Node) {
		let children: Vec<(String, View)> = self
			.0
			.children
			.borrow()
			.iter()
			.map(|child| (child.container.clone(), child.view.clone()))
			.collect();

		let mut filled: Vec<String> = Vec::new();
		for (container, child) in children {
			if child.is_destroyed() {
				continue;
			}
			let Some(slot) = find_container(root, &container) else {
				tracing::warn!(
					view_id = %self.id(),
					child = %child.id(),
					container = %container,
					"child container missing from rendered output"
				);
				self.0.ctx.report(
					Diagnostic::new(
						DiagnosticKind::MissingContainer,
						format!("container '{container}' not found for {}", child.id()),
					)
					.with_view(self.id()),
				);
				child.unmount();
				continue;
			};

			if let Err(err) = child.render_tree().await {
				tracing::warn!(view_id = %child.id(), error = %err, "child render failed");
				continue;
			}
			let Some(child_root) = child.element() else {
				continue;
			};
			if filled.contains(&container) {
				slot.append_child(&child_root);
			} else {
				slot.replace_children(vec![child_root]);
				filled.push(container);
			}
		}
	}

	async fn resolve_markup(&self) -> String {
		let data = self.data();
		let template: Result<Option<Rc<Template>>, TemplateResolutionError> = match &self.0.template
		{
			TemplateSource::Empty => Ok(None),
			TemplateSource::Inline(source) => self.compiled_inline(source).map(Some),
			TemplateSource::Function(build) => Template::parse(&build(&data))
				.map(|template| Some(Rc::new(template)))
				.map_err(TemplateResolutionError::from),
			TemplateSource::External(url) => self.0.ctx.templates().resolve(url).await.map(Some),
		};

		let markup = template.and_then(|template| match template {
			Some(template) => Ok(template.render(&data)?),
			None => Ok(String::new()),
		});
		match markup {
			Ok(markup) => markup,
			Err(err) => {
				tracing::warn!(view_id = %self.id(), error = %err, "template resolution failed; rendering empty content");
				self.0.ctx.report(
					Diagnostic::new(DiagnosticKind::TemplateResolution, err.to_string())
						.with_view(self.id()),
				);
				String::new()
			}
		}
	}

	fn compiled_inline(&self, source: &str) -> Result<Rc<Template>, TemplateResolutionError> {
		if let Some(template) = self.0.compiled.borrow().as_ref() {
			return Ok(Rc::clone(template));
		}
		let template = Rc::new(Template::parse(source)?);
		*self.0.compiled.borrow_mut() = Some(Rc::clone(&template));
		Ok(template)
	}

	fn root_element(&self) -> Node {
		if let Some(root) = self.0.element.borrow().as_ref() {
			return root.clone();
		}
		let root = Node::element(&self.0.tag);
		root.set_attribute(VIEW_ID_ATTR, self.0.id.0.to_string());
		if let Some(class) = &self.0.class {
			root.set_attribute("class", class.clone());
		}
		*self.0.element.borrow_mut() = Some(root.clone());
		root
	}

	/// Attaches the root to `target`, binds delegated events and mounts the
	/// children, parent first.
	///
	/// Renders first if the view was never rendered or its data changed.
	///
	/// # Errors
	///
	/// [`ViewError::Destroyed`] once the view is torn down.
	pub async fn mount(&self, target: impl Into<MountTarget>) -> Result<(), ViewError> {
		self.ensure_alive()?;
		if self.0.element.borrow().is_none() || self.0.dirty.get() {
			self.render_tree().await?;
		}

		self.run_hook("on_before_mount", self.0.behavior.on_before_mount(self))
			.await;
		let root = self.root_element();
		match target.into() {
			MountTarget::Replace(container) => container.replace_children(vec![root.clone()]),
			MountTarget::Element(container) => container.append_child(&root),
			MountTarget::Body => self.0.ctx.document().body().append_child(&root),
			MountTarget::Selector(selector) => {
				let document = self.0.ctx.document();
				match document.query_selector(&selector) {
					Some(container) => container.append_child(&root),
					None => {
						tracing::warn!(view_id = %self.id(), selector = %selector, "mount target not found; appending to body");
						document.body().append_child(&root);
					}
				}
			}
		}
		self.bind_events(&root);
		self.0.state.set(ViewState::Mounted);
		self.run_hook("on_after_mount", self.0.behavior.on_after_mount(self))
			.await;
		tracing::debug!(view_id = %self.id(), "view mounted");

		self.mount_children().await;
		Ok(())
	}

	fn mount_children(&self) -> LocalBoxFuture<'static, ()> {
		let view = self.clone();
		async move {
			for child in view.children() {
				if child.is_destroyed() {
					continue;
				}
				let placed = child
					.element()
					.is_some_and(|root| root.parent().is_some());
				if !placed {
					continue;
				}
				if child.is_mounted() {
					child.mount_children().await;
				} else {
					child.mount_in_place().await;
				}
			}
		}
		.boxed_local()
	}

	async fn mount_in_place(&self) {
		self.run_hook("on_before_mount", self.0.behavior.on_before_mount(self))
			.await;
		if let Some(root) = self.element() {
			self.bind_events(&root);
		}
		self.0.state.set(ViewState::Mounted);
		self.run_hook("on_after_mount", self.0.behavior.on_after_mount(self))
			.await;
		tracing::debug!(view_id = %self.id(), "view mounted");
		self.mount_children().await;
	}

	fn bind_events(&self, root: &Node) {
		if !self.0.bindings.is_empty() {
			return;
		}
		let config = self.0.ctx.config();
		let all_attributes: Rc<[String]> = config.action_attributes().into();
		for (event_type, attributes) in config.delegated_event_groups() {
			let weak = Rc::downgrade(&self.0);
			let attributes: Rc<[String]> = attributes.into();
			let all_attributes = Rc::clone(&all_attributes);
			let id = root.add_event_listener(&event_type, move |event| {
				let weak = weak.clone();
				let attributes = Rc::clone(&attributes);
				let all_attributes = Rc::clone(&all_attributes);
				async move {
					if let Some(inner) = weak.upgrade() {
						delegation::dispatch(&View(inner), &event, &attributes, &all_attributes)
							.await;
					}
				}
				.boxed_local()
			});
			self.0.bindings.add(ListenerGuard::new(root.clone(), id));
		}
	}

	/// Detaches the root and unbinds delegated events for the whole subtree.
	///
	/// The output is kept; a later [`mount`](Self::mount) re-attaches it.
	pub fn unmount(&self) {
		if let Some(root) = self.element() {
			root.detach();
		}
		self.unbind_tree();
	}

	fn unbind_tree(&self) {
		self.0.bindings.dispose_all();
		if self.0.state.get() == ViewState::Mounted {
			self.0.state.set(ViewState::Rendered);
		}
		for child in self.children() {
			child.unbind_tree();
		}
	}

	/// Shallow-merges `partial` into the data bag and re-renders.
	///
	/// A rendered view re-renders its whole subtree; a mounted one also
	/// mounts children that appeared. Focus and scroll offsets of elements
	/// whose id survives the re-render are kept. Non-object values are
	/// ignored.
	///
	/// # Errors
	///
	/// [`ViewError::Destroyed`] once the view is torn down.
	pub async fn update_data(&self, partial: Value) -> Result<(), ViewError> {
		self.merge_data(partial)?;
		if self.0.element.borrow().is_some() {
			self.refresh().await?;
		}
		Ok(())
	}

	/// Merges like [`update_data`](Self::update_data) but only marks the view
	/// dirty.
	pub fn update_data_quiet(&self, partial: Value) -> Result<(), ViewError> {
		self.merge_data(partial)
	}

	fn merge_data(&self, partial: Value) -> Result<(), ViewError> {
		self.ensure_alive()?;
		match partial {
			Value::Object(map) => self.0.data.borrow_mut().extend(map),
			Value::Null => {}
			other => {
				tracing::warn!(view_id = %self.id(), value = %other, "ignoring non-object data update");
				return Ok(());
			}
		}
		self.0.dirty.set(true);
		Ok(())
	}

	/// Re-renders the subtree and mounts any children that appeared.
	pub async fn refresh(&self) -> Result<(), ViewError> {
		self.render_tree().await?;
		if self.is_mounted() {
			self.mount_children().await;
		}
		Ok(())
	}

	/// Tears down the subtree top-down.
	///
	/// Runs `on_before_destroy` on this view and then on each descendant,
	/// disposes every resource and event binding, detaches the root and
	/// unlinks the view from its parent. Calling it again does nothing.
	pub async fn destroy(&self) {
		self.destroy_tree().await;
	}

	fn destroy_tree(&self) -> LocalBoxFuture<'static, ()> {
		let view = self.clone();
		async move {
			if view.is_destroyed() {
				return;
			}
			view.0.state.set(ViewState::Destroying);
			view.run_hook("on_before_destroy", view.0.behavior.on_before_destroy(&view))
				.await;

			for child in view.children() {
				child.destroy_tree().await;
			}

			view.0.bindings.dispose_all();
			view.0.resources.dispose_all();
			let root = view.0.element.borrow_mut().take();
			if let Some(root) = root {
				root.detach();
			}
			view.0.children.borrow_mut().clear();
			if let Some(parent) = view.parent() {
				parent
					.0
					.children
					.borrow_mut()
					.retain(|child| !child.view.ptr_eq(&view));
			}
			*view.0.parent.borrow_mut() = Weak::new();
			view.0.state.set(ViewState::Destroyed);
			tracing::debug!(view_id = %view.id(), "view destroyed");
		}
		.boxed_local()
	}

	pub(crate) async fn run_hook<F>(&self, hook: &'static str, result: F)
	where
		F: Future<Output = anyhow::Result<()>>,
	{
		if let Err(err) = result.await {
			tracing::error!(view_id = %self.id(), hook, error = %format!("{err:#}"), "lifecycle hook failed");
			self.0.ctx.report(
				Diagnostic::new(DiagnosticKind::LifecycleHook, format!("{hook}: {err:#}"))
					.with_view(self.id()),
			);
		}
	}
}

fn find_container(root: &Node, name: &str) -> Option<Node> {
	root.descendants()
		.into_iter()
		.find(|node| node.attribute(CONTAINER_ATTR).as_deref() == Some(name))
}

/// Focus and scroll offsets carried across a re-render.
struct Preserved {
	focused: Option<String>,
	scroll: Vec<(String, i64)>,
}

impl Preserved {
	fn capture(document: &Document, root: &Node) -> Self {
		let focused = document
			.active_element()
			.filter(|node| root.contains(node) && !node.ptr_eq(root))
			.and_then(|node| node.id());
		let scroll = root
			.descendants()
			.into_iter()
			.filter(|node| node.scroll_top() != 0)
			.filter_map(|node| node.id().map(|id| (id, node.scroll_top())))
			.collect();
		Self { focused, scroll }
	}

	fn restore(self, document: &Document, root: &Node) {
		for (id, offset) in self.scroll {
			if let Some(node) = root.get_element_by_id(&id) {
				node.set_scroll_top(offset);
			}
		}
		if let Some(id) = self.focused
			&& let Some(node) = root.get_element_by_id(&id)
		{
			document.focus(&node);
		}
	}
}

/// Builder for [`View`].
pub struct ViewBuilder {
	ctx: AppContext,
	tag: String,
	class: Option<String>,
	template: TemplateSource,
	data: Map<String, Value>,
	behavior: Rc<dyn ViewBehavior>,
	actions: ActionMap,
	children: Vec<(String, View)>,
}

impl ViewBuilder {
	fn new(ctx: &AppContext) -> Self {
		Self {
			ctx: ctx.clone(),
			tag: "div".to_string(),
			class: None,
			template: TemplateSource::Empty,
			data: Map::new(),
			behavior: Rc::new(()),
			actions: ActionMap::new(),
			children: Vec::new(),
		}
	}

	/// Sets the root element's tag. Defaults to `div`.
	pub fn tag(mut self, tag: &str) -> Self {
		self.tag = tag.to_string();
		self
	}

	/// Sets the root element's `class` attribute.
	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}

	/// Sets the template source.
	pub fn template(mut self, template: TemplateSource) -> Self {
		self.template = template;
		self
	}

	/// Uses inline template text.
	pub fn inline(self, source: impl Into<String>) -> Self {
		self.template(TemplateSource::inline(source))
	}

	/// Computes the template text from the data on each render.
	pub fn template_fn(self, build: impl Fn(&Value) -> String + 'static) -> Self {
		self.template(TemplateSource::function(build))
	}

	/// Loads the template from `url` through the application's loader.
	pub fn external(self, url: impl Into<String>) -> Self {
		self.template(TemplateSource::external(url))
	}

	/// Merges an object into the initial data. Non-object values are ignored.
	pub fn data(mut self, data: Value) -> Self {
		if let Value::Object(map) = data {
			self.data.extend(map);
		}
		self
	}

	/// Sets the lifecycle hooks.
	pub fn behavior(self, behavior: impl ViewBehavior + 'static) -> Self {
		self.shared_behavior(Rc::new(behavior))
	}

	/// Sets lifecycle hooks shared with other owners.
	pub fn shared_behavior(mut self, behavior: Rc<dyn ViewBehavior>) -> Self {
		self.behavior = behavior;
		self
	}

	/// Registers an action handler.
	///
	/// The name is normalized, so `"save-item"`, `"saveItem"` and
	/// `"save_item"` all register the same handler.
	pub fn action<F, Fut>(mut self, name: &str, handler: F) -> Self
	where
		F: Fn(ActionContext) -> Fut + 'static,
		Fut: Future<Output = anyhow::Result<()>> + 'static,
	{
		self.actions.insert(name, handler);
		self
	}

	/// Declares a child rendered into `data-container="{container}"`.
	pub fn child(mut self, container: impl Into<String>, view: View) -> Self {
		self.children.push((container.into(), view));
		self
	}

	/// Builds the view.
	///
	/// Children that cannot be attached (already parented, destroyed) are
	/// skipped and logged.
	pub fn build(self) -> View {
		let view = View(Rc::new(ViewInner {
			id: self.ctx.next_view_id(),
			ctx: self.ctx,
			tag: self.tag,
			class: self.class,
			template: self.template,
			compiled: RefCell::new(None),
			behavior: self.behavior,
			actions: self.actions,
			data: RefCell::new(self.data),
			element: RefCell::new(None),
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			state: Cell::new(ViewState::Constructed),
			initialized: Cell::new(false),
			dirty: Cell::new(false),
			resources: ResourceScope::new(),
			bindings: ResourceScope::new(),
		}));
		for (container, child) in self.children {
			if let Err(err) = view.add_child(container, child) {
				tracing::warn!(view_id = %view.id(), error = %err, "skipping child");
			}
		}
		view
	}
}
