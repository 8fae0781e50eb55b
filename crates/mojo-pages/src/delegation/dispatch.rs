//! Routing a delegated DOM event to a view's action handler.

use std::collections::BTreeMap;

use super::actions::{ActionContext, normalize_action_name};
use crate::bus::{Diagnostic, DiagnosticKind};
use crate::dom::{Event, Node};
use crate::view::{CONTAINER_ATTR, VIEW_ID_ATTR, View};

/// Handles `event` for `view`.
///
/// `attributes` are the action attributes bound to this event type and
/// `action_attributes` every attribute that names an action; the latter are
/// kept out of [`ActionContext::data`].
pub(crate) async fn dispatch(
	view: &View,
	event: &Event,
	attributes: &[String],
	action_attributes: &[String],
) {
	let Some(root) = view.element() else {
		return;
	};
	let Some((element, action)) = find_action(&root, event.target(), attributes) else {
		return;
	};

	if event.event_type() == "submit" {
		event.prevent_default();
	}

	let name = normalize_action_name(&action);
	let Some(handler) = view.actions().get(&name) else {
		tracing::warn!(
			view_id = %view.id(),
			action = %name,
			event = event.event_type(),
			"no handler registered for action"
		);
		return;
	};

	tracing::debug!(view_id = %view.id(), action = %name, "running action");
	let ctx = ActionContext {
		view: view.clone(),
		event: event.clone(),
		data: data_attributes(&element, action_attributes),
		element,
		action: name.clone(),
	};
	if let Err(err) = handler(ctx).await {
		tracing::error!(
			view_id = %view.id(),
			action = %name,
			error = %format!("{err:#}"),
			"action handler failed"
		);
		view.context().report(
			Diagnostic::new(DiagnosticKind::ActionHandler, format!("{name}: {err:#}"))
				.with_view(view.id()),
		);
	}
}

/// Walks from `target` up to `root` and returns the first element carrying
/// one of `attributes`. Targets inside a nested view belong to that view.
fn find_action(root: &Node, target: &Node, attributes: &[String]) -> Option<(Node, String)> {
	if !root.contains(target) {
		return None;
	}
	let path: Vec<Node> = target
		.ancestors()
		.take_while(|node| !node.ptr_eq(root))
		.collect();
	if path.iter().any(|node| node.has_attribute(VIEW_ID_ATTR)) {
		return None;
	}
	path.into_iter()
		.chain(std::iter::once(root.clone()))
		.find_map(|node| {
			let action = attributes
				.iter()
				.filter_map(|attribute| node.attribute(attribute))
				.find(|value| !value.trim().is_empty())?;
			Some((node, action))
		})
}

fn data_attributes(element: &Node, action_attributes: &[String]) -> BTreeMap<String, String> {
	element
		.attributes()
		.into_iter()
		.filter(|(name, _)| {
			name != VIEW_ID_ATTR
				&& name != CONTAINER_ATTR
				&& !action_attributes.iter().any(|attribute| attribute == name)
		})
		.filter_map(|(name, value)| {
			let key = name.strip_prefix("data-")?;
			Some((key.replace('-', "_"), value))
		})
		.collect()
}
