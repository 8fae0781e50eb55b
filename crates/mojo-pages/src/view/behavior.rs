//! Lifecycle hooks.

use async_trait::async_trait;

use super::View;

/// Hooks run at each step of a view's lifecycle.
///
/// Every hook has a no-op default. A hook that returns an error is logged and
/// reported as a [`DiagnosticKind::LifecycleHook`](crate::bus::DiagnosticKind)
/// diagnostic; the lifecycle continues as if it had succeeded.
///
/// ```
/// use async_trait::async_trait;
/// use mojo_pages::view::{View, ViewBehavior};
///
/// struct Clock;
///
/// #[async_trait(?Send)]
/// impl ViewBehavior for Clock {
///     async fn on_after_mount(&self, view: &View) -> anyhow::Result<()> {
///         view.resources().on_dispose(|| { /* clear the host interval */ });
///         Ok(())
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait ViewBehavior {
	/// Runs once, before the first render.
	async fn on_init(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs before each render.
	async fn on_before_render(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs after each render, once children are rendered into their
	/// containers.
	async fn on_after_render(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs before the root is attached.
	async fn on_before_mount(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs after the root is attached and events are bound, before children
	/// mount.
	async fn on_after_mount(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs at the start of teardown, before any child is destroyed.
	async fn on_before_destroy(&self, _view: &View) -> anyhow::Result<()> {
		Ok(())
	}
}

impl ViewBehavior for () {}
