//! Page activation hooks.

use async_trait::async_trait;
use serde_json::Value;

use super::Page;
use crate::router::{Params, Query};

/// Hooks run as a page is navigated to and away from.
///
/// Errors are logged and reported as lifecycle diagnostics; navigation
/// carries on.
#[async_trait(?Send)]
pub trait PageBehavior {
	/// Receives the parameters of each navigation to this page, before
	/// [`on_enter`](Self::on_enter). Also runs when only the parameters
	/// change.
	async fn on_params(&self, _page: &Page, _params: &Params, _query: &Query) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs when the page becomes active, after custom state was restored.
	async fn on_enter(&self, _page: &Page) -> anyhow::Result<()> {
		Ok(())
	}

	/// Runs when another page replaces this one, after state was captured.
	async fn on_exit(&self, _page: &Page) -> anyhow::Result<()> {
		Ok(())
	}

	/// Returns caller-defined state to keep while the page is inactive.
	fn capture_state(&self, _page: &Page) -> Option<Value> {
		None
	}

	/// Receives the state returned by [`capture_state`](Self::capture_state)
	/// when the page is entered again.
	fn restore_state(&self, _page: &Page, _state: &Value) {}
}

impl PageBehavior for () {}
