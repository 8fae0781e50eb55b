//! Declarative event delegation.
//!
//! A mounted view installs one listener per delegated event type on its root
//! element. When an event bubbles up, the listener walks from the target
//! towards the root and runs the handler named by the first action attribute
//! it finds:
//!
//! ```html
//! <button data-action="remove-item" data-item-id="7">Remove</button>
//! <input data-input-action="filter">
//! ```
//!
//! Events raised inside a nested view are left to that view's own listener.
//! Bindings are owned by the view and released when it unmounts or is
//! destroyed.

mod actions;
mod dispatch;
mod inflight;

pub use actions::{ActionContext, ActionHandler, ActionMap, normalize_action_name};
pub(crate) use dispatch::dispatch;
pub use inflight::{InFlight, InFlightGuard};
