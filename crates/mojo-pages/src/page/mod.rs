//! Addressable pages.
//!
//! A [`Page`] composes a [`View`](crate::view::View) with a route binding and
//! an activation state machine:
//!
//! ```text
//! Registered -> Instantiated -> Active <-> Inactive -> Disposed
//! ```
//!
//! The navigation controller keeps at most one instance per page name for the
//! lifetime of the application. Leaving a page captures its scroll offset,
//! form fields and custom state; coming back restores them.

mod behavior;
mod instance;
mod state;

pub use behavior::PageBehavior;
pub use instance::{ActivityToken, Page};
pub use state::{FieldState, SavedState};

/// Activation phase of a page name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
	/// Known to the application, never instantiated.
	Registered,
	/// Instance built and initialized, never entered.
	Instantiated,
	/// Currently shown.
	Active,
	/// Left; state captured.
	Inactive,
	/// Torn down with the application.
	Disposed,
}
