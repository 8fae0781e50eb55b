//! Commonly used types.
//!
//! ```
//! use mojo_pages::prelude::*;
//! ```

pub use crate::bus::{AppEvent, Diagnostic, DiagnosticKind};
pub use crate::config::{AppConfig, RouterMode};
pub use crate::context::{AppContext, AppState};
pub use crate::delegation::{ActionContext, InFlight};
pub use crate::dom::{Document, Event, Node};
pub use crate::error::{AppError, NavigationError, RouterError, ViewError};
pub use crate::navigation::{NavTarget, NavigationOutcome};
pub use crate::page::{Page, PageBehavior};
pub use crate::router::guards::{require_flag, require_permission};
pub use crate::router::{History, MemoryHistory, Params, Query, Router};
pub use crate::view::{MountTarget, TemplateLoader, View, ViewBehavior};
pub use crate::{Application, ApplicationBuilder};
