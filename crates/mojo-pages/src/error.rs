//! Error types.
//!
//! Most failures inside the framework are recovered locally: they are logged,
//! published as a [`Diagnostic`](crate::bus::Diagnostic) and the affected node
//! keeps going. The types below are what is left for callers to handle.

use mojo_pages_template::TemplateError;
use thiserror::Error;

use crate::view::ViewId;

/// Errors from route registration and reverse routing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// The pattern could not be compiled.
	#[error("invalid route pattern '{pattern}': {reason}")]
	InvalidPattern {
		/// The pattern as written.
		pattern: String,
		/// What was wrong with it.
		reason: String,
	},
	/// No registered route accepts the address.
	#[error("no route matches '{0}'")]
	NotFound(String),
	/// No route is bound to the page.
	#[error("no route is bound to page '{0}'")]
	UnroutedPage(String),
	/// A required parameter was not supplied when building an address.
	#[error("missing parameter '{param}' for page '{page}'")]
	MissingParameter {
		/// Page being addressed.
		page: String,
		/// The absent parameter.
		param: String,
	},
}

/// Failure to turn a template source into markup.
#[derive(Debug, Clone, Error)]
pub enum TemplateResolutionError {
	/// The loader failed for an external template.
	#[error("failed to fetch template '{url}': {reason}")]
	Fetch {
		/// Resource that was requested.
		url: String,
		/// Loader error message.
		reason: String,
	},
	/// An external template was requested but no loader is installed.
	#[error("no template loader installed for '{0}'")]
	NoLoader(String),
	/// The template text did not compile or failed to render.
	#[error(transparent)]
	Template(#[from] TemplateError),
}

/// Errors returned by view operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
	/// The view was destroyed and can no longer render or mount.
	#[error("{0} has been destroyed")]
	Destroyed(ViewId),
	/// The child already belongs to another view.
	#[error("{0} already has a parent")]
	AlreadyAttached(ViewId),
	/// Attaching the child would make a view its own ancestor.
	#[error("attaching {child} under {parent} would create a cycle")]
	Cycle {
		/// Intended parent.
		parent: ViewId,
		/// Intended child.
		child: ViewId,
	},
}

/// Errors returned by the navigation controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
	/// Route resolution failed and no not-found page is configured.
	#[error(transparent)]
	Router(#[from] RouterError),
	/// No factory is registered under this page name.
	#[error("page '{0}' is not registered")]
	UnknownPage(String),
	/// Rendering or mounting the target page failed.
	#[error(transparent)]
	View(#[from] ViewError),
	/// The application was shut down.
	#[error("the application has been shut down")]
	ShutDown,
}

/// Errors from reading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML document did not deserialize.
	#[error("failed to parse configuration: {0}")]
	Parse(#[from] toml::de::Error),
	/// A field holds an unusable value.
	#[error("invalid configuration value for `{field}`: {reason}")]
	Invalid {
		/// Offending field.
		field: &'static str,
		/// Why it was rejected.
		reason: String,
	},
	/// One or more registered route patterns did not compile.
	#[error("invalid routes: {}", list_errors(.0))]
	Routes(Vec<RouterError>),
}

fn list_errors(errors: &[RouterError]) -> String {
	errors
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

/// Errors raised while building or starting an application.
#[derive(Debug, Error)]
pub enum AppError {
	/// The root container selector matched nothing in the document.
	#[error("root container '{0}' not found in the document")]
	MissingRootContainer(String),
	/// The page container selector matched nothing inside the root.
	#[error("page container '{0}' not found inside the root container")]
	MissingPageContainer(String),
	/// Configuration was rejected.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The initial navigation failed.
	#[error(transparent)]
	Navigation(#[from] NavigationError),
}
