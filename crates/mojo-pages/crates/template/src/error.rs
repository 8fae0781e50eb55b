//! Template errors.

use std::sync::Arc;

use thiserror::Error;

/// Error raised while compiling or rendering a template.
///
/// The handlebars errors are shared so the value can be cloned into every
/// view waiting on the same template.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
	/// The source is not a well-formed template.
	#[error("template does not compile: {0}")]
	Compile(#[source] Arc<handlebars::TemplateError>),
	/// Rendering failed, for example on a helper that does not exist.
	#[error("template failed to render: {0}")]
	Render(#[source] Arc<handlebars::RenderError>),
}

impl From<handlebars::TemplateError> for TemplateError {
	fn from(err: handlebars::TemplateError) -> Self {
		Self::Compile(Arc::new(err))
	}
}

impl From<handlebars::RenderError> for TemplateError {
	fn from(err: handlebars::RenderError) -> Self {
		Self::Render(Arc::new(err))
	}
}
