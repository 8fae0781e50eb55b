//! Logic-less templates for mojo-pages views.
//!
//! Templates are compiled with [handlebars]. They substitute values, show or
//! hide a block depending on a value, and repeat a block for every item of a
//! sequence. No custom helpers are registered, so a template cannot run
//! application code.
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `{{name}}` | HTML-escaped value |
//! | `{{{name}}}` | Raw value |
//! | `{{user.name}}` | Dotted lookup |
//! | `{{this}}` | Current item |
//! | `{{#if x}}…{{else}}…{{/if}}` | Show a block if `x` is truthy |
//! | `{{#unless x}}…{{/unless}}` | Show a block if `x` is falsy |
//! | `{{#each items}}…{{/each}}` | Repeat for every item |
//! | `{{#with user}}…{{/with}}` | Enter an object |
//! | `{{! comment }}` | Ignored |
//!
//! ## Example
//!
//! ```
//! use mojo_pages_template::Template;
//! use serde_json::json;
//!
//! let template = Template::parse("<ul>{{#each users}}<li>{{name}}</li>{{/each}}</ul>").unwrap();
//! let html = template
//!     .render(&json!({ "users": [{ "name": "Ada" }, { "name": "<b>" }] }))
//!     .unwrap();
//! assert_eq!(html, "<ul><li>Ada</li><li>&lt;b&gt;</li></ul>");
//! ```

#![warn(missing_docs)]

mod error;
mod template;

pub use error::TemplateError;
pub use template::Template;

/// Compiles `source` and renders it against `data` in one step.
///
/// # Errors
///
/// Returns [`TemplateError`] if `source` does not compile or fails to render.
pub fn render_str(source: &str, data: &serde_json::Value) -> Result<String, TemplateError> {
	Template::parse(source)?.render(data)
}
