//! Compiled templates.

use std::fmt;

use handlebars::Handlebars;
use serde_json::Value;

use crate::error::TemplateError;

const NAME: &str = "view";

/// A compiled template.
///
/// Each template owns a handlebars registry holding only itself, with the
/// built-in helpers and HTML escaping. Values missing from the data render
/// as empty text.
pub struct Template {
	registry: Handlebars<'static>,
}

impl fmt::Debug for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Template").finish_non_exhaustive()
	}
}

impl Template {
	/// Compiles `source`.
	///
	/// # Errors
	///
	/// [`TemplateError::Compile`] if `source` is not a well-formed template.
	pub fn parse(source: &str) -> Result<Self, TemplateError> {
		let mut registry = Handlebars::new();
		registry.set_strict_mode(false);
		registry.register_template_string(NAME, source)?;
		Ok(Self { registry })
	}

	/// Renders the template against `data`.
	///
	/// # Errors
	///
	/// [`TemplateError::Render`] if a tag cannot be evaluated, such as a call
	/// to an unknown helper.
	pub fn render(&self, data: &Value) -> Result<String, TemplateError> {
		Ok(self.registry.render(NAME, data)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("Hello {{name}}!", json!({"name": "Ada"}), "Hello Ada!")]
	#[case("{{user.name}}", json!({"user": {"name": "Grace"}}), "Grace")]
	#[case("[{{missing}}]", json!({}), "[]")]
	#[case("{{{raw}}}", json!({"raw": "<b>x</b>"}), "<b>x</b>")]
	#[case("{{! note }}kept", json!({}), "kept")]
	fn test_substitution(#[case] source: &str, #[case] data: Value, #[case] expected: &str) {
		let template = Template::parse(source).unwrap();

		assert_eq!(template.render(&data).unwrap(), expected);
	}

	#[rstest]
	fn test_values_are_escaped() {
		let template = Template::parse("<p>{{text}}</p>").unwrap();

		let html = template.render(&json!({"text": "<script>&"})).unwrap();

		assert_eq!(html, "<p>&lt;script&gt;&amp;</p>");
	}

	#[rstest]
	#[case(json!({"items": ["a", "b"]}), "<li>a</li><li>b</li>")]
	#[case(json!({"items": []}), "<li>none</li>")]
	#[case(json!({}), "<li>none</li>")]
	fn test_each_with_else(#[case] data: Value, #[case] expected: &str) {
		let template =
			Template::parse("{{#each items}}<li>{{this}}</li>{{else}}<li>none</li>{{/each}}")
				.unwrap();

		assert_eq!(template.render(&data).unwrap(), expected);
	}

	#[rstest]
	#[case(json!({"flag": true}), "on")]
	#[case(json!({"flag": false}), "off")]
	#[case(json!({"flag": 0}), "off")]
	#[case(json!({"flag": ""}), "off")]
	fn test_if_else(#[case] data: Value, #[case] expected: &str) {
		let template = Template::parse("{{#if flag}}on{{else}}off{{/if}}").unwrap();

		assert_eq!(template.render(&data).unwrap(), expected);
	}

	#[rstest]
	fn test_with_enters_object() {
		let template = Template::parse("{{#with user}}{{first}} {{last}}{{/with}}").unwrap();

		let html = template
			.render(&json!({"user": {"first": "Ada", "last": "Lovelace"}}))
			.unwrap();

		assert_eq!(html, "Ada Lovelace");
	}

	#[rstest]
	#[case("{{#if open}}never closed")]
	#[case("{{#each items}}x{{/if}}")]
	fn test_malformed_source_is_rejected(#[case] source: &str) {
		let err = Template::parse(source).unwrap_err();

		assert!(matches!(err, TemplateError::Compile(_)));
	}

	#[rstest]
	fn test_unknown_helper_fails_at_render() {
		let template = Template::parse("{{shout name}}").unwrap();

		let err = template.render(&json!({"name": "x"})).unwrap_err();

		assert!(matches!(err, TemplateError::Render(_)));
	}
}
