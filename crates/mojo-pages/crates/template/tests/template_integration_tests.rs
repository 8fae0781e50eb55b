//! Integration tests for the template engine
//!
//! These tests exercise templates the way views use them: whole fragments of
//! markup with nested blocks and data attributes.

use mojo_pages_template::{Template, TemplateError, render_str};
use rstest::rstest;
use serde_json::json;

#[rstest]
fn test_list_view_fragment() {
	// Arrange
	let source = r#"<section class="users">
{{#each users}}<div class="row" data-action="select" data-id="{{id}}">{{name}}{{#if admin}} (admin){{/if}}</div>{{else}}<p class="empty">No users</p>{{/each}}
</section>"#;
	let template = Template::parse(source).unwrap();

	// Act
	let filled = template
		.render(&json!({
			"users": [
				{ "id": 1, "name": "Ada", "admin": true },
				{ "id": 2, "name": "Linus", "admin": false }
			]
		}))
		.unwrap();
	let empty = template.render(&json!({ "users": [] })).unwrap();

	// Assert
	assert!(filled.contains(r#"data-id="1">Ada (admin)</div>"#));
	assert!(filled.contains(r#"data-id="2">Linus</div>"#));
	assert!(!filled.contains("No users"));
	assert!(empty.contains(r#"<p class="empty">No users</p>"#));
}

#[rstest]
fn test_attribute_values_are_escaped() {
	let html = render_str(
		r#"<input value="{{v}}">"#,
		&json!({ "v": "\"><script>" }),
	)
	.unwrap();

	assert_eq!(html, r#"<input value="&quot;&gt;&lt;script&gt;">"#);
}

#[rstest]
fn test_render_str_reports_compile_errors() {
	let err = render_str("{{#if open}}never closed", &json!({})).unwrap_err();

	assert!(matches!(err, TemplateError::Compile(_)));
	assert!(err.to_string().starts_with("template does not compile"));
}

#[rstest]
fn test_template_is_reusable_across_data() {
	let template = Template::parse("<b>{{count}}</b>").unwrap();

	let first = template.render(&json!({ "count": 1 })).unwrap();
	let second = template.render(&json!({ "count": 2 })).unwrap();

	assert_eq!((first.as_str(), second.as_str()), ("<b>1</b>", "<b>2</b>"));
}
