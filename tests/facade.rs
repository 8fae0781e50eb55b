//! The `mojo` facade exposes the framework crate.

use mojo::prelude::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test]
async fn test_counter_page_through_facade() {
	// Arrange
	let app = Application::builder()
		.document(Document::with_body(r#"<div id="app"></div>"#))
		.route("/", "counter")
		.page("counter", |ctx| {
			Page::with_view(
				View::builder(ctx)
					.inline(r#"<button id="inc" data-action="increment">{{count}}</button>"#)
					.data(json!({ "count": 0 }))
					.action("increment", |action| async move {
						let count = action.view.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
						action.view.update_data(json!({ "count": count + 1 })).await?;
						Ok::<_, anyhow::Error>(())
					})
					.build(),
			)
		})
		.build()
		.unwrap();
	app.start().await.unwrap();
	let document = app.context().document().clone();

	// Act
	document.get_element_by_id("inc").unwrap().dispatch_event("click").await;
	document.get_element_by_id("inc").unwrap().dispatch_event("click").await;

	// Assert
	assert_eq!(document.get_element_by_id("inc").unwrap().text_content(), "2");
	assert_eq!(mojo::template::render_str("{{n}}", &json!({ "n": 1 })).unwrap(), "1");
}
