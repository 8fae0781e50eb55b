//! Delegated DOM events reaching action handlers.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mojo_pages::prelude::*;
use rstest::rstest;
use serial_test::serial;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A tracing layer that captures formatted events.
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct FieldVisitor {
			fields: Vec<String>,
		}

		impl tracing::field::Visit for FieldVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				self.fields.push(format!("{}={:?}", field.name(), value));
			}

			fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
				self.fields.push(format!("{}={}", field.name(), value));
			}
		}

		let mut visitor = FieldVisitor { fields: Vec::new() };
		event.record(&mut visitor);
		self.logs.lock().unwrap().push(format!(
			"[{}] {}",
			event.metadata().level(),
			visitor.fields.join(" ")
		));
	}
}

async fn mounted(view: &View) -> Node {
	view.mount(MountTarget::Body).await.unwrap();
	view.element().unwrap()
}

fn by_id(root: &Node, id: &str) -> Node {
	root.get_element_by_id(id).unwrap()
}

#[rstest]
#[tokio::test]
#[serial(tracing_capture)]
async fn test_unmatched_action_is_logged_not_raised() {
	// Arrange
	let logs = Arc::new(Mutex::new(Vec::new()));
	let _guard = tracing_subscriber::registry()
		.with(LogCapture {
			logs: Arc::clone(&logs),
		})
		.set_default();
	let ctx = AppContext::new();
	let view = View::builder(&ctx)
		.inline(r#"<button id="b" data-action="does-not-exist">x</button>"#)
		.build();
	let root = mounted(&view).await;

	// Act
	by_id(&root, "b").dispatch_event("click").await;

	// Assert
	let logs = logs.lock().unwrap();
	let warning = logs
		.iter()
		.find(|line| line.contains("no handler registered for action"));
	assert!(warning.is_some(), "{logs:?}");
	let warning = warning.unwrap();
	assert!(warning.starts_with("[WARN]"));
	assert!(warning.contains("action=does_not_exist"));
}

#[rstest]
#[tokio::test]
async fn test_failing_handler_is_reported_and_others_keep_working() {
	// Arrange
	let ctx = AppContext::new();
	let diagnostics = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&diagnostics);
	let _sub = ctx.bus().subscribe(move |event| {
		if let AppEvent::Diagnostic(d) = event {
			sink.borrow_mut().push(d.clone());
		}
	});
	let saved = Rc::new(Cell::new(false));
	let flag = Rc::clone(&saved);
	let view = View::builder(&ctx)
		.inline(r#"<button id="bad" data-action="explode"></button><button id="good" data-action="save"></button>"#)
		.action("explode", |_| async { anyhow::bail!("kaboom") })
		.action("save", move |_| {
			let flag = Rc::clone(&flag);
			async move {
				flag.set(true);
				Ok(())
			}
		})
		.build();
	let root = mounted(&view).await;

	// Act
	by_id(&root, "bad").dispatch_event("click").await;
	by_id(&root, "good").dispatch_event("click").await;

	// Assert
	assert!(saved.get());
	let diagnostics = diagnostics.borrow();
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::ActionHandler);
	assert_eq!(diagnostics[0].view_id, Some(view.id()));
	assert!(diagnostics[0].message.contains("kaboom"));
}

#[rstest]
#[tokio::test]
async fn test_event_types_use_their_own_attributes() {
	// Arrange
	let ctx = AppContext::new();
	let calls = Rc::new(RefCell::new(Vec::new()));
	let record = |name: &'static str| {
		let calls = Rc::clone(&calls);
		move |action: ActionContext| {
			let calls = Rc::clone(&calls);
			async move {
				let value = action.value().unwrap_or_default();
				calls.borrow_mut().push(format!("{name}:{value}"));
				Ok(())
			}
		}
	};
	let view = View::builder(&ctx)
		.inline(r#"<input id="filter" data-input-action="filter" data-change-action="commit">"#)
		.action("filter", record("filter"))
		.action("commit", record("commit"))
		.build();
	let root = mounted(&view).await;
	let input = by_id(&root, "filter");
	input.set_value("ab");

	// Act
	input.dispatch_event("input").await;
	input.dispatch_event("change").await;
	input.dispatch_event("click").await;

	// Assert
	assert_eq!(*calls.borrow(), vec!["filter:ab", "commit:ab"]);
}

#[rstest]
#[tokio::test]
async fn test_nested_view_handles_its_own_actions() {
	// Arrange
	let ctx = AppContext::new();
	let calls = Rc::new(RefCell::new(Vec::new()));
	let (outer_calls, inner_calls) = (Rc::clone(&calls), Rc::clone(&calls));
	let child = View::builder(&ctx)
		.inline(r#"<button id="inner" data-action="pick">pick</button><span id="plain">text</span>"#)
		.action("pick", move |_| {
			let calls = Rc::clone(&inner_calls);
			async move {
				calls.borrow_mut().push("child:pick");
				Ok(())
			}
		})
		.build();
	let parent = View::builder(&ctx)
		.inline(r#"<section data-action="select"><div data-container="body"></div></section>"#)
		.action("select", move |_| {
			let calls = Rc::clone(&outer_calls);
			async move {
				calls.borrow_mut().push("parent:select");
				Ok(())
			}
		})
		.child("body", child)
		.build();
	let root = mounted(&parent).await;

	// Act
	by_id(&root, "inner").dispatch_event("click").await;
	by_id(&root, "plain").dispatch_event("click").await;

	// Assert
	assert_eq!(*calls.borrow(), vec!["child:pick"]);
}

#[rstest]
#[tokio::test]
async fn test_target_without_action_invokes_nothing() {
	let ctx = AppContext::new();
	let called = Rc::new(Cell::new(false));
	let flag = Rc::clone(&called);
	let view = View::builder(&ctx)
		.inline(r#"<p id="p">plain</p><button data-action="go"></button>"#)
		.action("go", move |_| {
			let flag = Rc::clone(&flag);
			async move {
				flag.set(true);
				Ok(())
			}
		})
		.build();
	let root = mounted(&view).await;

	by_id(&root, "p").dispatch_event("click").await;

	assert!(!called.get());
}

#[rstest]
#[tokio::test]
async fn test_in_flight_flag_drops_reentrant_clicks() {
	// Arrange
	let ctx = AppContext::new();
	let requests = Rc::new(Cell::new(0));
	let counter = Rc::clone(&requests);
	let saving = InFlight::new();
	let view = View::builder(&ctx)
		.inline(r#"<button id="save" data-action="save">Save</button>"#)
		.action("save", move |_| {
			let counter = Rc::clone(&counter);
			let saving = saving.clone();
			async move {
				let Some(_busy) = saving.try_begin() else {
					return Ok(());
				};
				counter.set(counter.get() + 1);
				tokio::time::sleep(Duration::from_millis(10)).await;
				Ok(())
			}
		})
		.build();
	let root = mounted(&view).await;
	let button = by_id(&root, "save");

	// Act
	futures::join!(button.dispatch_event("click"), button.dispatch_event("click"));
	button.dispatch_event("click").await;

	// Assert
	assert_eq!(requests.get(), 2);
}

#[rstest]
#[tokio::test]
async fn test_destroyed_view_stops_handling_events() {
	let ctx = AppContext::new();
	let count = Rc::new(Cell::new(0));
	let counter = Rc::clone(&count);
	let view = View::builder(&ctx)
		.inline(r#"<button id="b" data-action="tap"></button>"#)
		.action("tap", move |_| {
			let counter = Rc::clone(&counter);
			async move {
				counter.set(counter.get() + 1);
				Ok(())
			}
		})
		.build();
	let root = mounted(&view).await;
	let button = by_id(&root, "b");

	button.dispatch_event("click").await;
	view.destroy().await;
	button.dispatch_event("click").await;

	assert_eq!(count.get(), 1);
	assert_eq!(root.listener_count(), 0);
	assert_eq!(view.resource_count(), 0);
}
