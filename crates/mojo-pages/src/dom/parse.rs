//! HTML fragment parsing.
//!
//! Uses html5ever's fragment algorithm over an RcDom and converts the result
//! into [`Node`]s.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_fragment as parse_html_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::node::Node;

/// Tag used as the parsing context when none is given.
pub const DEFAULT_CONTEXT: &str = "body";

/// Parses an HTML fragment into detached nodes, as if it were the content of
/// a `<body>` element.
pub fn parse_fragment(html: &str) -> Vec<Node> {
	parse_fragment_in(html, DEFAULT_CONTEXT)
}

/// Parses an HTML fragment as the content of a `context` element.
///
/// The context decides which markup is valid: `<tr>` rows survive under a
/// `tbody` context and are dropped under `div`. Whitespace text is kept;
/// comments are dropped.
pub fn parse_fragment_in(html: &str, context: &str) -> Vec<Node> {
	if html.is_empty() {
		return Vec::new();
	}

	let context_name = QualName::new(None, ns!(html), LocalName::from(context));
	let dom = parse_html_fragment(
		RcDom::default(),
		ParseOpts::default(),
		context_name,
		Vec::new(),
		true,
	)
	.one(html);

	// The fragment algorithm parents the parsed nodes under a synthesized
	// `<html>` element.
	let document = dom.document.children.borrow();
	document
		.iter()
		.flat_map(|top| top.children.borrow().clone())
		.filter_map(|child| convert(&child))
		.collect()
}

fn convert(handle: &Handle) -> Option<Node> {
	match &handle.data {
		NodeData::Text { contents } => Some(Node::text(contents.borrow().to_string())),
		NodeData::Element { name, attrs, .. } => {
			let node = Node::element(&name.local);
			for attr in attrs.borrow().iter() {
				node.set_attribute(&attr.name.local, attr.value.to_string());
			}
			for child in handle.children.borrow().iter() {
				if let Some(converted) = convert(child) {
					node.append_child(&converted);
				}
			}
			Some(node)
		}
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_parse_nested_fragment() {
		let nodes = parse_fragment(r#"<div class="card"><span data-id="7">Hi</span></div>"#);

		assert_eq!(nodes.len(), 1);
		assert_eq!(
			nodes[0].outer_html(),
			r#"<div class="card"><span data-id="7">Hi</span></div>"#
		);
	}

	#[rstest]
	fn test_parse_multiple_roots_and_text() {
		let nodes = parse_fragment("<p>a</p> tail <p>b</p>");

		assert_eq!(nodes.len(), 3);
		assert!(nodes[1].is_text());
		assert_eq!(nodes[2].text_content(), "b");
	}

	#[rstest]
	fn test_whitespace_between_elements_is_kept() {
		let nodes = parse_fragment("<span>Ada</span> <span>Lovelace</span>");

		assert_eq!(nodes.len(), 3);
		let text: String = nodes.iter().map(Node::text_content).collect();
		assert_eq!(text, "Ada Lovelace");
	}

	#[rstest]
	#[case("tbody", 2)]
	#[case("table", 2)]
	#[case("div", 0)]
	fn test_table_rows_depend_on_context(#[case] context: &str, #[case] rows: usize) {
		let holder = Node::element("section");
		holder.replace_children(parse_fragment_in(
			"<tr><td>a</td></tr><tr><td>b</td></tr>",
			context,
		));

		assert_eq!(holder.query_selector_all("tr").len(), rows);
		assert_eq!(holder.text_content(), "ab");
	}

	#[rstest]
	fn test_rows_under_tbody_keep_their_markup() {
		let nodes = parse_fragment_in("<tr><td>a</td></tr><tr><td>b</td></tr>", "tbody");

		let html: String = nodes.iter().map(Node::outer_html).collect();
		assert_eq!(html, "<tr><td>a</td></tr><tr><td>b</td></tr>");
	}

	#[rstest]
	fn test_parse_empty() {
		assert!(parse_fragment("").is_empty());
	}

	#[rstest]
	fn test_comments_are_dropped() {
		let nodes = parse_fragment("<!-- note --><p>x</p>");

		assert_eq!(nodes.len(), 1);
		assert_eq!(nodes[0].tag_name(), Some("p"));
	}
}
