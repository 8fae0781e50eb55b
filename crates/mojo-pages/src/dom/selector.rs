//! CSS selector matching over [`Node`]s.
//!
//! Parsing and matching come from the `selectors` crate; this module supplies
//! the selector implementation types and an [`Element`] view of [`Node`].
//! Type, id, class and attribute selectors, combinators, selector lists and
//! the tree-structural pseudo-classes (`:first-child`, `:nth-child()`,
//! `:not()`, ...) are supported. State pseudo-classes such as `:hover` and
//! pseudo-elements are rejected at parse time.

use std::fmt;

use cssparser::ToCss;
use html5ever::{LocalName, Namespace, ns};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{self, ElementSelectorFlags, MatchingContext};
use selectors::parser::{self, ParseRelative, SelectorList, SelectorParseErrorKind};
use selectors::{Element, NthIndexCache, OpaqueElement};
use thiserror::Error;

use super::node::Node;

/// A selector string that did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector '{selector}' at column {column}: {reason}")]
pub struct SelectorError {
	selector: String,
	column: u32,
	reason: String,
}

impl SelectorError {
	/// Returns the selector as written.
	pub fn selector(&self) -> &str {
		&self.selector
	}
}

/// A parsed selector list.
#[derive(Clone)]
pub struct Selector {
	source: String,
	selectors: Vec<parser::Selector<Simple>>,
}

impl fmt::Debug for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Selector").field(&self.source).finish()
	}
}

impl Selector {
	/// Parses a selector list such as `main > .card[data-id]`.
	///
	/// # Errors
	///
	/// Returns [`SelectorError`] for empty input, malformed selectors and
	/// unsupported pseudo-classes.
	pub fn parse(input: &str) -> Result<Self, SelectorError> {
		let mut parser_input = cssparser::ParserInput::new(input);
		let mut css = cssparser::Parser::new(&mut parser_input);
		let list = SelectorList::parse(&SelectorParser, &mut css, ParseRelative::No).map_err(
			|err| SelectorError {
				selector: input.to_string(),
				column: err.location.column,
				reason: format!("{:?}", err.kind),
			},
		)?;
		Ok(Self {
			source: input.to_string(),
			selectors: list.0.into_iter().collect(),
		})
	}

	/// Returns the selector as written.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Returns `true` if `node` is an element matched by any selector in the
	/// list.
	pub fn matches(&self, node: &Node) -> bool {
		if !node.is_element() {
			return false;
		}
		let element = ElementRef(node.clone());
		let mut nth_index_cache = NthIndexCache::default();
		let mut context = MatchingContext::new(
			matching::MatchingMode::Normal,
			None,
			&mut nth_index_cache,
			matching::QuirksMode::NoQuirks,
			matching::NeedsSelectorFlags::No,
			matching::IgnoreNthChildForInvalidation::No,
		);
		self.selectors
			.iter()
			.any(|selector| matching::matches_selector(selector, 0, None, &element, &mut context))
	}
}

struct SelectorParser;

impl<'i> parser::Parser<'i> for SelectorParser {
	type Impl = Simple;
	type Error = SelectorParseErrorKind<'i>;

	fn parse_is_and_where(&self) -> bool {
		true
	}
}

/// Selector implementation types for the in-memory DOM.
#[derive(Debug, Clone, Copy)]
pub struct Simple;

impl parser::SelectorImpl for Simple {
	type ExtraMatchingData<'a> = ();
	type AttrValue = CssString;
	type Identifier = CssLocalName;
	type LocalName = CssLocalName;
	type NamespacePrefix = CssLocalName;
	type NamespaceUrl = Namespace;
	type BorrowedNamespaceUrl = Namespace;
	type BorrowedLocalName = CssLocalName;
	type NonTSPseudoClass = NonTSPseudoClass;
	type PseudoElement = PseudoElement;
}

/// Attribute value in a selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssString(String);

impl<'a> From<&'a str> for CssString {
	fn from(value: &'a str) -> Self {
		Self(value.to_string())
	}
}

impl AsRef<str> for CssString {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl ToCss for CssString {
	fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
		cssparser::serialize_string(&self.0, dest)
	}
}

/// Name, id or class in a selector.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssLocalName(LocalName);

impl<'a> From<&'a str> for CssLocalName {
	fn from(value: &'a str) -> Self {
		Self(LocalName::from(value))
	}
}

impl ToCss for CssLocalName {
	fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
		dest.write_str(&self.0)
	}
}

impl PrecomputedHash for CssLocalName {
	fn precomputed_hash(&self) -> u32 {
		self.0.precomputed_hash()
	}
}

/// State pseudo-classes; none are supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTSPseudoClass {}

impl parser::NonTSPseudoClass for NonTSPseudoClass {
	type Impl = Simple;

	fn is_active_or_hover(&self) -> bool {
		match *self {}
	}

	fn is_user_action_state(&self) -> bool {
		match *self {}
	}
}

impl ToCss for NonTSPseudoClass {
	fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
		match *self {}
	}
}

/// Pseudo-elements; none are supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl parser::PseudoElement for PseudoElement {
	type Impl = Simple;
}

impl ToCss for PseudoElement {
	fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
		match *self {}
	}
}

/// An element node seen through the `selectors` matching API.
#[derive(Debug, Clone)]
struct ElementRef(Node);

impl ElementRef {
	fn wrap(node: Node) -> Option<Self> {
		node.is_element().then_some(Self(node))
	}

	fn siblings(&self) -> Vec<Node> {
		self.0
			.parent()
			.map(|parent| parent.children())
			.unwrap_or_default()
	}

	fn position(&self, siblings: &[Node]) -> Option<usize> {
		siblings.iter().position(|sibling| sibling.ptr_eq(&self.0))
	}

	fn tag(&self) -> &str {
		self.0.tag_name().unwrap_or_default()
	}
}

impl Element for ElementRef {
	type Impl = Simple;

	fn opaque(&self) -> OpaqueElement {
		OpaqueElement::new(&*self.0.0)
	}

	fn parent_element(&self) -> Option<Self> {
		self.0.parent().and_then(Self::wrap)
	}

	fn parent_node_is_shadow_root(&self) -> bool {
		false
	}

	fn containing_shadow_host(&self) -> Option<Self> {
		None
	}

	fn is_pseudo_element(&self) -> bool {
		false
	}

	fn prev_sibling_element(&self) -> Option<Self> {
		let siblings = self.siblings();
		let index = self.position(&siblings)?;
		siblings[..index].iter().rev().cloned().find_map(Self::wrap)
	}

	fn next_sibling_element(&self) -> Option<Self> {
		let siblings = self.siblings();
		let index = self.position(&siblings)?;
		siblings[index + 1..].iter().cloned().find_map(Self::wrap)
	}

	fn first_element_child(&self) -> Option<Self> {
		self.0.children().into_iter().find_map(Self::wrap)
	}

	fn is_html_element_in_html_document(&self) -> bool {
		true
	}

	fn has_local_name(&self, local_name: &CssLocalName) -> bool {
		self.tag() == &*local_name.0
	}

	fn has_namespace(&self, namespace: &Namespace) -> bool {
		*namespace == ns!(html)
	}

	fn is_same_type(&self, other: &Self) -> bool {
		self.tag() == other.tag()
	}

	fn attr_matches(
		&self,
		ns: &NamespaceConstraint<&Namespace>,
		local_name: &CssLocalName,
		operation: &AttrSelectorOperation<&CssString>,
	) -> bool {
		if matches!(ns, NamespaceConstraint::Specific(url) if **url != ns!()) {
			return false;
		}
		self.0
			.attribute(&local_name.0)
			.is_some_and(|value| operation.eval_str(&value))
	}

	fn match_non_ts_pseudo_class(
		&self,
		pc: &NonTSPseudoClass,
		_context: &mut MatchingContext<Self::Impl>,
	) -> bool {
		match *pc {}
	}

	fn match_pseudo_element(
		&self,
		pe: &PseudoElement,
		_context: &mut MatchingContext<Self::Impl>,
	) -> bool {
		match *pe {}
	}

	fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

	fn is_link(&self) -> bool {
		matches!(self.tag(), "a" | "area") && self.0.has_attribute("href")
	}

	fn is_html_slot_element(&self) -> bool {
		self.tag() == "slot"
	}

	fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
		self.0
			.id()
			.is_some_and(|value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
	}

	fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
		self.0.attribute("class").is_some_and(|classes| {
			classes
				.split_ascii_whitespace()
				.any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
		})
	}

	fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
		None
	}

	fn is_part(&self, _name: &CssLocalName) -> bool {
		false
	}

	fn is_empty(&self) -> bool {
		self.0.child_count() == 0
	}

	fn is_root(&self) -> bool {
		self.0
			.parent()
			.is_some_and(|parent| !parent.is_element() && !parent.is_text())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::parse_fragment;
	use rstest::rstest;

	fn sample() -> Node {
		let node = Node::element("div");
		node.set_attribute("id", "app");
		node.set_attribute("class", "shell wide");
		node.set_attribute("data-role", "main");
		node
	}

	#[rstest]
	#[case("div", true)]
	#[case("#app", true)]
	#[case(".wide", true)]
	#[case("[data-role]", true)]
	#[case("[data-role=main]", true)]
	#[case("[data-role=\"main\"]", true)]
	#[case("[data-role^=ma]", true)]
	#[case("div#app.shell[data-role=main]", true)]
	#[case("span, .wide", true)]
	#[case("span", false)]
	#[case("#other", false)]
	#[case(".narrow", false)]
	#[case("[data-role=aside]", false)]
	#[case("div:not(.wide)", false)]
	fn test_matches(#[case] selector: &str, #[case] expected: bool) {
		let selector = Selector::parse(selector).unwrap();
		assert_eq!(selector.matches(&sample()), expected);
	}

	#[rstest]
	#[case("")]
	#[case("#")]
	#[case("div >")]
	#[case("div:hover")]
	#[case("p::before")]
	fn test_parse_errors(#[case] selector: &str) {
		let err = Selector::parse(selector).unwrap_err();

		assert_eq!(err.selector(), selector);
		assert!(err.to_string().starts_with("invalid selector"));
	}

	#[rstest]
	fn test_text_nodes_never_match() {
		let selector = Selector::parse("div").unwrap();
		assert!(!selector.matches(&Node::text("div")));
	}

	#[rstest]
	#[case("ul > li", 3)]
	#[case("section li", 3)]
	#[case("li:first-child", 1)]
	#[case("li:nth-child(2n+1)", 2)]
	#[case("li + li", 2)]
	#[case("li.done ~ li", 2)]
	#[case("section > li", 0)]
	fn test_combinators_and_structural_pseudo_classes(
		#[case] selector: &str,
		#[case] expected: usize,
	) {
		// Arrange
		let root = Node::element("section");
		root.replace_children(parse_fragment(
			r#"<ul><li class="done">a</li><li>b</li><li>c</li></ul>"#,
		));
		let selector = Selector::parse(selector).unwrap();

		// Act
		let matched = root
			.descendants()
			.into_iter()
			.filter(|node| selector.matches(node))
			.count();

		// Assert
		assert_eq!(matched, expected);
	}
}
