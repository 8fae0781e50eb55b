//! Route pattern compilation.
//!
//! Patterns are `/`-separated segments. A segment is literal text, a
//! parameter, or a mix of both:
//!
//! - `:name` captures up to the next non-identifier character
//! - `{name}` captures a parameter anywhere in a segment
//! - a trailing `?` on a segment makes it and its leading `/` optional
//!
//! Each parameter matches exactly one non-empty segment part (never `/`).
//! Literal text is regex-escaped. A trailing `/` on the address is accepted.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::Params;
use crate::error::RouterError;

/// Maximum accepted pattern length in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum number of segments in a pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Compiled regex size limit in bytes.
const MAX_REGEX_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
	Literal(String),
	Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
	parts: Vec<Part>,
	optional: bool,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
	pattern: String,
	regex: Regex,
	param_names: Vec<String>,
	segments: Vec<Segment>,
}

fn is_ident_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn invalid(pattern: &str, reason: impl Into<String>) -> RouterError {
	RouterError::InvalidPattern {
		pattern: pattern.to_string(),
		reason: reason.into(),
	}
}

impl RoutePattern {
	/// Compiles a pattern.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidPattern`] for overly long patterns,
	/// unterminated or empty parameter names, duplicate parameters, empty
	/// optional segments, and patterns that do not start with `/`.
	pub fn new(pattern: &str) -> Result<Self, RouterError> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(invalid(
				pattern,
				format!("longer than {MAX_PATTERN_LENGTH} bytes"),
			));
		}
		if !pattern.starts_with('/') {
			return Err(invalid(pattern, "must start with '/'"));
		}

		let raw_segments: Vec<&str> = pattern[1..]
			.split('/')
			.filter(|segment| !segment.is_empty())
			.collect();
		if raw_segments.len() > MAX_PATH_SEGMENTS {
			return Err(invalid(
				pattern,
				format!("more than {MAX_PATH_SEGMENTS} segments"),
			));
		}

		let mut segments = Vec::with_capacity(raw_segments.len());
		let mut param_names: Vec<String> = Vec::new();
		for raw in raw_segments {
			let segment = Self::parse_segment(pattern, raw)?;
			for part in &segment.parts {
				if let Part::Param(name) = part {
					if param_names.contains(name) {
						return Err(invalid(pattern, format!("duplicate parameter '{name}'")));
					}
					param_names.push(name.clone());
				}
			}
			segments.push(segment);
		}

		let regex = RegexBuilder::new(&Self::compile(&segments))
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| invalid(pattern, e.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			param_names,
			segments,
		})
	}

	fn parse_segment(pattern: &str, raw: &str) -> Result<Segment, RouterError> {
		let (body, optional) = match raw.strip_suffix('?') {
			Some(body) => (body, true),
			None => (raw, false),
		};
		if body.is_empty() {
			return Err(invalid(pattern, "optional marker without a segment"));
		}

		let mut parts = Vec::new();
		let mut literal = String::new();
		let mut chars = body.chars().peekable();
		while let Some(c) = chars.next() {
			match c {
				'{' => {
					let mut name = String::new();
					let mut closed = false;
					for next in chars.by_ref() {
						if next == '}' {
							closed = true;
							break;
						}
						name.push(next);
					}
					if !closed {
						return Err(invalid(pattern, "unterminated '{' parameter"));
					}
					if name.is_empty() || !name.chars().all(is_ident_char) {
						return Err(invalid(pattern, format!("invalid parameter name '{name}'")));
					}
					if !literal.is_empty() {
						parts.push(Part::Literal(std::mem::take(&mut literal)));
					}
					parts.push(Part::Param(name));
				}
				':' if chars.peek().is_some_and(|next| is_ident_char(*next)) => {
					let mut name = String::new();
					while let Some(next) = chars.peek().copied() {
						if !is_ident_char(next) {
							break;
						}
						name.push(next);
						chars.next();
					}
					if !literal.is_empty() {
						parts.push(Part::Literal(std::mem::take(&mut literal)));
					}
					parts.push(Part::Param(name));
				}
				_ => literal.push(c),
			}
		}
		if !literal.is_empty() {
			parts.push(Part::Literal(literal));
		}

		Ok(Segment { parts, optional })
	}

	fn compile(segments: &[Segment]) -> String {
		let mut source = String::from("^");
		for segment in segments {
			let mut body = String::from("/");
			for part in &segment.parts {
				match part {
					Part::Literal(text) => body.push_str(&regex::escape(text)),
					Part::Param(_) => body.push_str("([^/]+)"),
				}
			}
			if segment.optional {
				source.push_str("(?:");
				source.push_str(&body);
				source.push_str(")?");
			} else {
				source.push_str(&body);
			}
		}
		source.push_str("/?$");
		source
	}

	/// Returns the pattern as written.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns `true` if the pattern has no parameters.
	pub fn is_static(&self) -> bool {
		self.param_names.is_empty()
	}

	/// Matches a path and returns its URL-decoded parameters.
	///
	/// Parameters of an absent optional segment are omitted.
	pub fn matches(&self, path: &str) -> Option<Params> {
		let captures = self.regex.captures(path)?;
		let mut params = Params::new();
		for (index, name) in self.param_names.iter().enumerate() {
			if let Some(value) = captures.get(index + 1) {
				let decoded = urlencoding::decode(value.as_str())
					.map(|decoded| decoded.into_owned())
					.unwrap_or_else(|_| value.as_str().to_string());
				params.insert(name.clone(), decoded);
			}
		}
		Some(params)
	}

	/// Returns `true` if `path` matches.
	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Builds a path from parameters, URL-encoding their values.
	///
	/// An optional segment is emitted only when all of its parameters are
	/// present. Returns the name of the first missing required parameter on
	/// failure.
	pub fn reverse(&self, params: &Params) -> Result<String, String> {
		let mut path = String::new();
		for segment in &self.segments {
			let mut body = String::from("/");
			let mut missing = None;
			for part in &segment.parts {
				match part {
					Part::Literal(text) => body.push_str(text),
					Part::Param(name) => match params.get(name) {
						Some(value) => body.push_str(&urlencoding::encode(value)),
						None => {
							missing = Some(name);
							break;
						}
					},
				}
			}
			match missing {
				None => path.push_str(&body),
				Some(_) if segment.optional => {}
				Some(name) => return Err(name.clone()),
			}
		}
		if path.is_empty() {
			path.push('/');
		}
		Ok(path)
	}
}

impl PartialEq for RoutePattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for RoutePattern {}

impl fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn params(pairs: &[(&str, &str)]) -> Params {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	#[case("/users/:id", "/users/42", Some(params(&[("id", "42")])))]
	#[case("/users/:id", "/users/42/", Some(params(&[("id", "42")])))]
	#[case("/users/:id", "/users/42/extra", None)]
	#[case("/users/:id", "/users", None)]
	#[case("/users/{id}", "/users/abc", Some(params(&[("id", "abc")])))]
	#[case(
		"/users/:user_id/posts/{post_id}",
		"/users/7/posts/9",
		Some(params(&[("user_id", "7"), ("post_id", "9")]))
	)]
	#[case("/files/:name.:ext", "/files/report.pdf", Some(params(&[("name", "report"), ("ext", "pdf")])))]
	#[case("/", "/", Some(params(&[])))]
	#[case("/", "/anything", None)]
	fn test_matches(#[case] pattern: &str, #[case] path: &str, #[case] expected: Option<Params>) {
		let pattern = RoutePattern::new(pattern).unwrap();
		assert_eq!(pattern.matches(path), expected);
	}

	#[rstest]
	#[case("/users/:id?", "/users", Some(params(&[])))]
	#[case("/users/:id?", "/users/5", Some(params(&[("id", "5")])))]
	#[case("/users/:id?", "/users/", Some(params(&[])))]
	#[case("/docs/:section?/:page?", "/docs/intro", Some(params(&[("section", "intro")])))]
	#[case("/docs/:section?/:page?", "/docs/intro/setup", Some(params(&[("section", "intro"), ("page", "setup")])))]
	fn test_optional_segments(
		#[case] pattern: &str,
		#[case] path: &str,
		#[case] expected: Option<Params>,
	) {
		let pattern = RoutePattern::new(pattern).unwrap();
		assert_eq!(pattern.matches(path), expected);
	}

	#[rstest]
	fn test_params_are_url_decoded() {
		let pattern = RoutePattern::new("/search/:term").unwrap();

		let params = pattern.matches("/search/hello%20world%2Fx").unwrap();

		assert_eq!(params["term"], "hello world/x");
	}

	#[rstest]
	#[case("/price/$5.00", "/price/$5.00", true)]
	#[case("/price/$5.00", "/price/$5x00", false)]
	#[case("/a+b", "/a+b", true)]
	#[case("/a+b", "/aab", false)]
	fn test_literals_are_escaped(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
		assert_eq!(RoutePattern::new(pattern).unwrap().is_match(path), expected);
	}

	#[rstest]
	#[case("users/:id")]
	#[case("/users/{id")]
	#[case("/users/{}")]
	#[case("/users/{a-b}")]
	#[case("/:id/:id")]
	#[case("/users/?")]
	fn test_invalid_patterns(#[case] pattern: &str) {
		assert!(matches!(
			RoutePattern::new(pattern),
			Err(RouterError::InvalidPattern { .. })
		));
	}

	#[rstest]
	fn test_pattern_length_limit() {
		let pattern = format!("/{}", "a".repeat(MAX_PATTERN_LENGTH));
		assert!(RoutePattern::new(&pattern).is_err());
	}

	#[rstest]
	fn test_reverse() {
		let pattern = RoutePattern::new("/users/:id/tab/{tab}?").unwrap();

		assert_eq!(
			pattern.reverse(&params(&[("id", "a b"), ("tab", "posts")])),
			Ok("/users/a%20b/tab/posts".to_string())
		);
		assert_eq!(
			pattern.reverse(&params(&[("id", "1")])),
			Ok("/users/1/tab".to_string())
		);
		assert_eq!(pattern.reverse(&params(&[])), Err("id".to_string()));
	}

	#[rstest]
	fn test_reverse_root() {
		let pattern = RoutePattern::new("/").unwrap();
		assert_eq!(pattern.reverse(&Params::new()), Ok("/".to_string()));
	}
}
