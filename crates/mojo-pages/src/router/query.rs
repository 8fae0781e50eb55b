//! Query-string parsing and serialization.

use super::Query;

fn decode(component: &str) -> String {
	let spaced = component.replace('+', " ");
	urlencoding::decode(&spaced)
		.map(|decoded| decoded.into_owned())
		.unwrap_or(spaced)
}

/// Parses a query string, with or without the leading `?`.
///
/// Keys and values are URL-decoded and `+` reads as a space. A key without
/// `=` maps to an empty value. When a key repeats, the last value wins.
pub fn parse_query(input: &str) -> Query {
	let input = input.strip_prefix('?').unwrap_or(input);
	input
		.split('&')
		.filter(|pair| !pair.is_empty())
		.map(|pair| match pair.split_once('=') {
			Some((key, value)) => (decode(key), decode(value)),
			None => (decode(pair), String::new()),
		})
		.collect()
}

/// Serializes a query map without the leading `?`.
///
/// Keys come out in sorted order and both keys and values are URL-encoded, so
/// `parse_query(&serialize_query(&q)) == q`.
pub fn serialize_query(query: &Query) -> String {
	query
		.iter()
		.map(|(key, value)| {
			format!(
				"{}={}",
				urlencoding::encode(key),
				urlencoding::encode(value)
			)
		})
		.collect::<Vec<_>>()
		.join("&")
}

/// Splits an address into its path and parsed query.
///
/// Any `#fragment` is dropped. An empty path reads as `/`.
pub fn split_address(address: &str) -> (String, Query) {
	let address = address.split('#').next().unwrap_or_default();
	let (path, query) = match address.split_once('?') {
		Some((path, query)) => (path, parse_query(query)),
		None => (address, Query::new()),
	};
	(normalize_path(path), query)
}

/// Ensures a leading `/`.
pub(crate) fn normalize_path(path: &str) -> String {
	let path = path.trim();
	if path.starts_with('/') {
		path.to_string()
	} else {
		format!("/{path}")
	}
}
