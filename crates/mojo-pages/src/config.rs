//! Application configuration.
//!
//! Every field has a default, so a configuration file only needs to name what
//! it changes:
//!
//! ```
//! use mojo_pages::config::{AppConfig, RouterMode};
//!
//! let config = AppConfig::from_toml_str(r##"
//! root_selector = "#shell"
//! router_mode = "history"
//! base_path = "/app"
//! not_found_page = "missing"
//! "##).unwrap();
//!
//! assert_eq!(config.router_mode, RouterMode::History);
//! assert_eq!(config.default_route, "/");
//! ```

use serde::{Deserialize, Serialize};

use crate::dom::Selector;
use crate::error::ConfigError;

/// How the current route is stored in the address bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterMode {
	/// `/#/users/42?tab=posts`
	#[default]
	Hash,
	/// `/users/42?tab=posts`; the host must serve the entry point for every path.
	History,
	/// `/?page=/users/42&tab=posts`
	Query,
}

/// Binds a DOM event type to the attribute naming the action to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedEvent {
	/// Event type, e.g. `click`.
	pub event: String,
	/// Attribute holding the action name, e.g. `data-action`.
	pub attribute: String,
}

impl DelegatedEvent {
	/// Creates a binding.
	pub fn new(event: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self {
			event: event.into(),
			attribute: attribute.into(),
		}
	}
}

fn default_delegated_events() -> Vec<DelegatedEvent> {
	vec![
		DelegatedEvent::new("click", "data-action"),
		DelegatedEvent::new("submit", "data-action"),
		DelegatedEvent::new("change", "data-change-action"),
		DelegatedEvent::new("input", "data-input-action"),
	]
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
	/// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
	/// `mojo_pages=debug`.
	#[serde(default = "default_log_level")]
	pub level: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: default_log_level(),
		}
	}
}

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
	/// Selector of the element the application renders into.
	#[serde(default = "default_root_selector")]
	pub root_selector: String,

	/// Selector, relative to the root, of the region pages are swapped into.
	/// The root itself is used when unset.
	#[serde(default)]
	pub page_container: Option<String>,

	/// Addressing mode.
	#[serde(default)]
	pub router_mode: RouterMode,

	/// Path prefix stripped from addresses in history mode.
	#[serde(default = "default_base_path")]
	pub base_path: String,

	/// Query parameter carrying the route in query mode.
	#[serde(default = "default_query_param")]
	pub query_param: String,

	/// Route shown when the address is empty.
	#[serde(default = "default_route")]
	pub default_route: String,

	/// Page shown when no route matches.
	#[serde(default)]
	pub not_found_page: Option<String>,

	/// Page shown when a route guard rejects a navigation.
	#[serde(default)]
	pub denied_page: Option<String>,

	/// Event types delegated at each view root.
	#[serde(default = "default_delegated_events")]
	pub delegated_events: Vec<DelegatedEvent>,

	/// Logging configuration.
	#[serde(default)]
	pub logging: LoggingConfig,
}

fn default_root_selector() -> String {
	"#app".to_string()
}

fn default_base_path() -> String {
	"/".to_string()
}

fn default_query_param() -> String {
	"page".to_string()
}

fn default_route() -> String {
	"/".to_string()
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			root_selector: default_root_selector(),
			page_container: None,
			router_mode: RouterMode::default(),
			base_path: default_base_path(),
			query_param: default_query_param(),
			default_route: default_route(),
			not_found_page: None,
			denied_page: None,
			delegated_events: default_delegated_events(),
			logging: LoggingConfig::default(),
		}
	}
}

impl AppConfig {
	/// Parses and validates a TOML document.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::Parse`] for malformed TOML and
	/// [`ConfigError::Invalid`] when [`validate`](Self::validate) fails.
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the values deserialization cannot check.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if let Err(err) = Selector::parse(&self.root_selector) {
			return Err(ConfigError::Invalid {
				field: "root_selector",
				reason: err.to_string(),
			});
		}

		if let Some(container) = &self.page_container
			&& let Err(err) = Selector::parse(container)
		{
			return Err(ConfigError::Invalid {
				field: "page_container",
				reason: err.to_string(),
			});
		}

		if !self.base_path.starts_with('/') {
			return Err(ConfigError::Invalid {
				field: "base_path",
				reason: format!("'{}' must start with '/'", self.base_path),
			});
		}

		if !self.default_route.starts_with('/') {
			return Err(ConfigError::Invalid {
				field: "default_route",
				reason: format!("'{}' must start with '/'", self.default_route),
			});
		}

		if self.query_param.is_empty() {
			return Err(ConfigError::Invalid {
				field: "query_param",
				reason: "must not be empty".to_string(),
			});
		}

		for binding in &self.delegated_events {
			if binding.event.is_empty() {
				return Err(ConfigError::Invalid {
					field: "delegated_events",
					reason: "event type must not be empty".to_string(),
				});
			}
			if !binding.attribute.starts_with("data-") {
				return Err(ConfigError::Invalid {
					field: "delegated_events",
					reason: format!(
						"attribute '{}' for '{}' must be a data-* attribute",
						binding.attribute, binding.event
					),
				});
			}
		}

		Ok(())
	}

	/// Returns the delegated event types, each with every attribute bound to
	/// it, in configuration order.
	pub fn delegated_event_groups(&self) -> Vec<(String, Vec<String>)> {
		let mut groups: Vec<(String, Vec<String>)> = Vec::new();
		for binding in &self.delegated_events {
			match groups.iter_mut().find(|(event, _)| *event == binding.event) {
				Some((_, attributes)) => {
					if !attributes.contains(&binding.attribute) {
						attributes.push(binding.attribute.clone());
					}
				}
				None => groups.push((binding.event.clone(), vec![binding.attribute.clone()])),
			}
		}
		groups
	}

	/// Returns every attribute that names an action.
	pub fn action_attributes(&self) -> Vec<String> {
		let mut attributes: Vec<String> = Vec::new();
		for binding in &self.delegated_events {
			if !attributes.contains(&binding.attribute) {
				attributes.push(binding.attribute.clone());
			}
		}
		attributes
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let config = AppConfig::default();

		assert_eq!(config.root_selector, "#app");
		assert_eq!(config.router_mode, RouterMode::Hash);
		assert_eq!(config.query_param, "page");
		assert!(config.validate().is_ok());
	}

	#[rstest]
	fn test_empty_document_yields_defaults() {
		let config = AppConfig::from_toml_str("").unwrap();
		assert_eq!(config, AppConfig::default());
	}

	#[rstest]
	fn test_nested_sections() {
		let config = AppConfig::from_toml_str(
			r#"
router_mode = "query"
query_param = "view"
denied_page = "login"

[logging]
level = "mojo_pages=debug"

[[delegated_events]]
event = "click"
attribute = "data-action"

[[delegated_events]]
event = "keyup"
attribute = "data-key-action"
"#,
		)
		.unwrap();

		assert_eq!(config.router_mode, RouterMode::Query);
		assert_eq!(config.denied_page.as_deref(), Some("login"));
		assert_eq!(config.logging.level, "mojo_pages=debug");
		assert_eq!(config.delegated_events.len(), 2);
	}

	#[rstest]
	#[case("base_path = \"app\"", "base_path")]
	#[case("default_route = \"home\"", "default_route")]
	#[case("query_param = \"\"", "query_param")]
	#[case("root_selector = \"div >\"", "root_selector")]
	#[case("page_container = \"a:hover\"", "page_container")]
	#[case(
		"[[delegated_events]]\nevent = \"click\"\nattribute = \"onclick\"",
		"delegated_events"
	)]
	fn test_invalid_values(#[case] source: &str, #[case] expected_field: &str) {
		match AppConfig::from_toml_str(source) {
			Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
			other => panic!("expected invalid `{expected_field}`, got {other:?}"),
		}
	}

	#[rstest]
	fn test_malformed_toml() {
		assert!(matches!(
			AppConfig::from_toml_str("router_mode = "),
			Err(ConfigError::Parse(_))
		));
	}

	#[rstest]
	fn test_event_groups_merge_attributes() {
		let config = AppConfig {
			delegated_events: vec![
				DelegatedEvent::new("click", "data-action"),
				DelegatedEvent::new("click", "data-toggle"),
				DelegatedEvent::new("submit", "data-action"),
			],
			..AppConfig::default()
		};

		assert_eq!(
			config.delegated_event_groups(),
			vec![
				(
					"click".to_string(),
					vec!["data-action".to_string(), "data-toggle".to_string()]
				),
				("submit".to_string(), vec!["data-action".to_string()]),
			]
		);
		assert_eq!(config.action_attributes(), vec!["data-action", "data-toggle"]);
	}
}
