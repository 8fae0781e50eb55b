//! Logging setup.
//!
//! The framework logs through `tracing`; installing a subscriber is left to the
//! application. With the `subscriber` feature, [`init`] installs one suited to
//! the target:
//!
//! | Target | Subscriber | Filter |
//! |--------|------------|--------|
//! | native | `tracing-subscriber` fmt | `RUST_LOG`, else [`LoggingConfig::level`] |
//! | wasm32 | `tracing-wasm` (browser console) | max level from [`LoggingConfig::level`] |
//!
//! Field names used across the crate: `view_id`, `page`, `hook`, `action`,
//! `address`.

use crate::config::LoggingConfig;

/// Installs the global subscriber.
///
/// Returns `true` if this call installed it. Later calls, and calls made after
/// another subscriber was installed, leave the existing one in place and
/// return `false`.
#[cfg(all(feature = "subscriber", not(target_arch = "wasm32")))]
pub fn init(config: &LoggingConfig) -> bool {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.level))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init()
		.is_ok()
}

/// Installs the global subscriber.
///
/// Returns `true` if this call installed it. Later calls leave the existing
/// subscriber in place and return `false`.
#[cfg(all(feature = "subscriber", target_arch = "wasm32"))]
pub fn init(config: &LoggingConfig) -> bool {
	use std::sync::atomic::{AtomicBool, Ordering};

	static INSTALLED: AtomicBool = AtomicBool::new(false);

	if INSTALLED.swap(true, Ordering::SeqCst) {
		return false;
	}

	let wasm_config = tracing_wasm::WASMLayerConfigBuilder::new()
		.set_max_level(max_level(&config.level))
		.build();
	tracing_wasm::set_as_global_default_with_config(wasm_config);
	true
}

/// Without the `subscriber` feature there is nothing to install.
#[cfg(not(feature = "subscriber"))]
pub fn init(config: &LoggingConfig) -> bool {
	tracing::debug!(
		level = %config.level,
		"subscriber feature disabled; leaving subscriber installation to the application"
	);
	false
}

/// Extracts the most verbose level named in a filter directive list.
///
/// Module-scoped directives such as `mojo_pages=debug` count by their level;
/// unknown tokens are ignored. Falls back to `INFO`.
#[cfg_attr(not(all(feature = "subscriber", target_arch = "wasm32")), allow(dead_code))]
pub(crate) fn max_level(directives: &str) -> tracing::Level {
	directives
		.split(',')
		.filter_map(|directive| {
			let level = directive.rsplit('=').next()?.trim();
			level.parse::<tracing::Level>().ok()
		})
		.max()
		.unwrap_or(tracing::Level::INFO)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tracing::Level;

	#[rstest]
	#[case("info", Level::INFO)]
	#[case("warn", Level::WARN)]
	#[case("mojo_pages=debug", Level::DEBUG)]
	#[case("warn,mojo_pages::router=trace", Level::TRACE)]
	#[case("nonsense", Level::INFO)]
	#[case("", Level::INFO)]
	fn test_max_level(#[case] directives: &str, #[case] expected: Level) {
		assert_eq!(max_level(directives), expected);
	}
}
