//! Template sources and the shared external-template store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use mojo_pages_template::Template;
use serde_json::Value;

use crate::error::TemplateResolutionError;

/// Builds template text from the view's current data.
pub type TemplateFn = Rc<dyn Fn(&Value) -> String>;

/// Where a view's markup comes from.
///
/// Whatever the source, the text goes through the template engine with the
/// view's data before it is parsed into nodes.
#[derive(Clone, Default)]
pub enum TemplateSource {
	/// No markup; the view renders an empty root.
	#[default]
	Empty,
	/// Template text held in memory.
	Inline(Rc<str>),
	/// Template text produced on each render.
	Function(TemplateFn),
	/// Template fetched once through the [`TemplateLoader`] and cached.
	External(String),
}

impl TemplateSource {
	/// Inline template text.
	pub fn inline(source: impl Into<String>) -> Self {
		Self::Inline(Rc::from(source.into()))
	}

	/// Template text computed from the data on each render.
	pub fn function(build: impl Fn(&Value) -> String + 'static) -> Self {
		Self::Function(Rc::new(build))
	}

	/// Template loaded from `url`.
	pub fn external(url: impl Into<String>) -> Self {
		Self::External(url.into())
	}
}

impl fmt::Debug for TemplateSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("Empty"),
			Self::Inline(source) => f.debug_tuple("Inline").field(&source.len()).finish(),
			Self::Function(_) => f.write_str("Function"),
			Self::External(url) => f.debug_tuple("External").field(url).finish(),
		}
	}
}

/// Fetches external template text.
///
/// The transport (HTTP, bundled assets, ...) belongs to the host.
#[async_trait(?Send)]
pub trait TemplateLoader {
	/// Returns the template text stored at `url`.
	async fn load(&self, url: &str) -> anyhow::Result<String>;
}

type Fetch = Shared<LocalBoxFuture<'static, Result<Rc<Template>, TemplateResolutionError>>>;

/// Cache of compiled external templates, shared by every view of an
/// application.
///
/// Concurrent requests for the same URL await a single fetch. A failed fetch
/// is evicted so the next render tries again.
pub struct TemplateStore {
	loader: Option<Rc<dyn TemplateLoader>>,
	entries: RefCell<HashMap<String, (u64, Fetch)>>,
	next_generation: Cell<u64>,
}

impl fmt::Debug for TemplateStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TemplateStore")
			.field("has_loader", &self.loader.is_some())
			.field("entries", &self.entries.borrow().len())
			.finish()
	}
}

impl TemplateStore {
	/// Creates a store around an optional loader.
	pub fn new(loader: Option<Rc<dyn TemplateLoader>>) -> Self {
		Self {
			loader,
			entries: RefCell::new(HashMap::new()),
			next_generation: Cell::new(0),
		}
	}

	/// Returns the compiled template for `url`, fetching it on first use.
	///
	/// # Errors
	///
	/// [`TemplateResolutionError::NoLoader`] without a loader,
	/// [`TemplateResolutionError::Fetch`] when the loader fails and
	/// [`TemplateResolutionError::Template`] when the text does not compile.
	pub async fn resolve(&self, url: &str) -> Result<Rc<Template>, TemplateResolutionError> {
		let existing = self.entries.borrow().get(url).cloned();
		let (generation, fetch) = match existing {
			Some(entry) => entry,
			None => self.start_fetch(url)?,
		};

		let result = fetch.await;
		if result.is_err() {
			let mut entries = self.entries.borrow_mut();
			if entries.get(url).is_some_and(|(g, _)| *g == generation) {
				entries.remove(url);
				tracing::debug!(url, "evicted failed template fetch");
			}
		}
		result
	}

	fn start_fetch(&self, url: &str) -> Result<(u64, Fetch), TemplateResolutionError> {
		let Some(loader) = self.loader.clone() else {
			return Err(TemplateResolutionError::NoLoader(url.to_string()));
		};

		let owned = url.to_string();
		let fetch = async move {
			tracing::debug!(url = %owned, "fetching template");
			let source = loader
				.load(&owned)
				.await
				.map_err(|err| TemplateResolutionError::Fetch {
					url: owned.clone(),
					reason: format!("{err:#}"),
				})?;
			Ok::<_, TemplateResolutionError>(Rc::new(Template::parse(&source)?))
		}
		.boxed_local()
		.shared();

		let generation = self.next_generation.get() + 1;
		self.next_generation.set(generation);
		self.entries
			.borrow_mut()
			.insert(url.to_string(), (generation, fetch.clone()));
		Ok((generation, fetch))
	}

	/// Returns `true` if `url` has a pending or completed fetch.
	pub fn contains(&self, url: &str) -> bool {
		self.entries.borrow().contains_key(url)
	}

	/// Drops the cached entry for `url`.
	pub fn invalidate(&self, url: &str) {
		self.entries.borrow_mut().remove(url);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	struct CountingLoader {
		calls: Rc<Cell<usize>>,
		fail_first: Cell<bool>,
	}

	#[async_trait(?Send)]
	impl TemplateLoader for CountingLoader {
		async fn load(&self, url: &str) -> anyhow::Result<String> {
			self.calls.set(self.calls.get() + 1);
			tokio::task::yield_now().await;
			if self.fail_first.replace(false) {
				anyhow::bail!("connection reset");
			}
			Ok(format!("<p>{url}: {{{{name}}}}</p>"))
		}
	}

	fn store(fail_first: bool) -> (TemplateStore, Rc<Cell<usize>>) {
		let calls = Rc::new(Cell::new(0));
		let loader = CountingLoader {
			calls: Rc::clone(&calls),
			fail_first: Cell::new(fail_first),
		};
		(TemplateStore::new(Some(Rc::new(loader))), calls)
	}

	#[rstest]
	#[tokio::test]
	async fn test_concurrent_requests_share_one_fetch() {
		// Arrange
		let (store, calls) = store(false);

		// Act
		let (a, b) = futures::join!(store.resolve("card.html"), store.resolve("card.html"));
		let c = store.resolve("card.html").await;

		// Assert
		assert_eq!(calls.get(), 1);
		assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
		assert_eq!(
			c.unwrap().render(&json!({"name": "x"})).unwrap(),
			"<p>card.html: x</p>"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_fetch_is_evicted() {
		let (store, calls) = store(true);

		let first = store.resolve("card.html").await;
		assert!(matches!(first, Err(TemplateResolutionError::Fetch { .. })));
		assert!(!store.contains("card.html"));

		let second = store.resolve("card.html").await;
		assert!(second.is_ok());
		assert_eq!(calls.get(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_loader() {
		let store = TemplateStore::new(None);
		assert!(matches!(
			store.resolve("x.html").await,
			Err(TemplateResolutionError::NoLoader(url)) if url == "x.html"
		));
	}
}
