//! Host-agnostic DOM model.
//!
//! Views render into this tree rather than into a browser binding directly.
//! It covers what the framework needs from a document: elements with
//! attributes, text, parent links, focus, scroll offsets, form values,
//! bubbling events with async listeners, and simple selector queries.

mod document;
mod event;
mod node;
mod parse;
mod selector;

pub use document::Document;
pub use event::Event;
pub use node::{Ancestors, Listener, ListenerId, Node};
pub use parse::{parse_fragment, parse_fragment_in};
pub use selector::{Selector, SelectorError};
