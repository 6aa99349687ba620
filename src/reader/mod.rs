//! Markup Reader Module
//!
//! Zero-copy pull reader that feeds the document builder:
//! - SliceReader: parses a borrowed `&str`
//! - Events: event types produced by the reader

pub mod events;
pub mod slice;

pub use events::{Attribute, EndElement, StartElement, XmlEvent};
pub use slice::{parse_events, SliceReader};
