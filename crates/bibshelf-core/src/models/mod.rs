//! Data models for bibshelf.

mod document;
mod entry;

pub use document::*;
pub use entry::*;
