//! Cross-artifact references.
//!
//! The [`ReferenceRegistry`] lives for one generation run and is filled
//! during the preparation pass. Each artifact rendered in the generation
//! pass gets its own [`SnippetContext`] borrowing that registry.

mod registry;
mod snippet;

pub use registry::{ReferenceEntry, ReferenceRegistry};
pub use snippet::SnippetContext;
