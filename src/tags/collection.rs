//! Tag Collection

use std::fmt;

/// A set of category tags that can be tested for overlap with another set.
pub trait TagCollection: Clone + fmt::Debug + PartialEq {
    /// Create an empty collection.
    fn empty() -> Self;

    /// Returns true if the two collections share at least one tag.
    fn intersects(&self, other: &Self) -> bool;

    /// Check if this collection contains a specific tag.
    fn contains(&self, tag: &str) -> bool;

    /// Add a tag to this collection.
    fn add(&mut self, tag: &str);

    /// Remove a tag from this collection.
    fn remove(&mut self, tag: &str);

    /// Number of tags in the collection.
    fn len(&self) -> usize;

    /// Check if this collection is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
