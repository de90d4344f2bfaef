//! String-based Tag Collection

use std::{cmp::Ordering, fmt};

use smallvec::SmallVec;

use crate::tags::collection::TagCollection;

/// Sorted, deduplicated string tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTagCollection {
    tags: SmallVec<[String; 4]>,
}

impl StringTagCollection {
    /// Create a collection from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        let mut tags: SmallVec<[String; 4]> = tags.iter().map(|tag| (*tag).to_string()).collect();

        tags.sort_unstable();
        tags.dedup();

        Self { tags }
    }

    /// Iterate over the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    fn position(&self, tag: &str) -> Result<usize, usize> {
        self.tags.binary_search_by(|probe| probe.as_str().cmp(tag))
    }
}

impl<S: AsRef<str>> FromIterator<S> for StringTagCollection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut collection = Self::empty();

        for tag in iter {
            collection.add(tag.as_ref());
        }

        collection
    }
}

impl TagCollection for StringTagCollection {
    fn empty() -> Self {
        Self {
            tags: SmallVec::new(),
        }
    }

    fn intersects(&self, other: &Self) -> bool {
        // Both sides are sorted, so walk them together.
        let mut left = self.tags.iter().peekable();
        let mut right = other.tags.iter().peekable();

        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            match l.cmp(r) {
                Ordering::Equal => return true,
                Ordering::Less => {
                    left.next();
                }
                Ordering::Greater => {
                    right.next();
                }
            }
        }

        false
    }

    fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_ok()
    }

    fn add(&mut self, tag: &str) {
        if let Err(pos) = self.position(tag) {
            self.tags.insert(pos, tag.to_string());
        }
    }

    fn remove(&mut self, tag: &str) {
        if let Ok(pos) = self.position(tag) {
            self.tags.remove(pos);
        }
    }

    fn len(&self) -> usize {
        self.tags.len()
    }
}

impl fmt::Display for StringTagCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, tag) in self.tags.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }

            f.write_str(tag)?;
        }

        Ok(())
    }
}
