//! Ranges
//!
//! A range is a named grouping of products that conditions and benefits
//! are evaluated against.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::{
    products::{Product, ProductKey},
    tags::{collection::TagCollection, string::StringTagCollection},
};

/// Named product range
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    name: String,
    includes_all_products: bool,
    included: FxHashSet<ProductKey>,
    excluded: FxHashSet<ProductKey>,
    tags: StringTagCollection,
}

impl Range {
    /// Create an empty range.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            includes_all_products: false,
            included: FxHashSet::default(),
            excluded: FxHashSet::default(),
            tags: StringTagCollection::empty(),
        }
    }

    /// Create a range that includes every product not explicitly excluded.
    pub fn all_products(name: impl Into<String>) -> Self {
        Self {
            includes_all_products: true,
            ..Self::new(name)
        }
    }

    /// Match any product carrying one of these tags.
    #[must_use]
    pub fn with_tags(mut self, tags: StringTagCollection) -> Self {
        self.tags = tags;
        self
    }

    /// Range name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the range includes all products.
    pub fn includes_all_products(&self) -> bool {
        self.includes_all_products
    }

    /// Explicitly include a product.
    pub fn add_product(&mut self, product: ProductKey) {
        self.excluded.remove(&product);
        self.included.insert(product);
    }

    /// Explicitly exclude a product.
    pub fn remove_product(&mut self, product: ProductKey) {
        self.included.remove(&product);
        self.excluded.insert(product);
    }

    /// Check whether a product with the given key and tags is in the range.
    pub fn contains(&self, product: ProductKey, tags: &StringTagCollection) -> bool {
        if self.excluded.contains(&product) {
            return false;
        }

        self.includes_all_products || self.included.contains(&product) || self.tags.intersects(tags)
    }

    /// Check whether a catalogue product is in the range.
    pub fn contains_product(&self, product: &Product<'_>) -> bool {
        self.contains(product.key, &product.tags)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::GBP};

    use crate::products::Catalogue;

    use super::*;

    #[test]
    fn all_products_matches_everything_except_exclusions() {
        let mut catalogue = Catalogue::new();
        let kept = catalogue.insert("Kept", Money::from_minor(100, GBP));
        let dropped = catalogue.insert("Dropped", Money::from_minor(100, GBP));

        let mut range = Range::all_products("All products");
        range.remove_product(dropped);

        assert!(range.contains(kept, &StringTagCollection::empty()));
        assert!(!range.contains(dropped, &StringTagCollection::empty()));
    }

    #[test]
    fn explicit_products_and_tags_match() {
        let mut catalogue = Catalogue::new();
        let listed = catalogue.insert("Listed", Money::from_minor(100, GBP));
        let tagged = catalogue.insert_with(
            "Tagged",
            Money::from_minor(100, GBP),
            StringTagCollection::from_strs(&["books"]),
            None,
        );
        let other = catalogue.insert("Other", Money::from_minor(100, GBP));

        let mut range = Range::new("Reading").with_tags(StringTagCollection::from_strs(&["books"]));
        range.add_product(listed);

        let contains = |key| {
            catalogue
                .get(key)
                .is_some_and(|product| range.contains_product(product))
        };

        assert!(contains(listed));
        assert!(contains(tagged));
        assert!(!contains(other));
    }

    #[test]
    fn add_product_overrides_previous_exclusion() {
        let mut catalogue = Catalogue::new();
        let key = catalogue.insert("Widget", Money::from_minor(100, GBP));

        let mut range = Range::new("Widgets");
        range.remove_product(key);
        range.add_product(key);

        assert!(range.contains(key, &StringTagCollection::empty()));
    }

    #[test]
    fn displays_name() {
        assert_eq!(Range::all_products("All products").to_string(), "All products");
    }
}
