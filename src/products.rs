//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};

use crate::tags::{collection::TagCollection, string::StringTagCollection};

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Catalogue key
    pub key: ProductKey,

    /// Product title
    pub title: String,

    /// Category tags matched by ranges
    pub tags: StringTagCollection,

    /// Base unit price
    pub price: Money<'a, Currency>,

    /// Units in stock, `None` when stock is not tracked
    pub stock: Option<u32>,
}

/// Product catalogue
#[derive(Debug, Default)]
pub struct Catalogue<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
}

impl<'a> Catalogue<'a> {
    /// Create an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an untagged product with untracked stock.
    pub fn insert(&mut self, title: impl Into<String>, price: Money<'a, Currency>) -> ProductKey {
        self.insert_with(title, price, StringTagCollection::empty(), None)
    }

    /// Add a product with tags and an optional stock level.
    pub fn insert_with(
        &mut self,
        title: impl Into<String>,
        price: Money<'a, Currency>,
        tags: StringTagCollection,
        stock: Option<u32>,
    ) -> ProductKey {
        let title = title.into();

        self.products.insert_with_key(|key| Product {
            key,
            title,
            tags,
            price,
            stock,
        })
    }

    /// Get a product by key.
    pub fn get(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Get a product by key, mutably.
    pub fn get_mut(&mut self, key: ProductKey) -> Option<&mut Product<'a>> {
        self.products.get_mut(key)
    }

    /// Iterate over all products.
    pub fn iter(&self) -> impl Iterator<Item = &Product<'a>> {
        self.products.values()
    }

    /// Number of products in the catalogue.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
