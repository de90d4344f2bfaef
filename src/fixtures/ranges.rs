//! Range Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{fixtures::FixtureError, products::ProductKey, ranges::Range};

/// Range Fixture
#[derive(Debug, Deserialize)]
pub struct RangeFixture {
    /// Range name, shown in upsell messages
    pub name: String,

    /// Whether every product belongs to the range
    #[serde(default)]
    pub includes_all_products: bool,

    /// Product keys explicitly included
    #[serde(default)]
    pub products: Vec<String>,

    /// Product keys explicitly excluded
    #[serde(default)]
    pub excluded: Vec<String>,

    /// Product tags included
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RangeFixture {
    /// Build the range, resolving product keys.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ProductNotFound`] for unknown product keys.
    pub fn into_range(
        self,
        product_keys: &FxHashMap<String, ProductKey>,
    ) -> Result<Range, FixtureError> {
        let mut range = if self.includes_all_products {
            Range::all_products(self.name)
        } else {
            Range::new(self.name)
        }
        .with_tags(self.tags.iter().collect());

        for key in &self.products {
            range.add_product(lookup(product_keys, key)?);
        }

        for key in &self.excluded {
            range.remove_product(lookup(product_keys, key)?);
        }

        Ok(range)
    }
}

fn lookup(
    product_keys: &FxHashMap<String, ProductKey>,
    key: &str,
) -> Result<ProductKey, FixtureError> {
    product_keys
        .get(key)
        .copied()
        .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::tags::string::StringTagCollection;

    use super::*;

    #[test]
    fn resolves_included_and_excluded_products() -> TestResult {
        let mut keys = SlotMap::<ProductKey, ()>::with_key();
        let apple = keys.insert(());
        let pear = keys.insert(());

        let mut product_keys = FxHashMap::default();
        product_keys.insert("apple".to_string(), apple);
        product_keys.insert("pear".to_string(), pear);

        let fixture: RangeFixture = serde_norway::from_str(
            "name: Fruit\nproducts: [apple]\nexcluded: [pear]\ntags: [fruit]\n",
        )?;

        let range = fixture.into_range(&product_keys)?;
        let no_tags = StringTagCollection::default();
        let fruit = StringTagCollection::from_strs(&["fruit"]);

        assert_eq!(range.name(), "Fruit");
        assert!(range.contains(apple, &no_tags));
        assert!(!range.contains(pear, &fruit));

        Ok(())
    }

    #[test]
    fn unknown_product_errors() -> TestResult {
        let fixture: RangeFixture = serde_norway::from_str("name: Fruit\nproducts: [kiwi]\n")?;

        assert!(matches!(
            fixture.into_range(&FxHashMap::default()),
            Err(FixtureError::ProductNotFound(key)) if key == "kiwi"
        ));

        Ok(())
    }
}
