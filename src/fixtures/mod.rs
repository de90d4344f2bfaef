//! Fixtures
//!
//! A fixture set is one YAML file describing a catalogue, its ranges and an
//! ordered list of offers. Offers are created in file order, which decides
//! ties between offers of equal priority.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    basket::Basket,
    fixtures::{
        offers::OfferFixture,
        products::{ProductFixture, parse_currency},
        ranges::RangeFixture,
    },
    offers::{ConditionalOffer, OfferSet},
    products::{Catalogue, Product, ProductKey},
    ranges::Range,
};

pub mod offers;
pub mod products;
pub mod ranges;

/// Default directory fixture sets are loaded from.
pub const DEFAULT_FIXTURES_DIR: &str = "./fixtures";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Range not found
    #[error("Range not found: {0}")]
    RangeNotFound(String),

    /// Offer not found
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// An amount is not in the fixture currency
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),
}

/// Fixture set as written in YAML
#[derive(Debug, Deserialize)]
pub struct FixtureSet {
    /// ISO currency code for every amount in the set
    pub currency: String,

    /// Product key -> product
    pub products: FxHashMap<String, ProductFixture>,

    /// Range key -> range
    #[serde(default)]
    pub ranges: FxHashMap<String, RangeFixture>,

    /// Offers in creation order
    #[serde(default)]
    pub offers: Vec<OfferFixture>,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    currency: &'static Currency,
    catalogue: Catalogue<'a>,
    product_keys: FxHashMap<String, ProductKey>,
    ranges: FxHashMap<String, Range>,
    offers: OfferSet<'a>,
}

impl<'a> Fixture<'a> {
    /// Load `<name>.yml` from the default fixtures directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in(DEFAULT_FIXTURES_DIR, name)
    }

    /// Load `<name>.yml` from `base_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_set_in(base_path: impl AsRef<Path>, name: &str) -> Result<Self, FixtureError> {
        Self::from_file(base_path.as_ref().join(format!("{name}.yml")))
    }

    /// Load a fixture set from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;

        tracing::debug!(path = %path.display(), "loading fixture set");

        Self::parse(&contents)
    }

    /// Parse a fixture set from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid, a reference is unknown, or an
    /// amount is not in the fixture currency.
    pub fn parse(contents: &str) -> Result<Self, FixtureError> {
        let set: FixtureSet = serde_norway::from_str(contents)?;
        let currency = parse_currency(&set.currency)?;

        let mut catalogue = Catalogue::new();
        let mut product_keys = FxHashMap::default();

        for (key, product) in set.products {
            let (price, tags) = product.parts()?;

            if price.currency() != currency {
                return Err(FixtureError::CurrencyMismatch(
                    currency.iso_alpha_code.to_string(),
                    price.currency().iso_alpha_code.to_string(),
                ));
            }

            let product_key = catalogue.insert_with(product.title, price, tags, product.stock);

            product_keys.insert(key, product_key);
        }

        let mut ranges = FxHashMap::default();

        for (key, range) in set.ranges {
            ranges.insert(key, range.into_range(&product_keys)?);
        }

        let mut offers = OfferSet::new();

        for offer in set.offers {
            offers.try_insert(|key| offer.try_into_offer(key, &ranges, currency))?;
        }

        Ok(Self {
            currency,
            catalogue,
            product_keys,
            ranges,
            offers,
        })
    }

    /// Get a product by its fixture key.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        self.catalogue
            .get(self.product_key(key)?)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a catalogue key by its fixture key.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a range by its fixture key.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is not found.
    pub fn range(&self, key: &str) -> Result<&Range, FixtureError> {
        self.ranges
            .get(key)
            .ok_or_else(|| FixtureError::RangeNotFound(key.to_string()))
    }

    /// Get an offer by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer is not found.
    pub fn offer(&self, slug: &str) -> Result<&ConditionalOffer<'a>, FixtureError> {
        self.offers
            .by_slug(slug)
            .ok_or_else(|| FixtureError::OfferNotFound(slug.to_string()))
    }

    /// All offers
    pub fn offers(&self) -> &OfferSet<'a> {
        &self.offers
    }

    /// Product catalogue
    pub fn catalogue(&self) -> &Catalogue<'a> {
        &self.catalogue
    }

    /// Currency of the set
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Create an empty basket in the fixture currency.
    pub fn basket(&self) -> Basket<'a> {
        Basket::new(self.currency)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    #[test]
    fn loads_upsell_set() -> TestResult {
        let fixture = Fixture::from_set_in(fixtures_dir(), "upsell")?;

        assert_eq!(fixture.currency(), GBP);
        assert_eq!(fixture.catalogue().len(), 1);
        assert_eq!(fixture.offers().len(), 4);
        assert_eq!(fixture.product("widget")?.price, Money::from_minor(1000, GBP));
        assert_eq!(fixture.range("all")?.name(), "All products");

        let offer = fixture.offer("offer-4")?;

        assert_eq!(offer.priority(), 3);
        assert!(!offer.is_exclusive());

        Ok(())
    }

    #[test]
    fn loads_grocery_set() -> TestResult {
        let fixture = Fixture::from_set_in(fixtures_dir(), "grocery")?;

        assert_eq!(fixture.catalogue().len(), 5);
        assert_eq!(fixture.offers().len(), 5);
        assert_eq!(fixture.product("bread")?.stock, Some(4));
        assert!(fixture.offer("lunch-deal-for-6").is_ok());
        assert_eq!(fixture.offer("spend-20-save-2")?.max_applications(), 1);

        Ok(())
    }

    #[test]
    fn from_set_in_reads_any_directory() -> TestResult {
        let dir = tempfile::tempdir()?;

        fs::write(
            dir.path().join("tiny.yml"),
            "currency: GBP\nproducts:\n  pen:\n    title: Pen\n    price: 1.00 GBP\n",
        )?;

        let fixture = Fixture::from_set_in(dir.path(), "tiny")?;

        assert_eq!(fixture.product("pen")?.title, "Pen");
        assert!(fixture.offers().is_empty());
        assert!(fixture.basket().is_empty());

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() -> TestResult {
        let dir = tempfile::tempdir()?;

        assert!(matches!(
            Fixture::from_set_in(dir.path(), "missing"),
            Err(FixtureError::Io(_))
        ));

        Ok(())
    }

    #[test]
    fn product_currency_must_match_set() {
        let result = Fixture::parse(
            "currency: GBP\nproducts:\n  pen:\n    title: Pen\n    price: 1.00 USD\n",
        );

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn unknown_currency_errors() {
        let result = Fixture::parse("currency: XYZ\nproducts: {}\n");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "XYZ"));
    }

    #[test]
    fn lookups_report_missing_keys() -> TestResult {
        let fixture = Fixture::parse("currency: GBP\nproducts: {}\n")?;

        assert!(matches!(fixture.product("x"), Err(FixtureError::ProductNotFound(_))));
        assert!(matches!(fixture.product_key("x"), Err(FixtureError::ProductNotFound(_))));
        assert!(matches!(fixture.range("x"), Err(FixtureError::RangeNotFound(_))));
        assert!(matches!(fixture.offer("x"), Err(FixtureError::OfferNotFound(_))));

        Ok(())
    }

    #[test]
    fn invalid_yaml_errors() {
        assert!(matches!(Fixture::parse("currency: [GBP"), Err(FixtureError::Yaml(_))));
    }
}
