//! Receipt
//!
//! Renders a basket after offers have been applied: every line with its
//! discount, the offers that applied or could apply, and the totals.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{basket::Basket, offers::OfferSet, pricing::TotalPriceError};

/// Errors that can occur when building a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error calculating totals from basket lines.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One basket line on the receipt.
#[derive(Debug, Clone)]
pub struct ReceiptLine<'a> {
    /// Product title
    pub title: String,

    /// Product tags, comma separated
    pub tags: String,

    /// Units
    pub quantity: u32,

    /// Unit price
    pub unit_price: Money<'a, Currency>,

    /// Price before discounts
    pub line_price: Money<'a, Currency>,

    /// Price after discounts
    pub final_price: Money<'a, Currency>,

    /// Names of the offers that discounted the line
    pub offers: SmallVec<[String; 2]>,
}

/// One offer on the receipt.
#[derive(Debug, Clone)]
pub struct ReceiptOffer<'a> {
    /// Offer name
    pub name: String,

    /// Times the offer was applied
    pub applications: u32,

    /// Total discount from the offer
    pub discount: Money<'a, Currency>,

    /// What to add to the basket to get the offer
    pub upsell: Option<String>,
}

/// Receipt for a basket with offers applied.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: SmallVec<[ReceiptLine<'a>; 8]>,
    offers: SmallVec<[ReceiptOffer<'a>; 4]>,
    subtotal: Money<'a, Currency>,
    total: Money<'a, Currency>,
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Build a receipt from a basket and the offers it was evaluated against.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the basket totals cannot be calculated.
    pub fn from_basket(basket: &Basket<'a>, offers: &OfferSet<'_>) -> Result<Self, ReceiptError> {
        let mut lines = SmallVec::new();

        for line in basket.lines() {
            lines.push(ReceiptLine {
                title: line.title().to_string(),
                tags: line.tags().to_string(),
                quantity: line.quantity(),
                unit_price: *line.unit_price(),
                line_price: line.line_price_excl_discounts()?,
                final_price: line.line_price_incl_discounts()?,
                offers: line
                    .consumer()
                    .consumers()
                    .into_iter()
                    .filter(|key| line.has_discount_from(*key))
                    .filter_map(|key| offers.get(key).map(|offer| offer.name().to_string()))
                    .collect(),
            });
        }

        let zero = Money::from_minor(0, basket.currency());

        let receipt_offers = offers
            .iter()
            .map(|offer| {
                let application = basket.applications().get(offer.key());

                ReceiptOffer {
                    name: offer.name().to_string(),
                    applications: application.map_or(0, |app| app.frequency),
                    discount: application.map_or(zero, |app| app.discount),
                    upsell: offer.upsell_message(basket),
                }
            })
            .collect();

        Ok(Self {
            lines,
            offers: receipt_offers,
            subtotal: basket.total_excl_discounts()?,
            total: basket.total()?,
            currency: basket.currency(),
        })
    }

    /// Receipt lines
    pub fn lines(&self) -> &[ReceiptLine<'a>] {
        &self.lines
    }

    /// Offers, in creation order
    pub fn offers(&self) -> &[ReceiptOffer<'a>] {
        &self.offers
    }

    /// Total before discounts.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Total after discounts.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Currency of every amount on the receipt.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Calculate the total savings.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.subtotal.sub(self.total)
    }

    /// Savings as a fraction of the subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings_percent(&self) -> Result<Percentage, MoneyError> {
        let savings_minor = self.savings()?.to_minor_units();
        let subtotal_minor = self.subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Ok(Percentage::from(0.0));
        }

        let savings_dec = Decimal::from_i64(savings_minor).unwrap_or(Decimal::ZERO);
        let subtotal_dec = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ZERO);

        Ok(Percentage::from(savings_dec / subtotal_dec))
    }

    /// Write the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        write_table(&mut out, self.lines_table(), Columns::new(2..6))?;
        write_summary(&mut out, self)?;

        if !self.offers.is_empty() {
            write_table(&mut out, self.offers_table(), Columns::new(1..3))?;
        }

        Ok(())
    }

    fn lines_table(&self) -> Builder {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Tags", "Qty", "Unit Price", "Price", "Discounted", "Offers"]);

        for line in &self.lines {
            let discounted = if line.final_price == line.line_price {
                String::new()
            } else {
                line.final_price.to_string()
            };

            builder.push_record([
                line.title.clone(),
                line.tags.clone(),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.line_price.to_string(),
                discounted,
                line.offers.join(", "),
            ]);
        }

        builder
    }

    fn offers_table(&self) -> Builder {
        let mut builder = Builder::default();

        builder.push_record(["Offer", "Applied", "Discount", "Upsell"]);

        for offer in &self.offers {
            builder.push_record([
                offer.name.clone(),
                offer.applications.to_string(),
                offer.discount.to_string(),
                offer.upsell.clone().unwrap_or_default(),
            ]);
        }

        builder
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    numeric: Columns<std::ops::Range<usize>>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(numeric, Alignment::right());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_summary(out: &mut impl io::Write, receipt: &Receipt<'_>) -> Result<(), ReceiptError> {
    let savings = receipt.savings()?;
    let savings_percent_points = percent_points(receipt.savings_percent()?);

    let subtotal_label = " Subtotal:";
    let total_label = " \x1b[1mTotal:\x1b[0m";
    let savings_label = " Savings:";

    let subtotal_val = format!("{}  ", receipt.subtotal());
    let total_val = format!("{}  ", receipt.total());
    let savings_val = format!("({savings_percent_points:.2}%) {savings}  ");

    let label_width = visible_width(subtotal_label)
        .max(visible_width(total_label))
        .max(visible_width(savings_label));

    let value_width = subtotal_val
        .len()
        .max(total_val.len())
        .max(savings_val.len());

    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    write_summary_line(out, savings_label, &savings_val, label_width, value_width)
}

/// Converts a fractional percentage to percent points for display.
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of box-drawing characters in dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Width of a string ignoring ANSI escapes.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;
    use testresult::TestResult;

    use crate::{
        offers::{
            ConditionalOffer, applicator::Applicator, benefits::Benefit, conditions::Condition,
        },
        products::Catalogue,
        ranges::Range,
        tags::string::StringTagCollection,
    };

    use super::*;

    #[test]
    fn receipt_lists_lines_offers_and_totals() -> TestResult {
        let mut catalogue = Catalogue::new();
        let key = catalogue.insert_with(
            "Apple",
            Money::from_minor(100, GBP),
            StringTagCollection::from_strs(&["fruit"]),
            None,
        );
        let product = catalogue.get(key).ok_or("missing product")?;

        let all = Range::all_products("All products");
        let mut offers = OfferSet::new();
        offers.insert(|key| {
            ConditionalOffer::new(
                key,
                "Apple freebie",
                Condition::count(all.clone(), 2),
                Benefit::multibuy(all.clone()),
            )
        });
        offers.insert(|key| {
            ConditionalOffer::new(
                key,
                "Bulk buy",
                Condition::count(all.clone(), 5),
                Benefit::multibuy(all),
            )
        });

        let mut basket = Basket::new(GBP);
        basket.add_product(product, 2)?;
        Applicator::new().apply(&mut basket, &offers)?;

        let receipt = Receipt::from_basket(&basket, &offers)?;

        assert_eq!(receipt.subtotal(), Money::from_minor(200, GBP));
        assert_eq!(receipt.total(), Money::from_minor(100, GBP));
        assert_eq!(receipt.savings()?, Money::from_minor(100, GBP));
        assert_eq!(percent_points(receipt.savings_percent()?), Decimal::from(50));

        let line = receipt.lines().first().ok_or("missing line")?;
        assert_eq!(line.offers.as_slice(), ["Apple freebie".to_string()]);

        // Units held by the earlier exclusive offer do not count towards this one.
        let bulk = receipt.offers().get(1).ok_or("missing offer")?;
        assert_eq!(bulk.applications, 0);
        assert_eq!(bulk.upsell.as_deref(), Some("Buy 5 more products from All products"));

        let mut out = Vec::new();
        receipt.write_to(&mut out)?;

        let output = String::from_utf8(out)?;
        assert!(output.contains("Apple"));
        assert!(output.contains("fruit"));
        assert!(output.contains("Apple freebie"));
        assert!(output.contains("Buy 5 more products from All products"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Total:"));

        Ok(())
    }

    #[test]
    fn empty_basket_has_zero_savings() -> TestResult {
        let basket = Basket::new(GBP);
        let receipt = Receipt::from_basket(&basket, &OfferSet::new())?;

        assert_eq!(receipt.savings_percent()?, Percentage::from(0.0));
        assert!(receipt.lines().is_empty());
        assert_eq!(receipt.currency(), GBP);

        Ok(())
    }

    #[test]
    fn colorize_borders_wraps_box_runs() {
        assert_eq!(colorize_borders("a──b"), "a\x1b[90m──\x1b[0mb");
        assert_eq!(visible_width("\x1b[1mTotal\x1b[0m"), 5);
    }
}
