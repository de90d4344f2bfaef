//! Offer application against the grocery fixture set.
//!
//! Offers, in evaluation order:
//!
//! 1. Three for two on fruit - priority 2, exclusive, cheapest fruit free.
//! 2. Lunch deal for £6 - priority 1, exclusive, bread, cheese and apple for £6.
//! 3. 10% off dairy - non-exclusive.
//! 4. Spend £20 save £2 - non-exclusive, applied at most once.
//!
//! A fifth, suspended offer is never applied.

use std::path::PathBuf;

use rusty_money::{Money, iso::GBP};
use testresult::TestResult;

use rebate::prelude::*;

fn grocery<'a>() -> Result<Fixture<'a>, FixtureError> {
    Fixture::from_set_in(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures"), "grocery")
}

fn fill<'a>(
    fixture: &Fixture<'a>,
    items: &[(&str, u32)],
) -> Result<Basket<'a>, Box<dyn std::error::Error>> {
    let mut basket = fixture.basket();

    for (key, quantity) in items {
        basket.add_product(fixture.product(key)?, *quantity)?;
    }

    Applicator::new().apply(&mut basket, fixture.offers())?;

    Ok(basket)
}

#[test]
fn cheapest_fruit_is_free() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("apple", 3), ("banana", 1)])?;

    let fruit = fixture.offer("three-for-two-on-fruit")?;
    let application = basket.applications().get(fruit.key()).ok_or("fruit offer not applied")?;

    assert_eq!(application.frequency, 1);
    assert_eq!(application.discount, Money::from_minor(30, GBP));
    assert_eq!(basket.total()?, Money::from_minor(135, GBP));

    // The one apple left over goes towards the lunch deal and the spend offer.
    assert_eq!(fruit.upsell_message(&basket), None);
    assert_eq!(
        fixture.offer("lunch-deal-for-6")?.upsell_message(&basket).as_deref(),
        Some("Buy 2 more products from Lunch deal")
    );
    assert_eq!(
        fixture.offer("spend-20-save-2")?.upsell_message(&basket).as_deref(),
        Some("Spend £19.55 more from Everything")
    );
    assert_eq!(
        fixture.offer("10-off-dairy")?.upsell_message(&basket).as_deref(),
        Some("Buy 1 more product from Dairy")
    );

    Ok(())
}

#[test]
fn three_for_two_repeats_across_fruit_lines() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("apple", 3), ("banana", 3)])?;

    let fruit = fixture.offer("three-for-two-on-fruit")?;
    let application = basket
        .applications()
        .get(fruit.key())
        .ok_or("fruit offer not applied")?;

    // One banana free, then one apple.
    assert_eq!(application.frequency, 2);
    assert_eq!(application.discount, Money::from_minor(75, GBP));
    assert_eq!(application.affected_quantity, 2);
    assert_eq!(basket.line(0)?.discount_from(fruit.key()), Money::from_minor(45, GBP));
    assert_eq!(basket.line(1)?.discount_from(fruit.key()), Money::from_minor(30, GBP));
    assert_eq!(basket.total()?, Money::from_minor(150, GBP));
    assert_eq!(fruit.upsell_message(&basket), None);

    Ok(())
}

#[test]
fn three_for_two_frees_one_unit_per_line() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("apple", 6)])?;

    let fruit = fixture.offer("three-for-two-on-fruit")?;
    let application = basket
        .applications()
        .get(fruit.key())
        .ok_or("fruit offer not applied")?;

    // The line was discounted by the first application, so the second
    // group of three has no line left to free a unit from.
    assert_eq!(application.frequency, 1);
    assert_eq!(application.discount, Money::from_minor(45, GBP));
    assert_eq!(basket.total()?, Money::from_minor(225, GBP));

    Ok(())
}

#[test]
fn spend_discount_is_split_by_line_value() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("cheese", 4), ("milk", 2)])?;

    let spend = fixture.offer("spend-20-save-2")?;
    let application = basket
        .applications()
        .get(spend.key())
        .ok_or("spend offer not applied")?;

    assert_eq!(application.frequency, 1);
    assert_eq!(application.discount, Money::from_minor(200, GBP));

    // £2 over £2.20 of milk and £18.00 of cheese: milk gets 200 * 220 / 2020
    // rounded down, cheese takes the remainder.
    let cheese = basket.line(0)?;
    let milk = basket.line(1)?;

    assert_eq!(milk.discount_from(spend.key()), Money::from_minor(21, GBP));
    assert_eq!(cheese.discount_from(spend.key()), Money::from_minor(179, GBP));

    // 10% off dairy is applied first on the same units.
    assert_eq!(basket.total_discount()?, Money::from_minor(402, GBP));
    assert_eq!(basket.total()?, Money::from_minor(1618, GBP));

    Ok(())
}

#[test]
fn lunch_deal_excludes_its_items_from_later_offers() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(
        &fixture,
        &[("bread", 1), ("cheese", 1), ("apple", 1), ("milk", 2)],
    )?;

    let lunch = fixture.offer("lunch-deal-for-6")?;
    let dairy = fixture.offer("10-off-dairy")?;

    let lunch_application = basket
        .applications()
        .get(lunch.key())
        .ok_or("lunch deal not applied")?;
    let dairy_application = basket
        .applications()
        .get(dairy.key())
        .ok_or("dairy offer not applied")?;

    assert_eq!(lunch_application.discount, Money::from_minor(215, GBP));
    assert_eq!(lunch_application.affected_quantity, 3);

    // Cheese was taken by the exclusive lunch deal, so only milk is discounted.
    assert_eq!(dairy_application.discount, Money::from_minor(22, GBP));
    assert_eq!(dairy_application.affected_quantity, 2);

    assert_eq!(basket.total_excl_discounts()?, Money::from_minor(1035, GBP));
    assert_eq!(basket.total_discount()?, Money::from_minor(237, GBP));
    assert_eq!(basket.total()?, Money::from_minor(798, GBP));
    assert_eq!(
        fixture.offer("spend-20-save-2")?.upsell_message(&basket).as_deref(),
        Some("Spend £17.80 more from Everything")
    );

    Ok(())
}

#[test]
fn non_exclusive_offers_stack_on_the_same_units() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("cheese", 5)])?;

    let dairy = fixture.offer("10-off-dairy")?;
    let spend = fixture.offer("spend-20-save-2")?;

    assert_eq!(
        basket.applications().get(dairy.key()).ok_or("dairy offer not applied")?.discount,
        Money::from_minor(225, GBP)
    );

    let spend_application = basket
        .applications()
        .get(spend.key())
        .ok_or("spend offer not applied")?;

    assert_eq!(spend_application.frequency, 1);
    assert_eq!(spend_application.discount, Money::from_minor(200, GBP));
    assert_eq!(basket.total()?, Money::from_minor(1825, GBP));

    let line = basket.line(0)?;

    assert_eq!(line.quantity_with_offer_discount(dairy.key()), 5);
    assert_eq!(line.quantity_with_offer_discount(spend.key()), 5);
    assert!(
        fixture
            .offer("lunch-deal-for-6")?
            .is_condition_partially_satisfied(&basket)
    );

    Ok(())
}

#[test]
fn suspended_offer_is_never_applied() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("milk", 1)])?;
    let sale = fixture.offer("spring-sale")?;

    assert_eq!(sale.status(), OfferStatus::Suspended);
    assert!(basket.applications().get(sale.key()).is_none());
    assert_eq!(basket.applications().rank(sale.key()), None);

    Ok(())
}

#[test]
fn stock_limits_are_enforced() -> TestResult {
    let fixture = grocery()?;
    let mut basket = fixture.basket();
    let bread = fixture.product("bread")?;

    basket.add_product(bread, 4)?;

    assert!(matches!(
        basket.add_product(bread, 1),
        Err(BasketError::Unavailable { .. })
    ));

    basket.set_strategy(Box::new(Unrestricted));
    basket.add_product(bread, 1)?;

    assert_eq!(basket.num_items(), 5);

    Ok(())
}

#[test]
fn receipt_shows_offers_and_upsells() -> TestResult {
    let fixture = grocery()?;
    let basket = fill(&fixture, &[("apple", 3), ("banana", 1)])?;
    let receipt = Receipt::from_basket(&basket, fixture.offers())?;

    let mut out = Vec::new();
    receipt.write_to(&mut out)?;
    let output = String::from_utf8(out)?;

    assert!(output.contains("Three for two on fruit"));
    assert!(output.contains("Buy 2 more products from Lunch deal"));
    assert_eq!(receipt.savings()?, Money::from_minor(30, GBP));

    Ok(())
}
