//! Rebate CLI
//!
//! Loads a fixture set, adds a product to a basket one unit at a time,
//! applies the set's offers and prints a receipt.

use std::io;

use anyhow::Context;
use tracing::info;

use rebate::{
    config::Config, fixtures::Fixture, observability, offers::applicator::Applicator,
    receipt::Receipt,
};

fn main() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_else(|err| err.exit());

    observability::init(&config.logging)?;

    let fixture = Fixture::from_set_in(&config.fixtures_dir, &config.fixture)
        .with_context(|| format!("loading fixture set {}", config.fixture))?;

    let product = fixture.product(&config.product)?;
    let applicator = Applicator::new();
    let mut basket = fixture.basket();
    let stdout = io::stdout();

    info!(
        fixture = %config.fixture,
        product = %product.title,
        quantity = config.quantity,
        offers = fixture.offers().len(),
        "starting"
    );

    for step in 1..=config.quantity {
        basket.add_product(product, 1)?;
        applicator.apply(&mut basket, fixture.offers())?;

        if config.steps || step == config.quantity {
            let receipt = Receipt::from_basket(&basket, fixture.offers())?;

            receipt
                .write_to(stdout.lock())
                .context("writing receipt")?;
        }
    }

    Ok(())
}
