// 9.3 engine/pricing.rs: price ingestion. a batch is applied quote by quote
// (last write wins inside a batch too), then every asset the batch touched
// gets a liquidation sweep. unusable quotes never reach the table: a zero
// or negative price would turn into DivisionByZero deep inside the math,
// and a scale past MAX_PRICE_DECIMALS can never be rescaled, so both are
// filtered here with a warning instead.

use super::core::Engine;
use super::results::ScanOutcome;
use crate::price_table::{PriceQuote, MAX_PRICE_DECIMALS};
use crate::types::Asset;

impl Engine {
    pub fn apply_price_batch(&mut self, quotes: Vec<PriceQuote>) -> ScanOutcome {
        let mut touched: Vec<Asset> = Vec::new();
        for quote in quotes {
            if quote.price <= 0 || quote.decimals > MAX_PRICE_DECIMALS {
                tracing::warn!(
                    asset = %quote.asset,
                    price = quote.price,
                    decimals = quote.decimals,
                    "dropping unusable quote"
                );
                continue;
            }
            self.prices.update(quote);
            if !touched.contains(&quote.asset) {
                touched.push(quote.asset);
            }
        }

        let mut outcome = ScanOutcome::default();
        for asset in touched {
            outcome.merge(self.check_liquidations(asset));
        }
        outcome
    }
}
