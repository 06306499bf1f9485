// Price Table
//
// The engine's only view of the market: the most recent quote per asset,
// last write wins. No staleness tracking and no source aggregation; the feed
// upstream owns quote quality, we own remembering exactly one per asset.

use crate::types::{minor_units, Asset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on a quote's `decimals`. Past 18 a single whole unit no
/// longer fits in i64, so such a quote could never be rescaled into the
/// engine's working scale anyway.
pub const MAX_PRICE_DECIMALS: u32 = 18;

/// One observed price. `price` is minor units at `decimals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub asset: Asset,
    #[serde(with = "minor_units")]
    pub price: i64,
    pub decimals: u32,
}

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    quotes: HashMap<Asset, PriceQuote>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was known for the quote's asset.
    pub fn update(&mut self, quote: PriceQuote) {
        self.quotes.insert(quote.asset, quote);
    }

    /// Latest quote, or None if the asset has never ticked.
    pub fn get(&self, asset: Asset) -> Option<&PriceQuote> {
        self.quotes.get(&asset)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }
}
