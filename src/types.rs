// 1.0: primitives for the whole engine. ids, assets, sides, timestamps,
// and the minor-unit serde helper. every amount in the system is an i64
// scaled by 10^decimals; the scale travels next to the amount, never implied.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// USDC is the settlement currency. margin, pnl and balances settle in
// USDC minor units (cents).
pub const USDC_DECIMALS: u32 = 2;

// engine-wide scale for priced assets. prices and non-USDC balances use it.
pub const ASSET_DECIMALS: u32 = 4;

// 1.1: user identity as handed over by the (external) auth layer. opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: position key. assigned by the command layer (uuid v4 there) before the
// open command reaches the engine, so creation is idempotent downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: the tradeable symbols. wire form is strict upper-case; anything else
// is InvalidAsset at the command layer or a dropped tick at ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
}

impl Asset {
    pub const ALL: [Asset; 3] = [Asset::Btc, Asset::Eth, Asset::Sol];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BTC" => Some(Asset::Btc),
            "ETH" => Some(Asset::Eth),
            "SOL" => Some(Asset::Sol),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// 1.4: everything a wallet can hold. USDC plus the tradeable assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BalanceAsset {
    Usdc,
    Btc,
    Eth,
    Sol,
}

impl BalanceAsset {
    pub const ALL: [BalanceAsset; 4] = [
        BalanceAsset::Usdc,
        BalanceAsset::Btc,
        BalanceAsset::Eth,
        BalanceAsset::Sol,
    ];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USDC" => Some(BalanceAsset::Usdc),
            "BTC" => Some(BalanceAsset::Btc),
            "ETH" => Some(BalanceAsset::Eth),
            "SOL" => Some(BalanceAsset::Sol),
            _ => None,
        }
    }

    // scale is fixed per asset for the lifetime of the system
    pub fn decimals(&self) -> u32 {
        match self {
            BalanceAsset::Usdc => USDC_DECIMALS,
            _ => ASSET_DECIMALS,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BalanceAsset::Usdc => "USDC",
            BalanceAsset::Btc => "BTC",
            BalanceAsset::Eth => "ETH",
            BalanceAsset::Sol => "SOL",
        }
    }
}

impl From<Asset> for BalanceAsset {
    fn from(asset: Asset) -> Self {
        match asset {
            Asset::Btc => BalanceAsset::Btc,
            Asset::Eth => BalanceAsset::Eth,
            Asset::Sol => BalanceAsset::Sol,
        }
    }
}

impl fmt::Display for BalanceAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "long" => Some(Side::Long),
            "short" => Some(Side::Short),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("long"),
            Side::Short => f.write_str("short"),
        }
    }
}

// 1.5: a position is open until the user closes it or the scanner forces it
// closed. closed entries stay in the book and ride along in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

// 1.6: millisecond timestamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

// 1.7: serde helper for minor-unit amounts. serializes as a decimal string so
// no consumer ever coerces a balance through a float; accepts either form on
// input because old snapshots stored plain integers.
pub mod minor_units {
    use super::*;

    pub fn serialize<S>(amount: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MinorUnitsVisitor;

        impl de::Visitor<'_> for MinorUnitsVisitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer amount or its decimal-string form")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
                i64::try_from(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
                v.parse::<i64>().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(MinorUnitsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_parse_is_strict_uppercase() {
        assert_eq!(Asset::parse("BTC"), Some(Asset::Btc));
        assert_eq!(Asset::parse("btc"), None);
        assert_eq!(Asset::parse("DOGE"), None);
        assert_eq!(Asset::parse(""), None);
    }

    #[test]
    fn side_parse_is_strict_lowercase() {
        assert_eq!(Side::parse("long"), Some(Side::Long));
        assert_eq!(Side::parse("short"), Some(Side::Short));
        assert_eq!(Side::parse("LONG"), None);
    }

    #[test]
    fn balance_asset_scales() {
        assert_eq!(BalanceAsset::Usdc.decimals(), 2);
        assert_eq!(BalanceAsset::Btc.decimals(), 4);
        assert_eq!(BalanceAsset::from(Asset::Sol), BalanceAsset::Sol);
    }

    #[test]
    fn minor_units_roundtrip_through_strings() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "minor_units")]
            amount: i64,
        }

        let json = serde_json::to_string(&Wrapper { amount: 500_000 }).unwrap();
        assert_eq!(json, r#"{"amount":"500000"}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount, 500_000);

        // legacy snapshots carry plain integers
        let legacy: Wrapper = serde_json::from_str(r#"{"amount":-250}"#).unwrap();
        assert_eq!(legacy.amount, -250);
    }

    #[test]
    fn minor_units_rejects_garbage() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(with = "minor_units")]
            #[allow(dead_code)]
            amount: i64,
        }

        assert!(serde_json::from_str::<Wrapper>(r#"{"amount":"12x"}"#).is_err());
    }
}
