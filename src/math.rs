// 2.0: fixed-point position math. amounts enter and leave as i64 minor units;
// Decimal is an implementation detail that never escapes this module. every
// multiply and divide is checked, and rounding happens exactly once, at the
// final conversion back to minor units.

use crate::types::{Side, USDC_DECIMALS};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    // zero entry price or zero position size
    #[error("division by zero in position math")]
    DivisionByZero,
    #[error("amount overflow in position math")]
    Overflow,
}

/// Result of marking a position against a price.
///
/// `pnl` is in USDC minor units, signed. When `liquidated` is set the pnl is
/// always exactly `-margin`: the loss a position can realize is capped at
/// the margin that backed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PnlOutcome {
    pub pnl: i64,
    pub liquidated: bool,
}

// Decimal caps scales at 28; a larger scale cannot be represented at all.
// checked up front so the constructors below never panic on wire-supplied
// or snapshot-supplied decimals.
fn ensure_scale(decimals: u32) -> Result<(), MathError> {
    if decimals > 28 {
        return Err(MathError::Overflow);
    }
    Ok(())
}

// i64 always fits Decimal's 96-bit mantissa, so this direction cannot fail
// once the scale is known good
fn to_real(minor: i64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(minor as i128, decimals)
}

// scale up, round half away from zero, collapse to integer minor units
fn to_minor(value: Decimal, decimals: u32) -> Result<i64, MathError> {
    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    let scaled = value.checked_mul(factor).ok_or(MathError::Overflow)?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MathError::Overflow)
}

fn checked_div(numerator: Decimal, denominator: Decimal) -> Result<Decimal, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    numerator
        .checked_div(denominator)
        .ok_or(MathError::Overflow)
}

// notional and size are shared between both public entry points.
// notional = margin * leverage (USDC), size = notional / entry (asset units).
fn position_size(
    entry_price: i64,
    margin: i64,
    leverage: u32,
    price_decimals: u32,
) -> Result<(Decimal, Decimal), MathError> {
    let entry = to_real(entry_price, price_decimals);
    let margin = to_real(margin, USDC_DECIMALS);
    let notional = margin
        .checked_mul(Decimal::from(leverage))
        .ok_or(MathError::Overflow)?;
    let size = checked_div(notional, entry)?;
    if size.is_zero() {
        // zero margin opens a zero-size position; nothing downstream divides
        // sanely by it, so refuse here
        return Err(MathError::DivisionByZero);
    }
    Ok((notional, size))
}

/// Price at which the position's equity is exhausted, in the same minor-unit
/// scale as `entry_price`.
///
/// A 1x long yields zero: it can only be wiped by the price itself reaching
/// zero, which the comparison in [`profit_and_loss`] handles naturally.
pub fn liquidation_price(
    side: Side,
    entry_price: i64,
    margin: i64,
    leverage: u32,
    price_decimals: u32,
) -> Result<i64, MathError> {
    ensure_scale(price_decimals)?;
    let (notional, size) = position_size(entry_price, margin, leverage, price_decimals)?;
    let margin = to_real(margin, USDC_DECIMALS);
    let equity_at_wipeout = match side {
        Side::Long => notional.checked_sub(margin).ok_or(MathError::Overflow)?,
        Side::Short => notional.checked_add(margin).ok_or(MathError::Overflow)?,
    };
    let liq = checked_div(equity_at_wipeout, size)?;
    to_minor(liq, price_decimals)
}

/// Marks a position at `current_price`: signed pnl, or `-margin` with the
/// `liquidated` flag once the stored threshold is crossed.
///
/// Prices are compared in raw minor units; both must carry `price_decimals`.
/// The caller is responsible for rescaling if the feed scale ever drifts from
/// the scale the position was opened at.
pub fn profit_and_loss(
    side: Side,
    entry_price: i64,
    current_price: i64,
    margin: i64,
    leverage: u32,
    price_decimals: u32,
    liquidation_price: i64,
) -> Result<PnlOutcome, MathError> {
    ensure_scale(price_decimals)?;
    let (_notional, size) = position_size(entry_price, margin, leverage, price_decimals)?;
    let entry = to_real(entry_price, price_decimals);
    let current = to_real(current_price, price_decimals);
    let move_per_unit = match side {
        Side::Long => current.checked_sub(entry).ok_or(MathError::Overflow)?,
        Side::Short => entry.checked_sub(current).ok_or(MathError::Overflow)?,
    };
    let liquidated = match side {
        Side::Long => current_price <= liquidation_price,
        Side::Short => current_price >= liquidation_price,
    };
    if liquidated {
        // loss is capped at the posted margin once the threshold is crossed
        return Ok(PnlOutcome {
            pnl: -margin,
            liquidated: true,
        });
    }
    let pnl = move_per_unit.checked_mul(size).ok_or(MathError::Overflow)?;
    Ok(PnlOutcome {
        pnl: to_minor(pnl, USDC_DECIMALS)?,
        liquidated: false,
    })
}

/// Re-expresses a minor-unit price from one scale to another, rounding half
/// away from zero when the target scale is coarser.
pub fn rescale_price(price: i64, from_decimals: u32, to_decimals: u32) -> Result<i64, MathError> {
    if from_decimals == to_decimals {
        return Ok(price);
    }
    ensure_scale(from_decimals)?;
    ensure_scale(to_decimals)?;
    to_minor(to_real(price, from_decimals), to_decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DEC: u32 = 4;

    #[test]
    fn notional_and_size_are_exact_for_round_inputs() {
        // entry 5.0000, $1000 margin, 10x: $10000 notional over 2000 units
        let (notional, size) = position_size(50_000, 100_000, 10, DEC).unwrap();
        assert_eq!(notional, dec!(10000));
        assert_eq!(size, dec!(2000));
    }

    #[test]
    fn minor_conversion_rounds_half_away_from_zero() {
        assert_eq!(to_real(45_000, DEC), dec!(4.5));
        assert_eq!(to_minor(dec!(4.56785), DEC).unwrap(), 45_679);
        assert_eq!(to_minor(dec!(-4.56785), DEC).unwrap(), -45_679);
    }

    #[test]
    fn long_liquidation_is_entry_minus_entry_over_leverage() {
        // entry 5.0000, $1000 margin, 10x
        let liq = liquidation_price(Side::Long, 50_000, 100_000, 10, DEC).unwrap();
        assert_eq!(liq, 45_000);
    }

    #[test]
    fn short_liquidation_is_entry_plus_entry_over_leverage() {
        let liq = liquidation_price(Side::Short, 50_000, 100_000, 10, DEC).unwrap();
        assert_eq!(liq, 55_000);
    }

    #[test]
    fn one_x_long_liquidates_only_at_zero() {
        let liq = liquidation_price(Side::Long, 50_000, 100_000, 1, DEC).unwrap();
        assert_eq!(liq, 0);

        let marked = profit_and_loss(Side::Long, 50_000, 1, 100_000, 1, DEC, liq).unwrap();
        assert!(!marked.liquidated);
    }

    #[test]
    fn liquidation_price_survives_inexact_division() {
        // entry 3.3333 at 3x: entry / leverage is exact, the intermediate
        // asset size is not
        let liq = liquidation_price(Side::Long, 33_333, 10_000, 3, DEC).unwrap();
        assert_eq!(liq, 33_333 - 11_111);
    }

    #[test]
    fn zero_entry_price_is_division_by_zero() {
        assert_eq!(
            liquidation_price(Side::Long, 0, 100_000, 10, DEC),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn zero_margin_is_division_by_zero() {
        assert_eq!(
            liquidation_price(Side::Long, 50_000, 0, 10, DEC),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            profit_and_loss(Side::Long, 50_000, 51_000, 0, 10, DEC, 45_000),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn long_pnl_tracks_price_move() {
        // BTC at 500000.0000, $1000 margin, 5x -> 0.01 BTC exposure.
        // +2% move is +$10000 per BTC, so +$100 on the position.
        let entry = 5_000_000_000;
        let current = entry + entry / 50;
        let liq = liquidation_price(Side::Long, entry, 100_000, 5, DEC).unwrap();
        let marked = profit_and_loss(Side::Long, entry, current, 100_000, 5, DEC, liq).unwrap();
        assert_eq!(marked.pnl, 10_000);
        assert!(!marked.liquidated);
    }

    #[test]
    fn short_pnl_is_mirrored() {
        let entry = 5_000_000_000;
        let current = entry + entry / 50;
        let liq = liquidation_price(Side::Short, entry, 100_000, 5, DEC).unwrap();
        let marked = profit_and_loss(Side::Short, entry, current, 100_000, 5, DEC, liq).unwrap();
        assert_eq!(marked.pnl, -10_000);
        assert!(!marked.liquidated);
    }

    #[test]
    fn sub_cent_pnl_rounds_to_zero() {
        // 23.3333.. asset units, one tick of 0.0001 -> $0.0023 -> 0 cents
        let marked =
            profit_and_loss(Side::Long, 30_000, 30_001, 1_000, 7, DEC, 25_714).unwrap();
        assert_eq!(marked.pnl, 0);
    }

    #[test]
    fn liquidated_loss_is_capped_at_margin() {
        // well past the threshold the marked loss would exceed the margin;
        // the report caps it
        let marked = profit_and_loss(Side::Long, 50_000, 40_000, 100_000, 10, DEC, 45_000).unwrap();
        assert!(marked.liquidated);
        assert_eq!(marked.pnl, -100_000);
    }

    #[test]
    fn equal_prices_mark_flat() {
        let marked = profit_and_loss(Side::Long, 50_000, 50_000, 100_000, 10, DEC, 45_000).unwrap();
        assert_eq!(marked.pnl, 0);
        assert!(!marked.liquidated);
    }

    #[test]
    fn liquidation_flag_fires_on_threshold_touch() {
        let long = profit_and_loss(Side::Long, 50_000, 45_000, 100_000, 10, DEC, 45_000).unwrap();
        assert!(long.liquidated);

        let short =
            profit_and_loss(Side::Short, 50_000, 55_000, 100_000, 10, DEC, 55_000).unwrap();
        assert!(short.liquidated);

        let safe = profit_and_loss(Side::Long, 50_000, 45_001, 100_000, 10, DEC, 45_000).unwrap();
        assert!(!safe.liquidated);
    }

    #[test]
    fn rescale_between_scales() {
        assert_eq!(rescale_price(45_000, 4, 4).unwrap(), 45_000);
        assert_eq!(rescale_price(45_000, 4, 6).unwrap(), 4_500_000);
        assert_eq!(rescale_price(45_678, 4, 2).unwrap(), 457);
        // half away from zero on the boundary digit
        assert_eq!(rescale_price(45_650, 4, 2).unwrap(), 457);
        assert_eq!(rescale_price(-45_650, 4, 2).unwrap(), -457);
    }

    #[test]
    fn unrepresentable_scales_error_instead_of_panicking() {
        assert_eq!(rescale_price(1, 100, 4), Err(MathError::Overflow));
        assert_eq!(rescale_price(1, 4, 100), Err(MathError::Overflow));
        assert_eq!(
            liquidation_price(Side::Long, 50_000, 100_000, 10, 29),
            Err(MathError::Overflow)
        );
        // 28 is the last representable scale
        assert!(rescale_price(123, 28, 4).is_ok());
    }
}
