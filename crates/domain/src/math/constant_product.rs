//! Constant-product (x * y = k) reserve math.
//!
//! All amounts are base units. Products are taken in 512 bits so that any pair of
//! 256-bit operands multiplies exactly; every division truncates, matching the
//! pair and router contracts bit for bit.

use crate::error::MathError;
use crate::token::TokenAmount;
use crate::value_objects::percentage::Percentage;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;

/// Basis-point denominator.
pub const BPS: u32 = 10_000;

fn narrow(value: U512) -> Result<U256, MathError> {
    U256::try_from(value).map_err(|_| MathError::Overflow)
}

fn mul3(a: U256, b: U256, c: U256) -> Result<U512, MathError> {
    a.full_mul(b)
        .checked_mul(U512::from(c))
        .ok_or(MathError::Overflow)
}

/// Calculates the output amount for a given input amount in a constant product pool.
///
/// formula: dy = y * dx / (x + dx)
/// taking fee into account: dy = y * (dx * (1 - fee)) / (x + (dx * (1 - fee)))
///
/// A pool with an empty reserve is not tradable and quotes zero.
pub fn quote_output(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> Result<TokenAmount, MathError> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(TokenAmount::zero());
    }

    let fee_factor = U256::from(BPS - fee_bps.min(BPS));
    let amount_in_with_fee = amount_in.0.full_mul(fee_factor);
    let numerator = amount_in_with_fee
        .checked_mul(U512::from(reserve_out.0))
        .ok_or(MathError::Overflow)?;
    let denominator = reserve_in
        .0
        .full_mul(U256::from(BPS))
        .checked_add(amount_in_with_fee)
        .ok_or(MathError::Overflow)?;

    narrow(numerator / denominator).map(TokenAmount)
}

/// Price impact of a trade in basis points, clamped to `0..=10000`.
///
/// Compares the spot price `reserve_out / reserve_in` with the execution price
/// `amount_out / amount_in`. The fee counts toward the impact, so even a dust
/// trade reports roughly the fee rate. A pool with an empty reserve reports 10000.
pub fn price_impact_bps(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> Result<u32, MathError> {
    if amount_in.is_zero() {
        return Ok(0);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(BPS);
    }

    let amount_out = quote_output(amount_in, reserve_in, reserve_out, fee_bps)?;

    // execution / spot = (amount_out * reserve_in) / (amount_in * reserve_out)
    let realized = mul3(amount_out.0, reserve_in.0, U256::from(BPS))?;
    let ideal = amount_in.0.full_mul(reserve_out.0);
    let ratio_bps = realized / ideal;

    let bps = U512::from(BPS);
    let impact = if ratio_bps >= bps {
        ratio_bps - bps
    } else {
        bps - ratio_bps
    };
    Ok(impact.min(bps).low_u32())
}

/// Lowest acceptable output for `amount` under a slippage tolerance,
/// `amount * (1 - tolerance)`.
///
/// A bound of zero for a positive amount is lifted to one base unit, since a
/// zero minimum would accept any output at all.
pub fn apply_slippage(amount: TokenAmount, tolerance_bps: u32) -> TokenAmount {
    let tolerance = tolerance_bps.min(BPS);
    let bound = amount.0.full_mul(U256::from(BPS - tolerance)) / U512::from(BPS);
    // bound <= amount, so it always fits.
    let bound = U256::try_from(bound).unwrap_or(amount.0);
    if bound.is_zero() && !amount.is_zero() {
        TokenAmount(U256::one())
    } else {
        TokenAmount(bound)
    }
}

/// Amount of the other token matching a deposit at the current reserve ratio.
pub fn derive_proportional_amount(
    known_amount: TokenAmount,
    known_reserve: TokenAmount,
    other_reserve: TokenAmount,
) -> Result<TokenAmount, MathError> {
    if known_reserve.is_zero() {
        return Err(MathError::InsufficientReserves);
    }
    narrow(known_amount.0.full_mul(other_reserve.0) / U512::from(known_reserve.0)).map(TokenAmount)
}

/// LP tokens that must be burned to receive `amount` of the token held in `reserve`.
pub fn required_liquidity(
    amount: TokenAmount,
    reserve: TokenAmount,
    total_lp_supply: TokenAmount,
) -> Result<TokenAmount, MathError> {
    if reserve.is_zero() {
        return Err(MathError::InsufficientReserves);
    }
    narrow(amount.0.full_mul(total_lp_supply.0) / U512::from(reserve.0)).map(TokenAmount)
}

/// Share of the user's LP balance needed to withdraw `amount`, capped at 100%.
pub fn percent_from_amount(
    amount: TokenAmount,
    reserve: TokenAmount,
    total_lp_supply: TokenAmount,
    user_lp_balance: TokenAmount,
) -> Result<Percentage, MathError> {
    let required = required_liquidity(amount, reserve, total_lp_supply)?;
    if user_lp_balance.is_zero() || required >= user_lp_balance {
        return Ok(Percentage::FULL);
    }
    let fraction = ratio_to_decimal(U512::from(required.0), U512::from(user_lp_balance.0))
        .unwrap_or(Decimal::ONE);
    Ok(Percentage(fraction).clamped())
}

/// Tokens returned for burning `liquidity` LP tokens; zero when supply is unknown.
pub fn pro_rata_amount(
    liquidity: TokenAmount,
    reserve: TokenAmount,
    total_lp_supply: TokenAmount,
) -> Result<TokenAmount, MathError> {
    if total_lp_supply.is_zero() {
        return Ok(TokenAmount::zero());
    }
    narrow(liquidity.0.full_mul(reserve.0) / U512::from(total_lp_supply.0)).map(TokenAmount)
}

/// Scales an amount by a fraction exactly, truncating.
pub fn scale_by(amount: TokenAmount, share: Percentage) -> Result<TokenAmount, MathError> {
    let share = share.clamped().0.normalize();
    let mantissa = U256::from(share.mantissa().unsigned_abs());
    let scaled = amount.0.full_mul(mantissa) / U512::from(U256::exp10(share.scale() as usize));
    narrow(scaled).map(TokenAmount)
}

/// Spot price of the `in` token denominated in the `out` token, decimal-adjusted.
pub fn spot_price(
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    decimals_in: u8,
    decimals_out: u8,
) -> Option<Decimal> {
    if reserve_in.is_zero() {
        return None;
    }
    let num = reserve_out
        .0
        .full_mul(U256::exp10(usize::from(decimals_in)));
    let den = reserve_in
        .0
        .full_mul(U256::exp10(usize::from(decimals_out)));
    ratio_to_decimal(num, den)
}

/// `num / den` as a `Decimal`, keeping as many fractional digits as fit.
fn ratio_to_decimal(num: U512, den: U512) -> Option<Decimal> {
    if den.is_zero() {
        return None;
    }
    for scale in (0..=18u32).rev() {
        let scaled = num.checked_mul(U512::exp10(scale as usize))? / den;
        if scaled.bits() > 96 {
            continue;
        }
        let mantissa = i128::try_from(scaled.low_u128()).ok()?;
        return Decimal::try_from_i128_with_scale(mantissa, scale)
            .ok()
            .map(|d| d.normalize());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn units(whole: u64, decimals: usize) -> TokenAmount {
        TokenAmount(U256::from(whole) * U256::exp10(decimals))
    }

    #[test]
    fn test_quote_output() {
        // 1000 reserve0, 1000 reserve1, 10 input, 0.3% fee (30 bps)
        // amount_in_with_fee = 10 * 9970 = 99700 (scaled by 10000)
        // numerator = 99700 * 1000 = 99,700,000
        // denominator = 1000 * 10000 + 99700 = 10,099,700
        // out = 99,700,000 / 10,099,700 = 9.8715... -> 9
        let out = quote_output(
            TokenAmount::from(10u64),
            TokenAmount::from(1000u64),
            TokenAmount::from(1000u64),
            30,
        )
        .unwrap();
        assert_eq!(out.0.as_u64(), 9);
    }

    #[test]
    fn test_quote_eth_usdc_pool() {
        // 0.1 ETH into 10 ETH / 20,000 USDC
        let amount_in = TokenAmount(U256::exp10(17));
        let out = quote_output(amount_in, units(10, 18), units(20_000, 6), 30).unwrap();
        // 0.3% fee plus the curve: ~197.43 USDC rather than the fee-only 199.4
        assert_eq!(out.0, U256::from(197_431_606u64));
    }

    #[test]
    fn test_quote_is_below_no_fee_quote_and_monotonic() {
        let reserve_in = TokenAmount::from(5_000_000u64);
        let reserve_out = TokenAmount::from(7_000_000u64);
        let mut previous = TokenAmount::zero();
        for amount in [1u64, 10, 999, 50_000, 1_000_000, 40_000_000] {
            let amount_in = TokenAmount::from(amount);
            let out = quote_output(amount_in, reserve_in, reserve_out, 30).unwrap();
            let naive = amount_in.0 * reserve_out.0 / reserve_in.0;
            assert!(out.0 < naive || naive.is_zero());
            assert!(out >= previous);
            previous = out;
        }
    }

    #[test]
    fn test_zero_reserves_quote_zero() {
        let x = TokenAmount::from(1_000u64);
        let r = TokenAmount::from(1_000_000u64);
        assert!(quote_output(x, TokenAmount::zero(), r, 30).unwrap().is_zero());
        assert!(quote_output(x, r, TokenAmount::zero(), 30).unwrap().is_zero());
    }

    #[test]
    fn test_quote_handles_wide_values() {
        let reserve = TokenAmount(U256::from(u128::MAX));
        let out = quote_output(TokenAmount(U256::MAX), reserve, reserve, 30).unwrap();
        assert!(out < reserve);

        let huge = TokenAmount(U256::MAX);
        assert_eq!(quote_output(huge, huge, huge, 30), Err(MathError::Overflow));
    }

    #[test]
    fn test_price_impact() {
        assert_eq!(
            price_impact_bps(TokenAmount::zero(), units(10, 18), units(20_000, 6), 30).unwrap(),
            0
        );

        // A trade of 1% of the reserve pays the 0.3% fee plus ~1% of curve movement.
        let impact =
            price_impact_bps(TokenAmount(U256::exp10(17)), units(10, 18), units(20_000, 6), 30)
                .unwrap();
        assert!((125..=130).contains(&impact), "impact was {impact}");

        // Draining trades are capped at 100%.
        let impact = price_impact_bps(units(1_000_000, 18), units(10, 18), units(20_000, 6), 30)
            .unwrap();
        assert!(impact <= BPS);
        assert!(impact > 9_900);

        assert_eq!(
            price_impact_bps(units(1, 18), TokenAmount::zero(), units(1, 6), 30).unwrap(),
            BPS
        );
    }

    #[test]
    fn test_apply_slippage_bounds() {
        let amount = TokenAmount::from(1_000_000u64);
        assert_eq!(apply_slippage(amount, 0), amount);
        assert_eq!(apply_slippage(amount, 500).0, U256::from(950_000u64));
        for tolerance in [0, 1, 50, 500, 9_999, 10_000] {
            assert!(apply_slippage(amount, tolerance) <= amount);
        }
    }

    #[test]
    fn test_apply_slippage_floors_at_one_unit() {
        let one = TokenAmount::from(1u64);
        assert_eq!(apply_slippage(one, 500).0, U256::one());
        assert_eq!(apply_slippage(TokenAmount::from(10u64), 10_000).0, U256::one());
        assert!(apply_slippage(TokenAmount::zero(), 500).is_zero());
    }

    #[test]
    fn test_derive_proportional_round_trip() {
        let r0 = units(10, 18);
        let r1 = units(20_000, 6);
        for a in [1u64, 7, 123_456_789, 500_000_000_000_000_000] {
            let a = TokenAmount::from(a);
            let other = derive_proportional_amount(a, r0, r1).unwrap();
            let back = derive_proportional_amount(other, r1, r0).unwrap();
            // Two truncating divisions lose at most one unit of the smaller token,
            // which is worth `r0 / r1` units of this one.
            let tolerance = r0.0 / r1.0 + U256::one();
            assert!(a.0 >= back.0 && a.0 - back.0 <= tolerance);
        }

        let balanced = TokenAmount::from(1_000_000u64);
        let other =
            derive_proportional_amount(TokenAmount::from(333u64), balanced, balanced).unwrap();
        assert_eq!(
            derive_proportional_amount(other, balanced, balanced).unwrap().0,
            U256::from(333u64)
        );
    }

    #[test]
    fn test_derive_proportional_needs_reserves() {
        assert_eq!(
            derive_proportional_amount(TokenAmount::from(1u64), TokenAmount::zero(), units(1, 6)),
            Err(MathError::InsufficientReserves)
        );
    }

    #[test]
    fn test_half_eth_matches_usdc_at_pool_ratio() {
        let usdc = derive_proportional_amount(
            TokenAmount(U256::from(5u64) * U256::exp10(17)),
            units(10, 18),
            units(20_000, 6),
        )
        .unwrap();
        assert_eq!(usdc, units(1_000, 6));
    }

    #[test]
    fn test_percent_from_amount() {
        // reserve 20,000 USDC, supply 100 LP, user holds 10 LP (= 2,000 USDC side)
        let reserve = units(20_000, 6);
        let supply = units(100, 18);
        let user = units(10, 18);

        let pct = percent_from_amount(units(500, 6), reserve, supply, user).unwrap();
        assert_eq!(pct.0, dec!(0.25));

        // Asking for more than the position holds is capped at 100%.
        let pct = percent_from_amount(units(5_000, 6), reserve, supply, user).unwrap();
        assert_eq!(pct, Percentage::FULL);

        assert_eq!(
            percent_from_amount(units(1, 6), TokenAmount::zero(), supply, user),
            Err(MathError::InsufficientReserves)
        );
    }

    #[test]
    fn test_scale_by_is_exact() {
        let lp = units(2, 18);
        assert_eq!(scale_by(lp, Percentage(dec!(0.5))).unwrap(), units(1, 18));
        assert_eq!(scale_by(lp, Percentage::FULL).unwrap(), lp);
        assert_eq!(
            scale_by(TokenAmount::from(3u64), Percentage(dec!(0.3333))).unwrap().0,
            U256::zero()
        );
    }

    #[test]
    fn test_pro_rata_amount() {
        let out = pro_rata_amount(units(1, 18), units(10, 18), units(100, 18)).unwrap();
        assert_eq!(out, TokenAmount(U256::exp10(17)));
        assert!(
            pro_rata_amount(units(1, 18), units(10, 18), TokenAmount::zero())
                .unwrap()
                .is_zero()
        );
    }

    #[test]
    fn test_spot_price() {
        // 10 ETH / 20,000 USDC -> 2000 USDC per ETH
        let price = spot_price(units(10, 18), units(20_000, 6), 18, 6).unwrap();
        assert_eq!(price, dec!(2000));
        let inverse = spot_price(units(20_000, 6), units(10, 18), 6, 18).unwrap();
        assert_eq!(inverse, dec!(0.0005));
        assert!(spot_price(TokenAmount::zero(), units(1, 6), 18, 6).is_none());
    }
}
