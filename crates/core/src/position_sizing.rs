use anyhow::Result;
use rust_decimal::{Decimal, RoundingStrategy};

/// Maximum leverage Bitget accepts on USDT-margined perpetuals.
pub const MAX_LEVERAGE: u32 = 125;

/// Calculate the quantity for an opening market order
///
/// # Arguments
/// * `capital` - Configured trading capital in the margin coin
/// * `capital_fraction` - Share of capital committed as margin (0.0-1.0, exclusive)
/// * `leverage` - Leverage multiplier (1-125)
/// * `price` - Current reference price
/// * `size_decimals` - Lot precision of the instrument
///
/// # Returns
/// `capital × capital_fraction × leverage / price`, rounded toward zero to the lot precision
///
/// # Errors
/// Returns error if parameters are invalid
pub fn calculate_order_quantity(
    capital: Decimal,
    capital_fraction: Decimal,
    leverage: u32,
    price: Decimal,
    size_decimals: u32,
) -> Result<Decimal> {
    if leverage == 0 || leverage > MAX_LEVERAGE {
        anyhow::bail!("Leverage must be between 1 and {MAX_LEVERAGE}");
    }

    if price <= Decimal::ZERO {
        anyhow::bail!("Price must be positive");
    }

    if capital_fraction <= Decimal::ZERO || capital_fraction >= Decimal::ONE {
        anyhow::bail!("Capital fraction must be strictly between 0 and 1");
    }

    let notional = capital
        .checked_mul(capital_fraction)
        .and_then(|margin| margin.checked_mul(Decimal::from(leverage)))
        .ok_or_else(|| anyhow::anyhow!("Order notional overflows for capital {capital}"))?;
    let quantity = notional
        .checked_div(price)
        .ok_or_else(|| anyhow::anyhow!("Order quantity overflows at price {price}"))?
        .round_dp_with_strategy(size_decimals, RoundingStrategy::ToZero);

    Ok(quantity)
}

/// Calculate required margin for a position
///
/// # Arguments
/// * `position_value` - Total position value in the margin coin
/// * `leverage` - Leverage multiplier
///
/// # Returns
/// Required margin
#[must_use]
pub fn calculate_required_margin(position_value: Decimal, leverage: u32) -> Decimal {
    if leverage == 0 {
        return position_value;
    }
    position_value / Decimal::from(leverage)
}
