//! Return Calculator.
//!
//! Converts amounts between denominations through pool reserve ratios and
//! computes fixed returns. Every division happens after the multiplication
//! and truncates, matching the exchange's own quote math so that valuations
//! never drift from what the pools would pay.

use anchor_lang::prelude::*;

use crate::engine::interfaces::ExchangeRateOracle;
use crate::errors::VaultError;
use crate::state::ParentStrategy;

/// Mints needed to value anything in stake-token terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricingRoute {
    pub stake_mint: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub base_mint: Pubkey,
}

impl From<&ParentStrategy> for PricingRoute {
    fn from(s: &ParentStrategy) -> Self {
        Self {
            stake_mint: s.stake_mint,
            token0_mint: s.token0_mint,
            token1_mint: s.token1_mint,
            base_mint: s.base_mint,
        }
    }
}

/// `amount * reserve_out / reserve_in`.
fn quote_wide(amount: u128, reserve_in: u64, reserve_out: u64) -> Result<u128> {
    require!(reserve_in > 0 && reserve_out > 0, VaultError::PricingUnavailable);
    let scaled = amount
        .checked_mul(reserve_out as u128)
        .ok_or(VaultError::MathOverflow)?;
    Ok(scaled / reserve_in as u128)
}

/// Value of `amount` of `asset` expressed in `base`.
pub fn value_in_base<O: ExchangeRateOracle>(
    oracle: &O,
    asset: &Pubkey,
    amount: u128,
    base: &Pubkey,
) -> Result<u128> {
    if asset == base {
        return Ok(amount);
    }

    let pair = oracle.get_pair(asset, base)?;
    let reserves = oracle.get_reserves(&pair)?;
    let reserve_in = reserves
        .reserve_of(asset)
        .ok_or(VaultError::PricingUnavailable)?;
    let reserve_out = reserves
        .reserve_of(base)
        .ok_or(VaultError::PricingUnavailable)?;

    quote_wide(amount, reserve_in, reserve_out)
}

/// Stake-token (LP) equivalent of `amount` of `asset`:
///
/// `lp = totalSupply(stakePair) * amountInBase / (reserve0InBase + reserve1InBase)`
pub fn value_in_stake_token<O: ExchangeRateOracle>(
    oracle: &O,
    route: &PricingRoute,
    asset: &Pubkey,
    amount: u64,
) -> Result<u64> {
    if *asset == route.stake_mint {
        return Ok(amount);
    }
    if amount == 0 {
        return Ok(0);
    }

    let amount_in_base = value_in_base(oracle, asset, amount as u128, &route.base_mint)?;

    let pair = oracle.get_pair(&route.token0_mint, &route.token1_mint)?;
    let reserves = oracle.get_reserves(&pair)?;
    let supply = oracle.total_supply(&pair)?;

    let reserve0_in_base =
        value_in_base(oracle, &reserves.token0, reserves.reserve0 as u128, &route.base_mint)?;
    let reserve1_in_base =
        value_in_base(oracle, &reserves.token1, reserves.reserve1 as u128, &route.base_mint)?;
    let pool_in_base = reserve0_in_base
        .checked_add(reserve1_in_base)
        .ok_or(VaultError::MathOverflow)?;

    require!(supply > 0 && pool_in_base > 0, VaultError::PricingUnavailable);

    let lp = (supply as u128)
        .checked_mul(amount_in_base)
        .ok_or(VaultError::MathOverflow)?
        / pool_in_base;

    u64::try_from(lp).map_err(|_| error!(VaultError::MathOverflow))
}

/// `principal * numerator / denominator`.
pub fn interest(principal: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::InvalidRate);
    let accrued = (principal as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?
        / denominator as u128;
    u64::try_from(accrued).map_err(|_| error!(VaultError::MathOverflow))
}

/// `principal + principal * numerator / denominator`. Never below `principal`.
pub fn fixed_return(principal: u64, numerator: u64, denominator: u64) -> Result<u64> {
    let accrued = interest(principal, numerator, denominator)?;
    principal
        .checked_add(accrued)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}
