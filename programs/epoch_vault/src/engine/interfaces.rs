//! Narrow capability interfaces for everything the engine does not own.
//!
//! The engine only ever talks to pools, farms, token balances and profiles
//! through these traits. On-chain they are bound to CPI adapters in
//! `crate::adapters`; in tests they are backed by in-memory mocks.

use anchor_lang::prelude::*;

use crate::state::RewardQuery;

/// Reserves of a constant-product pair, in the pair's own token order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairReserves {
    pub reserve0: u64,
    pub reserve1: u64,
    pub token0: Pubkey,
    pub token1: Pubkey,
}

impl PairReserves {
    /// Reserve held for `mint`, or `None` if the mint is not in the pair.
    pub fn reserve_of(&self, mint: &Pubkey) -> Option<u64> {
        if *mint == self.token0 {
            Some(self.reserve0)
        } else if *mint == self.token1 {
            Some(self.reserve1)
        } else {
            None
        }
    }
}

pub trait ExchangeRateOracle {
    fn get_pair(&self, token_a: &Pubkey, token_b: &Pubkey) -> Result<Pubkey>;
    fn get_reserves(&self, pair: &Pubkey) -> Result<PairReserves>;
    /// LP supply of `pair`.
    fn total_supply(&self, pair: &Pubkey) -> Result<u64>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddLiquidity {
    pub token_a: Pubkey,
    pub token_b: Pubkey,
    pub amount_a: u64,
    pub amount_b: u64,
    pub min_a: u64,
    pub min_b: u64,
    pub deadline: i64,
}

/// Trade executor. The recipient is always the calling strategy.
pub trait Exchange {
    /// Returns the amounts along `route`, last one being the output.
    fn swap(&mut self, amount_in: u64, min_out: u64, route: &[Pubkey], deadline: i64) -> Result<Vec<u64>>;
    /// Returns the LP amount minted.
    fn add_liquidity(&mut self, request: &AddLiquidity) -> Result<u64>;
}

pub trait FarmAdapter {
    fn deposit(&mut self, pool_id: u64, amount: u64) -> Result<()>;
    fn withdraw(&mut self, pool_id: u64, amount: u64) -> Result<()>;
    /// Collects pending rewards without moving the staked position.
    fn claim(&mut self, pool_id: u64) -> Result<()>;
    fn emergency_withdraw(&mut self, pool_id: u64) -> Result<()>;
    fn staked(&self, pool_id: u64) -> Result<u64>;
    fn pending_reward(&self, pool_id: u64, query: RewardQuery) -> Result<u64>;
}

/// Who a strategy grants token allowances to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Spender {
    Farm,
    Exchange,
}

/// Fungible balances held by one authority (a strategy or a competition).
pub trait AssetLedger {
    fn balance_of(&self, mint: &Pubkey) -> Result<u64>;
    /// `to` is the destination token account.
    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
    fn approve(&mut self, mint: &Pubkey, spender: Spender, amount: u64) -> Result<()>;
    fn revoke(&mut self, mint: &Pubkey) -> Result<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserTeam {
    pub team_id: u8,
    pub is_active: bool,
}

pub trait ProfileLedger {
    /// Users without a profile report an inactive, team-less profile.
    fn get_user_team(&self, user: &Pubkey) -> Result<UserTeam>;
    fn increase_points(&mut self, user: &Pubkey, amount: u64, campaign_id: u64) -> Result<()>;
}

pub trait CollectibleMinter {
    fn mint_collectible(&mut self, user: &Pubkey) -> Result<()>;
}

/// What a child reports to its parent at epoch end.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildReport {
    pub native_mint: Pubkey,
    pub principal_native: u64,
    pub rate_numerator: u64,
    pub rate_denominator: u64,
}

pub trait ChildReporter {
    fn report(&self, child: &Pubkey) -> Result<ChildReport>;
}
