//! In-memory collaborators for engine tests.

use std::collections::HashMap;

use anchor_lang::prelude::*;

use crate::engine::interfaces::*;
use crate::errors::VaultError;
use crate::state::{EpochState, ParentStrategy, RewardQuery};

pub const E18: u64 = 1_000_000_000_000_000_000;

pub fn assert_vault_err<T: std::fmt::Debug>(res: Result<T>, expected: VaultError) {
    match res {
        Err(anchor_lang::error::Error::AnchorError(e)) => assert_eq!(
            e.error_code_number,
            u32::from(expected),
            "expected {:?}, got {}",
            expected,
            e.error_name
        ),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

// -------------------------
// Oracle
// -------------------------

#[derive(Default)]
pub struct MockOracle {
    pairs: Vec<(Pubkey, PairReserves, u64)>,
}

impl MockOracle {
    pub fn add_pair(&mut self, token0: Pubkey, token1: Pubkey, reserve0: u64, reserve1: u64, supply: u64) -> Pubkey {
        let id = Pubkey::new_unique();
        self.pairs.push((
            id,
            PairReserves {
                reserve0,
                reserve1,
                token0,
                token1,
            },
            supply,
        ));
        id
    }

    fn find_mut(&mut self, a: &Pubkey, b: &Pubkey) -> &mut (Pubkey, PairReserves, u64) {
        self.pairs
            .iter_mut()
            .find(|(_, r, _)| (r.token0 == *a && r.token1 == *b) || (r.token0 == *b && r.token1 == *a))
            .expect("pair registered")
    }

    pub fn set_supply(&mut self, a: &Pubkey, b: &Pubkey, supply: u64) {
        self.find_mut(a, b).2 = supply;
    }

    pub fn set_reserves(&mut self, a: &Pubkey, b: &Pubkey, reserve0: u64, reserve1: u64) {
        let pair = self.find_mut(a, b);
        pair.1.reserve0 = reserve0;
        pair.1.reserve1 = reserve1;
    }
}

impl ExchangeRateOracle for MockOracle {
    fn get_pair(&self, token_a: &Pubkey, token_b: &Pubkey) -> Result<Pubkey> {
        self.pairs
            .iter()
            .find(|(_, r, _)| {
                (r.token0 == *token_a && r.token1 == *token_b) || (r.token0 == *token_b && r.token1 == *token_a)
            })
            .map(|(id, _, _)| *id)
            .ok_or_else(|| error!(VaultError::PricingUnavailable))
    }

    fn get_reserves(&self, pair: &Pubkey) -> Result<PairReserves> {
        self.pairs
            .iter()
            .find(|(id, _, _)| id == pair)
            .map(|(_, r, _)| *r)
            .ok_or_else(|| error!(VaultError::PricingUnavailable))
    }

    fn total_supply(&self, pair: &Pubkey) -> Result<u64> {
        self.pairs
            .iter()
            .find(|(id, _, _)| id == pair)
            .map(|(_, _, s)| *s)
            .ok_or_else(|| error!(VaultError::PricingUnavailable))
    }
}

// -------------------------
// Chain: ledger + farm + exchange + profiles
// -------------------------

/// One authority's view of the world: token balances, one farm position,
/// a 1:1 exchange and the profile ledger.
#[derive(Default)]
pub struct MockChain {
    pub stake_mint: Pubkey,
    pub reward_mint: Pubkey,
    pub balances: HashMap<Pubkey, u64>,
    pub staked: u64,
    /// rewards accrued in the farm, paid on `claim`
    pub pending: u64,
    pub allowances: HashMap<Pubkey, Spender>,
    pub transfers: Vec<(Pubkey, Pubkey, u64)>,
    pub swaps: Vec<(u64, Vec<Pubkey>)>,
    pub liquidity_adds: u32,
    pub claims: u32,

    pub teams: HashMap<Pubkey, UserTeam>,
    pub points: Vec<(Pubkey, u64, u64)>,
    pub collectibles: Vec<Pubkey>,
}

impl MockChain {
    pub fn for_parent(s: &ParentStrategy) -> Self {
        Self {
            stake_mint: s.stake_mint,
            reward_mint: s.reward_mint,
            ..Default::default()
        }
    }

    pub fn balance(&self, mint: &Pubkey) -> u64 {
        self.balances.get(mint).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, mint: &Pubkey, amount: u64) {
        *self.balances.entry(*mint).or_insert(0) += amount;
    }

    fn debit(&mut self, mint: &Pubkey, amount: u64) -> Result<()> {
        let bal = self.balances.entry(*mint).or_insert(0);
        require!(*bal >= amount, VaultError::InsufficientBalance);
        *bal -= amount;
        Ok(())
    }
}

impl AssetLedger for MockChain {
    fn balance_of(&self, mint: &Pubkey) -> Result<u64> {
        Ok(self.balance(mint))
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        self.debit(mint, amount)?;
        self.transfers.push((*mint, *to, amount));
        Ok(())
    }

    fn approve(&mut self, mint: &Pubkey, spender: Spender, _amount: u64) -> Result<()> {
        self.allowances.insert(*mint, spender);
        Ok(())
    }

    fn revoke(&mut self, mint: &Pubkey) -> Result<()> {
        self.allowances.remove(mint);
        Ok(())
    }
}

impl FarmAdapter for MockChain {
    fn deposit(&mut self, _pool_id: u64, amount: u64) -> Result<()> {
        let stake = self.stake_mint;
        self.debit(&stake, amount)?;
        self.staked += amount;
        Ok(())
    }

    fn withdraw(&mut self, _pool_id: u64, amount: u64) -> Result<()> {
        require!(self.staked >= amount, VaultError::InsufficientBalance);
        self.staked -= amount;
        let stake = self.stake_mint;
        self.credit(&stake, amount);
        Ok(())
    }

    fn claim(&mut self, _pool_id: u64) -> Result<()> {
        self.claims += 1;
        let reward = self.reward_mint;
        let pending = std::mem::take(&mut self.pending);
        self.credit(&reward, pending);
        Ok(())
    }

    fn emergency_withdraw(&mut self, _pool_id: u64) -> Result<()> {
        let amount = std::mem::take(&mut self.staked);
        let stake = self.stake_mint;
        self.credit(&stake, amount);
        Ok(())
    }

    fn staked(&self, _pool_id: u64) -> Result<u64> {
        Ok(self.staked)
    }

    fn pending_reward(&self, _pool_id: u64, _query: RewardQuery) -> Result<u64> {
        Ok(self.pending)
    }
}

impl Exchange for MockChain {
    fn swap(&mut self, amount_in: u64, min_out: u64, route: &[Pubkey], _deadline: i64) -> Result<Vec<u64>> {
        require!(route.len() >= 2, VaultError::InvalidRoute);
        require!(amount_in >= min_out, VaultError::InsufficientBalance);
        self.debit(&route[0], amount_in)?;
        self.credit(&route[route.len() - 1], amount_in);
        self.swaps.push((amount_in, route.to_vec()));
        Ok(vec![amount_in; route.len()])
    }

    fn add_liquidity(&mut self, request: &AddLiquidity) -> Result<u64> {
        self.debit(&request.token_a, request.amount_a)?;
        self.debit(&request.token_b, request.amount_b)?;
        let minted = (request.amount_a + request.amount_b) / 2;
        let stake = self.stake_mint;
        self.credit(&stake, minted);
        self.liquidity_adds += 1;
        Ok(minted)
    }
}

impl ProfileLedger for MockChain {
    fn get_user_team(&self, user: &Pubkey) -> Result<UserTeam> {
        Ok(self.teams.get(user).copied().unwrap_or_default())
    }

    fn increase_points(&mut self, user: &Pubkey, amount: u64, campaign_id: u64) -> Result<()> {
        self.points.push((*user, amount, campaign_id));
        Ok(())
    }
}

impl CollectibleMinter for MockChain {
    fn mint_collectible(&mut self, user: &Pubkey) -> Result<()> {
        self.collectibles.push(*user);
        Ok(())
    }
}

// -------------------------
// Children
// -------------------------

#[derive(Default)]
pub struct MockReporter {
    pub reports: HashMap<Pubkey, ChildReport>,
}

impl MockReporter {
    pub fn set(&mut self, child: Pubkey, native_mint: Pubkey, principal: u64, numerator: u64, denominator: u64) {
        self.reports.insert(
            child,
            ChildReport {
                native_mint,
                principal_native: principal,
                rate_numerator: numerator,
                rate_denominator: denominator,
            },
        );
    }
}

impl ChildReporter for MockReporter {
    fn report(&self, child: &Pubkey) -> Result<ChildReport> {
        self.reports
            .get(child)
            .copied()
            .ok_or_else(|| error!(VaultError::ChildMismatch))
    }
}

// -------------------------
// Fixtures
// -------------------------

/// Parent over a base/quote LP. `token0` is also the pricing base.
pub fn parent_strategy() -> ParentStrategy {
    let base = Pubkey::new_unique();
    ParentStrategy {
        owner: Pubkey::new_unique(),
        manager: Pubkey::new_unique(),
        vault: Pubkey::new_unique(),
        bump: 255,
        stake_mint: Pubkey::new_unique(),
        reward_mint: Pubkey::new_unique(),
        token0_mint: base,
        token1_mint: Pubkey::new_unique(),
        base_mint: base,
        farm_program: Pubkey::new_unique(),
        farm_pool_id: 3,
        farm_authority: Pubkey::new_unique(),
        farm_user_info: Pubkey::new_unique(),
        exchange_program: Pubkey::new_unique(),
        exchange_authority: Pubkey::new_unique(),
        reward_query: RewardQuery::PendingCake,
        epoch: EpochState::Idle,
        paused: false,
        processing: false,
        allowances_granted: true,
        children: Vec::new(),
        total_fixed_return_lp: 0,
        epochs_completed: 0,
        last_harvest_slot: 0,
        total_harvested: 0,
        version: 1,
    }
}

/// Stake pair 4e18 base / 8e18 quote with 5e18 LP, plus a native/base pair
/// pricing `native` at 1/300 base.
pub fn market_for(s: &ParentStrategy, native: Pubkey) -> MockOracle {
    let mut oracle = MockOracle::default();
    oracle.add_pair(s.token0_mint, s.token1_mint, 4 * E18, 8 * E18, 5 * E18);
    oracle.add_pair(native, s.base_mint, 6 * E18, 2 * E18 / 100, 1);
    oracle
}
