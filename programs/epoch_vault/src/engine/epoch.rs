//! Parent strategy epoch engine.
//!
//! ```plain
//!            start_epoch(children)
//!   ┌──────┐ ───────────────────────► ┌─────────┐
//!   │ Idle │                          │ Running │
//!   └──────┘ ◄─────────────────────── └─────────┘
//!      │          end_epoch()
//!      │
//!      └── settle_child(child) until no record is left
//! ```
//!
//! Accounting identity, at every instruction boundary:
//!
//! `balance_of = balance_of_stake + balance_of_pool - total_fixed_return_lp`
//!
//! and `total_fixed_return_lp <= balance_of_stake + balance_of_pool`. Every
//! operation that moves stake tokens out re-checks it, so the strategy never
//! reports capital it owes to children as its own and never owes more than
//! it holds.

use anchor_lang::prelude::*;

use crate::constants::{MAX_CHILDREN, MIN_LIQUIDITY_AMOUNT};
use crate::engine::interfaces::{
    AddLiquidity, AssetLedger, ChildReporter, Exchange, ExchangeRateOracle, FarmAdapter, Spender,
};
use crate::engine::pricing::{self, PricingRoute};
use crate::errors::VaultError;
use crate::state::{ChildRecord, EpochState, ParentStrategy};
use crate::utils::CompoundParams;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyBalance {
    /// Idle stake tokens held by the strategy.
    pub stake: u64,
    /// Stake tokens deposited in the farm.
    pub pool: u64,
    /// Stake tokens owed to children.
    pub owed: u64,
    /// `stake + pool - owed`
    pub net: u64,
}

impl StrategyBalance {
    pub fn custody(&self) -> u64 {
        self.stake.saturating_add(self.pool)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HarvestRecord {
    pub caller: Pubkey,
    pub amount_harvested: u64,
    pub tvl_after: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochSummary {
    pub children_owed: usize,
    pub total_owed_lp: u64,
}

// -------------------------
// Views
// -------------------------

pub fn balance_of_stake<E: AssetLedger>(s: &ParentStrategy, env: &E) -> Result<u64> {
    env.balance_of(&s.stake_mint)
}

pub fn balance_of_pool<E: FarmAdapter>(s: &ParentStrategy, env: &E) -> Result<u64> {
    env.staked(s.farm_pool_id)
}

pub fn balance_of<E: AssetLedger + FarmAdapter>(s: &ParentStrategy, env: &E) -> Result<StrategyBalance> {
    let stake = balance_of_stake(s, env)?;
    let pool = balance_of_pool(s, env)?;
    let owed = s.total_fixed_return_lp;
    let custody = stake.checked_add(pool).ok_or(VaultError::MathOverflow)?;

    Ok(StrategyBalance {
        stake,
        pool,
        owed,
        // owed <= custody is enforced wherever custody shrinks
        net: custody.saturating_sub(owed),
    })
}

pub fn rewards_available<E: FarmAdapter>(s: &ParentStrategy, env: &E) -> Result<u64> {
    env.pending_reward(s.farm_pool_id, s.reward_query)
}

/// Public epoch API for children: is `child` part of the running epoch?
pub fn is_tracking(s: &ParentStrategy, child: &Pubkey) -> bool {
    s.epoch == EpochState::Running && s.record(child).is_some()
}

// -------------------------
// Vault flows
// -------------------------

pub fn deposit<E: AssetLedger + FarmAdapter>(s: &mut ParentStrategy, caller: &Pubkey, env: &mut E) -> Result<u64> {
    require_keys_eq!(*caller, s.vault, VaultError::Unauthorized);
    require!(!s.paused, VaultError::Paused);
    s.epoch.ensure_idle()?;

    stake_idle(s, env)
}

pub fn withdraw<E: AssetLedger + FarmAdapter>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    amount: u64,
    to: &Pubkey,
    env: &mut E,
) -> Result<u64> {
    require_keys_eq!(*caller, s.vault, VaultError::Unauthorized);
    s.epoch.ensure_idle()?;
    require!(amount > 0, VaultError::InvalidAmount);

    let balance = balance_of(s, env)?;
    require!(amount <= balance.net, VaultError::InsufficientBalance);

    if balance.stake < amount {
        env.withdraw(s.farm_pool_id, amount - balance.stake)?;
    }

    let idle = balance_of_stake(s, env)?;
    let out = amount.min(idle);
    env.transfer(&s.stake_mint, to, out)?;

    Ok(out)
}

// -------------------------
// Epoch lifecycle
// -------------------------

pub fn start_epoch(s: &mut ParentStrategy, caller: &Pubkey, children: &[Pubkey]) -> Result<()> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    let next = s.epoch.begin()?;
    require!(
        s.children.is_empty() && s.total_fixed_return_lp == 0,
        VaultError::SettlementPending
    );
    require!(children.len() <= MAX_CHILDREN, VaultError::TooManyChildren);
    for (i, child) in children.iter().enumerate() {
        require!(!children[..i].contains(child), VaultError::DuplicateChild);
    }

    s.children = children
        .iter()
        .map(|child| ChildRecord {
            child: *child,
            ..Default::default()
        })
        .collect();
    s.epoch = next;

    msg!("epoch started: {} children", children.len());
    Ok(())
}

/// Computes every child's fixed return and books the aggregate as owed.
/// Nothing is written until every child has been priced.
pub fn end_epoch<E, O, C>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    env: &E,
    oracle: &O,
    reports: &C,
) -> Result<EpochSummary>
where
    E: AssetLedger + FarmAdapter,
    O: ExchangeRateOracle,
    C: ChildReporter,
{
    require!(s.is_manager(caller), VaultError::Unauthorized);
    let next = s.epoch.finish()?;

    let route = PricingRoute::from(&*s);
    let mut owed_records = Vec::with_capacity(s.children.len());
    let mut total: u64 = 0;

    for record in s.children.iter() {
        let report = reports.report(&record.child)?;
        let principal = report.principal_native;
        let owed_native = pricing::fixed_return(principal, report.rate_numerator, report.rate_denominator)?;
        let accrued = owed_native - principal;
        let owed_lp = pricing::value_in_stake_token(oracle, &route, &report.native_mint, owed_native)?;

        total = total.checked_add(owed_lp).ok_or(VaultError::MathOverflow)?;

        // children that never committed are no longer tracked
        if principal > 0 {
            owed_records.push(ChildRecord {
                child: record.child,
                committed_principal_native: principal,
                fixed_return_native: accrued,
                owed_lp,
            });
        }
    }

    let balance = balance_of(s, env)?;
    require!(total <= balance.custody(), VaultError::InsufficientBalance);

    let summary = EpochSummary {
        children_owed: owed_records.len(),
        total_owed_lp: total,
    };

    s.children = owed_records;
    s.total_fixed_return_lp = total;
    s.epochs_completed = s.epochs_completed.checked_add(1).ok_or(VaultError::MathOverflow)?;
    s.epoch = next;

    msg!(
        "epoch ended: {} children owed {} lp",
        summary.children_owed,
        summary.total_owed_lp
    );
    Ok(summary)
}

/// Pays one child its owed stake tokens and drops its record.
pub fn settle_child<E: AssetLedger + FarmAdapter>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    child: &Pubkey,
    destination: &Pubkey,
    env: &mut E,
) -> Result<ChildRecord> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    s.epoch.ensure_idle()?;

    let idx = s
        .children
        .iter()
        .position(|r| r.child == *child)
        .ok_or(VaultError::ChildNotTracked)?;
    let record = s.children[idx];

    if record.owed_lp > 0 {
        let idle = balance_of_stake(s, env)?;
        if idle < record.owed_lp {
            env.withdraw(s.farm_pool_id, record.owed_lp - idle)?;
        }
        env.transfer(&s.stake_mint, destination, record.owed_lp)?;
    }

    s.total_fixed_return_lp = s
        .total_fixed_return_lp
        .checked_sub(record.owed_lp)
        .ok_or(VaultError::MathOverflow)?;
    s.children.remove(idx);

    Ok(record)
}

// -------------------------
// Compounding
// -------------------------

/// Claims farm rewards and compounds what the claim paid out. Slippage floors
/// come from the caller, so only the owner or manager may harvest.
pub fn harvest<E: AssetLedger + FarmAdapter + Exchange>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    params: &CompoundParams,
    deadline: i64,
    slot: u64,
    env: &mut E,
) -> Result<Option<HarvestRecord>> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    require!(!s.paused, VaultError::Paused);

    // the reward mint may also be a child's native asset
    let before = env.balance_of(&s.reward_mint)?;
    env.claim(s.farm_pool_id)?;
    let harvested = env.balance_of(&s.reward_mint)?.saturating_sub(before);
    if harvested == 0 {
        return Ok(None);
    }

    let reward_mint = s.reward_mint;
    compound(s, &reward_mint, harvested, params, deadline, env)?;
    stake_idle(s, env)?;

    s.last_harvest_slot = slot;
    s.total_harvested = s.total_harvested.saturating_add(harvested);

    let tvl_after = balance_of(s, env)?.net;
    Ok(Some(HarvestRecord {
        caller: *caller,
        amount_harvested: harvested,
        tvl_after,
    }))
}

/// Turns the strategy's holdings of a child's native asset into staked LP.
pub fn deploy_committed<E: AssetLedger + FarmAdapter + Exchange>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    mint: &Pubkey,
    params: &CompoundParams,
    deadline: i64,
    env: &mut E,
) -> Result<u64> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    require!(!s.paused, VaultError::Paused);

    if *mint != s.stake_mint {
        let amount = env.balance_of(mint)?;
        require!(amount > 0, VaultError::InsufficientBalance);
        compound(s, mint, amount, params, deadline, env)?;
    }

    stake_idle(s, env)
}

/// Splits `amount` of `input` across both constituents, keeping the half
/// whose constituent already is `input`, then adds liquidity with exactly
/// what the split produced.
fn compound<E: AssetLedger + Exchange>(
    s: &ParentStrategy,
    input: &Pubkey,
    amount: u64,
    params: &CompoundParams,
    deadline: i64,
    env: &mut E,
) -> Result<u64> {
    let half = amount / 2;
    let share = |mint: &Pubkey| if mint == input { amount - half } else { half };

    let amount0 = convert(env, input, &s.token0_mint, share(&s.token0_mint), params.min_out0, deadline)?;
    let amount1 = convert(env, input, &s.token1_mint, share(&s.token1_mint), params.min_out1, deadline)?;
    require!(amount0 > 0 && amount1 > 0, VaultError::InsufficientBalance);

    let before = balance_of_stake(s, env)?;
    env.add_liquidity(&AddLiquidity {
        token_a: s.token0_mint,
        token_b: s.token1_mint,
        amount_a: amount0,
        amount_b: amount1,
        min_a: MIN_LIQUIDITY_AMOUNT,
        min_b: MIN_LIQUIDITY_AMOUNT,
        deadline,
    })?;
    let minted = balance_of_stake(s, env)?.saturating_sub(before);
    require!(minted > 0, VaultError::InsufficientBalance);
    Ok(minted)
}

/// Swaps `amount` of `input` into `output` and returns what arrived.
fn convert<E: AssetLedger + Exchange>(
    env: &mut E,
    input: &Pubkey,
    output: &Pubkey,
    amount: u64,
    min_out: u64,
    deadline: i64,
) -> Result<u64> {
    if input == output || amount == 0 {
        return Ok(amount);
    }
    let before = env.balance_of(output)?;
    env.swap(amount, min_out, &[*input, *output], deadline)?;
    Ok(env.balance_of(output)?.saturating_sub(before))
}

fn stake_idle<E: AssetLedger + FarmAdapter>(s: &ParentStrategy, env: &mut E) -> Result<u64> {
    let idle = balance_of_stake(s, env)?;
    if idle > 0 {
        env.deposit(s.farm_pool_id, idle)?;
    }
    Ok(idle)
}

// -------------------------
// Emergency controls
// -------------------------

/// Mints the strategy touches and who may pull each of them.
fn allowance_targets(s: &ParentStrategy) -> Vec<(Pubkey, Spender)> {
    let mut targets = vec![(s.stake_mint, Spender::Farm)];
    for mint in [s.reward_mint, s.token0_mint, s.token1_mint] {
        if !targets.iter().any(|(m, _)| *m == mint) {
            targets.push((mint, Spender::Exchange));
        }
    }
    targets
}

pub fn give_allowances<E: AssetLedger>(s: &mut ParentStrategy, env: &mut E) -> Result<()> {
    for (mint, spender) in allowance_targets(s) {
        env.approve(&mint, spender, u64::MAX)?;
    }
    s.allowances_granted = true;
    Ok(())
}

pub fn remove_allowances<E: AssetLedger>(s: &mut ParentStrategy, env: &mut E) -> Result<()> {
    for (mint, _) in allowance_targets(s) {
        env.revoke(&mint)?;
    }
    s.allowances_granted = false;
    Ok(())
}

pub fn pause<E: AssetLedger>(s: &mut ParentStrategy, caller: &Pubkey, env: &mut E) -> Result<()> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    s.paused = true;
    remove_allowances(s, env)?;
    msg!("strategy paused");
    Ok(())
}

pub fn unpause<E: AssetLedger + FarmAdapter>(s: &mut ParentStrategy, caller: &Pubkey, env: &mut E) -> Result<u64> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    s.paused = false;
    give_allowances(s, env)?;
    msg!("strategy unpaused");
    stake_idle(s, env)
}

/// Pause plus emergency unstake. Funds stay idle in the strategy.
pub fn panic<E: AssetLedger + FarmAdapter>(s: &mut ParentStrategy, caller: &Pubkey, env: &mut E) -> Result<()> {
    require!(s.is_manager(caller), VaultError::Unauthorized);
    env.emergency_withdraw(s.farm_pool_id)?;
    s.paused = true;
    remove_allowances(s, env)?;
    msg!("strategy panicked");
    Ok(())
}

/// Emergency unstake and hand every stake token to the vault.
pub fn retire<E: AssetLedger + FarmAdapter>(
    s: &mut ParentStrategy,
    caller: &Pubkey,
    vault_account: &Pubkey,
    env: &mut E,
) -> Result<u64> {
    require_keys_eq!(*caller, s.vault, VaultError::Unauthorized);
    s.epoch.ensure_idle()?;
    require!(
        s.children.is_empty() && s.total_fixed_return_lp == 0,
        VaultError::SettlementPending
    );

    env.emergency_withdraw(s.farm_pool_id)?;
    let amount = balance_of_stake(s, env)?;
    if amount > 0 {
        env.transfer(&s.stake_mint, vault_account, amount)?;
    }

    msg!("strategy retired: {} lp to vault", amount);
    Ok(amount)
}

pub fn set_roles(s: &mut ParentStrategy, caller: &Pubkey, manager: Pubkey, vault: Pubkey) -> Result<()> {
    require_keys_eq!(*caller, s.owner, VaultError::Unauthorized);
    s.manager = manager;
    s.vault = vault;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::*;
    use proptest::prelude::*;

    const PARAMS: CompoundParams = CompoundParams { min_out0: 0, min_out1: 0 };

    struct Setup {
        s: ParentStrategy,
        chain: MockChain,
        oracle: MockOracle,
        reporter: MockReporter,
        native: Pubkey,
    }

    fn setup(staked: u64) -> Setup {
        let s = parent_strategy();
        let native = Pubkey::new_unique();
        let mut chain = MockChain::for_parent(&s);
        chain.staked = staked;
        let oracle = market_for(&s, native);
        Setup {
            s,
            chain,
            oracle,
            reporter: MockReporter::default(),
            native,
        }
    }

    fn net(t: &Setup) -> u64 {
        balance_of(&t.s, &t.chain).unwrap().net
    }

    #[test]
    fn deposit_stakes_all_idle_stake_tokens() {
        let mut t = setup(0);
        let stake = t.s.stake_mint;
        t.chain.credit(&stake, 500);
        let vault = t.s.vault;

        assert_eq!(deposit(&mut t.s, &vault, &mut t.chain).unwrap(), 500);
        assert_eq!(t.chain.staked, 500);
        assert_eq!(t.chain.balance(&stake), 0);
        assert_eq!(net(&t), 500);
    }

    #[test]
    fn deposit_requires_the_vault() {
        let mut t = setup(0);
        let manager = t.s.manager;
        assert_vault_err(deposit(&mut t.s, &manager, &mut t.chain), VaultError::Unauthorized);
    }

    #[test]
    fn deposit_is_blocked_while_running_and_reopens_after_end() {
        let mut t = setup(1_000);
        let (manager, vault) = (t.s.manager, t.s.vault);
        let child = Pubkey::new_unique();
        t.reporter.set(child, t.native, 0, 5, 1000);

        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        assert_vault_err(deposit(&mut t.s, &vault, &mut t.chain), VaultError::EpochInProgress);
        assert_vault_err(
            withdraw(&mut t.s, &vault, 10, &Pubkey::new_unique(), &mut t.chain),
            VaultError::EpochInProgress,
        );

        end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();
        assert_eq!(t.s.epoch, EpochState::Idle);
        deposit(&mut t.s, &vault, &mut t.chain).unwrap();
    }

    #[test]
    fn withdraw_unstakes_only_the_shortfall() {
        let mut t = setup(1_000);
        let stake = t.s.stake_mint;
        t.chain.credit(&stake, 100);
        let vault = t.s.vault;
        let to = Pubkey::new_unique();

        assert_eq!(withdraw(&mut t.s, &vault, 300, &to, &mut t.chain).unwrap(), 300);
        assert_eq!(t.chain.staked, 800);
        assert_eq!(t.chain.balance(&stake), 0);
        assert_eq!(t.chain.transfers, vec![(stake, to, 300)]);
    }

    #[test]
    fn start_epoch_rejects_a_second_start() {
        let mut t = setup(0);
        let manager = t.s.manager;
        start_epoch(&mut t.s, &manager, &[Pubkey::new_unique()]).unwrap();
        assert_vault_err(
            start_epoch(&mut t.s, &manager, &[Pubkey::new_unique()]),
            VaultError::EpochAlreadyRunning,
        );
    }

    #[test]
    fn start_epoch_validates_caller_and_child_set() {
        let mut t = setup(0);
        let (manager, vault) = (t.s.manager, t.s.vault);
        let a = Pubkey::new_unique();

        assert_vault_err(start_epoch(&mut t.s, &vault, &[a]), VaultError::Unauthorized);
        assert_vault_err(start_epoch(&mut t.s, &manager, &[a, a]), VaultError::DuplicateChild);

        let many: Vec<Pubkey> = (0..=MAX_CHILDREN).map(|_| Pubkey::new_unique()).collect();
        assert_vault_err(start_epoch(&mut t.s, &manager, &many), VaultError::TooManyChildren);

        assert_eq!(t.s.epoch, EpochState::Idle);
        assert!(t.s.children.is_empty());

        // the owner holds the manager capability too
        let owner = t.s.owner;
        start_epoch(&mut t.s, &owner, &[a]).unwrap();
        assert!(is_tracking(&t.s, &a));
    }

    #[test]
    fn end_epoch_requires_a_running_epoch() {
        let mut t = setup(0);
        let manager = t.s.manager;
        assert_vault_err(
            end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter),
            VaultError::EpochNotRunning,
        );
    }

    #[test]
    fn round_trip_without_commitments_leaves_balance_untouched() {
        let mut t = setup(10 * E18);
        let manager = t.s.manager;
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        t.reporter.set(a, t.native, 0, 0, 1);
        t.reporter.set(b, t.s.token1_mint, 0, 0, 1);
        let before = net(&t);

        start_epoch(&mut t.s, &manager, &[a, b]).unwrap();
        assert_eq!(net(&t), before);
        let summary = end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();

        assert_eq!(summary.total_owed_lp, 0);
        assert_eq!(net(&t), before);
        assert!(t.s.children.is_empty());
        assert_eq!(t.s.epochs_completed, 1);
    }

    #[test]
    fn fixed_return_is_booked_against_reported_balance() {
        let mut t = setup(10 * E18);
        let manager = t.s.manager;
        let child = Pubkey::new_unique();
        let before = net(&t);

        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        // child committed 1e18 native at 5/1000
        t.reporter.set(child, t.native, E18, 5, 1000);
        end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();

        let route = PricingRoute::from(&t.s);
        let expected = pricing::value_in_stake_token(&t.oracle, &route, &t.native, E18 + E18 * 5 / 1000).unwrap();
        assert_eq!(expected, 2_093_750_000_000_000);
        assert_eq!(before - net(&t), expected);

        let record = t.s.record(&child).copied().unwrap();
        assert_eq!(record.committed_principal_native, E18);
        assert_eq!(record.fixed_return_native, 5 * E18 / 1000);
        assert_eq!(record.owed_lp, expected);
    }

    #[test]
    fn pricing_failure_leaves_the_epoch_running_and_untouched() {
        let mut t = setup(10 * E18);
        let manager = t.s.manager;
        let (good, bad) = (Pubkey::new_unique(), Pubkey::new_unique());
        start_epoch(&mut t.s, &manager, &[good, bad]).unwrap();
        t.reporter.set(good, t.native, E18, 5, 1000);
        t.reporter.set(bad, Pubkey::new_unique(), E18, 5, 1000);
        let snapshot = t.s.clone();

        assert_vault_err(
            end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter),
            VaultError::PricingUnavailable,
        );
        assert_eq!(t.s, snapshot);
        assert_eq!(t.s.epoch, EpochState::Running);
    }

    #[test]
    fn empty_pool_is_pricing_unavailable() {
        let mut t = setup(10 * E18);
        let manager = t.s.manager;
        let child = Pubkey::new_unique();
        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        t.reporter.set(child, t.native, E18, 5, 1000);
        let base = t.s.base_mint;
        let native = t.native;
        t.oracle.set_reserves(&native, &base, 0, 0);

        assert_vault_err(
            end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter),
            VaultError::PricingUnavailable,
        );
        assert_eq!(t.s.total_fixed_return_lp, 0);
    }

    #[test]
    fn claims_may_not_exceed_custody() {
        let mut t = setup(1_000);
        let manager = t.s.manager;
        let child = Pubkey::new_unique();
        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        t.reporter.set(child, t.native, E18, 5, 1000);

        assert_vault_err(
            end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter),
            VaultError::InsufficientBalance,
        );
        assert_eq!(t.s.epoch, EpochState::Running);
    }

    #[test]
    fn withdraw_cannot_reach_into_owed_stake_tokens() {
        let mut t = setup(10 * E18);
        let (manager, vault) = (t.s.manager, t.s.vault);
        let child = Pubkey::new_unique();
        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        t.reporter.set(child, t.native, E18, 5, 1000);
        end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();

        let available = net(&t);
        let to = Pubkey::new_unique();
        assert_vault_err(
            withdraw(&mut t.s, &vault, available + 1, &to, &mut t.chain),
            VaultError::InsufficientBalance,
        );
        withdraw(&mut t.s, &vault, available, &to, &mut t.chain).unwrap();
        assert_eq!(net(&t), 0);
        assert_eq!(t.chain.staked, t.s.total_fixed_return_lp);
    }

    #[test]
    fn settlement_pays_the_child_and_unblocks_the_next_epoch() {
        let mut t = setup(10 * E18);
        let manager = t.s.manager;
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        start_epoch(&mut t.s, &manager, &[a, b]).unwrap();
        t.reporter.set(a, t.native, E18, 5, 1000);
        t.reporter.set(b, t.s.token1_mint, 2 * E18, 0, 1);
        end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();
        let before = net(&t);

        assert_vault_err(start_epoch(&mut t.s, &manager, &[a]), VaultError::SettlementPending);

        let dest = Pubkey::new_unique();
        let paid = settle_child(&mut t.s, &manager, &a, &dest, &mut t.chain).unwrap();
        assert_eq!(paid.owed_lp, 2_093_750_000_000_000);
        assert_eq!(t.chain.transfers, vec![(t.s.stake_mint, dest, paid.owed_lp)]);
        assert_eq!(net(&t), before);
        assert_vault_err(
            settle_child(&mut t.s, &manager, &a, &dest, &mut t.chain),
            VaultError::ChildNotTracked,
        );

        settle_child(&mut t.s, &manager, &b, &dest, &mut t.chain).unwrap();
        assert_eq!(t.s.total_fixed_return_lp, 0);
        assert!(t.s.children.is_empty());
        start_epoch(&mut t.s, &manager, &[a]).unwrap();
    }

    #[test]
    fn harvest_compounds_rewards_into_the_farm() {
        let mut t = setup(1_000);
        t.chain.pending = 400;
        let caller = t.s.manager;

        let record = harvest(&mut t.s, &caller, &PARAMS, 0, 42, &mut t.chain).unwrap().unwrap();

        assert_eq!(record.caller, caller);
        assert_eq!(record.amount_harvested, 400);
        // 200 + 200 constituents mint 200 lp in the mock pool
        assert_eq!(t.chain.staked, 1_200);
        assert_eq!(record.tvl_after, 1_200);
        assert_eq!(t.chain.swaps.len(), 2);
        assert_eq!(t.chain.liquidity_adds, 1);
        assert_eq!(t.s.last_harvest_slot, 42);
    }

    #[test]
    fn harvest_without_rewards_is_a_no_op() {
        let mut t = setup(1_000);
        t.chain.pending = 400;
        let caller = t.s.manager;
        harvest(&mut t.s, &caller, &PARAMS, 0, 1, &mut t.chain).unwrap();
        let staked = t.chain.staked;
        let snapshot = t.s.clone();

        assert_eq!(harvest(&mut t.s, &caller, &PARAMS, 0, 2, &mut t.chain).unwrap(), None);
        assert_eq!(t.chain.staked, staked);
        assert_eq!(t.chain.swaps.len(), 2);
        assert_eq!(t.s, snapshot);
    }

    #[test]
    fn harvest_skips_the_leg_already_in_reward_asset() {
        let mut t = setup(1_000);
        t.s.reward_mint = t.s.token1_mint;
        t.chain.reward_mint = t.s.token1_mint;
        t.chain.pending = 400;
        let manager = t.s.manager;

        harvest(&mut t.s, &manager, &PARAMS, 0, 1, &mut t.chain).unwrap();

        assert_eq!(t.chain.swaps.len(), 1);
        assert_eq!(t.chain.swaps[0].1, vec![t.s.token1_mint, t.s.token0_mint]);
        assert_eq!(t.chain.staked, 1_200);
    }

    #[test]
    fn harvest_is_keeper_only() {
        let mut t = setup(1_000);
        t.chain.pending = 400;
        let stranger = Pubkey::new_unique();
        let loose = CompoundParams { min_out0: 0, min_out1: 0 };

        assert_vault_err(
            harvest(&mut t.s, &stranger, &loose, 0, 1, &mut t.chain),
            VaultError::Unauthorized,
        );
        assert_eq!(t.chain.claims, 0);
        assert_eq!(t.chain.staked, 1_000);

        let owner = t.s.owner;
        assert!(harvest(&mut t.s, &owner, &PARAMS, 0, 1, &mut t.chain).unwrap().is_some());
    }

    #[test]
    fn harvest_leaves_committed_principal_in_the_reward_asset_alone() {
        let mut t = setup(1_000);
        let manager = t.s.manager;
        let reward = t.s.reward_mint;
        // a child whose native asset is the reward token committed 10_000
        t.chain.credit(&reward, 10_000);

        assert_eq!(harvest(&mut t.s, &manager, &PARAMS, 0, 1, &mut t.chain).unwrap(), None);
        assert_eq!(t.s.total_harvested, 0);
        assert_eq!(t.chain.balance(&reward), 10_000);
        assert!(t.chain.swaps.is_empty());

        t.chain.pending = 400;
        let record = harvest(&mut t.s, &manager, &PARAMS, 0, 2, &mut t.chain).unwrap().unwrap();
        assert_eq!(record.amount_harvested, 400);
        assert_eq!(t.s.total_harvested, 400);
        assert_eq!(t.chain.balance(&reward), 10_000);
        assert_eq!(t.chain.staked, 1_200);
    }

    #[test]
    fn harvest_pairs_only_swap_proceeds_with_liquidity() {
        let mut t = setup(1_000);
        let manager = t.s.manager;
        let (token0, token1) = (t.s.token0_mint, t.s.token1_mint);
        // committed principal sitting in both constituents
        t.chain.credit(&token0, 3_000);
        t.chain.credit(&token1, 5_000);
        t.chain.pending = 400;

        harvest(&mut t.s, &manager, &PARAMS, 0, 1, &mut t.chain).unwrap();

        assert_eq!(t.chain.liquidity_adds, 1);
        assert_eq!(t.chain.staked, 1_200);
        assert_eq!(t.chain.balance(&token0), 3_000);
        assert_eq!(t.chain.balance(&token1), 5_000);
    }

    #[test]
    fn harvest_is_refused_while_paused() {
        let mut t = setup(1_000);
        let manager = t.s.manager;
        pause(&mut t.s, &manager, &mut t.chain).unwrap();
        assert_vault_err(
            harvest(&mut t.s, &manager, &PARAMS, 0, 1, &mut t.chain),
            VaultError::Paused,
        );
        let vault = t.s.vault;
        assert_vault_err(deposit(&mut t.s, &vault, &mut t.chain), VaultError::Paused);
    }

    #[test]
    fn pause_revokes_and_unpause_restores_allowances() {
        let mut t = setup(0);
        let manager = t.s.manager;
        give_allowances(&mut t.s, &mut t.chain).unwrap();
        assert_eq!(t.chain.allowances.len(), 4);
        assert_eq!(t.chain.allowances[&t.s.stake_mint], Spender::Farm);

        pause(&mut t.s, &manager, &mut t.chain).unwrap();
        assert!(t.chain.allowances.is_empty());
        assert!(!t.s.allowances_granted);

        let stake = t.s.stake_mint;
        t.chain.credit(&stake, 70);
        assert_eq!(unpause(&mut t.s, &manager, &mut t.chain).unwrap(), 70);
        assert_eq!(t.chain.allowances.len(), 4);
        assert_eq!(t.chain.staked, 70);
        assert!(!t.s.paused);
    }

    #[test]
    fn panic_unstakes_and_leaves_funds_idle() {
        let mut t = setup(900);
        let manager = t.s.manager;
        panic(&mut t.s, &manager, &mut t.chain).unwrap();

        assert!(t.s.paused);
        assert_eq!(t.chain.staked, 0);
        assert_eq!(t.chain.balance(&t.s.stake_mint), 900);
        assert!(t.chain.transfers.is_empty());
        assert_eq!(net(&t), 900);
    }

    #[test]
    fn retire_forwards_everything_to_the_vault() {
        let mut t = setup(900);
        let stake = t.s.stake_mint;
        t.chain.credit(&stake, 100);
        let (manager, vault) = (t.s.manager, t.s.vault);
        let vault_account = Pubkey::new_unique();

        assert_vault_err(
            retire(&mut t.s, &manager, &vault_account, &mut t.chain),
            VaultError::Unauthorized,
        );
        assert_eq!(retire(&mut t.s, &vault, &vault_account, &mut t.chain).unwrap(), 1_000);
        assert_eq!(t.chain.transfers, vec![(stake, vault_account, 1_000)]);
        assert_eq!(net(&t), 0);
    }

    #[test]
    fn retire_waits_for_settlements() {
        let mut t = setup(10 * E18);
        let (manager, vault) = (t.s.manager, t.s.vault);
        let child = Pubkey::new_unique();
        start_epoch(&mut t.s, &manager, &[child]).unwrap();
        t.reporter.set(child, t.native, E18, 0, 1);
        end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).unwrap();

        assert_vault_err(
            retire(&mut t.s, &vault, &Pubkey::new_unique(), &mut t.chain),
            VaultError::SettlementPending,
        );
    }

    #[test]
    fn deploy_committed_turns_native_holdings_into_stake() {
        let mut t = setup(0);
        let manager = t.s.manager;
        let native = t.native;
        t.chain.credit(&native, 1_000);

        let staked = deploy_committed(&mut t.s, &manager, &native, &PARAMS, 0, &mut t.chain).unwrap();
        assert_eq!(staked, 500);
        assert_eq!(t.chain.staked, 500);
        assert_eq!(t.chain.balance(&native), 0);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Deposit(u64),
        Accrue(u64),
        Harvest,
        Withdraw(u64),
        Epoch { principal: u64, num: u64 },
        Settle,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..1_000_000).prop_map(Op::Deposit),
            (0u64..10_000).prop_map(Op::Accrue),
            Just(Op::Harvest),
            (1u64..1_000_000).prop_map(Op::Withdraw),
            ((0u64..1_000_000_000_000), (0u64..50)).prop_map(|(principal, num)| Op::Epoch { principal, num }),
            Just(Op::Settle),
        ]
    }

    proptest! {
        #[test]
        fn balance_identity_holds_for_any_sequence(ops in proptest::collection::vec(op(), 1..40)) {
            let mut t = setup(E18);
            let (manager, vault) = (t.s.manager, t.s.vault);
            let child = Pubkey::new_unique();
            let dest = Pubkey::new_unique();

            for op in ops {
                // failures are allowed; they must not break the identity
                let _ = match op {
                    Op::Deposit(amount) => {
                        let stake = t.s.stake_mint;
                        t.chain.credit(&stake, amount);
                        deposit(&mut t.s, &vault, &mut t.chain).map(|_| ())
                    }
                    Op::Accrue(amount) => {
                        t.chain.pending += amount;
                        Ok(())
                    }
                    Op::Harvest => harvest(&mut t.s, &manager, &PARAMS, 0, 0, &mut t.chain).map(|_| ()),
                    Op::Withdraw(amount) => withdraw(&mut t.s, &vault, amount, &dest, &mut t.chain).map(|_| ()),
                    Op::Epoch { principal, num } => {
                        t.reporter.set(child, t.native, principal, num, 1000);
                        start_epoch(&mut t.s, &manager, &[child])
                            .and_then(|_| end_epoch(&mut t.s, &manager, &t.chain, &t.oracle, &t.reporter).map(|_| ()))
                    }
                    Op::Settle => settle_child(&mut t.s, &manager, &child, &dest, &mut t.chain).map(|_| ()),
                };

                let b = balance_of(&t.s, &t.chain).unwrap();
                prop_assert!(b.owed <= b.stake + b.pool);
                prop_assert_eq!(b.net, b.stake + b.pool - b.owed);
                prop_assert_eq!(b.owed, t.s.children.iter().map(|r| r.owed_lp).sum::<u64>());
            }
        }
    }
}
