use anchor_lang::prelude::*;

use crate::adapters::{AmmCpi, FarmCpi, ParentEnv, PdaSigner, PoolOracle, SplLedger};
use crate::constants::INITIAL_VERSION;
use crate::engine::child::{self, ChildSet};
use crate::engine::epoch::{self, StrategyBalance};
use crate::engine::guard;
use crate::engine::interfaces::Spender;
use crate::errors::VaultError;
use crate::events::Harvested;
use crate::state::{ChildStrategy, EpochState, ParentStrategy};
use crate::utils::{swap_deadline, AccountLayout, CompoundParams, InitParentArgs, PARENT_SEED};
use crate::{InitWorkingAccount, InitializeParent, ParentOperation, SetRoles, SettleChild, StartEpoch, VaultTransfer};

pub fn initialize(ctx: Context<InitializeParent>, args: InitParentArgs) -> Result<()> {
    let parent = &mut ctx.accounts.parent;

    parent.owner = ctx.accounts.owner.key();
    parent.manager = args.manager;
    parent.vault = args.vault;
    parent.bump = ctx.bumps.parent;

    parent.stake_mint = ctx.accounts.stake_mint.key();
    parent.reward_mint = ctx.accounts.reward_mint.key();
    parent.token0_mint = ctx.accounts.token0_mint.key();
    parent.token1_mint = ctx.accounts.token1_mint.key();
    parent.base_mint = ctx.accounts.base_mint.key();

    parent.farm_program = ctx.accounts.farm_program.key();
    parent.farm_pool_id = args.farm_pool_id;
    parent.farm_authority = ctx.accounts.farm_authority.key();
    parent.farm_user_info = ctx.accounts.farm_user_info.key();
    parent.exchange_program = ctx.accounts.exchange_program.key();
    parent.exchange_authority = ctx.accounts.exchange_authority.key();
    parent.reward_query = args.reward_query;

    parent.epoch = EpochState::Idle;
    parent.paused = false;
    parent.processing = false;
    parent.allowances_granted = false;
    parent.children = Vec::new();
    parent.total_fixed_return_lp = 0;
    parent.epochs_completed = 0;
    parent.last_harvest_slot = 0;
    parent.total_harvested = 0;
    parent.version = INITIAL_VERSION;

    msg!("parent strategy initialized for stake mint {}", parent.stake_mint);
    Ok(())
}

pub fn init_working_account(_ctx: Context<InitWorkingAccount>) -> Result<()> {
    Ok(())
}

pub fn set_roles(ctx: Context<SetRoles>, manager: Pubkey, vault: Pubkey) -> Result<()> {
    let owner = ctx.accounts.owner.key();
    epoch::set_roles(&mut ctx.accounts.parent, &owner, manager, vault)
}

/// Binds the collaborators named by `layout`, holds the reentrancy guard
/// around `f` and persists it before any CPI can run.
fn run<'info, R>(
    op: &mut ParentOperation<'info>,
    remaining: &'info [AccountInfo<'info>],
    layout: &AccountLayout,
    payees: &[AccountInfo<'info>],
    f: impl FnOnce(
        &mut ParentStrategy,
        &mut ParentEnv<'_, 'info>,
        &PoolOracle<'info, 'info>,
        &'info [AccountInfo<'info>],
    ) -> Result<R>,
) -> Result<R> {
    guard::enter(&mut op.parent.processing)?;
    op.parent.exit(&crate::ID)?;

    let segments = layout.split(remaining)?;
    let stake_mint = op.parent.stake_mint;
    let bump = [op.parent.bump];
    let signer = PdaSigner::new(op.parent.to_account_info(), &[PARENT_SEED, stake_mint.as_ref(), &bump]);

    let mut ledger = SplLedger::new(&signer, op.token_program.to_account_info(), segments.working)?
        .delegate(Spender::Farm, op.farm_authority.to_account_info())
        .delegate(Spender::Exchange, op.exchange_authority.to_account_info());
    for payee in payees {
        ledger = ledger.pay_to(payee.clone());
    }

    let mut env = ParentEnv {
        ledger,
        farm: FarmCpi::new(
            op.farm_program.to_account_info(),
            &op.parent.farm_user_info,
            segments.farm,
            &signer,
        )?,
        exchange: AmmCpi::new(
            op.exchange_program.to_account_info(),
            stake_mint,
            op.parent.token0_mint,
            op.parent.token1_mint,
            segments.swap0,
            segments.swap1,
            segments.liquidity,
            &signer,
        ),
    };
    let oracle = PoolOracle::new(op.parent.exchange_program, segments.pools);

    let out = f(&mut op.parent, &mut env, &oracle, segments.children)?;

    guard::leave(&mut op.parent.processing);
    Ok(out)
}

fn load_children<'info>(parent: Pubkey, infos: &'info [AccountInfo<'info>]) -> Result<ChildSet> {
    let mut set = ChildSet::new(parent);
    for info in infos {
        let child: Account<ChildStrategy> = Account::try_from(info)?;
        set.insert(info.key(), child.into_inner())?;
    }
    Ok(set)
}

// -------------------------
// Vault flows
// -------------------------

pub fn deposit<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let staked = run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::deposit(s, &caller, env)
    })?;

    msg!("deposit: staked {} lp", staked);
    Ok(())
}

pub fn withdraw<'info>(
    ctx: Context<'_, '_, 'info, 'info, VaultTransfer<'info>>,
    amount: u64,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.op.caller.key();
    let destination = ctx.accounts.destination.to_account_info();
    let to = destination.key();

    let paid = run(
        &mut ctx.accounts.op,
        ctx.remaining_accounts,
        &layout,
        &[destination],
        |s, env, _, _| epoch::withdraw(s, &caller, amount, &to, env),
    )?;

    msg!("withdraw: {} lp to vault", paid);
    Ok(())
}

pub fn retire_strat<'info>(
    ctx: Context<'_, '_, 'info, 'info, VaultTransfer<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.op.caller.key();
    let destination = ctx.accounts.destination.to_account_info();
    let to = destination.key();

    run(
        &mut ctx.accounts.op,
        ctx.remaining_accounts,
        &layout,
        &[destination],
        |s, env, _, _| epoch::retire(s, &caller, &to, env),
    )?;
    Ok(())
}

// -------------------------
// Epoch lifecycle
// -------------------------

/// Remaining accounts are the epoch's child strategies.
pub fn start_epoch<'info>(ctx: Context<'_, '_, 'info, 'info, StartEpoch<'info>>) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let parent_key = ctx.accounts.parent.key();

    let mut children = Vec::with_capacity(ctx.remaining_accounts.len());
    for info in ctx.remaining_accounts.iter() {
        let child: Account<ChildStrategy> = Account::try_from(info)?;
        require_keys_eq!(child.parent, parent_key, VaultError::ChildMismatch);
        children.push(info.key());
    }

    epoch::start_epoch(&mut ctx.accounts.parent, &caller, &children)
}

pub fn end_epoch<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let parent_key = ctx.accounts.parent.key();

    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, oracle, children| {
        let reports = load_children(parent_key, children)?;
        epoch::end_epoch(s, &caller, &*env, oracle, &reports)
    })?;
    Ok(())
}

pub fn settle_child<'info>(
    ctx: Context<'_, '_, 'info, 'info, SettleChild<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.op.caller.key();
    let child_key = ctx.accounts.child.key();
    let settlement = ctx.accounts.settlement_account.to_account_info();
    let to = settlement.key();

    let record = run(
        &mut ctx.accounts.op,
        ctx.remaining_accounts,
        &layout,
        &[settlement],
        |s, env, _, _| epoch::settle_child(s, &caller, &child_key, &to, env),
    )?;

    child::receive_settlement(&mut ctx.accounts.child, record.owed_lp)?;
    msg!("settled child {}: {} lp", child_key, record.owed_lp);
    Ok(())
}

// -------------------------
// Yield
// -------------------------

pub fn harvest<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    params: CompoundParams,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let clock = Clock::get()?;
    let deadline = swap_deadline(clock.unix_timestamp);

    let record = run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::harvest(s, &caller, &params, deadline, clock.slot, env)
    })?;

    if let Some(record) = record {
        emit!(Harvested {
            caller: record.caller,
            amount_harvested: record.amount_harvested,
            tvl_after: record.tvl_after,
        });
    }
    Ok(())
}

pub fn deploy_committed<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    mint: Pubkey,
    params: CompoundParams,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    let deadline = swap_deadline(Clock::get()?.unix_timestamp);

    let staked = run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::deploy_committed(s, &caller, &mint, &params, deadline, env)
    })?;

    msg!("deployed committed {}: staked {} lp", mint, staked);
    Ok(())
}

// -------------------------
// Views
// -------------------------

pub fn balance_of<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<StrategyBalance> {
    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::balance_of(s, &*env)
    })
}

pub fn rewards_available<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<u64> {
    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::rewards_available(s, &*env)
    })
}

// -------------------------
// Safety
// -------------------------

/// Grants farm/exchange allowances once every working account exists.
pub fn give_allowances<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    require!(ctx.accounts.parent.is_manager(&caller), VaultError::Unauthorized);
    require!(!ctx.accounts.parent.paused, VaultError::Paused);

    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::give_allowances(s, env)
    })
}

pub fn pause<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::pause(s, &caller, env)
    })
}

pub fn unpause<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::unpause(s, &caller, env)
    })?;
    Ok(())
}

pub fn panic<'info>(
    ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
    layout: AccountLayout,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    run(ctx.accounts, ctx.remaining_accounts, &layout, &[], |s, env, _, _| {
        epoch::panic(s, &caller, env)
    })
}
