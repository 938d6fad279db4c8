use anchor_lang::prelude::*;
use anchor_spl::token::{self, Transfer};

use crate::constants::INITIAL_VERSION;
use crate::engine::child;
use crate::engine::interfaces::ChildReport;
use crate::utils::CHILD_SEED;
use crate::{ChildDeposit, ChildView, ChildWithdraw, CommitToEpoch, InitializeChild, SetChildRate};

pub fn initialize_child(
    ctx: Context<InitializeChild>,
    vault: Pubkey,
    rate_numerator: u64,
    rate_denominator: u64,
) -> Result<()> {
    child::validate_rate(rate_denominator)?;

    let c = &mut ctx.accounts.child;
    c.parent = ctx.accounts.parent.key();
    c.native_mint = ctx.accounts.native_mint.key();
    c.manager = ctx.accounts.manager.key();
    c.vault = vault;
    c.bump = ctx.bumps.child;

    c.token_account = ctx.accounts.custody.key();
    c.settlement_account = ctx.accounts.settlement.key();

    c.rate_numerator = rate_numerator;
    c.rate_denominator = rate_denominator;
    c.deposited = 0;
    c.committed = 0;
    c.settled_lp = 0;
    c.version = INITIAL_VERSION;

    msg!("child strategy initialized for native mint {}", c.native_mint);
    Ok(())
}

pub fn child_deposit(ctx: Context<ChildDeposit>, amount: u64) -> Result<()> {
    let vault = ctx.accounts.vault.key();
    child::deposit(&mut ctx.accounts.child, &vault, amount)?;

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.source.to_account_info(),
                to: ctx.accounts.custody.to_account_info(),
                authority: ctx.accounts.vault.to_account_info(),
            },
        ),
        amount,
    )
}

pub fn child_withdraw(ctx: Context<ChildWithdraw>, amount: u64) -> Result<()> {
    let vault = ctx.accounts.vault.key();
    child::withdraw(&mut ctx.accounts.child, &vault, amount)?;

    let c = &ctx.accounts.child;
    let bump = [c.bump];
    let signer_seeds: &[&[&[u8]]] = &[&[CHILD_SEED, c.parent.as_ref(), c.native_mint.as_ref(), &bump]];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.custody.to_account_info(),
                to: ctx.accounts.destination.to_account_info(),
                authority: ctx.accounts.child.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )
}

pub fn set_child_rate(ctx: Context<SetChildRate>, rate_numerator: u64, rate_denominator: u64) -> Result<()> {
    let manager = ctx.accounts.manager.key();
    child::set_rate(&mut ctx.accounts.child, &manager, rate_numerator, rate_denominator)
}

/// Moves `amount` of native principal into the parent's working account for
/// the child's native mint.
pub fn commit_to_epoch(ctx: Context<CommitToEpoch>, amount: u64) -> Result<()> {
    let manager = ctx.accounts.manager.key();
    let child_key = ctx.accounts.child.key();
    let parent_key = ctx.accounts.parent.key();

    child::commit(
        &mut ctx.accounts.child,
        &child_key,
        &ctx.accounts.parent,
        &parent_key,
        &manager,
        amount,
    )?;

    let c = &ctx.accounts.child;
    let bump = [c.bump];
    let signer_seeds: &[&[&[u8]]] = &[&[CHILD_SEED, c.parent.as_ref(), c.native_mint.as_ref(), &bump]];

    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.custody.to_account_info(),
                to: ctx.accounts.parent_working.to_account_info(),
                authority: ctx.accounts.child.to_account_info(),
            },
            signer_seeds,
        ),
        amount,
    )?;

    msg!("child {} committed {} to epoch", child_key, amount);
    Ok(())
}

pub fn child_report(ctx: Context<ChildView>) -> Result<ChildReport> {
    Ok(child::report(&ctx.accounts.child))
}
