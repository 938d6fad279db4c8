//! Child strategy bookkeeping.
//!
//! A child holds one native asset. Its principal is frozen while any of it is
//! committed to the parent's running epoch, so the amount the parent reads at
//! epoch end is the amount the child committed.

use anchor_lang::prelude::*;

use crate::engine::epoch;
use crate::engine::interfaces::{ChildReport, ChildReporter};
use crate::errors::VaultError;
use crate::state::{ChildStrategy, ParentStrategy};

impl ChildStrategy {
    /// Native principal not delegated to the parent.
    pub fn available(&self) -> u64 {
        self.deposited.saturating_sub(self.committed)
    }

    fn ensure_uncommitted(&self) -> Result<()> {
        require!(self.committed == 0, VaultError::EpochInProgress);
        Ok(())
    }

    fn is_manager(&self, key: &Pubkey) -> bool {
        *key == self.manager
    }
}

pub fn validate_rate(denominator: u64) -> Result<()> {
    require!(denominator > 0, VaultError::InvalidRate);
    Ok(())
}

pub fn deposit(c: &mut ChildStrategy, caller: &Pubkey, amount: u64) -> Result<()> {
    require_keys_eq!(*caller, c.vault, VaultError::Unauthorized);
    require!(amount > 0, VaultError::InvalidAmount);
    c.ensure_uncommitted()?;

    c.deposited = c.deposited.checked_add(amount).ok_or(VaultError::MathOverflow)?;
    Ok(())
}

pub fn withdraw(c: &mut ChildStrategy, caller: &Pubkey, amount: u64) -> Result<()> {
    require_keys_eq!(*caller, c.vault, VaultError::Unauthorized);
    require!(amount > 0, VaultError::InvalidAmount);
    c.ensure_uncommitted()?;
    require!(amount <= c.available(), VaultError::InsufficientBalance);

    c.deposited -= amount;
    Ok(())
}

pub fn set_rate(c: &mut ChildStrategy, caller: &Pubkey, numerator: u64, denominator: u64) -> Result<()> {
    require!(c.is_manager(caller), VaultError::Unauthorized);
    validate_rate(denominator)?;
    c.ensure_uncommitted()?;

    c.rate_numerator = numerator;
    c.rate_denominator = denominator;
    Ok(())
}

/// Delegates `amount` of native principal to the parent's running epoch.
/// The caller moves the tokens once this succeeds.
pub fn commit(
    c: &mut ChildStrategy,
    child_key: &Pubkey,
    parent: &ParentStrategy,
    parent_key: &Pubkey,
    caller: &Pubkey,
    amount: u64,
) -> Result<()> {
    require!(c.is_manager(caller), VaultError::Unauthorized);
    require_keys_eq!(c.parent, *parent_key, VaultError::ChildMismatch);
    require!(epoch::is_tracking(parent, child_key), VaultError::ChildNotTracked);
    require!(amount > 0, VaultError::InvalidAmount);
    require!(amount <= c.available(), VaultError::InsufficientBalance);

    c.committed = c.committed.checked_add(amount).ok_or(VaultError::MathOverflow)?;
    Ok(())
}

pub fn report(c: &ChildStrategy) -> ChildReport {
    ChildReport {
        native_mint: c.native_mint,
        principal_native: c.committed,
        rate_numerator: c.rate_numerator,
        rate_denominator: c.rate_denominator,
    }
}

/// Committed principal has been repaid in stake tokens.
pub fn receive_settlement(c: &mut ChildStrategy, lp: u64) -> Result<()> {
    c.deposited = c
        .deposited
        .checked_sub(c.committed)
        .ok_or(VaultError::MathOverflow)?;
    c.committed = 0;
    c.settled_lp = c.settled_lp.checked_add(lp).ok_or(VaultError::MathOverflow)?;
    Ok(())
}

/// Children loaded for one parent, answering epoch-end reports.
pub struct ChildSet {
    parent: Pubkey,
    children: Vec<(Pubkey, ChildStrategy)>,
}

impl ChildSet {
    pub fn new(parent: Pubkey) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: Pubkey, child: ChildStrategy) -> Result<()> {
        require_keys_eq!(child.parent, self.parent, VaultError::ChildMismatch);
        require!(
            !self.children.iter().any(|(k, _)| *k == key),
            VaultError::DuplicateChild
        );
        self.children.push((key, child));
        Ok(())
    }
}

impl ChildReporter for ChildSet {
    fn report(&self, child: &Pubkey) -> Result<ChildReport> {
        self.children
            .iter()
            .find(|(k, _)| k == child)
            .map(|(_, c)| report(c))
            .ok_or_else(|| error!(VaultError::MissingCollaborator))
    }
}
