use anchor_lang::prelude::*;
use anchor_spl::token::{self, Approve, Revoke, Transfer};

use crate::adapters::{read_token_account, PdaSigner};
use crate::engine::interfaces::{AssetLedger, Spender};
use crate::errors::VaultError;

/// Token accounts held by one PDA authority, plus the accounts it may pay.
pub struct SplLedger<'a, 'info> {
    signer: &'a PdaSigner<'info>,
    token_program: AccountInfo<'info>,
    holdings: Vec<AccountInfo<'info>>,
    destinations: Vec<AccountInfo<'info>>,
    delegates: Vec<(Spender, AccountInfo<'info>)>,
}

impl<'a, 'info> SplLedger<'a, 'info> {
    /// Every holding must be a token account of `signer`.
    pub fn new(
        signer: &'a PdaSigner<'info>,
        token_program: AccountInfo<'info>,
        holdings: &[AccountInfo<'info>],
    ) -> Result<Self> {
        for info in holdings {
            let account = read_token_account(info)?;
            require_keys_eq!(account.owner, signer.key(), VaultError::AccountMismatch);
        }

        Ok(Self {
            signer,
            token_program,
            holdings: holdings.to_vec(),
            destinations: Vec::new(),
            delegates: Vec::new(),
        })
    }

    pub fn pay_to(mut self, destination: AccountInfo<'info>) -> Self {
        self.destinations.push(destination);
        self
    }

    pub fn delegate(mut self, spender: Spender, authority: AccountInfo<'info>) -> Self {
        self.delegates.push((spender, authority));
        self
    }

    fn holding(&self, mint: &Pubkey) -> Result<&AccountInfo<'info>> {
        for info in self.holdings.iter() {
            if read_token_account(info)?.mint == *mint {
                return Ok(info);
            }
        }
        err!(VaultError::MissingCollaborator)
    }

    fn destination(&self, key: &Pubkey) -> Result<&AccountInfo<'info>> {
        self.destinations
            .iter()
            .chain(self.holdings.iter())
            .find(|info| info.key == key)
            .ok_or_else(|| error!(VaultError::MissingCollaborator))
    }
}

impl AssetLedger for SplLedger<'_, '_> {
    fn balance_of(&self, mint: &Pubkey) -> Result<u64> {
        Ok(read_token_account(self.holding(mint)?)?.amount)
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let from = self.holding(mint)?.clone();
        let to = self.destination(to)?.clone();
        require_keys_eq!(read_token_account(&to)?.mint, *mint, VaultError::AccountMismatch);

        self.signer.with_seeds(|seeds| {
            token::transfer(
                CpiContext::new_with_signer(
                    self.token_program.clone(),
                    Transfer {
                        from,
                        to,
                        authority: self.signer.info.clone(),
                    },
                    seeds,
                ),
                amount,
            )
        })
    }

    fn approve(&mut self, mint: &Pubkey, spender: Spender, amount: u64) -> Result<()> {
        let to = self.holding(mint)?.clone();
        let delegate = self
            .delegates
            .iter()
            .find(|(s, _)| *s == spender)
            .map(|(_, info)| info.clone())
            .ok_or(VaultError::MissingCollaborator)?;

        self.signer.with_seeds(|seeds| {
            token::approve(
                CpiContext::new_with_signer(
                    self.token_program.clone(),
                    Approve {
                        to,
                        delegate,
                        authority: self.signer.info.clone(),
                    },
                    seeds,
                ),
                amount,
            )
        })
    }

    fn revoke(&mut self, mint: &Pubkey) -> Result<()> {
        let source = self.holding(mint)?.clone();

        self.signer.with_seeds(|seeds| {
            token::revoke(CpiContext::new_with_signer(
                self.token_program.clone(),
                Revoke {
                    source,
                    authority: self.signer.info.clone(),
                },
                seeds,
            ))
        })
    }
}
