//! On-chain bindings of the engine's collaborator traits.
//!
//! Every adapter reads account data fresh from its `AccountInfo` so balances
//! observed after a CPI reflect that CPI.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::invoke_signed;
use anchor_spl::token::{Mint, TokenAccount};

use crate::errors::VaultError;
use crate::utils::working_address;

pub mod env;
pub mod exchange;
pub mod farm;
pub mod profile;
pub mod token;

pub use env::{CompetitionEnv, ParentEnv};
pub use exchange::{AmmCpi, PoolOracle};
pub use farm::FarmCpi;
pub use profile::{CollectibleMint, ProfileCpi};
pub use token::SplLedger;

/// A program-derived authority and the seeds it signs with.
pub struct PdaSigner<'info> {
    pub info: AccountInfo<'info>,
    seeds: Vec<Vec<u8>>,
}

impl<'info> PdaSigner<'info> {
    pub fn new(info: AccountInfo<'info>, seeds: &[&[u8]]) -> Self {
        Self {
            info,
            seeds: seeds.iter().map(|s| s.to_vec()).collect(),
        }
    }

    pub fn key(&self) -> Pubkey {
        self.info.key()
    }

    pub fn with_seeds<R>(&self, f: impl FnOnce(&[&[&[u8]]]) -> R) -> R {
        let seeds: Vec<&[u8]> = self.seeds.iter().map(|s| s.as_slice()).collect();
        f(&[&seeds])
    }
}

/// Invokes `program` with `accounts` in the given order. The signer PDA is
/// flagged as signing wherever it appears.
pub fn forward<'info>(
    program: &AccountInfo<'info>,
    accounts: &[AccountInfo<'info>],
    data: Vec<u8>,
    signer: &PdaSigner<'info>,
) -> Result<()> {
    let authority = signer.key();
    let metas = accounts
        .iter()
        .map(|a| AccountMeta {
            pubkey: a.key(),
            is_signer: a.is_signer || a.key() == authority,
            is_writable: a.is_writable,
        })
        .collect();
    let ix = Instruction {
        program_id: program.key(),
        accounts: metas,
        data,
    };

    let mut infos = accounts.to_vec();
    infos.push(signer.info.clone());
    infos.push(program.clone());

    signer.with_seeds(|seeds| invoke_signed(&ix, &infos, seeds))?;
    Ok(())
}

/// Exchange output must land in `parent`'s own working account for `mint`.
pub fn ensure_recipient(info: &AccountInfo, parent: &Pubkey, mint: &Pubkey) -> Result<()> {
    require_keys_eq!(info.key(), working_address(parent, mint), VaultError::AccountMismatch);
    require!(info.is_writable, VaultError::AccountMismatch);
    Ok(())
}

pub fn read_token_account(info: &AccountInfo) -> Result<TokenAccount> {
    require_keys_eq!(*info.owner, anchor_spl::token::ID, VaultError::AccountMismatch);
    let data = info.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..])
}

pub fn read_mint(info: &AccountInfo) -> Result<Mint> {
    require_keys_eq!(*info.owner, anchor_spl::token::ID, VaultError::AccountMismatch);
    let data = info.try_borrow_data()?;
    Mint::try_deserialize(&mut &data[..])
}

/// Decodes an account owned by `program` laid out as an 8-byte discriminator
/// followed by borsh fields.
pub fn read_external<T: AnchorDeserialize>(info: &AccountInfo, program: &Pubkey) -> Result<T> {
    require_keys_eq!(*info.owner, *program, VaultError::AccountMismatch);
    let data = info.try_borrow_data()?;
    require!(data.len() >= 8, VaultError::AccountMismatch);
    let mut body: &[u8] = &data[8..];
    T::deserialize(&mut body).map_err(|_| error!(VaultError::AccountMismatch))
}
