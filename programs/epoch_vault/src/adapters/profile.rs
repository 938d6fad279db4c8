use anchor_lang::prelude::*;
use anchor_spl::token::{self, MintTo};

use crate::adapters::{forward, read_external, read_token_account, PdaSigner};
use crate::constants::COLLECTIBLE_AMOUNT;
use crate::engine::interfaces::{CollectibleMinter, ProfileLedger, UserTeam};
use crate::errors::VaultError;
use crate::utils::instruction_data;

/// User profile record, as stored by the profile program.
#[derive(AnchorDeserialize, Clone, Copy, Debug)]
pub struct UserProfile {
    pub user: Pubkey,
    pub team_id: u8,
    pub is_active: bool,
    pub points: u64,
}

/// Profile ledger bound through one user's profile account. `accounts[0]` is
/// the profile; the rest are forwarded to `increase_user_points`.
pub struct ProfileCpi<'a, 'info> {
    program: AccountInfo<'info>,
    accounts: Vec<AccountInfo<'info>>,
    signer: Option<&'a PdaSigner<'info>>,
}

impl<'a, 'info> ProfileCpi<'a, 'info> {
    pub fn reader(program: AccountInfo<'info>, profile: AccountInfo<'info>) -> Self {
        Self {
            program,
            accounts: vec![profile],
            signer: None,
        }
    }

    pub fn writer(
        program: AccountInfo<'info>,
        profile: AccountInfo<'info>,
        extra: &[AccountInfo<'info>],
        signer: &'a PdaSigner<'info>,
    ) -> Self {
        let mut accounts = vec![profile];
        accounts.extend_from_slice(extra);
        Self {
            program,
            accounts,
            signer: Some(signer),
        }
    }
}

impl ProfileLedger for ProfileCpi<'_, '_> {
    fn get_user_team(&self, user: &Pubkey) -> Result<UserTeam> {
        let profile = &self.accounts[0];
        if profile.data_is_empty() || *profile.owner != self.program.key() {
            return Ok(UserTeam::default());
        }

        let record: UserProfile = read_external(profile, &self.program.key())?;
        if record.user != *user {
            return Ok(UserTeam::default());
        }
        Ok(UserTeam {
            team_id: record.team_id,
            is_active: record.is_active,
        })
    }

    fn increase_points(&mut self, user: &Pubkey, amount: u64, campaign_id: u64) -> Result<()> {
        let signer = self.signer.ok_or(VaultError::MissingCollaborator)?;
        let record: UserProfile = read_external(&self.accounts[0], &self.program.key())?;
        require_keys_eq!(record.user, *user, VaultError::AccountMismatch);

        forward(
            &self.program,
            &self.accounts,
            instruction_data("increase_user_points", &(amount, campaign_id))?,
            signer,
        )
    }
}

/// Mints one unit of the collectible mint into the user's token account.
pub struct CollectibleMint<'a, 'info> {
    mint: AccountInfo<'info>,
    destination: AccountInfo<'info>,
    token_program: AccountInfo<'info>,
    signer: &'a PdaSigner<'info>,
}

impl<'a, 'info> CollectibleMint<'a, 'info> {
    pub fn new(
        mint: AccountInfo<'info>,
        destination: AccountInfo<'info>,
        token_program: AccountInfo<'info>,
        signer: &'a PdaSigner<'info>,
    ) -> Self {
        Self {
            mint,
            destination,
            token_program,
            signer,
        }
    }
}

impl CollectibleMinter for CollectibleMint<'_, '_> {
    fn mint_collectible(&mut self, user: &Pubkey) -> Result<()> {
        let destination = read_token_account(&self.destination)?;
        require_keys_eq!(destination.owner, *user, VaultError::AccountMismatch);
        require_keys_eq!(destination.mint, self.mint.key(), VaultError::AccountMismatch);

        self.signer.with_seeds(|seeds| {
            token::mint_to(
                CpiContext::new_with_signer(
                    self.token_program.clone(),
                    MintTo {
                        mint: self.mint.clone(),
                        to: self.destination.clone(),
                        authority: self.signer.info.clone(),
                    },
                    seeds,
                ),
                COLLECTIBLE_AMOUNT,
            )
        })
    }
}
