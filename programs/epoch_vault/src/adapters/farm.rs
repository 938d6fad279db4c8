use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::get_return_data;

use crate::adapters::{forward, read_external, PdaSigner};
use crate::engine::interfaces::FarmAdapter;
use crate::errors::VaultError;
use crate::state::RewardQuery;
use crate::utils::instruction_data;

/// Farm position record, as stored by the farm program.
#[derive(AnchorDeserialize, Clone, Copy, Debug, Default)]
pub struct FarmUserInfo {
    pub amount: u64,
    pub reward_debt: u64,
}

/// Farm bound through CPI. `accounts[0]` is the strategy's recorded
/// user-info account; the whole slice is passed to every farm instruction.
pub struct FarmCpi<'a, 'info> {
    program: AccountInfo<'info>,
    accounts: &'a [AccountInfo<'info>],
    signer: &'a PdaSigner<'info>,
}

impl<'a, 'info> FarmCpi<'a, 'info> {
    pub fn new(
        program: AccountInfo<'info>,
        user_info: &Pubkey,
        accounts: &'a [AccountInfo<'info>],
        signer: &'a PdaSigner<'info>,
    ) -> Result<Self> {
        let first = accounts.first().ok_or(VaultError::MissingCollaborator)?;
        require_keys_eq!(first.key(), *user_info, VaultError::AccountMismatch);
        Ok(Self {
            program,
            accounts,
            signer,
        })
    }

    fn call<A: AnchorSerialize>(&self, name: &str, args: &A) -> Result<()> {
        forward(&self.program, self.accounts, instruction_data(name, args)?, self.signer)
    }
}

impl FarmAdapter for FarmCpi<'_, '_> {
    fn deposit(&mut self, pool_id: u64, amount: u64) -> Result<()> {
        self.call("deposit", &(pool_id, amount))
    }

    fn withdraw(&mut self, pool_id: u64, amount: u64) -> Result<()> {
        self.call("withdraw", &(pool_id, amount))
    }

    // farms pay pending rewards on any deposit
    fn claim(&mut self, pool_id: u64) -> Result<()> {
        self.call("deposit", &(pool_id, 0u64))
    }

    fn emergency_withdraw(&mut self, pool_id: u64) -> Result<()> {
        self.call("emergency_withdraw", &pool_id)
    }

    fn staked(&self, _pool_id: u64) -> Result<u64> {
        let user_info = &self.accounts[0];
        if user_info.data_is_empty() {
            return Ok(0);
        }
        let info: FarmUserInfo = read_external(user_info, &self.program.key())?;
        Ok(info.amount)
    }

    fn pending_reward(&self, pool_id: u64, query: RewardQuery) -> Result<u64> {
        self.call(query.method(), &pool_id)?;

        match get_return_data() {
            Some((program, data)) if program == self.program.key() => {
                u64::try_from_slice(&data).map_err(|_| error!(VaultError::AccountMismatch))
            }
            _ => Ok(0),
        }
    }
}
