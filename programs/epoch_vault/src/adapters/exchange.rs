use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::get_return_data;

use crate::adapters::{ensure_recipient, forward, read_external, read_mint, PdaSigner};
use crate::engine::interfaces::{AddLiquidity, Exchange, ExchangeRateOracle, PairReserves};
use crate::errors::VaultError;
use crate::utils::instruction_data;

/// Constant-product pool record, as stored by the exchange program.
#[derive(AnchorDeserialize, Clone, Copy, Debug)]
pub struct PoolState {
    pub token0: Pubkey,
    pub token1: Pubkey,
    pub reserve0: u64,
    pub reserve1: u64,
    pub lp_mint: Pubkey,
}

impl PoolState {
    fn holds(&self, a: &Pubkey, b: &Pubkey) -> bool {
        (self.token0 == *a && self.token1 == *b) || (self.token0 == *b && self.token1 == *a)
    }
}

#[derive(AnchorSerialize)]
struct SwapArgs {
    amount_in: u64,
    amount_out_min: u64,
    path: Vec<Pubkey>,
    deadline: i64,
}

#[derive(AnchorSerialize)]
struct AddLiquidityArgs {
    amount_a_desired: u64,
    amount_b_desired: u64,
    amount_a_min: u64,
    amount_b_min: u64,
    deadline: i64,
}

/// Exchange bound through CPI. Each swap leg and the liquidity add get
/// their own caller-supplied account list, whose first account must be the
/// signer's working account for the output mint.
pub struct AmmCpi<'a, 'info> {
    program: AccountInfo<'info>,
    stake_mint: Pubkey,
    token0_mint: Pubkey,
    token1_mint: Pubkey,
    swap0: &'a [AccountInfo<'info>],
    swap1: &'a [AccountInfo<'info>],
    liquidity: &'a [AccountInfo<'info>],
    signer: &'a PdaSigner<'info>,
}

impl<'a, 'info> AmmCpi<'a, 'info> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        program: AccountInfo<'info>,
        stake_mint: Pubkey,
        token0_mint: Pubkey,
        token1_mint: Pubkey,
        swap0: &'a [AccountInfo<'info>],
        swap1: &'a [AccountInfo<'info>],
        liquidity: &'a [AccountInfo<'info>],
        signer: &'a PdaSigner<'info>,
    ) -> Self {
        Self {
            program,
            stake_mint,
            token0_mint,
            token1_mint,
            swap0,
            swap1,
            liquidity,
            signer,
        }
    }

    fn returned<T: AnchorDeserialize>(&self) -> Option<T> {
        match get_return_data() {
            Some((program, data)) if program == self.program.key() => T::try_from_slice(&data).ok(),
            _ => None,
        }
    }
}

impl Exchange for AmmCpi<'_, '_> {
    fn swap(&mut self, amount_in: u64, min_out: u64, route: &[Pubkey], deadline: i64) -> Result<Vec<u64>> {
        require!(route.len() >= 2, VaultError::InvalidRoute);
        let (accounts, out) = match route.last() {
            Some(out) if *out == self.token0_mint => (self.swap0, out),
            Some(out) if *out == self.token1_mint => (self.swap1, out),
            _ => return err!(VaultError::InvalidRoute),
        };
        let recipient = accounts.first().ok_or(VaultError::InvalidRoute)?;
        ensure_recipient(recipient, &self.signer.key(), out)?;

        let args = SwapArgs {
            amount_in,
            amount_out_min: min_out,
            path: route.to_vec(),
            deadline,
        };
        forward(
            &self.program,
            accounts,
            instruction_data("swap_exact_tokens_for_tokens", &args)?,
            self.signer,
        )?;

        Ok(self.returned().unwrap_or_default())
    }

    fn add_liquidity(&mut self, request: &AddLiquidity) -> Result<u64> {
        let recipient = self.liquidity.first().ok_or(VaultError::InvalidRoute)?;
        ensure_recipient(recipient, &self.signer.key(), &self.stake_mint)?;

        let args = AddLiquidityArgs {
            amount_a_desired: request.amount_a,
            amount_b_desired: request.amount_b,
            amount_a_min: request.min_a,
            amount_b_min: request.min_b,
            deadline: request.deadline,
        };
        forward(
            &self.program,
            self.liquidity,
            instruction_data("add_liquidity", &args)?,
            self.signer,
        )?;

        Ok(self.returned().unwrap_or_default())
    }
}

/// Prices read from pool state accounts of the exchange program. LP mints
/// referenced by those pools are looked up in the same slice.
pub struct PoolOracle<'a, 'info> {
    exchange_program: Pubkey,
    accounts: &'a [AccountInfo<'info>],
}

impl<'a, 'info> PoolOracle<'a, 'info> {
    pub fn new(exchange_program: Pubkey, accounts: &'a [AccountInfo<'info>]) -> Self {
        Self {
            exchange_program,
            accounts,
        }
    }

    fn pools(&self) -> Vec<(Pubkey, PoolState)> {
        self.accounts
            .iter()
            .filter(|info| *info.owner == self.exchange_program)
            .filter_map(|info| {
                read_external::<PoolState>(info, &self.exchange_program)
                    .ok()
                    .map(|pool| (info.key(), pool))
            })
            .collect()
    }

    fn pool(&self, pair: &Pubkey) -> Result<PoolState> {
        self.pools()
            .into_iter()
            .find(|(key, _)| key == pair)
            .map(|(_, pool)| pool)
            .ok_or_else(|| error!(VaultError::PricingUnavailable))
    }
}

impl ExchangeRateOracle for PoolOracle<'_, '_> {
    fn get_pair(&self, token_a: &Pubkey, token_b: &Pubkey) -> Result<Pubkey> {
        self.pools()
            .into_iter()
            .find(|(_, pool)| pool.holds(token_a, token_b))
            .map(|(key, _)| key)
            .ok_or_else(|| error!(VaultError::PricingUnavailable))
    }

    fn get_reserves(&self, pair: &Pubkey) -> Result<PairReserves> {
        let pool = self.pool(pair)?;
        Ok(PairReserves {
            reserve0: pool.reserve0,
            reserve1: pool.reserve1,
            token0: pool.token0,
            token1: pool.token1,
        })
    }

    fn total_supply(&self, pair: &Pubkey) -> Result<u64> {
        let pool = self.pool(pair)?;
        let mint = self
            .accounts
            .iter()
            .find(|info| *info.key == pool.lp_mint)
            .ok_or(VaultError::PricingUnavailable)?;
        Ok(read_mint(mint)?.supply)
    }
}
