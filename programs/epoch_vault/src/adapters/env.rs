//! Collaborator bundles handed to the engine as a single `env`.

use anchor_lang::prelude::*;

use crate::adapters::{AmmCpi, CollectibleMint, FarmCpi, ProfileCpi, SplLedger};
use crate::engine::interfaces::{
    AddLiquidity, AssetLedger, CollectibleMinter, Exchange, FarmAdapter, ProfileLedger, Spender, UserTeam,
};
use crate::state::RewardQuery;

pub struct ParentEnv<'a, 'info> {
    pub ledger: SplLedger<'a, 'info>,
    pub farm: FarmCpi<'a, 'info>,
    pub exchange: AmmCpi<'a, 'info>,
}

impl AssetLedger for ParentEnv<'_, '_> {
    fn balance_of(&self, mint: &Pubkey) -> Result<u64> {
        self.ledger.balance_of(mint)
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        self.ledger.transfer(mint, to, amount)
    }

    fn approve(&mut self, mint: &Pubkey, spender: Spender, amount: u64) -> Result<()> {
        self.ledger.approve(mint, spender, amount)
    }

    fn revoke(&mut self, mint: &Pubkey) -> Result<()> {
        self.ledger.revoke(mint)
    }
}

impl FarmAdapter for ParentEnv<'_, '_> {
    fn deposit(&mut self, pool_id: u64, amount: u64) -> Result<()> {
        self.farm.deposit(pool_id, amount)
    }

    fn withdraw(&mut self, pool_id: u64, amount: u64) -> Result<()> {
        self.farm.withdraw(pool_id, amount)
    }

    fn claim(&mut self, pool_id: u64) -> Result<()> {
        self.farm.claim(pool_id)
    }

    fn emergency_withdraw(&mut self, pool_id: u64) -> Result<()> {
        self.farm.emergency_withdraw(pool_id)
    }

    fn staked(&self, pool_id: u64) -> Result<u64> {
        self.farm.staked(pool_id)
    }

    fn pending_reward(&self, pool_id: u64, query: RewardQuery) -> Result<u64> {
        self.farm.pending_reward(pool_id, query)
    }
}

impl Exchange for ParentEnv<'_, '_> {
    fn swap(&mut self, amount_in: u64, min_out: u64, route: &[Pubkey], deadline: i64) -> Result<Vec<u64>> {
        self.exchange.swap(amount_in, min_out, route, deadline)
    }

    fn add_liquidity(&mut self, request: &AddLiquidity) -> Result<u64> {
        self.exchange.add_liquidity(request)
    }
}

pub struct CompetitionEnv<'a, 'info> {
    pub ledger: SplLedger<'a, 'info>,
    pub profiles: ProfileCpi<'a, 'info>,
    pub collectible: CollectibleMint<'a, 'info>,
}

impl AssetLedger for CompetitionEnv<'_, '_> {
    fn balance_of(&self, mint: &Pubkey) -> Result<u64> {
        self.ledger.balance_of(mint)
    }

    fn transfer(&mut self, mint: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        self.ledger.transfer(mint, to, amount)
    }

    fn approve(&mut self, mint: &Pubkey, spender: Spender, amount: u64) -> Result<()> {
        self.ledger.approve(mint, spender, amount)
    }

    fn revoke(&mut self, mint: &Pubkey) -> Result<()> {
        self.ledger.revoke(mint)
    }
}

impl ProfileLedger for CompetitionEnv<'_, '_> {
    fn get_user_team(&self, user: &Pubkey) -> Result<UserTeam> {
        self.profiles.get_user_team(user)
    }

    fn increase_points(&mut self, user: &Pubkey, amount: u64, campaign_id: u64) -> Result<()> {
        self.profiles.increase_points(user, amount, campaign_id)
    }
}

impl CollectibleMinter for CompetitionEnv<'_, '_> {
    fn mint_collectible(&mut self, user: &Pubkey) -> Result<()> {
        self.collectible.mint_collectible(user)
    }
}
