use anchor_lang::prelude::*;

pub mod adapters;
pub mod constants;
pub mod contexts;
pub mod engine;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod state;
pub mod utils;

pub use constants::*;
pub use contexts::*;
pub use errors::*;
pub use events::*;
pub use instructions::*;
pub use state::*;
pub use utils::*;

use crate::engine::competition::ClaimInformation;
use crate::engine::epoch::StrategyBalance;
use crate::engine::interfaces::ChildReport;

declare_id!("CV4HhrWYpCi5KAKKZS1gkmkwd8PZVZyYqYC4vrh96R52");

#[program]
pub mod epoch_vault {
    use super::*;
    use crate::instructions::{child, competition, parent};

    // ----------------------------
    // Parent strategy setup
    // ----------------------------
    pub fn initialize(ctx: Context<InitializeParent>, args: InitParentArgs) -> Result<()> {
        parent::initialize(ctx, args)
    }

    pub fn init_working_account(ctx: Context<InitWorkingAccount>) -> Result<()> {
        parent::init_working_account(ctx)
    }

    pub fn set_roles(ctx: Context<SetRoles>, manager: Pubkey, vault: Pubkey) -> Result<()> {
        parent::set_roles(ctx, manager, vault)
    }

    pub fn give_allowances<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::give_allowances(ctx, layout)
    }

    // ----------------------------
    // Vault flows
    // ----------------------------
    pub fn deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::deposit(ctx, layout)
    }

    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultTransfer<'info>>,
        amount: u64,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::withdraw(ctx, amount, layout)
    }

    pub fn retire_strat<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultTransfer<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::retire_strat(ctx, layout)
    }

    // ----------------------------
    // Epoch lifecycle
    // ----------------------------
    pub fn start_epoch<'info>(ctx: Context<'_, '_, 'info, 'info, StartEpoch<'info>>) -> Result<()> {
        parent::start_epoch(ctx)
    }

    pub fn end_epoch<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::end_epoch(ctx, layout)
    }

    pub fn settle_child<'info>(
        ctx: Context<'_, '_, 'info, 'info, SettleChild<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::settle_child(ctx, layout)
    }

    pub fn harvest<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        params: CompoundParams,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::harvest(ctx, params, layout)
    }

    pub fn deploy_committed<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        mint: Pubkey,
        params: CompoundParams,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::deploy_committed(ctx, mint, params, layout)
    }

    // views
    pub fn balance_of<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<StrategyBalance> {
        parent::balance_of(ctx, layout)
    }

    pub fn rewards_available<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<u64> {
        parent::rewards_available(ctx, layout)
    }

    // ----------------------------
    // Safety switches
    // ----------------------------
    pub fn pause<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::pause(ctx, layout)
    }

    pub fn unpause<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::unpause(ctx, layout)
    }

    pub fn panic<'info>(
        ctx: Context<'_, '_, 'info, 'info, ParentOperation<'info>>,
        layout: AccountLayout,
    ) -> Result<()> {
        parent::panic(ctx, layout)
    }

    // ----------------------------
    // Child strategy
    // ----------------------------
    pub fn initialize_child(
        ctx: Context<InitializeChild>,
        vault: Pubkey,
        rate_numerator: u64,
        rate_denominator: u64,
    ) -> Result<()> {
        child::initialize_child(ctx, vault, rate_numerator, rate_denominator)
    }

    pub fn child_deposit(ctx: Context<ChildDeposit>, amount: u64) -> Result<()> {
        child::child_deposit(ctx, amount)
    }

    pub fn child_withdraw(ctx: Context<ChildWithdraw>, amount: u64) -> Result<()> {
        child::child_withdraw(ctx, amount)
    }

    pub fn set_child_rate(ctx: Context<SetChildRate>, rate_numerator: u64, rate_denominator: u64) -> Result<()> {
        child::set_child_rate(ctx, rate_numerator, rate_denominator)
    }

    pub fn commit_to_epoch(ctx: Context<CommitToEpoch>, amount: u64) -> Result<()> {
        child::commit_to_epoch(ctx, amount)
    }

    pub fn child_report(ctx: Context<ChildView>) -> Result<ChildReport> {
        child::child_report(ctx)
    }

    // ----------------------------
    // Trading competition
    // ----------------------------
    pub fn initialize_competition(ctx: Context<InitializeCompetition>, number_teams: u8) -> Result<()> {
        competition::initialize_competition(ctx, number_teams)
    }

    pub fn register(ctx: Context<Register>) -> Result<()> {
        competition::register(ctx)
    }

    pub fn update_competition_status(ctx: Context<UpdateCompetition>, status: CompetitionStatus) -> Result<()> {
        competition::update_competition_status(ctx, status)
    }

    pub fn update_winning_team(ctx: Context<UpdateCompetition>, team_id: u8) -> Result<()> {
        competition::update_winning_team(ctx, team_id)
    }

    pub fn update_team_rewards(ctx: Context<UpdateTeamRewards>, team_id: u8, tiers: Vec<RewardTier>) -> Result<()> {
        competition::update_team_rewards(ctx, team_id, tiers)
    }

    pub fn update_user_status_multiple<'info>(
        ctx: Context<'_, '_, 'info, 'info, UpdateUserStatusMultiple<'info>>,
        reward_group: u8,
    ) -> Result<()> {
        competition::update_user_status_multiple(ctx, reward_group)
    }

    pub fn claim_reward<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimReward<'info>>) -> Result<()> {
        competition::claim_reward(ctx)
    }

    pub fn claim_information(ctx: Context<ClaimInformationView>) -> Result<ClaimInformation> {
        competition::claim_information(ctx)
    }

    pub fn claim_remainder(ctx: Context<ClaimRemainder>, amount: u64) -> Result<()> {
        competition::claim_remainder(ctx, amount)
    }
}
