// programs/epoch_vault/src/contexts.rs

use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::errors::VaultError;
use crate::state::{ChildStrategy, Competition, ParentStrategy, TeamRewards, UserStats};
use crate::utils::{
    CHILD_CUSTODY_SEED, CHILD_SEED, CHILD_SETTLEMENT_SEED, COMPETITION_SEED, COMPETITION_VAULT_SEED, PARENT_SEED,
    TEAM_REWARDS_SEED, USER_STATS_SEED, WORKING_SEED,
};

// ----------------------------
// Parent strategy
// ----------------------------

#[derive(Accounts)]
pub struct InitializeParent<'info> {
    #[account(
        init,
        payer = owner,
        space = 8 + ParentStrategy::INIT_SPACE,
        seeds = [PARENT_SEED, stake_mint.key().as_ref()],
        bump
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub stake_mint: Account<'info, Mint>,
    pub reward_mint: Account<'info, Mint>,
    pub token0_mint: Account<'info, Mint>,
    pub token1_mint: Account<'info, Mint>,
    /// Pricing base; every valuation routes through a pair against it.
    pub base_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = owner,
        token::mint = stake_mint,
        token::authority = parent,
        seeds = [WORKING_SEED, parent.key().as_ref(), stake_mint.key().as_ref()],
        bump
    )]
    pub stake_working: Account<'info, TokenAccount>,

    /// CHECK: farm program, only ever invoked
    #[account(executable)]
    pub farm_program: UncheckedAccount<'info>,
    /// CHECK: delegate granted stake-token allowances
    pub farm_authority: UncheckedAccount<'info>,
    /// CHECK: the farm's position record for this strategy; read, never written here
    pub farm_user_info: UncheckedAccount<'info>,
    /// CHECK: exchange program, only ever invoked
    #[account(executable)]
    pub exchange_program: UncheckedAccount<'info>,
    /// CHECK: delegate granted reward/constituent allowances
    pub exchange_authority: UncheckedAccount<'info>,

    #[account(mut)]
    pub owner: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

/// Token account of the parent for one more mint (reward, constituents,
/// children's native assets).
#[derive(Accounts)]
pub struct InitWorkingAccount<'info> {
    #[account(
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = payer,
        token::mint = mint,
        token::authority = parent,
        seeds = [WORKING_SEED, parent.key().as_ref(), mint.key().as_ref()],
        bump
    )]
    pub working: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = parent.is_manager(&payer.key()) @ VaultError::Unauthorized
    )]
    pub payer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct SetRoles<'info> {
    #[account(
        mut,
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub owner: Signer<'info>,
}

/// Remaining accounts: the child strategies of the new epoch.
#[derive(Accounts)]
pub struct StartEpoch<'info> {
    #[account(
        mut,
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub caller: Signer<'info>,
}

/// Shared by every parent instruction that reaches a collaborator.
/// Remaining accounts follow `AccountLayout`.
#[derive(Accounts)]
pub struct ParentOperation<'info> {
    #[account(
        mut,
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub caller: Signer<'info>,

    /// CHECK: pinned to the configured farm program
    #[account(address = parent.farm_program)]
    pub farm_program: UncheckedAccount<'info>,
    /// CHECK: pinned to the configured farm delegate
    #[account(address = parent.farm_authority)]
    pub farm_authority: UncheckedAccount<'info>,
    /// CHECK: pinned to the configured exchange program
    #[account(address = parent.exchange_program)]
    pub exchange_program: UncheckedAccount<'info>,
    /// CHECK: pinned to the configured exchange delegate
    #[account(address = parent.exchange_authority)]
    pub exchange_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// Parent operation paying stake tokens out to the vault.
#[derive(Accounts)]
pub struct VaultTransfer<'info> {
    pub op: ParentOperation<'info>,

    #[account(
        mut,
        token::mint = op.parent.stake_mint,
        token::authority = op.parent.vault,
    )]
    pub destination: Account<'info, TokenAccount>,
}

#[derive(Accounts)]
pub struct SettleChild<'info> {
    pub op: ParentOperation<'info>,

    #[account(
        mut,
        seeds = [CHILD_SEED, op.parent.key().as_ref(), child.native_mint.as_ref()],
        bump = child.bump,
    )]
    pub child: Account<'info, ChildStrategy>,

    #[account(mut, address = child.settlement_account)]
    pub settlement_account: Account<'info, TokenAccount>,
}

// ----------------------------
// Child strategy
// ----------------------------

#[derive(Accounts)]
pub struct InitializeChild<'info> {
    #[account(
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub native_mint: Account<'info, Mint>,

    #[account(address = parent.stake_mint)]
    pub stake_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = manager,
        space = 8 + ChildStrategy::INIT_SPACE,
        seeds = [CHILD_SEED, parent.key().as_ref(), native_mint.key().as_ref()],
        bump
    )]
    pub child: Account<'info, ChildStrategy>,

    #[account(
        init,
        payer = manager,
        token::mint = native_mint,
        token::authority = child,
        seeds = [CHILD_CUSTODY_SEED, child.key().as_ref()],
        bump
    )]
    pub custody: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = manager,
        token::mint = stake_mint,
        token::authority = child,
        seeds = [CHILD_SETTLEMENT_SEED, child.key().as_ref()],
        bump
    )]
    pub settlement: Account<'info, TokenAccount>,

    #[account(mut)]
    pub manager: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct ChildDeposit<'info> {
    #[account(
        mut,
        seeds = [CHILD_SEED, child.parent.as_ref(), child.native_mint.as_ref()],
        bump = child.bump,
    )]
    pub child: Account<'info, ChildStrategy>,

    pub vault: Signer<'info>,

    #[account(
        mut,
        token::mint = child.native_mint,
        token::authority = vault,
    )]
    pub source: Account<'info, TokenAccount>,

    #[account(mut, address = child.token_account)]
    pub custody: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ChildWithdraw<'info> {
    #[account(
        mut,
        seeds = [CHILD_SEED, child.parent.as_ref(), child.native_mint.as_ref()],
        bump = child.bump,
    )]
    pub child: Account<'info, ChildStrategy>,

    pub vault: Signer<'info>,

    #[account(mut, token::mint = child.native_mint)]
    pub destination: Account<'info, TokenAccount>,

    #[account(mut, address = child.token_account)]
    pub custody: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct SetChildRate<'info> {
    #[account(
        mut,
        seeds = [CHILD_SEED, child.parent.as_ref(), child.native_mint.as_ref()],
        bump = child.bump,
    )]
    pub child: Account<'info, ChildStrategy>,

    pub manager: Signer<'info>,
}

#[derive(Accounts)]
pub struct CommitToEpoch<'info> {
    #[account(
        mut,
        seeds = [CHILD_SEED, parent.key().as_ref(), child.native_mint.as_ref()],
        bump = child.bump,
    )]
    pub child: Account<'info, ChildStrategy>,

    #[account(
        seeds = [PARENT_SEED, parent.stake_mint.as_ref()],
        bump = parent.bump,
    )]
    pub parent: Account<'info, ParentStrategy>,

    pub manager: Signer<'info>,

    #[account(mut, address = child.token_account)]
    pub custody: Account<'info, TokenAccount>,

    #[account(
        mut,
        token::mint = child.native_mint,
        token::authority = parent,
    )]
    pub parent_working: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ChildView<'info> {
    pub child: Account<'info, ChildStrategy>,
}

// ----------------------------
// Trading competition
// ----------------------------

#[derive(Accounts)]
pub struct InitializeCompetition<'info> {
    #[account(
        init,
        payer = operator,
        space = 8 + Competition::INIT_SPACE,
        seeds = [COMPETITION_SEED, operator.key().as_ref()],
        bump
    )]
    pub competition: Account<'info, Competition>,

    pub reward_mint: Account<'info, Mint>,

    /// Mint authority must be the competition PDA.
    pub collectible_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = operator,
        token::mint = reward_mint,
        token::authority = competition,
        seeds = [COMPETITION_VAULT_SEED, competition.key().as_ref()],
        bump
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    /// CHECK: profile program, read and invoked only
    #[account(executable)]
    pub profile_program: UncheckedAccount<'info>,

    #[account(mut)]
    pub operator: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
pub struct UpdateCompetition<'info> {
    #[account(
        mut,
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    pub operator: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(team_id: u8)]
pub struct UpdateTeamRewards<'info> {
    #[account(
        mut,
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    #[account(
        init_if_needed,
        payer = operator,
        space = 8 + TeamRewards::INIT_SPACE,
        seeds = [TEAM_REWARDS_SEED, competition.key().as_ref(), team_id.to_le_bytes().as_ref()],
        bump
    )]
    pub team_rewards: Account<'info, TeamRewards>,

    #[account(mut)]
    pub operator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Remaining accounts: the `UserStats` to update.
#[derive(Accounts)]
pub struct UpdateUserStatusMultiple<'info> {
    #[account(
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    pub operator: Signer<'info>,
}

#[derive(Accounts)]
pub struct Register<'info> {
    #[account(
        mut,
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    #[account(
        init_if_needed,
        payer = user,
        space = 8 + UserStats::INIT_SPACE,
        seeds = [USER_STATS_SEED, competition.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub user_stats: Account<'info, UserStats>,

    /// CHECK: the user's profile; owner and user are checked when read
    pub profile: UncheckedAccount<'info>,

    /// CHECK: pinned to the configured profile program
    #[account(address = competition.profile_program)]
    pub profile_program: UncheckedAccount<'info>,

    #[account(mut)]
    pub user: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Remaining accounts: forwarded to the profile program's
/// `increase_user_points`.
#[derive(Accounts)]
pub struct ClaimReward<'info> {
    #[account(
        mut,
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    #[account(
        mut,
        seeds = [USER_STATS_SEED, competition.key().as_ref(), user.key().as_ref()],
        bump = user_stats.bump,
    )]
    pub user_stats: Account<'info, UserStats>,

    #[account(
        seeds = [TEAM_REWARDS_SEED, competition.key().as_ref(), user_stats.team_id.to_le_bytes().as_ref()],
        bump = team_rewards.bump,
    )]
    pub team_rewards: Account<'info, TeamRewards>,

    #[account(mut, address = competition.reward_vault)]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        token::mint = competition.reward_mint,
        token::authority = user,
    )]
    pub user_reward_account: Account<'info, TokenAccount>,

    #[account(mut, address = competition.collectible_mint)]
    pub collectible_mint: Account<'info, Mint>,

    #[account(
        mut,
        token::mint = competition.collectible_mint,
        token::authority = user,
    )]
    pub user_collectible_account: Account<'info, TokenAccount>,

    /// CHECK: the user's profile; owner and user are checked when read
    #[account(mut)]
    pub profile: UncheckedAccount<'info>,

    /// CHECK: pinned to the configured profile program
    #[account(address = competition.profile_program)]
    pub profile_program: UncheckedAccount<'info>,

    pub user: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimInformationView<'info> {
    pub competition: Account<'info, Competition>,

    /// CHECK: may be uninitialized; decoded leniently
    pub user_stats: UncheckedAccount<'info>,

    /// CHECK: may be uninitialized; decoded leniently
    pub team_rewards: UncheckedAccount<'info>,
}

#[derive(Accounts)]
pub struct ClaimRemainder<'info> {
    #[account(
        seeds = [COMPETITION_SEED, competition.operator.as_ref()],
        bump = competition.bump,
    )]
    pub competition: Account<'info, Competition>,

    pub operator: Signer<'info>,

    #[account(mut, address = competition.reward_vault)]
    pub reward_vault: Account<'info, TokenAccount>,

    #[account(mut, token::mint = competition.reward_mint)]
    pub destination: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}
