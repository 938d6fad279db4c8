use anchor_lang::prelude::*;

use crate::constants::{MAX_CHILDREN, TIER_COUNT};
use crate::errors::VaultError;

// ----------------------------
// Parent strategy (epoch engine)
// ----------------------------

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum EpochState {
    Idle,
    Running,
}

impl EpochState {
    /// `Idle -> Running`.
    pub fn begin(self) -> Result<Self> {
        match self {
            EpochState::Idle => Ok(EpochState::Running),
            EpochState::Running => err!(VaultError::EpochAlreadyRunning),
        }
    }

    /// `Running -> Idle`.
    pub fn finish(self) -> Result<Self> {
        match self {
            EpochState::Running => Ok(EpochState::Idle),
            EpochState::Idle => err!(VaultError::EpochNotRunning),
        }
    }

    /// Gate for vault deposits/withdrawals.
    pub fn ensure_idle(self) -> Result<()> {
        require!(self == EpochState::Idle, VaultError::EpochInProgress);
        Ok(())
    }
}

/// Which pending-reward view the farm exposes. Chosen once at initialization.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub enum RewardQuery {
    PendingReward,
    PendingCake,
    PendingSushi,
}

impl RewardQuery {
    /// Farm instruction that returns the pending amount through return data.
    pub fn method(self) -> &'static str {
        match self {
            RewardQuery::PendingReward => "pending_reward",
            RewardQuery::PendingCake => "pending_cake",
            RewardQuery::PendingSushi => "pending_sushi",
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct ChildRecord {
    pub child: Pubkey,
    /// Native amount the child gets back at minimum. Filled at epoch end.
    pub committed_principal_native: u64,
    /// Native amount owed on top of the principal. Filled at epoch end.
    pub fixed_return_native: u64,
    /// Stake-token equivalent of principal + fixed return.
    pub owed_lp: u64,
}

#[account]
#[derive(InitSpace, Debug, PartialEq)]
pub struct ParentStrategy {
    pub owner: Pubkey,
    pub manager: Pubkey,
    /// Vault authority allowed to deposit, withdraw and retire.
    pub vault: Pubkey,
    pub bump: u8,

    // stake token + pricing route
    pub stake_mint: Pubkey,
    pub reward_mint: Pubkey,
    pub token0_mint: Pubkey,
    pub token1_mint: Pubkey,
    pub base_mint: Pubkey,

    // collaborators
    pub farm_program: Pubkey,
    pub farm_pool_id: u64,
    pub farm_authority: Pubkey,
    /// The farm's per-user position record for this strategy.
    pub farm_user_info: Pubkey,
    pub exchange_program: Pubkey,
    pub exchange_authority: Pubkey,
    pub reward_query: RewardQuery,

    pub epoch: EpochState,
    pub paused: bool,
    /// reentrancy guard, persisted before any CPI
    pub processing: bool,
    pub allowances_granted: bool,

    #[max_len(MAX_CHILDREN)]
    pub children: Vec<ChildRecord>,
    /// Sum of `owed_lp` over `children`. Subtracted from reported TVL.
    pub total_fixed_return_lp: u64,

    pub epochs_completed: u64,
    pub last_harvest_slot: u64,
    pub total_harvested: u64,

    pub version: u16,
}

impl ParentStrategy {
    pub fn is_manager(&self, key: &Pubkey) -> bool {
        *key == self.manager || *key == self.owner
    }

    pub fn record(&self, child: &Pubkey) -> Option<&ChildRecord> {
        self.children.iter().find(|r| r.child == *child)
    }
}

// ----------------------------
// Child strategy
// ----------------------------

#[account]
#[derive(InitSpace, Debug, PartialEq)]
pub struct ChildStrategy {
    pub parent: Pubkey,
    pub native_mint: Pubkey,
    pub manager: Pubkey,
    pub vault: Pubkey,
    pub bump: u8,

    /// Native custody token account (PDA, authority = this child).
    pub token_account: Pubkey,
    /// Stake-token account receiving epoch settlements.
    pub settlement_account: Pubkey,

    pub rate_numerator: u64,
    pub rate_denominator: u64,

    /// Total native principal held or committed.
    pub deposited: u64,
    /// Part of `deposited` currently delegated to the parent.
    pub committed: u64,
    /// Stake tokens received from settlements, lifetime.
    pub settled_lp: u64,

    pub version: u16,
}

// ----------------------------
// Trading competition
// ----------------------------

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, InitSpace)]
pub enum CompetitionStatus {
    Registration,
    Open,
    Close,
    Claiming,
    Over,
}

impl CompetitionStatus {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Phases only move forward and may skip ahead. `Claiming` needs a
    /// declared winner; `Over` is reachable from `Claiming` only.
    pub fn advance(self, next: CompetitionStatus, winning_team: u8) -> Result<CompetitionStatus> {
        use CompetitionStatus::*;
        require!(next.ordinal() > self.ordinal(), VaultError::InvalidPhase);
        match next {
            Claiming => require!(winning_team > 0, VaultError::WinningTeamNotSet),
            Over => require!(self == Claiming, VaultError::InvalidPhase),
            _ => {}
        }
        Ok(next)
    }

    pub fn require(self, expected: CompetitionStatus) -> Result<()> {
        require!(self == expected, VaultError::InvalidPhase);
        Ok(())
    }
}

#[account]
#[derive(InitSpace, Debug, PartialEq)]
pub struct Competition {
    pub operator: Pubkey,
    pub bump: u8,

    pub status: CompetitionStatus,
    /// 0 until declared during `Close`.
    pub winning_team: u8,
    pub number_teams: u8,

    pub reward_mint: Pubkey,
    pub reward_vault: Pubkey,
    pub collectible_mint: Pubkey,
    pub profile_program: Pubkey,

    pub total_registered: u64,
    pub total_claimed: u64,
    /// Bit `team_id - 1` is set once that team's rewards are written.
    pub rewards_configured: u16,

    pub version: u16,
}

impl Competition {
    pub fn mark_rewards_configured(&mut self, team_id: u8) {
        self.rewards_configured |= 1 << (team_id - 1);
    }

    pub fn all_rewards_configured(&self) -> bool {
        let all = (1u32 << self.number_teams) - 1;
        u32::from(self.rewards_configured) & all == all
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct RewardTier {
    pub campaign_id: u64,
    pub token_reward: u64,
    pub points: u64,
}

#[account]
#[derive(InitSpace, Debug, PartialEq)]
pub struct TeamRewards {
    pub competition: Pubkey,
    pub team_id: u8,
    pub bump: u8,
    pub tiers: [RewardTier; TIER_COUNT],
}

#[account]
#[derive(InitSpace, Debug, Default, PartialEq)]
pub struct UserStats {
    pub competition: Pubkey,
    pub user: Pubkey,
    pub bump: u8,

    pub reward_group: u8,
    pub team_id: u8,
    pub has_registered: bool,
    // terminal: no path ever clears it
    pub has_claimed: bool,
}
