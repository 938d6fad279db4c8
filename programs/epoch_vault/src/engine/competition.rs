//! Trading competition: registration, tiered rewards, exact-once claims.
//!
//! Phases move forward only (`CompetitionStatus::advance`). The operator
//! configures every team's rewards and assigns reward groups during `Close`;
//! users claim during `Claiming`.

use anchor_lang::prelude::*;

use crate::constants::{MAX_TEAMS, TIER_COUNT};
use crate::engine::interfaces::{AssetLedger, CollectibleMinter, ProfileLedger};
use crate::errors::VaultError;
use crate::state::{Competition, CompetitionStatus, RewardTier, TeamRewards, UserStats};

/// What a user would receive, as reported by `claim_information`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimInformation {
    pub has_registered: bool,
    pub has_claimed: bool,
    pub reward_group: u8,
    pub token_reward: u64,
    pub points: u64,
    pub campaign_id: u64,
    pub collectible: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub token_reward: u64,
    pub points: u64,
    pub collectible: bool,
}

impl Competition {
    fn ensure_operator(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.operator, VaultError::Unauthorized);
        Ok(())
    }

    fn ensure_team(&self, team_id: u8) -> Result<()> {
        require!(team_id >= 1 && team_id <= self.number_teams, VaultError::InvalidTeam);
        Ok(())
    }
}

pub fn validate_number_teams(number_teams: u8) -> Result<()> {
    require!(number_teams >= 1 && number_teams <= MAX_TEAMS, VaultError::InvalidTeam);
    Ok(())
}

pub fn register<P: ProfileLedger>(
    comp: &mut Competition,
    stats: &mut UserStats,
    user: &Pubkey,
    profiles: &P,
) -> Result<()> {
    comp.status.require(CompetitionStatus::Registration)?;
    require!(!stats.has_registered, VaultError::AlreadyRegistered);

    let profile = profiles.get_user_team(user)?;
    require!(
        profile.is_active && profile.team_id >= 1 && profile.team_id <= comp.number_teams,
        VaultError::NotActive
    );

    stats.user = *user;
    stats.team_id = profile.team_id;
    stats.has_registered = true;
    comp.total_registered = comp.total_registered.checked_add(1).ok_or(VaultError::MathOverflow)?;
    Ok(())
}

pub fn update_status(comp: &mut Competition, caller: &Pubkey, next: CompetitionStatus) -> Result<()> {
    comp.ensure_operator(caller)?;
    let status = comp.status.advance(next, comp.winning_team)?;
    if status == CompetitionStatus::Claiming {
        require!(comp.all_rewards_configured(), VaultError::RewardsNotConfigured);
    }
    comp.status = status;
    msg!("competition status: {:?}", comp.status);
    Ok(())
}

pub fn update_winning_team(comp: &mut Competition, caller: &Pubkey, team_id: u8) -> Result<()> {
    comp.ensure_operator(caller)?;
    comp.status.require(CompetitionStatus::Close)?;
    comp.ensure_team(team_id)?;
    comp.winning_team = team_id;
    Ok(())
}

pub fn update_team_rewards(
    comp: &mut Competition,
    caller: &Pubkey,
    rewards: &mut TeamRewards,
    team_id: u8,
    tiers: [RewardTier; TIER_COUNT],
) -> Result<()> {
    comp.ensure_operator(caller)?;
    comp.status.require(CompetitionStatus::Close)?;
    comp.ensure_team(team_id)?;
    require!(tiers[0].token_reward == 0, VaultError::InvalidRewardTier);

    rewards.team_id = team_id;
    rewards.tiers = tiers;
    comp.mark_rewards_configured(team_id);
    Ok(())
}

/// Assigns `reward_group` to every user, or to none of them.
pub fn update_user_status_multiple(
    comp: &Competition,
    caller: &Pubkey,
    users: &mut [&mut UserStats],
    reward_group: u8,
) -> Result<()> {
    comp.ensure_operator(caller)?;
    comp.status.require(CompetitionStatus::Close)?;
    require!((reward_group as usize) < TIER_COUNT, VaultError::InvalidRewardGroup);
    require!(
        users.iter().all(|u| u.has_registered),
        VaultError::NotRegistered
    );

    for user in users.iter_mut() {
        user.reward_group = reward_group;
    }
    Ok(())
}

/// Pays a user's tier once. `has_claimed` is set before any payout so a
/// collaborator calling back in sees the claim as spent.
pub fn claim_reward<E>(
    comp: &mut Competition,
    stats: &mut UserStats,
    rewards: &TeamRewards,
    destination: &Pubkey,
    env: &mut E,
) -> Result<ClaimOutcome>
where
    E: AssetLedger + ProfileLedger + CollectibleMinter,
{
    comp.status.require(CompetitionStatus::Claiming)?;
    require!(stats.has_registered, VaultError::NotRegistered);
    require!(!stats.has_claimed, VaultError::AlreadyClaimed);
    require!(rewards.team_id == stats.team_id, VaultError::InvalidTeam);
    stats.has_claimed = true;

    let group = stats.reward_group as usize;
    let tier = *rewards.tiers.get(group).ok_or(VaultError::InvalidRewardGroup)?;
    let outcome = ClaimOutcome {
        token_reward: if group > 0 { tier.token_reward } else { 0 },
        points: tier.points,
        collectible: group > 0 && stats.team_id == comp.winning_team,
    };

    if outcome.token_reward > 0 {
        env.transfer(&comp.reward_mint, destination, outcome.token_reward)?;
    }
    env.increase_points(&stats.user, outcome.points, tier.campaign_id)?;
    if outcome.collectible {
        env.mint_collectible(&stats.user)?;
    }

    comp.total_claimed = comp.total_claimed.checked_add(1).ok_or(VaultError::MathOverflow)?;
    Ok(outcome)
}

/// Never fails: unknown users and early phases report defaults.
pub fn claim_information(
    comp: &Competition,
    stats: Option<&UserStats>,
    rewards: Option<&TeamRewards>,
) -> ClaimInformation {
    let (stats, rewards) = match (stats, rewards) {
        (Some(s), Some(r)) if s.has_registered => (s, r),
        _ => return ClaimInformation::default(),
    };
    if !matches!(comp.status, CompetitionStatus::Claiming | CompetitionStatus::Over) {
        return ClaimInformation::default();
    }

    let group = stats.reward_group as usize;
    let tier = rewards.tiers.get(group).copied().unwrap_or_default();
    ClaimInformation {
        has_registered: true,
        has_claimed: stats.has_claimed,
        reward_group: stats.reward_group,
        token_reward: if group > 0 { tier.token_reward } else { 0 },
        points: tier.points,
        campaign_id: tier.campaign_id,
        collectible: group > 0 && stats.team_id == comp.winning_team,
    }
}

/// Sweeps unclaimed reward tokens once the competition is over.
pub fn claim_remainder<E: AssetLedger>(
    comp: &Competition,
    caller: &Pubkey,
    amount: u64,
    destination: &Pubkey,
    env: &mut E,
) -> Result<()> {
    comp.ensure_operator(caller)?;
    comp.status.require(CompetitionStatus::Over)?;
    require!(amount > 0, VaultError::InvalidAmount);
    require!(
        amount <= env.balance_of(&comp.reward_mint)?,
        VaultError::InsufficientBalance
    );

    env.transfer(&comp.reward_mint, destination, amount)
}
