use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;

use crate::adapters::{CollectibleMint, CompetitionEnv, PdaSigner, ProfileCpi, SplLedger};
use crate::constants::{INITIAL_VERSION, TIER_COUNT};
use crate::engine::competition::{self, ClaimInformation};
use crate::errors::VaultError;
use crate::state::{CompetitionStatus, RewardTier, TeamRewards, UserStats};
use crate::utils::{COMPETITION_SEED, USER_STATS_SEED};
use crate::{
    ClaimInformationView, ClaimRemainder, ClaimReward, InitializeCompetition, Register, UpdateCompetition,
    UpdateTeamRewards, UpdateUserStatusMultiple,
};

pub fn initialize_competition(ctx: Context<InitializeCompetition>, number_teams: u8) -> Result<()> {
    competition::validate_number_teams(number_teams)?;
    require!(
        ctx.accounts.collectible_mint.mint_authority == COption::Some(ctx.accounts.competition.key()),
        VaultError::AccountMismatch
    );
    require!(ctx.accounts.collectible_mint.decimals == 0, VaultError::AccountMismatch);

    let comp = &mut ctx.accounts.competition;
    comp.operator = ctx.accounts.operator.key();
    comp.bump = ctx.bumps.competition;

    comp.status = CompetitionStatus::Registration;
    comp.winning_team = 0;
    comp.number_teams = number_teams;

    comp.reward_mint = ctx.accounts.reward_mint.key();
    comp.reward_vault = ctx.accounts.reward_vault.key();
    comp.collectible_mint = ctx.accounts.collectible_mint.key();
    comp.profile_program = ctx.accounts.profile_program.key();

    comp.total_registered = 0;
    comp.total_claimed = 0;
    comp.rewards_configured = 0;
    comp.version = INITIAL_VERSION;

    msg!("competition initialized with {} teams", number_teams);
    Ok(())
}

pub fn register(ctx: Context<Register>) -> Result<()> {
    let user = ctx.accounts.user.key();
    let profiles = ProfileCpi::reader(
        ctx.accounts.profile_program.to_account_info(),
        ctx.accounts.profile.to_account_info(),
    );

    let stats = &mut ctx.accounts.user_stats;
    stats.competition = ctx.accounts.competition.key();
    stats.bump = ctx.bumps.user_stats;

    competition::register(&mut ctx.accounts.competition, stats, &user, &profiles)?;
    msg!("registered {} for team {}", user, stats.team_id);
    Ok(())
}

pub fn update_competition_status(ctx: Context<UpdateCompetition>, status: CompetitionStatus) -> Result<()> {
    let operator = ctx.accounts.operator.key();
    competition::update_status(&mut ctx.accounts.competition, &operator, status)
}

pub fn update_winning_team(ctx: Context<UpdateCompetition>, team_id: u8) -> Result<()> {
    let operator = ctx.accounts.operator.key();
    competition::update_winning_team(&mut ctx.accounts.competition, &operator, team_id)?;
    msg!("winning team: {}", team_id);
    Ok(())
}

pub fn update_team_rewards(ctx: Context<UpdateTeamRewards>, team_id: u8, tiers: Vec<RewardTier>) -> Result<()> {
    let tiers: [RewardTier; TIER_COUNT] = tiers
        .try_into()
        .map_err(|_| error!(VaultError::InvalidRewardTier))?;
    let operator = ctx.accounts.operator.key();

    let rewards: &mut TeamRewards = &mut ctx.accounts.team_rewards;
    rewards.competition = ctx.accounts.competition.key();
    rewards.bump = ctx.bumps.team_rewards;

    competition::update_team_rewards(&mut ctx.accounts.competition, &operator, rewards, team_id, tiers)
}

/// Remaining accounts are `UserStats` of this competition, all writable.
pub fn update_user_status_multiple<'info>(
    ctx: Context<'_, '_, 'info, 'info, UpdateUserStatusMultiple<'info>>,
    reward_group: u8,
) -> Result<()> {
    let operator = ctx.accounts.operator.key();
    let comp_key = ctx.accounts.competition.key();

    let mut users: Vec<Account<'info, UserStats>> = Vec::with_capacity(ctx.remaining_accounts.len());
    for info in ctx.remaining_accounts.iter() {
        require!(info.is_writable, VaultError::AccountMismatch);
        let stats: Account<UserStats> = Account::try_from(info)?;
        require_keys_eq!(stats.competition, comp_key, VaultError::AccountMismatch);

        let expected = Pubkey::create_program_address(
            &[USER_STATS_SEED, comp_key.as_ref(), stats.user.as_ref(), &[stats.bump]],
            &crate::ID,
        )
        .map_err(|_| error!(VaultError::AccountMismatch))?;
        require_keys_eq!(expected, info.key(), VaultError::AccountMismatch);

        users.push(stats);
    }

    {
        let mut refs: Vec<&mut UserStats> = users.iter_mut().map(|u| &mut **u).collect();
        competition::update_user_status_multiple(&ctx.accounts.competition, &operator, &mut refs, reward_group)?;
    }

    for stats in users.iter() {
        stats.exit(&crate::ID)?;
    }

    msg!("reward group {} assigned to {} users", reward_group, users.len());
    Ok(())
}

/// Remaining accounts are forwarded to the profile program's points call.
pub fn claim_reward<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimReward<'info>>) -> Result<()> {
    let bump = [ctx.accounts.competition.bump];
    let signer = PdaSigner::new(
        ctx.accounts.competition.to_account_info(),
        &[COMPETITION_SEED, ctx.accounts.competition.operator.as_ref(), &bump],
    );
    let destination = ctx.accounts.user_reward_account.key();

    let ledger = SplLedger::new(
        &signer,
        ctx.accounts.token_program.to_account_info(),
        &[ctx.accounts.reward_vault.to_account_info()],
    )?
    .pay_to(ctx.accounts.user_reward_account.to_account_info());

    let mut env = CompetitionEnv {
        ledger,
        profiles: ProfileCpi::writer(
            ctx.accounts.profile_program.to_account_info(),
            ctx.accounts.profile.to_account_info(),
            ctx.remaining_accounts,
            &signer,
        ),
        collectible: CollectibleMint::new(
            ctx.accounts.collectible_mint.to_account_info(),
            ctx.accounts.user_collectible_account.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
            &signer,
        ),
    };

    let outcome = competition::claim_reward(
        &mut ctx.accounts.competition,
        &mut ctx.accounts.user_stats,
        &ctx.accounts.team_rewards,
        &destination,
        &mut env,
    )?;

    msg!(
        "claimed: {} tokens, {} points, collectible={}",
        outcome.token_reward,
        outcome.points,
        outcome.collectible
    );
    Ok(())
}

fn decode<T: AccountDeserialize>(info: &AccountInfo) -> Option<T> {
    if *info.owner != crate::ID || info.data_is_empty() {
        return None;
    }
    let data = info.try_borrow_data().ok()?;
    T::try_deserialize(&mut &data[..]).ok()
}

pub fn claim_information(ctx: Context<ClaimInformationView>) -> Result<ClaimInformation> {
    let comp = &ctx.accounts.competition;
    let comp_key = comp.key();

    let stats = decode::<UserStats>(&ctx.accounts.user_stats).filter(|s| s.competition == comp_key);
    let rewards = decode::<TeamRewards>(&ctx.accounts.team_rewards)
        .filter(|r| r.competition == comp_key)
        .filter(|r| stats.as_ref().is_some_and(|s| s.team_id == r.team_id));

    Ok(competition::claim_information(comp, stats.as_ref(), rewards.as_ref()))
}

pub fn claim_remainder(ctx: Context<ClaimRemainder>, amount: u64) -> Result<()> {
    let operator = ctx.accounts.operator.key();
    let bump = [ctx.accounts.competition.bump];
    let signer = PdaSigner::new(
        ctx.accounts.competition.to_account_info(),
        &[COMPETITION_SEED, ctx.accounts.competition.operator.as_ref(), &bump],
    );
    let destination = ctx.accounts.destination.key();

    let mut ledger = SplLedger::new(
        &signer,
        ctx.accounts.token_program.to_account_info(),
        &[ctx.accounts.reward_vault.to_account_info()],
    )?
    .pay_to(ctx.accounts.destination.to_account_info());

    competition::claim_remainder(&ctx.accounts.competition, &operator, amount, &destination, &mut ledger)?;
    msg!("remainder swept: {}", amount);
    Ok(())
}
