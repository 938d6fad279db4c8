use anchor_lang::prelude::*;

#[error_code]
pub enum VaultError {
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Strategy paused")]
    Paused,

    // -----------------
    // Epoch lifecycle
    // -----------------
    #[msg("Epoch in progress")]
    EpochInProgress,
    #[msg("Epoch already running")]
    EpochAlreadyRunning,
    #[msg("No epoch running")]
    EpochNotRunning,
    #[msg("Previous epoch has unsettled children")]
    SettlementPending,
    #[msg("Child is not tracked by the running epoch")]
    ChildNotTracked,
    #[msg("Child listed twice")]
    DuplicateChild,
    #[msg("Too many children for one epoch")]
    TooManyChildren,
    #[msg("Child does not belong to this parent")]
    ChildMismatch,
    #[msg("Invalid interest rate (denominator must be > 0)")]
    InvalidRate,

    // -----------------
    // Accounting
    // -----------------
    #[msg("Pricing unavailable (missing pair or empty pool)")]
    PricingUnavailable,
    #[msg("Insufficient balance")]
    InsufficientBalance,
    #[msg("Invalid amount")]
    InvalidAmount,
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Reentrant call rejected")]
    Reentrancy,

    // -----------------
    // Competition
    // -----------------
    #[msg("Operation not allowed in the current phase")]
    InvalidPhase,
    #[msg("Winning team must be set")]
    WinningTeamNotSet,
    #[msg("Every team needs its reward table before claiming")]
    RewardsNotConfigured,
    #[msg("Invalid team")]
    InvalidTeam,
    #[msg("Invalid reward group")]
    InvalidRewardGroup,
    #[msg("Tier 0 cannot carry a token reward")]
    InvalidRewardTier,
    #[msg("Already registered")]
    AlreadyRegistered,
    #[msg("Profile not active")]
    NotActive,
    #[msg("Not registered")]
    NotRegistered,
    #[msg("Already claimed")]
    AlreadyClaimed,

    // -----------------
    // Collaborator plumbing
    // -----------------
    #[msg("Account does not match strategy configuration")]
    AccountMismatch,
    #[msg("Invalid route accounts")]
    InvalidRoute,
    #[msg("Collaborator accounts not supplied")]
    MissingCollaborator,
}
