// Centralized Protocol Constants

// Epoch Engine
// ============

/// Maximum number of children one epoch can track.
/// Bounds the `ParentStrategy.children` vector so the account size stays fixed.
pub const MAX_CHILDREN: usize = 8;

/// Seconds added to the current unix timestamp for exchange deadlines.
pub const SWAP_DEADLINE_SECS: i64 = 600;

/// Minimum amounts accepted when adding liquidity during compounding.
pub const MIN_LIQUIDITY_AMOUNT: u64 = 1;

// Competition
// ===========

/// Number of reward tiers. Tier 0 is the "no extra reward" tier.
pub const TIER_COUNT: usize = 5;

/// Upper bound on teams a competition can declare.
pub const MAX_TEAMS: u8 = 16;

/// Collectibles are minted one at a time.
pub const COLLECTIBLE_AMOUNT: u64 = 1;

// Versioning
// ==========

/// Initial version for account structures.
pub const INITIAL_VERSION: u16 = 1;
