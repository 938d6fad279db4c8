use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::constants::SWAP_DEADLINE_SECS;
use crate::errors::VaultError;

// -----------------
// Seeds
// -----------------
pub const PARENT_SEED: &[u8] = b"parent_v1";
pub const WORKING_SEED: &[u8] = b"working_v1";

pub const CHILD_SEED: &[u8] = b"child_v1";
pub const CHILD_CUSTODY_SEED: &[u8] = b"child_custody_v1";
pub const CHILD_SETTLEMENT_SEED: &[u8] = b"child_settlement_v1";

pub const COMPETITION_SEED: &[u8] = b"competition_v1";
pub const COMPETITION_VAULT_SEED: &[u8] = b"competition_vault_v1";
pub const TEAM_REWARDS_SEED: &[u8] = b"team_rewards_v1";
pub const USER_STATS_SEED: &[u8] = b"user_stats_v1";

// ---------------
// Instruction payloads
// ---------------

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct InitParentArgs {
    pub manager: Pubkey,
    pub vault: Pubkey,
    pub farm_pool_id: u64,
    pub reward_query: crate::state::RewardQuery,
}

/// Slippage floors for the two swap legs of a compound.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompoundParams {
    pub min_out0: u64,
    pub min_out1: u64,
}

/// How `remaining_accounts` is cut into collaborator segments, in order.
///
/// ```plain
/// | working | farm | swap0 | swap1 | liquidity | pools | children |
/// ```
///
/// * `working`: token accounts owned by the parent (one per mint it touches)
/// * `farm`: accounts for farm CPIs; the first one is the parent's user-info
/// * `swap0` / `swap1`: accounts for the swap into token0 / token1; the
///   first one receives the output
/// * `liquidity`: accounts for `add_liquidity`; the first one receives the
///   minted stake tokens
/// * `pools`: pool state accounts and LP mints used for pricing
/// * `children`: child strategy accounts
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountLayout {
    pub working: u8,
    pub farm: u8,
    pub swap0: u8,
    pub swap1: u8,
    pub liquidity: u8,
    pub pools: u8,
    pub children: u8,
}

impl AccountLayout {
    pub fn total(&self) -> usize {
        [
            self.working,
            self.farm,
            self.swap0,
            self.swap1,
            self.liquidity,
            self.pools,
            self.children,
        ]
        .iter()
        .map(|n| *n as usize)
        .sum()
    }

    /// Cuts `items` into segments. The layout must account for every item.
    pub fn split<'a, T>(&self, items: &'a [T]) -> Result<Segments<'a, T>> {
        require!(items.len() == self.total(), VaultError::InvalidRoute);

        let mut rest = items;
        let mut take = |n: u8| {
            let (head, tail) = rest.split_at(n as usize);
            rest = tail;
            head
        };

        Ok(Segments {
            working: take(self.working),
            farm: take(self.farm),
            swap0: take(self.swap0),
            swap1: take(self.swap1),
            liquidity: take(self.liquidity),
            pools: take(self.pools),
            children: take(self.children),
        })
    }
}

#[derive(Debug)]
pub struct Segments<'a, T> {
    pub working: &'a [T],
    pub farm: &'a [T],
    pub swap0: &'a [T],
    pub swap1: &'a [T],
    pub liquidity: &'a [T],
    pub pools: &'a [T],
    pub children: &'a [T],
}

// -------------------------
// Shared helpers
// -------------------------

/// Anchor instruction discriminator: `sha256("global:<name>")[..8]`.
pub fn sighash(name: &str) -> [u8; 8] {
    let h = hashv(&[b"global:".as_ref(), name.as_bytes()]).to_bytes();
    let mut out = [0u8; 8];
    out.copy_from_slice(&h[..8]);
    out
}

/// Discriminator followed by the borsh-encoded arguments.
pub fn instruction_data<A: AnchorSerialize>(name: &str, args: &A) -> Result<Vec<u8>> {
    let mut data = sighash(name).to_vec();
    args.serialize(&mut data)
        .map_err(|_| error!(anchor_lang::error::ErrorCode::InstructionDidNotSerialize))?;
    Ok(data)
}

/// The parent's working token account for `mint`.
pub fn working_address(parent: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[WORKING_SEED, parent.as_ref(), mint.as_ref()], &crate::ID).0
}

pub fn swap_deadline(unix_timestamp: i64) -> i64 {
    unix_timestamp.saturating_add(SWAP_DEADLINE_SECS)
}
