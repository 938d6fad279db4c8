use anchor_lang::prelude::*;

#[event]
pub struct Harvested {
    pub caller: Pubkey,
    pub amount_harvested: u64,
    pub tvl_after: u64,
}
