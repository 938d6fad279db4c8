//! Reentrancy guard over a persisted `processing` flag.
//!
//! The flag must be flushed to account data before the first CPI; a
//! collaborator calling back into the strategy then loads `processing == true`
//! and is rejected.

use anchor_lang::prelude::*;

use crate::errors::VaultError;

pub fn enter(processing: &mut bool) -> Result<()> {
    require!(!*processing, VaultError::Reentrancy);
    *processing = true;
    Ok(())
}

pub fn leave(processing: &mut bool) {
    *processing = false;
}
