//! Chain-agnostic core. Everything here operates on account state plus the
//! collaborator traits in [`interfaces`], so it runs unchanged under test.

pub mod child;
pub mod competition;
pub mod epoch;
pub mod guard;
pub mod interfaces;
pub mod pricing;

#[cfg(test)]
pub mod testing;
