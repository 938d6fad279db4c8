pub mod child;
pub mod competition;
pub mod parent;
