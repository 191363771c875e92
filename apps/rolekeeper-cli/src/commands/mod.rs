//! Command implementations

pub mod audit;
pub mod chain;
pub mod check;
pub mod group;
pub mod reconcile;
