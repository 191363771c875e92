//! Rule definitions, storage and the compliance evaluator.
//!
//! Administrators declare two kinds of rules per space:
//!
//! - A [`Group`]: holding any member role implies holding the group role
//! - A [`Chain`]: holding a rung implies holding every rung below it
//!
//! # Modules
//!
//! - [`types`] - Rule types and the persisted per-space layout
//! - [`validation`] - Shape and manageability checks run at creation time
//! - [`store`] - [`RuleStore`] trait and the in-memory backend
//! - [`file_store`] - JSON file backend
//! - [`evaluator`] - Pure compliance evaluation
//! - [`status`] - Name-resolved views and per-user rule status
//! - [`service`] - [`RuleService`], the administrative entry point
//!
//! # Example
//!
//! ```
//! use rolekeeper_core::{RoleId, RoleSet};
//! use rolekeeper_rules::{evaluate, Chain, Rule};
//!
//! let ladder = Rule::from(Chain {
//!     name: "progression".to_string(),
//!     roles: vec![RoleId::new(1), RoleId::new(2), RoleId::new(3)],
//! });
//! let held: RoleSet = [RoleId::new(3)].into_iter().collect();
//!
//! let grants = evaluate(&held, [&ladder]);
//! let roles: Vec<_> = grants.iter().map(|g| g.role).collect();
//! assert_eq!(roles, vec![RoleId::new(1), RoleId::new(2)]);
//! ```

pub mod error;
pub mod evaluator;
pub mod file_store;
pub mod service;
pub mod status;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{DefinitionError, Result, RuleError};
pub use evaluator::{evaluate, evaluate_chain, evaluate_group, evaluate_rule, Grant};
pub use file_store::JsonFileRuleStore;
pub use service::{CreateChainInput, CreateGroupInput, RuleService};
pub use status::{
    is_valid, rule_status, ChainView, GroupView, RoleCheck, RoleLabel, RoleNames, RuleStatus,
};
pub use store::{InMemoryRuleStore, RuleStore};
pub use types::{Chain, Group, Rule, RuleKind, SpaceRules};
