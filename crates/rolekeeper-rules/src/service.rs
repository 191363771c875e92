//! Rule service.
//!
//! Administrative operations over a [`RuleStore`], checked against the live
//! [`RoleDirectory`]. Validity of stored rules is re-derived on every call:
//! a rule that references a deleted role stays stored but is left out of
//! [`RuleService::valid_rules`].

use std::collections::HashSet;
use std::sync::Arc;

use rolekeeper_core::{RoleDirectory, RoleId, SpaceId};
use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, Result, RuleError};
use crate::status::{is_valid, ChainView, GroupView, RoleNames};
use crate::store::RuleStore;
use crate::types::{Chain, Group, Rule, RuleKind};
use crate::validation::{check_chain_shape, check_group_shape, check_manageable};

/// Input for creating or replacing a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupInput {
    /// Group name.
    pub name: String,
    /// The implied role.
    pub group_role: RoleId,
    /// Roles that imply the group role.
    pub member_roles: Vec<RoleId>,
}

/// Input for creating or replacing a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChainInput {
    /// Chain name.
    pub name: String,
    /// Rungs, lowest first.
    pub roles: Vec<RoleId>,
}

/// Service for managing rule definitions.
#[derive(Clone)]
pub struct RuleService {
    store: Arc<dyn RuleStore>,
    directory: Arc<dyn RoleDirectory>,
}

impl RuleService {
    /// Create a new rule service.
    pub fn new(store: Arc<dyn RuleStore>, directory: Arc<dyn RoleDirectory>) -> Self {
        Self { store, directory }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// The underlying directory.
    #[must_use]
    pub fn directory(&self) -> &Arc<dyn RoleDirectory> {
        &self.directory
    }

    /// Create a group, replacing any group with the same name.
    pub async fn create_group(&self, space_id: SpaceId, input: CreateGroupInput) -> Result<Group> {
        check_group_shape(&input.name, &input.member_roles)?;
        if input.member_roles.contains(&input.group_role) {
            return Err(DefinitionError::DuplicateRole {
                kind: RuleKind::Group,
                name: input.name.trim().to_string(),
                role: input.group_role,
            }
            .into());
        }

        let group = Group {
            name: input.name.trim().to_string(),
            group_role: input.group_role,
            member_roles: input.member_roles,
        };
        let roles: Vec<RoleId> = group.referenced_roles().collect();
        check_manageable(self.directory.as_ref(), space_id, &roles).await?;

        let previous = self.store.upsert_group(space_id, group.clone()).await?;

        tracing::info!(
            space_id = %space_id,
            group = %group.name,
            members = group.member_roles.len(),
            replaced = previous.is_some(),
            "Group saved"
        );

        Ok(group)
    }

    /// Create a chain, replacing any chain with the same name.
    pub async fn create_chain(&self, space_id: SpaceId, input: CreateChainInput) -> Result<Chain> {
        check_chain_shape(&input.name, &input.roles)?;

        let chain = Chain {
            name: input.name.trim().to_string(),
            roles: input.roles,
        };
        check_manageable(self.directory.as_ref(), space_id, &chain.roles).await?;

        let previous = self.store.upsert_chain(space_id, chain.clone()).await?;

        tracing::info!(
            space_id = %space_id,
            chain = %chain.name,
            rungs = chain.roles.len(),
            replaced = previous.is_some(),
            "Chain saved"
        );

        Ok(chain)
    }

    /// Append a member role to an existing group.
    pub async fn add_role_to_group(
        &self,
        space_id: SpaceId,
        group_name: &str,
        role_id: RoleId,
    ) -> Result<Group> {
        let group_name = group_name.trim();
        let mut group = self
            .store
            .get_group(space_id, group_name)
            .await?
            .ok_or_else(|| RuleError::NotFound {
                kind: RuleKind::Group,
                name: group_name.to_string(),
            })?;

        let role = self
            .directory
            .resolve_role(space_id, role_id)
            .await?
            .ok_or(DefinitionError::UnknownRoles {
                roles: vec![role_id],
            })?;

        if group.member_roles.contains(&role_id) {
            return Err(DefinitionError::DuplicateMember {
                group: group.name,
                role_name: role.name,
            }
            .into());
        }
        if group.group_role == role_id {
            return Err(DefinitionError::DuplicateRole {
                kind: RuleKind::Group,
                name: group.name,
                role: role_id,
            }
            .into());
        }
        check_manageable(self.directory.as_ref(), space_id, &[role_id]).await?;

        group.member_roles.push(role_id);
        self.store.upsert_group(space_id, group.clone()).await?;

        tracing::info!(
            space_id = %space_id,
            group = %group.name,
            role = %role.name,
            "Role added to group"
        );

        Ok(group)
    }

    /// Remove a group by its trimmed name. Returns `false` if it did not exist.
    pub async fn remove_group(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        let name = name.trim();
        let removed = self.store.remove_group(space_id, name).await?;
        if removed {
            tracing::info!(space_id = %space_id, group = %name, "Group removed");
        }
        Ok(removed)
    }

    /// Remove a chain by its trimmed name. Returns `false` if it did not exist.
    pub async fn remove_chain(&self, space_id: SpaceId, name: &str) -> Result<bool> {
        let name = name.trim();
        let removed = self.store.remove_chain(space_id, name).await?;
        if removed {
            tracing::info!(space_id = %space_id, chain = %name, "Chain removed");
        }
        Ok(removed)
    }

    /// Every stored group, valid or not.
    pub async fn list_groups(&self, space_id: SpaceId) -> Result<Vec<Group>> {
        self.store.list_groups(space_id).await
    }

    /// Every stored chain, valid or not.
    pub async fn list_chains(&self, space_id: SpaceId) -> Result<Vec<Chain>> {
        self.store.list_chains(space_id).await
    }

    /// Every stored rule, groups first, valid or not.
    pub async fn list_rules(&self, space_id: SpaceId) -> Result<Vec<Rule>> {
        Ok(self.store.space_rules(space_id).await?.rules())
    }

    /// Resolve the names of every role the rules reference.
    ///
    /// Deleted roles are absent from the result. Each distinct role is
    /// resolved once.
    pub async fn resolve_names(&self, space_id: SpaceId, rules: &[Rule]) -> Result<RoleNames> {
        let mut seen = HashSet::new();
        let mut names = RoleNames::new();
        for role_id in rules.iter().flat_map(Rule::referenced_roles) {
            if !seen.insert(role_id) {
                continue;
            }
            if let Some(role) = self.directory.resolve_role(space_id, role_id).await? {
                names.insert(role_id, role.name);
            }
        }
        Ok(names)
    }

    /// Rules whose referenced roles all still exist.
    pub async fn valid_rules(&self, space_id: SpaceId) -> Result<Vec<Rule>> {
        let rules = self.list_rules(space_id).await?;
        let names = self.resolve_names(space_id, &rules).await?;

        let (valid, invalid): (Vec<Rule>, Vec<Rule>) = rules
            .into_iter()
            .partition(|rule| is_valid(rule, &names));

        for rule in &invalid {
            tracing::debug!(space_id = %space_id, rule = %rule, "Skipping rule with deleted roles");
        }

        Ok(valid)
    }

    /// Groups whose referenced roles all still exist.
    pub async fn valid_groups(&self, space_id: SpaceId) -> Result<Vec<Group>> {
        Ok(self
            .valid_rules(space_id)
            .await?
            .into_iter()
            .filter_map(|rule| match rule {
                Rule::Group(g) => Some(g),
                Rule::Chain(_) => None,
            })
            .collect())
    }

    /// Chains whose referenced roles all still exist.
    pub async fn valid_chains(&self, space_id: SpaceId) -> Result<Vec<Chain>> {
        Ok(self
            .valid_rules(space_id)
            .await?
            .into_iter()
            .filter_map(|rule| match rule {
                Rule::Chain(c) => Some(c),
                Rule::Group(_) => None,
            })
            .collect())
    }

    /// Every stored group with role names resolved.
    pub async fn describe_groups(&self, space_id: SpaceId) -> Result<Vec<GroupView>> {
        let groups = self.list_groups(space_id).await?;
        let rules: Vec<Rule> = groups.iter().cloned().map(Rule::from).collect();
        let names = self.resolve_names(space_id, &rules).await?;
        Ok(groups.iter().map(|g| GroupView::new(g, &names)).collect())
    }

    /// Every stored chain with role names resolved.
    pub async fn describe_chains(&self, space_id: SpaceId) -> Result<Vec<ChainView>> {
        let chains = self.list_chains(space_id).await?;
        let rules: Vec<Rule> = chains.iter().cloned().map(Rule::from).collect();
        let names = self.resolve_names(space_id, &rules).await?;
        Ok(chains.iter().map(|c| ChainView::new(c, &names)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRuleStore;
    use rolekeeper_core::InMemoryRoleDirectory;

    const SPACE: SpaceId = SpaceId::new(1);
    const MEMBER: RoleId = RoleId::new(1);
    const SQUIRE: RoleId = RoleId::new(2);
    const KNIGHT: RoleId = RoleId::new(3);
    const ADMIN: RoleId = RoleId::new(9);

    async fn setup() -> (RuleService, Arc<InMemoryRoleDirectory>) {
        let directory = Arc::new(InMemoryRoleDirectory::new());
        directory.set_acting_position(SPACE, 50).await;
        directory.add_role(SPACE, MEMBER, "Member", 1).await;
        directory.add_role(SPACE, SQUIRE, "Squire", 2).await;
        directory.add_role(SPACE, KNIGHT, "Knight", 3).await;
        directory.add_role(SPACE, ADMIN, "Admin", 90).await;

        let service = RuleService::new(Arc::new(InMemoryRuleStore::new()), directory.clone());
        (service, directory)
    }

    fn knights() -> CreateGroupInput {
        CreateGroupInput {
            name: "Knights".to_string(),
            group_role: KNIGHT,
            member_roles: vec![SQUIRE],
        }
    }

    #[tokio::test]
    async fn test_create_group_persists() {
        let (service, _) = setup().await;
        let group = service.create_group(SPACE, knights()).await.unwrap();
        assert_eq!(service.list_groups(SPACE).await.unwrap(), vec![group]);
    }

    #[tokio::test]
    async fn test_names_are_trimmed_on_every_entry_point() {
        let (service, _) = setup().await;
        let padded = CreateGroupInput {
            name: "  Knights ".to_string(),
            ..knights()
        };
        let group = service.create_group(SPACE, padded).await.unwrap();
        assert_eq!(group.name, "Knights");

        let group = service
            .add_role_to_group(SPACE, " Knights ", MEMBER)
            .await
            .unwrap();
        assert_eq!(group.member_roles, vec![SQUIRE, MEMBER]);
        assert!(service.remove_group(SPACE, " Knights ").await.unwrap());

        service
            .create_chain(
                SPACE,
                CreateChainInput {
                    name: " ladder".to_string(),
                    roles: vec![MEMBER, SQUIRE],
                },
            )
            .await
            .unwrap();
        assert!(service.remove_chain(SPACE, "ladder  ").await.unwrap());
    }

    #[tokio::test]
    async fn test_unmanageable_role_persists_nothing() {
        let (service, _) = setup().await;
        let result = service
            .create_chain(
                SPACE,
                CreateChainInput {
                    name: "ladder".to_string(),
                    roles: vec![MEMBER, ADMIN],
                },
            )
            .await;

        match result {
            Err(RuleError::Definition(DefinitionError::UnmanageableRoles { names })) => {
                assert_eq!(names, vec!["Admin".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(service.list_chains(SPACE).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_role_cannot_be_a_member() {
        let (service, _) = setup().await;
        let result = service
            .create_group(
                SPACE,
                CreateGroupInput {
                    member_roles: vec![SQUIRE, KNIGHT],
                    ..knights()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(RuleError::Definition(DefinitionError::DuplicateRole { .. }))
        ));
    }

    #[tokio::test]
    async fn test_add_role_to_group() {
        let (service, _) = setup().await;
        service.create_group(SPACE, knights()).await.unwrap();

        let group = service
            .add_role_to_group(SPACE, "Knights", MEMBER)
            .await
            .unwrap();
        assert_eq!(group.member_roles, vec![SQUIRE, MEMBER]);

        let again = service.add_role_to_group(SPACE, "Knights", MEMBER).await;
        assert_eq!(
            again.unwrap_err().to_string(),
            "Role 'Member' is already in group 'Knights'."
        );
    }

    #[tokio::test]
    async fn test_add_role_to_missing_group() {
        let (service, _) = setup().await;
        let result = service.add_role_to_group(SPACE, "ghost", MEMBER).await;
        assert!(matches!(result, Err(RuleError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deleted_role_excludes_rule_but_keeps_it_stored() {
        let (service, directory) = setup().await;
        service.create_group(SPACE, knights()).await.unwrap();
        service
            .create_chain(
                SPACE,
                CreateChainInput {
                    name: "ladder".to_string(),
                    roles: vec![MEMBER, SQUIRE],
                },
            )
            .await
            .unwrap();

        directory.remove_role(SPACE, KNIGHT).await;

        assert!(service.valid_groups(SPACE).await.unwrap().is_empty());
        assert_eq!(service.valid_chains(SPACE).await.unwrap().len(), 1);
        assert_eq!(service.list_groups(SPACE).await.unwrap().len(), 1);

        let views = service.describe_groups(SPACE).await.unwrap();
        assert_eq!(
            views[0].to_string(),
            "Group Role: <Deleted Role: 3>\nMembers: Squire"
        );
    }

    #[tokio::test]
    async fn test_remove_reports_absence() {
        let (service, _) = setup().await;
        assert!(!service.remove_group(SPACE, "Knights").await.unwrap());
        service.create_group(SPACE, knights()).await.unwrap();
        assert!(service.remove_group(SPACE, "Knights").await.unwrap());
    }
}
