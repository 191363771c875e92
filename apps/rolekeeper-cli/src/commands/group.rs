//! Group management CLI commands

use clap::{Args, Subcommand};
use rolekeeper_core::RoleId;
use rolekeeper_rules::{CreateGroupInput, RuleKind};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

/// Group management commands
#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommands,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create or replace a group
    Add(AddArgs),

    /// Append a member role to a group
    AddRole(AddRoleArgs),

    /// Delete a group
    Remove(RemoveArgs),

    /// List groups with role names
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Group name
    pub name: String,

    /// Role implied by holding any member role
    pub group_role: RoleId,

    /// Member roles
    #[arg(required = true)]
    pub member_roles: Vec<RoleId>,
}

#[derive(Args, Debug)]
pub struct AddRoleArgs {
    /// Group name
    pub name: String,

    /// Role to append
    pub role: RoleId,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Group name
    pub name: String,
}

/// Execute group commands
pub async fn execute(ctx: &AppContext, args: GroupArgs) -> CliResult<()> {
    match args.command {
        GroupCommands::Add(a) => execute_add(ctx, a).await,
        GroupCommands::AddRole(a) => execute_add_role(ctx, a).await,
        GroupCommands::Remove(a) => execute_remove(ctx, a).await,
        GroupCommands::List => execute_list(ctx).await,
    }
}

async fn execute_add(ctx: &AppContext, args: AddArgs) -> CliResult<()> {
    let group = ctx
        .rules()
        .create_group(
            ctx.space,
            CreateGroupInput {
                name: args.name,
                group_role: args.group_role,
                member_roles: args.member_roles,
            },
        )
        .await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&group)?);
    } else {
        println!(
            "Group '{}' saved with {} member role(s).",
            group.name,
            group.member_roles.len()
        );
    }
    Ok(())
}

async fn execute_add_role(ctx: &AppContext, args: AddRoleArgs) -> CliResult<()> {
    let group = ctx
        .rules()
        .add_role_to_group(ctx.space, &args.name, args.role)
        .await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&group)?);
    } else {
        println!("Added role {} to group '{}'.", args.role, group.name);
    }
    Ok(())
}

async fn execute_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    if !ctx.rules().remove_group(ctx.space, &args.name).await? {
        return Err(CliError::NotFound(format!(
            "{} '{}' not found.",
            RuleKind::Group,
            args.name
        )));
    }
    println!("Group '{}' removed.", args.name);
    Ok(())
}

async fn execute_list(ctx: &AppContext) -> CliResult<()> {
    let views = ctx.rules().describe_groups(ctx.space).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else if views.is_empty() {
        println!("No groups defined.");
    } else {
        for view in &views {
            println!("{}\n{view}\n", view.name);
        }
    }
    Ok(())
}
