//! Chain management CLI commands

use clap::{Args, Subcommand};
use rolekeeper_core::RoleId;
use rolekeeper_rules::{CreateChainInput, RuleKind};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

/// Chain management commands
#[derive(Args, Debug)]
pub struct ChainArgs {
    #[command(subcommand)]
    pub command: ChainCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChainCommands {
    /// Create or replace a chain, lowest role first
    Add(AddArgs),

    /// Delete a chain
    Remove(RemoveArgs),

    /// List chains with role names
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Chain name
    pub name: String,

    /// Roles from lowest to highest
    #[arg(required = true)]
    pub roles: Vec<RoleId>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Chain name
    pub name: String,
}

/// Execute chain commands
pub async fn execute(ctx: &AppContext, args: ChainArgs) -> CliResult<()> {
    match args.command {
        ChainCommands::Add(a) => execute_add(ctx, a).await,
        ChainCommands::Remove(a) => execute_remove(ctx, a).await,
        ChainCommands::List => execute_list(ctx).await,
    }
}

async fn execute_add(ctx: &AppContext, args: AddArgs) -> CliResult<()> {
    let chain = ctx
        .rules()
        .create_chain(
            ctx.space,
            CreateChainInput {
                name: args.name,
                roles: args.roles,
            },
        )
        .await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
    } else {
        println!(
            "Chain '{}' saved with {} roles.",
            chain.name,
            chain.roles.len()
        );
    }
    Ok(())
}

async fn execute_remove(ctx: &AppContext, args: RemoveArgs) -> CliResult<()> {
    if !ctx.rules().remove_chain(ctx.space, &args.name).await? {
        return Err(CliError::NotFound(format!(
            "{} '{}' not found.",
            RuleKind::Chain,
            args.name
        )));
    }
    println!("Chain '{}' removed.", args.name);
    Ok(())
}

async fn execute_list(ctx: &AppContext) -> CliResult<()> {
    let views = ctx.rules().describe_chains(ctx.space).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else if views.is_empty() {
        println!("No chains defined.");
    } else {
        for view in &views {
            println!("{}\n{view}\n", view.name);
        }
    }
    Ok(())
}
