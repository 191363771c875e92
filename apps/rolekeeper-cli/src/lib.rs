//! rolekeeper CLI
//!
//! Manages group and chain rules for a space and reconciles members of a
//! directory snapshot against them:
//! - define, extend and remove groups and chains
//! - show which rules a user complies with
//! - grant a single user's missing roles
//! - audit the whole space with live progress

use clap::{Parser, Subcommand};
use rolekeeper_reconcile::ReconcilerConfig;

pub mod commands;
pub mod context;
pub mod error;

use context::{AppContext, GlobalArgs};
use error::CliResult;

/// rolekeeper - role rule reconciliation
#[derive(Parser, Debug)]
#[command(name = "rolekeeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage group rules
    Group(commands::group::GroupArgs),

    /// Manage chain rules
    Chain(commands::chain::ChainArgs),

    /// Show a user's status against every rule
    Check(commands::check::CheckArgs),

    /// Grant a user's missing roles
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Reconcile every member of the space
    Audit(commands::audit::AuditArgs),
}

/// Run a parsed command line with the given reconciler settings.
pub async fn run(cli: Cli, mut config: ReconcilerConfig) -> CliResult<()> {
    if let Commands::Audit(args) = &cli.command {
        config.dry_run |= args.dry_run;
    }
    let ctx = AppContext::load(&cli.global, config).await?;

    match cli.command {
        Commands::Group(args) => commands::group::execute(&ctx, args).await,
        Commands::Chain(args) => commands::chain::execute(&ctx, args).await,
        Commands::Check(args) => commands::check::execute(&ctx, args).await,
        Commands::Reconcile(args) => commands::reconcile::execute(&ctx, args).await,
        Commands::Audit(args) => commands::audit::execute(&ctx, args).await,
    }
}
