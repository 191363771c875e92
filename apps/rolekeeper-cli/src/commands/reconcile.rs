//! Single-user reconciliation

use clap::Args;
use rolekeeper_core::UserId;

use crate::context::AppContext;
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// User to reconcile
    pub user: UserId,

    /// Save granted roles back to the directory snapshot
    #[arg(long)]
    pub write_back: bool,
}

/// Grant the user's missing roles
pub async fn execute(ctx: &AppContext, args: ReconcileArgs) -> CliResult<()> {
    let outcome = ctx.reconciler.reconcile_user(ctx.space, args.user).await?;

    if args.write_back && !outcome.granted.is_empty() {
        ctx.save_directory().await?;
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.skipped {
        println!("User {} is a service account, skipped.", args.user);
    } else if !outcome.planned.is_empty() {
        println!(
            "Would grant {} role(s): {}",
            outcome.planned.len(),
            join(&outcome.planned)
        );
    } else {
        println!("Granted {} role(s).", outcome.fixed());
        for failed in &outcome.failed {
            println!("Failed to grant {}: {}", failed.role, failed.message);
        }
    }
    Ok(())
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
