//! Per-user rule status

use clap::Args;
use rolekeeper_core::UserId;

use crate::context::AppContext;
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// User to check
    pub user: UserId,
}

/// Show which roles of every rule the user holds
pub async fn execute(ctx: &AppContext, args: CheckArgs) -> CliResult<()> {
    let statuses = ctx.reconciler.check_user(ctx.space, args.user).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }
    if statuses.is_empty() {
        println!("No rules defined.");
        return Ok(());
    }

    for status in &statuses {
        println!("{} '{}'\n{status}\n", status.kind, status.rule_name);
    }
    let compliant = statuses.iter().filter(|s| s.compliant).count();
    println!(
        "User {} complies with {compliant}/{} rules.",
        args.user,
        statuses.len()
    );
    Ok(())
}
