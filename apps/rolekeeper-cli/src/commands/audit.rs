//! Space-wide audit

use clap::Args;
use rolekeeper_reconcile::{AuditOutcome, AuditProgress};
use tokio::sync::mpsc;

use crate::context::AppContext;
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Report missing roles without granting them
    #[arg(long)]
    pub dry_run: bool,

    /// Save granted roles back to the directory snapshot
    #[arg(long)]
    pub write_back: bool,
}

/// Reconcile every member of the space, printing progress as it goes.
///
/// Ctrl-C stops the audit once the member in flight is done.
pub async fn execute(ctx: &AppContext, args: AuditArgs) -> CliResult<()> {
    let (tx, rx) = mpsc::channel(16);
    let json = ctx.json;
    let printer = tokio::spawn(print_progress(rx, json));

    let report = ctx
        .reconciler
        .reconcile_all_with_progress(ctx.space, Some(&tx))
        .await;
    drop(tx);
    let _ = printer.await;
    let report = report?;

    if args.write_back && !report.dry_run && report.fixed > 0 {
        ctx.save_directory().await?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.outcome == AuditOutcome::Cancelled {
        // No final message is streamed for a cancelled audit.
        println!("{report}");
    }
    Ok(())
}

async fn print_progress(mut rx: mpsc::Receiver<AuditProgress>, quiet: bool) {
    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) if !quiet => println!("{message}"),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping audit after the current member...");
                break;
            }
        }
    }
}
