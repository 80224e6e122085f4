//! Ledger subcommands
//!
//! Each command runs against a loaded engine and returns the text to print.

use async_trait::async_trait;
use clap::Subcommand;
use contact_ledger::{
    ContactAccess, CreditEngine, EntitlementGate, LedgerSnapshot, RemainingCredits, SyncReport,
    UpgradeChoice, UpgradePresenter, UpgradePrompt,
};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Subcommand)]
pub enum LedgerCommands {
    /// Show remaining credits and sync state
    Status {
        /// Print the full ledger and sync report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spend a credit on a contact without checking the limit
    Unlock {
        /// Contact id
        contact_id: String,
    },

    /// Open a contact, showing the paywall when out of credits
    View {
        /// Contact id
        contact_id: String,
    },

    /// Buy more credits
    Buy {
        /// Number of credits
        credits: u32,
    },

    /// Activate unlimited access
    Upgrade,
}

/// Prints the paywall and leaves the choice to a follow-up `buy` or `upgrade`
struct TerminalPresenter;

#[async_trait]
impl UpgradePresenter for TerminalPresenter {
    async fn choose(&self, prompt: &UpgradePrompt) -> UpgradeChoice {
        println!("{}", prompt.title);
        println!("{}", prompt.message);
        println!(
            "Run `contact-ledger upgrade` or `contact-ledger buy {}`.",
            prompt.suggested_credits
        );
        UpgradeChoice::Dismiss
    }
}

/// Machine-readable `status` output
#[derive(Debug, Serialize)]
struct StatusReport {
    ledger: LedgerSnapshot,
    remaining: RemainingCredits,
    sync: SyncReport,
}

pub async fn execute_command(
    engine: &CreditEngine,
    cmd: LedgerCommands,
) -> anyhow::Result<String> {
    let gate = EntitlementGate::new(engine);
    let mut out = String::new();

    // Writing to a String cannot fail
    match cmd {
        LedgerCommands::Status { json: true } => {
            let report = StatusReport {
                ledger: engine.snapshot(),
                remaining: engine.remaining_credits(),
                sync: engine.sync_report(),
            };
            return Ok(serde_json::to_string_pretty(&report)?);
        }
        LedgerCommands::Status { json: false } => {
            let snapshot = engine.snapshot();
            let report = engine.sync_report();
            let _ = writeln!(
                out,
                "User: {}",
                snapshot.user_id.as_deref().unwrap_or("(anonymous)")
            );
            let _ = writeln!(out, "Unlocked contacts: {}", snapshot.unlocked_len());
            let _ = writeln!(
                out,
                "Sync: {} pushed, {} failed",
                report.pushes_succeeded, report.pushes_failed
            );
        }
        LedgerCommands::Unlock { contact_id } => {
            engine.unlock_contact(&contact_id).await?;
            let _ = writeln!(out, "Unlocked {}", contact_id);
        }
        LedgerCommands::View { contact_id } => match gate.view_contact(&contact_id).await? {
            ContactAccess::AlreadyUnlocked => {
                let _ = writeln!(out, "{} (already unlocked)", contact_id);
            }
            ContactAccess::Unlocked => {
                let _ = writeln!(out, "{} (unlocked, 1 credit spent)", contact_id);
            }
            ContactAccess::Blocked => {
                gate.prompt_upgrade(&TerminalPresenter).await?;
                let _ = writeln!(out, "{} is locked", contact_id);
            }
        },
        LedgerCommands::Buy { credits } => {
            let balance = engine.add_credits(credits).await?;
            let _ = writeln!(
                out,
                "Bought {} credits, limit is now {}",
                credits, balance.credit_limit
            );
        }
        LedgerCommands::Upgrade => {
            engine.grant_unlimited_access().await?;
            let _ = writeln!(out, "Unlimited access activated");
        }
    }

    let _ = write!(
        out,
        "{} ({} remaining)",
        gate.usage_label(),
        gate.remaining_credits_label()
    );
    Ok(out)
}
