//! Entitlement gate
//!
//! Turns engine state into UI decisions and copy. Holds no state of its own.

use crate::engine::CreditEngine;
use crate::error::LedgerResult;
use crate::snapshot::RemainingCredits;
use async_trait::async_trait;

/// Result of trying to open a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAccess {
    /// Previously unlocked (or unlimited access); nothing was spent
    AlreadyUnlocked,
    /// A credit was spent to unlock it now
    Unlocked,
    /// No credit left; show the upgrade prompt
    Blocked,
}

impl ContactAccess {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, ContactAccess::Blocked)
    }
}

/// Copy and options for the paywall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePrompt {
    pub title: String,
    pub message: String,
    /// Credit pack offered by the "buy" option
    pub suggested_credits: u32,
    /// Price of the suggested pack in minor units
    pub suggested_price: u64,
    pub currency: String,
}

/// What the user picked on the paywall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeChoice {
    Unlimited,
    BuyCredits(u32),
    Dismiss,
}

/// What came of showing the paywall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// The user can still view contacts; nothing was shown
    NotNeeded,
    Dismissed,
    Upgraded,
    CreditsAdded { remaining: RemainingCredits },
}

/// Presents the paywall and reports the user's choice
#[async_trait]
pub trait UpgradePresenter: Send + Sync {
    async fn choose(&self, prompt: &UpgradePrompt) -> UpgradeChoice;
}

/// Always answers with the same choice
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub UpgradeChoice);

#[async_trait]
impl UpgradePresenter for FixedChoice {
    async fn choose(&self, _prompt: &UpgradePrompt) -> UpgradeChoice {
        self.0
    }
}

/// UI-facing view over a [`CreditEngine`]
pub struct EntitlementGate<'a> {
    engine: &'a CreditEngine,
}

impl<'a> EntitlementGate<'a> {
    pub fn new(engine: &'a CreditEngine) -> Self {
        Self { engine }
    }

    /// "Unlimited" or the number of reveals left
    pub fn remaining_credits_label(&self) -> String {
        self.engine.remaining_credits().to_string()
    }

    /// e.g. "3 of 7 contacts left"
    pub fn usage_label(&self) -> String {
        let snapshot = self.engine.snapshot();
        match snapshot.remaining_credits() {
            RemainingCredits::Unlimited => "Unlimited contacts".to_string(),
            RemainingCredits::Limited(left) => {
                format!("{} of {} contacts left", left, snapshot.credit_limit)
            }
        }
    }

    /// Open a contact, spending a credit only when needed
    pub async fn view_contact(&self, contact_id: &str) -> LedgerResult<ContactAccess> {
        let snapshot = self.engine.snapshot();
        if snapshot.has_unlimited_access || snapshot.is_contact_unlocked(contact_id) {
            return Ok(ContactAccess::AlreadyUnlocked);
        }
        if !snapshot.can_view_contact() {
            tracing::debug!(contact_id, "Contact reveal blocked, no credits left");
            return Ok(ContactAccess::Blocked);
        }

        self.engine.unlock_contact(contact_id).await?;
        Ok(ContactAccess::Unlocked)
    }

    /// Paywall copy for the current state
    pub fn upgrade_prompt(&self) -> UpgradePrompt {
        let purchase = self.engine.purchase_config();
        let pack = self.engine.default_limit();
        UpgradePrompt {
            title: "You've used all your free contacts".to_string(),
            message: format!(
                "Get unlimited contacts, or buy {} more for {} {}.",
                pack,
                format_minor_units(purchase.price_for(pack)),
                purchase.currency
            ),
            suggested_credits: pack,
            suggested_price: purchase.price_for(pack),
            currency: purchase.currency.clone(),
        }
    }

    /// Show the paywall if the user is out of credits and act on the choice
    pub async fn prompt_upgrade(&self, presenter: &dyn UpgradePresenter) -> LedgerResult<PromptOutcome> {
        if self.engine.can_view_contact() {
            return Ok(PromptOutcome::NotNeeded);
        }

        let prompt = self.upgrade_prompt();
        match presenter.choose(&prompt).await {
            UpgradeChoice::Unlimited => {
                self.engine.grant_unlimited_access().await?;
                Ok(PromptOutcome::Upgraded)
            }
            UpgradeChoice::BuyCredits(credits) => {
                self.engine.add_credits(credits).await?;
                Ok(PromptOutcome::CreditsAdded {
                    remaining: self.engine.remaining_credits(),
                })
            }
            UpgradeChoice::Dismiss => Ok(PromptOutcome::Dismissed),
        }
    }
}

fn format_minor_units(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}
