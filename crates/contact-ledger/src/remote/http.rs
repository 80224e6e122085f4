//! REST-backed remote ledger

use super::{Activation, CreditBalance, CreditOrder, RemoteLedger};
use crate::error::RemoteError;
use crate::snapshot::LedgerSnapshot;
use async_trait::async_trait;
use ledger_client::{
    ActivateSubscriptionRequest, AddCreditsRequest, ClientConfig, ContactViews, LedgerClient,
    UpdateContactViews,
};
use std::collections::BTreeSet;

/// [`RemoteLedger`] over the backend's REST API
#[derive(Debug, Clone)]
pub struct HttpRemoteLedger {
    client: LedgerClient,
}

impl HttpRemoteLedger {
    pub fn new(client: LedgerClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, RemoteError> {
        let client = LedgerClient::new(config)?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }
}

fn snapshot_from_views(user_id: &str, views: ContactViews) -> LedgerSnapshot {
    LedgerSnapshot {
        user_id: Some(user_id.to_string()),
        consumed_count: views.contact_views,
        unlocked_contact_ids: views.viewed_contacts.into_iter().collect(),
        credit_limit: views.contact_credits,
        has_unlimited_access: views.has_unlimited_contacts,
    }
}

#[async_trait]
impl RemoteLedger for HttpRemoteLedger {
    async fn fetch(&self, user_id: &str) -> Result<Option<LedgerSnapshot>, RemoteError> {
        let views = self.client.get_contact_views(user_id).await?;
        Ok(views.map(|v| snapshot_from_views(user_id, v)))
    }

    async fn push_usage(
        &self,
        user_id: &str,
        consumed_count: u32,
        unlocked_contact_ids: &BTreeSet<String>,
    ) -> Result<(), RemoteError> {
        let update = UpdateContactViews {
            contact_views: consumed_count,
            viewed_contacts: unlocked_contact_ids.iter().cloned().collect(),
        };
        self.client.put_contact_views(user_id, &update).await?;
        Ok(())
    }

    async fn purchase_credits(&self, order: &CreditOrder) -> Result<CreditBalance, RemoteError> {
        let request = AddCreditsRequest {
            user_id: order.user_id.clone(),
            credits: order.credits,
            amount: order.amount,
            currency: order.currency.clone(),
        };

        let response = self.client.add_credits(&request).await?;
        Ok(CreditBalance {
            consumed_count: response.contact_views,
            credit_limit: response.contact_credits,
        })
    }

    async fn activate_unlimited(&self, activation: &Activation) -> Result<(), RemoteError> {
        let request = ActivateSubscriptionRequest {
            user_id: activation.user_id.clone(),
            plan: activation.plan.clone(),
            duration: activation.duration.clone(),
        };

        self.client.activate_subscription(&request).await?;
        Ok(())
    }
}
