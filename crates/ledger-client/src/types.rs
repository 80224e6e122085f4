//! Types for the ledger REST API

use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ledger backend
    pub base_url: String,
    /// Optional API key sent as a bearer token
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Ledger state as held by the backend.
///
/// Every field is optional on the wire; a user the backend has never seen
/// may come back with a partial object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactViews {
    /// Number of distinct contacts revealed
    #[serde(default)]
    pub contact_views: u32,
    /// Ids of the revealed contacts
    #[serde(default)]
    pub viewed_contacts: Vec<String>,
    /// Unlimited-access entitlement
    #[serde(default)]
    pub has_unlimited_contacts: bool,
    /// Total reveals the user is entitled to (0 = backend default)
    #[serde(default)]
    pub contact_credits: u32,
}

/// Body for `PUT /contact-views/{userId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactViews {
    pub contact_views: u32,
    pub viewed_contacts: Vec<String>,
}

/// Body for `POST /contact-credits/add`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCreditsRequest {
    pub user_id: String,
    /// Number of reveal credits being bought
    pub credits: u32,
    /// Price charged, in minor currency units
    pub amount: u64,
    pub currency: String,
}

/// Balance returned after a completed purchase.
///
/// Both fields are required; a response missing either is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCreditsResponse {
    pub contact_views: u32,
    pub contact_credits: u32,
}

/// Body for `POST /subscription/activate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateSubscriptionRequest {
    pub user_id: String,
    pub plan: String,
    pub duration: String,
}

/// Response from the activation endpoint. An empty 2xx body counts as success.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivateSubscriptionResponse {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl Default for ActivateSubscriptionResponse {
    fn default() -> Self {
        Self {
            success: true,
            message: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_views_partial_payload() {
        let views: ContactViews = serde_json::from_str(r#"{"contactViews": 2}"#).unwrap();
        assert_eq!(views.contact_views, 2);
        assert!(views.viewed_contacts.is_empty());
        assert!(!views.has_unlimited_contacts);
        assert_eq!(views.contact_credits, 0);
    }

    #[test]
    fn test_add_credits_request_is_camel_case() {
        let request = AddCreditsRequest {
            user_id: "u1".to_string(),
            credits: 7,
            amount: 700,
            currency: "USD".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["credits"], 7);
        assert_eq!(json["amount"], 700);
    }

    #[test]
    fn test_add_credits_response_requires_both_fields() {
        let result = serde_json::from_str::<AddCreditsResponse>(r#"{"contactViews": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let result = serde_json::from_str::<ContactViews>(r#"{"contactViews": -1}"#);
        assert!(result.is_err());
    }
}
