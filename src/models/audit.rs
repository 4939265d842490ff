use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::account::{Account, FieldChange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// The account an audited action targeted, when one is known.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImpactedAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub email: String,
}

/// Audit trail entry, collection `audits`. Written for every account
/// mutation attempt, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub id: Option<mongodb::bson::oid::ObjectId>,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_email: String,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impacted: Option<ImpactedAccount>,
    #[schema(example = "Account created")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor: &Account, action: AuditAction, outcome: AuditOutcome, message: impl Into<String>) -> Self {
        Self {
            id: None,
            actor_id: actor.id.clone(),
            actor_name: actor.full_name(),
            actor_email: actor.email.clone(),
            action,
            outcome,
            impacted: None,
            message: message.into(),
            changes: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn success(actor: &Account, action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(actor, action, AuditOutcome::Success, message)
    }

    pub fn failure(actor: &Account, action: AuditAction, message: impl Into<String>) -> Self {
        Self::new(actor, action, AuditOutcome::Failure, message)
    }

    pub fn impacting(mut self, account_id: Option<String>, email: impl Into<String>) -> Self {
        self.impacted = Some(ImpactedAccount {
            account_id,
            email: email.into(),
        });
        self
    }

    pub fn with_changes(mut self, changes: Vec<FieldChange>) -> Self {
        self.changes = changes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{AccountType, RoleFlags};

    fn actor() -> Account {
        Account::new(
            "Root".to_string(),
            "Admin".to_string(),
            "root@example.com".to_string(),
            "$argon2id$stub".to_string(),
            AccountType::Superadmin,
            RoleFlags::super_admin(),
            None,
        )
    }

    #[test]
    fn test_failure_entry_carries_impacted_identity() {
        let entry = AuditRecord::failure(&actor(), AuditAction::Insert, "Role conflict")
            .impacting(None, "new@example.com");

        assert_eq!(entry.outcome, AuditOutcome::Failure);
        assert_eq!(entry.actor_email, "root@example.com");
        let impacted = entry.impacted.unwrap();
        assert_eq!(impacted.email, "new@example.com");
        assert!(impacted.account_id.is_none());
    }

    #[test]
    fn test_changes_are_omitted_from_bson_when_empty() {
        let entry = AuditRecord::success(&actor(), AuditAction::Update, "No-op update");
        let doc = mongodb::bson::to_document(&entry).unwrap();
        assert!(!doc.contains_key("changes"));
        assert!(doc.contains_key("timestamp"));
    }
}
