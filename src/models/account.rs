use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Privilege tier derived from the role flags, never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    User,
    Admin,
    Superadmin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::User => "user",
            AccountType::Admin => "admin",
            AccountType::Superadmin => "superadmin",
        }
    }

    /// Admins and superadmins may reach the administrative surface.
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, AccountType::Admin | AccountType::Superadmin)
    }
}

/// The six mutually exclusive role flags carried on every account.
///
/// Exactly one flag is true at any committed state; `RolePolicy::validate`
/// enforces this before any write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleFlags {
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_supervisor: bool,
    #[serde(default)]
    pub is_manager: bool,
    #[serde(default)]
    pub is_security: bool,
    #[serde(default)]
    pub is_resident: bool,
}

impl RoleFlags {
    pub fn super_admin() -> Self {
        Self {
            is_super_admin: true,
            ..Default::default()
        }
    }

    pub fn admin() -> Self {
        Self {
            is_admin: true,
            ..Default::default()
        }
    }

    pub fn supervisor() -> Self {
        Self {
            is_supervisor: true,
            ..Default::default()
        }
    }

    pub fn manager() -> Self {
        Self {
            is_manager: true,
            ..Default::default()
        }
    }

    pub fn security() -> Self {
        Self {
            is_security: true,
            ..Default::default()
        }
    }

    pub fn resident() -> Self {
        Self {
            is_resident: true,
            ..Default::default()
        }
    }
}

/// Who performed a write and when. Stamped on accounts and buildings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActorStamp {
    pub account_id: String,
    pub name: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
}

impl ActorStamp {
    pub fn of(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            name: format!("{} {}", account.first_name, account.last_name),
            timestamp: Utc::now(),
        }
    }
}

/// Compact building reference stored on accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssignedBuilding {
    pub building_id: String,
    pub name: String,
}

/// One field-level change captured for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldChange {
    #[schema(example = "roles.is_manager")]
    pub field: String,
    pub old_value: String,
    pub updated_value: String,
}

/// Account document, collection `accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Argon2 hash in PHC string format. Never leaves the service.
    pub password: String,
    pub account_type: AccountType,
    pub roles: RoleFlags,
    #[serde(default)]
    pub buildings: Vec<AssignedBuilding>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<ActorStamp>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        account_type: AccountType,
        roles: RoleFlags,
        created_by: Option<ActorStamp>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password: password_hash,
            account_type,
            roles,
            buildings: Vec::new(),
            is_active: true,
            is_verified: false,
            created_by,
            last_updated_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Response view with the password hash stripped.
    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse::from(self.clone())
    }

    /// Field-level diff between two snapshots of the same account, used to
    /// populate the audit trail on updates. Covers the mutable scalar fields.
    pub fn diff(old: &Account, new: &Account) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        let mut push = |field: &str, old_value: String, updated_value: String| {
            if old_value != updated_value {
                changes.push(FieldChange {
                    field: field.to_string(),
                    old_value,
                    updated_value,
                });
            }
        };

        push(
            "first_name",
            old.first_name.clone(),
            new.first_name.clone(),
        );
        push("last_name", old.last_name.clone(), new.last_name.clone());
        push(
            "account_type",
            old.account_type.as_str().to_string(),
            new.account_type.as_str().to_string(),
        );
        push(
            "is_active",
            old.is_active.to_string(),
            new.is_active.to_string(),
        );
        push(
            "is_verified",
            old.is_verified.to_string(),
            new.is_verified.to_string(),
        );

        let flag_fields = [
            ("roles.is_super_admin", old.roles.is_super_admin, new.roles.is_super_admin),
            ("roles.is_admin", old.roles.is_admin, new.roles.is_admin),
            ("roles.is_supervisor", old.roles.is_supervisor, new.roles.is_supervisor),
            ("roles.is_manager", old.roles.is_manager, new.roles.is_manager),
            ("roles.is_security", old.roles.is_security, new.roles.is_security),
            ("roles.is_resident", old.roles.is_resident, new.roles.is_resident),
        ];
        for (field, old_flag, new_flag) in flag_fields {
            push(field, old_flag.to_string(), new_flag.to_string());
        }

        changes
    }
}

/// Account view returned by the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[schema(example = "resident@example.com")]
    pub email: String,
    pub account_type: AccountType,
    pub roles: RoleFlags,
    pub buildings: Vec<AssignedBuilding>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<ActorStamp>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
            email: a.email,
            account_type: a.account_type,
            roles: a.roles,
            buildings: a.buildings,
            is_active: a.is_active,
            is_verified: a.is_verified,
            created_by: a.created_by,
            last_updated_by: a.last_updated_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account::new(
            "Asha".to_string(),
            "Verma".to_string(),
            "asha@example.com".to_string(),
            "$argon2id$stub".to_string(),
            AccountType::User,
            RoleFlags::resident(),
            None,
        )
    }

    #[test]
    fn test_new_account_defaults() {
        let account = sample_account();
        assert!(account.is_active);
        assert!(!account.is_verified);
        assert!(account.buildings.is_empty());
        assert!(account.created_by.is_none());
    }

    #[test]
    fn test_sanitized_response_has_no_password() {
        let account = sample_account();
        let json = serde_json::to_value(account.sanitized()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "asha@example.com");
    }

    #[test]
    fn test_diff_reports_changed_fields_only() {
        let old = sample_account();
        let mut new = old.clone();
        new.last_name = "Sharma".to_string();
        new.roles = RoleFlags::manager();
        new.account_type = AccountType::User;

        let changes = Account::diff(&old, &new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"last_name"));
        assert!(fields.contains(&"roles.is_resident"));
        assert!(fields.contains(&"roles.is_manager"));
        assert!(!fields.contains(&"first_name"));
        assert!(!fields.contains(&"account_type"));
    }

    #[test]
    fn test_diff_identical_accounts_is_empty() {
        let account = sample_account();
        assert!(Account::diff(&account, &account.clone()).is_empty());
    }
}
