use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::RoleFlags;

/// Admin-created account. No password here: the invitee chooses one through
/// the emailed setup link.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Asha")]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Verma")]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "asha.verma@example.com")]
    pub email: String,

    pub roles: RoleFlags,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    #[schema(example = "Asha")]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    #[schema(example = "Verma")]
    pub last_name: String,

    pub roles: RoleFlags,

    #[schema(example = true)]
    pub is_active: bool,
}

/// Optional body for the verification-request endpoint. Without a target the
/// caller verifies their own email.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct VerificationRequest {
    #[serde(default)]
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyEmailQuery {
    #[param(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
}
