use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "asha.verma@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "newPassword123", min_length = 8)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct AccountSetupConfirm {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "chosenPassword123", min_length = 8)]
    pub new_password: String,
}
