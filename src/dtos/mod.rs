pub mod accounts;
pub mod buildings;
pub mod password;
pub mod session;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid email or password")]
    pub error: String,
}

/// Plain acknowledgement body for operations with nothing else to return.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Password has been reset")]
    pub message: String,
}

pub use accounts::{SignupRequest, UpdateAccountRequest, VerificationRequest, VerifyEmailQuery};
pub use buildings::{
    AssignBuildingResponse, CreateAmenityRequest, CreateBuildingRequest, UpdateAmenityRequest,
    UpdateBuildingRequest,
};
pub use password::{AccountSetupConfirm, PasswordResetConfirm, PasswordResetRequest};
pub use session::{AccessTokenResponse, SignInRequest};
