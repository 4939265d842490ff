pub mod admin;
pub mod auth;

pub use admin::admin_middleware;
pub use auth::{auth_middleware, CurrentAccount};
