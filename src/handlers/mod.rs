pub mod accounts;
pub mod amenities;
pub mod buildings;
pub mod health;
pub mod password;
pub mod session;
