pub mod auth;
pub mod health;
pub mod users;

pub use auth::{login, logout, refresh, REFRESH_COOKIE};
pub use health::{health_check, not_found};
pub use users::list_users;
