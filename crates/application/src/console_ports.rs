mod auth;
mod rbac;

pub use auth::{AuthGateway, IdentitySource};
pub use rbac::RbacGateway;
