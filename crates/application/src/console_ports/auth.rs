use async_trait::async_trait;

use keystone_core::AppResult;
use keystone_domain::{Identity, LoginCredentials};

/// Port for the current-identity endpoint.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Fetches the identity bound to the current session.
    ///
    /// Any error, including a missing session, means "not authenticated".
    async fn fetch_current_identity(&self) -> AppResult<Identity>;
}

/// Port for the opaque login and logout endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Establishes a server session for the credentials.
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<()>;

    /// Ends the server session.
    async fn logout(&self) -> AppResult<()>;
}
