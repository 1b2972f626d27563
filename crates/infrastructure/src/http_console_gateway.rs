use std::time::Duration;

use async_trait::async_trait;
use keystone_application::{AuthGateway, IdentitySource, RbacGateway};
use keystone_core::{AppError, AppResult};
use keystone_domain::{
    CreateRoleInput, Identity, LoginCredentials, Permission, Role, RoleId, RoleMetadataUpdate,
    UserId, UserSummary,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

const USER_PAGE_SIZE: u32 = 100;

/// Console API client authenticated through the server's session cookies.
#[derive(Clone)]
pub struct HttpConsoleGateway {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpConsoleGateway {
    /// Creates a gateway with its own cookie-holding HTTP client.
    pub fn new(base_url: Url, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::with_client(http_client, base_url))
    }

    /// Creates a gateway around an existing client.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        Self {
            http_client,
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| AppError::Internal(format!("invalid endpoint '{path}': {error}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%request_id, %method, %url, "console api request");

        self.http_client
            .request(method, url)
            .header("X-Request-Id", request_id.to_string())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|error| AppError::Transport(format!("console api unreachable: {error}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, body.as_str()))
    }

    async fn send_json<T>(&self, builder: reqwest::RequestBuilder) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|error| AppError::Transport(format!("invalid console api response: {error}")))
    }

    async fn get_json<T>(&self, path: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send_json(self.request(reqwest::Method::GET, url)).await
    }
}

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RolePermissionsPayload {
    permission_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UserRolesPayload {
    role_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    code: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        let detail = match &self.detail {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        let message = detail.or_else(|| self.error.clone())?;
        Some(match &self.code {
            Some(code) => format!("{message} ({code})"),
            None => message,
        })
    }
}

/// Maps a failed response onto the error taxonomy.
fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        });

    match status {
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        _ => AppError::Transport(format!("console api returned {status}: {message}")),
    }
}

#[async_trait]
impl IdentitySource for HttpConsoleGateway {
    async fn fetch_current_identity(&self) -> AppResult<Identity> {
        self.get_json("auth/me").await
    }
}

#[async_trait]
impl AuthGateway for HttpConsoleGateway {
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<()> {
        let url = self.endpoint("auth/login")?;
        let payload = LoginPayload {
            email: credentials.email().as_str(),
            password: credentials.password(),
        };

        self.send(self.request(reqwest::Method::POST, url).json(&payload))
            .await
            .map(|_| ())
    }

    async fn logout(&self) -> AppResult<()> {
        let url = self.endpoint("auth/logout")?;
        self.send(self.request(reqwest::Method::POST, url))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl RbacGateway for HttpConsoleGateway {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.get_json("roles").await
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        self.get_json("permissions").await
    }

    async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let mut url = self.endpoint("users")?;
        url.query_pairs_mut()
            .append_pair("skip", "0")
            .append_pair("limit", USER_PAGE_SIZE.to_string().as_str());

        self.send_json(self.request(reqwest::Method::GET, url)).await
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let url = self.endpoint("roles")?;
        self.send_json(self.request(reqwest::Method::POST, url).json(&input))
            .await
    }

    async fn update_role_metadata(
        &self,
        role_id: RoleId,
        update: RoleMetadataUpdate,
    ) -> AppResult<Role> {
        let url = self.endpoint(format!("roles/{role_id}").as_str())?;
        self.send_json(self.request(reqwest::Method::PATCH, url).json(&update))
            .await
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let url = self.endpoint(format!("roles/{role_id}").as_str())?;
        self.send(self.request(reqwest::Method::DELETE, url))
            .await
            .map(|_| ())
    }

    async fn set_role_permissions(
        &self,
        role_id: RoleId,
        permission_codes: Vec<String>,
    ) -> AppResult<Role> {
        let url = self.endpoint(format!("roles/{role_id}/permissions").as_str())?;
        let payload = RolePermissionsPayload { permission_codes };
        self.send_json(self.request(reqwest::Method::PUT, url).json(&payload))
            .await
    }

    async fn set_user_roles(
        &self,
        user_id: UserId,
        role_names: Vec<String>,
    ) -> AppResult<UserSummary> {
        let url = self.endpoint(format!("users/{user_id}/roles").as_str())?;
        let payload = UserRolesPayload { role_names };
        self.send_json(self.request(reqwest::Method::PUT, url).json(&payload))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use keystone_core::AppError;
    use reqwest::StatusCode;
    use url::Url;

    use super::{HttpConsoleGateway, error_from_response};

    fn gateway(base: &str) -> HttpConsoleGateway {
        let base_url = Url::parse(base).unwrap_or_else(|_| panic!("test base url should parse"));
        HttpConsoleGateway::new(base_url, Duration::from_secs(1))
            .unwrap_or_else(|_| panic!("client should build"))
    }

    #[test]
    fn endpoints_are_resolved_under_the_api_prefix() {
        let gateway = gateway("http://localhost:8000/api/v1");

        let url = gateway.endpoint("/roles/3/permissions");

        assert_eq!(
            url.map(String::from).ok(),
            Some("http://localhost:8000/api/v1/roles/3/permissions".to_owned())
        );
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(
            error_from_response(StatusCode::UNAUTHORIZED, ""),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, ""),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::NOT_FOUND, ""),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::CONFLICT, ""),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::UNPROCESSABLE_ENTITY, ""),
            AppError::Validation(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::BAD_GATEWAY, ""),
            AppError::Transport(_)
        ));
    }

    #[test]
    fn error_body_detail_and_code_are_surfaced() {
        let error = error_from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"error":"Unauthorized","detail":"Incorrect email or password","status_code":401,"code":"INVALID_CREDENTIALS"}"#,
        );

        assert_eq!(
            error,
            AppError::Unauthorized("Incorrect email or password (INVALID_CREDENTIALS)".to_owned())
        );
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let error = error_from_response(StatusCode::NOT_FOUND, "no such role");
        assert_eq!(error, AppError::NotFound("no such role".to_owned()));
    }

    #[test]
    fn empty_body_falls_back_to_reason_phrase() {
        let error = error_from_response(StatusCode::FORBIDDEN, "");
        assert_eq!(error, AppError::Forbidden("Forbidden".to_owned()));
    }
}
