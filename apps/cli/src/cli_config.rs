use std::env;
use std::time::Duration;

use keystone_application::{GuardConfig, StaleFetchPolicy};
use keystone_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Http { base_url: Url, timeout: Duration },
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub backend: BackendConfig,
    pub guard: GuardConfig,
    pub sign_in: Option<SignInConfig>,
}

impl CliConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("KEYSTONE_BACKEND")
            .unwrap_or_else(|| "http".to_owned())
            .as_str()
        {
            "http" => {
                let raw_base_url = required_non_empty(&lookup, "KEYSTONE_API_BASE_URL")?;
                let base_url = Url::parse(raw_base_url.as_str()).map_err(|error| {
                    AppError::Validation(format!("invalid KEYSTONE_API_BASE_URL: {error}"))
                })?;
                let timeout_ms = lookup("KEYSTONE_HTTP_TIMEOUT_MS")
                    .map(|value| {
                        value.trim().parse::<u64>().map_err(|error| {
                            AppError::Validation(format!("invalid KEYSTONE_HTTP_TIMEOUT_MS: {error}"))
                        })
                    })
                    .transpose()?
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);

                BackendConfig::Http {
                    base_url,
                    timeout: Duration::from_millis(timeout_ms),
                }
            }
            "memory" => BackendConfig::InMemory,
            other => {
                return Err(AppError::Validation(format!(
                    "KEYSTONE_BACKEND must be either 'http' or 'memory', got '{other}'"
                )));
            }
        };

        let defaults = GuardConfig::default();
        let guard = GuardConfig {
            login_path: lookup("KEYSTONE_LOGIN_PATH").unwrap_or(defaults.login_path),
            forbidden_path: lookup("KEYSTONE_FORBIDDEN_PATH").unwrap_or(defaults.forbidden_path),
            clear_stale_session: flag(&lookup, "KEYSTONE_CLEAR_STALE_SESSION"),
            stale_fetch_policy: if flag(&lookup, "KEYSTONE_DISCARD_SUPERSEDED_FETCHES") {
                StaleFetchPolicy::DiscardSuperseded
            } else {
                StaleFetchPolicy::LastWriteWins
            },
        };

        let sign_in = match (lookup("KEYSTONE_EMAIL"), lookup("KEYSTONE_PASSWORD")) {
            (Some(email), Some(password)) => Some(SignInConfig { email, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "KEYSTONE_EMAIL and KEYSTONE_PASSWORD must be set together".to_owned(),
                ));
            }
        };

        Ok(Self {
            backend,
            guard,
            sign_in,
        })
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn flag<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
