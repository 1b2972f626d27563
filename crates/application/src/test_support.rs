use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use keystone_core::{AppError, AppResult};
use keystone_domain::{Identity, Role, RoleId, UserId};
use tokio::sync::{Mutex, oneshot};

use crate::IdentitySource;

pub(crate) fn identity(permissions: &[&str]) -> Identity {
    let timestamp = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();

    Identity {
        id: UserId::new(1),
        email: "a@example.com".to_owned(),
        name: None,
        is_active: true,
        created_at: timestamp,
        updated_at: timestamp,
        roles: Vec::new(),
        permissions: permissions.iter().map(|code| (*code).to_owned()).collect(),
    }
}

pub(crate) fn role(id: i64, name: &str, group: Option<&str>) -> Role {
    Role {
        id: RoleId::new(id),
        name: name.to_owned(),
        description: None,
        exclusive_group: group.map(str::to_owned),
        priority: 0,
        is_system: false,
        permissions: Vec::new(),
    }
}

pub(crate) enum FakeIdentityResponse {
    Ready(AppResult<Identity>),
    Gated(oneshot::Receiver<AppResult<Identity>>),
}

#[derive(Default)]
pub(crate) struct FakeIdentitySource {
    responses: Mutex<VecDeque<FakeIdentityResponse>>,
    calls: AtomicUsize,
}

impl FakeIdentitySource {
    pub(crate) fn with_responses(responses: Vec<FakeIdentityResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn returning(result: AppResult<Identity>) -> Self {
        Self::with_responses(vec![FakeIdentityResponse::Ready(result)])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentitySource for FakeIdentitySource {
    async fn fetch_current_identity(&self) -> AppResult<Identity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.responses.lock().await.pop_front();

        match response {
            Some(FakeIdentityResponse::Ready(result)) => result,
            Some(FakeIdentityResponse::Gated(receiver)) => receiver.await.unwrap_or_else(|_| {
                Err(AppError::Transport("identity response dropped".to_owned()))
            }),
            None => Err(AppError::Unauthorized("no session".to_owned())),
        }
    }
}
