use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{UserId, UserRecord},
    protocol::{UserPayload, USER_COLLECTION_SEGMENTS, USER_ITEM_PREFIX_SEGMENTS},
};
use tracing::debug;
use url::Url;

use crate::error::RosterError;

/// Remote collaborator holding the authoritative user collection.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, RosterError>;
    async fn delete_user(&self, id: &UserId) -> Result<(), RosterError>;
}

/// [`RosterSource`] backed by the users REST API.
#[derive(Debug, Clone)]
pub struct HttpRosterSource {
    http: Client,
    base_url: Url,
}

impl HttpRosterSource {
    pub fn new(base_url: Url) -> Result<Self, RosterError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, RosterError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RosterError::HttpClient(err.to_string()))?;
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Result<Self, RosterError> {
        if base_url.cannot_be_a_base() {
            return Err(RosterError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `with_client`: the base can always carry path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn users_url(&self) -> Url {
        self.endpoint(USER_COLLECTION_SEGMENTS)
    }

    pub(crate) fn user_url(&self, id: &UserId) -> Url {
        let mut segments: Vec<&str> = USER_ITEM_PREFIX_SEGMENTS.to_vec();
        segments.push(id.as_str());
        self.endpoint(segments)
    }
}

#[async_trait]
impl RosterSource for HttpRosterSource {
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, RosterError> {
        let response = self
            .http
            .get(self.users_url())
            .send()
            .await
            .map_err(RosterError::fetch_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::fetch_status(status.as_u16()));
        }
        let payload: Vec<UserPayload> = response
            .json()
            .await
            .map_err(RosterError::fetch_transport)?;
        debug!(count = payload.len(), "fetched users");
        Ok(payload.into_iter().map(UserRecord::from).collect())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), RosterError> {
        let response = self
            .http
            .delete(self.user_url(id))
            .send()
            .await
            .map_err(RosterError::delete_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RosterError::delete_status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
