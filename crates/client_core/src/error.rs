use thiserror::Error;

/// Failures surfaced to the roster view as renderable text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("{0}")]
    Fetch(String),
    #[error("{0}")]
    Delete(String),
    #[error("invalid users API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("roster view has been closed")]
    Closed,
}

impl RosterError {
    pub(crate) fn fetch_status(status: u16) -> Self {
        Self::Fetch(format!("Failed to fetch users (HTTP {status})"))
    }

    pub(crate) fn fetch_transport(detail: impl std::fmt::Display) -> Self {
        Self::Fetch(format!("Failed to fetch users: {detail}"))
    }

    pub(crate) fn delete_status(status: u16) -> Self {
        Self::Delete(format!("Failed to delete user (HTTP {status})"))
    }

    pub(crate) fn delete_transport(detail: impl std::fmt::Display) -> Self {
        Self::Delete(format!("Failed to delete user: {detail}"))
    }
}
