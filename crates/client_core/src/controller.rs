//! Roster state for the admin users view: load, delete, reload.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use shared::domain::{UserId, UserRecord};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{error::RosterError, source::RosterSource};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Local copy of the remote user collection, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RosterState {
    #[default]
    Unloaded,
    Loaded(Vec<UserRecord>),
}

impl RosterState {
    pub fn users(&self) -> Option<&[UserRecord]> {
        match self {
            Self::Unloaded => None,
            Self::Loaded(users) => Some(users),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Snapshot handed to the rendering layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterView {
    pub roster: RosterState,
    pub pending: BTreeSet<UserId>,
    pub error: Option<String>,
    pub loading: bool,
}

impl RosterView {
    pub fn is_deleting(&self, id: &UserId) -> bool {
        self.pending.contains(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    PendingChanged { user_id: UserId, pending: bool },
    RosterLoaded { count: usize },
    RosterInvalidated,
    Error(String),
}

#[derive(Default)]
struct RosterInner {
    roster: RosterState,
    /// In-flight delete requests per id.
    pending: BTreeMap<UserId, usize>,
    error: Option<String>,
    loads_in_flight: usize,
    next_load_ticket: u64,
    applied_load_ticket: u64,
    closed: bool,
}

/// Owns the roster and the set of in-flight deletions for one view session.
///
/// The state lock is never held across a request to the [`RosterSource`], so
/// pending ids are visible to observers before a delete is dispatched.
pub struct UserRosterController {
    source: Arc<dyn RosterSource>,
    inner: Mutex<RosterInner>,
    events: broadcast::Sender<RosterEvent>,
}

impl UserRosterController {
    pub fn new(source: Arc<dyn RosterSource>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            source,
            inner: Mutex::new(RosterInner::default()),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> RosterView {
        let inner = self.inner.lock().await;
        RosterView {
            roster: inner.roster.clone(),
            pending: inner.pending.keys().cloned().collect(),
            error: inner.error.clone(),
            loading: inner.loads_in_flight > 0,
        }
    }

    #[cfg(test)]
    pub(crate) async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Fetches the collection and replaces the local roster with it.
    ///
    /// A failed read leaves the previous roster in place. When reads overlap,
    /// a response is applied only if no later-issued read was applied first.
    pub async fn load_roster(&self) -> Result<Vec<UserRecord>, RosterError> {
        let ticket = {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                return Err(RosterError::Closed);
            }
            inner.next_load_ticket += 1;
            inner.loads_in_flight += 1;
            inner.next_load_ticket
        };

        let result = self.source.fetch_users().await;

        let mut inner = self.inner.lock().await;
        if inner.closed {
            debug!(ticket, "dropping roster read settled after close");
            return result;
        }
        inner.loads_in_flight = inner.loads_in_flight.saturating_sub(1);
        let is_latest = ticket > inner.applied_load_ticket;

        match &result {
            Ok(users) if is_latest => {
                inner.applied_load_ticket = ticket;
                inner.roster = RosterState::Loaded(users.clone());
                inner.error = None;
                info!(count = users.len(), "roster loaded");
                let _ = self.events.send(RosterEvent::RosterLoaded { count: users.len() });
            }
            Ok(_) => debug!(ticket, "discarding stale roster read"),
            Err(err) if is_latest => {
                warn!(error = %err, "roster fetch failed");
                inner.error = Some(err.to_string());
                let _ = self.events.send(RosterEvent::Error(err.to_string()));
            }
            Err(err) => debug!(ticket, error = %err, "ignoring stale roster read failure"),
        }
        result
    }

    /// Deletes one user, then reloads the roster on success.
    ///
    /// The id stays pending until every request issued for it settles. A failure
    /// records the error and leaves the roster untouched. A reload failure
    /// after a successful delete is reported through [`RosterView::error`].
    pub async fn delete_user(&self, id: &UserId) -> Result<(), RosterError> {
        self.mark_pending(id, false).await?;
        self.dispatch_delete(id).await
    }

    /// View action behind a row's delete button.
    ///
    /// Returns `Ok(false)` without issuing a request when the row already has
    /// a delete in flight.
    pub async fn request_delete(&self, id: &UserId) -> Result<bool, RosterError> {
        if !self.mark_pending(id, true).await? {
            debug!(user_id = %id, "delete already pending");
            return Ok(false);
        }
        self.dispatch_delete(id).await?;
        Ok(true)
    }

    /// Ends the view session. Requests settling afterwards change nothing.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.closed = true;
        inner.roster = RosterState::Unloaded;
        inner.pending.clear();
        inner.error = None;
        inner.loads_in_flight = 0;
        debug!("roster view closed");
    }

    async fn mark_pending(&self, id: &UserId, only_if_idle: bool) -> Result<bool, RosterError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(RosterError::Closed);
        }
        let in_flight = inner.pending.entry(id.clone()).or_insert(0);
        if *in_flight > 0 && only_if_idle {
            return Ok(false);
        }
        *in_flight += 1;
        if *in_flight == 1 {
            let _ = self.events.send(RosterEvent::PendingChanged {
                user_id: id.clone(),
                pending: true,
            });
        }
        Ok(true)
    }

    async fn dispatch_delete(&self, id: &UserId) -> Result<(), RosterError> {
        info!(user_id = %id, "deleting user");
        let result = self.source.delete_user(id).await;

        {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                debug!(user_id = %id, "dropping delete settled after close");
                return result;
            }
            if release_pending(&mut inner.pending, id) {
                let _ = self.events.send(RosterEvent::PendingChanged {
                    user_id: id.clone(),
                    pending: false,
                });
            }
            match &result {
                Ok(()) => {
                    let _ = self.events.send(RosterEvent::RosterInvalidated);
                }
                Err(err) => {
                    error!(user_id = %id, error = %err, "error deleting user");
                    inner.error = Some(err.to_string());
                    let _ = self.events.send(RosterEvent::Error(err.to_string()));
                }
            }
        }
        result?;

        // Reload failures are recorded by `load_roster` itself.
        let _ = self.load_roster().await;
        Ok(())
    }
}

/// Drops one in-flight request for `id`; true once none remain.
fn release_pending(pending: &mut BTreeMap<UserId, usize>, id: &UserId) -> bool {
    match pending.get_mut(id) {
        Some(in_flight) if *in_flight > 1 => {
            *in_flight -= 1;
            false
        }
        Some(_) => {
            pending.remove(id);
            true
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
