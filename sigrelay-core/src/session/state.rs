//! Session roster and host tracking

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::client::{Client, ClientId, ClientInfo};
use crate::error::SessionError;

/// Maximum number of peers in a session
pub const MAX_CLIENTS: usize = 2;

/// Serializable view of a session, as embedded in session envelopes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: String,
    pub clients: Vec<ClientInfo>,
}

/// Result of a successful [`Session::add_client`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The client was appended to the roster
    Added,
    /// The client was already on the roster; nothing changed
    AlreadyMember,
}

/// Result of [`Session::remove_client`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Departure {
    /// Whether the client was on the roster
    pub removed: bool,
    /// Whether the client was the host before it was removed
    pub was_host: bool,
}

/// A pairing of up to two clients under a share code
///
/// The roster keeps insertion order; the first entry is the host. The roster
/// lock is never held while writing to a client, so callers broadcast from
/// [`Session::members`] snapshots.
#[derive(Debug)]
pub struct Session {
    id: String,
    roster: RwLock<Roster>,
}

#[derive(Debug, Default)]
struct Roster {
    clients: Vec<Arc<Client>>,
    /// Set once the host has left; no one may join afterwards
    closed: bool,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roster: RwLock::new(Roster {
                clients: Vec::with_capacity(MAX_CLIENTS),
                closed: false,
            }),
        }
    }

    /// The share code
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append `client` to the roster and point its affiliation here
    ///
    /// A session that has been disbanded reports [`SessionError::NotFound`],
    /// the same as one already removed from the store.
    pub async fn add_client(&self, client: &Arc<Client>) -> Result<JoinOutcome, SessionError> {
        let mut roster = self.roster.write().await;

        if roster.closed {
            return Err(SessionError::NotFound(self.id.clone()));
        }
        if roster.clients.iter().any(|c| c.id() == client.id()) {
            client.set_session_id(&self.id);
            return Ok(JoinOutcome::AlreadyMember);
        }
        if roster.clients.len() >= MAX_CLIENTS {
            return Err(SessionError::Full(self.id.clone()));
        }

        client.set_session_id(&self.id);
        roster.clients.push(Arc::clone(client));
        Ok(JoinOutcome::Added)
    }

    /// Remove `client` from the roster and clear its affiliation
    ///
    /// Host status is evaluated on the roster as it was before removal. A
    /// departing host closes the session in the same critical section, so no
    /// one can join while it is being disbanded.
    pub async fn remove_client(&self, client: &Client) -> Departure {
        let mut roster = self.roster.write().await;

        let was_host = roster.clients.first().is_some_and(|c| c.id() == client.id());
        let before = roster.clients.len();
        roster.clients.retain(|c| c.id() != client.id());
        client.clear_session_id(&self.id);
        if was_host {
            roster.closed = true;
        }

        Departure {
            removed: roster.clients.len() != before,
            was_host,
        }
    }

    /// Call `f` once per member under the shared lock
    ///
    /// `f` must not call back into this session's locked operations.
    pub async fn for_each_client<F>(&self, mut f: F)
    where
        F: FnMut(&Arc<Client>),
    {
        let roster = self.roster.read().await;
        for client in &roster.clients {
            f(client);
        }
    }

    /// Close the session to new members and clear the affiliation of every
    /// remaining member
    ///
    /// Used when the host leaves and the session is disbanded.
    pub async fn release_members(&self) {
        self.roster.write().await.closed = true;
        self.for_each_client(|client| client.clear_session_id(&self.id))
            .await;
    }

    /// Whether the session has been disbanded
    pub async fn is_closed(&self) -> bool {
        self.roster.read().await.closed
    }

    /// Snapshot of the current roster
    pub async fn members(&self) -> Vec<Arc<Client>> {
        self.roster.read().await.clients.clone()
    }

    /// Look up a member by id
    pub async fn member(&self, id: ClientId) -> Option<Arc<Client>> {
        self.roster
            .read()
            .await
            .clients
            .iter()
            .find(|c| c.id() == id)
            .cloned()
    }

    /// Id of the host, if the roster is not empty
    pub async fn host(&self) -> Option<ClientId> {
        self.roster.read().await.clients.first().map(|c| c.id())
    }

    pub async fn len(&self) -> usize {
        self.roster.read().await.clients.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roster.read().await.clients.is_empty()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let roster = self.roster.read().await;
        SessionSnapshot {
            id: self.id.clone(),
            clients: roster.clients.iter().map(|c| c.info().clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;
    use crate::transport::ChannelOutbound;
    use std::collections::HashSet;

    fn client() -> Arc<Client> {
        let (out, _rx) = ChannelOutbound::pair();
        Arc::new(Client::new(
            DeviceType::Unknown,
            String::new(),
            Box::new(out),
        ))
    }

    // ==================== Join Tests ====================

    #[tokio::test]
    async fn first_client_becomes_host() {
        let session = Session::new("ABC234");
        let a = client();
        let b = client();

        assert_eq!(session.add_client(&a).await, Ok(JoinOutcome::Added));
        assert_eq!(session.add_client(&b).await, Ok(JoinOutcome::Added));

        assert_eq!(session.host().await, Some(a.id()));
        assert_eq!(a.session_id().as_deref(), Some("ABC234"));
        assert_eq!(b.session_id().as_deref(), Some("ABC234"));
    }

    #[tokio::test]
    async fn third_client_is_rejected() {
        let session = Session::new("ABC234");
        let (a, b, c) = (client(), client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        let result = session.add_client(&c).await;

        assert_eq!(result, Err(SessionError::Full("ABC234".to_string())));
        assert_eq!(session.len().await, 2);
        assert_eq!(c.session_id(), None);
    }

    #[tokio::test]
    async fn re_adding_member_does_not_duplicate() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        assert_eq!(session.add_client(&b).await, Ok(JoinOutcome::AlreadyMember));
        assert_eq!(session.len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_joins_never_exceed_capacity() {
        let session = Arc::new(Session::new("ABC234"));
        let clients: Vec<_> = (0..16).map(|_| client()).collect();

        let mut handles = Vec::new();
        for c in &clients {
            let session = Arc::clone(&session);
            let c = Arc::clone(c);
            handles.push(tokio::spawn(async move { session.add_client(&c).await }));
        }
        let mut added = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                added += 1;
            }
        }

        assert_eq!(added, MAX_CLIENTS);
        let ids: HashSet<_> = session.members().await.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), MAX_CLIENTS);
        let affiliated = clients.iter().filter(|c| c.session_id().is_some()).count();
        assert_eq!(affiliated, MAX_CLIENTS);
    }

    // ==================== Leave Tests ====================

    #[tokio::test]
    async fn removing_host_reports_pre_removal_host() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        let departure = session.remove_client(&a).await;

        assert_eq!(
            departure,
            Departure {
                removed: true,
                was_host: true
            }
        );
        assert_eq!(a.session_id(), None);
        assert_eq!(session.host().await, Some(b.id()));
        assert!(session.is_closed().await);
    }

    #[tokio::test]
    async fn join_after_host_removal_is_rejected() {
        let session = Session::new("ABC234");
        let (a, b, late) = (client(), client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        // Host gone, members not yet released
        session.remove_client(&a).await;
        let result = session.add_client(&late).await;

        assert_eq!(result, Err(SessionError::NotFound("ABC234".to_string())));
        assert_eq!(late.session_id(), None);
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn removing_guest_keeps_host() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        let departure = session.remove_client(&b).await;

        assert!(departure.removed);
        assert!(!departure.was_host);
        assert_eq!(session.members().await.len(), 1);
        assert_eq!(session.host().await, Some(a.id()));
        assert_eq!(b.session_id(), None);
    }

    #[tokio::test]
    async fn removing_non_member_is_noop() {
        let session = Session::new("ABC234");
        let (a, stranger) = (client(), client());
        session.add_client(&a).await.unwrap();

        let departure = session.remove_client(&stranger).await;

        assert_eq!(departure, Departure::default());
        assert_eq!(session.len().await, 1);
    }

    #[tokio::test]
    async fn remove_does_not_clear_foreign_affiliation() {
        let first = Session::new("AAAAAA");
        let second = Session::new("BBBBBB");
        let a = client();
        second.add_client(&a).await.unwrap();

        first.remove_client(&a).await;

        assert_eq!(a.session_id().as_deref(), Some("BBBBBB"));
    }

    #[tokio::test]
    async fn guest_slot_can_be_refilled() {
        let session = Session::new("ABC234");
        let (a, b, c) = (client(), client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();
        session.remove_client(&b).await;
        assert!(!session.is_closed().await);

        session.add_client(&c).await.unwrap();
        assert_eq!(session.host().await, Some(a.id()));
        assert_eq!(session.len().await, 2);
    }

    // ==================== Iteration Tests ====================

    #[tokio::test]
    async fn release_members_clears_every_affiliation() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        session.release_members().await;

        assert_eq!(a.session_id(), None);
        assert_eq!(b.session_id(), None);
        assert_eq!(session.len().await, 2);
        assert!(session.is_closed().await);
    }

    #[tokio::test]
    async fn disbanded_session_rejects_joins() {
        let session = Session::new("ABC234");
        let (a, late) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.remove_client(&a).await;
        session.release_members().await;

        let result = session.add_client(&late).await;

        assert_eq!(result, Err(SessionError::NotFound("ABC234".to_string())));
        assert_eq!(late.session_id(), None);
    }

    #[tokio::test]
    async fn for_each_client_visits_in_roster_order() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        let mut visited = Vec::new();
        session.for_each_client(|c| visited.push(c.id())).await;

        assert_eq!(visited, vec![a.id(), b.id()]);
    }

    #[tokio::test]
    async fn member_lookup_by_id() {
        let session = Session::new("ABC234");
        let a = client();
        session.add_client(&a).await.unwrap();

        assert!(session.member(a.id()).await.is_some());
        assert!(session.member(uuid::Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn snapshot_lists_client_infos_in_order() {
        let session = Session::new("ABC234");
        let (a, b) = (client(), client());
        session.add_client(&a).await.unwrap();
        session.add_client(&b).await.unwrap();

        let snapshot = session.snapshot().await;
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(snapshot.id, "ABC234");
        assert_eq!(snapshot.clients, vec![a.info().clone(), b.info().clone()]);
        assert_eq!(json["clients"][0]["id"], a.id().to_string());
    }
}
