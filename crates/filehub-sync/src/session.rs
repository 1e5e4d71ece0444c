//! Session state
//!
//! Holds the authenticated user and a monotonically increasing epoch. Every
//! operation captures a [`SessionTicket`] before suspending on the network and
//! settles its result against the ticket afterwards: if the session was
//! cleared (or replaced) in between, the result is discarded.

use filehub_core::{ClientError, IdentityProvider, User};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Proof that an operation started while a given session was active.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub user: Arc<User>,
    pub epoch: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<Arc<User>>>,
    epoch: AtomicU64,
}

impl Session {
    /// A session with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// A session for an already known user.
    pub fn with_user(user: User) -> Self {
        Self {
            user: RwLock::new(Some(Arc::new(user))),
            epoch: AtomicU64::new(1),
        }
    }

    /// Resolve the current user through the identity service and start a
    /// session. Failure here is fatal for the caller.
    pub async fn start(identity: &dyn IdentityProvider) -> Result<Self, ClientError> {
        let session = Self::signed_out();
        session.sign_in(identity).await?;
        Ok(session)
    }

    /// Resolve the user again and replace whatever session was active.
    pub async fn sign_in(&self, identity: &dyn IdentityProvider) -> Result<Arc<User>, ClientError> {
        let user = match identity.current_user().await {
            Ok(user) => Arc::new(user),
            Err(err) => {
                tracing::error!(error = %err, "Identity resolution failed");
                return Err(err);
            }
        };

        let mut slot = self.user.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *slot = Some(user.clone());
        tracing::info!(user = %user.id(), "Session started");
        Ok(user)
    }

    /// Clear the session. In-flight results tagged with the old epoch will be
    /// discarded when they settle.
    pub async fn clear(&self) {
        let mut slot = self.user.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(user) = slot.take() {
            tracing::info!(user = %user.id(), "Session cleared");
        }
    }

    pub async fn user(&self) -> Option<Arc<User>> {
        self.user.read().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Ticket for the active session, or `SessionClosed`.
    pub async fn ticket(&self) -> Result<SessionTicket, ClientError> {
        let slot = self.user.read().await;
        match slot.as_ref() {
            Some(user) => Ok(SessionTicket {
                user: user.clone(),
                epoch: self.epoch(),
            }),
            None => Err(ClientError::SessionClosed),
        }
    }

    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        ticket.epoch == self.epoch()
    }

    /// Settle a network result against the ticket it was issued under.
    ///
    /// * an `Auth` error clears the session
    /// * any result arriving after the session changed becomes `SessionClosed`
    pub async fn settle<T>(
        &self,
        ticket: &SessionTicket,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket_epoch = ticket.epoch,
                current_epoch = self.epoch(),
                "Discarding result from a previous session"
            );
            return Err(ClientError::SessionClosed);
        }

        if let Err(ClientError::Auth(reason)) = &result {
            tracing::warn!(reason = %reason, "Server rejected credentials, clearing session");
            self.clear().await;
        }
        result
    }
}
