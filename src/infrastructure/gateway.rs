use crate::domain::ports::PaymentGateway;
use crate::domain::session::{PaymentSession, SessionMetadata, SessionStatus};
use crate::domain::show::Amount;
use crate::error::{ReservationError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// An in-process payment provider.
///
/// Stands in for the external gateway in the CLI and tests: issues `cs_<n>`
/// session ids, stamps a `pi_`-prefixed transaction id when a session is
/// marked paid, and round-trips the metadata payload untouched. A session
/// transitions out of `Created` exactly once; later `mark_*` calls are
/// ignored. The availability toggle simulates an unreachable provider.
#[derive(Default, Clone)]
pub struct InProcessGateway {
    sessions: Arc<RwLock<HashMap<String, PaymentSession>>>,
    session_counter: Arc<AtomicU64>,
    unavailable: Arc<AtomicBool>,
}

impl InProcessGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Provider-side payment confirmation. Assigns the external
    /// transaction id on the first call; a no-op on an already-settled
    /// session.
    pub async fn mark_paid(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ReservationError::SessionNotFound(session_id.to_string()))?;
        if session.status == SessionStatus::Created {
            session.status = SessionStatus::Paid;
            // Globally unique, like a real provider's: a persistent booking
            // ledger outlives this process, so a per-run counter would
            // collide with transactions from earlier runs.
            session.transaction_id = Some(format!("pi_{}", uuid::Uuid::new_v4().simple()));
        }
        Ok(())
    }

    pub async fn mark_failed(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ReservationError::SessionNotFound(session_id.to_string()))?;
        if session.status == SessionStatus::Created {
            session.status = SessionStatus::Failed;
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for InProcessGateway {
    async fn create_session(&self, metadata: SessionMetadata, amount: Amount) -> Result<String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReservationError::GatewayUnavailable);
        }
        let n = self.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_{n}");
        let session = PaymentSession {
            id: id.clone(),
            amount,
            status: SessionStatus::Created,
            metadata: metadata.to_value(),
            transaction_id: None,
        };
        self.sessions.write().await.insert(id.clone(), session);
        Ok(id)
    }

    async fn session_status(&self, session_id: &str) -> Result<PaymentSession> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ReservationError::GatewayUnavailable);
        }
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| ReservationError::SessionNotFound(session_id.to_string()))
    }
}
