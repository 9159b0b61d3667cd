//! The order desk: one entry point per operator interaction.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::SessionId;
use domain::{
    CommitOutcome, CredentialSet, Effect, InventorySnapshot, Interaction, Notice, Presentation,
    Session, WorkflowContext, WorkflowError, WorkflowPhase, WorkflowSettings, advance,
    complete_commit, present,
};
use receipt::{ExportArtifact, ReceiptDocument};
use sheet_store::{
    InventorySheet, OrderLogSheet, SessionRecord, SessionStore, Version, WriteOptions,
};
use tokio::sync::Mutex;

use crate::error::{CheckoutError, Result};
use crate::sequence::CommitSequence;

/// A session after an interaction, with what to show for it.
#[derive(Debug, Clone)]
pub struct DeskResponse {
    pub session_id: SessionId,
    pub version: Version,
    pub session: Session,
    pub presentation: Presentation,
}

/// Serves operator sessions against the shared sheets.
///
/// Interactions for one session run one at a time; different sessions run
/// concurrently and meet only at the sheets, where version checks turn
/// overlapping writes into conflicts.
pub struct OrderDesk<S, St> {
    sequence: CommitSequence<S>,
    sessions: St,
    credentials: CredentialSet,
    settings: WorkflowSettings,
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl<S, St> OrderDesk<S, St>
where
    S: InventorySheet + OrderLogSheet,
    St: SessionStore,
{
    /// Creates a desk with the default receipt renderer and exporter.
    pub fn new(
        sheets: S,
        sessions: St,
        credentials: CredentialSet,
        settings: WorkflowSettings,
    ) -> Self {
        Self::with_sequence(CommitSequence::new(sheets), sessions, credentials, settings)
    }

    pub fn with_sequence(
        sequence: CommitSequence<S>,
        sessions: St,
        credentials: CredentialSet,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            sequence,
            sessions,
            credentials,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn sheets(&self) -> &S {
        self.sequence.sheets()
    }

    pub fn sessions(&self) -> &St {
        &self.sessions
    }

    pub fn settings(&self) -> WorkflowSettings {
        self.settings
    }

    /// Creates and stores an empty session.
    #[tracing::instrument(skip(self))]
    pub async fn open_session(&self) -> Result<DeskResponse> {
        let session_id = SessionId::new();
        let session = Session::new();
        let version = self
            .save(session_id, &session, WriteOptions::expect_new())
            .await?;

        let ctx = self.context(Utc::now(), None);
        let presentation = present(&session, &ctx);
        tracing::info!(%session_id, "session opened");

        Ok(DeskResponse {
            session_id,
            version,
            session,
            presentation,
        })
    }

    /// Deletes a session. Waits for any interaction in flight on it.
    #[tracing::instrument(skip(self))]
    pub async fn close_session(&self, session_id: SessionId) -> Result<()> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            match self.sessions.load_session(session_id).await {
                Ok(Some(_)) => self
                    .sessions
                    .delete_session(session_id)
                    .await
                    .map_err(CheckoutError::from),
                Ok(None) => Err(CheckoutError::SessionNotFound(session_id)),
                Err(e) => Err(e.into()),
            }
        };
        self.release_session_lock(session_id, lock).await;

        if result.is_ok() {
            tracing::info!(%session_id, "session closed");
        }
        result
    }

    /// Re-renders a session without changing it.
    #[tracing::instrument(skip(self))]
    pub async fn present(&self, session_id: SessionId) -> Result<DeskResponse> {
        let (session, version) = self.load(session_id).await?;
        let now = Utc::now();
        let (snapshot, load_notice) = self.load_inventory(session.phase, now).await;

        let ctx = self.context(now, snapshot.as_ref());
        let mut presentation = present(&session, &ctx);
        if let Some(notice) = load_notice {
            presentation.notices.insert(0, notice);
        }

        Ok(DeskResponse {
            session_id,
            version,
            session,
            presentation,
        })
    }

    /// Applies one interaction and stores the resulting session.
    ///
    /// Workflow rejections come back as notices with the session unchanged.
    /// Errors are reserved for unknown sessions and session store failures.
    #[tracing::instrument(skip(self, interaction), fields(interaction = interaction.name()))]
    pub async fn interact(
        &self,
        session_id: SessionId,
        interaction: Interaction,
    ) -> Result<DeskResponse> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.interact_locked(session_id, interaction).await
        };
        self.release_session_lock(session_id, lock).await;
        result
    }

    /// Number of sessions with an interaction running or queued.
    pub async fn busy_sessions(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn interact_locked(
        &self,
        session_id: SessionId,
        interaction: Interaction,
    ) -> Result<DeskResponse> {
        let (session, version) = self.load(session_id).await?;
        metrics::counter!("order_desk_interactions_total", "phase" => session.phase.as_str())
            .increment(1);

        let now = Utc::now();
        let (snapshot, load_notice) = self.load_inventory(session.phase, now).await;
        let ctx = self.context(now, snapshot.as_ref());

        let mut transition = advance(&session, interaction, &ctx);
        if let Some(WorkflowError::Authentication { .. }) = &transition.rejection {
            metrics::counter!("order_desk_auth_failures_total").increment(1);
        }

        if let Some(Effect::Commit(request)) = transition.effect.take() {
            let outcome = match snapshot.as_ref() {
                Some(snapshot) => self.sequence.run(&request, snapshot, now).await.outcome,
                None => CommitOutcome::Rejected {
                    reason: "The inventory sheet is unavailable; please retry.".to_string(),
                },
            };
            transition = complete_commit(&transition.session, outcome, &ctx);
        }

        let version = if transition.session == session {
            version
        } else {
            self.save(
                session_id,
                &transition.session,
                WriteOptions::expect_version(version),
            )
            .await?
        };

        let mut presentation = transition.presentation;
        if let Some(notice) = load_notice {
            presentation.notices.insert(0, notice);
        }

        Ok(DeskResponse {
            session_id,
            version,
            session: transition.session,
            presentation,
        })
    }

    /// Returns the receipt of the session's committed order.
    #[tracing::instrument(skip(self))]
    pub async fn receipt(&self, session_id: SessionId) -> Result<ReceiptDocument> {
        let (session, _) = self.load(session_id).await?;
        let order = session
            .committed
            .ok_or(CheckoutError::NoCommittedOrder(session_id))?;

        match order.receipt_html {
            Some(html) => Ok(ReceiptDocument { html }),
            None => Ok(self.sequence.renderer().render(&order)?),
        }
    }

    /// Renders the spreadsheet export of the session's committed order.
    #[tracing::instrument(skip(self))]
    pub async fn export(&self, session_id: SessionId) -> Result<ExportArtifact> {
        let (session, _) = self.load(session_id).await?;
        let order = session
            .committed
            .ok_or(CheckoutError::NoCommittedOrder(session_id))?;
        Ok(self.sequence.exporter().export(&order)?)
    }

    fn context<'a>(
        &'a self,
        now: DateTime<Utc>,
        snapshot: Option<&'a InventorySnapshot>,
    ) -> WorkflowContext<'a> {
        WorkflowContext {
            credentials: &self.credentials,
            settings: self.settings,
            now,
            snapshot,
        }
    }

    async fn session_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(session_id).or_default().clone()
    }

    /// Drops the map entry once no other interaction holds or waits on it.
    /// Clones are only handed out under the map lock, so the count cannot
    /// grow while it is checked.
    async fn release_session_lock(&self, session_id: SessionId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&session_id);
        }
    }

    async fn load(&self, session_id: SessionId) -> Result<(Session, Version)> {
        let record = self
            .sessions
            .load_session(session_id)
            .await?
            .ok_or(CheckoutError::SessionNotFound(session_id))?;
        let version = record.version;
        Ok((record.into_state()?, version))
    }

    async fn save(
        &self,
        session_id: SessionId,
        session: &Session,
        options: WriteOptions,
    ) -> Result<Version> {
        let expected = options.expected_version.unwrap_or_default();
        let record = SessionRecord::from_state(session_id, expected, session)?;
        let version = self.sessions.save_session(record, options).await?;
        tracing::debug!(%session_id, %version, phase = %session.phase, "session saved");
        Ok(version)
    }

    /// Reads the inventory when `phase` shows or may enter the catalog.
    ///
    /// A failed read is not an error: the interaction proceeds without a
    /// snapshot and the returned notice explains why.
    async fn load_inventory(
        &self,
        phase: WorkflowPhase,
        now: DateTime<Utc>,
    ) -> (Option<InventorySnapshot>, Option<Notice>) {
        if !phase.needs_inventory() {
            return (None, None);
        }
        match InventorySnapshot::load(self.sequence.sheets(), now).await {
            Ok(snapshot) => (Some(snapshot), None),
            Err(e) => {
                tracing::error!(error = %e, "inventory load failed");
                (
                    None,
                    Some(Notice::error(format!("Inventory could not be loaded: {e}"))),
                )
            }
        }
    }
}
