//! Chat service — one exchange client, one session, one call at a time.
//!
//! Channels hold an `Arc<ChatService>` and go through the typed methods
//! below; they never touch the provider or the session directly.
//!
//! A submit resolves in three steps: call the provider without holding the
//! session lock, collapse any [`ExchangeError`](crate::llm::ExchangeError)
//! into its fallback text, then append the completion. The three steps run
//! on a spawned task, so an issued call is recorded even when the caller
//! stops waiting. The busy flag is the only thing that serialises submits;
//! a second one while a call is in flight is rejected with [`ChatError::Busy`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::llm::{self, LlmProvider};
use crate::session::{Exchange, ExchangeId, Session, SessionError, View};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("a request is already in flight")]
    Busy,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("exchange task failed: {0}")]
    Task(String),
}

/// Result of a completed submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub id: ExchangeId,
    pub prompt: String,
    pub reply: String,
}

/// `listHistory` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: ExchangeId,
    pub prompt: String,
}

/// Snapshot of what the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub active: Option<ExchangeId>,
    pub busy: bool,
    #[serde(flatten)]
    pub view: View,
}

pub struct ChatService {
    provider: LlmProvider,
    session: Arc<Mutex<Session>>,
    busy: Arc<AtomicBool>,
}

/// Clears the busy flag when the exchange task finishes.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatService {
    pub fn new(provider: LlmProvider) -> Self {
        Self {
            provider,
            session: Arc::new(Mutex::new(Session::new())),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(self.busy.clone()))
    }

    /// Send `prompt` and record the outcome. Provider failures are recorded
    /// with their fallback text and returned as a normal [`Reply`].
    ///
    /// Once accepted, the call runs to completion on its own task. Dropping
    /// the returned future only stops waiting for the reply; the exchange is
    /// still recorded and the busy flag stays set until then.
    ///
    /// The view's input and response follow the latest submit. `active` is
    /// left alone, so after a `select` it keeps naming the selected exchange
    /// until the next `select` or `new_session`.
    pub async fn submit(&self, prompt: &str) -> Result<Reply, ChatError> {
        let Some(guard) = self.try_acquire() else {
            debug!("submit rejected: busy");
            return Err(ChatError::Busy);
        };

        let provider = self.provider.clone();
        let session = self.session.clone();
        let prompt = prompt.to_string();

        let task = tokio::spawn(async move {
            let _guard = guard;
            session.lock().await.set_view_input(&prompt);

            let result = provider.submit(&prompt).await;
            if let Err(e) = &result {
                warn!(provider = provider.name(), error = %e, "exchange failed; recording fallback");
            }
            let text = llm::display_text(result);

            let mut session = session.lock().await;
            let id = session.record_completion(prompt.as_str(), text.as_str());
            session.set_view_response(&text);
            info!(exchange_id = id, history_len = session.len(), "exchange recorded");

            Reply { id, prompt, reply: text }
        });

        task.await.map_err(|e| {
            error!(error = %e, "exchange task did not complete");
            ChatError::Task(e.to_string())
        })
    }

    /// Reset the active selection and clear the view.
    pub async fn new_session(&self) {
        self.session.lock().await.start_new_session();
        debug!("new session started");
    }

    pub async fn list_history(&self) -> Vec<HistoryEntry> {
        self.session
            .lock()
            .await
            .history()
            .iter()
            .map(|e| HistoryEntry { id: e.id, prompt: e.prompt.clone() })
            .collect()
    }

    /// Make `id` the active exchange and return a copy of it.
    pub async fn select(&self, id: ExchangeId) -> Result<Exchange, ChatError> {
        let mut session = self.session.lock().await;
        let exchange = session.select_exchange(id)?.clone();
        debug!(exchange_id = id, "exchange selected");
        Ok(exchange)
    }

    pub async fn view(&self) -> ViewSnapshot {
        let session = self.session.lock().await;
        ViewSnapshot {
            active: session.active(),
            busy: self.is_busy(),
            view: session.view().clone(),
        }
    }

    pub async fn history_len(&self) -> usize {
        self.session.lock().await.len()
    }
}
