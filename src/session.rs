//! In-memory session store — the append-only exchange log plus the
//! "currently displayed" pointer.
//!
//! A [`Session`] lives for the whole process and is never persisted.
//! `history` only grows; `active` can only point at an id that
//! [`Session::select_exchange`] has just found in `history`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Identifier of an [`Exchange`], unique within a session. Starts at 1.
pub type ExchangeId = u64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("exchange {0} not found")]
    NotFound(ExchangeId),
}

/// One completed prompt/response pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub prompt: String,
    /// Normalized reply, or the fallback text if the call failed.
    pub response: String,
    pub completed_at: DateTime<Utc>,
}

/// Transient display fields: what the input box and response panel show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    pub input: String,
    pub response: String,
}

#[derive(Debug, Default)]
pub struct Session {
    history: Vec<Exchange>,
    active: Option<ExchangeId>,
    view: View,
    next_id: ExchangeId,
}

impl Session {
    pub fn new() -> Self {
        Self { next_id: 1, ..Self::default() }
    }

    /// Append a completed exchange and return its id. Never fails.
    pub fn record_completion(
        &mut self,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> ExchangeId {
        // `Default` leaves next_id at 0; ids start at 1 either way.
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.history.push(Exchange {
            id,
            prompt: prompt.into(),
            response: response.into(),
            completed_at: Utc::now(),
        });
        id
    }

    /// Make `id` the active exchange and load it into the view.
    ///
    /// Unknown ids leave the session untouched.
    pub fn select_exchange(&mut self, id: ExchangeId) -> Result<&Exchange, SessionError> {
        let idx = self
            .history
            .iter()
            .position(|e| e.id == id)
            .ok_or(SessionError::NotFound(id))?;
        let exchange = &self.history[idx];
        self.active = Some(id);
        self.view = View {
            input: exchange.prompt.clone(),
            response: exchange.response.clone(),
        };
        Ok(exchange)
    }

    /// Clear the active pointer and the view. History is kept.
    pub fn start_new_session(&mut self) {
        self.active = None;
        self.view = View::default();
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn get(&self, id: ExchangeId) -> Option<&Exchange> {
        self.history.iter().find(|e| e.id == id)
    }

    pub fn active(&self) -> Option<ExchangeId> {
        self.active
    }

    pub fn active_exchange(&self) -> Option<&Exchange> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub(crate) fn set_view_input(&mut self, input: &str) {
        self.view.input = input.to_string();
    }

    pub(crate) fn set_view_response(&mut self, response: &str) {
        self.view.response = response.to_string();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty() {
        let s = Session::new();
        assert!(s.is_empty());
        assert_eq!(s.active(), None);
        assert_eq!(s.view(), &View::default());
    }

    #[test]
    fn record_appends_in_order_with_increasing_ids() {
        let mut s = Session::new();
        let a = s.record_completion("first", "one");
        let b = s.record_completion("", "No response from AI.");
        let c = s.record_completion("third", "three");
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(s.len(), 3);
        let prompts: Vec<_> = s.history().iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, ["first", "", "third"]);
        assert!(s.history()[0].completed_at <= s.history()[2].completed_at);
    }

    #[test]
    fn default_session_ids_start_at_one() {
        let mut s = Session::default();
        assert_eq!(s.record_completion("p", "r"), 1);
        assert_eq!(s.record_completion("p", "r"), 2);
    }

    #[test]
    fn record_does_not_change_active() {
        let mut s = Session::new();
        let id = s.record_completion("p", "r");
        s.select_exchange(id).unwrap();
        s.record_completion("q", "s");
        assert_eq!(s.active(), Some(id));
    }

    #[test]
    fn select_returns_recorded_exchange() {
        let mut s = Session::new();
        s.record_completion("a", "A");
        let id = s.record_completion("b", "B");
        let e = s.select_exchange(id).unwrap().clone();
        assert_eq!(e.prompt, "b");
        assert_eq!(e.response, "B");
        assert_eq!(s.active(), Some(id));
        assert_eq!(s.view(), &View { input: "b".into(), response: "B".into() });
        assert_eq!(s.active_exchange(), Some(&e));
    }

    #[test]
    fn select_unknown_is_not_found_and_leaves_state() {
        let mut s = Session::new();
        let id = s.record_completion("a", "A");
        s.select_exchange(id).unwrap();
        assert_eq!(s.select_exchange(99), Err(SessionError::NotFound(99)));
        assert_eq!(s.active(), Some(id));
        assert_eq!(s.view().input, "a");
    }

    #[test]
    fn select_on_empty_history_is_not_found() {
        let mut s = Session::new();
        assert!(matches!(s.select_exchange(1), Err(SessionError::NotFound(1))));
        assert_eq!(s.active(), None);
    }

    #[test]
    fn start_new_session_keeps_history() {
        let mut s = Session::new();
        let id = s.record_completion("a", "A");
        s.select_exchange(id).unwrap();
        s.start_new_session();
        assert_eq!(s.active(), None);
        assert_eq!(s.view(), &View::default());
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(id).map(|e| e.response.as_str()), Some("A"));
    }

    #[test]
    fn not_found_display() {
        assert_eq!(SessionError::NotFound(7).to_string(), "exchange 7 not found");
    }
}
