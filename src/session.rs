use crate::keyphrases::{Mode, default_keyphrase_text, default_label_text};
use crate::model::Model;
use crate::results::ResultTable;
use crate::validation::API_KEY_PLACEHOLDER;
use parking_lot::RwLock;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const MAX_SESSION_COUNT: usize = 4096;
const SESSION_ID_LEN: usize = 24;

/// Form values as last submitted, used to re-populate the form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub mode: Mode,
    pub api_key: String,
    pub model: Model,
    pub labels: String,
    pub keyphrases: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            mode: Mode::Demo,
            api_key: API_KEY_PLACEHOLDER.to_string(),
            model: Model::default(),
            labels: default_label_text(),
            keyphrases: default_keyphrase_text(),
        }
    }
}

impl FormValues {
    /// The personal key is never kept for re-rendering.
    fn without_api_key(mut self) -> Self {
        self.api_key = API_KEY_PLACEHOLDER.to_string();
        self
    }
}

/// Per-browser state. Only the submit and layout-toggle events mutate it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub last_submission_valid: bool,
    pub wide_layout: bool,
    pub results: Option<ResultTable>,
    pub form: FormValues,
    last_seen: u64,
}

impl SessionState {
    /// The results to render, present only while the last submission was valid.
    pub fn visible_results(&self) -> Option<&ResultTable> {
        if self.last_submission_valid {
            self.results.as_ref()
        } else {
            None
        }
    }

    pub fn record_valid_submission(&mut self, form: FormValues, results: ResultTable) {
        self.form = form.without_api_key();
        self.last_submission_valid = true;
        self.results = Some(results);
    }

    pub fn record_rejected_submission(&mut self, form: FormValues) {
        self.form = form.without_api_key();
        self.last_submission_valid = false;
        self.results = None;
    }

    pub fn set_wide_layout(&mut self, wide: bool) {
        self.wide_layout = wide;
    }
}

/// In-memory session map shared by all handlers.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionState>>>,
    clock: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session, or the initial state for unknown ids. Reading a
    /// known session marks it as seen.
    pub fn get(&self, session_id: &str) -> SessionState {
        let mut guard = self.inner.write();
        match guard.get_mut(session_id) {
            Some(state) => {
                state.last_seen = self.tick();
                state.clone()
            }
            None => SessionState::default(),
        }
    }

    /// Applies `update` to the session, creating it when needed.
    pub fn update<R>(&self, session_id: &str, update: impl FnOnce(&mut SessionState) -> R) -> R {
        let now = self.tick();
        let mut guard = self.inner.write();
        if !guard.contains_key(session_id) && guard.len() >= MAX_SESSION_COUNT {
            if let Some(oldest) = oldest_session_key(&guard) {
                guard.remove(&oldest);
            }
        }
        let state = guard.entry(session_id.to_string()).or_default();
        state.last_seen = now;
        update(state)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }
}

pub fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Accepts only ids shaped like the ones we hand out.
pub fn is_valid_session_id(candidate: &str) -> bool {
    candidate.len() == SESSION_ID_LEN && candidate.chars().all(|ch| ch.is_ascii_alphanumeric())
}

fn oldest_session_key(sessions: &HashMap<String, SessionState>) -> Option<String> {
    sessions
        .iter()
        .min_by_key(|(_, state)| state.last_seen)
        .map(|(key, _)| key.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_starts_invalid_and_narrow() {
        let store = SessionStore::new();
        let state = store.get("missing");
        assert!(!state.last_submission_valid);
        assert!(!state.wide_layout);
        assert!(state.visible_results().is_none());
        assert_eq!(state.form, FormValues::default());
        assert!(store.is_empty());
    }

    #[test]
    fn rejection_hides_previous_results() {
        let store = SessionStore::new();
        store.update("s", |state| {
            state.record_valid_submission(FormValues::default(), ResultTable::default())
        });
        assert!(store.get("s").visible_results().is_some());
        store.update("s", |state| state.record_rejected_submission(FormValues::default()));
        let state = store.get("s");
        assert!(!state.last_submission_valid);
        assert!(state.visible_results().is_none());
    }

    #[test]
    fn layout_toggle_keeps_results() {
        let store = SessionStore::new();
        store.update("s", |state| {
            state.record_valid_submission(FormValues::default(), ResultTable::default())
        });
        store.update("s", |state| state.set_wide_layout(true));
        let state = store.get("s");
        assert!(state.wide_layout);
        assert!(state.last_submission_valid);
    }

    #[test]
    fn store_is_bounded() {
        let store = SessionStore::new();
        for i in 0..(MAX_SESSION_COUNT + 10) {
            store.update(&format!("session-{i}"), |state| state.set_wide_layout(true));
        }
        assert_eq!(store.len(), MAX_SESSION_COUNT);
    }

    #[test]
    fn reads_keep_a_session_from_eviction() {
        let store = SessionStore::new();
        for i in 0..MAX_SESSION_COUNT {
            store.update(&format!("session-{i}"), |state| state.set_wide_layout(true));
        }
        assert!(store.get("session-0").wide_layout);
        store.update("newcomer", |state| state.set_wide_layout(true));
        assert_eq!(store.len(), MAX_SESSION_COUNT);
        assert!(store.get("session-0").wide_layout);
        assert!(!store.get("session-1").wide_layout);
    }

    #[test]
    fn reading_an_unknown_session_does_not_create_it() {
        let store = SessionStore::new();
        store.get("ghost");
        assert!(store.is_empty());
    }

    #[test]
    fn personal_key_is_not_kept() {
        let store = SessionStore::new();
        let form = FormValues {
            mode: Mode::Unlocked,
            api_key: "hf_personal".into(),
            ..FormValues::default()
        };
        store.update("s", |state| state.record_valid_submission(form.clone(), ResultTable::default()));
        assert_eq!(store.get("s").form.api_key, API_KEY_PLACEHOLDER);
        store.update("s", |state| state.record_rejected_submission(form));
        let state = store.get("s");
        assert_eq!(state.form.api_key, API_KEY_PLACEHOLDER);
        assert_eq!(state.form.mode, Mode::Unlocked);
    }

    #[test]
    fn generated_ids_validate() {
        let id = generate_session_id();
        assert!(is_valid_session_id(&id));
        assert!(!is_valid_session_id("short"));
        assert!(!is_valid_session_id("../../../../etc/passwd!!!"));
    }
}
