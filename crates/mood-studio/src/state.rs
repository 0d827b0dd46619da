use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chrono::Utc;

use crate::model::{GenerationResult, Mood, ProfileUpdate, UserSession};
use crate::storage::{Storage, HISTORY_KEY, MOOD_KEY, USER_KEY};

#[derive(Clone, Debug, PartialEq)]
pub enum StateEvent {
    SessionChanged(Option<UserSession>),
    HistoryChanged { len: usize },
    MoodSelected(Mood),
}

type Listener = Rc<dyn Fn(&StateEvent)>;

struct Inner {
    storage: Storage,
    session: RefCell<Option<UserSession>>,
    history: RefCell<Vec<GenerationResult>>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_listener: Cell<u64>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Rc<Inner>,
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    state: Weak<Inner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.state.upgrade() {
            inner.listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl AppState {
    pub fn load(storage: Storage) -> Self {
        let session = storage.load::<UserSession>(USER_KEY);
        let history = storage
            .load::<Vec<GenerationResult>>(HISTORY_KEY)
            .unwrap_or_default();
        Self {
            inner: Rc::new(Inner {
                storage,
                session: RefCell::new(session),
                history: RefCell::new(history),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&StateEvent) + 'static) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            state: Rc::downgrade(&self.inner),
        }
    }

    pub fn session(&self) -> Option<UserSession> {
        self.inner.session.borrow().clone()
    }

    pub fn username(&self) -> Option<String> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map(|s| s.username.clone())
    }

    /// A missing join date is taken from the previously stored record for the
    /// same username, or set to now.
    pub fn set_session(&self, mut session: UserSession) -> UserSession {
        if session.joined_at.is_none() {
            let previous = self.inner.session.borrow().clone();
            session.joined_at = previous
                .filter(|p| p.username == session.username)
                .and_then(|p| p.joined_at)
                .or_else(|| Some(Utc::now()));
        }
        self.replace_session(Some(session.clone()));
        session
    }

    /// Merges a profile edit into the current session. Returns `None` when
    /// nobody is signed in.
    pub fn update_profile(&self, update: ProfileUpdate) -> Option<UserSession> {
        let mut session = self.session()?;
        session.full_name = update.full_name;
        session.email = update.email;
        session.favorite_mood = update.favorite_mood;
        self.replace_session(Some(session.clone()));
        Some(session)
    }

    pub fn logout(&self) {
        self.replace_session(None);
    }

    fn replace_session(&self, session: Option<UserSession>) {
        *self.inner.session.borrow_mut() = session.clone();
        let written = match &session {
            Some(user) => self.inner.storage.save(USER_KEY, user),
            None => self.inner.storage.clear(USER_KEY),
        };
        if let Err(e) = written {
            log::warn!("Failed to persist session: {e}");
        }
        self.emit(&StateEvent::SessionChanged(session));
    }

    pub fn history(&self) -> Vec<GenerationResult> {
        self.inner.history.borrow().clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.history.borrow().len()
    }

    pub fn record_generation(&self, result: GenerationResult) {
        let len = {
            let mut history = self.inner.history.borrow_mut();
            history.insert(0, result);
            if let Err(e) = self.inner.storage.save(HISTORY_KEY, history.as_slice()) {
                log::warn!("Failed to persist history: {e}");
            }
            history.len()
        };
        self.emit(&StateEvent::HistoryChanged { len });
    }

    pub fn clear_history(&self) {
        self.inner.history.borrow_mut().clear();
        if let Err(e) = self.inner.storage.clear(HISTORY_KEY) {
            log::warn!("Failed to clear stored history: {e}");
        }
        self.emit(&StateEvent::HistoryChanged { len: 0 });
    }

    pub fn select_mood(&self, mood: Mood) {
        if let Err(e) = self.inner.storage.save(MOOD_KEY, &mood) {
            log::warn!("Failed to persist selected mood: {e}");
        }
        self.emit(&StateEvent::MoodSelected(mood));
    }

    pub fn take_selected_mood(&self) -> Option<Mood> {
        let mood = self.inner.storage.load::<Mood>(MOOD_KEY)?;
        if let Err(e) = self.inner.storage.clear(MOOD_KEY) {
            log::warn!("Failed to clear selected mood: {e}");
        }
        Some(mood)
    }

    fn emit(&self, event: &StateEvent) {
        // Listeners may read state or subscribe; never hold the borrow while calling them.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session", &self.inner.session.borrow())
            .field("history_len", &self.history_len())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AudioClip, GenerationRequest};

    fn user(name: &str) -> UserSession {
        UserSession {
            id: Some(1),
            full_name: format!("{name} Example"),
            username: name.to_owned(),
            email: format!("{name}@example.com"),
            favorite_mood: Mood::Happy,
            joined_at: None,
        }
    }

    fn result(prompt: &str) -> GenerationResult {
        GenerationResult::new(
            GenerationRequest {
                prompt: prompt.to_owned(),
                ..GenerationRequest::default()
            },
            AudioClip::new("audio/mpeg", vec![0u8; 4]),
            Utc::now(),
        )
    }

    #[test]
    fn session_is_restored_from_storage() {
        let storage = Storage::in_memory();
        let state = AppState::load(storage.clone());
        state.set_session(user("ada"));

        let reloaded = AppState::load(storage);
        let session = reloaded.session().unwrap();
        assert_eq!(session.username, "ada");
        assert!(session.joined_at.is_some());
    }

    #[test]
    fn join_date_survives_re_sign_in() {
        let state = AppState::load(Storage::in_memory());
        let first = state.set_session(user("ada"));
        let second = state.set_session(user("ada"));
        assert_eq!(first.joined_at, second.joined_at);
    }

    #[test]
    fn subscribers_see_changes_synchronously() {
        let state = AppState::load(Storage::in_memory());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = state.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        state.set_session(user("ada"));
        state.logout();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], StateEvent::SessionChanged(Some(u)) if u.username == "ada"));
        assert_eq!(seen[1], StateEvent::SessionChanged(None));
    }

    #[test]
    fn listener_can_read_state_during_notification() {
        let state = AppState::load(Storage::in_memory());
        let observed = Rc::new(Cell::new(0usize));
        let probe = state.clone();
        let out = Rc::clone(&observed);
        let _sub = state.subscribe(move |_| out.set(probe.history_len()));
        state.record_generation(result("a"));
        assert_eq!(observed.get(), 1);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let state = AppState::load(Storage::in_memory());
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let sub = state.subscribe(move |_| c.set(c.get() + 1));
        state.select_mood(Mood::Calm);
        drop(sub);
        state.select_mood(Mood::Sad);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn history_is_most_recent_first_and_persisted() {
        let storage = Storage::in_memory();
        let state = AppState::load(storage.clone());
        state.record_generation(result("first"));
        state.record_generation(result("second"));

        let prompts: Vec<_> = state.history().into_iter().map(|r| r.request.prompt).collect();
        assert_eq!(prompts, ["second", "first"]);

        let reloaded = AppState::load(storage);
        let restored = reloaded.history();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].request.prompt, "second");
        assert!(restored[0].audio.is_none());
    }

    #[test]
    fn clear_history_empties_list_and_storage() {
        let storage = Storage::in_memory();
        let state = AppState::load(storage.clone());
        state.record_generation(result("a"));
        state.clear_history();
        assert!(state.history().is_empty());
        assert!(AppState::load(storage).history().is_empty());
    }

    #[test]
    fn clearing_history_keeps_clips_held_elsewhere() {
        let state = AppState::load(Storage::in_memory());
        let generated = result("keep");
        let held = generated.audio.clone().unwrap();
        state.record_generation(generated);
        state.clear_history();
        assert_eq!(held.bytes(), &[0u8; 4]);
    }

    #[test]
    fn mood_handoff_is_read_once() {
        let state = AppState::load(Storage::in_memory());
        state.select_mood(Mood::Mysterious);
        assert_eq!(state.take_selected_mood(), Some(Mood::Mysterious));
        assert_eq!(state.take_selected_mood(), None);
    }

    #[test]
    fn profile_update_requires_session() {
        let state = AppState::load(Storage::in_memory());
        let update = ProfileUpdate {
            full_name: "New Name".into(),
            email: "new@example.com".into(),
            favorite_mood: Mood::Energetic,
        };
        assert!(state.update_profile(update.clone()).is_none());

        state.set_session(user("ada"));
        let updated = state.update_profile(update).unwrap();
        assert_eq!(updated.full_name, "New Name");
        assert_eq!(updated.favorite_mood, Mood::Energetic);
        assert_eq!(state.session().unwrap().email, "new@example.com");
    }
}
