use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::{self, RichText};

use crate::app::Page;
use crate::model::UserSession;
use crate::state::{AppState, StateEvent, Subscription};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderAction {
    Navigate(Page),
    Logout,
}

pub struct Header {
    user: Rc<RefCell<Option<UserSession>>>,
    _subscription: Subscription,
}

impl Header {
    pub fn new(state: &AppState) -> Self {
        let user = Rc::new(RefCell::new(state.session()));
        let cache = Rc::clone(&user);
        let subscription = state.subscribe(move |event| {
            if let StateEvent::SessionChanged(session) = event {
                *cache.borrow_mut() = session.clone();
            }
        });
        Self {
            user,
            _subscription: subscription,
        }
    }

    pub fn greeting(&self) -> Option<String> {
        self.user
            .borrow()
            .as_ref()
            .map(|u| format!("Hi, {}", u.display_name()))
    }

    pub fn show(&self, ui: &mut egui::Ui, current: Page) -> Option<HeaderAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            ui.label(RichText::new("Mood Music AI").strong().size(18.0));
            ui.separator();
            for page in Page::NAV {
                if ui.selectable_label(current == page, page.to_string()).clicked() {
                    action = Some(HeaderAction::Navigate(page));
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match self.greeting() {
                    Some(greeting) => {
                        if ui.button("Logout").clicked() {
                            action = Some(HeaderAction::Logout);
                        }
                        ui.label(greeting);
                    }
                    None => {
                        if ui.button(Page::SignUp.to_string()).clicked() {
                            action = Some(HeaderAction::Navigate(Page::SignUp));
                        }
                        if ui.button(Page::SignIn.to_string()).clicked() {
                            action = Some(HeaderAction::Navigate(Page::SignIn));
                        }
                    }
                }
            });
        });
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mood;
    use crate::storage::Storage;

    fn ada() -> UserSession {
        UserSession {
            id: None,
            full_name: "Ada Lovelace".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            favorite_mood: Mood::Calm,
            joined_at: None,
        }
    }

    #[test]
    fn greeting_follows_session_events() {
        let state = AppState::load(Storage::in_memory());
        let header = Header::new(&state);
        assert_eq!(header.greeting(), None);

        state.set_session(ada());
        assert_eq!(header.greeting().as_deref(), Some("Hi, Ada Lovelace"));

        state.logout();
        assert_eq!(header.greeting(), None);
    }

    #[test]
    fn starts_from_restored_session() {
        let storage = Storage::in_memory();
        AppState::load(storage.clone()).set_session(ada());
        let header = Header::new(&AppState::load(storage));
        assert_eq!(header.greeting().as_deref(), Some("Hi, Ada Lovelace"));
    }
}
