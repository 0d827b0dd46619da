use eframe::egui::{self, RichText};

use crate::app::Page;
use crate::auth::Auth;
use crate::error::AuthError;
use crate::model::{SignUpForm, UserSession};
use crate::task::Spawner;
use crate::transport::Transport;

use super::{error_label, notice_label, Pending};

const FORM_WIDTH: f32 = 320.0;

fn password_field(ui: &mut egui::Ui, hint: &str, value: &mut String, visible: &mut bool) {
    ui.horizontal(|ui| {
        ui.add(
            egui::TextEdit::singleline(value)
                .hint_text(hint)
                .password(!*visible)
                .desired_width(FORM_WIDTH - 40.0),
        );
        if ui.small_button(if *visible { "🙈" } else { "👁" }).clicked() {
            *visible = !*visible;
        }
    });
}

fn text_field(ui: &mut egui::Ui, hint: &str, value: &mut String) {
    ui.add(egui::TextEdit::singleline(value).hint_text(hint).desired_width(FORM_WIDTH));
}

pub struct SignInView<T> {
    auth: Auth<T>,
    spawner: Spawner,
    username: String,
    password: String,
    show_password: bool,
    pending: Pending<Result<UserSession, AuthError>>,
    error: Option<String>,
    notice: Option<String>,
}

impl<T: Transport + 'static> SignInView<T> {
    pub fn new(auth: Auth<T>, spawner: Spawner) -> Self {
        Self {
            auth,
            spawner,
            username: String::new(),
            password: String::new(),
            show_password: false,
            pending: Pending::default(),
            error: None,
            notice: None,
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn submit(&mut self) {
        if self.pending.is_waiting() {
            return;
        }
        self.error = None;
        let auth = self.auth.clone();
        let (username, password) = (self.username.clone(), self.password.clone());
        self.pending
            .start(&self.spawner, async move { auth.sign_in(&username, &password).await });
    }

    pub fn poll(&mut self) -> Option<Page> {
        match self.pending.take()? {
            Ok(_) => {
                self.password.clear();
                self.notice = None;
                Some(Page::Studio)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Page> {
        let go = self.poll();
        ui.vertical_centered(|ui| {
            ui.set_max_width(FORM_WIDTH);
            ui.heading(RichText::new("Sign In").size(24.0));
            notice_label(ui, self.notice.as_deref());
            error_label(ui, self.error.as_deref());
            text_field(ui, "Username", &mut self.username);
            password_field(ui, "Password", &mut self.password, &mut self.show_password);
            let busy = self.pending.is_waiting();
            if ui
                .add_enabled(!busy, egui::Button::new(if busy { "Signing in..." } else { "Sign In" }))
                .clicked()
            {
                self.submit();
            }
        });
        go
    }
}

pub struct SignUpView<T> {
    auth: Auth<T>,
    spawner: Spawner,
    form: SignUpForm,
    show_password: bool,
    show_confirm: bool,
    pending: Pending<Result<UserSession, AuthError>>,
    error: Option<String>,
    handoff: Option<String>,
}

impl<T: Transport + 'static> SignUpView<T> {
    pub fn new(auth: Auth<T>, spawner: Spawner) -> Self {
        Self {
            auth,
            spawner,
            form: SignUpForm::default(),
            show_password: false,
            show_confirm: false,
            pending: Pending::default(),
            error: None,
            handoff: None,
        }
    }

    pub fn submit(&mut self) {
        if self.pending.is_waiting() {
            return;
        }
        self.error = None;
        let auth = self.auth.clone();
        let form = self.form.clone();
        self.pending
            .start(&self.spawner, async move { auth.sign_up(&form).await });
    }

    /// Message for the sign-in page after the account was created but the
    /// automatic sign-in did not go through.
    pub fn take_handoff(&mut self) -> Option<String> {
        self.handoff.take()
    }

    pub fn poll(&mut self) -> Option<Page> {
        match self.pending.take()? {
            Ok(_) => {
                self.form = SignUpForm::default();
                Some(Page::Studio)
            }
            Err(AuthError::AutoSignInFailed) => {
                self.handoff = Some(AuthError::AutoSignInFailed.to_string());
                self.form = SignUpForm::default();
                Some(Page::SignIn)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<Page> {
        let go = self.poll();
        ui.vertical_centered(|ui| {
            ui.set_max_width(FORM_WIDTH);
            ui.heading(RichText::new("Sign Up").size(24.0));
            error_label(ui, self.error.as_deref());
            text_field(ui, "Full Name", &mut self.form.full_name);
            text_field(ui, "Username", &mut self.form.username);
            text_field(ui, "Email", &mut self.form.email);
            password_field(ui, "Password", &mut self.form.password, &mut self.show_password);
            password_field(ui, "Confirm Password", &mut self.form.confirm_password, &mut self.show_confirm);
            let busy = self.pending.is_waiting();
            if ui
                .add_enabled(!busy, egui::Button::new(if busy { "Creating account..." } else { "Sign Up" }))
                .clicked()
            {
                self.submit();
            }
        });
        go
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::api::ApiClient;
    use crate::config::ApiConfig;
    use crate::state::AppState;
    use crate::storage::Storage;
    use crate::task::TaskRunner;
    use crate::transport::stub::{json_reply, StubTransport};
    use crate::transport::Method;
    use serde_json::json;

    fn auth(stub: &StubTransport) -> (Auth<StubTransport>, AppState) {
        let state = AppState::load(Storage::in_memory());
        let client = Rc::new(ApiClient::new(ApiConfig::new(Some("http://api.test")), stub.clone()));
        (Auth::new(client, state.clone()), state)
    }

    fn user_reply() -> serde_json::Value {
        json!({ "user": { "id": 2, "fullName": "Grace Hopper", "username": "grace", "email": "g@navy.mil" } })
    }

    #[test]
    fn sign_in_goes_to_studio() {
        let mut runner = TaskRunner::new();
        let stub = StubTransport::default();
        stub.on(Method::Post, "/signin", json_reply(200, &user_reply()));
        let (auth, state) = auth(&stub);
        let mut view = SignInView::new(auth, runner.spawner());
        view.username = "grace".into();
        view.password = "cobol".into();

        view.submit();
        runner.run_until_stalled();
        assert_eq!(view.poll(), Some(Page::Studio));
        assert_eq!(state.username().as_deref(), Some("grace"));
        assert!(view.password.is_empty());
    }

    #[test]
    fn sign_in_error_stays_on_page() {
        let mut runner = TaskRunner::new();
        let (auth, _) = auth(&StubTransport::default());
        let mut view = SignInView::new(auth, runner.spawner());

        view.submit();
        runner.run_until_stalled();
        assert_eq!(view.poll(), None);
        assert_eq!(view.error.as_deref(), Some("All fields are mandatory."));
        assert!(!view.pending.is_waiting());
    }

    #[test]
    fn failed_auto_sign_in_routes_to_sign_in_with_message() {
        let mut runner = TaskRunner::new();
        let stub = StubTransport::default();
        stub.on(Method::Post, "/signup", json_reply(201, &json!({ "message": "created" })));
        stub.on(Method::Post, "/signin", json_reply(503, &json!({})));
        let (auth, _) = auth(&stub);
        let mut view = SignUpView::new(auth, runner.spawner());
        view.form = SignUpForm {
            full_name: "Grace Hopper".into(),
            username: "grace".into(),
            email: "g@navy.mil".into(),
            password: "cobol".into(),
            confirm_password: "cobol".into(),
        };

        view.submit();
        runner.run_until_stalled();
        assert_eq!(view.poll(), Some(Page::SignIn));
        assert_eq!(
            view.take_handoff().as_deref(),
            Some("Signup successful! Please sign in manually.")
        );
        assert_eq!(view.take_handoff(), None);
    }

    #[test]
    fn mismatched_passwords_show_inline() {
        let mut runner = TaskRunner::new();
        let stub = StubTransport::default();
        let (auth, _) = auth(&stub);
        let mut view = SignUpView::new(auth, runner.spawner());
        view.form = SignUpForm {
            full_name: "Grace Hopper".into(),
            username: "grace".into(),
            email: "g@navy.mil".into(),
            password: "cobol".into(),
            confirm_password: "fortran".into(),
        };

        view.submit();
        runner.run_until_stalled();
        assert_eq!(view.poll(), None);
        assert_eq!(view.error.as_deref(), Some("Passwords do not match."));
        assert!(stub.calls().is_empty());
    }
}
