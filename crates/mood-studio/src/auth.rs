use std::rc::Rc;

use crate::api::ApiClient;
use crate::error::AuthError;
use crate::model::{SignUpForm, UserSession};
use crate::state::AppState;
use crate::transport::Transport;

pub struct Auth<T> {
    client: Rc<ApiClient<T>>,
    state: AppState,
}

impl<T> Clone for Auth<T> {
    fn clone(&self) -> Self {
        Self {
            client: Rc::clone(&self.client),
            state: self.state.clone(),
        }
    }
}

fn blank(field: &str) -> bool {
    field.trim().is_empty()
}

impl<T: Transport> Auth<T> {
    pub fn new(client: Rc<ApiClient<T>>, state: AppState) -> Self {
        Self { client, state }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserSession, AuthError> {
        if blank(username) || blank(password) {
            return Err(AuthError::MissingFields);
        }
        self.client.config().endpoint("/signin")?;
        let user = self.client.sign_in(username.trim(), password).await?;
        let session = self.state.set_session(user);
        log::info!("Signed in as {}", session.username);
        Ok(session)
    }

    /// Creates the account, then signs in with the same credentials.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<UserSession, AuthError> {
        if [&form.full_name, &form.username, &form.email, &form.password, &form.confirm_password]
            .into_iter()
            .any(|f| blank(f))
        {
            return Err(AuthError::MissingFields);
        }
        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        self.client.config().endpoint("/signup")?;
        self.client.sign_up(form).await?;
        log::info!("Account created for {}", form.username);

        self.sign_in(&form.username, &form.password).await.map_err(|e| {
            log::warn!("Automatic sign-in after sign-up failed: {e}");
            AuthError::AutoSignInFailed
        })
    }

    pub fn logout(&self) {
        if let Some(user) = self.state.username() {
            log::info!("Signed out {user}");
        }
        self.state.logout();
    }
}
