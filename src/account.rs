//! Stand-in account flow. The farm API has no auth endpoints yet, so login
//! and registration resolve against fixed demo credentials.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Preferences, StoreError, CURRENT_USER_KEY};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub id: String,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("User '{0}' does not exist. Please register.")]
    UnknownUser(String),
    #[error("User '{0}' already exists.")]
    AlreadyRegistered(String),
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Email and password are required.")]
    MissingFields,
}

const DEMO_EMAIL: &str = "test@example.com";
const DEMO_PASSWORD: &str = "password";
const UNREGISTERED_EMAIL: &str = "new@example.com";
const UNREGISTERED_PASSWORD: &str = "newpassword";

pub fn login(email: &str, password: &str) -> Result<User, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    match (email, password) {
        (DEMO_EMAIL, DEMO_PASSWORD) => Ok(User {
            email: email.to_string(),
            id: "mockUser123".to_string(),
            token: "mock_jwt_token".to_string(),
        }),
        (UNREGISTERED_EMAIL, UNREGISTERED_PASSWORD) => {
            Err(AuthError::UnknownUser(email.to_string()))
        }
        _ => Err(AuthError::InvalidCredentials),
    }
}

pub fn register(email: &str, password: &str) -> Result<User, AuthError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if email == DEMO_EMAIL {
        return Err(AuthError::AlreadyRegistered(email.to_string()));
    }
    Ok(User {
        email: email.to_string(),
        id: "mockNewUser456".to_string(),
        token: "mock_new_jwt_token".to_string(),
    })
}

/// Signed-in user, persisted across restarts.
pub struct Session {
    pub user: Option<User>,
}

impl Session {
    pub fn restore(prefs: &mut Preferences) -> Self {
        let user = prefs.get::<User>(CURRENT_USER_KEY);
        if user.is_none() {
            // Drop whatever undecodable entry may be sitting there.
            if let Err(e) = prefs.remove(CURRENT_USER_KEY) {
                log::warn!("failed to clear stored user: {e}");
            }
        }
        Self { user }
    }

    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.token.as_str())
    }

    pub fn sign_in(&mut self, prefs: &mut Preferences, user: User) -> Result<(), StoreError> {
        log::info!("signed in as {}", user.email);
        self.user = Some(user.clone());
        prefs.set(CURRENT_USER_KEY, &user)
    }

    pub fn sign_out(&mut self, prefs: &mut Preferences) -> Result<(), StoreError> {
        if let Some(user) = self.user.take() {
            log::info!("signed out {}", user.email);
        }
        prefs.remove(CURRENT_USER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_login() {
        let user = login("test@example.com", "password").unwrap();
        assert_eq!(user.id, "mockUser123");
        assert_eq!(user.token, "mock_jwt_token");
    }

    #[test]
    fn login_failures() {
        assert_eq!(
            login("new@example.com", "newpassword").unwrap_err().to_string(),
            "User 'new@example.com' does not exist. Please register."
        );
        assert_eq!(
            login("test@example.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(login("", ""), Err(AuthError::MissingFields));
    }

    #[test]
    fn register_rules() {
        assert_eq!(
            register("test@example.com", "x").unwrap_err().to_string(),
            "User 'test@example.com' already exists."
        );
        let user = register("grower@farm.io", "secret").unwrap();
        assert_eq!(user.id, "mockNewUser456");
        assert_eq!(user.email, "grower@farm.io");
    }

    #[test]
    fn session_persists_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut prefs = Preferences::open(&path);
        let mut session = Session::restore(&mut prefs);
        assert!(session.user.is_none());
        session
            .sign_in(&mut prefs, login("test@example.com", "password").unwrap())
            .unwrap();
        assert_eq!(session.token(), Some("mock_jwt_token"));

        let mut reopened = Preferences::open(&path);
        let mut restored = Session::restore(&mut reopened);
        assert_eq!(restored.user.as_ref().map(|u| u.id.as_str()), Some("mockUser123"));

        restored.sign_out(&mut reopened).unwrap();
        assert!(Session::restore(&mut Preferences::open(&path)).user.is_none());
    }
}
