//! Local password gate and account recovery.
//!
//! NOTE: secrets are stored base64-encoded, which is reversible. This keeps
//! stored configs compatible but is a privacy screen, not a security boundary:
//! anyone who can read the data directory can recover the password.

use crate::store::{load_json, save_json, KeyValueStore, KEY_USER_CONFIG};
use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

pub const SECURITY_QUESTIONS: [&str; 8] = [
    "What was the name of your first pet?",
    "What is your mother's maiden name?",
    "What was the name of your elementary school?",
    "In what city were you born?",
    "What is your favorite book?",
    "What was the model of your first car?",
    "What is the name of your favorite childhood friend?",
    "In what city did your parents meet?",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("Please enter your name.")]
    EmptyName,
    #[error("Password must be at least 6 characters long.")]
    PasswordTooShort,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Please provide an answer to your security question.")]
    EmptyAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub user_name: String,
    pub password_hash: String,
    pub security_question: String,
    pub security_answer_hash: String,
    pub onboarding_complete: bool,
}

/// Reversible encoding used for stored secrets. Not a hash.
pub fn encode_secret(secret: &str) -> String {
    STANDARD.encode(secret.as_bytes())
}

fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

pub struct SetupForm<'a> {
    pub user_name: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub security_question: &'a str,
    pub security_answer: &'a str,
}

impl UserConfig {
    pub fn from_setup(form: &SetupForm<'_>) -> Result<Self, SetupError> {
        let user_name = form.user_name.trim();
        if user_name.is_empty() {
            return Err(SetupError::EmptyName);
        }
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SetupError::PasswordTooShort);
        }
        if form.password != form.confirm_password {
            return Err(SetupError::PasswordMismatch);
        }
        if form.security_answer.trim().is_empty() {
            return Err(SetupError::EmptyAnswer);
        }
        Ok(Self {
            user_name: user_name.to_string(),
            password_hash: encode_secret(form.password),
            security_question: form.security_question.to_string(),
            security_answer_hash: encode_secret(&normalize_answer(form.security_answer)),
            onboarding_complete: true,
        })
    }

    pub fn verify_password(&self, password: &str) -> bool {
        encode_secret(password) == self.password_hash
    }

    pub fn verify_security_answer(&self, answer: &str) -> bool {
        encode_secret(&normalize_answer(answer)) == self.security_answer_hash
    }

    /// Replace the password after a successful recovery answer.
    pub fn reset_password(&mut self, new_password: &str) -> Result<(), SetupError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SetupError::PasswordTooShort);
        }
        self.password_hash = encode_secret(new_password);
        Ok(())
    }
}

pub fn load_user_config(store: &dyn KeyValueStore) -> Result<Option<UserConfig>> {
    load_json(store, KEY_USER_CONFIG)
}

pub fn save_user_config(store: &dyn KeyValueStore, config: &UserConfig) -> Result<()> {
    save_json(store, KEY_USER_CONFIG, config)
}
