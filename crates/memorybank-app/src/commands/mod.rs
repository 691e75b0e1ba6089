//! CLI command handlers.

pub mod annotate;
pub mod auth;
pub mod export;
pub mod graph;
pub mod notes;

use anyhow::{Context as _, Result};
use memorybank_client::MemoryBankClient;
use memorybank_core::session::{Session, SessionStore, require_session};
use memorybank_core::storage::FileStore;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::notify::{ConsoleNotifier, Notifier, Toast};

/// Session store backing the CLI.
pub type Sessions = SessionStore<FileStore>;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    pub notifier: Arc<ConsoleNotifier>,
}

impl Context {
    pub fn new(config: AppConfig, json_output: bool, verbose: bool) -> Self {
        Self {
            config,
            json_output,
            verbose,
            notifier: Arc::new(ConsoleNotifier::new(json_output)),
        }
    }

    /// Open the persisted session. A 401 clears it and tells the user.
    pub fn sessions(&self) -> Result<Arc<Sessions>> {
        let store = self
            .config
            .open_store()
            .context("Failed to open session store")?;
        log::debug!("Session store at {}", store.path().display());
        let notifier = self.notifier.clone();
        let sessions = SessionStore::new(store).with_unauthorized_hook(move || {
            notifier.notify(Toast::error(
                "Session expired",
                "run `memorybank login` to sign in again",
            ));
        });
        Ok(Arc::new(sessions))
    }

    pub fn client(&self, sessions: Arc<Sessions>) -> Result<MemoryBankClient> {
        self.config
            .client(sessions)
            .context("Failed to create API client")
    }

    /// Session gate for protected commands.
    pub fn require_login(&self, sessions: &Sessions, command: &str) -> Result<Session> {
        require_session(sessions, Some(command)).map_err(|redirect| {
            anyhow::anyhow!(
                "{} (run `memorybank login`, then retry `{}`)",
                redirect,
                redirect.return_to.as_deref().unwrap_or(command)
            )
        })
    }

    /// Open the session, check it, and build a client.
    pub fn signed_in_client(&self, command: &str) -> Result<(MemoryBankClient, Session)> {
        let sessions = self.sessions()?;
        let session = self.require_login(&sessions, command)?;
        log::debug!("Signed in as {}", session.user.email);
        Ok((self.client(sessions)?, session))
    }

    /// Print a JSON value when `--json` is set. Returns whether it printed.
    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<bool> {
        if self.json_output {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Ok(self.json_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memorybank_core::session::User;

    fn context(dir: &std::path::Path) -> Context {
        let config = AppConfig::default().with_overrides(None, Some(dir.to_path_buf()), None);
        Context::new(config, true, false)
    }

    #[test]
    fn test_require_login_without_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let sessions = ctx.sessions().unwrap();
        let err = ctx.require_login(&sessions, "notes list").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Login required"));
        assert!(message.contains("notes list"));
    }

    #[test]
    fn test_session_persists_across_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            user: User {
                id: "u1".to_string(),
                email: "ada@example.com".to_string(),
                name: None,
                created_at: "2024-01-01T00:00:00".to_string(),
            },
        };
        context(dir.path()).sessions().unwrap().save(&session).unwrap();

        let ctx = context(dir.path());
        let sessions = ctx.sessions().unwrap();
        assert_eq!(ctx.require_login(&sessions, "graph").unwrap(), session);
    }
}
