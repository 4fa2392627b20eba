pub mod common;
pub mod dashboard_page;
pub mod forms;
pub mod home_page;
pub mod login_page;
pub mod nav_bar;
pub mod not_found_page;
pub mod profile_page;
pub mod signup_page;

use dioxus::prelude::*;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::backend::auth::User;
use crate::backend::profile::Profile;
use crate::backend::theme::ThemeMode;
use crate::backend::upload::{UploadPhase, UploadedFile};
use crate::backend::wallet::WalletSession;
use crate::backend::{AppCmd, AppEvent, AuthAction, Notification};
use crate::config::AppConfig;

/// Read-only mirror of the backend's state. Only the root event pump
/// writes to these signals.
#[derive(Clone, Copy)]
pub struct AppState {
    pub theme: Signal<ThemeMode>,
    pub user: Signal<Option<User>>,
    pub auth_outcome: Signal<Option<(AuthAction, bool)>>,
    pub wallet: Signal<WalletSession>,
    pub wallet_connecting: Signal<bool>,
    pub upload_phase: Signal<UploadPhase>,
    pub upload_progress: Signal<u8>,
    pub files: Signal<Vec<UploadedFile>>,
    pub profile: Signal<Profile>,
    pub previews: Signal<HashMap<String, String>>, // hash -> text excerpt
    pub notifications: Signal<Vec<Notification>>,
}

impl AppState {
    pub fn new(initial_theme: ThemeMode) -> Self {
        Self {
            theme: use_signal(|| initial_theme),
            user: use_signal(|| None),
            auth_outcome: use_signal(|| None),
            wallet: use_signal(WalletSession::disconnected),
            wallet_connecting: use_signal(|| false),
            upload_phase: use_signal(|| UploadPhase::Idle),
            upload_progress: use_signal(|| 0),
            files: use_signal(Vec::new),
            profile: use_signal(Profile::default),
            previews: use_signal(HashMap::new),
            notifications: use_signal(Vec::new),
        }
    }

    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::ThemeChanged(mode) => self.theme.set(mode),
            AppEvent::UserChanged(user) => self.user.set(user),
            AppEvent::AuthFinished { action, success } => self.auth_outcome.set(Some((action, success))),
            AppEvent::WalletChanged(session) => self.wallet.set(session),
            AppEvent::WalletConnecting(connecting) => self.wallet_connecting.set(connecting),
            AppEvent::UploadPhaseChanged(phase) => self.upload_phase.set(phase),
            AppEvent::UploadProgress(value) => self.upload_progress.set(value),
            AppEvent::FileUploaded(file) => self.files.write().insert(0, file),
            AppEvent::ProfileChanged(profile) => self.profile.set(profile),
            AppEvent::PreviewFetched { hash, text } => {
                self.previews.write().insert(hash, text);
            }
            AppEvent::Notified(notification) => self.notifications.write().push(notification),
            AppEvent::NotificationDismissed(id) => self.notifications.write().retain(|n| n.id != id),
        }
    }
}

/// Handles a page needs: state to read, a sender for commands and the
/// loaded configuration.
#[derive(Clone)]
pub struct AppHandle {
    pub state: AppState,
    pub cmd_tx: UnboundedSender<AppCmd>,
    pub config: AppConfig,
}

impl AppHandle {
    pub fn send(&self, cmd: AppCmd) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("backend is gone, command dropped");
        }
    }
}

pub fn use_app() -> AppHandle {
    AppHandle {
        state: use_context::<AppState>(),
        cmd_tx: use_context::<UnboundedSender<AppCmd>>(),
        config: use_context::<AppConfig>(),
    }
}
