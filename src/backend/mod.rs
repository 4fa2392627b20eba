pub mod auth;
pub mod injected;
pub mod ipfs;
pub mod profile;
pub mod store;
pub mod theme;
pub mod upload;
pub mod wallet;

use chrono::{DateTime, Utc};
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::{AppConfig, StorageBackend};
use auth::{AuthState, User};
use injected::InjectedWallet;
use ipfs::IpfsHttpStore;
use profile::{Profile, ProfileState};
use store::{ContentStore, Gateway, MemoryStore, StoreError};
use theme::{ThemeMode, ThemeState};
use upload::{FileSelection, UploadEvent, UploadPhase, UploadPipeline, UploadedFile};
use wallet::{WalletConnector, WalletSession, WalletState, WalletUpdate};

/// Longest text excerpt kept for a content preview.
const PREVIEW_LIMIT: usize = 4096;

#[derive(Debug)]
pub enum AppCmd {
    ToggleTheme,
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Logout,
    ConnectWallet,
    DisconnectWallet,
    Upload(FileSelection),
    SetProfilePhoto(FileSelection),
    UpdateProfile { name: String, email: String },
    FetchPreview { hash: String },
    Notify { title: String, description: String, level: NotificationLevel },
    DismissNotification(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ThemeChanged(ThemeMode),
    UserChanged(Option<User>),
    AuthFinished { action: AuthAction, success: bool },
    WalletChanged(WalletSession),
    WalletConnecting(bool),
    UploadPhaseChanged(UploadPhase),
    UploadProgress(u8),
    FileUploaded(UploadedFile),
    ProfileChanged(Profile),
    PreviewFetched { hash: String, text: String },
    Notified(Notification),
    NotificationDismissed(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
}

pub async fn sleep(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
}

/// Awaits the future parked in `slot`, or never resolves if the slot is
/// empty. Callers must clear the slot once it has resolved.
pub(crate) async fn poll_slot<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

/// Text shown for fetched content: the first few KiB when it decodes as
/// UTF-8, otherwise a byte count.
pub fn preview_text(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(PREVIEW_LIMIT)];
    match std::str::from_utf8(head) {
        Ok(text) if !text.contains('\0') => text.to_string(),
        // A multi-byte char cut at the limit is not binary.
        Err(e) if e.error_len().is_none() && bytes.len() > PREVIEW_LIMIT => {
            String::from_utf8_lossy(&head[..e.valid_up_to()]).to_string()
        }
        _ => format!("Binary content ({} bytes)", bytes.len()),
    }
}

enum Wake {
    Command(AppCmd),
    Upload(Vec<UploadEvent>),
    Wallet(WalletUpdate),
    Preview(String, Result<Vec<u8>, StoreError>),
}

/// Owns every piece of application state; views only see it through
/// `AppEvent`s.
pub struct Backend<S, W> {
    theme: ThemeState,
    auth: AuthState,
    wallet: WalletState<W>,
    uploads: UploadPipeline<S>,
    profile: ProfileState,
    store: S,
    previews: FuturesUnordered<LocalBoxFuture<'static, (String, Result<Vec<u8>, StoreError>)>>,
    next_notification_id: u64,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl<S, W> Backend<S, W>
where
    S: ContentStore + Clone,
    W: WalletConnector,
{
    pub fn new(
        config: &AppConfig,
        store: S,
        connector: W,
        cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            theme: ThemeState::new(config.default_theme),
            auth: AuthState::new(),
            wallet: WalletState::new(connector),
            uploads: UploadPipeline::new(store.clone(), Gateway::new(&config.gateway_base), config.upload.clone()),
            profile: ProfileState::new(&config.upload),
            store,
            previews: FuturesUnordered::new(),
            next_notification_id: 0,
            cmd_rx,
            event_tx,
        }
    }

    pub async fn run(&mut self) {
        tracing::info!("backend started");
        loop {
            let wake = tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => Wake::Command(cmd),
                    None => break,
                },
                events = self.uploads.next_events(), if self.uploads.is_active() => Wake::Upload(events),
                Some(update) = self.wallet.next_update(), if self.wallet.is_active() => Wake::Wallet(update),
                Some((hash, result)) = self.previews.next(), if !self.previews.is_empty() => Wake::Preview(hash, result),
            };

            match wake {
                Wake::Command(cmd) => self.handle_command(cmd),
                Wake::Upload(events) => self.forward_upload_events(events),
                Wake::Wallet(update) => self.handle_wallet_update(update),
                Wake::Preview(hash, result) => self.handle_preview(hash, result),
            }
        }
        tracing::info!("command channel closed, backend stopping");
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }

    fn notify(&mut self, level: NotificationLevel, title: &str, description: impl Into<String>) {
        self.next_notification_id += 1;
        self.emit(AppEvent::Notified(Notification {
            id: self.next_notification_id,
            title: title.to_string(),
            description: description.into(),
            level,
            created_at: Utc::now(),
        }));
    }

    fn handle_command(&mut self, cmd: AppCmd) {
        match cmd {
            AppCmd::ToggleTheme => {
                let mode = self.theme.toggle();
                self.emit(AppEvent::ThemeChanged(mode));
            }
            AppCmd::Login { email, password } => {
                let success = self.auth.login(&email, &password);
                self.finish_auth(AuthAction::Login, success);
            }
            AppCmd::Signup { email, password } => {
                let success = self.auth.signup(&email, &password);
                self.finish_auth(AuthAction::Signup, success);
            }
            AppCmd::Logout => {
                self.auth.logout();
                self.emit(AppEvent::UserChanged(None));
                let session = self.wallet.disconnect_wallet();
                self.emit(AppEvent::WalletConnecting(false));
                self.emit(AppEvent::WalletChanged(session));
                tracing::info!("logged out");
                self.notify(NotificationLevel::Info, "Logged out successfully", "You have been logged out of StorageX");
            }
            AppCmd::ConnectWallet => match self.wallet.connect_wallet() {
                Ok(()) => self.emit(AppEvent::WalletConnecting(true)),
                Err(e) => {
                    tracing::warn!(error = %e, "wallet connect not started");
                    self.notify(NotificationLevel::Error, "Connection failed", e.to_string());
                }
            },
            AppCmd::DisconnectWallet => {
                let session = self.wallet.disconnect_wallet();
                self.emit(AppEvent::WalletConnecting(false));
                self.emit(AppEvent::WalletChanged(session));
                self.notify(NotificationLevel::Info, "Wallet disconnected", "Your wallet has been disconnected");
            }
            AppCmd::Upload(file) => {
                let name = file.name.clone();
                match self.uploads.begin(file) {
                    Ok(events) => self.forward_upload_events(events),
                    Err(e) => {
                        self.emit(AppEvent::UploadPhaseChanged(self.uploads.phase()));
                        self.notify(NotificationLevel::Error, upload_error_title(&e), format!("{}: {}", name, e));
                    }
                }
            }
            AppCmd::SetProfilePhoto(file) => match self.profile.set_photo(&file) {
                Ok(profile) => {
                    let profile = profile.clone();
                    self.emit(AppEvent::ProfileChanged(profile));
                    self.notify(NotificationLevel::Info, "Photo uploaded", "Profile photo has been updated");
                }
                Err(e) => self.notify(NotificationLevel::Error, upload_error_title(&e), e.to_string()),
            },
            AppCmd::UpdateProfile { name, email } => {
                let wallet = self.wallet.session().address().map(str::to_string);
                let profile = self.profile.update_details(name, email, wallet.as_deref()).clone();
                self.emit(AppEvent::ProfileChanged(profile));
                self.notify(NotificationLevel::Info, "Details updated", "Profile information has been updated");
            }
            AppCmd::FetchPreview { hash } => {
                let fetch = self.store.get(&hash);
                self.previews.push(Box::pin(async move { (hash, fetch.await) }));
            }
            AppCmd::Notify { title, description, level } => self.notify(level, &title, description),
            AppCmd::DismissNotification(id) => self.emit(AppEvent::NotificationDismissed(id)),
        }
    }

    fn finish_auth(&mut self, action: AuthAction, success: bool) {
        tracing::info!(?action, success, "auth request handled");
        self.emit(AppEvent::AuthFinished { action, success });
        if success {
            self.emit(AppEvent::UserChanged(self.auth.user().cloned()));
        }
        match (action, success) {
            (AuthAction::Login, true) => {
                self.notify(NotificationLevel::Info, "Login successful", "Welcome back to StorageX!")
            }
            (AuthAction::Login, false) => {
                self.notify(NotificationLevel::Error, "Login failed", "Invalid email or password")
            }
            (AuthAction::Signup, true) => {
                self.notify(NotificationLevel::Info, "Account created successfully", "Welcome to StorageX!")
            }
            (AuthAction::Signup, false) => {
                self.notify(NotificationLevel::Error, "Signup failed", "Unable to create account")
            }
        }
    }

    fn forward_upload_events(&mut self, events: Vec<UploadEvent>) {
        for event in events {
            match event {
                UploadEvent::Phase(phase) => self.emit(AppEvent::UploadPhaseChanged(phase)),
                UploadEvent::Progress(value) => self.emit(AppEvent::UploadProgress(value)),
                UploadEvent::Completed(file) => {
                    let description = format!("{} has been stored on IPFS", file.name);
                    self.emit(AppEvent::FileUploaded(file));
                    self.notify(NotificationLevel::Info, "File uploaded successfully", description);
                }
                UploadEvent::Failed(e) => {
                    self.notify(NotificationLevel::Error, "Upload failed", e.to_string());
                }
            }
        }
    }

    fn handle_wallet_update(&mut self, update: WalletUpdate) {
        match update {
            WalletUpdate::Session(session) => self.emit(AppEvent::WalletChanged(session)),
            WalletUpdate::Connected(connection) => {
                self.emit(AppEvent::WalletConnecting(false));
                tracing::info!(address = %connection.address, chain_id = connection.chain_id, "wallet connect resolved");
                self.notify(NotificationLevel::Info, "Wallet connected", "Your wallet has been connected successfully");
            }
            WalletUpdate::ConnectFailed(e) => {
                self.emit(AppEvent::WalletConnecting(false));
                self.emit(AppEvent::WalletChanged(self.wallet.session().clone()));
                self.notify(NotificationLevel::Error, "Connection failed", e.to_string());
            }
            WalletUpdate::Disconnected => {}
        }
    }

    fn handle_preview(&mut self, hash: String, result: Result<Vec<u8>, StoreError>) {
        match result {
            Ok(bytes) => {
                let text = preview_text(&bytes);
                self.emit(AppEvent::PreviewFetched { hash, text });
            }
            Err(e) => {
                tracing::warn!(%hash, error = %e, "preview fetch failed");
                self.notify(NotificationLevel::Error, "Preview failed", e.to_string());
            }
        }
    }
}

fn upload_error_title(e: &upload::UploadError) -> &'static str {
    match e {
        upload::UploadError::FileTooLarge { .. } => "File too large",
        upload::UploadError::InvalidFileType { .. } => "Invalid file type",
        upload::UploadError::UploadInProgress => "Upload in progress",
        upload::UploadError::UploadFailed(_) => "Upload failed",
    }
}

async fn launch<S: ContentStore + Clone>(
    config: AppConfig,
    store: S,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
) {
    let mut backend = Backend::new(&config, store, InjectedWallet::new(), cmd_rx, event_tx);
    backend.run().await
}

pub async fn init(
    config: AppConfig,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
) {
    match config.storage.backend {
        StorageBackend::Ipfs => {
            tracing::info!(api = %config.storage.api_url, "using IPFS HTTP storage");
            let store = IpfsHttpStore::new(&config.storage);
            launch(config, store, cmd_rx, event_tx).await
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, gateway links will not resolve");
            launch(config, MemoryStore::new(), cmd_rx, event_tx).await
        }
    }
}
