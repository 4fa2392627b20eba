use futures::future::{FutureExt, LocalBoxFuture};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::backend::poll_slot;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    #[error("wallet connection failed: {0}")]
    ConnectionFailed(String),
    #[error("no wallet connector available")]
    NoConnector,
    #[error("a wallet request is already pending")]
    RequestPending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub address: String,
    pub chain_id: u64,
}

/// Pushed by the connector whenever the account connects or goes away.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    Connected { address: String, chain_id: u64 },
    Disconnected,
}

/// External wallet provider.
pub trait WalletConnector {
    fn connectors(&self) -> Vec<ConnectorInfo>;
    fn connect(&self, connector_id: &str) -> LocalBoxFuture<'static, Result<Connection, WalletError>>;
    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletError>>;
    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent>;
}

/// Local view of the connector's session. `address` is set exactly when
/// connected; the only constructors keep that true.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletSession {
    address: Option<String>,
    chain_id: Option<u64>,
}

impl WalletSession {
    pub fn connected(address: String, chain_id: u64) -> Self {
        Self { address: Some(address), chain_id: Some(chain_id) }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WalletUpdate {
    Session(WalletSession),
    Connected(Connection),
    ConnectFailed(WalletError),
    Disconnected,
}

enum Request {
    Connect(Result<Connection, WalletError>),
    Disconnect(Result<(), WalletError>),
}

enum Wake {
    Request(Request),
    Event(Option<WalletEvent>),
}

pub struct WalletState<W> {
    connector: W,
    session: WalletSession,
    pending: Option<LocalBoxFuture<'static, Request>>,
    connecting: bool,
    events: mpsc::UnboundedReceiver<WalletEvent>,
    events_open: bool,
}

impl<W: WalletConnector> WalletState<W> {
    pub fn new(connector: W) -> Self {
        let events = connector.subscribe();
        Self {
            connector,
            session: WalletSession::disconnected(),
            pending: None,
            connecting: false,
            events,
            events_open: true,
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.events_open
    }

    /// Starts a connection on the first available connector. The session
    /// itself is filled in once the connector reports the account.
    pub fn connect_wallet(&mut self) -> Result<(), WalletError> {
        if self.connecting {
            return Err(WalletError::RequestPending);
        }
        let connector = self.connector.connectors().into_iter().next().ok_or(WalletError::NoConnector)?;

        tracing::info!(connector = %connector.id, "requesting wallet connection");
        let request = self.connector.connect(&connector.id);
        self.pending = Some(request.map(Request::Connect).boxed_local());
        self.connecting = true;
        Ok(())
    }

    /// Clears the local session right away; the connector is told
    /// afterwards and its answer cannot undo the local disconnect. A pending
    /// connect is dropped.
    pub fn disconnect_wallet(&mut self) -> WalletSession {
        if self.connecting {
            tracing::info!("dropping pending wallet connection");
        }
        self.connecting = false;
        self.session = WalletSession::disconnected();
        self.pending = Some(self.connector.disconnect().map(Request::Disconnect).boxed_local());
        self.session.clone()
    }

    pub fn apply(&mut self, event: WalletEvent) -> WalletSession {
        self.session = match event {
            WalletEvent::Connected { address, chain_id } => {
                tracing::info!(%address, chain_id, "wallet connected");
                WalletSession::connected(address, chain_id)
            }
            WalletEvent::Disconnected => {
                tracing::info!("wallet disconnected");
                WalletSession::disconnected()
            }
        };
        self.session.clone()
    }

    pub async fn next_update(&mut self) -> Option<WalletUpdate> {
        if !self.is_active() {
            return None;
        }

        let wake = tokio::select! {
            biased;
            request = poll_slot(&mut self.pending) => Wake::Request(request),
            event = self.events.recv(), if self.events_open => Wake::Event(event),
        };

        match wake {
            Wake::Request(Request::Connect(result)) => {
                self.pending = None;
                self.connecting = false;
                match result {
                    Ok(connection) => Some(WalletUpdate::Connected(connection)),
                    Err(e) => {
                        tracing::warn!(error = %e, "wallet connection failed");
                        Some(WalletUpdate::ConnectFailed(e))
                    }
                }
            }
            Wake::Request(Request::Disconnect(result)) => {
                self.pending = None;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "connector reported an error on disconnect");
                }
                Some(WalletUpdate::Disconnected)
            }
            Wake::Event(Some(event)) => Some(WalletUpdate::Session(self.apply(event))),
            Wake::Event(None) => {
                self.events_open = false;
                None
            }
        }
    }
}
