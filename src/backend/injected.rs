use dioxus::prelude::document;
use futures::future::{FutureExt, LocalBoxFuture};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;

use crate::backend::wallet::{Connection, ConnectorInfo, WalletConnector, WalletError, WalletEvent};

pub const INJECTED_CONNECTOR_ID: &str = "injected";

const REQUEST_ACCOUNTS_JS: &str = r#"
    (async () => {
        const provider = window.ethereum;
        if (!provider) {
            dioxus.send({ error: "No browser wallet found" });
            return;
        }
        try {
            const accounts = await provider.request({ method: "eth_requestAccounts" });
            const chainId = await provider.request({ method: "eth_chainId" });
            dioxus.send({ accounts: accounts, chainId: chainId });
        } catch (e) {
            dioxus.send({ error: (e && e.message) ? e.message : String(e) });
        }
    })();
"#;

const REVOKE_JS: &str = r#"
    (async () => {
        const provider = window.ethereum;
        if (!provider) {
            dioxus.send({});
            return;
        }
        try {
            await provider.request({ method: "wallet_revokePermissions", params: [{ eth_accounts: {} }] });
            dioxus.send({});
        } catch (e) {
            dioxus.send({ error: (e && e.message) ? e.message : String(e) });
        }
    })();
"#;

#[derive(Debug, Default, Deserialize)]
struct ProviderReply {
    #[serde(default)]
    accounts: Vec<String>,
    #[serde(rename = "chainId")]
    chain_id: Option<String>,
    error: Option<String>,
}

type Subscribers = Rc<RefCell<Vec<mpsc::UnboundedSender<WalletEvent>>>>;

/// EIP-1193 provider injected by a browser extension (`window.ethereum`).
#[derive(Clone, Default)]
pub struct InjectedWallet {
    subscribers: Subscribers,
}

impl InjectedWallet {
    pub fn new() -> Self {
        Self::default()
    }
}

fn broadcast(subscribers: &Subscribers, event: WalletEvent) {
    subscribers.borrow_mut().retain(|tx| tx.send(event.clone()).is_ok());
}

async fn ask_provider(script: &str) -> Result<ProviderReply, WalletError> {
    let mut eval = document::eval(script);
    let value: serde_json::Value = eval
        .recv()
        .await
        .map_err(|e| WalletError::ConnectionFailed(format!("{:?}", e)))?;
    serde_json::from_value(value).map_err(|e| WalletError::ConnectionFailed(e.to_string()))
}

/// `eth_chainId` answers with a hex quantity such as `"0xaa36a7"`.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

fn connection_from_reply(reply: ProviderReply) -> Result<Connection, WalletError> {
    if let Some(error) = reply.error {
        return Err(WalletError::ConnectionFailed(error));
    }
    let address = reply
        .accounts
        .into_iter()
        .next()
        .ok_or_else(|| WalletError::ConnectionFailed("wallet returned no accounts".to_string()))?;
    let chain_id = reply.chain_id.as_deref().and_then(parse_chain_id).unwrap_or(1);
    Ok(Connection { address, chain_id })
}

impl WalletConnector for InjectedWallet {
    fn connectors(&self) -> Vec<ConnectorInfo> {
        vec![ConnectorInfo { id: INJECTED_CONNECTOR_ID.to_string(), name: "Browser Wallet".to_string() }]
    }

    fn connect(&self, connector_id: &str) -> LocalBoxFuture<'static, Result<Connection, WalletError>> {
        let subscribers = self.subscribers.clone();
        let known = connector_id == INJECTED_CONNECTOR_ID;
        let connector_id = connector_id.to_string();

        async move {
            if !known {
                return Err(WalletError::ConnectionFailed(format!("unknown connector {}", connector_id)));
            }
            let connection = connection_from_reply(ask_provider(REQUEST_ACCOUNTS_JS).await?)?;
            broadcast(
                &subscribers,
                WalletEvent::Connected { address: connection.address.clone(), chain_id: connection.chain_id },
            );
            Ok(connection)
        }
        .boxed_local()
    }

    fn disconnect(&self) -> LocalBoxFuture<'static, Result<(), WalletError>> {
        let subscribers = self.subscribers.clone();

        async move {
            // Subscribers hear about the disconnect even if revoking fails.
            let reply = ask_provider(REVOKE_JS).await;
            broadcast(&subscribers, WalletEvent::Disconnected);
            match reply?.error {
                Some(error) => Err(WalletError::ConnectionFailed(error)),
                None => Ok(()),
            }
        }
        .boxed_local()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<WalletEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}
