use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::{FutureExt, LocalBoxFuture};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::backend::store::{ContentStore, StoreError, StoredContent};
use crate::config::StorageConfig;

/// Client for the IPFS HTTP RPC API (`/api/v0/add`, `/api/v0/cat`).
#[derive(Clone)]
pub struct IpfsHttpStore {
    client: reqwest::Client,
    api_url: String,
    authorization: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
    size: String,
}

impl IpfsHttpStore {
    pub fn new(config: &StorageConfig) -> Self {
        let authorization = match (&config.project_id, &config.project_secret) {
            (Some(id), Some(secret)) => Some(basic_auth(id, secret)),
            _ => None,
        };
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            authorization,
        }
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(url);
        match &self.authorization {
            Some(auth) => request.header(AUTHORIZATION, auth.clone()),
            None => request,
        }
    }

    fn cat_request(&self, hash: &str) -> reqwest::RequestBuilder {
        self.post(&format!("{}/api/v0/cat", self.api_url)).query(&[("arg", hash)])
    }
}

fn basic_auth(id: &str, secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", id, secret)))
}

/// `add` streams one JSON object per line; the last one describes the root.
fn parse_add_response(body: &str) -> Result<StoredContent, StoreError> {
    let line = body
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| StoreError::Malformed("empty add response".to_string()))?;
    let added: AddResponse =
        serde_json::from_str(line).map_err(|e| StoreError::Malformed(e.to_string()))?;
    let size = added
        .size
        .parse::<u64>()
        .map_err(|e| StoreError::Malformed(format!("bad size {:?}: {}", added.size, e)))?;
    Ok(StoredContent { hash: added.hash, size })
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::Status { status: status.as_u16(), body })
    }
}

impl ContentStore for IpfsHttpStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<StoredContent, StoreError>> {
        let part = Part::bytes(bytes).file_name(name.to_string());
        let request = self
            .post(&format!("{}/api/v0/add", self.api_url))
            .query(&[("pin", "true")])
            .multipart(Form::new().part("file", part));
        let name = name.to_string();

        async move {
            tracing::info!(%name, "uploading to IPFS");
            let resp = check_status(request.send().await?).await?;
            let body = resp.text().await?;
            let stored = parse_add_response(&body)?;
            tracing::info!(%name, hash = %stored.hash, size = stored.size, "IPFS add complete");
            Ok(stored)
        }
        .boxed_local()
    }

    fn get(&self, hash: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, StoreError>> {
        let request = self.cat_request(hash);

        async move {
            let resp = check_status(request.send().await?).await?;
            Ok(resp.bytes().await?.to_vec())
        }
        .boxed_local()
    }
}
