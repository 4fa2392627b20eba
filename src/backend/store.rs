use futures::future::{self, LocalBoxFuture};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected storage API response: {0}")]
    Malformed(String),
    #[error("content {0} not found")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredContent {
    pub hash: String,
    pub size: u64,
}

/// A content-addressed blob store. Returned futures own everything they
/// need so they can be parked while the backend keeps serving commands.
pub trait ContentStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<StoredContent, StoreError>>;
    fn get(&self, hash: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, StoreError>>;
}

/// Maps content hashes to viewable URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct Gateway {
    base: String,
}

impl Gateway {
    pub fn new(base: &str) -> Self {
        Self { base: base.trim_end_matches('/').to_string() }
    }

    pub fn url_for(&self, hash: &str) -> String {
        format!("{}/{}", self.base, hash)
    }
}

/// In-process store keyed by hex SHA-256 of the content.
#[derive(Clone, Default)]
pub struct MemoryStore {
    blobs: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }
}

impl ContentStore for MemoryStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> LocalBoxFuture<'static, Result<StoredContent, StoreError>> {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let hash = hex::encode(hasher.finalize());
        let size = bytes.len() as u64;
        tracing::debug!(name, %hash, size, "stored blob in memory");
        self.blobs.borrow_mut().insert(hash.clone(), bytes);
        Box::pin(future::ready(Ok(StoredContent { hash, size })))
    }

    fn get(&self, hash: &str) -> LocalBoxFuture<'static, Result<Vec<u8>, StoreError>> {
        let result = self
            .blobs
            .borrow()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hash.to_string()));
        Box::pin(future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_url() {
        assert_eq!(Gateway::new("https://ipfs.io/ipfs").url_for("bafy123"), "https://ipfs.io/ipfs/bafy123");
        assert_eq!(Gateway::new("https://ipfs.io/ipfs/").url_for("bafy123"), "https://ipfs.io/ipfs/bafy123");
    }

    #[tokio::test]
    async fn test_memory_store_put_get() {
        let store = MemoryStore::new();
        let stored = store.put("hello.txt", b"hello".to_vec()).await.expect("Failed to put");
        assert_eq!(stored.size, 5);
        assert_eq!(stored.hash, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");

        let again = store.put("copy.txt", b"hello".to_vec()).await.unwrap();
        assert_eq!(again.hash, stored.hash);
        assert_eq!(store.len(), 1);

        let bytes = store.get(&stored.hash).await.expect("Failed to get");
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn test_memory_store_missing_hash() {
        let store = MemoryStore::new();
        match store.get("nope").await {
            Err(StoreError::NotFound(hash)) => assert_eq!(hash, "nope"),
            other => panic!("Expected NotFound, got {:?}", other.map(|b| b.len())),
        }
    }
}
