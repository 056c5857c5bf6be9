//! Authenticated JSON client for the Flowspace backend
//!
//! Every request carries the current bearer token. Failed responses are
//! turned into [`Error::Api`] with a message from
//! [`normalize_error`](crate::utils::http::normalize_error).

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::UploadFile;
use crate::storage::LocalStorage;
use crate::utils::http::{normalize_error, ErrorBody};

pub struct HttpClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    storage: Option<Arc<LocalStorage>>,
}

impl HttpClient {
    /// Create a client, picking up any token left in local storage
    pub fn new(
        base_url: &str,
        timeout: Duration,
        storage: Option<Arc<LocalStorage>>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url, storage))
    }

    /// Create a client around an existing reqwest client
    pub fn with_client(client: Client, base_url: &str, storage: Option<Arc<LocalStorage>>) -> Self {
        let token = storage.as_ref().and_then(|s| match s.token() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(token),
            storage,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    /// Replace the token in memory and in local storage
    pub fn set_token(&self, token: Option<String>) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.set_token(token.as_deref()) {
                warn!("Failed to persist token: {}", e);
            }
        }
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        let req = self.client.request(method, self.url(path));
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let status_text = status.canonical_reason().unwrap_or("");
        let raw = resp.text().await.unwrap_or_default();
        let body = ErrorBody::parse(&raw, status_text);
        let message = normalize_error(status.as_u16(), &body);
        debug!("Request failed with {}: {}", status, message);

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        Ok(resp.json().await?)
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .send(self.request(Method::POST, path).json(body))
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let resp = self
            .send(self.request(Method::PUT, path).json(body))
            .await?;
        Ok(resp.json().await?)
    }

    /// DELETE, ignoring whatever body comes back
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// POST a multipart form
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let resp = self
            .send(self.request(Method::POST, path).multipart(form))
            .await?;
        Ok(resp.json().await?)
    }

    /// GET raw bytes (exports, file downloads)
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Build a multipart form from text fields plus files under the `files` key
pub fn multipart_form(fields: &[(&str, String)], files: &[UploadFile]) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.to_string(), value.clone());
    }
    for file in files {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| Error::Validation(format!("Invalid content type for {}: {}", file.name, e)))?;
        form = form.part("files", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpClient::new("http://localhost:8000/", Duration::from_secs(5), None).unwrap();
        assert_eq!(client.url("/api/projects/"), "http://localhost:8000/api/projects/");
    }

    #[test]
    fn test_token_loaded_from_storage_and_cleared() {
        let storage = Arc::new(LocalStorage::in_memory().unwrap());
        storage.set_token(Some("stored-token")).unwrap();

        let client = HttpClient::new("http://localhost:8000", Duration::from_secs(5), Some(storage.clone())).unwrap();
        assert_eq!(client.token().as_deref(), Some("stored-token"));

        client.set_token(None);
        assert_eq!(client.token(), None);
        assert_eq!(storage.token().unwrap(), None);
    }

    #[test]
    fn test_multipart_rejects_bad_mime() {
        let files = vec![UploadFile::new("a.bin", "not a mime\n", vec![1, 2, 3])];
        assert!(matches!(multipart_form(&[], &files), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = HttpClient::new("http://127.0.0.1:9", Duration::from_secs(2), None).unwrap();
        let result: Result<serde_json::Value> = client.get("/api/users/me").await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
