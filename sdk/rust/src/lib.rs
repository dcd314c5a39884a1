//! Typed client for the anime record service.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// A stored record as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub author: String,
}

/// Body for create and update requests.
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord {
    pub name: String,
    pub genre: String,
    pub year: i32,
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Error type for client calls.
#[derive(Debug)]
pub enum ClientError {
    /// Transport or decoding failure.
    Http(reqwest::Error),
    /// The service answered with a non-success status.
    Api { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::Api { status, message } => {
                write!(f, "Service returned {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

pub struct RecordsClient {
    client: Client,
    base_url: String,
}

impl RecordsClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Use a preconfigured `reqwest` client (proxies, timeouts, pooling).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /records
    pub async fn list(&self) -> Result<Vec<Record>, ClientError> {
        let resp = self.client.get(self.url("/records")).send().await?;
        decode(resp).await
    }

    /// GET /records?id=
    pub async fn get(&self, id: &str) -> Result<Option<Record>, ClientError> {
        let resp = self
            .client
            .get(self.url("/records"))
            .query(&[("id", id)])
            .send()
            .await?;
        decode_optional(resp).await
    }

    /// GET /records?name= (case-insensitive). No match yields an empty list.
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Record>, ClientError> {
        let resp = self
            .client
            .get(self.url("/records"))
            .query(&[("name", name)])
            .send()
            .await?;
        Ok(decode_optional(resp).await?.unwrap_or_default())
    }

    /// POST /records
    pub async fn create(&self, record: &NewRecord) -> Result<Record, ClientError> {
        let resp = self
            .client
            .post(self.url("/records"))
            .json(record)
            .send()
            .await?;
        decode(resp).await
    }

    /// PUT /records/{id}
    pub async fn update(&self, id: &str, record: &NewRecord) -> Result<Option<Record>, ClientError> {
        let resp = self
            .client
            .put(self.url(&format!("/records/{}", id)))
            .json(record)
            .send()
            .await?;
        decode_optional(resp).await
    }

    /// DELETE /records/{id}
    pub async fn delete(&self, id: &str) -> Result<Option<Record>, ClientError> {
        let resp = self
            .client
            .delete(self.url(&format!("/records/{}", id)))
            .send()
            .await?;
        decode_optional(resp).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await?;
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.error,
        Err(_) => text,
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode_optional<T: serde::de::DeserializeOwned>(
    resp: Response,
) -> Result<Option<T>, ClientError> {
    if resp.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    decode(resp).await.map(Some)
}
