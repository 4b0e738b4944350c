//! Client for the peer authors service.
//!
//! One GET per lookup against `{base_url}/authors/{id}`; the peer answers with
//! the same result/error envelope this service produces. No retries.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use books_http::Envelope;
use books_kernel::settings::AuthorsSettings;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use super::models::Author;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("author '{0}' not found")]
    NotFound(String),

    #[error("authors service error {code}: {message}")]
    Remote { code: String, message: String },

    #[error("authors service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("authors service unreachable: {0}")]
    Transport(String),

    #[error("invalid authors payload: {0}")]
    Decode(String),
}

/// Resolves author identifiers into author records.
#[async_trait]
pub trait AuthorLookup: Send + Sync {
    async fn fetch_author(&self, author_id: &str) -> Result<Author, LookupError>;
}

/// Reqwest-backed [`AuthorLookup`].
#[derive(Debug, Clone)]
pub struct HttpAuthorClient {
    client: Client,
    base_url: Url,
}

impl HttpAuthorClient {
    pub fn new(settings: &AuthorsSettings) -> anyhow::Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("invalid authors base url '{}'", settings.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("authors base url '{}' cannot be a base", settings.base_url);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("failed to build authors http client")?;
        Ok(Self { client, base_url })
    }

    fn author_url(&self, author_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("authors").push(author_id);
        }
        url
    }
}

#[async_trait]
impl AuthorLookup for HttpAuthorClient {
    async fn fetch_author(&self, author_id: &str) -> Result<Author, LookupError> {
        let response = self
            .client
            .get(self.author_url(author_id))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound(author_id.to_string()));
        }

        let unexpected_status = || LookupError::Status {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        };

        let envelope = match serde_json::from_slice::<Envelope<Author>>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => return Err(unexpected_status()),
            Err(err) => return Err(LookupError::Decode(err.to_string())),
        };

        match envelope.into_result() {
            Ok(author) if status.is_success() => Ok(author),
            Ok(_) => Err(unexpected_status()),
            Err(error) => Err(LookupError::Remote {
                code: error.code,
                message: error.message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use tokio::net::TcpListener;

    async fn author_endpoint(Path(id): Path<String>) -> Response {
        match id.as_str() {
            "1" => Json(serde_json::json!({
                "result": {"author_id": "1", "author_name": "Ada", "author_surname": "Lovelace"}
            }))
            .into_response(),
            "2" => Json(serde_json::json!({
                "error": {"code": "AUTHORS_GETSINGLE_001", "message": "Unable to retrieve author"}
            }))
            .into_response(),
            "3" => AxumStatus::NOT_FOUND.into_response(),
            "4" => (AxumStatus::INTERNAL_SERVER_ERROR, "kaboom").into_response(),
            "a b" => Json(serde_json::json!({"result": {"author_id": "a b"}})).into_response(),
            _ => (AxumStatus::OK, "not json").into_response(),
        }
    }

    async fn spawn_authors_service() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/authors/{id}", get(author_endpoint));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> HttpAuthorClient {
        HttpAuthorClient::new(&AuthorsSettings {
            base_url: base_url.to_string(),
            ..AuthorsSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_author_url_appends_segments() {
        let c = client("http://authors.local:8081/api/");
        assert_eq!(
            c.author_url("42").as_str(),
            "http://authors.local:8081/api/authors/42"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpAuthorClient::new(&AuthorsSettings {
            base_url: "not a url".to_string(),
            ..AuthorsSettings::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fetches_author_from_result_envelope() {
        let base = spawn_authors_service().await;
        let author = client(&base).fetch_author("1").await.unwrap();
        assert_eq!(author.author_id, "1");
        assert_eq!(author.author_name, "Ada");
    }

    #[tokio::test]
    async fn test_encodes_author_id_in_path() {
        let base = spawn_authors_service().await;
        let author = client(&base).fetch_author("a b").await.unwrap();
        assert_eq!(author.author_id, "a b");
        assert!(author.author_surname.is_empty());
    }

    #[tokio::test]
    async fn test_maps_remote_error_envelope() {
        let base = spawn_authors_service().await;
        let err = client(&base).fetch_author("2").await.unwrap_err();
        assert!(
            matches!(err, LookupError::Remote { ref code, .. } if code == "AUTHORS_GETSINGLE_001")
        );
    }

    #[tokio::test]
    async fn test_maps_http_failures() {
        let base = spawn_authors_service().await;
        let c = client(&base);

        assert!(matches!(
            c.fetch_author("3").await.unwrap_err(),
            LookupError::NotFound(id) if id == "3"
        ));
        assert!(matches!(
            c.fetch_author("4").await.unwrap_err(),
            LookupError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert!(matches!(
            c.fetch_author("garbage").await.unwrap_err(),
            LookupError::Decode(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .fetch_author("1")
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }
}
