//! Directory client for a remote `/users/search` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{DirectoryError, UserDirectory, UserPage, UserQuery};

pub struct HttpDirectory {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_url(&self) -> String {
        format!("{}/users/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl UserDirectory for HttpDirectory {
    async fn search(&self, query: &UserQuery) -> Result<UserPage, DirectoryError> {
        query.validate()?;
        let url = self.search_url();
        debug!(url = %url, "Remote user search");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Http {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        response
            .json::<UserPage>()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_filters_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/search"))
            .and(query_param("role", "admin"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 26,
                "items": [{
                    "id": "u1", "name": "Alice Smith", "email": "alice@example.com",
                    "role": "admin", "created_at": "2024-01-01"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = HttpDirectory::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let page = dir
            .search(&UserQuery::default().with_role("admin").with_limit(5))
            .await
            .unwrap();
        assert_eq!(page.total, 26);
        assert_eq!(page.items[0].name, "Alice Smith");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let dir = HttpDirectory::new(server.uri(), Duration::from_secs(5)).unwrap();
        match dir.search(&UserQuery::default()).await.unwrap_err() {
            DirectoryError::Http { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_limit_never_reaches_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = HttpDirectory::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = dir
            .search(&UserQuery::default().with_limit(500))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidQuery(_)));
    }
}
