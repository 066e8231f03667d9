//! Client for the external user directory.
//!
//! The directory is the system of record for valid customer identities. It
//! exposes one page of users per request; resolving an email means walking
//! pages in order until a match is found or the pages run out.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::DirectoryConfig;

/// Errors that can occur when querying the directory.
///
/// All of these mean the directory could not be consulted; none of them mean
/// "user not found" (that is `Ok(None)` from [`UserDirectory::find_by_email`]).
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Directory returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the page body.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A user record as returned by the directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryUser {
    /// Opaque external identifier.
    pub id: i64,
    /// Unique within the directory; comparison is case-insensitive.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// One page of the paginated users listing.
///
/// `total_pages` is optional: a directory that cannot report its size omits
/// it, and its absence is a stop condition for the search.
#[derive(Debug, Deserialize)]
struct UsersPage {
    page: u32,
    total_pages: Option<u32>,
    #[serde(default)]
    data: Vec<DirectoryUser>,
}

/// Lookup seam for the external user directory.
///
/// The production implementation is [`DirectoryClient`]; tests substitute
/// scripted fakes.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an email to a directory user.
    ///
    /// Returns `Ok(None)` when no directory entry matches; transport and
    /// protocol failures are errors, never `None`.
    async fn find_by_email(&self, email: &str) -> Result<Option<DirectoryUser>, DirectoryError>;
}

/// HTTP client for the paginated user directory.
#[derive(Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    /// Create a new directory client.
    ///
    /// When an API key is configured it is installed as a default `x-api-key`
    /// header on every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the API key is
    /// not a valid header value.
    pub fn new(config: &DirectoryConfig) -> Result<Self, DirectoryError> {
        let mut headers = HeaderMap::new();

        if let Some(api_key) = &config.api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(api_key.expose_secret())
                    .map_err(|e| DirectoryError::Parse(format!("Invalid API key format: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Fetch a single page of the users listing.
    async fn fetch_page(&self, page: u32) -> Result<UsersPage, DirectoryError> {
        let url = format!("{}?page={page}", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<UsersPage>()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))
    }
}

#[async_trait]
impl UserDirectory for DirectoryClient {
    /// Search the directory for a user with the given email.
    ///
    /// Pages are visited in order starting at 1; the first case-insensitive
    /// match wins and no further pages are fetched. A blank email cannot
    /// match a real entry, so it short-circuits without issuing any request.
    async fn find_by_email(&self, email: &str) -> Result<Option<DirectoryUser>, DirectoryError> {
        if email.trim().is_empty() {
            return Ok(None);
        }

        let mut page = 1;
        loop {
            let body = self.fetch_page(page).await?;
            tracing::debug!(page = body.page, users = body.data.len(), "fetched directory page");

            if let Some(user) = body
                .data
                .iter()
                .find(|u| u.email.eq_ignore_ascii_case(email))
            {
                return Ok(Some(user.clone()));
            }

            if no_more_pages(page, body.total_pages) {
                return Ok(None);
            }
            page += 1;
        }
    }
}

/// Stop predicate for the page walk.
///
/// The loop terminates because `total_pages`, once present, bounds the page
/// index, and its absence is itself a stop condition. A malformed directory
/// response can therefore never keep the search spinning.
const fn no_more_pages(page: u32, total_pages: Option<u32>) -> bool {
    match total_pages {
        None => true,
        Some(total) => page >= total,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> DirectoryClient {
        DirectoryClient::new(&DirectoryConfig {
            base_url: server.url("/api/users"),
            api_key: None,
        })
        .unwrap()
    }

    #[test]
    fn test_no_more_pages_absent_total() {
        assert!(no_more_pages(1, None));
    }

    #[test]
    fn test_no_more_pages_on_last_page() {
        assert!(no_more_pages(2, Some(2)));
        assert!(no_more_pages(3, Some(2)));
    }

    #[test]
    fn test_more_pages_remaining() {
        assert!(!no_more_pages(1, Some(2)));
        assert!(!no_more_pages(1, Some(100)));
    }

    #[tokio::test]
    async fn test_found_on_second_page_fetches_exactly_two_pages() {
        let server = MockServer::start();

        let page1 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "1");
                then.status(200).json_body(json!({
                    "page": 1,
                    "total_pages": 2,
                    "data": [
                        { "id": 1, "email": "a@x.com", "first_name": "A", "last_name": "User" }
                    ]
                }));
            });
        let page2 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "2");
                then.status(200).json_body(json!({
                    "page": 2,
                    "total_pages": 2,
                    "data": [
                        { "id": 2, "email": "target@x.com", "first_name": "Target", "last_name": "User" }
                    ]
                }));
            });

        let client = client_for(&server);
        let found = client.find_by_email("TARGET@x.com").await.unwrap();

        let user = found.expect("user should be found");
        assert_eq!(user.id, 2);
        assert_eq!(user.email, "target@x.com");
        assert_eq!(user.first_name, "Target");
        assert_eq!(user.last_name, "User");

        page1.assert_hits(1);
        page2.assert_hits(1);
    }

    #[tokio::test]
    async fn test_match_on_first_page_stops_paging() {
        let server = MockServer::start();

        let page1 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "1");
                then.status(200).json_body(json!({
                    "page": 1,
                    "total_pages": 3,
                    "data": [
                        { "id": 7, "email": "early@x.com", "first_name": "Early", "last_name": "Bird" }
                    ]
                }));
            });
        let later_pages = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "2");
                then.status(200).json_body(json!({ "page": 2, "total_pages": 3, "data": [] }));
            });

        let client = client_for(&server);
        let found = client.find_by_email("early@x.com").await.unwrap();

        assert_eq!(found.unwrap().id, 7);
        page1.assert_hits(1);
        // First match wins; pages past it are never requested.
        later_pages.assert_hits(0);
    }

    #[tokio::test]
    async fn test_not_found_visits_every_page() {
        let server = MockServer::start();

        let page1 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "1");
                then.status(200).json_body(json!({
                    "page": 1,
                    "total_pages": 2,
                    "data": [
                        { "id": 1, "email": "a@x.com", "first_name": "A", "last_name": "User" }
                    ]
                }));
            });
        let page2 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users").query_param("page", "2");
                then.status(200).json_body(json!({
                    "page": 2,
                    "total_pages": 2,
                    "data": [
                        { "id": 2, "email": "b@x.com", "first_name": "B", "last_name": "User" }
                    ]
                }));
            });

        let client = client_for(&server);
        let found = client.find_by_email("missing@x.com").await.unwrap();

        assert!(found.is_none());
        page1.assert_hits(1);
        page2.assert_hits(1);
    }

    #[tokio::test]
    async fn test_missing_total_pages_stops_after_first_page() {
        let server = MockServer::start();

        let page1 = server
            .mock(|when, then| {
                when.method(GET).path("/api/users");
                then.status(200).json_body(json!({
                    "page": 1,
                    "data": [
                        { "id": 1, "email": "a@x.com", "first_name": "A", "last_name": "User" }
                    ]
                }));
            });

        let client = client_for(&server);
        let found = client.find_by_email("missing@x.com").await.unwrap();

        assert!(found.is_none());
        page1.assert_hits(1);
    }

    #[tokio::test]
    async fn test_blank_email_issues_no_request() {
        let server = MockServer::start();

        let any = server
            .mock(|when, then| {
                when.method(GET).path("/api/users");
                then.status(200).json_body(json!({ "page": 1, "data": [] }));
            });

        let client = client_for(&server);
        assert!(client.find_by_email("").await.unwrap().is_none());
        assert!(client.find_by_email("   ").await.unwrap().is_none());

        any.assert_hits(0);
    }

    #[tokio::test]
    async fn test_missing_data_array_is_an_empty_page() {
        let server = MockServer::start();

        server
            .mock(|when, then| {
                when.method(GET).path("/api/users");
                then.status(200).json_body(json!({ "page": 1, "total_pages": 1 }));
            });

        let client = client_for(&server);
        assert!(client.find_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_a_transport_failure_not_not_found() {
        let server = MockServer::start();

        server
            .mock(|when, then| {
                when.method(GET).path("/api/users");
                then.status(500).body("boom");
            });

        let client = client_for(&server);
        let err = client.find_by_email("a@x.com").await.unwrap_err();

        match err {
            DirectoryError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unparsable_body_is_a_parse_error() {
        let server = MockServer::start();

        server
            .mock(|when, then| {
                when.method(GET).path("/api/users");
                then.status(200).body("not json");
            });

        let client = client_for(&server);
        let err = client.find_by_email("a@x.com").await.unwrap_err();

        assert!(matches!(err, DirectoryError::Parse(_)));
    }

    #[tokio::test]
    async fn test_api_key_header_attached_when_configured() {
        let server = MockServer::start();

        let keyed = server
            .mock(|when, then| {
                when.method(GET)
                    .path("/api/users")
                    .header("x-api-key", "reqres-free-v1");
                then.status(200).json_body(json!({ "page": 1, "data": [] }));
            });

        let client = DirectoryClient::new(&DirectoryConfig {
            base_url: server.url("/api/users"),
            api_key: Some(secrecy::SecretString::from("reqres-free-v1")),
        })
        .unwrap();

        assert!(client.find_by_email("a@x.com").await.unwrap().is_none());
        keyed.assert_hits(1);
    }
}
