//! REST client for the exam backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use examforge_core::error::StoreError;
use examforge_core::model::Surface;
use examforge_core::traits::{Operation, QuestionStore, StoredRecord};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// `QuestionStore` over the backend's REST endpoints, authenticated with a
/// bearer token.
pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// List responses of the questions and essays surfaces.
#[derive(Deserialize)]
struct QuestionList {
    #[serde(default)]
    questions: Vec<StoredRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<StoredRecord>),
    Wrapped(QuestionList),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn collection(surface: Surface) -> &'static str {
        match surface {
            Surface::Questions => "questions",
            Surface::Essays => "essay-questions",
            Surface::Qcm => "qcm",
        }
    }

    fn list_path(surface: Surface, filter_key: &str) -> String {
        match surface {
            Surface::Questions | Surface::Essays => {
                format!("/{}/exam/{filter_key}", Self::collection(surface))
            }
            Surface::Qcm => format!("/qcm/chapter/{filter_key}"),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, StoreError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                StoreError::Network(format!("backend not reachable at {}", self.base_url))
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        if status >= 400 {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP error! status: {status}"));
            return Err(match status {
                401 | 403 => StoreError::Unauthorized(message),
                404 => StoreError::NotFound(message),
                _ => StoreError::Api { status, message },
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl QuestionStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip_all, fields(surface = %surface, operation = operation.verb()))]
    async fn submit(
        &self,
        surface: Surface,
        operation: Operation,
        record: Value,
    ) -> Result<StoredRecord, StoreError> {
        let collection = Self::collection(surface);
        let request = match operation {
            Operation::Create => self
                .client
                .post(format!("{}/{collection}", self.base_url))
                .json(&record),
            Operation::Update(id) => self
                .client
                .put(format!("{}/{collection}/{id}", self.base_url))
                .json(&record),
            Operation::Delete(id) => self
                .client
                .delete(format!("{}/{collection}/{id}", self.base_url)),
        };

        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(StoredRecord::default());
        }
        serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("failed to parse record: {e}")))
    }

    #[instrument(skip_all, fields(surface = %surface, filter_key = %filter_key))]
    async fn list(
        &self,
        surface: Surface,
        filter_key: &str,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let url = format!("{}{}", self.base_url, Self::list_path(surface, filter_key));
        let body = self.send(self.client.get(url)).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let list: ListBody = serde_json::from_str(&body)
            .map_err(|e| StoreError::InvalidResponse(format!("failed to parse list: {e}")))?;
        Ok(match list {
            ListBody::Bare(records) => records,
            ListBody::Wrapped(wrapped) => wrapped.questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> HttpStore {
        HttpStore::new(&server.uri(), Some("secret".into()), 5).unwrap()
    }

    #[tokio::test]
    async fn create_posts_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/qcm"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({"chapterId": 3})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": 41, "question": "Q"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stored = store(&server)
            .submit(
                Surface::Qcm,
                Operation::Create,
                json!({"chapterId": 3, "question": "Q"}),
            )
            .await
            .unwrap();
        assert_eq!(stored.id, Some(41));
        assert_eq!(stored.fields["question"], "Q");
    }

    #[tokio::test]
    async fn update_and_delete_address_the_record() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/essay-questions/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/questions/9"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store(&server);
        let updated = store
            .submit(Surface::Essays, Operation::Update(9), json!({}))
            .await
            .unwrap();
        assert_eq!(updated.id, Some(9));

        let deleted = store
            .submit(Surface::Questions, Operation::Delete(9), Value::Null)
            .await
            .unwrap();
        assert_eq!(deleted, StoredRecord::default());
    }

    #[tokio::test]
    async fn lists_unwrap_each_surface_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/questions/exam/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"questions": [{"id": 1, "type": "text"}, {"id": 2, "type": "table"}]}),
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/qcm/chapter/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
            .mount(&server)
            .await;

        let store = store(&server);
        let questions = store.list(Surface::Questions, "5").await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].fields["type"], "table");

        let qcm = store.list(Surface::Qcm, "7").await.unwrap();
        assert_eq!(qcm[0].id, Some(3));
    }

    #[tokio::test]
    async fn error_message_comes_from_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/questions"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"message": "Exam not found"})),
            )
            .mount(&server)
            .await;

        let err = store(&server)
            .submit(Surface::Questions, Operation::Create, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 400, .. }));
        assert!(err.to_string().contains("Exam not found"));
    }

    #[tokio::test]
    async fn status_fallback_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/essay-questions/exam/1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = store(&server).list(Surface::Essays, "1").await.unwrap_err();
        assert!(err.to_string().contains("HTTP error! status: 500"));
    }

    #[tokio::test]
    async fn rejected_credential_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/qcm"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = store(&server)
            .submit(Surface::Qcm, Operation::Create, json!({}))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn debug_masks_token() {
        let store = HttpStore::new("", Some("secret".into()), 5).unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains(DEFAULT_BASE_URL));
    }
}
