//! Test helpers: a wiremock-backed [`TestContext`] for the HTTP backend and
//! a scripted [`MockBackend`] for driving tables without a server.

#![cfg(test)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use netdeck_states::{MemoryStorage, NotificationCenter};

use crate::{
    BusinessConfig,
    api::{ApiResult, FilteringBackend, HttpBackend, RemovalTarget},
    filtering::{FilteringPayload, FilteringRequest, FilteringResponse},
    table::TableEnv,
};

/// Mock server plus an [`HttpBackend`] pointed at it.
pub struct TestContext {
    pub mock_server: MockServer,
    pub config: BusinessConfig,
    pub backend: HttpBackend,
}

impl TestContext {
    pub async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = BusinessConfig::new(mock_server.uri());
        let backend = HttpBackend::new(&config);

        Self {
            mock_server,
            config,
            backend,
        }
    }

    /// Mount a JSON response for `POST /filtering/{model}`.
    pub async fn mock_filtering(&self, model: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/filtering/{model}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.mock_server)
            .await;
    }

    /// Mount an integer count response for a bulk endpoint.
    pub async fn mock_count(&self, endpoint: &str, count: u64) {
        Mock::given(method("POST"))
            .and(path(endpoint.to_owned()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(count)))
            .mount(&self.mock_server)
            .await;
    }

    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("POST"))
            .and(path(endpoint.to_owned()))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.mock_server)
            .await;
    }

    /// JSON bodies of every request received on `endpoint`, oldest first.
    pub async fn received_bodies(&self, endpoint: &str) -> Vec<Value> {
        self.mock_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == endpoint)
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }
}

/// A request observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub endpoint: String,
    pub body: Value,
}

/// Scripted backend. Filtering answers come from a queue and fall back to
/// an empty page echoing the request's `draw`.
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: Mutex<VecDeque<ApiResult<FilteringResponse>>>,
    counts: Mutex<VecDeque<ApiResult<u64>>>,
    ids: Mutex<Vec<i64>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_response(&self, response: ApiResult<FilteringResponse>) {
        lock(&self.responses).push_back(response);
    }

    /// Queue a page of rows given as a JSON array.
    pub fn push_rows(&self, rows: Value) {
        let response = serde_json::from_value(json!({ "data": rows }))
            .expect("rows should be a JSON array of objects");
        self.push_response(Ok(response));
    }

    pub fn push_count(&self, count: ApiResult<u64>) {
        lock(&self.counts).push_back(count);
    }

    pub fn set_ids(&self, ids: Vec<i64>) {
        *lock(&self.ids) = ids;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Bodies sent to `/filtering/*`.
    pub fn filtering_bodies(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint.starts_with("filtering/"))
            .map(|call| call.body)
            .collect()
    }

    fn record(&self, endpoint: String, body: Value) {
        lock(&self.calls).push(RecordedCall { endpoint, body });
    }

    fn next_count(&self) -> ApiResult<u64> {
        lock(&self.counts).pop_front().unwrap_or(Ok(0))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl FilteringBackend for MockBackend {
    async fn filtering(
        &self,
        model: &str,
        request: &FilteringRequest,
    ) -> ApiResult<FilteringResponse> {
        self.record(
            format!("filtering/{model}"),
            serde_json::to_value(request).unwrap_or(Value::Null),
        );
        lock(&self.responses).pop_front().unwrap_or_else(|| {
            Ok(FilteringResponse {
                draw: Some(request.draw),
                ..FilteringResponse::default()
            })
        })
    }

    async fn filtering_ids(&self, model: &str, payload: &FilteringPayload) -> ApiResult<Vec<i64>> {
        let mut body = serde_json::to_value(payload).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut body {
            map.insert("bulk".to_owned(), json!("id"));
        }
        self.record(format!("filtering/{model}"), body);
        Ok(lock(&self.ids).clone())
    }

    async fn bulk_deletion(&self, model: &str, payload: &FilteringPayload) -> ApiResult<u64> {
        self.record(
            format!("bulk_deletion/{model}"),
            serde_json::to_value(payload).unwrap_or(Value::Null),
        );
        self.next_count()
    }

    async fn bulk_removal(
        &self,
        model: &str,
        target: &RemovalTarget,
        payload: &FilteringPayload,
    ) -> ApiResult<u64> {
        self.record(
            format!(
                "bulk_removal/{model}/{}/{}/{}",
                target.entity_type, target.id, target.property
            ),
            serde_json::to_value(payload).unwrap_or(Value::Null),
        );
        self.next_count()
    }

    async fn bulk_edit(&self, model: &str, form: &Map<String, Value>) -> ApiResult<u64> {
        self.record(format!("bulk_edit/{model}"), Value::Object(form.clone()));
        self.next_count()
    }
}

/// Everything a table needs, wired to a [`MockBackend`].
pub struct TableHarness {
    pub backend: Arc<MockBackend>,
    pub storage: Arc<MemoryStorage>,
    pub notifications: NotificationCenter,
    pub env: TableEnv,
}

impl TableHarness {
    pub fn new() -> Self {
        Self::with_config(BusinessConfig::new("http://nms.test"))
    }

    pub fn with_config(config: BusinessConfig) -> Self {
        let backend = MockBackend::new();
        let storage = Arc::new(MemoryStorage::new());
        let notifications = NotificationCenter::new();
        let env = TableEnv::new(
            backend.clone(),
            storage.clone(),
            notifications.notifier(),
            config,
        );

        Self {
            backend,
            storage,
            notifications,
            env,
        }
    }
}
