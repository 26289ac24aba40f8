//! Filtering and bulk-operation calls against the automation server.
//!
//! [`FilteringBackend`] is the seam the table engine talks through.
//! [`HttpBackend`] is the real implementation; tests swap in their own.

use async_trait::async_trait;
use log::{debug, error};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use netdeck_states::Notification;

use crate::{
    BusinessConfig,
    filtering::{FilteringPayload, FilteringRequest, FilteringResponse, IdsRequest},
    http::{Client, Response},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP Error 403 – Forbidden")]
    Forbidden,
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API returned status: {0}")]
    Status(u16),
    #[error("Failed to parse {what}: {message}")]
    Decode { what: &'static str, message: String },
    #[error("{}", .0.join("; "))]
    Alert(Vec<String>),
    #[error("Invalid input for {} field(s)", .0.len())]
    InvalidForm(Vec<FieldError>),
}

impl ApiError {
    fn decode(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            what,
            message: err.to_string(),
        }
    }

    /// What the user is told: one notification, except for server alerts
    /// (one per alert) and form errors (one per field).
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            Self::Alert(alerts) => alerts
                .iter()
                .map(|alert| Notification::error(alert.as_str()))
                .collect(),
            Self::InvalidForm(errors) => errors
                .iter()
                .map(|e| Notification::error(format!("{}: {}", e.field, e.message)))
                .collect(),
            other => vec![Notification::error(other.to_string())],
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Relation a bulk removal detaches rows from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalTarget {
    /// Entity type of the parent, e.g. `pool`.
    pub entity_type: String,
    pub id: i64,
    /// Parent property holding the rows, e.g. `devices`.
    pub property: String,
}

#[async_trait]
pub trait FilteringBackend: Send + Sync {
    /// `POST /filtering/{model}`
    async fn filtering(
        &self,
        model: &str,
        request: &FilteringRequest,
    ) -> ApiResult<FilteringResponse>;

    /// `POST /filtering/{model}` with `bulk: "id"`, returning matching ids.
    async fn filtering_ids(&self, model: &str, payload: &FilteringPayload) -> ApiResult<Vec<i64>>;

    /// `POST /bulk_deletion/{model}`
    async fn bulk_deletion(&self, model: &str, payload: &FilteringPayload) -> ApiResult<u64>;

    /// `POST /bulk_removal/{model}/{type}/{id}/{property}`
    async fn bulk_removal(
        &self,
        model: &str,
        target: &RemovalTarget,
        payload: &FilteringPayload,
    ) -> ApiResult<u64>;

    /// `POST /bulk_edit/{model}`
    async fn bulk_edit(&self, model: &str, form: &Map<String, Value>) -> ApiResult<u64>;
}

/// Interprets a call result the way the console does: 403 or a bare
/// `false` means forbidden, `alert` and `invalid_form` bodies are errors.
pub fn decode_call_result<T: DeserializeOwned>(
    response: &Response,
    what: &'static str,
) -> ApiResult<T> {
    if response.status == 403 {
        return Err(ApiError::Forbidden);
    }
    if !response.is_success() {
        return Err(ApiError::Status(response.status));
    }

    let value: Value = response.json().map_err(|e| ApiError::decode(what, e))?;
    match &value {
        Value::Bool(false) => return Err(ApiError::Forbidden),
        Value::Object(body) => {
            if let Some(alert) = body.get("alert") {
                return Err(ApiError::Alert(alert_messages(alert)));
            }
            if body.get("invalid_form").and_then(Value::as_bool) == Some(true) {
                return Err(ApiError::InvalidForm(field_errors(body.get("errors"))));
            }
        }
        _ => {}
    }

    serde_json::from_value(value).map_err(|e| ApiError::decode(what, e))
}

fn alert_messages(alert: &Value) -> Vec<String> {
    match alert {
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(other)],
    }
}

fn field_errors(errors: Option<&Value>) -> Vec<FieldError> {
    let Some(Value::Object(errors)) = errors else {
        return Vec::new();
    };
    errors
        .iter()
        .map(|(field, message)| FieldError {
            field: field.clone(),
            message: match message {
                Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
                other => value_text(other),
            },
        })
        .collect()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(config: &BusinessConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    async fn post<B, T>(&self, path: &str, body: &B, what: &'static str) -> ApiResult<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {path}");
        let request = self
            .client
            .post(path)
            .json(body)
            .map_err(|e| ApiError::Transport(format!("Failed to serialize request: {e}")))?;

        let response = request.send().await.map_err(|e| {
            error!("POST {path} failed: {e}");
            ApiError::Transport(e.message)
        })?;

        decode_call_result(&response, what)
    }
}

#[async_trait]
impl FilteringBackend for HttpBackend {
    async fn filtering(
        &self,
        model: &str,
        request: &FilteringRequest,
    ) -> ApiResult<FilteringResponse> {
        self.post(&format!("filtering/{model}"), request, "FilteringResponse")
            .await
    }

    async fn filtering_ids(&self, model: &str, payload: &FilteringPayload) -> ApiResult<Vec<i64>> {
        let body = IdsRequest { payload, bulk: "id" };
        self.post(&format!("filtering/{model}"), &body, "id list")
            .await
    }

    async fn bulk_deletion(&self, model: &str, payload: &FilteringPayload) -> ApiResult<u64> {
        self.post(&format!("bulk_deletion/{model}"), payload, "deletion count")
            .await
    }

    async fn bulk_removal(
        &self,
        model: &str,
        target: &RemovalTarget,
        payload: &FilteringPayload,
    ) -> ApiResult<u64> {
        let path = format!(
            "bulk_removal/{model}/{}/{}/{}",
            target.entity_type, target.id, target.property
        );
        self.post(&path, payload, "removal count").await
    }

    async fn bulk_edit(&self, model: &str, form: &Map<String, Value>) -> ApiResult<u64> {
        self.post(&format!("bulk_edit/{model}"), form, "edit count")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestContext;
    use netdeck_states::NotificationLevel;
    use serde_json::json;
    use std::collections::HashMap;

    fn response(status: u16, body: Value) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[test]
    fn false_body_is_forbidden() {
        let result: ApiResult<u64> = decode_call_result(&response(200, json!(false)), "count");
        assert_eq!(result, Err(ApiError::Forbidden));
    }

    #[test]
    fn status_403_is_forbidden() {
        let result: ApiResult<u64> = decode_call_result(&response(403, json!({})), "count");
        assert_eq!(result, Err(ApiError::Forbidden));
        assert_eq!(
            ApiError::Forbidden.notifications(),
            vec![Notification::error("HTTP Error 403 – Forbidden")]
        );
    }

    #[test]
    fn alert_string_and_list() {
        let single: ApiResult<u64> =
            decode_call_result(&response(200, json!({"alert": "Not allowed"})), "count");
        assert_eq!(single, Err(ApiError::Alert(vec!["Not allowed".to_owned()])));

        let many: ApiResult<u64> =
            decode_call_result(&response(200, json!({"alert": ["a", "b"]})), "count");
        let err = many.unwrap_err();
        let notes = err.notifications();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.level == NotificationLevel::Error));
    }

    #[test]
    fn invalid_form_yields_one_notification_per_field() {
        let result: ApiResult<u64> = decode_call_result(
            &response(
                200,
                json!({"invalid_form": true, "errors": {"name": ["Required"], "port": "Not a number"}}),
            ),
            "count",
        );
        let err = result.unwrap_err();
        let messages: Vec<_> = err
            .notifications()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(messages, vec!["name: Required", "port: Not a number"]);
    }

    #[test]
    fn other_status_and_garbage() {
        let result: ApiResult<u64> = decode_call_result(&response(500, json!({})), "count");
        assert_eq!(result, Err(ApiError::Status(500)));

        let garbage = Response {
            status: 200,
            headers: HashMap::new(),
            body: b"<html>".to_vec(),
        };
        let result: ApiResult<u64> = decode_call_result(&garbage, "count");
        assert!(matches!(result, Err(ApiError::Decode { what: "count", .. })));
    }

    #[tokio::test]
    async fn filtering_posts_to_model_endpoint() {
        let ctx = TestContext::new().await;
        ctx.mock_filtering(
            "device",
            json!({"draw": 1, "recordsTotal": 1, "recordsFiltered": 1, "data": [{"id": 1, "name": "r1"}]}),
        )
        .await;

        let request = FilteringRequest {
            draw: 1,
            start: 0,
            length: 10,
            order: Vec::new(),
            payload: FilteringPayload {
                entity_type: "device".to_owned(),
                rbac: "read".to_owned(),
                ..FilteringPayload::default()
            },
            export: false,
            clipboard: false,
            pagination: false,
            extra: Map::new(),
        };

        let response = ctx.backend.filtering("device", &request).await.unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.records_total, Some(1));

        let bodies = ctx.received_bodies("/filtering/device").await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["type"], "device");
        assert_eq!(bodies[0]["draw"], 1);
    }

    #[tokio::test]
    async fn filtering_ids_sends_bulk_marker() {
        let ctx = TestContext::new().await;
        ctx.mock_filtering("device", json!([3, 5])).await;

        let ids = ctx
            .backend
            .filtering_ids("device", &FilteringPayload::default())
            .await
            .unwrap();
        assert_eq!(ids, vec![3, 5]);

        let bodies = ctx.received_bodies("/filtering/device").await;
        assert_eq!(bodies[0]["bulk"], "id");
    }

    #[tokio::test]
    async fn bulk_endpoints_return_counts() {
        let ctx = TestContext::new().await;
        ctx.mock_count("/bulk_deletion/device", 4).await;
        ctx.mock_count("/bulk_removal/device/pool/2/devices", 2).await;
        ctx.mock_count("/bulk_edit/device", 3).await;

        let payload = FilteringPayload::default();
        assert_eq!(ctx.backend.bulk_deletion("device", &payload).await, Ok(4));

        let target = RemovalTarget {
            entity_type: "pool".to_owned(),
            id: 2,
            property: "devices".to_owned(),
        };
        assert_eq!(
            ctx.backend.bulk_removal("device", &target, &payload).await,
            Ok(2)
        );

        let form = crate::filtering::bulk_edit_form(&[1], &[]);
        assert_eq!(ctx.backend.bulk_edit("device", &form).await, Ok(3));
    }

    #[tokio::test]
    async fn forbidden_status_maps_to_forbidden() {
        let ctx = TestContext::new().await;
        ctx.mock_status("/bulk_deletion/device", 403).await;

        let result = ctx
            .backend
            .bulk_deletion("device", &FilteringPayload::default())
            .await;
        assert_eq!(result, Err(ApiError::Forbidden));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let backend = HttpBackend::new(&BusinessConfig::new("http://127.0.0.1:9"));
        let result = backend
            .bulk_deletion("device", &FilteringPayload::default())
            .await;
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
