//! Tenant request (wish-list) CRUD.
//!
//! The backend's row shape drifted over time (`tenant_request_id` vs
//! `id`, a `prefered_area` misspelling, `min_area`); the wire DTO accepts
//! all of them so older rows keep deserializing.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{
    DealType, ListingType, TenantRequestDetail, TenantRequestPatch, TenantRequestPayload,
    TenantRequestSummary,
};

use super::gateway::ApiGateway;
use super::transport::{ApiRequest, ApiResponse};
use super::ApiError;

const TENANT_REQUEST_PATH: &str = "/tenant/request";

#[derive(Debug, Deserialize)]
struct TenantRequestIdResponse {
    tenant_request_id: i64,
}

#[derive(Debug, Deserialize)]
struct TenantRequestWire {
    #[serde(alias = "tenant_request_id")]
    id: i64,
    tenant_id: Option<String>,
    #[serde(alias = "prefered_area")]
    preferred_area: String,
    residence_type: ListingType,
    deal_type: DealType,
    budget: i64,
    #[serde(alias = "min_area", default)]
    area: f64,
    #[serde(default)]
    room_count: u32,
    #[serde(default)]
    bathroom_count: u32,
}

impl TenantRequestWire {
    fn into_summary(self) -> TenantRequestSummary {
        TenantRequestSummary {
            id: self.id,
            preferred_area: self.preferred_area,
            residence_type: self.residence_type,
            deal_type: self.deal_type,
            budget: self.budget,
        }
    }

    fn into_detail(self) -> TenantRequestDetail {
        TenantRequestDetail {
            id: self.id,
            tenant_id: self.tenant_id,
            preferred_area: self.preferred_area,
            residence_type: self.residence_type,
            deal_type: self.deal_type,
            budget: self.budget,
            area: self.area,
            room_count: self.room_count,
            bathroom_count: self.bathroom_count,
        }
    }
}

fn create_payload(payload: &TenantRequestPayload) -> Value {
    json!({
        "preferred_area": payload.preferred_area,
        "residence_type": payload.residence_type,
        "deal_type": payload.deal_type,
        "budget": payload.budget,
        "area": payload.area,
        "room_count": payload.room_count,
        "bathroom_count": payload.bathroom_count,
    })
}

/// Only the fields present on the patch go over the wire.
fn patch_payload(patch: &TenantRequestPatch) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(ref value) = patch.preferred_area {
        map.insert("preferred_area".to_string(), json!(value));
    }
    if let Some(value) = patch.residence_type {
        map.insert("residence_type".to_string(), json!(value));
    }
    if let Some(value) = patch.deal_type {
        map.insert("deal_type".to_string(), json!(value));
    }
    if let Some(value) = patch.budget {
        map.insert("budget".to_string(), json!(value));
    }
    if let Some(value) = patch.area {
        map.insert("area".to_string(), json!(value));
    }
    if let Some(value) = patch.room_count {
        map.insert("room_count".to_string(), json!(value));
    }
    if let Some(value) = patch.bathroom_count {
        map.insert("bathroom_count".to_string(), json!(value));
    }
    Value::Object(map)
}

/// Prefer the backend's `detail` message when one is present.
fn error_detail(response: &ApiResponse) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<String>,
    }

    response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| response.text())
}

impl ApiGateway {
    pub async fn tenant_requests(&self) -> Result<Vec<TenantRequestSummary>, ApiError> {
        let response = self.auth_fetch(ApiRequest::get(TENANT_REQUEST_PATH)).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }
        let rows: Vec<TenantRequestWire> = response.json().unwrap_or_default();
        Ok(rows.into_iter().map(TenantRequestWire::into_summary).collect())
    }

    pub async fn tenant_request(&self, id: i64) -> Result<Option<TenantRequestDetail>, ApiError> {
        let response = self
            .auth_fetch(ApiRequest::get(format!("{TENANT_REQUEST_PATH}/{id}")))
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }
        Ok(Some(response.json::<TenantRequestWire>()?.into_detail()))
    }

    /// Create a request; resolves to the new request id.
    pub async fn create_tenant_request(
        &self,
        payload: &TenantRequestPayload,
    ) -> Result<i64, ApiError> {
        let response = self
            .auth_fetch(ApiRequest::post(TENANT_REQUEST_PATH).json(create_payload(payload)))
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &error_detail(&response),
            ));
        }
        Ok(response.json::<TenantRequestIdResponse>()?.tenant_request_id)
    }

    pub async fn update_tenant_request(
        &self,
        id: i64,
        patch: &TenantRequestPatch,
    ) -> Result<i64, ApiError> {
        let response = self
            .auth_fetch(
                ApiRequest::put(format!("{TENANT_REQUEST_PATH}/{id}")).json(patch_payload(patch)),
            )
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &error_detail(&response),
            ));
        }
        Ok(response.json::<TenantRequestIdResponse>()?.tenant_request_id)
    }

    /// Delete a request; `false` when the backend no longer knows the id.
    pub async fn delete_tenant_request(&self, id: i64) -> Result<bool, ApiError> {
        let response = self
            .auth_fetch(ApiRequest::delete(format!("{TENANT_REQUEST_PATH}/{id}")))
            .await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                &error_detail(&response),
            ));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::auth::{RoleStore, SessionStore};
    use crate::testutil::ScriptedTransport;

    use super::*;

    fn fixture() -> (Arc<ScriptedTransport>, ApiGateway, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let store = Arc::new(SessionStore::new(
            transport.clone(),
            RoleStore::new(dir.path().to_path_buf()),
        ));
        (transport.clone(), ApiGateway::new(store, transport), dir)
    }

    #[tokio::test]
    async fn detail_tolerates_legacy_field_names() {
        let (transport, gateway, _dir) = fixture();
        transport.push_response(
            200,
            r#"{
                "tenant_request_id": 7,
                "tenant_id": "tenant-3",
                "prefered_area": "마포구",
                "residence_type": "apartment",
                "deal_type": "monthly",
                "budget": 5000,
                "min_area": 33.0,
                "room_count": 2,
                "bathroom_count": 1
            }"#,
        );

        let detail = gateway.tenant_request(7).await.unwrap().unwrap();

        assert_eq!(detail.id, 7);
        assert_eq!(detail.preferred_area, "마포구");
        assert_eq!(detail.deal_type, DealType::Monthly);
        assert_eq!(detail.area, 33.0);
    }

    #[tokio::test]
    async fn missing_request_reads_as_none() {
        let (transport, gateway, _dir) = fixture();
        transport.push_response(404, "");
        assert!(gateway.tenant_request(999).await.unwrap().is_none());

        transport.push_response(404, "");
        assert!(!gateway.delete_tenant_request(999).await.unwrap());
    }

    #[tokio::test]
    async fn create_returns_the_new_id() {
        let (transport, gateway, _dir) = fixture();
        transport.push_response(200, r#"{"tenant_request_id":11}"#);

        let payload = TenantRequestPayload {
            preferred_area: "마포구".to_string(),
            residence_type: ListingType::Officetel,
            deal_type: DealType::Jeonse,
            budget: 30000,
            area: 25.0,
            room_count: 1,
            bathroom_count: 1,
        };
        let id = gateway.create_tenant_request(&payload).await.unwrap();

        assert_eq!(id, 11);
    }

    #[tokio::test]
    async fn rejected_create_surfaces_the_backend_detail() {
        let (transport, gateway, _dir) = fixture();
        transport.push_response(400, r#"{"detail":"budget is required"}"#);

        let payload = TenantRequestPayload {
            preferred_area: String::new(),
            residence_type: ListingType::Apartment,
            deal_type: DealType::Sale,
            budget: 0,
            area: 0.0,
            room_count: 0,
            bathroom_count: 0,
        };
        let err = gateway.create_tenant_request(&payload).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::InvalidResponse(ref message) if message.contains("budget is required")
        ));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = TenantRequestPatch {
            budget: Some(40000),
            room_count: Some(3),
            ..Default::default()
        };

        let payload = patch_payload(&patch);

        assert_eq!(payload, json!({"budget": 40000, "room_count": 3}));
    }
}
