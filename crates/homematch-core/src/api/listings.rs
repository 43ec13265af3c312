//! Listing recommendation calls.
//!
//! The backend returns loosely-shaped recommendation rows; this module
//! owns the tolerant wire-to-domain mapping and keeps the latest result
//! set around so detail views can resolve a listing by id without an
//! extra round trip.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::models::{ContractType, Listing, ListingStatus, ListingType, TenantRequestDetail};

use super::gateway::ApiGateway;
use super::transport::ApiRequest;
use super::ApiError;

const RECOMMENDATIONS_PATH: &str = "/tenant/recommendations";

/// Cap on how many recommendations one query asks for
const RECOMMENDATION_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
struct RecommendationItem {
    real_estate_id: Option<i64>,
    id: Option<i64>,
    title: Option<String>,
    address: Option<String>,
    deal_type: Option<String>,
    cost: Option<i64>,
    deposit: Option<i64>,
    area: Option<f64>,
    room_count: Option<u32>,
    bathroom_count: Option<u32>,
    floor: Option<i32>,
    amenities: Option<Vec<String>>,
    images: Option<Vec<String>>,
    description: Option<String>,
    ai_description: Option<String>,
    owner_id: Option<String>,
    first_create_dt: Option<String>,
}

/// Split "서울시 마포구 ..." into region and district.
fn split_address(address: Option<&str>) -> (String, String) {
    let Some(address) = address else {
        return (String::new(), String::new());
    };
    let mut parts = address.split_whitespace();
    let region = parts.next().unwrap_or_default().to_string();
    let district = parts
        .next()
        .map(str::to_string)
        .unwrap_or_else(|| region.clone());
    (region, district)
}

/// Normalize the backend's deal type. Monthly-rent rows fold into
/// `Jeonse` because the price field carries the deposit either way.
fn map_deal_type(deal_type: Option<&str>) -> ContractType {
    match deal_type {
        None => ContractType::Jeonse,
        Some("jeonse") | Some("전세") => ContractType::Jeonse,
        Some("monthly") | Some("월세") => ContractType::Jeonse,
        Some(_) => ContractType::Sale,
    }
}

impl RecommendationItem {
    fn into_listing(self) -> Listing {
        let (region, district) = split_address(self.address.as_deref());
        let contract_type = map_deal_type(self.deal_type.as_deref());
        let price = match contract_type {
            ContractType::Sale => self.cost.unwrap_or(0),
            ContractType::Jeonse => self.deposit.or(self.cost).unwrap_or(0),
        };
        let created_at = self
            .first_create_dt
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let id = self
            .real_estate_id
            .or(self.id)
            .map(|id| id.to_string())
            .unwrap_or_else(|| format!("listing-{}", created_at.timestamp_millis()));

        Listing {
            id,
            title: self.title.unwrap_or_else(|| "Recommended listing".to_string()),
            region,
            district,
            listing_type: ListingType::Apartment,
            contract_type,
            price,
            area: self.area.unwrap_or(0.0),
            rooms: self.room_count.unwrap_or(0),
            bathrooms: self.bathroom_count.unwrap_or(0),
            floor: self.floor.unwrap_or(0),
            options: self.amenities.unwrap_or_default(),
            images: self.images.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            ai_description: self.ai_description,
            owner_id: self.owner_id.unwrap_or_else(|| "unknown".to_string()),
            created_at,
            status: ListingStatus::Active,
        }
    }
}

/// Map a tenant request onto the recommendation query DTO.
fn recommend_payload(request: Option<&TenantRequestDetail>) -> Value {
    let Some(request) = request else {
        return json!({});
    };
    json!({
        "preferred_area": request.preferred_area,
        "area": request.area,
        "room_count": request.room_count,
        "bathroom_count": request.bathroom_count,
        "deal_type": request.deal_type,
        "budget": request.budget,
        "limit": RECOMMENDATION_LIMIT,
    })
}

impl ApiGateway {
    /// Fetch recommendations matching a tenant request (or the default set
    /// when none is given) and cache them for by-id lookups.
    pub async fn recommended_listings(
        &self,
        request: Option<&TenantRequestDetail>,
    ) -> Result<Vec<Listing>, ApiError> {
        let payload = recommend_payload(request);
        let response = self
            .auth_fetch(ApiRequest::post(RECOMMENDATIONS_PATH).json(payload))
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }

        // Anything that isn't a recommendation array reads as no results
        let items: Vec<RecommendationItem> = response.json().unwrap_or_default();
        let listings: Vec<Listing> = items
            .into_iter()
            .map(RecommendationItem::into_listing)
            .collect();
        debug!(count = listings.len(), "recommendations fetched");

        *self.recent_listings.lock().await = listings.clone();
        Ok(listings)
    }

    /// Resolve a listing by id against the cached recommendations,
    /// refilling the cache when the id is unknown.
    pub async fn listing_by_id(&self, id: &str) -> Result<Option<Listing>, ApiError> {
        if let Some(found) = self
            .recent_listings
            .lock()
            .await
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
        {
            return Ok(Some(found));
        }

        let refreshed = self.recommended_listings(None).await?;
        Ok(refreshed.into_iter().find(|listing| listing.id == id))
    }

    /// A landlord's own listings, as present in the recommendation pool.
    pub async fn landlord_listings(&self, owner_id: &str) -> Result<Vec<Listing>, ApiError> {
        let listings = self.recommended_listings(None).await?;
        Ok(listings
            .into_iter()
            .filter(|listing| listing.owner_id == owner_id)
            .collect())
    }
}
