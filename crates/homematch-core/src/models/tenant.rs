use std::fmt;

use serde::{Deserialize, Serialize};

use super::ListingType;

/// Deal type a tenant is looking for. Unlike `ContractType` on listings,
/// monthly rent is kept distinct here because the tenant request form asks
/// for it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealType {
    Jeonse,
    Monthly,
    Sale,
}

impl DealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealType::Jeonse => "jeonse",
            DealType::Monthly => "monthly",
            DealType::Sale => "sale",
        }
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape for the tenant request list view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRequestSummary {
    pub id: i64,
    pub preferred_area: String,
    pub residence_type: ListingType,
    pub deal_type: DealType,
    pub budget: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRequestDetail {
    pub id: i64,
    pub tenant_id: Option<String>,
    pub preferred_area: String,
    pub residence_type: ListingType,
    pub deal_type: DealType,
    pub budget: i64,
    /// Minimum floor area in square meters
    pub area: f64,
    pub room_count: u32,
    pub bathroom_count: u32,
}

/// Fields the tenant fills in when creating a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRequestPayload {
    pub preferred_area: String,
    pub residence_type: ListingType,
    pub deal_type: DealType,
    pub budget: i64,
    pub area: f64,
    pub room_count: u32,
    pub bathroom_count: u32,
}

/// Partial update; unset fields are left untouched server-side.
#[derive(Debug, Clone, Default)]
pub struct TenantRequestPatch {
    pub preferred_area: Option<String>,
    pub residence_type: Option<ListingType>,
    pub deal_type: Option<DealType>,
    pub budget: Option<i64>,
    pub area: Option<f64>,
    pub room_count: Option<u32>,
    pub bathroom_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_lowercase_wire_values() {
        assert_eq!(serde_json::to_string(&DealType::Jeonse).unwrap(), "\"jeonse\"");
        assert_eq!(
            serde_json::to_string(&ListingType::Officetel).unwrap(),
            "\"officetel\""
        );
        let parsed: DealType = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(parsed, DealType::Monthly);
    }
}
