use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a listing is offered: lump-sum deposit lease or outright sale.
/// Monthly-rent rows are normalized onto `Jeonse` with the deposit as the
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Jeonse,
    Sale,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Jeonse => "jeonse",
            ContractType::Sale => "sale",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Residence category; doubles as the residence type on tenant requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Apartment,
    Officetel,
    Villa,
    House,
    Commercial,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Apartment => "apartment",
            ListingType::Officetel => "officetel",
            ListingType::Villa => "villa",
            ListingType::House => "house",
            ListingType::Commercial => "commercial",
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// e.g. "서울시"
    pub region: String,
    /// e.g. "마포구"
    pub district: String,
    pub listing_type: ListingType,
    pub contract_type: ContractType,
    /// Deposit for jeonse, sale price for sale
    pub price: i64,
    /// Floor area in square meters
    pub area: f64,
    pub rooms: u32,
    pub bathrooms: u32,
    pub floor: i32,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub description: String,
    pub ai_description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub status: ListingStatus,
}
