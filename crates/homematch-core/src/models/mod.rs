//! Domain types shared across the client.

pub mod listing;
pub mod tenant;

pub use listing::{ContractType, Listing, ListingStatus, ListingType};
pub use tenant::{
    DealType, TenantRequestDetail, TenantRequestPatch, TenantRequestPayload, TenantRequestSummary,
};
