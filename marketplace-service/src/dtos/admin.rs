use serde::{Deserialize, Serialize};

use super::users::UserSummary;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub tourists: u64,
    pub sellers: u64,
    pub guides: u64,
    pub active_packages: u64,
    pub pending_packages: u64,
    pub total_bookings: u64,
    /// Sum of `totalPrice` over approved bookings.
    pub total_revenue: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPackage {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub seller_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingApprovalsResponse {
    pub packages: Vec<PendingPackage>,
    /// Account approval is not gated yet, so these stay empty.
    pub sellers: Vec<UserSummary>,
    pub guides: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopPackage {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub seller_name: Option<String>,
    pub bookings: u64,
    pub revenue: f64,
    /// No reviews are collected; always `null`.
    pub rating: Option<f64>,
}
