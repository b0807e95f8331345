use crate::models::{Booking, BookingStatus, Package, User};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub package_id: Option<String>,
    pub tourist_id: Option<String>,
    pub seller_id: Option<String>,
    pub travel_date: Option<String>,
    #[validate(range(min = 1, message = "Guests must be at least 1"))]
    pub guests: Option<i32>,
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub price: f64,
    pub images: Vec<String>,
    pub duration: String,
}

impl From<&Package> for PackageSummary {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.clone(),
            title: package.title.clone(),
            price: package.price,
            images: package.images.clone(),
            duration: package.duration.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouristSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for TouristSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub agency_name: Option<String>,
}

impl From<&User> for SellerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            agency_name: user.agency_name.clone(),
        }
    }
}

/// Booking with its package and both parties resolved. Dangling references
/// are `null`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub package: Option<PackageSummary>,
    pub tourist: Option<TouristSummary>,
    pub seller: Option<SellerSummary>,
    pub status: BookingStatus,
    pub travel_date: String,
    pub guests: i32,
    pub total_price: f64,
    pub booking_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl BookingResponse {
    pub fn new(
        booking: Booking,
        package: Option<&Package>,
        tourist: Option<&User>,
        seller: Option<&User>,
    ) -> Self {
        Self {
            id: booking.id,
            package: package.map(PackageSummary::from),
            tourist: tourist.map(TouristSummary::from),
            seller: seller.map(SellerSummary::from),
            status: booking.status,
            travel_date: booking.travel_date.to_rfc3339(),
            guests: booking.guests,
            total_price: booking.total_price,
            booking_date: booking.booking_date.to_rfc3339(),
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingMessageResponse {
    pub message: String,
    pub booking: BookingResponse,
}
