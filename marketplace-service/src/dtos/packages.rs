use crate::models::{ItineraryDay, Package, PackageStatus, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for CreatorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub location: String,
    pub highlights: Vec<String>,
    pub includes: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub images: Vec<String>,
    /// `null` when the creating account no longer exists.
    pub created_by: Option<CreatorSummary>,
    pub status: PackageStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl PackageResponse {
    pub fn new(package: Package, creator: Option<&User>) -> Self {
        Self {
            id: package.id,
            title: package.title,
            description: package.description,
            price: package.price,
            duration: package.duration,
            location: package.location,
            highlights: package.highlights,
            includes: package.includes,
            itinerary: package.itinerary,
            images: package.images,
            created_by: creator.map(CreatorSummary::from),
            status: package.status,
            created_at: package.created_at.to_rfc3339(),
            updated_at: package.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PackageListParams {
    pub status: Option<PackageStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PackageMessageResponse {
    pub message: String,
    pub package: PackageResponse,
}

/// One uploaded image file from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Multipart package form after parsing. Every field is optional here;
/// create and edit apply their own requirements.
#[derive(Debug, Default)]
pub struct PackageForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub duration: Option<String>,
    pub location: Option<String>,
    pub highlights: Option<Vec<String>>,
    pub includes: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    pub images: Vec<ImageUpload>,
}
