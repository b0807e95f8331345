use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Pending => "pending",
            PackageStatus::Approved => "approved",
            PackageStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PackageStatus::Pending),
            "approved" => Ok(PackageStatus::Approved),
            "rejected" => Ok(PackageStatus::Rejected),
            other => Err(format!("Unknown package status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    #[serde(default)]
    pub day: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub activities: String,
    #[serde(default)]
    pub meals: String,
    #[serde(default)]
    pub accommodation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub location: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    /// Public URL paths, `/uploads/packages/<file>`.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_by: String,
    pub status: PackageStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Listing content as submitted by a seller or guide.
#[derive(Debug, Clone, Default)]
pub struct PackageDetails {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration: String,
    pub location: String,
    pub highlights: Vec<String>,
    pub includes: Vec<String>,
    pub itinerary: Vec<ItineraryDay>,
}

impl Package {
    pub fn new(details: PackageDetails, created_by: String, images: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: details.title,
            description: details.description,
            price: details.price,
            duration: details.duration,
            location: details.location,
            highlights: details.highlights,
            includes: details.includes,
            itinerary: details.itinerary,
            images,
            created_by,
            status: PackageStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status == PackageStatus::Approved
    }
}
