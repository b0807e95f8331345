use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Tourist,
    Seller,
    Guide,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tourist => "tourist",
            Role::Seller => "seller",
            Role::Guide => "guide",
            Role::Admin => "admin",
        }
    }

    /// Only seller and guide accounts own packages; the admin has no account
    /// record to own one.
    pub fn can_list_packages(&self) -> bool {
        matches!(self, Role::Seller | Role::Guide)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tourist" => Ok(Role::Tourist),
            "seller" => Ok(Role::Seller),
            "guide" => Ok(Role::Guide),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
        }
    }
}

/// Optional profile fields supplied at signup. Only the ones that apply to the
/// account's role are kept.
#[derive(Debug, Clone, Default)]
pub struct ProfileAttributes {
    pub agency_name: Option<String>,
    pub license: Option<String>,
    pub location: Option<String>,
    pub languages: Option<String>,
    pub experience: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(default)]
    pub approved: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: String,
        email: String,
        phone: String,
        password_hash: String,
        role: Role,
        attrs: ProfileAttributes,
    ) -> Self {
        let now = Utc::now();
        let is_seller = role == Role::Seller;
        let is_guide = role == Role::Guide;

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            password_hash,
            role,
            status: AccountStatus::Active,
            agency_name: attrs.agency_name.filter(|_| is_seller),
            license: attrs.license.filter(|_| is_seller),
            location: attrs.location.filter(|_| is_seller || is_guide),
            languages: attrs.languages.filter(|_| is_guide),
            experience: attrs.experience.filter(|_| is_guide),
            approved: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == AccountStatus::Blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs() -> ProfileAttributes {
        ProfileAttributes {
            agency_name: Some("Kerala Trails".to_string()),
            license: Some("LIC-42".to_string()),
            location: Some("Kochi".to_string()),
            languages: Some("English, Malayalam".to_string()),
            experience: Some(6.0),
        }
    }

    fn user(role: Role) -> User {
        User::new(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            "9999999999".to_string(),
            "hash".to_string(),
            role,
            attrs(),
        )
    }

    #[test]
    fn seller_keeps_agency_fields_only() {
        let seller = user(Role::Seller);
        assert_eq!(seller.agency_name.as_deref(), Some("Kerala Trails"));
        assert_eq!(seller.license.as_deref(), Some("LIC-42"));
        assert_eq!(seller.location.as_deref(), Some("Kochi"));
        assert!(seller.languages.is_none());
        assert!(seller.experience.is_none());
    }

    #[test]
    fn guide_keeps_language_fields_only() {
        let guide = user(Role::Guide);
        assert!(guide.agency_name.is_none());
        assert!(guide.license.is_none());
        assert_eq!(guide.location.as_deref(), Some("Kochi"));
        assert_eq!(guide.experience, Some(6.0));
    }

    #[test]
    fn tourist_drops_all_role_fields() {
        let tourist = user(Role::Tourist);
        assert!(tourist.agency_name.is_none());
        assert!(tourist.location.is_none());
        assert!(tourist.languages.is_none());
        assert_eq!(tourist.status, AccountStatus::Active);
        assert!(!tourist.approved);
    }

    #[test]
    fn serializes_with_camel_case_and_id() {
        let doc = mongodb::bson::to_document(&user(Role::Seller)).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("passwordHash"));
        assert!(doc.contains_key("agencyName"));
        assert_eq!(doc.get_str("role").unwrap(), "seller");
        assert_eq!(doc.get_str("status").unwrap(), "active");
    }

    #[test]
    fn only_publishers_can_list_packages() {
        assert!(!Role::Tourist.can_list_packages());
        assert!(Role::Seller.can_list_packages());
        assert!(Role::Guide.can_list_packages());
        assert!(!Role::Admin.can_list_packages());
    }
}
