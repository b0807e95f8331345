use crate::models::{AccountStatus, ProfileAttributes, Role, User};
use crate::utils::parse::lenient_f64;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[serde(default)]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    #[serde(default)]
    pub phone: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
    pub agency_name: Option<String>,
    pub license: Option<String>,
    pub location: Option<String>,
    pub languages: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub experience: Option<f64>,
    pub captcha_token: Option<String>,
}

impl SignupRequest {
    pub fn profile_attributes(&self) -> ProfileAttributes {
        ProfileAttributes {
            agency_name: self.agency_name.clone(),
            license: self.license.clone(),
            location: self.location.clone(),
            languages: self.languages.clone(),
            experience: self.experience,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[serde(default)]
    pub password: String,
    pub captcha_token: Option<String>,
}

/// Account as returned to clients; never carries the password hash.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    pub approved: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            status: user.status,
            agency_name: user.agency_name,
            license: user.license,
            location: user.location,
            languages: user.languages,
            experience: user.experience,
            approved: user.approved,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// The configured administrator has no account record.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub email: String,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionUser {
    Account(UserResponse),
    Admin(AdminIdentity),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: SessionUser,
    pub token: String,
}

/// Row of the admin account list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserMessageResponse {
    pub message: String,
    pub user: UserResponse,
}
