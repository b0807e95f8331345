use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::AppState;

/// Caller identity taken from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True for the account itself or any admin.
    pub fn is_self_or_admin(&self, account_id: &str) -> bool {
        self.is_admin() || self.id == account_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
            })?;

        let claims = state.jwt.validate_token(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::InvalidToken(e)
        })?;

        let user = AuthUser {
            id: claims.sub,
            role: claims.role,
        };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Layer for `/api/admin`: any verified token without the admin role is 403.
pub async fn require_admin(user: AuthUser, req: Request, next: Next) -> Result<Response, AppError> {
    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, role = user.role.as_str(), "Non-admin on admin route");
        return Err(AppError::forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_every_ownership_check() {
        let admin = AuthUser {
            id: "admin".to_string(),
            role: Role::Admin,
        };
        let tourist = AuthUser {
            id: "t1".to_string(),
            role: Role::Tourist,
        };

        assert!(admin.is_self_or_admin("t1"));
        assert!(tourist.is_self_or_admin("t1"));
        assert!(!tourist.is_self_or_admin("t2"));
    }
}
