use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Arc;

use super::captcha::CaptchaVerifier;
use super::jwt::{JwtService, ADMIN_SUBJECT};
use super::repository::UserRepository;
use crate::config::AdminConfig;
use crate::dtos::users::{
    AdminIdentity, AuthResponse, LoginRequest, SessionUser, SignupRequest, UserResponse,
};
use crate::models::{Role, User};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt: JwtService,
    captcha: Arc<dyn CaptchaVerifier>,
    admin: AdminConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt: JwtService,
        captcha: Arc<dyn CaptchaVerifier>,
        admin: AdminConfig,
    ) -> Self {
        Self {
            users,
            jwt,
            captcha,
            admin,
        }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse, AppError> {
        if !self.captcha.verify(req.captcha_token.as_deref()).await {
            return Err(AppError::bad_request("CAPTCHA verification failed"));
        }

        let role = req.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(AppError::bad_request("Invalid role"));
        }

        let email = normalize_email(&req.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::bad_request("Email already registered"));
        }

        let password_hash = hash_password(&Password::new(req.password.clone()))?;
        let user = User::new(
            req.name.trim().to_string(),
            email,
            req.phone.trim().to_string(),
            password_hash.into_string(),
            role,
            req.profile_attributes(),
        );

        // The unique index (or the in-memory check) settles concurrent signups.
        self.users.insert(&user).await?;

        let token = self.jwt.generate_token(&user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

        Ok(AuthResponse {
            message: "User registered successfully".to_string(),
            user: SessionUser::Account(UserResponse::from(user)),
            token,
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&req.email);

        if self.is_admin_login(&email, &req.password) {
            let token = self.jwt.generate_token(ADMIN_SUBJECT, Role::Admin)?;
            metrics::counter!("logins_total", "outcome" => "admin").increment(1);
            tracing::info!("Admin login");
            return Ok(AuthResponse {
                message: "Admin login successful".to_string(),
                user: SessionUser::Admin(AdminIdentity {
                    email: self.admin.email.clone(),
                    role: Role::Admin,
                    name: "System Admin".to_string(),
                }),
                token,
            });
        }

        if !self.captcha.verify(req.captcha_token.as_deref()).await {
            return Err(AppError::bad_request("CAPTCHA verification failed"));
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            metrics::counter!("logins_total", "outcome" => "failed").increment(1);
            return Err(AppError::bad_request(INVALID_CREDENTIALS));
        };

        if user.is_blocked() {
            metrics::counter!("logins_total", "outcome" => "blocked").increment(1);
            tracing::warn!(user_id = %user.id, "Blocked account attempted login");
            return Err(AppError::forbidden("Your account has been blocked. Contact admin."));
        }

        let stored = PasswordHashString::new(user.password_hash.clone());
        if verify_password(&Password::new(req.password), &stored).is_err() {
            metrics::counter!("logins_total", "outcome" => "failed").increment(1);
            return Err(AppError::bad_request(INVALID_CREDENTIALS));
        }

        let token = self.jwt.generate_token(&user.id, user.role)?;
        metrics::counter!("logins_total", "outcome" => "success").increment(1);
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthResponse {
            message: "Login successful".to_string(),
            user: SessionUser::Account(UserResponse::from(user)),
            token,
        })
    }

    fn is_admin_login(&self, email: &str, password: &str) -> bool {
        let admin_password = self.admin.password.expose_secret();
        !admin_password.is_empty()
            && email == normalize_email(&self.admin.email)
            && password == admin_password.as_str()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
