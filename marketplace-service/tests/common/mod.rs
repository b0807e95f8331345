//! Shared harness for marketplace-service integration tests.
//!
//! Each `TestApp` runs the real router on a random port over the in-memory
//! store, a recording email provider and a temporary uploads directory.

#![allow(dead_code)]

use marketplace_service::config::{
    AdminConfig, JwtConfig, MarketplaceConfig, MongoConfig, RecaptchaConfig, SecurityConfig,
    SmtpConfig, StoreBackend, StoreConfig, UploadsConfig,
};
use marketplace_service::services::{InMemoryStore, MockEmailProvider, Repositories, StaticCaptchaVerifier};
use marketplace_service::startup::{Application, Dependencies};
use reqwest::multipart::{Form, Part};
use secrecy::Secret;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_CAPTCHA: &str = "test-captcha-token";
pub const ADMIN_EMAIL: &str = "admin@touristhelper.test";
pub const ADMIN_PASSWORD: &str = "admin-secret-password";
pub const PASSWORD: &str = "secret123";

/// Tiny PNG header; the server only checks the declared content type.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub email: Arc<MockEmailProvider>,
    pub uploads: TempDir,
}

/// Account created through the signup endpoint.
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

fn test_config(uploads_dir: &str) -> MarketplaceConfig {
    let mut common = service_core::config::Config::default();
    common.port = 0;

    MarketplaceConfig {
        common,
        store: StoreConfig {
            backend: StoreBackend::Memory,
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "tourist_helper_test".to_string(),
        },
        jwt: JwtConfig {
            secret: Secret::new("integration-test-jwt-secret".to_string()),
            expiry_days: 7,
        },
        admin: AdminConfig {
            email: ADMIN_EMAIL.to_string(),
            password: Secret::new(ADMIN_PASSWORD.to_string()),
        },
        recaptcha: RecaptchaConfig {
            secret_key: Secret::new(String::new()),
            verify_url: "http://127.0.0.1:9/siteverify".to_string(),
            enabled: false,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            user: String::new(),
            password: Secret::new(String::new()),
            from_email: "noreply@touristhelper.test".to_string(),
            from_name: "Tourist Helper".to_string(),
            enabled: false,
        },
        uploads: UploadsConfig {
            dir: uploads_dir.to_string(),
            max_images: 10,
            max_body_bytes: 10 * 1024 * 1024,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            auth_rate_limit_attempts: 1000,
            auth_rate_limit_window_seconds: 60,
        },
        otlp_endpoint: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let uploads = tempfile::tempdir().expect("Failed to create uploads dir");
        let uploads_dir = uploads.path().to_str().expect("utf-8 temp path").to_string();
        let email = Arc::new(MockEmailProvider::new());

        let app = Application::build_with(
            test_config(&uploads_dir),
            Dependencies {
                repositories: Repositories::in_memory(InMemoryStore::new()),
                email: email.clone(),
                captcha: Arc::new(StaticCaptchaVerifier::expecting(TEST_CAPTCHA)),
            },
        )
        .await
        .expect("Failed to build application");

        let address = format!("http://127.0.0.1:{}", app.port());
        tokio::spawn(app.run_until_stopped());

        Self {
            address,
            client: reqwest::Client::new(),
            email,
            uploads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn upload_path(&self, public_url: &str) -> PathBuf {
        self.uploads
            .path()
            .join(public_url.trim_start_matches("/uploads/"))
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: &Value) -> reqwest::Response {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to send request")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("Failed to send request")
    }

    pub async fn put(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn patch(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn signup(&self, name: &str, email: &str, role: &str) -> TestUser {
        let res = self
            .post_json(
                "/api/users/signup",
                None,
                &json!({
                    "name": name,
                    "email": email,
                    "phone": "+91 98765 43210",
                    "password": PASSWORD,
                    "role": role,
                    "agencyName": format!("{} Travels", name),
                    "captchaToken": TEST_CAPTCHA,
                }),
            )
            .await;
        assert_eq!(res.status(), 201, "signup of {} failed", email);

        let body: Value = res.json().await.expect("signup body");
        TestUser {
            id: body["user"]["_id"].as_str().expect("user id").to_string(),
            email: email.to_string(),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    pub async fn admin_token(&self) -> String {
        let res = self
            .post_json(
                "/api/users/login",
                None,
                &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("login body");
        body["token"].as_str().expect("admin token").to_string()
    }

    pub fn package_form(title: &str, price: &str) -> Form {
        Form::new()
            .text("title", title.to_string())
            .text("description", "Backwaters, spice gardens and beaches")
            .text("price", price.to_string())
            .text("duration", "5 days / 4 nights")
            .text("location", "Kerala")
            .text("highlights", r#"["Houseboat stay","Tea estates"]"#)
            .text("includes", "Breakfast")
            .text("includes", "Airport transfer")
            .text(
                "itinerary",
                r#"[{"day":1,"title":"Arrive in Kochi","activities":"Fort Kochi walk","meals":"Dinner","accommodation":"Heritage hotel"}]"#,
            )
    }

    pub fn image_part(name: &str) -> Part {
        Part::bytes(PNG_BYTES.to_vec())
            .file_name(name.to_string())
            .mime_str("image/png")
            .expect("valid mime")
    }

    pub async fn post_form(&self, path: &str, token: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Create a package with one image and return its JSON.
    pub async fn create_package(&self, token: &str, title: &str, price: &str) -> Value {
        let form = Self::package_form(title, price).part("images", Self::image_part("cover.png"));
        let res = self.post_form("/api/packages", token, form).await;
        assert_eq!(res.status(), 201, "package creation failed");
        let body: Value = res.json().await.expect("package body");
        body["package"].clone()
    }

    /// Create a package as `token` and approve it as admin.
    pub async fn approved_package(&self, token: &str, title: &str, price: &str) -> Value {
        let package = self.create_package(token, title, price).await;
        let admin = self.admin_token().await;
        let id = package["_id"].as_str().expect("package id");
        let res = self
            .put(&format!("/api/admin/approve-package/{}", id), &admin)
            .await;
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("approve body");
        body["package"].clone()
    }

    pub async fn book(
        &self,
        tourist: &TestUser,
        package_id: &str,
        seller_id: &str,
        guests: i64,
        total_price: f64,
    ) -> reqwest::Response {
        self.post_json(
            "/api/bookings",
            Some(&tourist.token),
            &json!({
                "packageId": package_id,
                "touristId": tourist.id,
                "sellerId": seller_id,
                "travelDate": "2026-12-20",
                "guests": guests,
                "totalPrice": total_price,
            }),
        )
        .await
    }
}
