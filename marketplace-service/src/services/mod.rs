pub mod admin;
pub mod auth;
pub mod bookings;
pub mod captcha;
pub mod database;
pub mod email;
pub mod jwt;
pub mod memory;
pub mod metrics;
pub mod notifications;
pub mod packages;
pub mod repository;
pub mod storage;

pub use admin::AdminService;
pub use auth::AuthService;
pub use bookings::BookingService;
pub use captcha::{CaptchaVerifier, RecaptchaVerifier, StaticCaptchaVerifier};
pub use database::MongoDb;
pub use email::{EmailProvider, MockEmailProvider, SmtpProvider};
pub use jwt::JwtService;
pub use memory::InMemoryStore;
pub use notifications::BookingNotifier;
pub use packages::PackageService;
pub use repository::Repositories;
pub use storage::{LocalStorage, Storage};
