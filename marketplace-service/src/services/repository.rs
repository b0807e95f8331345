use crate::models::{
    AccountStatus, Booking, BookingStatus, Package, PackageStatus, Role, User,
};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

use super::database::MongoDb;
use super::memory::InMemoryStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with "Email already registered" when the email is taken.
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError>;
    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn set_status(&self, id: &str, status: AccountStatus)
        -> Result<Option<User>, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
    async fn count(&self, role: Option<Role>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn insert(&self, package: &Package) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError>;
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Package>, AppError>;
    /// Newest first, optionally restricted to one status.
    async fn list(&self, status: Option<PackageStatus>) -> Result<Vec<Package>, AppError>;
    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Package>, AppError>;
    /// Replace the stored document. Returns false when it no longer exists.
    async fn update(&self, package: &Package) -> Result<bool, AppError>;
    async fn set_status(
        &self,
        id: &str,
        status: PackageStatus,
    ) -> Result<Option<Package>, AppError>;
    /// Remove and return the deleted package.
    async fn delete(&self, id: &str) -> Result<Option<Package>, AppError>;
    async fn count(&self, status: Option<PackageStatus>) -> Result<u64, AppError>;
}

/// Equality filters for booking lists; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub seller_id: Option<String>,
    pub tourist_id: Option<String>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.seller_id.as_deref().map_or(true, |id| booking.seller_id == id)
            && self.tourist_id.as_deref().map_or(true, |id| booking.tourist_id == id)
            && self.status.map_or(true, |s| booking.status == s)
    }
}

/// Booking count and summed `totalPrice` for one package, across all statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageTally {
    pub package_id: String,
    pub bookings: u64,
    pub revenue: f64,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    /// Newest `bookingDate` first.
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    /// Atomically move a pending booking to `target`. Returns `None` when the
    /// booking is missing or no longer pending.
    async fn transition_from_pending(
        &self,
        id: &str,
        target: BookingStatus,
    ) -> Result<Option<Booking>, AppError>;
    async fn count(&self) -> Result<u64, AppError>;
    /// Sum of `totalPrice` over approved bookings.
    async fn approved_revenue(&self) -> Result<f64, AppError>;
    async fn package_tallies(&self) -> Result<Vec<PackageTally>, AppError>;
}

#[derive(Clone)]
pub enum StoreHandle {
    Mongo(MongoDb),
    Memory,
}

impl StoreHandle {
    pub async fn health_check(&self) -> Result<(), AppError> {
        match self {
            StoreHandle::Mongo(db) => db.health_check().await,
            StoreHandle::Memory => Ok(()),
        }
    }
}

/// The three stores behind trait objects, shared by every service.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub handle: StoreHandle,
}

impl Repositories {
    pub fn mongo(db: MongoDb) -> Self {
        let shared = Arc::new(db.clone());
        Self {
            users: shared.clone(),
            packages: shared.clone(),
            bookings: shared,
            handle: StoreHandle::Mongo(db),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        let shared = Arc::new(store);
        Self {
            users: shared.clone(),
            packages: shared.clone(),
            bookings: shared,
            handle: StoreHandle::Memory,
        }
    }
}
