use crate::models::{AccountStatus, Booking, BookingStatus, Package, PackageStatus, Role, User};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::repository::{
    BookingFilter, BookingRepository, PackageRepository, PackageTally, UserRepository,
};

/// Process-local store with the same semantics as the Mongo backend.
/// Clones share the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<String, User>>>,
    packages: Arc<RwLock<HashMap<String, Package>>>,
    bookings: Arc<RwLock<HashMap<String, Booking>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<G>(_: PoisonError<G>) -> AppError {
    AppError::InternalError(anyhow::anyhow!("in-memory store lock poisoned"))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::bad_request("Email already registered"));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().map_err(poisoned)?.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_status(
        &self,
        id: &str,
        status: AccountStatus,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().map_err(poisoned)?;
        Ok(users.get_mut(id).map(|user| {
            user.status = status;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.users.write().map_err(poisoned)?.remove(id).is_some())
    }

    async fn count(&self, role: Option<Role>) -> Result<u64, AppError> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .count() as u64)
    }
}

#[async_trait]
impl PackageRepository for InMemoryStore {
    async fn insert(&self, package: &Package) -> Result<(), AppError> {
        self.packages
            .write()
            .map_err(poisoned)?
            .insert(package.id.clone(), package.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self.packages.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Package>, AppError> {
        let packages = self.packages.read().map_err(poisoned)?;
        Ok(ids.iter().filter_map(|id| packages.get(id).cloned()).collect())
    }

    async fn list(&self, status: Option<PackageStatus>) -> Result<Vec<Package>, AppError> {
        let packages = self.packages.read().map_err(poisoned)?;
        let mut found: Vec<Package> = packages
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Package>, AppError> {
        let packages = self.packages.read().map_err(poisoned)?;
        let mut found: Vec<Package> = packages
            .values()
            .filter(|p| p.created_by == creator_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update(&self, package: &Package) -> Result<bool, AppError> {
        let mut packages = self.packages.write().map_err(poisoned)?;
        match packages.get_mut(&package.id) {
            Some(existing) => {
                *existing = package.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(
        &self,
        id: &str,
        status: PackageStatus,
    ) -> Result<Option<Package>, AppError> {
        let mut packages = self.packages.write().map_err(poisoned)?;
        Ok(packages.get_mut(id).map(|package| {
            package.status = status;
            package.updated_at = Utc::now();
            package.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self.packages.write().map_err(poisoned)?.remove(id))
    }

    async fn count(&self, status: Option<PackageStatus>) -> Result<u64, AppError> {
        let packages = self.packages.read().map_err(poisoned)?;
        Ok(packages
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .count() as u64)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert(&self, booking: &Booking) -> Result<(), AppError> {
        self.bookings
            .write()
            .map_err(poisoned)?
            .insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.read().map_err(poisoned)?.get(id).cloned())
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        let mut found: Vec<Booking> = bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        Ok(found)
    }

    async fn transition_from_pending(
        &self,
        id: &str,
        target: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        Ok(bookings
            .get_mut(id)
            .filter(|b| b.status == BookingStatus::Pending)
            .map(|booking| {
                booking.status = target;
                booking.updated_at = Utc::now();
                booking.clone()
            }))
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.bookings.read().map_err(poisoned)?.len() as u64)
    }

    async fn approved_revenue(&self) -> Result<f64, AppError> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        Ok(bookings
            .values()
            .filter(|b| b.status == BookingStatus::Approved)
            .map(|b| b.total_price)
            .sum())
    }

    async fn package_tallies(&self) -> Result<Vec<PackageTally>, AppError> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        let mut tallies: HashMap<&str, PackageTally> = HashMap::new();
        for booking in bookings.values() {
            let tally = tallies
                .entry(booking.package_id.as_str())
                .or_insert_with(|| PackageTally {
                    package_id: booking.package_id.clone(),
                    bookings: 0,
                    revenue: 0.0,
                });
            tally.bookings += 1;
            tally.revenue += booking.total_price;
        }
        Ok(tallies.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileAttributes;

    fn user(email: &str, role: Role) -> User {
        User::new(
            "Test".to_string(),
            email.to_string(),
            "123".to_string(),
            "hash".to_string(),
            role,
            ProfileAttributes::default(),
        )
    }

    fn booking(package_id: &str, price: f64) -> Booking {
        Booking::new(
            package_id.to_string(),
            "tourist".to_string(),
            "seller".to_string(),
            Utc::now(),
            1,
            price,
        )
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryStore::new();
        UserRepository::insert(&store, &user("a@example.com", Role::Tourist))
            .await
            .unwrap();

        let err = UserRepository::insert(&store, &user("a@example.com", Role::Seller))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Email already registered"));
        assert_eq!(UserRepository::count(&store, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn transition_only_moves_pending_bookings() {
        let store = InMemoryStore::new();
        let b = booking("p1", 100.0);
        BookingRepository::insert(&store, &b).await.unwrap();

        let approved = store
            .transition_from_pending(&b.id, BookingStatus::Approved)
            .await
            .unwrap()
            .expect("pending booking should move");
        assert_eq!(approved.status, BookingStatus::Approved);

        let again = store
            .transition_from_pending(&b.id, BookingStatus::Rejected)
            .await
            .unwrap();
        assert!(again.is_none());

        let missing = store
            .transition_from_pending("nope", BookingStatus::Approved)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn revenue_counts_only_approved_bookings() {
        let store = InMemoryStore::new();
        assert_eq!(store.approved_revenue().await.unwrap(), 0.0);

        let approved = booking("p1", 10000.0);
        let pending = booking("p1", 500.0);
        BookingRepository::insert(&store, &approved).await.unwrap();
        BookingRepository::insert(&store, &pending).await.unwrap();
        store
            .transition_from_pending(&approved.id, BookingStatus::Approved)
            .await
            .unwrap();

        assert_eq!(store.approved_revenue().await.unwrap(), 10000.0);

        let tallies = store.package_tallies().await.unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].bookings, 2);
        assert_eq!(tallies[0].revenue, 10500.0);
    }
}
