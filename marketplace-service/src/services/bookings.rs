use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

use super::notifications::BookingNotifier;
use super::repository::{BookingFilter, BookingRepository, PackageRepository, UserRepository};
use crate::dtos::bookings::{BookingResponse, CreateBookingRequest};
use crate::middleware::AuthUser;
use crate::models::{Booking, BookingStatus, Package, Role, User};
use crate::utils::{parse_id, parse_travel_date};

#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    packages: Arc<dyn PackageRepository>,
    users: Arc<dyn UserRepository>,
    notifier: BookingNotifier,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        packages: Arc<dyn PackageRepository>,
        users: Arc<dyn UserRepository>,
        notifier: BookingNotifier,
    ) -> Self {
        Self {
            bookings,
            packages,
            users,
            notifier,
        }
    }

    pub async fn create(
        &self,
        caller: &AuthUser,
        req: CreateBookingRequest,
    ) -> Result<BookingResponse, AppError> {
        let (Some(package_id), Some(tourist_id), Some(seller_id), Some(total_price)) = (
            req.package_id.as_deref().filter(|s| !s.is_empty()),
            req.tourist_id.as_deref().filter(|s| !s.is_empty()),
            req.seller_id.as_deref().filter(|s| !s.is_empty()),
            req.total_price,
        ) else {
            return Err(AppError::bad_request("Missing required fields"));
        };

        let books_for_self = caller.role == Role::Tourist && caller.id == tourist_id;
        if !books_for_self && !caller.is_admin() {
            return Err(AppError::forbidden("Tourists can only book for themselves"));
        }

        let guests = req.guests.unwrap_or(1);
        if guests < 1 {
            return Err(AppError::bad_request("Guests must be at least 1"));
        }
        if !total_price.is_finite() || total_price <= 0.0 {
            return Err(AppError::bad_request("Total price must be greater than 0"));
        }
        let travel_date = parse_travel_date(req.travel_date.as_deref())?;

        let package_id = parse_id(package_id, "package")?;
        let tourist_id = parse_id(tourist_id, "tourist")?;
        let seller_id = parse_id(seller_id, "seller")?;

        let package = self
            .packages
            .find_by_id(package_id)
            .await?
            .ok_or_else(|| AppError::not_found("Package not found"))?;
        if !package.is_approved() {
            return Err(AppError::bad_request("Package is not available for booking"));
        }
        if package.created_by != seller_id {
            return Err(AppError::bad_request("Seller does not match the package"));
        }

        let tourist = self
            .users
            .find_by_id(tourist_id)
            .await?
            .ok_or_else(|| AppError::not_found("Tourist not found"))?;
        if tourist.role != Role::Tourist {
            return Err(AppError::bad_request(
                "Bookings can only be made for tourist accounts",
            ));
        }
        let seller = self
            .users
            .find_by_id(seller_id)
            .await?
            .ok_or_else(|| AppError::not_found("Seller not found"))?;

        let booking = Booking::new(
            package.id.clone(),
            tourist.id.clone(),
            seller.id.clone(),
            travel_date,
            guests,
            total_price,
        );
        self.bookings.insert(&booking).await?;

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            package_id = %booking.package_id,
            tourist_id = %booking.tourist_id,
            seller_id = %booking.seller_id,
            guests = booking.guests,
            total_price = booking.total_price,
            "Booking created"
        );

        self.notifier
            .booking_created(&booking, &package, &tourist, &seller)
            .await;

        Ok(BookingResponse::new(
            booking,
            Some(&package),
            Some(&tourist),
            Some(&seller),
        ))
    }

    pub async fn approve(&self, caller: &AuthUser, id: &str) -> Result<BookingResponse, AppError> {
        self.decide(caller, id, BookingStatus::Approved).await
    }

    pub async fn reject(&self, caller: &AuthUser, id: &str) -> Result<BookingResponse, AppError> {
        self.decide(caller, id, BookingStatus::Rejected).await
    }

    async fn decide(
        &self,
        caller: &AuthUser,
        id: &str,
        target: BookingStatus,
    ) -> Result<BookingResponse, AppError> {
        let current = self.find(id).await?;
        if !caller.is_self_or_admin(&current.seller_id) {
            return Err(AppError::forbidden(
                "Only the seller of this booking can approve or reject it",
            ));
        }
        if !current.status.can_transition_to(target) {
            return Err(already(current.status));
        }

        // Conditional on `pending`, so of two racing decisions only one lands.
        let Some(updated) = self.bookings.transition_from_pending(&current.id, target).await?
        else {
            return match self.bookings.find_by_id(&current.id).await? {
                Some(latest) => Err(already(latest.status)),
                None => Err(AppError::not_found("Booking not found")),
            };
        };

        metrics::counter!("booking_transitions_total", "to" => target.as_str()).increment(1);
        tracing::info!(booking_id = %updated.id, status = target.as_str(), "Booking decided");

        let package = self.packages.find_by_id(&updated.package_id).await?;
        let tourist = self.users.find_by_id(&updated.tourist_id).await?;
        let seller = self.users.find_by_id(&updated.seller_id).await?;

        if let Some(tourist) = &tourist {
            let title = package.as_ref().map(|p| p.title.as_str()).unwrap_or("your trip");
            self.notifier.booking_decided(&updated, title, tourist).await;
        }

        Ok(BookingResponse::new(
            updated,
            package.as_ref(),
            tourist.as_ref(),
            seller.as_ref(),
        ))
    }

    pub async fn list_all(&self, caller: &AuthUser) -> Result<Vec<BookingResponse>, AppError> {
        if !caller.is_admin() {
            return Err(AppError::forbidden("Admin access required"));
        }
        self.list(&BookingFilter::default()).await
    }

    pub async fn get(&self, caller: &AuthUser, id: &str) -> Result<BookingResponse, AppError> {
        let booking = self.find(id).await?;
        if !caller.is_admin() && !booking.involves(&caller.id) {
            return Err(AppError::forbidden("You are not a party to this booking"));
        }
        self.join(vec![booking])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found("Booking not found"))
    }

    pub async fn list_for_seller(
        &self,
        caller: &AuthUser,
        seller_id: &str,
        pending_only: bool,
    ) -> Result<Vec<BookingResponse>, AppError> {
        if !caller.is_self_or_admin(seller_id) {
            return Err(AppError::forbidden("You can only view your own bookings"));
        }
        self.list(&BookingFilter {
            seller_id: Some(seller_id.to_string()),
            status: pending_only.then_some(BookingStatus::Pending),
            ..Default::default()
        })
        .await
    }

    pub async fn list_for_tourist(
        &self,
        caller: &AuthUser,
        tourist_id: &str,
    ) -> Result<Vec<BookingResponse>, AppError> {
        if !caller.is_self_or_admin(tourist_id) {
            return Err(AppError::forbidden("You can only view your own bookings"));
        }
        self.list(&BookingFilter {
            tourist_id: Some(tourist_id.to_string()),
            ..Default::default()
        })
        .await
    }

    async fn find(&self, id: &str) -> Result<Booking, AppError> {
        let id = parse_id(id, "booking")?;
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<BookingResponse>, AppError> {
        let bookings = self.bookings.list(filter).await?;
        self.join(bookings).await
    }

    /// Resolve packages and parties with one lookup per collection.
    async fn join(&self, bookings: Vec<Booking>) -> Result<Vec<BookingResponse>, AppError> {
        let mut package_ids: Vec<String> = bookings.iter().map(|b| b.package_id.clone()).collect();
        package_ids.sort();
        package_ids.dedup();

        let mut user_ids: Vec<String> = bookings
            .iter()
            .flat_map(|b| [b.tourist_id.clone(), b.seller_id.clone()])
            .collect();
        user_ids.sort();
        user_ids.dedup();

        let packages: HashMap<String, Package> = self
            .packages
            .find_by_ids(&package_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let users: HashMap<String, User> = self
            .users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|b| {
                let package = packages.get(&b.package_id);
                let tourist = users.get(&b.tourist_id);
                let seller = users.get(&b.seller_id);
                BookingResponse::new(b, package, tourist, seller)
            })
            .collect())
    }
}

fn already(status: BookingStatus) -> AppError {
    AppError::conflict(format!("Booking is already {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PackageDetails, PackageStatus, ProfileAttributes};
    use crate::services::email::MockEmailProvider;
    use crate::services::memory::InMemoryStore;
    use axum::http::StatusCode;

    struct Fixture {
        service: BookingService,
        mail: Arc<MockEmailProvider>,
        tourist: AuthUser,
        seller: AuthUser,
        package_id: String,
    }

    async fn account(store: &InMemoryStore, email: &str, role: Role) -> AuthUser {
        let user = User::new(
            email.to_string(),
            email.to_string(),
            "555".to_string(),
            "hash".to_string(),
            role,
            ProfileAttributes::default(),
        );
        UserRepository::insert(store, &user).await.unwrap();
        AuthUser { id: user.id, role }
    }

    async fn fixture(status: PackageStatus) -> Fixture {
        let store = InMemoryStore::new();
        let tourist = account(&store, "t@example.com", Role::Tourist).await;
        let seller = account(&store, "s@example.com", Role::Seller).await;

        let mut package = Package::new(
            PackageDetails {
                title: "Backwaters".to_string(),
                price: 5000.0,
                ..Default::default()
            },
            seller.id.clone(),
            Vec::new(),
        );
        package.status = status;
        PackageRepository::insert(&store, &package).await.unwrap();

        let mail = Arc::new(MockEmailProvider::new());
        let service = BookingService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
            BookingNotifier::new(mail.clone()),
        );

        Fixture {
            service,
            mail,
            tourist,
            seller,
            package_id: package.id,
        }
    }

    fn request(f: &Fixture, guests: Option<i32>) -> CreateBookingRequest {
        CreateBookingRequest {
            package_id: Some(f.package_id.clone()),
            tourist_id: Some(f.tourist.id.clone()),
            seller_id: Some(f.seller.id.clone()),
            travel_date: Some("2026-01-10".to_string()),
            guests,
            total_price: Some(10000.0),
        }
    }

    #[tokio::test]
    async fn create_persists_joins_and_notifies_both_parties() {
        let f = fixture(PackageStatus::Approved).await;
        let booking = f.service.create(&f.tourist, request(&f, Some(2))).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.guests, 2);
        assert_eq!(booking.package.unwrap().title, "Backwaters");
        assert_eq!(booking.tourist.unwrap().email, "t@example.com");
        assert!(booking.travel_date.starts_with("2026-01-10"));

        let sent = f.mail.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "t@example.com");
        assert_eq!(sent[1].to, "s@example.com");
    }

    #[tokio::test]
    async fn guests_default_to_one_and_zero_is_rejected() {
        let f = fixture(PackageStatus::Approved).await;
        let booking = f.service.create(&f.tourist, request(&f, None)).await.unwrap();
        assert_eq!(booking.guests, 1);

        let err = f
            .service
            .create(&f.tourist, request(&f, Some(0)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_fields_and_bad_price() {
        let f = fixture(PackageStatus::Approved).await;
        let mut req = request(&f, None);
        req.total_price = None;
        let err = f.service.create(&f.tourist, req).await.unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Missing required fields");

        let mut req = request(&f, None);
        req.total_price = Some(-5.0);
        assert!(f.service.create(&f.tourist, req).await.is_err());
    }

    #[tokio::test]
    async fn unapproved_package_and_seller_mismatch_are_rejected() {
        let f = fixture(PackageStatus::Pending).await;
        assert!(f.service.create(&f.tourist, request(&f, None)).await.is_err());

        let f = fixture(PackageStatus::Approved).await;
        let mut req = request(&f, None);
        req.seller_id = Some(f.tourist.id.clone());
        let err = f.service.create(&f.tourist, req).await.unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Seller does not match the package");
    }

    #[tokio::test]
    async fn admin_may_only_book_for_tourist_accounts() {
        let f = fixture(PackageStatus::Approved).await;
        let admin = AuthUser {
            id: "admin".to_string(),
            role: Role::Admin,
        };

        let mut req = request(&f, None);
        req.tourist_id = Some(f.seller.id.clone());
        let err = f.service.create(&admin, req).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bad request: Bookings can only be made for tourist accounts"
        );

        let booking = f.service.create(&admin, request(&f, None)).await.unwrap();
        assert_eq!(booking.tourist.unwrap().email, "t@example.com");
    }

    #[tokio::test]
    async fn cannot_book_as_someone_else() {
        let f = fixture(PackageStatus::Approved).await;
        let err = f
            .service
            .create(&f.seller, request(&f, None))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn email_failure_does_not_fail_booking() {
        let f = fixture(PackageStatus::Approved).await;
        f.mail.set_failing(true);
        assert!(f.service.create(&f.tourist, request(&f, None)).await.is_ok());
    }

    #[tokio::test]
    async fn decisions_only_apply_to_pending_bookings() {
        let f = fixture(PackageStatus::Approved).await;
        let booking = f.service.create(&f.tourist, request(&f, None)).await.unwrap();

        let rejected = f.service.reject(&f.seller, &booking.id).await.unwrap();
        assert_eq!(rejected.status, BookingStatus::Rejected);

        let err = f.service.approve(&f.seller, &booking.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Conflict: Booking is already rejected");
    }

    #[tokio::test]
    async fn only_the_seller_decides() {
        let f = fixture(PackageStatus::Approved).await;
        let booking = f.service.create(&f.tourist, request(&f, None)).await.unwrap();
        let err = f.service.approve(&f.tourist, &booking.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let f = fixture(PackageStatus::Approved).await;
        let err = f
            .service
            .approve(&f.seller, &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn seller_pending_list_drops_decided_bookings() {
        let f = fixture(PackageStatus::Approved).await;
        let first = f.service.create(&f.tourist, request(&f, None)).await.unwrap();
        f.service.create(&f.tourist, request(&f, None)).await.unwrap();
        f.service.approve(&f.seller, &first.id).await.unwrap();

        let all = f
            .service
            .list_for_seller(&f.seller, &f.seller.id, false)
            .await
            .unwrap();
        let pending = f
            .service
            .list_for_seller(&f.seller, &f.seller.id, true)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(pending.len(), 1);

        let err = f
            .service
            .list_for_seller(&f.tourist, &f.seller.id, false)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
