use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

use super::packages::creators_by_id;
use super::repository::{BookingRepository, PackageRepository, PackageTally, UserRepository};
use crate::dtos::admin::{PendingApprovalsResponse, PendingPackage, StatsResponse, TopPackage};
use crate::dtos::packages::PackageResponse;
use crate::dtos::users::{UserResponse, UserSummary};
use crate::models::{AccountStatus, Package, PackageStatus, Role, User};
use crate::utils::parse_id;

const TOP_PACKAGES_LIMIT: usize = 3;

#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    packages: Arc<dyn PackageRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AdminService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        packages: Arc<dyn PackageRepository>,
        bookings: Arc<dyn BookingRepository>,
    ) -> Self {
        Self {
            users,
            packages,
            bookings,
        }
    }

    /// Platform counters, computed fresh on every call.
    pub async fn stats(&self) -> Result<StatsResponse, AppError> {
        let (
            total_users,
            tourists,
            sellers,
            guides,
            active_packages,
            pending_packages,
            total_bookings,
            total_revenue,
        ) = tokio::try_join!(
            self.users.count(None),
            self.users.count(Some(Role::Tourist)),
            self.users.count(Some(Role::Seller)),
            self.users.count(Some(Role::Guide)),
            self.packages.count(Some(PackageStatus::Approved)),
            self.packages.count(Some(PackageStatus::Pending)),
            self.bookings.count(),
            self.bookings.approved_revenue(),
        )?;

        Ok(StatsResponse {
            total_users,
            tourists,
            sellers,
            guides,
            active_packages,
            pending_packages,
            total_bookings,
            total_revenue,
        })
    }

    pub async fn pending_approvals(&self) -> Result<PendingApprovalsResponse, AppError> {
        let packages = self.packages.list(Some(PackageStatus::Pending)).await?;
        let creators = creators_by_id(self.users.as_ref(), &packages).await?;

        Ok(PendingApprovalsResponse {
            packages: packages
                .into_iter()
                .map(|p| PendingPackage {
                    seller_name: creators.get(&p.created_by).map(|u| u.name.clone()),
                    id: p.id,
                    title: p.title,
                    created_at: p.created_at.to_rfc3339(),
                })
                .collect(),
            sellers: Vec::new(),
            guides: Vec::new(),
        })
    }

    pub async fn top_packages(&self) -> Result<Vec<TopPackage>, AppError> {
        let tallies = self.bookings.package_tallies().await?;
        let ids: Vec<String> = tallies.iter().map(|t| t.package_id.clone()).collect();

        let packages: HashMap<String, Package> = self
            .packages
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let creators = creators_by_id(
            self.users.as_ref(),
            &packages.values().cloned().collect::<Vec<_>>(),
        )
        .await?;

        Ok(rank_top_packages(tallies, &packages, &creators, TOP_PACKAGES_LIMIT))
    }

    pub async fn set_package_status(
        &self,
        id: &str,
        status: PackageStatus,
    ) -> Result<PackageResponse, AppError> {
        let id = parse_id(id, "package")?;
        let package = self
            .packages
            .set_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Package not found"))?;

        tracing::info!(package_id = %package.id, status = status.as_str(), "Package moderated");
        let creator = self.users.find_by_id(&package.created_by).await?;
        Ok(PackageResponse::new(package, creator.as_ref()))
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AppError> {
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .map(UserSummary::from)
            .collect())
    }

    /// Blocking only affects future logins; issued tokens stay valid.
    pub async fn set_user_status(
        &self,
        id: &str,
        status: AccountStatus,
    ) -> Result<UserResponse, AppError> {
        let id = parse_id(id, "user")?;
        let user = self
            .users
            .set_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        tracing::info!(user_id = %user.id, status = status.as_str(), "Account status changed");
        Ok(UserResponse::from(user))
    }

    /// Removes the account only; its packages and bookings are kept.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id, "user")?;
        if !self.users.delete(id).await? {
            return Err(AppError::not_found("User not found"));
        }
        tracing::info!(user_id = %id, "Account deleted");
        Ok(())
    }
}

/// Most-booked packages first, ties broken by package id. Tallies for
/// packages that no longer exist are skipped.
pub fn rank_top_packages(
    mut tallies: Vec<PackageTally>,
    packages: &HashMap<String, Package>,
    creators: &HashMap<String, User>,
    limit: usize,
) -> Vec<TopPackage> {
    tallies.retain(|t| packages.contains_key(&t.package_id));
    tallies.sort_by(|a, b| {
        b.bookings
            .cmp(&a.bookings)
            .then_with(|| a.package_id.cmp(&b.package_id))
    });

    tallies
        .into_iter()
        .take(limit)
        .filter_map(|tally| {
            let package = packages.get(&tally.package_id)?;
            Some(TopPackage {
                id: package.id.clone(),
                title: package.title.clone(),
                image: package.images.first().cloned(),
                seller_name: creators.get(&package.created_by).map(|u| u.name.clone()),
                bookings: tally.bookings,
                revenue: tally.revenue,
                rating: None,
            })
        })
        .collect()
}
