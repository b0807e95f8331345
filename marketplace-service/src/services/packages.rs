use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;

use super::repository::{PackageRepository, UserRepository};
use super::storage::{key_from_url, package_image_key, public_url, Storage};
use crate::dtos::packages::{ImageUpload, PackageForm, PackageResponse};
use crate::middleware::AuthUser;
use crate::models::{Package, PackageDetails, PackageStatus, User};
use crate::utils::parse_id;

#[derive(Clone)]
pub struct PackageService {
    packages: Arc<dyn PackageRepository>,
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn Storage>,
    max_images: usize,
}

impl PackageService {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn Storage>,
        max_images: usize,
    ) -> Self {
        Self {
            packages,
            users,
            storage,
            max_images,
        }
    }

    pub async fn list(&self, status: Option<PackageStatus>) -> Result<Vec<PackageResponse>, AppError> {
        let packages = self.packages.list(status).await?;
        self.with_creators(packages).await
    }

    pub async fn list_by_seller(&self, seller_id: &str) -> Result<Vec<PackageResponse>, AppError> {
        let seller_id = parse_id(seller_id, "seller")?;
        let packages = self.packages.list_by_creator(seller_id).await?;
        self.with_creators(packages).await
    }

    pub async fn get(&self, id: &str) -> Result<PackageResponse, AppError> {
        let package = self.find(id).await?;
        self.with_creator(package).await
    }

    pub async fn create(&self, caller: &AuthUser, form: PackageForm) -> Result<PackageResponse, AppError> {
        if !caller.role.can_list_packages() {
            return Err(AppError::forbidden(
                "Only sellers and guides can create packages",
            ));
        }

        let details = required_details(&form)?;
        self.check_images(&form.images, 0)?;

        let images = self.store_images(&form.images).await?;
        let package = Package::new(details, caller.id.clone(), images);

        if let Err(e) = self.packages.insert(&package).await {
            tracing::error!(error = %e, "Package insert failed, removing uploaded images");
            self.remove_images(&package.images).await;
            return Err(e);
        }

        metrics::counter!("packages_created_total").increment(1);
        tracing::info!(package_id = %package.id, created_by = %package.created_by, "Package created");

        self.with_creator(package).await
    }

    pub async fn edit(
        &self,
        caller: &AuthUser,
        id: &str,
        form: PackageForm,
    ) -> Result<PackageResponse, AppError> {
        let mut package = self.find(id).await?;
        ensure_owner(caller, &package)?;
        self.check_images(&form.images, package.images.len())?;

        let price = non_blank(&form.price).as_deref().map(parse_price).transpose()?;

        if let Some(title) = non_blank(&form.title) {
            package.title = title;
        }
        if let Some(description) = non_blank(&form.description) {
            package.description = description;
        }
        if let Some(price) = price {
            package.price = price;
        }
        if let Some(duration) = non_blank(&form.duration) {
            package.duration = duration;
        }
        if let Some(location) = non_blank(&form.location) {
            package.location = location;
        }
        if let Some(highlights) = form.highlights {
            package.highlights = highlights;
        }
        if let Some(includes) = form.includes {
            package.includes = includes;
        }
        if let Some(itinerary) = form.itinerary {
            package.itinerary = itinerary;
        }

        let added = self.store_images(&form.images).await?;
        package.images.extend(added.iter().cloned());
        package.updated_at = Utc::now();

        match self.packages.update(&package).await {
            Ok(true) => {}
            Ok(false) => {
                self.remove_images(&added).await;
                return Err(AppError::not_found("Package not found"));
            }
            Err(e) => {
                self.remove_images(&added).await;
                return Err(e);
            }
        }

        tracing::info!(package_id = %package.id, "Package updated");
        self.with_creator(package).await
    }

    pub async fn delete(&self, caller: &AuthUser, id: &str) -> Result<(), AppError> {
        let package = self.find(id).await?;
        ensure_owner(caller, &package)?;

        let deleted = self
            .packages
            .delete(&package.id)
            .await?
            .ok_or_else(|| AppError::not_found("Package not found"))?;

        self.remove_images(&deleted.images).await;
        tracing::info!(package_id = %deleted.id, "Package deleted");
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Package, AppError> {
        let id = parse_id(id, "package")?;
        self.packages
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Package not found"))
    }

    fn check_images(&self, uploads: &[ImageUpload], existing: usize) -> Result<(), AppError> {
        if uploads.iter().any(|u| !u.content_type.starts_with("image/")) {
            return Err(AppError::bad_request("Only image files are allowed"));
        }
        if existing + uploads.len() > self.max_images {
            return Err(AppError::bad_request(format!(
                "A package can have at most {} images",
                self.max_images
            )));
        }
        Ok(())
    }

    /// Write every upload, or none: a failure removes the files already written.
    async fn store_images(&self, uploads: &[ImageUpload]) -> Result<Vec<String>, AppError> {
        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let key = package_image_key(upload.file_name.as_deref());
            if let Err(e) = self.storage.upload(&key, upload.data.clone()).await {
                self.remove_images(&urls).await;
                return Err(e);
            }
            urls.push(public_url(&key));
        }
        Ok(urls)
    }

    async fn remove_images(&self, urls: &[String]) {
        for url in urls {
            let Some(key) = key_from_url(url) else {
                tracing::warn!(url = %url, "Skipping image outside storage root");
                continue;
            };
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(error = %e, url = %url, "Failed to delete image");
            }
        }
    }

    async fn with_creator(&self, package: Package) -> Result<PackageResponse, AppError> {
        let creator = self.users.find_by_id(&package.created_by).await?;
        Ok(PackageResponse::new(package, creator.as_ref()))
    }

    async fn with_creators(&self, packages: Vec<Package>) -> Result<Vec<PackageResponse>, AppError> {
        let creators = creators_by_id(self.users.as_ref(), &packages).await?;
        Ok(packages
            .into_iter()
            .map(|p| {
                let creator = creators.get(&p.created_by);
                PackageResponse::new(p, creator)
            })
            .collect())
    }
}

/// Look up the distinct creators of `packages` in one query.
pub(crate) async fn creators_by_id(
    users: &dyn UserRepository,
    packages: &[Package],
) -> Result<HashMap<String, User>, AppError> {
    let mut ids: Vec<String> = packages.iter().map(|p| p.created_by.clone()).collect();
    ids.sort();
    ids.dedup();

    Ok(users
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect())
}

fn ensure_owner(caller: &AuthUser, package: &Package) -> Result<(), AppError> {
    if caller.is_self_or_admin(&package.created_by) {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only modify your own packages"))
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_price(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .ok_or_else(|| AppError::bad_request("Invalid price"))
}

fn required_details(form: &PackageForm) -> Result<PackageDetails, AppError> {
    let (Some(title), Some(description), Some(price), Some(duration), Some(location)) = (
        non_blank(&form.title),
        non_blank(&form.description),
        non_blank(&form.price),
        non_blank(&form.duration),
        non_blank(&form.location),
    ) else {
        return Err(AppError::bad_request("All required fields must be provided"));
    };

    Ok(PackageDetails {
        title,
        description,
        price: parse_price(&price)?,
        duration,
        location,
        highlights: form.highlights.clone().unwrap_or_default(),
        includes: form.includes.clone().unwrap_or_default(),
        itinerary: form.itinerary.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProfileAttributes, Role};
    use crate::services::memory::InMemoryStore;
    use crate::services::storage::LocalStorage;

    struct Fixture {
        service: PackageService,
        store: InMemoryStore,
        seller: AuthUser,
        dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryStore::new();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let seller = User::new(
            "Meera".to_string(),
            "meera@example.com".to_string(),
            "1".to_string(),
            "hash".to_string(),
            Role::Seller,
            ProfileAttributes::default(),
        );
        UserRepository::insert(&store, &seller).await.unwrap();

        Fixture {
            service: PackageService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                Arc::new(storage),
                3,
            ),
            seller: AuthUser {
                id: seller.id,
                role: Role::Seller,
            },
            store,
            dir,
        }
    }

    fn form(images: usize) -> PackageForm {
        PackageForm {
            title: Some("Munnar Escape".to_string()),
            description: Some("Tea gardens".to_string()),
            price: Some("5000".to_string()),
            duration: Some("3 days".to_string()),
            location: Some("Munnar".to_string()),
            highlights: Some(vec!["Tea".to_string()]),
            images: (0..images)
                .map(|i| ImageUpload {
                    file_name: Some(format!("img{}.png", i)),
                    content_type: "image/png".to_string(),
                    data: vec![1, 2, 3],
                })
                .collect(),
            ..Default::default()
        }
    }

    fn image_path(f: &Fixture, url: &str) -> std::path::PathBuf {
        f.dir.path().join(key_from_url(url).unwrap())
    }

    #[tokio::test]
    async fn create_stores_images_and_joins_creator() {
        let f = fixture().await;
        let pkg = f.service.create(&f.seller, form(2)).await.unwrap();

        assert_eq!(pkg.status, PackageStatus::Pending);
        assert_eq!(pkg.images.len(), 2);
        assert!(pkg.images.iter().all(|u| u.starts_with("/uploads/packages/")));
        assert!(image_path(&f, &pkg.images[0]).exists());
        assert_eq!(pkg.created_by.unwrap().name, "Meera");
    }

    #[tokio::test]
    async fn tourists_cannot_create_packages() {
        let f = fixture().await;
        let tourist = AuthUser {
            id: "t".to_string(),
            role: Role::Tourist,
        };
        let err = f.service.create(&tourist, form(0)).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let f = fixture().await;
        let mut incomplete = form(0);
        incomplete.location = Some("  ".to_string());
        let err = f.service.create(&f.seller, incomplete).await.unwrap_err();
        assert_eq!(err.to_string(), "Bad request: All required fields must be provided");
    }

    #[tokio::test]
    async fn non_images_and_too_many_images_are_rejected() {
        let f = fixture().await;
        let mut pdf = form(1);
        pdf.images[0].content_type = "application/pdf".to_string();
        assert!(f.service.create(&f.seller, pdf).await.is_err());
        assert!(f.service.create(&f.seller, form(4)).await.is_err());
        assert_eq!(PackageRepository::count(&f.store, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn edit_appends_images_and_keeps_status() {
        let f = fixture().await;
        let pkg = f.service.create(&f.seller, form(1)).await.unwrap();

        let update = PackageForm {
            price: Some("6500".to_string()),
            ..form(1)
        };
        let edited = f.service.edit(&f.seller, &pkg.id, update).await.unwrap();
        assert_eq!(edited.price, 6500.0);
        assert_eq!(edited.images.len(), 2);
        assert_eq!(edited.images[0], pkg.images[0]);
        assert_eq!(edited.status, PackageStatus::Pending);

        let over_cap = f.service.edit(&f.seller, &pkg.id, form(2)).await;
        assert!(over_cap.is_err());
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_edit() {
        let f = fixture().await;
        let pkg = f.service.create(&f.seller, form(0)).await.unwrap();
        let other = AuthUser {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Seller,
        };
        let admin = AuthUser {
            id: "admin".to_string(),
            role: Role::Admin,
        };

        assert!(f.service.edit(&other, &pkg.id, form(0)).await.is_err());
        assert!(f.service.edit(&admin, &pkg.id, form(0)).await.is_ok());
    }

    #[tokio::test]
    async fn delete_removes_only_its_own_images() {
        let f = fixture().await;
        let doomed = f.service.create(&f.seller, form(2)).await.unwrap();
        let kept = f.service.create(&f.seller, form(1)).await.unwrap();

        f.service.delete(&f.seller, &doomed.id).await.unwrap();

        assert!(doomed.images.iter().all(|u| !image_path(&f, u).exists()));
        assert!(image_path(&f, &kept.images[0]).exists());

        let err = f.service.get(&doomed.id).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_bad_request() {
        let f = fixture().await;
        let err = f.service.get("not-an-id").await.unwrap_err();
        assert_eq!(err.to_string(), "Bad request: Invalid package ID");
    }
}
