use crate::models::{AccountStatus, Booking, BookingStatus, Package, PackageStatus, Role, User};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::repository::{
    BookingFilter, BookingRepository, PackageRepository, PackageTally, UserRepository,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to MongoDB");
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("email_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users()
            .create_indexes([email_index, index("role", doc! { "role": 1 })], None)
            .await?;

        self.packages()
            .create_indexes(
                [
                    index("created_by_lookup", doc! { "createdBy": 1 }),
                    index("status_lookup", doc! { "status": 1 }),
                ],
                None,
            )
            .await?;

        self.bookings()
            .create_indexes(
                [
                    index("seller_status_lookup", doc! { "sellerId": 1, "status": 1 }),
                    index("tourist_lookup", doc! { "touristId": 1 }),
                    index("package_lookup", doc! { "packageId": 1 }),
                    index("status_lookup", doc! { "status": 1 }),
                ],
                None,
            )
            .await?;

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MongoDB health check failed");
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn packages(&self) -> Collection<Package> {
        self.db.collection("packages")
    }

    pub fn bookings(&self) -> Collection<Booking> {
        self.db.collection("bookings")
    }
}

fn index(name: &str, keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

fn newest_first(field: &str) -> FindOptions {
    FindOptions::builder().sort(doc! { field: -1 }).build()
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// `$sum` yields Int32, Int64 or Double depending on the inputs.
pub(crate) fn bson_number(value: Option<&Bson>) -> f64 {
    match value {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => 0.0,
    }
}

fn booking_filter_doc(filter: &BookingFilter) -> Document {
    let mut query = Document::new();
    if let Some(seller_id) = &filter.seller_id {
        query.insert("sellerId", seller_id.as_str());
    }
    if let Some(tourist_id) = &filter.tourist_id {
        query.insert("touristId", tourist_id.as_str());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    query
}

#[async_trait]
impl UserRepository for MongoDb {
    async fn insert(&self, user: &User) -> Result<(), AppError> {
        match self.users().insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::bad_request("Email already registered")),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .users()
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let cursor = self.users().find(None, newest_first("createdAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn set_status(
        &self,
        id: &str,
        status: AccountStatus,
    ) -> Result<Option<User>, AppError> {
        Ok(self
            .users()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str(), "updatedAt": bson::DateTime::now() } },
                return_updated(),
            )
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = self.users().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count(&self, role: Option<Role>) -> Result<u64, AppError> {
        let filter = role.map(|r| doc! { "role": r.as_str() });
        Ok(self.users().count_documents(filter, None).await?)
    }
}

#[async_trait]
impl PackageRepository for MongoDb {
    async fn insert(&self, package: &Package) -> Result<(), AppError> {
        self.packages().insert_one(package, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self.packages().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Package>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = self
            .packages()
            .find(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list(&self, status: Option<PackageStatus>) -> Result<Vec<Package>, AppError> {
        let filter = status.map(|s| doc! { "status": s.as_str() });
        let cursor = self.packages().find(filter, newest_first("createdAt")).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_by_creator(&self, creator_id: &str) -> Result<Vec<Package>, AppError> {
        let cursor = self
            .packages()
            .find(doc! { "createdBy": creator_id }, newest_first("createdAt"))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update(&self, package: &Package) -> Result<bool, AppError> {
        let result = self
            .packages()
            .replace_one(doc! { "_id": package.id.as_str() }, package, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_status(
        &self,
        id: &str,
        status: PackageStatus,
    ) -> Result<Option<Package>, AppError> {
        Ok(self
            .packages()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str(), "updatedAt": bson::DateTime::now() } },
                return_updated(),
            )
            .await?)
    }

    async fn delete(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self
            .packages()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn count(&self, status: Option<PackageStatus>) -> Result<u64, AppError> {
        let filter = status.map(|s| doc! { "status": s.as_str() });
        Ok(self.packages().count_documents(filter, None).await?)
    }
}

#[async_trait]
impl BookingRepository for MongoDb {
    async fn insert(&self, booking: &Booking) -> Result<(), AppError> {
        self.bookings().insert_one(booking, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let cursor = self
            .bookings()
            .find(booking_filter_doc(filter), newest_first("bookingDate"))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn transition_from_pending(
        &self,
        id: &str,
        target: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        Ok(self
            .bookings()
            .find_one_and_update(
                doc! { "_id": id, "status": BookingStatus::Pending.as_str() },
                doc! { "$set": { "status": target.as_str(), "updatedAt": bson::DateTime::now() } },
                return_updated(),
            )
            .await?)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.bookings().count_documents(None, None).await?)
    }

    async fn approved_revenue(&self) -> Result<f64, AppError> {
        let pipeline = vec![
            doc! { "$match": { "status": BookingStatus::Approved.as_str() } },
            doc! { "$group": { "_id": Bson::Null, "revenue": { "$sum": "$totalPrice" } } },
        ];
        let mut cursor = self.bookings().aggregate(pipeline, None).await?;
        let revenue = match cursor.try_next().await? {
            Some(group) => bson_number(group.get("revenue")),
            None => 0.0,
        };
        Ok(revenue)
    }

    async fn package_tallies(&self) -> Result<Vec<PackageTally>, AppError> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": "$packageId",
                "bookings": { "$sum": 1 },
                "revenue": { "$sum": "$totalPrice" },
            }
        }];
        let groups: Vec<Document> = self
            .bookings()
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|group| {
                let package_id = group.get_str("_id").ok()?.to_string();
                Some(PackageTally {
                    package_id,
                    bookings: bson_number(group.get("bookings")) as u64,
                    revenue: bson_number(group.get("revenue")),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bson_number_reads_every_numeric_width() {
        assert_eq!(bson_number(Some(&Bson::Int32(3))), 3.0);
        assert_eq!(bson_number(Some(&Bson::Int64(10_000))), 10_000.0);
        assert_eq!(bson_number(Some(&Bson::Double(12.5))), 12.5);
        assert_eq!(bson_number(Some(&Bson::Null)), 0.0);
        assert_eq!(bson_number(None), 0.0);
    }

    #[test]
    fn booking_filter_doc_only_sets_given_fields() {
        let query = booking_filter_doc(&BookingFilter {
            seller_id: Some("s1".to_string()),
            status: Some(BookingStatus::Pending),
            ..Default::default()
        });
        assert_eq!(query.get_str("sellerId").unwrap(), "s1");
        assert_eq!(query.get_str("status").unwrap(), "pending");
        assert!(!query.contains_key("touristId"));
    }
}
