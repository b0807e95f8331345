pub mod booking;
pub mod package;
pub mod user;

pub use booking::{Booking, BookingStatus};
pub use package::{ItineraryDay, Package, PackageDetails, PackageStatus};
pub use user::{AccountStatus, ProfileAttributes, Role, User};
