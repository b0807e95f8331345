pub mod parse;
pub mod password;
pub mod validation;

pub use parse::{parse_id, parse_travel_date};
pub use password::{hash_password, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
