// Service exports
pub mod cache;
pub mod passwords;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use passwords::{hash_password, verify_password, PasswordError};
pub use postgres::{new_session_id, PostWithCounts, PostgresClient, PostgresError};
