//! Collabr - backend API for a creator community
//!
//! Profiles and discovery, likes and matches with messaging, collaboration
//! requests with a shared workspace, forums, events and safety reporting.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance::{calculate_bounding_box, haversine_distance}, Ranker};
pub use error::ApiError;
pub use models::{Profile, ScoringWeights, User, UserSummary};
pub use routes::{configure_routes, AppState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bbox = calculate_bounding_box(52.52, 13.405, 10.0);
        assert!(bbox.min_lat < 52.52 && bbox.max_lat > 52.52);
        assert_eq!(haversine_distance(52.52, 13.405, 52.52, 13.405), 0.0);
    }
}
