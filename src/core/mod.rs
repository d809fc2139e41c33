// Domain rules, free of I/O
pub mod discovery;
pub mod distance;
pub mod rate_limit;
pub mod scoring;
pub mod stats;
pub mod workspace;

pub use discovery::{matches_filters, DiscoveryFilters, DiscoveryResult, Ranker};
pub use distance::{calculate_bounding_box, distance_between, haversine_distance, is_within_bounding_box, within_radius};
pub use rate_limit::{MessageRateLimiter, RateLimited};
pub use scoring::{calculate_discovery_score, shared_interests};
pub use stats::{profile_completion, response_rate, RecentPeriod};
pub use workspace::WorkspaceRuleError;
