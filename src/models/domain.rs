use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public subset of a user attached to profiles, posts, matches, etc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

/// Login session backing the `session_id` cookie
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub sid: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A resolved session as kept in the cache
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[sqlx(flatten)]
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Creator profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub user_id: String,
    pub bio: Option<String>,
    pub niche: Option<String>,
    pub portfolio_url: Option<String>,
    pub location: Option<String>,
    pub social_links: serde_json::Value,
    pub age_verified: bool,
    pub socials_verified: bool,
    pub tags: Vec<String>,
    pub is_nsfw: bool,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub looking_for: Option<String>,
    pub interests: Vec<String>,
    pub height: Option<i32>,
    pub occupation: Option<String>,
    pub education: Option<String>,
    pub photos: Vec<String>,
    pub is_visible: bool,
    pub last_active: DateTime<Utc>,
    pub privacy_settings: serde_json::Value,
    pub min_age_preference: i32,
    pub max_age_preference: i32,
    pub max_distance: i32,
    pub gender_preference: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub boundaries: serde_json::Value,
    pub experience_level: Option<String>,
    pub availability: Option<String>,
    pub travel_mode: Option<String>,
    pub monetization_expectation: Option<String>,
}

impl Profile {
    /// A profile with column defaults, as a fresh row would have
    pub fn blank(user_id: impl Into<String>) -> Self {
        Self {
            id: 0,
            user_id: user_id.into(),
            bio: None,
            niche: None,
            portfolio_url: None,
            location: None,
            social_links: serde_json::json!({}),
            age_verified: false,
            socials_verified: false,
            tags: Vec::new(),
            is_nsfw: false,
            birth_date: None,
            gender: None,
            looking_for: None,
            interests: Vec::new(),
            height: None,
            occupation: None,
            education: None,
            photos: Vec::new(),
            is_visible: true,
            last_active: Utc::now(),
            privacy_settings: serde_json::json!({}),
            min_age_preference: 18,
            max_age_preference: 99,
            max_distance: 100,
            gender_preference: Vec::new(),
            latitude: None,
            longitude: None,
            location_updated_at: None,
            boundaries: serde_json::json!({}),
            experience_level: None,
            availability: None,
            travel_mode: None,
            monetization_expectation: None,
        }
    }

    /// Both coordinates, when the profile has checked in a location
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Verified for ranking purposes: age or socials confirmed
    pub fn verified(&self) -> bool {
        self.age_verified || self.socials_verified
    }
}

/// Bookmarked profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedProfile {
    pub id: i64,
    pub user_id: String,
    pub saved_user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Event types for discovery interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "seen_event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SeenEventType {
    Viewed,
    Liked,
    Passed,
    Matched,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: i64,
    pub liker_id: String,
    pub liked_id: String,
    pub is_super_like: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    pub user1_id: String,
    pub user2_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.user1_id == user_id {
            &self.user2_id
        } else {
            &self.user1_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub match_id: i64,
    pub sender_id: String,
    pub content: String,
    pub message_type: String,
    pub media_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: i64,
    pub blocker_id: String,
    pub blocked_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: String,
    pub description: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "collaboration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CollaborationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collaboration {
    pub id: i64,
    pub requester_id: String,
    pub receiver_id: String,
    pub status: CollaborationStatus,
    pub message: String,
    pub acknowledged_by_requester: bool,
    pub acknowledged_by_receiver: bool,
    pub created_at: DateTime<Utc>,
}

impl Collaboration {
    pub fn involves(&self, user_id: &str) -> bool {
        self.requester_id == user_id || self.receiver_id == user_id
    }

    pub fn side_of(&self, user_id: &str) -> Option<CollaborationSide> {
        if self.requester_id == user_id {
            Some(CollaborationSide::Requester)
        } else if self.receiver_id == user_id {
            Some(CollaborationSide::Receiver)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaborationSide {
    Requester,
    Receiver,
}

/// Shared planning document of an accepted collaboration
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationWorkspace {
    pub id: i64,
    pub collaboration_id: i64,
    pub concept: Option<String>,
    pub shoot_dates: serde_json::Value,
    pub location: Option<String>,
    pub location_details: Option<String>,
    pub roles: serde_json::Value,
    pub revenue_split: Option<serde_json::Value>,
    pub requester_boundaries_acknowledged: bool,
    pub receiver_boundaries_acknowledged: bool,
    pub consent_checklist_completed: bool,
    pub testing_discussion_confirmed: bool,
    pub testing_discussion_notes: Option<String>,
    pub notes: Option<String>,
    pub attachments: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRole {
    pub user_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueShare {
    pub user_id: String,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSplit {
    #[serde(rename = "type")]
    pub split_type: SplitType,
    #[serde(default)]
    pub splits: Vec<RevenueShare>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ForumTopic {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    pub id: i64,
    pub topic_id: i64,
    pub author_id: Option<String>,
    pub title: String,
    pub content: String,
    pub is_anonymous: bool,
    pub is_pinned: bool,
    pub likes_count: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostReply {
    pub id: i64,
    pub post_id: i64,
    pub author_id: Option<String>,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub creator_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: DateTime<Utc>,
    pub is_virtual: bool,
    pub virtual_link: Option<String>,
    pub max_attendees: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    Going,
    Maybe,
    NotGoing,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub id: i64,
    pub event_id: i64,
    pub user_id: String,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "alert_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Scam,
    Impersonator,
    Harassment,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlert {
    pub id: i64,
    pub reporter_id: String,
    pub alert_type: AlertType,
    pub title: String,
    pub description: String,
    pub evidence_urls: Vec<String>,
    pub suspect_name: Option<String>,
    pub suspect_handle: Option<String>,
    pub is_verified: bool,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: i64,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MutedUser {
    pub id: i64,
    pub user_id: String,
    pub muted_user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedUser {
    pub id: i64,
    pub user_id: String,
    pub restricted_user_id: String,
    pub restrictions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RestrictedUser {
    pub fn flags(&self) -> Restrictions {
        Restrictions::from_value(&self.restrictions)
    }
}

/// Per-user restriction flags, stored as a json object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Restrictions {
    pub no_messages: bool,
    pub no_profile_view: bool,
    pub no_collaborations: bool,
}

impl Restrictions {
    /// Unknown keys and malformed values read as "not restricted".
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DraftPost {
    pub id: i64,
    pub user_id: String,
    pub topic_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedItem {
    pub id: i64,
    pub user_id: String,
    pub item_type: String,
    pub item_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub media_type: Option<String>,
    pub archived_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPost {
    pub id: i64,
    pub user_id: String,
    pub original_post_id: Option<i64>,
    pub topic_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub deleted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub permanently_deleted: bool,
}

impl DeletedPost {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "support_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SupportCategory {
    Technical,
    Account,
    Billing,
    Safety,
    Feature,
    Other,
}

impl std::str::FromStr for SupportCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "technical" => Ok(Self::Technical),
            "account" => Ok(Self::Account),
            "billing" => Ok(Self::Billing),
            "safety" => Ok(Self::Safety),
            "feature" => Ok(Self::Feature),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown support category: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: i64,
    pub user_id: Option<String>,
    pub subject: String,
    pub category: SupportCategory,
    pub message: String,
    pub email: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Geospatial bounding box
///
/// When `min_lon > max_lon` the box wraps across the antimeridian and covers
/// `[min_lon, 180]` plus `[-180, max_lon]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.min_lat || lat > self.max_lat {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        }
    }
}

/// Weights for the discovery ranking score
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub distance: f64,
    pub interests: f64,
    pub verified: f64,
    pub activity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            distance: 0.35,
            interests: 0.35,
            verified: 0.15,
            activity: 0.15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restrictions_from_partial_json() {
        let flags = Restrictions::from_value(&serde_json::json!({ "noMessages": true }));
        assert!(flags.no_messages);
        assert!(!flags.no_profile_view);
        assert!(!flags.no_collaborations);
    }

    #[test]
    fn test_restrictions_from_garbage() {
        let flags = Restrictions::from_value(&serde_json::json!("nope"));
        assert_eq!(flags, Restrictions::default());
    }

    #[test]
    fn test_rsvp_status_serde() {
        let status: RsvpStatus = serde_json::from_str("\"not_going\"").unwrap();
        assert_eq!(status, RsvpStatus::NotGoing);
    }

    #[test]
    fn test_support_category_parse() {
        assert_eq!("Billing".parse::<SupportCategory>().unwrap(), SupportCategory::Billing);
        assert!("refunds".parse::<SupportCategory>().is_err());
    }

    #[test]
    fn test_revenue_split_type_key() {
        let split: RevenueSplit = serde_json::from_value(serde_json::json!({
            "type": "percentage",
            "splits": [{ "userId": "a", "percentage": 60.0 }]
        }))
        .unwrap();
        assert_eq!(split.split_type, SplitType::Percentage);
        assert_eq!(split.splits[0].amount, None);
    }
}
