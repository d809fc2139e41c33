use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{
    Collaboration, CollaborationWorkspace, DeletedPost, Event, EventAttendee, ForumTopic, Like,
    Match, Message, Profile, SafetyAlert, User, UserSummary,
};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
}

/// Profile joined with its owner's public fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Discovery result with its ranking details
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: Option<UserSummary>,
    pub distance_km: Option<f64>,
    pub match_score: f64,
    pub shared_interests: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub user: Option<UserSummary>,
    pub shared_interests: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationCount {
    pub location: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedProfileView {
    pub id: i64,
    pub saved_user_id: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
    pub profile: Option<Profile>,
}

/// A like either stands alone or completes a match.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum LikeOutcome {
    Matched {
        #[serde(rename = "match")]
        matched: Match,
        like: Like,
    },
    Liked(Like),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedLike {
    #[serde(flatten)]
    pub like: Like,
    pub liker: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub matched: Match,
    pub user1: Option<UserSummary>,
    pub user2: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationView {
    #[serde(flatten)]
    pub collaboration: Collaboration,
    pub requester: Option<UserSummary>,
    pub receiver: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    #[serde(flatten)]
    pub workspace: CollaborationWorkspace,
    pub collaboration: Collaboration,
    pub can_edit: bool,
    pub requester_boundaries: serde_json::Value,
    pub receiver_boundaries: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i64,
    pub topic_id: i64,
    pub title: String,
    pub content: String,
    pub is_anonymous: bool,
    pub is_pinned: bool,
    pub likes_count: i32,
    pub replies_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// None when the post is anonymous
    pub author: Option<UserSummary>,
    pub topic: Option<ForumTopic>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicWithCount {
    #[serde(flatten)]
    pub topic: ForumTopic,
    pub post_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostLikeResponse {
    pub is_liked: bool,
    pub likes_count: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummaryView {
    #[serde(flatten)]
    pub event: Event,
    pub attendee_count: i64,
    pub creator: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeView {
    #[serde(flatten)]
    pub attendee: EventAttendee,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailView {
    #[serde(flatten)]
    pub event: Event,
    pub creator: Option<UserSummary>,
    pub attendees: Vec<AttendeeView>,
    pub going_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlertView {
    #[serde(flatten)]
    pub alert: SafetyAlert,
    pub reporter: Option<UserSummary>,
}

/// Follow, mute, bookmark or recent-connection entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEntry {
    pub id: i64,
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedEntry {
    pub id: i64,
    pub user: Option<UserSummary>,
    pub restrictions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecentKind {
    Follow,
    Collaboration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentConnection {
    /// `follow_{id}` or `collab_{id}`
    pub id: String,
    pub kind: RecentKind,
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedPostView {
    #[serde(flatten)]
    pub post: DeletedPost,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultResponse {
    pub drafts: Vec<crate::models::domain::DraftPost>,
    pub archived: Vec<crate::models::domain::ArchivedItem>,
    pub deleted: Vec<DeletedPostView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicketResponse {
    pub message: String,
    pub ticket_id: i64,
}

/// Raw activity counters for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
    pub profile_views: i64,
    pub likes_sent: i64,
    pub likes_received: i64,
    pub matches: i64,
    pub messages_sent: i64,
    pub messages_received: i64,
    pub posts: i64,
    pub post_likes_received: i64,
    pub replies: i64,
    pub collaborations_sent: i64,
    pub collaborations_received: i64,
    pub followers: i64,
    pub following: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub counts: ActivityCounts,
    pub collaborations_total: i64,
    pub account_created_at: DateTime<Utc>,
    pub account_age_days: i64,
    pub last_active: DateTime<Utc>,
    pub profile_completion: u8,
    pub response_rate: u8,
}
