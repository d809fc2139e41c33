use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{
    AlertType, CollaborationStatus, Restrictions, RevenueSplit, RsvpStatus, ShootDate,
    WorkspaceRole,
};

/// Passwords are bounded in bytes, not characters, so Argon2 input stays small.
fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.len();
    if !(8..=100).contains(&len) {
        let mut err = ValidationError::new("password_length");
        err.message = Some("Password must be between 8 and 100 bytes".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

// Auth

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    #[serde(alias = "last_name")]
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "current_password")]
    pub current_password: String,
    #[validate(custom(function = "validate_password"))]
    #[serde(alias = "new_password")]
    pub new_password: String,
}

// Profiles

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(length(max = 100))]
    #[serde(alias = "display_name")]
    pub display_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 100))]
    pub niche: Option<String>,
    #[validate(url)]
    #[serde(alias = "portfolio_url")]
    pub portfolio_url: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[serde(alias = "social_links")]
    pub social_links: Option<serde_json::Value>,
    #[validate(length(max = 30))]
    pub tags: Option<Vec<String>>,
    #[serde(alias = "is_nsfw")]
    pub is_nsfw: Option<bool>,
    #[serde(alias = "birth_date")]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub gender: Option<String>,
    #[validate(length(max = 100))]
    #[serde(alias = "looking_for")]
    pub looking_for: Option<String>,
    #[validate(length(max = 30))]
    pub interests: Option<Vec<String>>,
    #[validate(range(min = 50, max = 300))]
    pub height: Option<i32>,
    #[validate(length(max = 200))]
    pub occupation: Option<String>,
    #[validate(length(max = 200))]
    pub education: Option<String>,
    #[validate(length(max = 12))]
    pub photos: Option<Vec<String>>,
    #[serde(alias = "is_visible")]
    pub is_visible: Option<bool>,
    #[serde(alias = "privacy_settings")]
    pub privacy_settings: Option<serde_json::Value>,
    #[validate(range(min = 18, max = 120))]
    #[serde(alias = "min_age_preference")]
    pub min_age_preference: Option<i32>,
    #[validate(range(min = 18, max = 120))]
    #[serde(alias = "max_age_preference")]
    pub max_age_preference: Option<i32>,
    #[validate(range(min = 1, max = 20000))]
    #[serde(alias = "max_distance")]
    pub max_distance: Option<i32>,
    #[serde(alias = "gender_preference")]
    pub gender_preference: Option<Vec<String>>,
    pub boundaries: Option<serde_json::Value>,
    #[validate(length(max = 50))]
    #[serde(alias = "experience_level")]
    pub experience_level: Option<String>,
    #[validate(length(max = 50))]
    pub availability: Option<String>,
    #[validate(length(max = 50))]
    #[serde(alias = "travel_mode")]
    pub travel_mode: Option<String>,
    #[validate(length(max = 50))]
    #[serde(alias = "monetization_expectation")]
    pub monetization_expectation: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationUpdateRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[validate(range(min = 0.1, max = 20000.0))]
    #[serde(alias = "max_distance")]
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverQuery {
    #[validate(range(min = 0.1, max = 20000.0))]
    #[serde(alias = "max_distance")]
    pub max_distance: Option<f64>,
    #[serde(alias = "content_type")]
    pub content_type: Option<String>,
    /// Comma-separated any-of list
    #[serde(alias = "experience_level")]
    pub experience_level: Option<String>,
    pub availability: Option<String>,
    #[serde(alias = "travel_mode")]
    pub travel_mode: Option<String>,
    pub monetization: Option<String>,
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

// Matching

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "liked_id")]
    pub liked_id: String,
    #[serde(default, alias = "is_super_like")]
    pub is_super_like: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PassRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "passed_id")]
    pub passed_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 5000), custom(function = "validate_not_blank"))]
    pub content: String,
    #[validate(length(min = 1, max = 20))]
    #[serde(alias = "message_type")]
    pub message_type: Option<String>,
    #[validate(url)]
    #[serde(alias = "media_url")]
    pub media_url: Option<String>,
}

// Moderation

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "blocked_id")]
    pub blocked_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "reported_id")]
    pub reported_id: String,
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

// Collaborations

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollaborationRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "receiver_id")]
    pub receiver_id: String,
    #[validate(length(min = 1, max = 2000), custom(function = "validate_not_blank"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCollaborationStatusRequest {
    pub status: CollaborationStatus,
}

/// Partial workspace update
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUpdateRequest {
    #[validate(length(max = 5000))]
    pub concept: Option<String>,
    #[serde(alias = "shoot_dates")]
    pub shoot_dates: Option<Vec<ShootDate>>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(alias = "location_details")]
    pub location_details: Option<String>,
    pub roles: Option<Vec<WorkspaceRole>>,
    #[serde(alias = "revenue_split")]
    pub revenue_split: Option<RevenueSplit>,
    #[serde(alias = "consent_checklist_completed")]
    pub consent_checklist_completed: Option<bool>,
    #[serde(alias = "testing_discussion_confirmed")]
    pub testing_discussion_confirmed: Option<bool>,
    #[validate(length(max = 2000))]
    #[serde(alias = "testing_discussion_notes")]
    pub testing_discussion_notes: Option<String>,
    #[validate(length(max = 10000))]
    pub notes: Option<String>,
    pub attachments: Option<Vec<serde_json::Value>>,
}

// Community

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 300), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 20000), custom(function = "validate_not_blank"))]
    pub content: String,
    #[serde(default, alias = "is_anonymous")]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 5000), custom(function = "validate_not_blank"))]
    pub content: String,
    #[serde(default, alias = "is_anonymous")]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateForumTopicRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(length(max = 50))]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Validate)]
pub struct PaginationQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit_or(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }
}

// Events

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 300))]
    pub location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(alias = "event_date")]
    pub event_date: DateTime<Utc>,
    #[serde(default, alias = "is_virtual")]
    pub is_virtual: bool,
    #[validate(url)]
    #[serde(alias = "virtual_link")]
    pub virtual_link: Option<String>,
    #[validate(range(min = 1))]
    #[serde(alias = "max_attendees")]
    pub max_attendees: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub location: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(alias = "event_date")]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(alias = "is_virtual")]
    pub is_virtual: Option<bool>,
    #[validate(url)]
    #[serde(alias = "virtual_link")]
    pub virtual_link: Option<String>,
    #[validate(range(min = 1))]
    #[serde(alias = "max_attendees")]
    pub max_attendees: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    #[serde(alias = "start_date")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "end_date")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(alias = "is_virtual")]
    pub is_virtual: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpRequest {
    pub status: RsvpStatus,
}

// Safety alerts

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSafetyAlertRequest {
    #[serde(alias = "alert_type")]
    pub alert_type: AlertType,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(max = 10))]
    #[serde(default, alias = "evidence_urls")]
    pub evidence_urls: Vec<String>,
    #[validate(length(max = 200))]
    #[serde(alias = "suspect_name")]
    pub suspect_name: Option<String>,
    #[validate(length(max = 200))]
    #[serde(alias = "suspect_handle")]
    pub suspect_handle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlertsQuery {
    #[serde(alias = "alert_type")]
    pub alert_type: Option<AlertType>,
}

// Connections

#[derive(Debug, Clone, Deserialize)]
pub struct RestrictionUpdateRequest {
    #[serde(default)]
    pub restrictions: Restrictions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub period: Option<String>,
}

// Vault

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[validate(length(max = 300))]
    pub title: Option<String>,
    #[validate(length(max = 20000))]
    pub content: Option<String>,
    #[serde(alias = "topic_id")]
    pub topic_id: Option<i64>,
}

// Support

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SupportRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub subject: String,
    /// Parsed in the handler so an unknown value maps to "Invalid category".
    pub category: String,
    #[validate(length(min = 1, max = 5000), custom(function = "validate_not_blank"))]
    pub message: String,
    #[validate(email)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_is_counted_in_bytes() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
        // 26 four-byte characters is 104 bytes
        assert!(validate_password(&"😀".repeat(26)).is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "L".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_profile_update_accepts_snake_and_camel_case() {
        let camel: ProfileUpdateRequest =
            serde_json::from_str(r#"{"displayName":"A","travelMode":"local"}"#).unwrap();
        let snake: ProfileUpdateRequest =
            serde_json::from_str(r#"{"display_name":"A","travel_mode":"local"}"#).unwrap();
        assert_eq!(camel.display_name, snake.display_name);
        assert_eq!(camel.travel_mode.as_deref(), Some("local"));
        assert_eq!(snake.travel_mode.as_deref(), Some("local"));
    }

    #[test]
    fn test_blank_message_rejected() {
        let req = SendMessageRequest {
            content: "   ".to_string(),
            message_type: None,
            media_url: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_location_range() {
        let req = LocationUpdateRequest { latitude: 91.0, longitude: 0.0 };
        assert!(req.validate().is_err());
        let req = LocationUpdateRequest { latitude: 51.5, longitude: -0.12 };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_pagination_defaults() {
        let q = PaginationQuery::default();
        assert_eq!(q.limit_or(20), 20);
        assert_eq!(q.offset(), 0);
        let q = PaginationQuery { limit: Some(500), offset: None };
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_rsvp_request_rejects_unknown_status() {
        assert!(serde_json::from_str::<RsvpRequest>(r#"{"status":"perhaps"}"#).is_err());
    }
}
