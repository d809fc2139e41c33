use chrono::{DateTime, Duration, Utc};
use std::str::FromStr;

use crate::models::Profile;

/// Percentage (0-100) of the nine key profile fields that are filled in
pub fn profile_completion(profile: Option<&Profile>) -> u8 {
    let Some(p) = profile else {
        return 0;
    };

    fn filled(value: &Option<String>) -> bool {
        value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
    }

    let fields = [
        filled(&p.bio),
        filled(&p.niche),
        filled(&p.location),
        p.birth_date.is_some(),
        filled(&p.gender),
        filled(&p.looking_for),
        !p.interests.is_empty(),
        filled(&p.occupation),
        filled(&p.education),
    ];

    let count = fields.iter().filter(|f| **f).count();
    ((count * 100) / fields.len()) as u8
}

/// Messages sent as a percentage of messages received, capped at 100
pub fn response_rate(messages_sent: i64, messages_received: i64) -> u8 {
    if messages_received <= 0 {
        return 0;
    }
    let rate = (messages_sent.max(0) * 100) / messages_received;
    rate.min(100) as u8
}

/// Look-back window for the recent connections view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecentPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl RecentPeriod {
    /// Earliest timestamp included in the window
    pub fn threshold(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecentPeriod::Day => now - Duration::hours(24),
            RecentPeriod::Week => now - Duration::weeks(1),
            RecentPeriod::Month => now - Duration::days(30),
        }
    }
}

impl FromStr for RecentPeriod {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "24h" => Ok(RecentPeriod::Day),
            "week" => Ok(RecentPeriod::Week),
            "month" => Ok(RecentPeriod::Month),
            other => Err(format!("period must be one of 24h, week, month (got {})", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_completion() {
        assert_eq!(profile_completion(None), 0);

        let mut p = Profile::blank("u");
        assert_eq!(profile_completion(Some(&p)), 0);

        p.bio = Some("hello".into());
        p.niche = Some("fitness".into());
        p.location = Some("Berlin".into());
        assert_eq!(profile_completion(Some(&p)), 33);

        p.bio = Some("   ".into());
        assert_eq!(profile_completion(Some(&p)), 22);
    }

    #[test]
    fn test_response_rate() {
        assert_eq!(response_rate(5, 0), 0);
        assert_eq!(response_rate(1, 4), 25);
        assert_eq!(response_rate(10, 4), 100);
    }

    #[test]
    fn test_recent_period() {
        let now = Utc::now();
        assert_eq!("24h".parse::<RecentPeriod>().unwrap(), RecentPeriod::Day);
        assert!("year".parse::<RecentPeriod>().is_err());
        assert_eq!(RecentPeriod::Month.threshold(now), now - Duration::days(30));
        assert_eq!(RecentPeriod::default(), RecentPeriod::Day);
    }
}
