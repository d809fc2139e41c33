use thiserror::Error;

use crate::models::{
    Collaboration, CollaborationStatus, RevenueSplit, ShootDate, SplitType, WorkspaceRole,
};

/// Rules a workspace update can break
#[derive(Debug, Error, PartialEq)]
pub enum WorkspaceRuleError {
    #[error("Percentage for {0} must be between 0 and 100")]
    PercentageOutOfRange(String),

    #[error("Percentages add up to {0}, which exceeds 100")]
    PercentageTotalExceeded(f64),

    #[error("Amount for {0} must not be negative")]
    NegativeAmount(String),

    #[error("{0} is not part of this collaboration")]
    NotAParticipant(String),

    #[error("Workspace can only be edited once the collaboration is accepted")]
    NotAccepted,
}

/// Only accepted collaborations have an editable workspace
pub fn ensure_editable(collaboration: &Collaboration) -> Result<(), WorkspaceRuleError> {
    if collaboration.status == CollaborationStatus::Accepted {
        Ok(())
    } else {
        Err(WorkspaceRuleError::NotAccepted)
    }
}

pub fn validate_revenue_split(
    split: &RevenueSplit,
    collaboration: &Collaboration,
) -> Result<(), WorkspaceRuleError> {
    let mut total = 0.0;

    for share in &split.splits {
        if !collaboration.involves(&share.user_id) {
            return Err(WorkspaceRuleError::NotAParticipant(share.user_id.clone()));
        }
        if let Some(pct) = share.percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(WorkspaceRuleError::PercentageOutOfRange(share.user_id.clone()));
            }
            total += pct;
        }
        if let Some(amount) = share.amount {
            if amount < 0.0 {
                return Err(WorkspaceRuleError::NegativeAmount(share.user_id.clone()));
            }
        }
    }

    // Allow for float noise like 33.33 + 33.33 + 33.34
    if split.split_type == SplitType::Percentage && total > 100.0 + 1e-6 {
        return Err(WorkspaceRuleError::PercentageTotalExceeded(total));
    }

    Ok(())
}

pub fn validate_roles(
    roles: &[WorkspaceRole],
    collaboration: &Collaboration,
) -> Result<(), WorkspaceRuleError> {
    match roles.iter().find(|r| !collaboration.involves(&r.user_id)) {
        Some(role) => Err(WorkspaceRuleError::NotAParticipant(role.user_id.clone())),
        None => Ok(()),
    }
}

/// Shoot dates are stored in chronological order
pub fn sort_shoot_dates(mut dates: Vec<ShootDate>) -> Vec<ShootDate> {
    dates.sort_by_key(|d| d.date);
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RevenueShare;
    use chrono::{NaiveDate, Utc};

    fn collaboration(status: CollaborationStatus) -> Collaboration {
        Collaboration {
            id: 1,
            requester_id: "alice".into(),
            receiver_id: "bob".into(),
            status,
            message: "shoot?".into(),
            acknowledged_by_requester: false,
            acknowledged_by_receiver: false,
            created_at: Utc::now(),
        }
    }

    fn share(user: &str, percentage: Option<f64>, amount: Option<f64>) -> RevenueShare {
        RevenueShare {
            user_id: user.into(),
            percentage,
            amount,
        }
    }

    #[test]
    fn test_ensure_editable() {
        assert!(ensure_editable(&collaboration(CollaborationStatus::Accepted)).is_ok());
        assert_eq!(
            ensure_editable(&collaboration(CollaborationStatus::Pending)),
            Err(WorkspaceRuleError::NotAccepted)
        );
    }

    #[test]
    fn test_percentage_split_total() {
        let collab = collaboration(CollaborationStatus::Accepted);
        let ok = RevenueSplit {
            split_type: SplitType::Percentage,
            splits: vec![share("alice", Some(60.0), None), share("bob", Some(40.0), None)],
        };
        assert!(validate_revenue_split(&ok, &collab).is_ok());

        let over = RevenueSplit {
            split_type: SplitType::Percentage,
            splits: vec![share("alice", Some(70.0), None), share("bob", Some(40.0), None)],
        };
        assert!(matches!(
            validate_revenue_split(&over, &collab),
            Err(WorkspaceRuleError::PercentageTotalExceeded(_))
        ));
    }

    #[test]
    fn test_split_rejects_bad_values() {
        let collab = collaboration(CollaborationStatus::Accepted);
        let out_of_range = RevenueSplit {
            split_type: SplitType::Equal,
            splits: vec![share("alice", Some(120.0), None)],
        };
        assert_eq!(
            validate_revenue_split(&out_of_range, &collab),
            Err(WorkspaceRuleError::PercentageOutOfRange("alice".into()))
        );

        let negative = RevenueSplit {
            split_type: SplitType::Fixed,
            splits: vec![share("bob", None, Some(-5.0))],
        };
        assert_eq!(
            validate_revenue_split(&negative, &collab),
            Err(WorkspaceRuleError::NegativeAmount("bob".into()))
        );

        let stranger = RevenueSplit {
            split_type: SplitType::Fixed,
            splits: vec![share("mallory", None, Some(5.0))],
        };
        assert_eq!(
            validate_revenue_split(&stranger, &collab),
            Err(WorkspaceRuleError::NotAParticipant("mallory".into()))
        );
    }

    #[test]
    fn test_sort_shoot_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        let dates = vec![
            ShootDate { date: d(2025, 6, 2), description: "b".into() },
            ShootDate { date: d(2025, 5, 30), description: "a".into() },
        ];
        let sorted = sort_shoot_dates(dates);
        assert_eq!(sorted[0].description, "a");
    }
}
