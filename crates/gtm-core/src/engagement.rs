use crate::ports::EngagementSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Engagement metrics captured for one published content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: Uuid,
    pub content_item_id: Uuid,
    pub impressions: u64,
    pub clicks: u64,
    pub ctr: f64,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub conversions: u64,
    pub captured_at: DateTime<Utc>,
}

impl Engagement {
    pub fn from_snapshot(content_item_id: Uuid, snap: EngagementSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            content_item_id,
            impressions: snap.impressions,
            clicks: snap.clicks,
            ctr: Self::ctr_of(snap.impressions, snap.clicks),
            likes: snap.likes,
            shares: snap.shares,
            comments: snap.comments,
            conversions: snap.conversions,
            captured_at: Utc::now(),
        }
    }

    /// Click-through rate; zero impressions yields 0.0 rather than NaN.
    pub fn ctr_of(impressions: u64, clicks: u64) -> f64 {
        if impressions == 0 {
            0.0
        } else {
            clicks as f64 / impressions as f64
        }
    }

    /// Return on investment given per-conversion revenue and total cost.
    pub fn roi(&self, revenue_per_conversion: f64, cost: f64) -> f64 {
        if cost == 0.0 {
            return 0.0;
        }
        let revenue = self.conversions as f64 * revenue_per_conversion;
        (revenue - cost) / cost
    }
}

/// Insights and next actions derived from a run's engagement metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(impressions: u64, clicks: u64, conversions: u64) -> EngagementSnapshot {
        EngagementSnapshot {
            impressions,
            clicks,
            likes: 10,
            shares: 2,
            comments: 1,
            conversions,
        }
    }

    #[test]
    fn ctr_is_derived_not_trusted() {
        let e = Engagement::from_snapshot(Uuid::new_v4(), snapshot(200, 10, 3));
        assert!((e.ctr - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn ctr_with_zero_impressions_is_zero() {
        assert_eq!(Engagement::ctr_of(0, 5), 0.0);
    }

    #[test]
    fn roi_accounts_for_cost() {
        let e = Engagement::from_snapshot(Uuid::new_v4(), snapshot(100, 10, 4));
        // 4 conversions * 50 revenue = 200; (200 - 100) / 100 = 1.0
        assert!((e.roi(50.0, 100.0) - 1.0).abs() < f64::EPSILON);
        assert_eq!(e.roi(50.0, 0.0), 0.0);
    }
}
