//! Deterministic adapters for tests and `--mock` runs.
//!
//! `MockLlm` returns canned drafts for a creator-tooling product so the
//! whole pipeline can run offline with stable output. `MockChannel` assigns
//! sequential post ids and deterministic metrics. `RecordingNotifier`
//! captures what would have been sent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::analysis::{Analysis, Competitor, Persona, SolutionMapping};
use crate::engagement::{Engagement, FeedbackReport};
use crate::error::Result;
use crate::content::ChannelGuide;
use crate::ports::{
    AnalysisDraft, CalendarItemDraft, ChannelPort, ContentPlanDraft, EngagementSnapshot, LlmPort,
    Notification, NotificationPort, PostDraft, PublishedPost, StrategyDraft,
};
use crate::strategy::{
    ChannelStrategy, FunnelHypothesis, KeyMessage, Positioning, Strategy,
};
use crate::types::{ContentType, Frequency, Level, Tone};

// ---------------------------------------------------------------------------
// MockLlm
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockLlm;

impl MockLlm {
    pub fn new() -> Self {
        Self
    }

    pub fn canned_analysis(&self) -> AnalysisDraft {
        AnalysisDraft {
            domain: "Creator SaaS".into(),
            personas: vec![
                Persona {
                    name: "First-time creator".into(),
                    description: "Publishes sporadically, no content system yet".into(),
                    pain: "Struggles to plan content".into(),
                    need: "Idea generation and a repeatable calendar".into(),
                    behavior: vec!["watches tutorials".into(), "posts weekly at best".into()],
                    demographics: None,
                },
                Persona {
                    name: "Mid-tier creator".into(),
                    description: "Steady audience, flat revenue".into(),
                    pain: "Cannot monetize a plateaued audience".into(),
                    need: "A monetization playbook".into(),
                    behavior: vec!["tracks analytics daily".into()],
                    demographics: None,
                },
            ],
            pains: vec![
                "Content planning is hard".into(),
                "Subscriber growth has stalled".into(),
                "No clear path to revenue".into(),
            ],
            solution_map: vec![
                SolutionMapping {
                    pain: "Content planning is hard".into(),
                    solution: "Generated content calendar from a single brief".into(),
                    priority: Level::High,
                    effort: Level::Medium,
                    impact: Level::High,
                },
                SolutionMapping {
                    pain: "Subscriber growth has stalled".into(),
                    solution: "Personalized growth recommendations".into(),
                    priority: Level::Medium,
                    effort: Level::Medium,
                    impact: Level::Medium,
                },
            ],
            competitors: vec![Competitor {
                name: "Creator Tools Inc".into(),
                strengths: vec!["brand recognition".into()],
                weaknesses: vec!["no planning features".into()],
                market_share: Some(0.18),
                pricing: Some("$29/mo".into()),
            }],
        }
    }

    pub fn canned_strategy(&self) -> StrategyDraft {
        StrategyDraft {
            positioning: Positioning {
                target: "Creators with under 100k subscribers".into(),
                benefit: "A content strategy generated from one brief".into(),
                differentiation: "Plans, schedules, and measures in one loop".into(),
                proof: vec!["closed-loop metrics".into(), "channel-native output".into()],
                value_proposition: Some("Grow audience and revenue together".into()),
            },
            key_messages: vec![
                KeyMessage {
                    message: "Your content strategy, generated".into(),
                    tone: Tone::Professional,
                    use_case: "landing page hero".into(),
                    channel: Some("linkedin".into()),
                    priority: 1,
                },
                KeyMessage {
                    message: "Stop guessing what to post next".into(),
                    tone: Tone::Casual,
                    use_case: "short-form opener".into(),
                    channel: Some("tiktok".into()),
                    priority: 2,
                },
            ],
            channel_mix: vec![
                ChannelStrategy {
                    channel: "youtube".into(),
                    strategy: "Build trust with educational deep dives".into(),
                    content_types: vec![ContentType::Educational],
                    frequency: Frequency::Weekly,
                    goals: vec!["authority".into()],
                    budget: 500.0,
                    expected_roi: 1.8,
                },
                ChannelStrategy {
                    channel: "instagram".into(),
                    strategy: "Behind-the-scenes of the product".into(),
                    content_types: vec![ContentType::BehindScenes],
                    frequency: Frequency::Daily,
                    goals: vec!["reach".into()],
                    budget: 200.0,
                    expected_roi: 1.2,
                },
            ],
            funnel_hypothesis: FunnelHypothesis {
                awareness: "Educational content raises brand recall".into(),
                interest: "Free planning tool captures emails".into(),
                consideration: "Case studies build trust".into(),
                conversion: "Limited trial converts".into(),
                retention: "Weekly performance digests keep users engaged".into(),
            },
        }
    }

    pub fn canned_plan(&self) -> ContentPlanDraft {
        ContentPlanDraft {
            calendar: vec![
                CalendarItemDraft {
                    date: NaiveDate::from_ymd_opt(2026, 9, 7).unwrap(),
                    channel: "youtube".into(),
                    title: "Build a content strategy in ten minutes".into(),
                    content_type: ContentType::Educational,
                    priority: 1,
                },
                CalendarItemDraft {
                    date: NaiveDate::from_ymd_opt(2026, 9, 9).unwrap(),
                    channel: "instagram".into(),
                    title: "A day building the planner".into(),
                    content_type: ContentType::BehindScenes,
                    priority: 2,
                },
                CalendarItemDraft {
                    date: NaiveDate::from_ymd_opt(2026, 9, 11).unwrap(),
                    channel: "tiktok".into(),
                    title: "Three content ideas in three minutes".into(),
                    content_type: ContentType::Entertainment,
                    priority: 3,
                },
            ],
            channel_guides: vec![ChannelGuide {
                channel: "youtube".into(),
                hooks: vec!["This one video changes your content strategy".into()],
                hashtags: vec!["#creators".into(), "#contentstrategy".into()],
                cta: "Start planning — link in the description".into(),
                best_practices: vec!["front-load the payoff".into()],
            }],
        }
    }
}

impl LlmPort for MockLlm {
    fn analyze_prd(&self, _prd: &str) -> Result<AnalysisDraft> {
        Ok(self.canned_analysis())
    }

    fn craft_strategy(&self, _analysis: &Analysis) -> Result<StrategyDraft> {
        Ok(self.canned_strategy())
    }

    fn plan_content(&self, _strategy: &Strategy) -> Result<ContentPlanDraft> {
        Ok(self.canned_plan())
    }

    fn analyze_feedback(&self, engagements: &[Engagement]) -> Result<FeedbackReport> {
        let total_conversions: u64 = engagements.iter().map(|e| e.conversions).sum();
        Ok(FeedbackReport {
            insights: vec![
                "Educational content outperformed other formats".into(),
                format!("{total_conversions} conversions captured this run"),
            ],
            recommendations: vec![
                "Shift budget toward the top-performing channel".into(),
                "Post during evening engagement peaks".into(),
            ],
        })
    }
}

// ---------------------------------------------------------------------------
// MockChannel
// ---------------------------------------------------------------------------

/// Assigns sequential post ids and returns metrics derived from the id, so
/// repeated runs are comparable.
#[derive(Default)]
pub struct MockChannel {
    counter: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChannelPort for MockChannel {
    fn publish(&self, draft: &PostDraft) -> Result<PublishedPost> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PublishedPost {
            post_id: format!("{}-{n}", draft.channel),
            url: format!("https://example.com/{}/{n}", draft.channel),
        })
    }

    fn fetch_metrics(&self, post_id: &str) -> Result<EngagementSnapshot> {
        // Seed the numbers from the post id suffix for determinism.
        let seed: u64 = post_id
            .rsplit('-')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        Ok(EngagementSnapshot {
            impressions: 1000 * seed,
            clicks: 40 * seed,
            likes: 25 * seed,
            shares: 6 * seed,
            comments: 3 * seed,
            conversions: 2 * seed,
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier log poisoned").clone()
    }
}

impl NotificationPort for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .expect("notifier log poisoned")
            .push(notification.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
