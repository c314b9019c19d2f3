#![allow(dead_code)]

//! Tier catalog and entitlement evaluation.
//!
//! The catalog is a static, immutable table defined once at compile time
//! and shared freely across requests. Every tier value in use resolves to
//! a complete `TierLimits` record; unknown or missing tiers read as free.

use serde::{Deserialize, Serialize};

/// Subscription tier. Stored as a lowercase string on the user row;
/// anything unrecognized resolves to `Free`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl Tier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "pro" => Some(Tier::Pro),
            "enterprise" => Some(Tier::Enterprise),
            _ => None,
        }
    }

    /// Stored tier column to effective tier. Null and unrecognized values
    /// both read as free.
    pub fn parse_or_free(raw: Option<&str>) -> Self {
        raw.and_then(Tier::parse).unwrap_or(Tier::Free)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Free => "Free",
            Tier::Pro => "Pro",
            Tier::Enterprise => "Enterprise",
        }
    }

    /// Feature flags and limits for this tier. Total: every tier resolves
    /// to a complete record.
    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Free => TierLimits {
                monthly_applications: 5,
                ai_resume_builder: false,
                resume_parsing: false,
                interview_prep: false,
                job_recommendations: true,
                cover_letter_generator: false,
                skills_gap_analysis: false,
                chat_assistant: false,
                application_tips: true,
                bulk_apply: false,
                priority_support: false,
                analytics_access: false,
                api_access: false,
                team_features: false,
            },
            Tier::Pro => TierLimits {
                monthly_applications: UNLIMITED,
                ai_resume_builder: true,
                resume_parsing: true,
                interview_prep: true,
                job_recommendations: true,
                cover_letter_generator: true,
                skills_gap_analysis: true,
                chat_assistant: true,
                application_tips: true,
                bulk_apply: true,
                priority_support: false,
                analytics_access: false,
                api_access: false,
                team_features: false,
            },
            Tier::Enterprise => TierLimits {
                monthly_applications: UNLIMITED,
                ai_resume_builder: true,
                resume_parsing: true,
                interview_prep: true,
                job_recommendations: true,
                cover_letter_generator: true,
                skills_gap_analysis: true,
                chat_assistant: true,
                application_tips: true,
                bulk_apply: true,
                priority_support: true,
                analytics_access: true,
                api_access: true,
                team_features: true,
            },
        }
    }
}

/// Sentinel for "no monthly cap".
pub const UNLIMITED: i64 = -1;

/// Entitlement bundle for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierLimits {
    /// Applications per calendar month. -1 means unlimited.
    pub monthly_applications: i64,
    pub ai_resume_builder: bool,
    pub resume_parsing: bool,
    pub interview_prep: bool,
    pub job_recommendations: bool,
    pub cover_letter_generator: bool,
    pub skills_gap_analysis: bool,
    pub chat_assistant: bool,
    pub application_tips: bool,
    pub bulk_apply: bool,
    pub priority_support: bool,
    pub analytics_access: bool,
    pub api_access: bool,
    pub team_features: bool,
}

/// Limits for a stored tier value, defaulting null/unknown to free.
pub fn tier_limits_for(raw: Option<&str>) -> TierLimits {
    Tier::parse_or_free(raw).limits()
}

/// A gateable feature. The serialized keys are the ones the front end
/// sends and displays, so they stay camelCase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    MonthlyApplications,
    AiResumeBuilder,
    ResumeParsing,
    InterviewPrep,
    JobRecommendations,
    CoverLetterGenerator,
    SkillsGapAnalysis,
    ChatAssistant,
    ApplicationTips,
    BulkApply,
    PrioritySupport,
    AnalyticsAccess,
    ApiAccess,
    TeamFeatures,
}

impl Feature {
    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::MonthlyApplications => "Monthly Applications",
            Feature::AiResumeBuilder => "AI Resume Builder",
            Feature::ResumeParsing => "Resume Parsing",
            Feature::InterviewPrep => "Interview Prep",
            Feature::JobRecommendations => "Job Recommendations",
            Feature::CoverLetterGenerator => "Cover Letter Generator",
            Feature::SkillsGapAnalysis => "Skills Gap Analysis",
            Feature::ChatAssistant => "Chat Assistant",
            Feature::ApplicationTips => "Application Tips",
            Feature::BulkApply => "Bulk Apply",
            Feature::PrioritySupport => "Priority Support",
            Feature::AnalyticsAccess => "Application Analytics",
            Feature::ApiAccess => "API Access",
            Feature::TeamFeatures => "Team Features",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Feature::MonthlyApplications => {
                "Number of job applications you can submit per month"
            }
            Feature::AiResumeBuilder => "Generate tailored resumes with AI assistance",
            Feature::ResumeParsing => "Extract structured profile data from uploaded resumes",
            Feature::InterviewPrep => "Practice questions and preparation guides for interviews",
            Feature::JobRecommendations => "Personalized job matches based on your profile",
            Feature::CoverLetterGenerator => "Draft tailored cover letters for each application",
            Feature::SkillsGapAnalysis => "See which skills are missing for your target roles",
            Feature::ChatAssistant => "Ask the career assistant about jobs and applications",
            Feature::ApplicationTips => "Actionable tips to improve each application",
            Feature::BulkApply => "Submit applications to multiple jobs at once",
            Feature::PrioritySupport => "Faster responses from the support team",
            Feature::AnalyticsAccess => "Track application outcomes and response rates",
            Feature::ApiAccess => "Programmatic access to your JobBridge data",
            Feature::TeamFeatures => "Shared workspaces and seats for recruiting teams",
        }
    }
}

/// Whether `tier` can use `feature`.
///
/// Boolean flags read as-is. The one numeric field reads as accessible
/// whenever non-zero: a limit of 0 means the feature is off, while -1
/// (unlimited) and any positive quota mean it is on. Callers checking the
/// actual allowance go through the quota tracker instead.
pub fn has_feature_access(tier: Tier, feature: Feature) -> bool {
    feature_enabled(&tier.limits(), feature)
}

fn feature_enabled(limits: &TierLimits, feature: Feature) -> bool {
    match feature {
        Feature::MonthlyApplications => limits.monthly_applications != 0,
        Feature::AiResumeBuilder => limits.ai_resume_builder,
        Feature::ResumeParsing => limits.resume_parsing,
        Feature::InterviewPrep => limits.interview_prep,
        Feature::JobRecommendations => limits.job_recommendations,
        Feature::CoverLetterGenerator => limits.cover_letter_generator,
        Feature::SkillsGapAnalysis => limits.skills_gap_analysis,
        Feature::ChatAssistant => limits.chat_assistant,
        Feature::ApplicationTips => limits.application_tips,
        Feature::BulkApply => limits.bulk_apply,
        Feature::PrioritySupport => limits.priority_support,
        Feature::AnalyticsAccess => limits.analytics_access,
        Feature::ApiAccess => limits.api_access,
        Feature::TeamFeatures => limits.team_features,
    }
}

/// The tier's monthly application allowance, -1 meaning unlimited.
pub fn monthly_application_limit(tier: Tier) -> i64 {
    tier.limits().monthly_applications
}

/// Lowest tier that unlocks `feature`. Drives upgrade messaging.
pub fn required_tier(feature: Feature) -> Tier {
    [Tier::Free, Tier::Pro, Tier::Enterprise]
        .into_iter()
        .find(|t| has_feature_access(*t, feature))
        .unwrap_or(Tier::Enterprise)
}
