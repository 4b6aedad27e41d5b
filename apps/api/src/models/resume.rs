use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

pub const INITIAL_CHANGE_NOTE: &str = "Initial creation";
pub const DEFAULT_CHANGE_NOTE: &str = "Updated resume";

// ────────────────────────────────────────────────────────────────────────────
// Content
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
}

// Dates are kept as entered ("2021", "03/2021", "Present").

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub gpa: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkillEntry {
    pub category: String,
    pub items: Vec<String>,
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectEntry {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CertificationEntry {
    pub name: String,
    pub issuer: String,
    pub date_issued: Option<String>,
    pub date_expires: Option<String>,
    pub credential_id: Option<String>,
    pub url: Option<String>,
}

/// The structured body of a resume. Every list keeps the user's ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResumeContent {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
    pub projects: Vec<ProjectEntry>,
    pub certifications: Vec<CertificationEntry>,
}

impl ResumeContent {
    /// Empty content with personal info seeded from what the identity
    /// provider knows about the owner.
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            personal_info: PersonalInfo {
                full_name: identity.display_name.clone().unwrap_or_default(),
                email: identity.email.clone().unwrap_or_default(),
                ..PersonalInfo::default()
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    pub font_family: String,
    pub font_size: u8,
    pub primary_color: String,
    pub line_spacing: f32,
    pub section_order: Vec<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 11,
            primary_color: "#1f2937".to_string(),
            line_spacing: 1.15,
            section_order: [
                "summary",
                "experience",
                "education",
                "skills",
                "projects",
                "certifications",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionEntry {
    pub version: u32,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub change_note: String,
}

/// Stored at `users/{owner_id}/resumes/{id}`.
///
/// `version` starts at 1 and grows by exactly one per update; each update
/// appends one [`VersionEntry`]. History is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resume {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub template_id: Option<String>,
    #[serde(default)]
    pub content: ResumeContent,
    #[serde(default)]
    pub settings: DisplaySettings,
    pub version: u32,
    #[serde(default)]
    pub version_history: Vec<VersionEntry>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Input to `create_resume`. A caller-chosen `id` makes the create
/// replayable: retrying with the same id does not insert a second resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewResume {
    pub id: Option<String>,
    pub title: String,
    pub template_id: Option<String>,
    pub content: Option<ResumeContent>,
    pub settings: Option<DisplaySettings>,
}

/// Partial update applied by `update_resume`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumePatch {
    pub title: Option<String>,
    /// `Some("")` clears the template.
    pub template_id: Option<String>,
    pub content: Option<ResumeContent>,
    pub settings: Option<DisplaySettings>,
    pub change_note: Option<String>,
    /// When set, the update is rejected unless the stored version matches.
    pub expected_version: Option<u32>,
}

impl ResumePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.template_id.is_none()
            && self.content.is_none()
            && self.settings.is_none()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared projection
// ────────────────────────────────────────────────────────────────────────────

/// Public, point-in-time copy of a resume, stored at `shared_resumes/{resume_id}`.
/// Later edits to the source do not reach it until it is shared again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedResume {
    pub resume_id: String,
    pub owner_id: String,
    pub title: String,
    pub template_id: Option<String>,
    pub content: ResumeContent,
    pub view_count: u64,
    pub public_url: String,
    #[serde(with = "ts_milliseconds")]
    pub shared_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SharedResume {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_content_seeded_from_identity() {
        let identity = Identity {
            id: "u1".into(),
            email: Some("grace@example.com".into()),
            display_name: Some("Grace Hopper".into()),
            photo_url: None,
        };
        let content = ResumeContent::for_identity(&identity);
        assert_eq!(content.personal_info.full_name, "Grace Hopper");
        assert_eq!(content.personal_info.email, "grace@example.com");
        assert!(content.education.is_empty());
        assert!(content.experience.is_empty());
        assert!(content.skills.is_empty());
        assert!(content.projects.is_empty());
        assert!(content.certifications.is_empty());
    }

    #[test]
    fn test_patch_without_fields_is_empty() {
        let patch = ResumePatch {
            change_note: Some("nothing".into()),
            expected_version: Some(3),
            ..Default::default()
        };
        assert!(patch.is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut shared = SharedResume {
            resume_id: "r1".into(),
            owner_id: "u1".into(),
            title: "CV".into(),
            template_id: None,
            content: ResumeContent::default(),
            view_count: 0,
            public_url: "http://localhost/shared/r1".into(),
            shared_at: now,
            expires_at: None,
        };
        assert!(!shared.is_expired(now));
        shared.expires_at = Some(now + Duration::days(1));
        assert!(!shared.is_expired(now));
        shared.expires_at = Some(now - Duration::seconds(1));
        assert!(shared.is_expired(now));
    }

    #[test]
    fn test_timestamps_stored_as_millis() {
        let shared = SharedResume {
            resume_id: "r1".into(),
            owner_id: "u1".into(),
            title: "CV".into(),
            template_id: None,
            content: ResumeContent::default(),
            view_count: 0,
            public_url: String::new(),
            shared_at: DateTime::<Utc>::from_timestamp_millis(1_700_000_000_000).unwrap(),
            expires_at: None,
        };
        let json = serde_json::to_value(&shared).unwrap();
        assert_eq!(json["shared_at"], 1_700_000_000_000_i64);
        assert!(json["expires_at"].is_null());
    }
}
