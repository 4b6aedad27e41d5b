use chrono::{DateTime, Utc};

use crate::models::resume::{
    NewResume, Resume, ResumeContent, ResumePatch, VersionEntry, DEFAULT_CHANGE_NOTE,
    INITIAL_CHANGE_NOTE,
};

/// Builds version 1 of a resume with its single "Initial creation" entry.
/// `new.title` is expected to be validated already.
pub fn initial_revision(
    id: String,
    owner_id: &str,
    new: NewResume,
    default_content: ResumeContent,
    now: DateTime<Utc>,
) -> Resume {
    Resume {
        id,
        owner_id: owner_id.to_string(),
        title: new.title,
        template_id: new.template_id,
        content: new.content.unwrap_or(default_content),
        settings: new.settings.unwrap_or_default(),
        version: 1,
        version_history: vec![VersionEntry {
            version: 1,
            timestamp: now,
            change_note: INITIAL_CHANGE_NOTE.to_string(),
        }],
        is_public: false,
        created_at: now,
        updated_at: now,
    }
}

/// Applies `patch` on top of `current`: bumps the version by one and appends
/// exactly one history entry. Earlier history entries are carried over
/// untouched.
pub fn next_revision(current: &Resume, patch: &ResumePatch, now: DateTime<Utc>) -> Resume {
    let mut next = current.clone();
    if let Some(title) = &patch.title {
        next.title = title.clone();
    }
    if let Some(template_id) = &patch.template_id {
        next.template_id = (!template_id.is_empty()).then(|| template_id.clone());
    }
    if let Some(content) = &patch.content {
        next.content = content.clone();
    }
    if let Some(settings) = &patch.settings {
        next.settings = settings.clone();
    }

    next.version = current.version + 1;
    next.version_history.push(VersionEntry {
        version: next.version,
        timestamp: now,
        change_note: patch
            .change_note
            .clone()
            .unwrap_or_else(|| DEFAULT_CHANGE_NOTE.to_string()),
    });
    next.updated_at = now;
    next
}
