use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

pub const RECENT_RESUMES_CAP: usize = 10;
pub const RECENT_TEMPLATES_CAP: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub plan: String,
    #[serde(with = "ts_milliseconds")]
    pub starts_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub ends_at: DateTime<Utc>,
}

/// Stored at `users/{uid}`. Never deleted by the application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub subscription: Option<Subscription>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub last_login_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_identity(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            is_admin: false,
            subscription: None,
            created_at: now,
            last_login_at: now,
            updated_at: now,
        }
    }

    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.starts_at <= now && now < s.ends_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: String,
    pub auto_save: bool,
    pub email_notifications: bool,
    pub default_template_id: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: "en".to_string(),
            auto_save: true,
            email_notifications: true,
            default_template_id: None,
        }
    }
}

/// Stored at `user_settings/{uid}`, one per profile.
///
/// `revision` is the compare-and-swap token: every read-modify-write of this
/// document is conditional on the revision it read and bumps it by one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    pub user_id: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub recent_resume_ids: Vec<String>,
    #[serde(default)]
    pub recent_template_ids: Vec<String>,
    #[serde(default)]
    pub revision: u64,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            preferences: Preferences::default(),
            recent_resume_ids: Vec::new(),
            recent_template_ids: Vec::new(),
            revision: 0,
            updated_at: now,
        }
    }
}

/// Explicit profile edits. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Preference edits. `default_template_id: Some("")` clears the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub auto_save: Option<bool>,
    pub email_notifications: Option<bool>,
    pub default_template_id: Option<String>,
}

impl PreferencesPatch {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.language.is_none()
            && self.auto_save.is_none()
            && self.email_notifications.is_none()
            && self.default_template_id.is_none()
    }

    pub fn apply(self, prefs: &mut Preferences) {
        if let Some(theme) = self.theme {
            prefs.theme = theme;
        }
        if let Some(language) = self.language {
            prefs.language = language;
        }
        if let Some(auto_save) = self.auto_save {
            prefs.auto_save = auto_save;
        }
        if let Some(email_notifications) = self.email_notifications {
            prefs.email_notifications = email_notifications;
        }
        if let Some(id) = self.default_template_id {
            prefs.default_template_id = if id.is_empty() { None } else { Some(id) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(now: DateTime<Utc>) -> UserProfile {
        UserProfile::from_identity(
            &Identity {
                id: "u1".into(),
                email: Some("a@example.com".into()),
                display_name: None,
                photo_url: None,
            },
            now,
        )
    }

    #[test]
    fn test_subscription_window() {
        let now = Utc::now();
        let mut p = profile(now);
        assert!(!p.has_active_subscription(now));

        p.subscription = Some(Subscription {
            plan: "pro".into(),
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(30),
        });
        assert!(p.has_active_subscription(now));
        assert!(!p.has_active_subscription(now + Duration::days(30)));
        assert!(!p.has_active_subscription(now - Duration::days(2)));
    }

    #[test]
    fn test_preferences_patch_clears_default_template() {
        let mut prefs = Preferences {
            default_template_id: Some("t1".into()),
            ..Preferences::default()
        };
        PreferencesPatch {
            default_template_id: Some(String::new()),
            theme: Some(Theme::Dark),
            ..Default::default()
        }
        .apply(&mut prefs);
        assert_eq!(prefs.default_template_id, None);
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.language, "en");
    }

    #[test]
    fn test_settings_tolerate_missing_lists() {
        let json = serde_json::json!({"user_id": "u1", "updated_at": 0});
        let settings: UserSettings = serde_json::from_value(json).unwrap();
        assert!(settings.recent_resume_ids.is_empty());
        assert_eq!(settings.revision, 0);
        assert_eq!(settings.preferences, Preferences::default());
    }
}
