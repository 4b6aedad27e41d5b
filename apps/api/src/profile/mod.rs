//! Profile and settings bootstrap.
//!
//! `ensure_user_profile` runs on every authentication event. Settings are
//! created alongside the profile, or lazily by the first operation that needs
//! them. Every settings write is a compare-and-swap on `revision`.

pub mod handlers;

use tracing::{info, warn};

use crate::dal::{now, validate_text, DataAccess, DataError, DataResult, MAX_DISPLAY_NAME_LEN};
use crate::identity::{AuthContext, Identity};
use crate::models::user::{PreferencesPatch, ProfilePatch, UserProfile, UserSettings};
use crate::store::{FieldUpdate, StoreError};

/// Attempts per settings read-modify-write before giving up with Conflict.
pub const SETTINGS_CAS_ATTEMPTS: u32 = 5;

impl DataAccess {
    /// Creates the profile and settings on first sight of an identity;
    /// afterwards only `last_login_at` moves. Safe to call repeatedly.
    pub async fn ensure_user_profile(&self, auth: &AuthContext) -> DataResult<UserProfile> {
        let identity = auth.require()?;
        let (mut profile, created) = self.bootstrap_profile(identity).await?;
        if !created {
            let login_at = now();
            self.profiles
                .update(
                    &identity.id,
                    &[FieldUpdate::set("last_login_at", login_at.timestamp_millis())],
                )
                .await?;
            profile.last_login_at = login_at;
        }
        Ok(profile)
    }

    pub async fn get_user_profile(&self, auth: &AuthContext) -> DataResult<UserProfile> {
        let identity = auth.require()?;
        self.profiles
            .get(&identity.id)
            .await?
            .ok_or_else(|| DataError::not_found("profile", &identity.id))
    }

    pub async fn update_user_profile(
        &self,
        auth: &AuthContext,
        patch: ProfilePatch,
    ) -> DataResult<UserProfile> {
        let identity = auth.require()?;
        let mut profile = self
            .profiles
            .get(&identity.id)
            .await?
            .ok_or_else(|| DataError::not_found("profile", &identity.id))?;

        let mut updates = Vec::new();
        if let Some(name) = patch.display_name {
            let name = validate_text("display_name", &name, MAX_DISPLAY_NAME_LEN)?;
            updates.push(FieldUpdate::set("display_name", name.clone()));
            profile.display_name = Some(name);
        }
        if let Some(url) = patch.photo_url {
            let url = url.trim().to_string();
            let value = (!url.is_empty()).then_some(url);
            updates.push(FieldUpdate::set("photo_url", value.clone()));
            profile.photo_url = value;
        }
        if updates.is_empty() {
            return Err(DataError::Validation("profile update has no fields".into()));
        }

        let updated_at = now();
        updates.push(FieldUpdate::set("updated_at", updated_at.timestamp_millis()));
        profile.updated_at = updated_at;
        self.profiles.update(&identity.id, &updates).await?;
        info!("Updated profile for user {}", identity.id);
        Ok(profile)
    }

    pub async fn get_user_settings(&self, auth: &AuthContext) -> DataResult<UserSettings> {
        let identity = auth.require()?;
        self.load_or_create_settings(&identity.id).await
    }

    pub async fn update_user_preferences(
        &self,
        auth: &AuthContext,
        patch: PreferencesPatch,
    ) -> DataResult<UserSettings> {
        let identity = auth.require()?;
        if patch.is_empty() {
            return Err(DataError::Validation("preferences update has no fields".into()));
        }
        if let Some(language) = &patch.language {
            validate_text("language", language, 16)?;
        }
        self.mutate_settings(&identity.id, |settings| {
            let before = settings.preferences.clone();
            patch.clone().apply(&mut settings.preferences);
            settings.preferences != before
        })
        .await
    }

    /// Returns the profile and whether this call created it. Also guarantees
    /// the companion settings document exists.
    pub(crate) async fn bootstrap_profile(
        &self,
        identity: &Identity,
    ) -> DataResult<(UserProfile, bool)> {
        if let Some(profile) = self.profiles.get(&identity.id).await? {
            return Ok((profile, false));
        }

        let profile = UserProfile::from_identity(identity, now());
        let created = match self.profiles.create(&profile).await {
            Ok(()) => {
                info!("Created profile for user {}", identity.id);
                true
            }
            // Lost a creation race; the winner's document stands.
            Err(StoreError::AlreadyExists(_)) => false,
            Err(e) => return Err(e.into()),
        };
        self.load_or_create_settings(&identity.id).await?;

        if created {
            Ok((profile, true))
        } else {
            let existing = self
                .profiles
                .get(&identity.id)
                .await?
                .ok_or_else(|| DataError::not_found("profile", &identity.id))?;
            Ok((existing, false))
        }
    }

    pub(crate) async fn load_or_create_settings(&self, user_id: &str) -> DataResult<UserSettings> {
        if let Some(settings) = self.settings.get(user_id).await? {
            return Ok(settings);
        }
        let settings = UserSettings::new(user_id, now());
        match self.settings.create(&settings).await {
            Ok(()) => {
                info!("Created settings for user {user_id}");
                Ok(settings)
            }
            Err(StoreError::AlreadyExists(_)) => self
                .settings
                .get(user_id)
                .await?
                .ok_or_else(|| DataError::not_found("settings", user_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write of the settings document under a revision guard.
    ///
    /// `mutate` returns whether it changed anything; unchanged settings are
    /// not written. A lost race re-reads and re-applies `mutate`.
    pub(crate) async fn mutate_settings<F>(
        &self,
        user_id: &str,
        mut mutate: F,
    ) -> DataResult<UserSettings>
    where
        F: FnMut(&mut UserSettings) -> bool + Send,
    {
        for attempt in 1..=SETTINGS_CAS_ATTEMPTS {
            let current = self.load_or_create_settings(user_id).await?;
            let mut next = current.clone();
            if !mutate(&mut next) {
                return Ok(current);
            }
            next.revision = current.revision + 1;
            next.updated_at = now();

            match self.settings.replace_if_revision(&next, current.revision).await {
                Ok(()) => return Ok(next),
                Err(StoreError::PreconditionFailed { .. }) => {
                    warn!("Settings for user {user_id} changed underneath us (attempt {attempt})");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DataError::Conflict(format!(
            "settings for user {user_id} kept changing; gave up after {SETTINGS_CAS_ATTEMPTS} attempts"
        )))
    }
}
