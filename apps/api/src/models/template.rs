use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two template catalogs. They share a schema and differ only in which
/// collection holds them, so callers always say which one they mean.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCatalog {
    Templates,
    Defaults,
}

impl TemplateCatalog {
    pub fn from_is_default(is_default: bool) -> Self {
        if is_default {
            TemplateCatalog::Defaults
        } else {
            TemplateCatalog::Templates
        }
    }

    pub fn collection_name(self) -> &'static str {
        match self {
            TemplateCatalog::Templates => "templates",
            TemplateCatalog::Defaults => "default_templates",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateStyling {
    pub font_family: String,
    pub font_size: u8,
    pub primary_color: String,
    pub secondary_color: String,
    pub spacing: String,
}

impl Default for TemplateStyling {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 11,
            primary_color: "#1f2937".to_string(),
            secondary_color: "#6b7280".to_string(),
            spacing: "normal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub preview_url: Option<String>,
    /// Section keys in layout order.
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub styling: TemplateStyling,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTemplate {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub is_premium: bool,
    pub preview_url: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub styling: TemplateStyling,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_premium: Option<bool>,
    pub popularity: Option<u64>,
    pub preview_url: Option<String>,
    pub sections: Option<Vec<String>>,
    pub styling: Option<TemplateStyling>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.is_premium.is_none()
            && self.popularity.is_none()
            && self.preview_url.is_none()
            && self.sections.is_none()
            && self.styling.is_none()
    }
}
