//! Template catalogs. Reads are public; writes need an admin profile.

pub mod handlers;

use tracing::{debug, info};
use uuid::Uuid;

use crate::dal::{now, validate_id, validate_text, DataAccess, DataError, DataResult};
use crate::identity::{AuthContext, Identity};
use crate::models::template::{NewTemplate, Template, TemplateCatalog, TemplatePatch};
use crate::store::StoreError;

pub const MAX_TEMPLATE_NAME_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 50;

impl DataAccess {
    /// Main catalog, most popular first.
    pub async fn get_templates(
        &self,
        category: Option<&str>,
        is_premium: Option<bool>,
    ) -> DataResult<Vec<Template>> {
        let templates = self
            .templates
            .list(TemplateCatalog::Templates, category, is_premium)
            .await?;
        debug!(
            "Listed {} templates (category: {category:?}, premium: {is_premium:?})",
            templates.len()
        );
        Ok(templates)
    }

    pub async fn get_default_templates(&self) -> DataResult<Vec<Template>> {
        Ok(self
            .templates
            .list(TemplateCatalog::Defaults, None, None)
            .await?)
    }

    pub async fn get_template_by_id(&self, template_id: &str, is_default: bool) -> DataResult<Template> {
        validate_id("template", template_id)?;
        self.templates
            .get(TemplateCatalog::from_is_default(is_default), template_id)
            .await?
            .ok_or_else(|| DataError::not_found("template", template_id))
    }

    pub async fn create_template(
        &self,
        auth: &AuthContext,
        catalog: TemplateCatalog,
        new: NewTemplate,
    ) -> DataResult<Template> {
        let admin = self.require_admin(auth).await?;
        let id = match &new.id {
            Some(id) => {
                validate_id("template", id)?;
                id.clone()
            }
            None => Uuid::new_v4().to_string(),
        };
        let created_at = now();
        let template = Template {
            id,
            name: validate_text("name", &new.name, MAX_TEMPLATE_NAME_LEN)?,
            description: new.description.trim().to_string(),
            category: validate_text("category", &new.category, MAX_CATEGORY_LEN)?,
            is_premium: new.is_premium,
            popularity: 0,
            preview_url: non_empty(new.preview_url),
            sections: new.sections,
            styling: new.styling,
            created_at,
            updated_at: created_at,
        };

        match self.templates.create(catalog, &template).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                return Err(DataError::Conflict(format!(
                    "template {} already exists in {}",
                    template.id,
                    catalog.collection_name()
                )));
            }
            Err(e) => return Err(e.into()),
        }
        info!(
            "Admin {} created template {} in {}",
            admin.id,
            template.id,
            catalog.collection_name()
        );
        Ok(template)
    }

    pub async fn update_template(
        &self,
        auth: &AuthContext,
        catalog: TemplateCatalog,
        template_id: &str,
        patch: TemplatePatch,
    ) -> DataResult<Template> {
        let admin = self.require_admin(auth).await?;
        validate_id("template", template_id)?;
        if patch.is_empty() {
            return Err(DataError::Validation("template update has no fields".into()));
        }
        let mut template = self
            .templates
            .get(catalog, template_id)
            .await?
            .ok_or_else(|| DataError::not_found("template", template_id))?;

        if let Some(name) = &patch.name {
            template.name = validate_text("name", name, MAX_TEMPLATE_NAME_LEN)?;
        }
        if let Some(category) = &patch.category {
            template.category = validate_text("category", category, MAX_CATEGORY_LEN)?;
        }
        if let Some(description) = patch.description {
            template.description = description.trim().to_string();
        }
        if let Some(is_premium) = patch.is_premium {
            template.is_premium = is_premium;
        }
        if let Some(popularity) = patch.popularity {
            template.popularity = popularity;
        }
        if patch.preview_url.is_some() {
            template.preview_url = non_empty(patch.preview_url);
        }
        if let Some(sections) = patch.sections {
            template.sections = sections;
        }
        if let Some(styling) = patch.styling {
            template.styling = styling;
        }
        template.updated_at = now();

        match self.templates.replace(catalog, &template).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(DataError::not_found("template", template_id));
            }
            Err(e) => return Err(e.into()),
        }
        info!("Admin {} updated template {template_id}", admin.id);
        Ok(template)
    }

    pub async fn delete_template(
        &self,
        auth: &AuthContext,
        catalog: TemplateCatalog,
        template_id: &str,
    ) -> DataResult<()> {
        let admin = self.require_admin(auth).await?;
        validate_id("template", template_id)?;
        if !self.templates.delete(catalog, template_id).await? {
            return Err(DataError::not_found("template", template_id));
        }
        info!("Admin {} deleted template {template_id}", admin.id);
        Ok(())
    }

    /// The stored profile decides admin rights, never the request headers.
    async fn require_admin<'a>(&self, auth: &'a AuthContext) -> DataResult<&'a Identity> {
        let identity = auth.require()?;
        let is_admin = self
            .profiles
            .get(&identity.id)
            .await?
            .is_some_and(|p| p.is_admin);
        if !is_admin {
            return Err(DataError::Forbidden(format!(
                "user {} may not manage templates",
                identity.id
            )));
        }
        Ok(identity)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
