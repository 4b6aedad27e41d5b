//! Caller identity, threaded explicitly into every data-access call.
//!
//! Authentication happens upstream: the gateway in front of this service
//! verifies the session with the identity provider and forwards the result as
//! `x-user-*` headers. A request without `x-user-id` is anonymous.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};

use crate::dal::DataError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_PHOTO_HEADER: &str = "x-user-photo";

/// An authenticated principal as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Per-request identity context. `None` means the caller is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext(Option<Identity>);

impl AuthContext {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self(Some(identity))
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.0.as_ref()
    }

    /// The caller's identity, or [`DataError::Unauthenticated`].
    pub fn require(&self) -> Result<&Identity, DataError> {
        self.0.as_ref().ok_or(DataError::Unauthenticated)
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(id) = header(parts, USER_ID_HEADER) else {
            return Ok(AuthContext::anonymous());
        };
        Ok(AuthContext::authenticated(Identity {
            id,
            email: header(parts, USER_EMAIL_HEADER),
            display_name: header(parts, USER_NAME_HEADER),
            photo_url: header(parts, USER_PHOTO_HEADER),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> AuthContext {
        let (mut parts, _) = req.into_parts();
        AuthContext::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_headers_become_identity() {
        let req = Request::builder()
            .header(USER_ID_HEADER, "u-1")
            .header(USER_EMAIL_HEADER, "ada@example.com")
            .header(USER_NAME_HEADER, "Ada Lovelace")
            .body(())
            .unwrap();
        let ctx = extract(req).await;
        let identity = ctx.require().unwrap();
        assert_eq!(identity.id, "u-1");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.display_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(identity.photo_url, None);
    }

    #[tokio::test]
    async fn test_blank_user_id_is_anonymous() {
        let req = Request::builder()
            .header(USER_ID_HEADER, "   ")
            .body(())
            .unwrap();
        let ctx = extract(req).await;
        assert!(matches!(ctx.require(), Err(DataError::Unauthenticated)));
    }
}
