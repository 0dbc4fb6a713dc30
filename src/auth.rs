/// Session extractors
///
/// The session middleware attaches a [`SessionId`] and a snapshot of the
/// [`SessionData`] to every request; these extractors read them back.
use crate::{
    context::AppContext,
    error::{LuneError, LuneResult},
    session::{SessionData, SessionId},
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// The browser session behind this request
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: SessionId,
    pub data: SessionData,
}

impl CurrentSession {
    /// Apply `change` to the stored session, creating it on first write.
    ///
    /// Only the fields `change` touches are written, so concurrent requests
    /// on the same session do not undo each other.
    pub async fn update<F>(&mut self, ctx: &AppContext, change: F) -> LuneResult<()>
    where
        F: FnOnce(&mut SessionData) + Send + 'static,
    {
        self.data = ctx
            .sessions
            .update(self.id.as_str(), ctx.clock.now(), Box::new(change))
            .await?;
        Ok(())
    }

    /// Whether this session has been written to the store
    pub async fn is_stored(&self, ctx: &AppContext) -> LuneResult<bool> {
        Ok(ctx.sessions.load(self.id.as_str()).await?.is_some())
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for CurrentSession {
    type Rejection = LuneError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or_else(|| LuneError::Internal("Session layer missing".to_string()))?;

        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(|| LuneError::Internal("Session layer missing".to_string()))?;

        Ok(CurrentSession { id, data })
    }
}

/// Logged-in user - rejects with 401 when the session is anonymous
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub session: CurrentSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = LuneError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;

        let username = session
            .data
            .user
            .clone()
            .ok_or_else(|| LuneError::Authentication("Please log in".to_string()))?;

        Ok(AuthUser { username, session })
    }
}
