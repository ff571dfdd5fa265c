//! Axum integration: the per-request decode middleware and the `Caller`
//! extractor.

use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::{StatusCode, header};

use crate::claims::SessionKeys;
use crate::CookieSettings;

/// Identity attached to every request. Anonymous callers carry no user
/// id and an empty group set; the permission layers decide what that is
/// allowed to mean.
#[derive(Clone, Debug, Default)]
pub struct Caller {
    pub user_id: Option<String>,
    pub login: Option<String>,
    pub groups: Vec<String>,
}

impl Caller {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// State for [`session_middleware`].
#[derive(Clone)]
pub struct SessionLayerState {
    pub keys: SessionKeys,
    pub cookies: CookieSettings,
}

/// Decode the session cookie once and store the result in the request
/// extensions. Invalid or expired tokens degrade to the anonymous
/// caller rather than failing the request.
pub async fn session_middleware(
    State(state): State<SessionLayerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = req
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| state.cookies.token_from_header(h))
        .and_then(|token| match state.keys.verify(&token) {
            Ok(claims) => Some(Caller {
                user_id: Some(claims.sub),
                login: Some(claims.login),
                groups: claims.groups,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected, continuing as anonymous");
                None
            }
        })
        .unwrap_or_default();

    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Returned when the extractor runs without the middleware installed.
#[derive(Debug)]
pub struct CallerRejection;

impl IntoResponse for CallerRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "session middleware not configured",
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(CallerRejection)
    }
}
