use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, header::AUTHORIZATION};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::application::error::AuthFailure;
use crate::infra::http::middleware::PrincipalTag;

use super::state::ApiState;

/// Why a presented bearer token did not resolve; authenticated routes report it.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected(pub AuthFailure);

/// Resolves the bearer token, when one is presented, into a [`Principal`] request extension.
/// Rejection is left to the extractors so public reads stay reachable with a stale token.
///
/// [`Principal`]: crate::domain::principal::Principal
pub async fn resolve_principal(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers().get(AUTHORIZATION)) else {
        return next.run(request).await;
    };

    let mut tag = None;
    match state.auth.resolve(&token).await {
        Ok(principal) => {
            tag = Some(PrincipalTag(principal.id));
            request.extensions_mut().insert(principal);
        }
        Err(failure) => {
            debug!(target: "alumni::auth", %failure, "Ignoring unresolved bearer token");
            request.extensions_mut().insert(TokenRejected(failure));
        }
    }

    let mut response = next.run(request).await;
    if let Some(tag) = tag {
        response.extensions_mut().insert(tag);
    }
    response
}

fn extract_token(header: Option<&HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))?;
    let bearer = bearer.trim();
    (!bearer.is_empty()).then(|| bearer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_tokens_are_extracted() {
        let header = HeaderValue::from_static("Bearer alm_abc_def");
        assert_eq!(extract_token(Some(&header)).as_deref(), Some("alm_abc_def"));

        let header = HeaderValue::from_static("Basic dXNlcjpwYXNz");
        assert_eq!(extract_token(Some(&header)), None);

        let header = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_token(Some(&header)), None);
        assert_eq!(extract_token(None), None);
    }
}
