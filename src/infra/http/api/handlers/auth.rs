//! Registration, login and session handlers.

use axum::extract::{Multipart, State};
use axum::response::Response;

use crate::application::accounts::AccountInput;
use crate::application::assets::AssetKind;
use crate::application::auth::LoginInput;
use crate::application::i18n::Message;

use super::receive_upload;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, AuthPrincipal};
use crate::infra::http::api::models::{Envelope, UploadedUrl, message_only};
use crate::infra::http::api::state::ApiState;

pub async fn register(
    State(state): State<ApiState>,
    ApiJson(input): ApiJson<AccountInput>,
) -> Result<Response, ApiError> {
    let profile = state
        .auth
        .register(input)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::Registered, profile).created())
}

pub async fn login(
    State(state): State<ApiState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Response, ApiError> {
    let outcome = state.auth.login(input).await.map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::LoggedIn, outcome).ok())
}

pub async fn me(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Response, ApiError> {
    let profile = state
        .auth
        .me(&principal)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(Envelope::new(state.locale, Message::ProfileFetched, profile).ok())
}

pub async fn logout(
    State(state): State<ApiState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Response, ApiError> {
    state
        .auth
        .logout(&principal)
        .await
        .map_err(|err| state.fail(err))?;
    Ok(message_only(state.locale, Message::LoggedOut))
}

/// Public: applicants upload their proof of graduation before an account exists.
pub async fn upload_verification_file(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let stored = receive_upload(
        &state,
        AssetKind::VerificationDocument,
        "verification",
        multipart,
    )
    .await?;
    Ok(Envelope::new(state.locale, Message::FileUploaded, UploadedUrl { url: stored.url }).ok())
}
