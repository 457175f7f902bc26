//! Authentication endpoints: OAuth login, logout, invite-code demo login.
//!
//! The ban flag is checked here at login and nowhere else on the web
//! surface; once a cookie exists it is trusted until it expires.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use url::form_urlencoded;

use crate::auth;
use crate::errors::AppError;
use crate::models::InviteLoginRequest;
use crate::AppState;

use super::AckResponse;

const USER_SCOPES: &str = "identity.basic,identity.email,identity.team";
const BOT_SCOPES: &str = "app_mentions:read,chat:write,commands";

/// GET /api/auth/slack - Redirect into the OAuth authorize flow.
pub async fn slack_start(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let config = &state.config;
    if config.slack_client_id.is_empty() || config.slack_redirect_uri.is_empty() {
        return Err(AppError::Upstream("Slack configuration missing".to_string()));
    }

    let oauth_state = uuid::Uuid::new_v4().simple().to_string();
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", &config.slack_client_id)
        .append_pair("scope", BOT_SCOPES)
        .append_pair("user_scope", USER_SCOPES)
        .append_pair("redirect_uri", &config.slack_redirect_uri)
        .append_pair("state", &oauth_state)
        .finish();

    Ok(Redirect::temporary(&format!(
        "{}/oauth/v2/authorize?{}",
        config.slack_api_base, query
    )))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    authed_user: Option<AuthedUser>,
}

#[derive(Debug, Deserialize)]
struct AuthedUser {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    user: Option<IdentityUser>,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

fn redirect_with_error(base: &str, error: &str) -> Response {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", error)
        .finish();
    Redirect::to(&format!("{}/?{}", base, query)).into_response()
}

fn session_redirect(base: &str, slack_user_id: &str) -> Response {
    let mut response = Redirect::to(&format!("{}/dashboard", base)).into_response();
    if let Ok(value) = HeaderValue::from_str(&auth::session_cookie(slack_user_id)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// GET /api/auth/callback - Complete the OAuth flow.
///
/// Every failure degrades to a redirect carrying an error tag; the frontend
/// renders the message.
pub async fn slack_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let base = state.config.public_base_url.clone();

    if let Some(error) = params.error {
        tracing::error!("OAuth error: {}", error);
        return redirect_with_error(&base, &error);
    }
    let Some(code) = params.code else {
        return redirect_with_error(&base, "missing_code");
    };

    match run_callback(&state, &code).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("OAuth callback error: {}", err);
            redirect_with_error(&base, "auth_failed")
        }
    }
}

async fn run_callback(state: &AppState, code: &str) -> Result<Response, AppError> {
    let config = &state.config;
    let base = &config.public_base_url;

    let token: TokenResponse = state
        .http
        .post(format!("{}/api/oauth.v2.access", config.slack_api_base))
        .form(&[
            ("client_id", config.slack_client_id.as_str()),
            ("client_secret", config.slack_client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.slack_redirect_uri.as_str()),
        ])
        .send()
        .await?
        .json()
        .await?;

    if !token.ok {
        tracing::error!("Token exchange failed: {:?}", token.error);
        return Ok(redirect_with_error(base, "token_exchange_failed"));
    }
    let Some(authed_user) = token.authed_user else {
        return Ok(redirect_with_error(base, "token_exchange_failed"));
    };

    let identity: IdentityResponse = state
        .http
        .get(format!("{}/api/users.identity", config.slack_api_base))
        .bearer_auth(&authed_user.access_token)
        .send()
        .await?
        .json()
        .await?;

    if !identity.ok {
        tracing::error!("User info fetch failed: {:?}", identity.error);
        return Ok(redirect_with_error(base, "user_info_failed"));
    }
    let Some(identity_user) = identity.user else {
        return Ok(redirect_with_error(base, "user_info_failed"));
    };

    let display_name = if !identity_user.name.is_empty() {
        identity_user.name.clone()
    } else {
        identity_user
            .real_name
            .clone()
            .unwrap_or_else(|| "Unknown".to_string())
    };

    if let Some(member) = state
        .repo
        .find_member_by_slack_id(&identity_user.id)
        .await?
    {
        if member.banned {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("reason", &member.ban_reason)
                .finish();
            return Ok(Redirect::to(&format!("{}/banned?{}", base, query)).into_response());
        }
        return Ok(session_redirect(base, &identity_user.id));
    }

    if !auth::is_allow_listed(&config.allowlist_path, &identity_user.id).await {
        return Ok(Redirect::to(&format!("{}/unauthorized", base)).into_response());
    }

    state
        .repo
        .create_member(
            &display_name,
            identity_user.email.as_deref().unwrap_or(""),
            &identity_user.id,
            &display_name,
        )
        .await?;

    Ok(session_redirect(base, &identity_user.id))
}

/// POST /api/auth/logout - Clear the session cookie.
pub async fn logout() -> Response {
    let mut response = Json(AckResponse { success: true }).into_response();
    if let Ok(value) = HeaderValue::from_str(&auth::clear_session_cookie()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// POST /api/auth/invite - Demo login via a shared invite code.
pub async fn invite_login(
    State(state): State<AppState>,
    Json(request): Json<InviteLoginRequest>,
) -> Result<Response, AppError> {
    if request.invite_code.trim().is_empty() {
        return Err(AppError::Validation("Invite code is required".to_string()));
    }

    let Some(expected) = state.config.invite_code.as_deref() else {
        return Err(AppError::Validation("Invalid invite code".to_string()));
    };
    if !auth::invite_code_matches(request.invite_code.trim(), expected) {
        return Err(AppError::Validation("Invalid invite code".to_string()));
    }

    if let Some(member) = state
        .repo
        .find_member_by_slack_id(&state.config.demo_slack_id)
        .await?
    {
        if member.banned {
            return Err(AppError::Forbidden("User is banned".to_string()));
        }
    }

    let mut response = Json(AckResponse { success: true }).into_response();
    if let Ok(value) = HeaderValue::from_str(&auth::session_cookie(&state.config.demo_slack_id)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}
