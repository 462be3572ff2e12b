use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            LoginRequest, LoginResponse, MeResponse, MessageResponse, PublicUser, RegisterRequest,
            ResendVerificationRequest,
        },
        extractors::{AuthUser, SESSION_COOKIE},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
        token::{generate_verification_token, verification_link},
    },
};

// Identical message for unknown email and wrong password, so responses carry
// no account-enumeration signal.
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_VERIFICATION_TOKEN: &str = "Invalid or expired verification token";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/verify/resend", post(resend_verification))
        .route("/users/verify/:token", get(verify))
        .route("/users/login", post(login))
        .route("/users/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "name, email and password are required".into(),
        ));
    }
    if !is_valid_email(email) {
        warn!(email, "invalid email");
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    // Pre-check for a friendly error; the UNIQUE constraint on users.email
    // still backstops the race (mapped to Conflict in From<sqlx::Error>).
    if User::find_by_email(&state.db, email).await?.is_some() {
        warn!(email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, name, email, &hash).await?;

    let token = generate_verification_token();
    let user = User::set_verification_token(&state.db, user.id, &token).await?;

    send_verification_email(&state, &user, &token).await;

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User registered successfully")),
    ))
}

/// Mail failure does not fail registration: the record is in place and the
/// resend endpoint is the retry path.
async fn send_verification_email(state: &AppState, user: &User, token: &str) {
    let link = verification_link(&state.config.base_url, token);
    let body = format!("Please click on the following link: {link}");
    match state.mailer.send(&user.email, "Verify your email", &body).await {
        Ok(()) => info!(user_id = %user.id, "verification email sent"),
        Err(e) => {
            warn!(error = %e, user_id = %user.id, "verification email failed, resend required")
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ResendVerificationRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }

    if let Some(user) = User::find_by_email(&state.db, email).await? {
        if !user.is_verified {
            let token = generate_verification_token();
            let user = User::set_verification_token(&state.db, user.id, &token).await?;
            send_verification_email(&state, &user, &token).await;
        }
    }

    // Same answer whether or not the account exists.
    Ok(Json(MessageResponse::ok(
        "If the account exists and is unverified, a new verification email has been sent",
    )))
}

#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation("Verification token is required".into()));
    }

    let pending = User::find_by_verification_token(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::InvalidToken(INVALID_VERIFICATION_TOKEN.into()))?;

    let ttl = TimeDuration::hours(state.config.verification_ttl_hours);
    if !token_is_fresh(pending.verification_sent_at, ttl) {
        warn!(user_id = %pending.id, "verification token expired");
        return Err(ApiError::InvalidToken(INVALID_VERIFICATION_TOKEN.into()));
    }

    let user = User::consume_verification_token(&state.db, token)
        .await?
        .ok_or_else(|| ApiError::InvalidToken(INVALID_VERIFICATION_TOKEN.into()))?;

    info!(user_id = %user.id, "user verified");
    Ok(Json(MessageResponse::ok("User verified successfully")))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| {
            warn!(email, "login unknown email");
            ApiError::Authentication(INVALID_CREDENTIALS.into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.into()));
    }

    if state.config.login_require_verified && !user.is_verified {
        warn!(user_id = %user.id, "login rejected, email not verified");
        return Err(ApiError::Authentication(INVALID_CREDENTIALS.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, user.role)?;
    let jar = jar.add(session_cookie(&token, keys.session_ttl));

    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            message: "Login successful".into(),
            token,
            user: PublicUser {
                id: user.id,
                name: user.name,
                role: user.role,
            },
        }),
    ))
}

/// A token with no issue timestamp cannot be trusted and counts as expired.
fn token_is_fresh(sent_at: Option<OffsetDateTime>, ttl: TimeDuration) -> bool {
    sent_at
        .map(|sent| OffsetDateTime::now_utc() - sent <= ttl)
        .unwrap_or(false)
}

fn session_cookie(token: &str, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(ttl.as_secs() as i64))
        .build()
}

#[instrument(skip(state, auth))]
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".into()))?;

    Ok(Json(MeResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        is_verified: user.is_verified,
    }))
}
