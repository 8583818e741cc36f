use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;
use wayfare_core::identity::{Session, User};

use crate::{error::AppError, state::AppState};

pub const GUEST_ROLE: &str = "GUEST";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    /// Session row backing this token.
    pub sid: String,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, require_customer));

    Router::new()
        .route("/api/auth/guest", post(login_guest))
        .merge(protected)
}

pub fn issue_token(state: &AppState, claims: &CustomerClaims) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(state.auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let now = state.clock.now();
    let user = User::guest(now);
    state.user_repo.create_user(&user).await?;

    let expires_at = now + Duration::seconds(state.auth.expiration as i64);
    let session = Session {
        session_token: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        expires: expires_at,
    };
    state.user_repo.create_session(&session).await?;

    let claims = CustomerClaims {
        sub: user.id.clone(),
        email: None,
        role: GUEST_ROLE.to_owned(),
        sid: session.session_token,
        exp: expires_at.timestamp() as usize,
    };
    let token = issue_token(&state, &claims)?;
    info!("Issued guest token for {}", user.id);

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        expires_at,
    }))
}

async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .user_repo
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("User {} not found", claims.sub)))?;
    let accounts = state.user_repo.list_accounts(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "user": user,
        "accounts": accounts,
    })))
}

/// Bearer-token gate for customer routes. The token must verify and its
/// session row must still exist, belong to the same user and be unexpired.
/// Verified claims land in the request extensions.
pub async fn require_customer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(AppError::unauthorized)?;

    let token_data = decode::<CustomerClaims>(
        bearer.token(),
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::unauthorized())?;
    let claims = token_data.claims;

    let session = state.user_repo.get_session(&claims.sid).await?;
    match session {
        Some(s) if s.user_id == claims.sub && s.expires > state.clock.now() => {}
        Some(_) => {
            debug!("Session {} expired or reassigned", claims.sid);
            return Err(AppError::unauthorized());
        }
        None => {
            debug!("Session {} not found", claims.sid);
            return Err(AppError::unauthorized());
        }
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
