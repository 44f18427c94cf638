/// Bearer-token authentication
///
/// [`require_session`] validates the access token in the `Authorization`
/// header and stores the resulting [`Session`] in the request extensions.
/// Handlers behind it take `Extension<Session>`.
///
/// Token checks are stateless (signature, expiry, issuer, token type). Only a
/// token that claims the admin role is confirmed against the account, so a
/// demoted admin loses admin rights on the next request instead of at token
/// expiry.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chorely_shared::{
    auth::session::{authenticate_bearer, Session},
    models::user::User,
};

use crate::{app::AppState, error::ApiError};

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let mut session: Session = authenticate_bearer(header, state.jwt_secret())?;
    if session.is_admin() {
        session = confirm_admin(&state, session).await?;
    }

    tracing::debug!(user_id = %session.user_id, role = session.role.as_str(), "Request authenticated");
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

/// Replaces the token's admin role with the account's current role
async fn confirm_admin(state: &AppState, session: Session) -> Result<Session, ApiError> {
    let user = User::find_by_id(&state.db, session.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    if !user.is_admin() {
        tracing::info!(user_id = %user.id, "Admin token presented by a demoted account");
    }

    Ok(Session::new(user.id, user.role))
}
