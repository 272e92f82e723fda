use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::{
        cookie::{expired_session_cookie, session_cookie},
        AuthResponse, AuthenticatedUser, LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::{PublicUser, User},
    state::AppState,
};

/// Issues a session token for `user` and answers 200 with the cookie set.
fn signed_in(state: &AppState, user: &User, message: &str) -> Result<HttpResponse, AppError> {
    let token = state.tokens.create_token(user.id, &user.email)?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token, state.secure_cookies))
        .json(AuthResponse {
            message: message.to_string(),
            user: PublicUser::from(user),
        }))
}

/// Register a new user
///
/// Creates the account and signs it in straight away.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.check()?;

    let user = state
        .credentials
        .create_user(
            &register_data.email,
            &register_data.password,
            register_data.name.trim(),
        )
        .await?;

    signed_in(&state, &user, "User created successfully")
}

/// Login user
///
/// Unknown email and wrong password produce the same 401.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.check()?;

    match state
        .credentials
        .authenticate(&login_data.email, &login_data.password)
        .await?
    {
        Some(user) => signed_in(&state, &user, "Login successful"),
        None => {
            log::info!("failed login attempt");
            Err(AppError::Unauthorized("Invalid credentials".into()))
        }
    }
}

/// Logout user
///
/// Clears the session cookie. Works with or without a session.
#[post("/logout")]
pub async fn logout(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .cookie(expired_session_cookie(state.secure_cookies))
        .json(json!({ "message": "Logged out successfully" }))
}

/// Current user
///
/// 404 when the session is valid but the account no longer exists.
#[get("/me")]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = state
        .credentials
        .get_user_by_id(user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({ "user": PublicUser::from(&user) })))
}
