use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::generate_token;
use crate::models::user::*;
use crate::AppState;

fn six_digit_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

async fn issue_verification_code(state: &AppState, user_id: Uuid) -> AppResult<String> {
    let code = six_digit_code();
    sqlx::query("INSERT INTO verification_codes (user_id, code, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(&code)
        .bind(Utc::now() + Duration::minutes(10))
        .execute(&state.db)
        .await?;
    Ok(code)
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if body.email.is_empty()
        || body.password.is_empty()
        || body.first_name.is_empty()
        || body.last_name.is_empty()
    {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&body.email)
        .fetch_one(&state.db)
        .await?;
    if exists {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let password_hash =
        bcrypt::hash(&body.password, 12).map_err(|e| AppError::Internal(e.to_string()))?;

    let user: User = sqlx::query_as(
        r#"INSERT INTO users (email, password_hash, first_name, last_name, phone, role, verified)
        VALUES ($1, $2, $3, $4, $5, 'member', false)
        RETURNING *"#,
    )
    .bind(&body.email)
    .bind(&password_hash)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.phone)
    .fetch_one(&state.db)
    .await?;

    let code = issue_verification_code(&state, user.id).await?;
    state
        .mailer
        .send_verification(&user.email, &user.first_name, &code)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully. Verification code sent to email.",
            "email": user.email,
            "requiresVerification": true,
            "verificationExpires": "10 minutes",
        })),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> AppResult<Json<Value>> {
    if body.email.is_empty() || body.code.is_empty() {
        return Err(AppError::BadRequest("Email and code required".into()));
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let valid: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM verification_codes WHERE user_id = $1 AND code = $2 AND expires_at > NOW())",
    )
    .bind(user.id)
    .bind(&body.code)
    .fetch_one(&state.db)
    .await?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid or expired verification code".into(),
        ));
    }

    sqlx::query("UPDATE users SET verified = true, updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;
    sqlx::query("DELETE FROM verification_codes WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    let token = generate_token(
        user.id,
        &user.role,
        &state.config.jwt.secret,
        state.config.jwt.expiry_secs,
    )?;

    Ok(Json(json!({
        "message": "Email verified successfully",
        "user": user.public(),
        "token": token,
    })))
}

pub async fn resend_code(
    State(state): State<AppState>,
    Json(body): Json<ResendCodeRequest>,
) -> AppResult<Json<Value>> {
    if body.email.is_empty() {
        return Err(AppError::BadRequest("Email required".into()));
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // Rotate: old codes are invalidated before a new one is issued.
    sqlx::query("DELETE FROM verification_codes WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    let code = issue_verification_code(&state, user.id).await?;
    state
        .mailer
        .send_verification(&user.email, &user.first_name, &code)
        .await;

    Ok(Json(json!({ "message": "Verification code sent" })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<Value>> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::BadRequest("Email and password required".into()));
    }

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !user.verified {
        return Err(AppError::Forbidden("Please verify your email first".into()));
    }

    let valid = bcrypt::verify(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let token = generate_token(
        user.id,
        &user.role,
        &state.config.jwt.secret,
        state.config.jwt.expiry_secs,
    )?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": user.public(),
        "token": token,
    })))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<Value>> {
    if body.email.is_empty() {
        return Err(AppError::BadRequest("Email required".into()));
    }

    // Same response whether or not the account exists.
    let response = json!({ "message": "If account exists, reset link has been sent" });

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?;
    let Some(user) = user else {
        return Ok(Json(response));
    };

    let mut token_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut token_bytes);
    let reset_token = hex::encode(token_bytes);

    // Only the digest is stored.
    sqlx::query("INSERT INTO password_resets (user_id, token, expires_at) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(sha256_hex(&reset_token))
        .bind(Utc::now() + Duration::hours(1))
        .execute(&state.db)
        .await?;

    state
        .mailer
        .send_password_reset(&user.email, &user.first_name, &reset_token)
        .await;

    Ok(Json(response))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    if body.token.is_empty() || body.new_password.is_empty() {
        return Err(AppError::BadRequest("Token and new password required".into()));
    }

    let user_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT user_id FROM password_resets WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(sha256_hex(&body.token))
    .fetch_optional(&state.db)
    .await?;
    let user_id =
        user_id.ok_or_else(|| AppError::Unauthorized("Invalid or expired reset token".into()))?;

    let password_hash =
        bcrypt::hash(&body.new_password, 12).map_err(|e| AppError::Internal(e.to_string()))?;

    let user: User = sqlx::query_as(
        "UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(&password_hash)
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let token = generate_token(
        user.id,
        &user.role,
        &state.config.jwt.secret,
        state.config.jwt.expiry_secs,
    )?;

    Ok(Json(json!({
        "message": "Password reset successfully",
        "user": user.public(),
        "token": token,
    })))
}

#[cfg(test)]
mod tests {
    use super::{sha256_hex, six_digit_code};

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = six_digit_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn token_digest_is_stable_hex() {
        let digest = sha256_hex("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
