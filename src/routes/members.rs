use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, AuthUser};
use crate::models::member::*;
use crate::AppState;

const MEMBER_JOIN: &str = r#"
    SELECT m.*, u.email, u.first_name, u.last_name, u.phone
    FROM members m
    JOIN users u ON u.id = m.user_id
"#;

pub async fn list_members(State(state): State<AppState>) -> AppResult<Json<Vec<MemberWithUser>>> {
    let members: Vec<MemberWithUser> =
        sqlx::query_as(&format!("{MEMBER_JOIN} ORDER BY m.created_at DESC"))
            .fetch_all(&state.db)
            .await?;
    Ok(Json(members))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MemberWithUser>> {
    let member: MemberWithUser = sqlx::query_as(&format!("{MEMBER_JOIN} WHERE m.id = $1"))
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    Ok(Json(member))
}

pub async fn create_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateMemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    require_role(&user, &["admin", "pastor"])?;

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(body.user_id)
        .fetch_one(&state.db)
        .await?;
    if !user_exists {
        return Err(AppError::NotFound("User not found".into()));
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE user_id = $1)")
        .bind(body.user_id)
        .fetch_one(&state.db)
        .await?;
    if exists {
        return Err(AppError::Conflict("Member profile already exists".into()));
    }

    let member: Member = sqlx::query_as(
        r#"INSERT INTO members
            (user_id, date_of_birth, gender, marital_status, address, city, state,
             zip_code, country, baptism_date, membership_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *"#,
    )
    .bind(body.user_id)
    .bind(body.date_of_birth)
    .bind(&body.gender)
    .bind(&body.marital_status)
    .bind(&body.address)
    .bind(&body.city)
    .bind(&body.state)
    .bind(&body.zip_code)
    .bind(&body.country)
    .bind(body.baptism_date)
    .bind(body.membership_date)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMemberRequest>,
) -> AppResult<Json<Member>> {
    require_role(&user, &["admin", "pastor"])?;

    let member: Option<Member> = sqlx::query_as(
        r#"UPDATE members SET
            date_of_birth = COALESCE($2, date_of_birth),
            gender = COALESCE($3, gender),
            marital_status = COALESCE($4, marital_status),
            address = COALESCE($5, address),
            city = COALESCE($6, city),
            state = COALESCE($7, state),
            zip_code = COALESCE($8, zip_code),
            country = COALESCE($9, country),
            baptism_date = COALESCE($10, baptism_date),
            membership_date = COALESCE($11, membership_date),
            member_status = COALESCE($12, member_status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(body.date_of_birth)
    .bind(&body.gender)
    .bind(&body.marital_status)
    .bind(&body.address)
    .bind(&body.city)
    .bind(&body.state)
    .bind(&body.zip_code)
    .bind(&body.country)
    .bind(body.baptism_date)
    .bind(body.membership_date)
    .bind(&body.member_status)
    .fetch_optional(&state.db)
    .await?;

    member
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Member not found".into()))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require_role(&user, &["admin"])?;

    let result = sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Member not found".into()));
    }

    Ok(Json(json!({ "message": "Member deleted successfully" })))
}
