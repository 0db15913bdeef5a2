use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, AuthUser};
use crate::models::donation::*;
use crate::AppState;

pub async fn create_donation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateDonationRequest>,
) -> AppResult<(StatusCode, Json<Donation>)> {
    if body.amount <= 0.0 {
        return Err(AppError::BadRequest("Amount must be greater than 0".into()));
    }

    let donation: Donation = sqlx::query_as(
        r#"INSERT INTO donations
            (donor_id, amount, donation_type, donation_date, payment_method,
             transaction_id, notes, fund_bucket_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *"#,
    )
    .bind(body.donor_id.unwrap_or(user.id))
    .bind(body.amount)
    .bind(&body.donation_type)
    .bind(body.donation_date.unwrap_or_else(Utc::now))
    .bind(&body.payment_method)
    .bind(&body.transaction_id)
    .bind(&body.notes)
    .bind(body.fund_bucket_id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(donation)))
}

pub async fn list_donations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Donation>>> {
    require_role(&user, &["admin", "pastor"])?;

    let donations: Vec<Donation> =
        sqlx::query_as("SELECT * FROM donations ORDER BY donation_date DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(donations))
}

pub async fn get_donation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Donation>> {
    require_role(&user, &["admin", "pastor"])?;

    let donation: Donation = sqlx::query_as("SELECT * FROM donations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Donation not found".into()))?;
    Ok(Json(donation))
}

pub async fn update_donation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateDonationRequest>,
) -> AppResult<Json<Donation>> {
    require_role(&user, &["admin", "pastor"])?;

    if let Some(amount) = body.amount {
        if amount <= 0.0 {
            return Err(AppError::BadRequest("Amount must be greater than 0".into()));
        }
    }

    let donation: Option<Donation> = sqlx::query_as(
        r#"UPDATE donations SET
            amount = COALESCE($2, amount),
            donation_type = COALESCE($3, donation_type),
            donation_date = COALESCE($4, donation_date),
            payment_method = COALESCE($5, payment_method),
            transaction_id = COALESCE($6, transaction_id),
            notes = COALESCE($7, notes),
            fund_bucket_id = COALESCE($8, fund_bucket_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(body.amount)
    .bind(&body.donation_type)
    .bind(body.donation_date)
    .bind(&body.payment_method)
    .bind(&body.transaction_id)
    .bind(&body.notes)
    .bind(body.fund_bucket_id)
    .fetch_optional(&state.db)
    .await?;

    donation
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Donation not found".into()))
}

pub async fn donation_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Vec<DonationStatsRow>>> {
    require_role(&user, &["admin", "pastor"])?;

    let stats: Vec<DonationStatsRow> = sqlx::query_as(
        r#"SELECT
            donation_type,
            to_char(donation_date, 'YYYY-MM') AS month,
            COUNT(*) AS total_donations,
            SUM(amount) AS total_amount,
            ROUND(AVG(amount)::numeric, 2)::double precision AS average_donation,
            MAX(amount) AS largest_donation
        FROM donations
        GROUP BY donation_type, month
        ORDER BY month DESC"#,
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(stats))
}
