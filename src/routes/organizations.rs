use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{generate_token, require_role, AuthUser};
use crate::models::organization::*;
use crate::AppState;

pub async fn create_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateOrganizationRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if body.church_name.is_empty() {
        return Err(AppError::BadRequest("Church name is required".into()));
    }

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE admin_id = $1)")
            .bind(user.id)
            .fetch_one(&state.db)
            .await?;
    if exists {
        return Err(AppError::Conflict("User already has an organization".into()));
    }

    let organization: Organization = sqlx::query_as(
        r#"INSERT INTO organizations
            (church_name, legal_name, logo_url, structure, currency, payment_gateway, admin_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *"#,
    )
    .bind(&body.church_name)
    .bind(&body.legal_name)
    .bind(&body.logo_url)
    .bind(body.structure.as_deref().unwrap_or("single"))
    .bind(body.currency.as_deref().unwrap_or("USD"))
    .bind(&body.payment_gateway)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    // Creating the first organization promotes the creator to admin.
    sqlx::query("UPDATE users SET role = 'admin', updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    let token = generate_token(
        user.id,
        "admin",
        &state.config.jwt.secret,
        state.config.jwt.expiry_secs,
    )?;

    let admin_email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;
    if let Some(email) = admin_email {
        state
            .mailer
            .send_welcome(&email, &organization.church_name)
            .await;
    }

    let mut response = serde_json::to_value(&organization)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    response["token"] = json!(token);
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_my_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let organization: Organization =
        sqlx::query_as("SELECT * FROM organizations WHERE admin_id = $1")
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("No organization found for this user".into()))?;

    let branches: Vec<Branch> =
        sqlx::query_as("SELECT * FROM branches WHERE organization_id = $1")
            .bind(organization.id)
            .fetch_all(&state.db)
            .await?;

    let fund_buckets: Vec<FundBucket> =
        sqlx::query_as("SELECT * FROM fund_buckets WHERE organization_id = $1")
            .bind(organization.id)
            .fetch_all(&state.db)
            .await?;

    Ok(Json(json!({
        "organization": organization,
        "branches": branches,
        "fundBuckets": fund_buckets,
    })))
}

pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Organization>> {
    let organization: Organization = sqlx::query_as("SELECT * FROM organizations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))?;
    Ok(Json(organization))
}

pub async fn update_organization(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> AppResult<Json<Organization>> {
    require_role(&user, &["admin"])?;

    // admin_id is immutable; everything else is partial-update.
    let organization: Option<Organization> = sqlx::query_as(
        r#"UPDATE organizations SET
            church_name = COALESCE($2, church_name),
            legal_name = COALESCE($3, legal_name),
            logo_url = COALESCE($4, logo_url),
            structure = COALESCE($5, structure),
            currency = COALESCE($6, currency),
            payment_gateway = COALESCE($7, payment_gateway),
            onboarding_complete = COALESCE($8, onboarding_complete),
            onboarding_step = COALESCE($9, onboarding_step),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&body.church_name)
    .bind(&body.legal_name)
    .bind(&body.logo_url)
    .bind(&body.structure)
    .bind(&body.currency)
    .bind(&body.payment_gateway)
    .bind(body.onboarding_complete)
    .bind(body.onboarding_step)
    .fetch_optional(&state.db)
    .await?;

    organization
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))
}

pub async fn create_branch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<CreateBranchRequest>,
) -> AppResult<(StatusCode, Json<Branch>)> {
    require_role(&user, &["admin"])?;

    if body.name.is_empty() {
        return Err(AppError::BadRequest(
            "Organization ID and branch name are required".into(),
        ));
    }

    let branch: Branch = sqlx::query_as(
        r#"INSERT INTO branches
            (organization_id, name, address, city, state, zip_code,
             latitude, longitude, geofence_radius, is_head_office)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *"#,
    )
    .bind(organization_id)
    .bind(&body.name)
    .bind(&body.address)
    .bind(&body.city)
    .bind(&body.state)
    .bind(&body.zip_code)
    .bind(body.latitude)
    .bind(body.longitude)
    .bind(body.radius.unwrap_or(100))
    .bind(body.is_head_office.unwrap_or(false))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn get_branches(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Vec<Branch>>> {
    let branches: Vec<Branch> =
        sqlx::query_as("SELECT * FROM branches WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(branches))
}

pub async fn create_fund_bucket(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<CreateFundBucketRequest>,
) -> AppResult<(StatusCode, Json<FundBucket>)> {
    require_role(&user, &["admin"])?;

    if body.name.is_empty() {
        return Err(AppError::BadRequest(
            "Organization ID and bucket name are required".into(),
        ));
    }

    let fund_bucket: FundBucket = sqlx::query_as(
        r#"INSERT INTO fund_buckets (organization_id, name, description, enabled)
        VALUES ($1, $2, $3, $4)
        RETURNING *"#,
    )
    .bind(organization_id)
    .bind(&body.name)
    .bind(&body.description)
    .bind(body.enabled.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(fund_bucket)))
}

pub async fn get_fund_buckets(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Vec<FundBucket>>> {
    let fund_buckets: Vec<FundBucket> = sqlx::query_as(
        "SELECT * FROM fund_buckets WHERE organization_id = $1 ORDER BY created_at DESC",
    )
    .bind(organization_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(fund_buckets))
}
