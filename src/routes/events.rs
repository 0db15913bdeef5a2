use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, AuthUser};
use crate::models::event::*;
use crate::AppState;

pub async fn list_events(State(state): State<AppState>) -> AppResult<Json<Vec<Event>>> {
    let events: Vec<Event> = sqlx::query_as("SELECT * FROM events ORDER BY start_date DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Event>> {
    let event: Event = sqlx::query_as("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;
    Ok(Json(event))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateEventRequest>,
) -> AppResult<(StatusCode, Json<Event>)> {
    require_role(&user, &["admin", "pastor"])?;

    if body.title.is_empty() {
        return Err(AppError::BadRequest(
            "Title, start date, and end date are required".into(),
        ));
    }
    if body.end_date < body.start_date {
        return Err(AppError::BadRequest(
            "End date must be after start date".into(),
        ));
    }

    let event: Event = sqlx::query_as(
        r#"INSERT INTO events
            (title, description, event_type, start_date, end_date,
             location, organizer_id, max_capacity)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *"#,
    )
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.event_type)
    .bind(body.start_date)
    .bind(body.end_date)
    .bind(&body.location)
    .bind(body.organizer_id.unwrap_or(user.id))
    .bind(body.max_capacity)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEventRequest>,
) -> AppResult<Json<Event>> {
    require_role(&user, &["admin", "pastor"])?;

    let event: Option<Event> = sqlx::query_as(
        r#"UPDATE events SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            event_type = COALESCE($4, event_type),
            start_date = COALESCE($5, start_date),
            end_date = COALESCE($6, end_date),
            location = COALESCE($7, location),
            organizer_id = COALESCE($8, organizer_id),
            max_capacity = COALESCE($9, max_capacity),
            status = COALESCE($10, status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(id)
    .bind(&body.title)
    .bind(&body.description)
    .bind(&body.event_type)
    .bind(body.start_date)
    .bind(body.end_date)
    .bind(&body.location)
    .bind(body.organizer_id)
    .bind(body.max_capacity)
    .bind(&body.status)
    .fetch_optional(&state.db)
    .await?;

    event
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require_role(&user, &["admin"])?;

    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".into()));
    }

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

pub async fn register_for_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
        .bind(id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Event not found".into()));
    }

    // Registering twice is a no-op.
    sqlx::query(
        r#"INSERT INTO event_registrations (event_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (event_id, user_id) DO NOTHING"#,
    )
    .bind(id)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registered for event successfully" })),
    ))
}
