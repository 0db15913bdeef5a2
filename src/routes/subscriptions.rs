use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_role, AuthUser};
use crate::models::subscription::*;
use crate::plans::{annual_price, Plan, PlanCatalog};
use crate::services::{entitlements, subscriptions};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPlansQuery {
    pub include_enterprise: Option<String>,
}

fn plan_json(plan: &Plan) -> AppResult<Value> {
    let mut value = serde_json::to_value(plan).map_err(|e| AppError::Internal(e.to_string()))?;
    value["annualPrice"] = json!(annual_price(plan.price));
    Ok(value)
}

fn plans_payload(catalog: &PlanCatalog, include_enterprise: bool) -> AppResult<Vec<Value>> {
    if include_enterprise {
        catalog.all().iter().map(plan_json).collect()
    } else {
        catalog.public_plans().map(plan_json).collect()
    }
}

pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> AppResult<Json<Vec<Value>>> {
    let include_enterprise = query.include_enterprise.as_deref() == Some("true");
    Ok(Json(plans_payload(&state.plans, include_enterprise)?))
}

pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> AppResult<Json<Value>> {
    let plan = state
        .plans
        .plan(&plan_id)
        .ok_or_else(|| AppError::NotFound("Plan not found".into()))?;
    Ok(Json(plan_json(plan)?))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    require_role(&user, &["admin"])?;

    let subscription = subscriptions::create(&state.db, &state.plans, body).await?;
    let plan = state.plans.plan(&subscription.plan_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Subscription created successfully",
            "subscription": subscription,
            "plan": plan,
        })),
    ))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let subscription = subscriptions::get(&state.db, organization_id).await?;
    let plan = state.plans.plan(&subscription.plan_id);
    let is_active = subscription.is_active();

    Ok(Json(json!({
        "subscription": subscription,
        "plan": plan,
        "isActive": is_active,
    })))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<UpdateSubscriptionRequest>,
) -> AppResult<Json<Value>> {
    require_role(&user, &["admin"])?;

    let subscription =
        subscriptions::update(&state.db, &state.plans, organization_id, body).await?;
    let plan = state.plans.plan(&subscription.plan_id);

    Ok(Json(json!({
        "message": "Subscription updated successfully",
        "subscription": subscription,
        "plan": plan,
    })))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<CancelSubscriptionRequest>,
) -> AppResult<Json<Value>> {
    require_role(&user, &["admin"])?;

    let immediately = body.cancel_immediately.unwrap_or(false);
    let subscription = subscriptions::cancel(&state.db, organization_id, immediately).await?;

    let message = if immediately {
        "Subscription cancelled immediately"
    } else {
        "Subscription will be cancelled at the end of the billing period"
    };

    Ok(Json(json!({
        "message": message,
        "subscription": subscription,
    })))
}

pub async fn reactivate_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    require_role(&user, &["admin"])?;

    let subscription = subscriptions::reactivate(&state.db, organization_id).await?;

    Ok(Json(json!({
        "message": "Subscription reactivated successfully",
        "subscription": subscription,
    })))
}

pub async fn check_feature(
    State(state): State<AppState>,
    Path((organization_id, feature_key)): Path<(Uuid, String)>,
) -> AppResult<Json<Value>> {
    let subscription = subscriptions::get(&state.db, organization_id).await?;
    // Access follows the plan alone; subscription status is reported separately.
    let has_access = entitlements::has_feature(&state.plans, &subscription, &feature_key);
    let plan = state.plans.plan(&subscription.plan_id);

    Ok(Json(json!({
        "featureKey": feature_key,
        "hasAccess": has_access,
        "planId": subscription.plan_id,
        "planName": plan.map(|p| p.name.as_str()),
    })))
}

pub async fn check_limits(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let subscription = subscriptions::get(&state.db, organization_id).await?;
    let report = entitlements::within_limits(&state.plans, &subscription);
    let plan = state.plans.plan(&subscription.plan_id);

    Ok(Json(json!({
        "planId": subscription.plan_id,
        "planName": plan.map(|p| p.name.as_str()),
        "limits": plan.map(|p| p.limits),
        "usage": subscription.usage,
        "withinLimits": report,
    })))
}

pub async fn update_usage(
    State(state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(body): Json<UpdateUsageRequest>,
) -> AppResult<Json<Value>> {
    let subscription = subscriptions::update_usage(&state.db, organization_id, body).await?;

    Ok(Json(json!({
        "message": "Usage updated successfully",
        "usage": subscription.usage,
    })))
}

#[cfg(test)]
mod tests {
    use super::plans_payload;
    use crate::plans::PlanCatalog;

    #[test]
    fn plan_listing_is_a_bare_array_with_annual_prices() {
        let catalog = PlanCatalog::default();

        let public = plans_payload(&catalog, false).unwrap();
        assert_eq!(public.len(), 3);
        assert_eq!(public[1]["id"], "growth");
        assert_eq!(public[1]["annualPrice"], 5500);

        let all = plans_payload(&catalog, true).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3]["id"], "sanctuary");
        assert!(all[3]["annualPrice"].is_null());
    }
}
