use chrono::{DateTime, Months, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::subscription::*;
use crate::plans::{annual_price, Plan, PlanCatalog, PLAN_SEED};

/// End of a billing period starting now: one month for monthly (and custom)
/// cycles, one year for annual.
pub fn period_end_from(now: DateTime<Utc>, billing_cycle: &str) -> DateTime<Utc> {
    if billing_cycle == CYCLE_ANNUAL {
        now + Months::new(12)
    } else {
        now + Months::new(1)
    }
}

/// Price snapshot for a plan under a billing cycle. None for custom pricing.
pub fn price_for_cycle(plan: &Plan, billing_cycle: &str) -> Option<i64> {
    if billing_cycle == CYCLE_ANNUAL {
        annual_price(plan.price)
    } else {
        plan.price
    }
}

fn apply_cancel(row: &mut SubscriptionRow, immediately: bool, now: DateTime<Utc>) {
    if immediately {
        row.status = STATUS_CANCELLED.to_string();
        row.cancelled_at = Some(now);
    } else {
        // Status stays untouched until period end; no sweep enforces the
        // cutoff, callers observe the flag.
        row.cancel_at_period_end = true;
    }
}

fn apply_reactivate(row: &mut SubscriptionRow, now: DateTime<Utc>) -> AppResult<()> {
    if row.status == STATUS_ACTIVE {
        return Err(AppError::Conflict("Subscription is already active".into()));
    }

    if row.cancel_at_period_end && now < row.current_period_end {
        // Period still running: keep it, just undo the scheduled cancellation.
        row.cancel_at_period_end = false;
        row.status = STATUS_ACTIVE.to_string();
    } else {
        row.status = STATUS_ACTIVE.to_string();
        row.cancel_at_period_end = false;
        row.cancelled_at = None;
        row.current_period_start = now;
        row.current_period_end = period_end_from(now, &row.billing_cycle);
    }
    Ok(())
}

async fn fetch_row(db: &PgPool, organization_id: Uuid) -> AppResult<SubscriptionRow> {
    let row: Option<SubscriptionRow> =
        sqlx::query_as("SELECT * FROM subscriptions WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_optional(db)
            .await?;
    row.ok_or_else(|| AppError::NotFound("Subscription not found".into()))
}

async fn persist(db: &PgPool, row: &SubscriptionRow) -> AppResult<SubscriptionRow> {
    let updated: SubscriptionRow = sqlx::query_as(
        r#"UPDATE subscriptions SET
            plan_id = $2, status = $3, billing_cycle = $4,
            current_period_start = $5, current_period_end = $6,
            cancel_at_period_end = $7, cancelled_at = $8,
            payment_method = $9, payment_details = $10, billing_address = $11,
            price_amount = $12, price_currency = $13, updated_at = NOW()
        WHERE id = $1
        RETURNING *"#,
    )
    .bind(row.id)
    .bind(&row.plan_id)
    .bind(&row.status)
    .bind(&row.billing_cycle)
    .bind(row.current_period_start)
    .bind(row.current_period_end)
    .bind(row.cancel_at_period_end)
    .bind(row.cancelled_at)
    .bind(&row.payment_method)
    .bind(&row.payment_details)
    .bind(&row.billing_address)
    .bind(row.price_amount)
    .bind(&row.price_currency)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

fn validate_new(
    catalog: &PlanCatalog,
    req: &CreateSubscriptionRequest,
) -> AppResult<(Uuid, String)> {
    let (organization_id, plan_id) = match (req.organization_id, req.plan_id.as_deref()) {
        (Some(org), Some(plan)) => (org, plan),
        _ => {
            return Err(AppError::BadRequest(
                "Organization ID and plan ID are required".into(),
            ))
        }
    };
    if catalog.plan(plan_id).is_none() {
        return Err(AppError::BadRequest("Invalid plan ID".into()));
    }
    Ok((organization_id, plan_id.to_string()))
}

fn reject_duplicate(already_subscribed: bool) -> AppResult<()> {
    if already_subscribed {
        return Err(AppError::Conflict(
            "Organization already has a subscription. Use update instead.".into(),
        ));
    }
    Ok(())
}

pub async fn create(
    db: &PgPool,
    catalog: &PlanCatalog,
    req: CreateSubscriptionRequest,
) -> AppResult<Subscription> {
    let (organization_id, plan_id) = validate_new(catalog, &req)?;
    let plan = catalog
        .plan(&plan_id)
        .ok_or_else(|| AppError::BadRequest("Invalid plan ID".into()))?;

    let org_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
            .bind(organization_id)
            .fetch_one(db)
            .await?;
    if !org_exists {
        return Err(AppError::NotFound("Organization not found".into()));
    }

    let already_subscribed: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM subscriptions WHERE organization_id = $1)")
            .bind(organization_id)
            .fetch_one(db)
            .await?;
    reject_duplicate(already_subscribed)?;

    let billing_cycle = req.billing_cycle.unwrap_or_else(|| CYCLE_MONTHLY.to_string());
    let now = Utc::now();
    let period_end = period_end_from(now, &billing_cycle);
    let price = price_for_cycle(plan, &billing_cycle);

    // The free plan never carries payment instruments.
    let (payment_method, payment_details) = if plan_id == PLAN_SEED {
        (None, None)
    } else {
        (req.payment_method, req.payment_details)
    };

    let row: SubscriptionRow = sqlx::query_as(
        r#"INSERT INTO subscriptions
            (organization_id, plan_id, status, billing_cycle,
             current_period_start, current_period_end,
             payment_method, payment_details, billing_address,
             price_amount, price_currency)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *"#,
    )
    .bind(organization_id)
    .bind(&plan_id)
    .bind(STATUS_ACTIVE)
    .bind(&billing_cycle)
    .bind(now)
    .bind(period_end)
    .bind(&payment_method)
    .bind(&payment_details)
    .bind(&req.billing_address)
    .bind(price)
    .bind(&plan.currency)
    .fetch_one(db)
    .await?;

    sqlx::query("UPDATE organizations SET subscription_id = $1, updated_at = NOW() WHERE id = $2")
        .bind(row.id)
        .bind(organization_id)
        .execute(db)
        .await?;

    Ok(row.into())
}

pub async fn get(db: &PgPool, organization_id: Uuid) -> AppResult<Subscription> {
    Ok(fetch_row(db, organization_id).await?.into())
}

pub async fn update(
    db: &PgPool,
    catalog: &PlanCatalog,
    organization_id: Uuid,
    req: UpdateSubscriptionRequest,
) -> AppResult<Subscription> {
    let mut row = fetch_row(db, organization_id).await?;

    if let Some(plan_id) = &req.plan_id {
        if *plan_id != row.plan_id {
            let plan = catalog
                .plan(plan_id)
                .ok_or_else(|| AppError::BadRequest("Invalid plan ID".into()))?;

            // Snapshot the price under the cycle that will be in effect.
            let effective_cycle = req.billing_cycle.as_deref().unwrap_or(&row.billing_cycle);
            row.price_amount = price_for_cycle(plan, effective_cycle);
            row.price_currency = plan.currency.clone();
            row.plan_id = plan_id.clone();
        }
    }

    if let Some(billing_cycle) = &req.billing_cycle {
        if *billing_cycle != row.billing_cycle {
            row.billing_cycle = billing_cycle.clone();
            row.current_period_end = period_end_from(Utc::now(), billing_cycle);
        }
    }

    if let Some(payment_method) = req.payment_method {
        row.payment_method = Some(payment_method);
    }
    if let Some(payment_details) = req.payment_details {
        row.payment_details = Some(payment_details);
    }
    if let Some(billing_address) = req.billing_address {
        row.billing_address = Some(billing_address);
    }

    Ok(persist(db, &row).await?.into())
}

pub async fn cancel(
    db: &PgPool,
    organization_id: Uuid,
    cancel_immediately: bool,
) -> AppResult<Subscription> {
    let mut row = fetch_row(db, organization_id).await?;
    apply_cancel(&mut row, cancel_immediately, Utc::now());
    Ok(persist(db, &row).await?.into())
}

pub async fn reactivate(db: &PgPool, organization_id: Uuid) -> AppResult<Subscription> {
    let mut row = fetch_row(db, organization_id).await?;
    apply_reactivate(&mut row, Utc::now())?;
    Ok(persist(db, &row).await?.into())
}

pub async fn update_usage(
    db: &PgPool,
    organization_id: Uuid,
    req: UpdateUsageRequest,
) -> AppResult<Subscription> {
    let counters = [
        req.members_count,
        req.branches_count,
        req.sms_used,
        req.donation_transactions,
    ];
    for value in counters.into_iter().flatten() {
        if value < 0 || value > i32::MAX as i64 {
            return Err(AppError::BadRequest(
                "Usage counters must be non-negative".into(),
            ));
        }
    }

    let row: Option<SubscriptionRow> = sqlx::query_as(
        r#"UPDATE subscriptions SET
            members_count = COALESCE($2, members_count),
            branches_count = COALESCE($3, branches_count),
            sms_used = COALESCE($4, sms_used),
            donation_transactions = COALESCE($5, donation_transactions),
            updated_at = NOW()
        WHERE organization_id = $1
        RETURNING *"#,
    )
    .bind(organization_id)
    .bind(req.members_count.map(|v| v as i32))
    .bind(req.branches_count.map(|v| v as i32))
    .bind(req.sms_used.map(|v| v as i32))
    .bind(req.donation_transactions.map(|v| v as i32))
    .fetch_optional(db)
    .await?;

    row.map(Subscription::from)
        .ok_or_else(|| AppError::NotFound("Subscription not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(status: &str, billing_cycle: &str) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            plan_id: "growth".to_string(),
            status: status.to_string(),
            billing_cycle: billing_cycle.to_string(),
            current_period_start: now - Duration::days(10),
            current_period_end: now + Duration::days(20),
            cancel_at_period_end: false,
            cancelled_at: None,
            payment_method: Some("momo".to_string()),
            payment_details: None,
            billing_address: None,
            members_count: 0,
            branches_count: 0,
            sms_used: 0,
            donation_transactions: 0,
            last_reset_date: now,
            price_amount: Some(550),
            price_currency: "GHS".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn create_request(organization_id: Option<Uuid>, plan_id: Option<&str>) -> CreateSubscriptionRequest {
        CreateSubscriptionRequest {
            organization_id,
            plan_id: plan_id.map(String::from),
            billing_cycle: None,
            payment_method: None,
            payment_details: None,
            billing_address: None,
        }
    }

    #[test]
    fn create_requires_organization_and_plan() {
        let catalog = PlanCatalog::default();
        let missing_plan = create_request(Some(Uuid::new_v4()), None);
        assert!(matches!(
            validate_new(&catalog, &missing_plan),
            Err(AppError::BadRequest(_))
        ));
        let missing_org = create_request(None, Some("growth"));
        assert!(matches!(
            validate_new(&catalog, &missing_org),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn create_rejects_unknown_plan() {
        let catalog = PlanCatalog::default();
        let req = create_request(Some(Uuid::new_v4()), Some("platinum"));
        assert!(matches!(
            validate_new(&catalog, &req),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn create_accepts_known_plan() {
        let catalog = PlanCatalog::default();
        let org = Uuid::new_v4();
        let (organization_id, plan_id) =
            validate_new(&catalog, &create_request(Some(org), Some("ascend"))).unwrap();
        assert_eq!(organization_id, org);
        assert_eq!(plan_id, "ascend");
    }

    #[test]
    fn second_subscription_is_a_conflict() {
        assert!(matches!(
            reject_duplicate(true),
            Err(AppError::Conflict(_))
        ));
        assert!(reject_duplicate(false).is_ok());
    }

    #[test]
    fn monthly_and_annual_period_lengths() {
        let now = Utc::now();
        let monthly = period_end_from(now, CYCLE_MONTHLY);
        let annual = period_end_from(now, CYCLE_ANNUAL);
        assert!(monthly > now);
        assert!((monthly - now).num_days() >= 28 && (monthly - now).num_days() <= 31);
        assert!((annual - now).num_days() >= 365 && (annual - now).num_days() <= 366);
        // Custom cycles bill like monthly.
        assert_eq!(period_end_from(now, "custom"), monthly);
    }

    #[test]
    fn price_snapshot_per_cycle() {
        let catalog = PlanCatalog::default();
        let growth = catalog.plan("growth").unwrap();
        assert_eq!(price_for_cycle(growth, CYCLE_MONTHLY), Some(550));
        assert_eq!(price_for_cycle(growth, CYCLE_ANNUAL), Some(5500));
        let sanctuary = catalog.plan("sanctuary").unwrap();
        assert_eq!(price_for_cycle(sanctuary, CYCLE_ANNUAL), None);
    }

    #[test]
    fn immediate_cancel_sets_status_and_timestamp() {
        let mut sub = row(STATUS_ACTIVE, CYCLE_MONTHLY);
        apply_cancel(&mut sub, true, Utc::now());
        assert_eq!(sub.status, STATUS_CANCELLED);
        assert!(sub.cancelled_at.is_some());
    }

    #[test]
    fn deferred_cancel_only_flags() {
        let mut sub = row(STATUS_ACTIVE, CYCLE_MONTHLY);
        apply_cancel(&mut sub, false, Utc::now());
        assert_eq!(sub.status, STATUS_ACTIVE);
        assert!(sub.cancel_at_period_end);
        assert!(sub.cancelled_at.is_none());
    }

    #[test]
    fn reactivate_active_is_a_conflict() {
        let mut sub = row(STATUS_ACTIVE, CYCLE_MONTHLY);
        assert!(matches!(
            apply_reactivate(&mut sub, Utc::now()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn reactivate_before_period_end_preserves_period() {
        let mut sub = row("paused", CYCLE_MONTHLY);
        sub.cancel_at_period_end = true;
        let original_end = sub.current_period_end;
        apply_reactivate(&mut sub, Utc::now()).unwrap();
        assert_eq!(sub.status, STATUS_ACTIVE);
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.current_period_end, original_end);
    }

    #[test]
    fn reactivate_after_immediate_cancel_starts_new_period() {
        let mut sub = row(STATUS_CANCELLED, CYCLE_ANNUAL);
        sub.cancelled_at = Some(Utc::now() - Duration::days(5));
        let now = Utc::now();
        apply_reactivate(&mut sub, now).unwrap();
        assert_eq!(sub.status, STATUS_ACTIVE);
        assert!(sub.cancelled_at.is_none());
        assert_eq!(sub.current_period_start, now);
        let days = (sub.current_period_end - now).num_days();
        assert!((365..=366).contains(&days));
    }

    #[test]
    fn reactivate_after_elapsed_period_starts_new_period() {
        let now = Utc::now();
        let mut sub = row("paused", CYCLE_MONTHLY);
        sub.cancel_at_period_end = true;
        sub.current_period_end = now - Duration::days(1);
        apply_reactivate(&mut sub, now).unwrap();
        assert!(!sub.cancel_at_period_end);
        assert_eq!(sub.current_period_start, now);
        assert!(sub.current_period_end > now);
    }
}
