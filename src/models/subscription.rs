use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_TRIALING: &str = "trialing";

pub const CYCLE_MONTHLY: &str = "monthly";
pub const CYCLE_ANNUAL: &str = "annual";

/// Flat row shape as stored; one subscription per organization.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub billing_cycle: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
    pub members_count: i32,
    pub branches_count: i32,
    pub sms_used: i32,
    pub donation_transactions: i32,
    pub last_reset_date: DateTime<Utc>,
    pub price_amount: Option<i64>,
    pub price_currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape: usage counters and the price snapshot nested as objects.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub billing_cycle: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
    pub usage: UsageCounters,
    pub price_at_subscription: PriceSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub members_count: i64,
    pub branches_count: i64,
    pub sms_used: i64,
    pub donation_transactions: i64,
    pub last_reset_date: DateTime<Utc>,
}

/// Price frozen at creation/plan-change time; later catalog edits never
/// alter what a customer agreed to pay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub amount: Option<i64>,
    pub currency: String,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            organization_id: row.organization_id,
            plan_id: row.plan_id,
            status: row.status,
            billing_cycle: row.billing_cycle,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            cancelled_at: row.cancelled_at,
            payment_method: row.payment_method,
            payment_details: row.payment_details,
            billing_address: row.billing_address,
            usage: UsageCounters {
                members_count: row.members_count as i64,
                branches_count: row.branches_count as i64,
                sms_used: row.sms_used as i64,
                donation_transactions: row.donation_transactions as i64,
                last_reset_date: row.last_reset_date,
            },
            price_at_subscription: PriceSnapshot {
                amount: row.price_amount,
                currency: row.price_currency,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Subscription {
    /// In good standing for entitlement purposes.
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE || self.status == STATUS_TRIALING
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub organization_id: Option<Uuid>,
    pub plan_id: Option<String>,
    pub billing_cycle: Option<String>,
    pub payment_method: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub plan_id: Option<String>,
    pub billing_cycle: Option<String>,
    pub payment_method: Option<String>,
    pub payment_details: Option<serde_json::Value>,
    pub billing_address: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub cancel_immediately: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUsageRequest {
    pub members_count: Option<i64>,
    pub branches_count: Option<i64>,
    pub sms_used: Option<i64>,
    pub donation_transactions: Option<i64>,
}
