use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Option<Uuid>,
    pub amount: f64,
    pub donation_type: Option<String>,
    pub donation_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub fund_bucket_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub donor_id: Option<Uuid>,
    pub amount: f64,
    pub donation_type: Option<String>,
    pub donation_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub fund_bucket_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDonationRequest {
    pub amount: Option<f64>,
    pub donation_type: Option<String>,
    pub donation_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub fund_bucket_id: Option<Uuid>,
}

/// One row of the monthly giving summary, grouped by type and month.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DonationStatsRow {
    pub donation_type: Option<String>,
    pub month: String,
    pub total_donations: i64,
    pub total_amount: f64,
    pub average_donation: f64,
    pub largest_donation: f64,
}
