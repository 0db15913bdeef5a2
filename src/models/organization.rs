use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub church_name: String,
    pub legal_name: Option<String>,
    pub logo_url: Option<String>,
    pub structure: String,
    pub currency: String,
    pub payment_gateway: Option<String>,
    pub admin_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub onboarding_complete: bool,
    pub onboarding_step: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_radius: i32,
    pub is_head_office: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FundBucket {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationRequest {
    pub church_name: String,
    pub legal_name: Option<String>,
    pub logo_url: Option<String>,
    pub structure: Option<String>,
    pub currency: Option<String>,
    pub payment_gateway: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganizationRequest {
    pub church_name: Option<String>,
    pub legal_name: Option<String>,
    pub logo_url: Option<String>,
    pub structure: Option<String>,
    pub currency: Option<String>,
    pub payment_gateway: Option<String>,
    pub onboarding_complete: Option<bool>,
    pub onboarding_step: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchRequest {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<i32>,
    pub is_head_office: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFundBucketRequest {
    pub name: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}
