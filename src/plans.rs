use serde::Serialize;

/// Annual billing gives two months free.
pub const ANNUAL_DISCOUNT: f64 = 2.0 / 12.0;

pub const PLAN_SEED: &str = "seed";
pub const PLAN_GROWTH: &str = "growth";
pub const PLAN_ASCEND: &str = "ascend";
pub const PLAN_SANCTUARY: &str = "sanctuary";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub description: String,
    /// None = custom/enterprise pricing.
    pub price: Option<i64>,
    pub currency: String,
    pub billing_cycle: String,
    pub is_popular: bool,
    pub is_enterprise: bool,
    pub limits: PlanLimits,
    pub features: Vec<PlanFeature>,
}

/// -1 means unlimited.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub max_members: i64,
    pub max_branches: i64,
    pub sms_credits: i64,
    pub donation_transactions: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanFeature {
    pub key: String,
    pub name: String,
    pub included: bool,
}

/// Immutable plan configuration, built once at startup and shared by handle.
#[derive(Debug)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    pub fn public_plans(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter().filter(|p| !p.is_enterprise)
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            plans: vec![seed_plan(), growth_plan(), ascend_plan(), sanctuary_plan()],
        }
    }
}

/// Monthly price × 12 with two months free, rounded. None for custom pricing.
pub fn annual_price(monthly_price: Option<i64>) -> Option<i64> {
    let monthly = monthly_price?;
    Some((monthly as f64 * 12.0 * (1.0 - ANNUAL_DISCOUNT)).round() as i64)
}

fn feature(key: &str, name: &str, included: bool) -> PlanFeature {
    PlanFeature {
        key: key.to_string(),
        name: name.to_string(),
        included,
    }
}

fn seed_plan() -> Plan {
    Plan {
        id: PLAN_SEED.to_string(),
        name: "Seed Plan".to_string(),
        description: "Best for small or growing fellowships".to_string(),
        price: Some(0),
        currency: "GHS".to_string(),
        billing_cycle: "monthly".to_string(),
        is_popular: false,
        is_enterprise: false,
        limits: PlanLimits {
            max_members: 50,
            max_branches: 1,
            sms_credits: 0,
            donation_transactions: 20,
        },
        features: vec![
            feature("member_directory", "Member Directory", true),
            feature("group_management", "Group Management", true),
            feature("annual_calendar", "Annual Calendar", true),
            feature("email_notifications", "Email Notifications", true),
            feature(
                "online_giving",
                "Online Giving & Donations (20 transactions/month)",
                true,
            ),
            feature("attendance_tracking", "Attendance Tracking", false),
            feature("ai_shepherd_alerts", "AI \"Shepherd\" Alerts", false),
            feature("sms_credits", "SMS Credits", false),
            feature("group_dues", "Group Dues Module", false),
            feature("engagement_vault", "Member Engagement Vault", false),
            feature("financial_reporting", "Financial Reporting", false),
            feature("event_management", "Event Management", false),
            feature("vendor_management", "Vendor Management", false),
            feature("advanced_analytics", "Advanced Analytics", false),
            feature("priority_support", "Priority Support", false),
        ],
    }
}

fn growth_plan() -> Plan {
    Plan {
        id: PLAN_GROWTH.to_string(),
        name: "Growth Plan".to_string(),
        description: "Ideal for established churches".to_string(),
        price: Some(550),
        currency: "GHS".to_string(),
        billing_cycle: "monthly".to_string(),
        is_popular: true,
        is_enterprise: false,
        limits: PlanLimits {
            max_members: 250,
            max_branches: 1,
            sms_credits: 100,
            donation_transactions: 50,
        },
        features: vec![
            feature("member_directory", "Member Directory", true),
            feature("group_management", "Group Management", true),
            feature("annual_calendar", "Annual Calendar", true),
            feature("email_notifications", "Email Notifications", true),
            feature(
                "online_giving",
                "Online Giving & Donations (50 transactions/month)",
                true,
            ),
            feature("attendance_tracking", "Attendance Tracking", true),
            feature("ai_shepherd_alerts", "AI \"Shepherd\" Alerts", true),
            feature("sms_credits", "Monthly 100 SMS Credits", true),
            feature("group_dues", "Group Dues Module", true),
            feature("engagement_vault", "Member Engagement Vault", true),
            feature("financial_reporting", "Basic Financial Reporting", true),
            feature("event_management", "Event Management", false),
            feature("vendor_management", "Vendor Management", false),
            feature("advanced_analytics", "Advanced Analytics", false),
            feature("priority_support", "Priority Support", false),
        ],
    }
}

fn ascend_plan() -> Plan {
    Plan {
        id: PLAN_ASCEND.to_string(),
        name: "Ascend Plan".to_string(),
        description: "Built for large and multi-branch ministries".to_string(),
        price: Some(1000),
        currency: "GHS".to_string(),
        billing_cycle: "monthly".to_string(),
        is_popular: false,
        is_enterprise: false,
        limits: PlanLimits {
            max_members: 1000,
            max_branches: 10,
            sms_credits: 250,
            donation_transactions: -1,
        },
        features: vec![
            feature("member_directory", "Member Directory", true),
            feature("group_management", "Group Management", true),
            feature("annual_calendar", "Annual Calendar", true),
            feature("email_notifications", "Email Notifications", true),
            feature("online_giving", "Online Giving & Donations (Unlimited)", true),
            feature("attendance_tracking", "Attendance Tracking", true),
            feature("ai_shepherd_alerts", "AI \"Shepherd\" Alerts", true),
            feature("sms_credits", "Monthly 250 SMS Credits", true),
            feature("group_dues", "Group Dues Module", true),
            feature("engagement_vault", "Member Engagement Vault", true),
            feature("financial_reporting", "Advanced Financial Reporting", true),
            feature("event_management", "Event Management", true),
            feature("vendor_management", "Vendor Management", true),
            feature("advanced_analytics", "Advanced Automation & Analytics", true),
            feature("priority_support", "Priority Support", true),
        ],
    }
}

fn sanctuary_plan() -> Plan {
    Plan {
        id: PLAN_SANCTUARY.to_string(),
        name: "Sanctuary Plan".to_string(),
        description: "Enterprise solution for mega churches".to_string(),
        price: None,
        currency: "GHS".to_string(),
        billing_cycle: "custom".to_string(),
        is_popular: false,
        is_enterprise: true,
        limits: PlanLimits {
            max_members: -1,
            max_branches: -1,
            sms_credits: -1,
            donation_transactions: -1,
        },
        features: vec![
            feature("all_features", "All Growth & Ascend Plan Features", true),
            feature("unlimited_members", "Unlimited Members", true),
            feature("unlimited_branches", "Unlimited Branches", true),
            feature("custom_features", "Custom Features", true),
            feature("white_label", "White-label Option Available", true),
            feature("dedicated_support", "Dedicated Account Manager", true),
            feature("sla", "Service Level Agreement (SLA)", true),
            feature("custom_integrations", "Custom Integrations", true),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annual_price_gives_two_months_free() {
        assert_eq!(annual_price(Some(550)), Some(5500));
        assert_eq!(annual_price(Some(1000)), Some(10000));
        assert_eq!(annual_price(Some(0)), Some(0));
        assert_eq!(annual_price(None), None);
    }

    #[test]
    fn catalog_lookup() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.plan("growth").map(|p| p.price), Some(Some(550)));
        assert!(catalog.plan("platinum").is_none());
        assert_eq!(catalog.all().len(), 4);
    }

    #[test]
    fn public_plans_exclude_enterprise() {
        let catalog = PlanCatalog::default();
        let public: Vec<&str> = catalog.public_plans().map(|p| p.id.as_str()).collect();
        assert_eq!(public, ["seed", "growth", "ascend"]);
    }

    #[test]
    fn tier_order_is_stable() {
        let catalog = PlanCatalog::default();
        let ids: Vec<&str> = catalog.all().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["seed", "growth", "ascend", "sanctuary"]);
    }
}
