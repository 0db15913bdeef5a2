use serde::Serialize;

use crate::models::subscription::Subscription;
use crate::plans::PlanCatalog;

/// Per-dimension limit compliance. Advisory: callers decide whether to block.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct LimitReport {
    pub members: bool,
    pub branches: bool,
    pub sms: bool,
    pub transactions: bool,
}

/// Fail-closed: unknown plan or unknown feature key means no access.
pub fn has_feature(catalog: &PlanCatalog, subscription: &Subscription, feature_key: &str) -> bool {
    let Some(plan) = catalog.plan(&subscription.plan_id) else {
        return false;
    };
    plan.features
        .iter()
        .find(|f| f.key == feature_key)
        .map(|f| f.included)
        .unwrap_or(false)
}

fn within(limit: i64, used: i64) -> bool {
    limit == -1 || used < limit
}

/// Point-in-time read of usage against the plan's ceilings.
pub fn within_limits(catalog: &PlanCatalog, subscription: &Subscription) -> LimitReport {
    let Some(plan) = catalog.plan(&subscription.plan_id) else {
        return LimitReport {
            members: false,
            branches: false,
            sms: false,
            transactions: false,
        };
    };
    let usage = &subscription.usage;
    LimitReport {
        members: within(plan.limits.max_members, usage.members_count),
        branches: within(plan.limits.max_branches, usage.branches_count),
        sms: within(plan.limits.sms_credits, usage.sms_used),
        transactions: within(plan.limits.donation_transactions, usage.donation_transactions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::{PriceSnapshot, Subscription, UsageCounters};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn subscription(plan_id: &str, usage: [i64; 4]) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            plan_id: plan_id.to_string(),
            status: "active".to_string(),
            billing_cycle: "monthly".to_string(),
            current_period_start: now,
            current_period_end: now + Duration::days(30),
            cancel_at_period_end: false,
            cancelled_at: None,
            payment_method: None,
            payment_details: None,
            billing_address: None,
            usage: UsageCounters {
                members_count: usage[0],
                branches_count: usage[1],
                sms_used: usage[2],
                donation_transactions: usage[3],
                last_reset_date: now,
            },
            price_at_subscription: PriceSnapshot {
                amount: Some(0),
                currency: "GHS".to_string(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sanctuary_is_unlimited_regardless_of_usage() {
        let catalog = PlanCatalog::default();
        let sub = subscription("sanctuary", [1_000_000, 500, 99_999, 42_000]);
        let report = within_limits(&catalog, &sub);
        assert_eq!(
            report,
            LimitReport {
                members: true,
                branches: true,
                sms: true,
                transactions: true
            }
        );
    }

    #[test]
    fn seed_member_limit_is_strict() {
        let catalog = PlanCatalog::default();
        assert!(within_limits(&catalog, &subscription("seed", [49, 0, 0, 0])).members);
        assert!(!within_limits(&catalog, &subscription("seed", [50, 0, 0, 0])).members);
    }

    #[test]
    fn seed_has_no_sms_allowance() {
        let catalog = PlanCatalog::default();
        assert!(!within_limits(&catalog, &subscription("seed", [0, 0, 0, 0])).sms);
    }

    #[test]
    fn unknown_feature_is_denied() {
        let catalog = PlanCatalog::default();
        let sub = subscription("growth", [0, 0, 0, 0]);
        assert!(!has_feature(&catalog, &sub, "unknown_key"));
    }

    #[test]
    fn feature_flags_follow_the_plan() {
        let catalog = PlanCatalog::default();
        let seed = subscription("seed", [0, 0, 0, 0]);
        let growth = subscription("growth", [0, 0, 0, 0]);
        assert!(!has_feature(&catalog, &seed, "attendance_tracking"));
        assert!(has_feature(&catalog, &growth, "attendance_tracking"));
        assert!(has_feature(&catalog, &seed, "member_directory"));
    }

    #[test]
    fn feature_access_is_independent_of_subscription_status() {
        let catalog = PlanCatalog::default();
        let mut sub = subscription("growth", [0, 0, 0, 0]);
        sub.status = "cancelled".to_string();
        assert!(has_feature(&catalog, &sub, "attendance_tracking"));
        sub.status = "past_due".to_string();
        assert!(has_feature(&catalog, &sub, "member_directory"));
    }

    #[test]
    fn unknown_plan_fails_closed() {
        let catalog = PlanCatalog::default();
        let sub = subscription("retired_tier", [0, 0, 0, 0]);
        assert!(!has_feature(&catalog, &sub, "member_directory"));
        let report = within_limits(&catalog, &sub);
        assert!(!report.members && !report.branches && !report.sms && !report.transactions);
    }
}
