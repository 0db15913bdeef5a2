pub mod email;
pub mod entitlements;
pub mod subscriptions;
