pub mod auth;
pub mod donations;
pub mod events;
pub mod health;
pub mod members;
pub mod organizations;
pub mod subscriptions;
