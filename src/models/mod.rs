pub mod donation;
pub mod event;
pub mod member;
pub mod organization;
pub mod subscription;
pub mod user;

pub use donation::*;
pub use event::*;
pub use member::*;
pub use organization::*;
pub use subscription::*;
pub use user::*;
