pub mod common;
pub mod identity;
pub mod link;
pub mod referral;

pub use common::*;
pub use identity::*;
pub use link::*;
pub use referral::*;
