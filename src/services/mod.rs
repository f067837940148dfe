pub mod artifact_service;
pub mod identity_service;
pub mod link_service;
pub mod referral_graph;
pub mod referral_service;

pub use artifact_service::*;
pub use identity_service::*;
pub use link_service::*;
pub use referral_graph::*;
pub use referral_service::*;
