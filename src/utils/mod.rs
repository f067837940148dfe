pub mod analytics;
pub mod contact;
pub mod link_token;
pub mod pagination;
pub mod password;
pub mod qr_code;
pub mod referral_code;
pub mod retry;

pub use analytics::*;
pub use contact::*;
pub use link_token::*;
pub use pagination::*;
pub use password::*;
pub use qr_code::render_qr_png;
pub use referral_code::{allocate_referral_code, referral_prefix};
pub use retry::{map_unique_violation, retry_on_collision};
