pub mod identities;

pub use identities as identity_entity;
pub use identities::Gender;
