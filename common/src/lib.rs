pub mod bill;
pub mod identity;
pub mod reward;
pub mod user;
