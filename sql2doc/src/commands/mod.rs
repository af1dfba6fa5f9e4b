pub mod transfer;
pub mod units;
