mod growth;
mod ledger;
mod water;

pub use growth::GrowthSystem;
pub use ledger::{reset_weekly_counters, settle_leaching};
pub use water::WaterBalanceSystem;
