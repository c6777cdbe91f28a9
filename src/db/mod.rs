pub mod bots;
pub mod store;
pub mod visits;
