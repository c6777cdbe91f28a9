pub mod hub;
pub mod telegram;
