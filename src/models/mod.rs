pub mod bot;
pub mod ip_event;
pub mod visits;
