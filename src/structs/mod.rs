pub mod bot_request;
