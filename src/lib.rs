pub mod alert;
pub mod config;
pub mod error;
pub mod health;
pub mod model;
pub mod notify;
pub mod poll_loop;
pub mod source;
pub mod tracker;
