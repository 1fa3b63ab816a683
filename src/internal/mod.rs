pub mod cache;
pub mod models;
pub mod notification;
pub mod notified;
pub mod pending;
pub mod polling;
pub mod scroll;
pub mod ui;
