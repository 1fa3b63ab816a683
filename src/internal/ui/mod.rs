pub mod app;
pub mod filter;
pub mod view;
