pub mod datetime;
pub mod text;
pub mod url;
