pub mod database;
pub mod sessions;
