pub mod db;
pub mod demo;
pub mod models;
pub mod source;

pub use rusqlite;
