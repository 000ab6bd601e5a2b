pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod middleware;
pub mod models;
pub mod view;
