// Core modules
pub mod api;
pub mod config;
pub mod email;
pub mod infrastructure;
pub mod models;
pub mod notification;
pub mod storage;
