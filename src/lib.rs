pub mod api;
pub mod config;
pub mod identity;
pub mod lambda;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
