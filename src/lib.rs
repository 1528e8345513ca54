pub mod config;
pub mod db;
pub mod domain;
pub mod http;
pub mod messaging;
pub mod metrics;
pub mod repository;
pub mod utils;
