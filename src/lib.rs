pub mod app;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod data;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod ranking;
pub mod session;
pub mod store;
pub mod utils;
