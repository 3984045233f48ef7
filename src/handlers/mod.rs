// src/handlers/mod.rs

pub mod auth;
pub mod export;
pub mod movies;
pub mod stats;
pub mod users;
