// src/models/mod.rs

pub mod ledger;
pub mod movie;
pub mod points;
pub mod user;
