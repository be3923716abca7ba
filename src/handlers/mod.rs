// src/handlers/mod.rs

pub mod auth;
pub mod category;
pub mod chapter;
pub mod class;
pub mod dashboard;
pub mod question;
pub mod quiz;
pub mod records;
pub mod settings;
pub mod subject;
pub mod users;
