// src/utils/mod.rs

pub mod hash;
pub mod image;
pub mod jwt;
pub mod otp;
