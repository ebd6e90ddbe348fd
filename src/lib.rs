#![forbid(unsafe_code)]
pub mod mr;
pub mod app;
