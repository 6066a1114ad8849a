pub mod auth;
pub mod branch;
pub mod common;
pub mod user;
pub mod workflow;
