pub mod branch;
pub mod user;
pub mod workflow;
