pub mod branch;
pub mod branch_user;
pub mod user;
pub mod workflow;
