pub mod auth;
pub mod branch;
pub mod user;
#[cfg(test)]
mod user_test;
pub mod workflow;
#[cfg(test)]
mod workflow_test;
