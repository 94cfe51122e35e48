pub mod dashboard;
pub mod display;
pub mod policy;
pub mod store;
