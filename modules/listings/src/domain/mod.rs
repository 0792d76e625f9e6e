pub mod filters;
pub mod service;
