pub mod config;
pub mod vocab;
