pub mod history;
pub mod import;
pub mod practice;
pub mod seed;
pub mod stats;
pub mod words;
