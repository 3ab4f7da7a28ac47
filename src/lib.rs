pub mod photometric;
pub mod logger;
