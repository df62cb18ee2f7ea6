pub mod error;
pub mod logger;
pub mod port;
pub mod validation;
pub mod workdir;
