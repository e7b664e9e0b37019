mod engine_config;
mod option;

pub use engine_config::*;
pub use option::*;
