mod dry_run;
mod engine;
mod session;

pub use dry_run::DryRunEngine;
pub use engine::*;
pub use session::EngineSession;
