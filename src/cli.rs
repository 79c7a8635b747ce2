//! CLI domain: parse, route, presentation and output only.
//! No planning semantics; a single route table dispatches to library services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error, retry_hint};
pub use parse::{Cli, Commands};
pub use route::RunContext;
