//! CLI domain: parse, route, and output only.
//! Resolution itself lives in `Environment` and `Context`; the route table just drives it.

mod output;
mod parse;
mod route;

pub use output::{format_dump_json, format_dump_text, format_keys, map_error};
pub use parse::{parse_key_value, Cli, Commands, DumpFormat};
pub use route::RunContext;
