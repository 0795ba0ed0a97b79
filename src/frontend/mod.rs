pub mod grammar;
pub mod parser;
pub mod parser_error;

pub use parser::{Parser, parse_program};
pub use parser_error::ParseError;
