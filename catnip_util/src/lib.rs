pub mod macros;
pub mod parsing;
