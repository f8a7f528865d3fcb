//! Source parsing: tokenizer, comment attachment and the structural parser.

pub mod comments;
pub mod definition;
pub mod error;
pub mod lexer;
pub mod parser;

pub use definition::{
    DEFAULT_SYNTAX, EnumValue, Field, Message, ProtoEnum, ProtoFile, Rpc, Service,
};
pub use error::{ParseError, ParseResult};
pub use parser::parse;
