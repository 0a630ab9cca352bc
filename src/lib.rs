//! Parser and execution engine for Objax, an English-like scripting language
//! for live object environments.
//!
//! [`parse`] turns source text into an [`ExecutionResult`] describing every
//! recognized statement; [`execute`] parses and applies it in a fresh
//! [`Session`]. Hosts that keep state between runs hold a `Session` directly.

pub mod ast;
pub mod config;
pub mod definitions;
pub mod instances;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod result;
pub mod runtime;
pub mod token;
pub mod value;

pub use config::EngineConfig;
pub use model::{ClassDefinition, FieldDefinition, InstanceRecord, MethodDefinition};
pub use parser::{parse, parse_body};
pub use result::{EventType, ExecutionResult};
pub use runtime::error::ExecError;
pub use runtime::{ActionReport, Session, execute};
pub use value::{Argument, KeywordArgument, Value};
