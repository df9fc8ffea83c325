pub mod ast;
pub mod completion;
pub mod config;
pub mod environment;
pub mod error;
pub mod executor;
pub mod history;
pub mod io;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod signals;
