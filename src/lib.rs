
mod builtin;
mod context;
mod error;
mod interpreter;
mod parser;

#[cfg(test)]
mod test_utils;

pub use context::EvaluationContext;
pub use error::SkinkError;
pub use interpreter::{evaluate, evaluate_with_frame, Builtin, Closure, Frame, SkinkValue};
pub use parser::{parse, parse_source, tokenize, Sexp, Token};
