use core::{error::Error, fmt};


/// The three fatal error kinds of the interpreter. Every failure unwinds
/// immediately to the caller; nothing in the core catches its own errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkinkError {
    /// Malformed token stream: unmatched parens, incomplete expression,
    /// trailing tokens after the first complete expression.
    SyntaxError,
    /// Lookup or mutation of an unbound name, or deletion of a name that
    /// is not bound in the local frame.
    NameError,
    /// Everything else: wrong arity, applying a non-procedure, malformed
    /// special-form shape, bad arguments to a builtin.
    EvaluationError,
}

impl SkinkError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SyntaxError => "SyntaxError",
            Self::NameError => "NameError",
            Self::EvaluationError => "EvaluationError",
        }
    }
}

impl fmt::Display for SkinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Error for SkinkError {}
