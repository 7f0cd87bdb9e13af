use std::rc::Rc;

use crate::{error::SkinkError, interpreter::{evaluate_in, Frame, SkinkValue}, parser::{parse_source, Sexp}};


/// A persistent evaluation session: one frame over the builtin frame that
/// keeps definitions alive across top-level expressions. This is how the
/// interactive shell and file loader consume the core.
pub struct EvaluationContext {
    frame: Rc<Frame>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self { frame: Frame::global() }
    }

    /// Tokenize, parse and evaluate one expression in the session frame.
    pub fn evaluate_str(&mut self, input: &str) -> Result<SkinkValue, SkinkError> {
        let sexp = parse_source(input)?;
        evaluate_in(&sexp, self.frame.clone())
    }

    pub fn evaluate_sexp(&mut self, sexp: &Sexp) -> Result<SkinkValue, SkinkError> {
        evaluate_in(sexp, self.frame.clone())
    }

    pub fn frame(&self) -> &Rc<Frame> {
        &self.frame
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use crate::test_utils::{all_testcases, compare, load_test_pair, ExpectedResult};

    use super::*;

    fn assert_run(testcase: usize, entries: &[(String, ExpectedResult)]) -> anyhow::Result<()> {
        let mut context = EvaluationContext::new();
        for (lineno, (source, expected)) in entries.iter().enumerate() {
            let result = context.evaluate_str(source);
            let expected = expected.clone().into_result();

            match (&result, &expected) {
                (Ok(value), Ok(output)) => assert!(
                    compare(value, output),
                    "Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected
                ),
                (Err(error), Err(expected_error)) => assert_eq!(
                    error, expected_error,
                    "Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected
                ),
                _ => bail!("Testcase({}, {}): Got {:?}, expected {:?}", testcase, lineno, result, expected),
            }
        }

        Ok(())
    }

    #[test]
    fn corpus_testcases() -> anyhow::Result<()> {
        for testcase in all_testcases() {
            println!("Running testcase {}", testcase);
            let entries = load_test_pair(testcase)?;
            assert_run(testcase, &entries)?;
        }

        Ok(())
    }

    #[test]
    fn definitions_persist_across_calls() -> anyhow::Result<()> {
        let mut context = EvaluationContext::new();
        context.evaluate_str("(define x 3)")?;
        context.evaluate_str("(define (double n) (* 2 n))")?;
        assert_eq!(context.evaluate_str("(double x)")?, SkinkValue::Integer(6));
        Ok(())
    }

    #[test]
    fn contexts_are_isolated_from_each_other() -> anyhow::Result<()> {
        let mut a = EvaluationContext::new();
        let mut b = EvaluationContext::new();
        a.evaluate_str("(define x 1)")?;
        assert_eq!(b.evaluate_str("x"), Err(SkinkError::NameError));
        Ok(())
    }

    #[test]
    fn set_bang_cannot_reach_the_shared_builtin_frame() -> anyhow::Result<()> {
        let mut a = EvaluationContext::new();
        let mut b = EvaluationContext::new();

        // The builtin frame is shared by every context in the thread; a
        // session may shadow + with define, but set! must not write
        // through to the root.
        assert_eq!(a.evaluate_str("(set! + 2)"), Err(SkinkError::NameError));
        assert_eq!(a.evaluate_str("(+ 1 1)")?, SkinkValue::Integer(2));
        assert_eq!(b.evaluate_str("(+ 1 1)")?, SkinkValue::Integer(2));

        // Shadowing in the session frame stays assignable as usual
        a.evaluate_str("(define + 10)")?;
        assert_eq!(a.evaluate_str("(set! + 2)")?, SkinkValue::Integer(2));
        assert_eq!(b.evaluate_str("(+ 1 1)")?, SkinkValue::Integer(2));
        Ok(())
    }
}
