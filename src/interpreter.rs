use core::fmt;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{builtin::builtin_frame, error::SkinkError, parser::Sexp};

pub(crate) type EvaluationResult = Result<SkinkValue, SkinkError>;

pub type BuiltinFn = fn(Vec<SkinkValue>) -> EvaluationResult;


/// Runtime values. Pairs carry identity (two pairs built from equal parts
/// are distinct allocations) while `Nil` compares structurally; `equal?`
/// compares pairs by deep structure.
#[derive(Clone)]
pub enum SkinkValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Nil,
    Pair(Rc<(SkinkValue, SkinkValue)>),
    Closure(Rc<Closure>),
    Builtin(Builtin),
}

impl SkinkValue {
    // Only #f is falsy
    pub(crate) fn truthy(&self) -> bool {
        !matches!(self, Self::Boolean(false))
    }
}

impl PartialEq for SkinkValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => *a as f64 == *b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Nil, Self::Nil) => true,
            (Self::Pair(a), Self::Pair(b)) => a.0 == b.0 && a.1 == b.1,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for SkinkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{:?}", value),
            Self::Boolean(true) => write!(f, "#t"),
            Self::Boolean(false) => write!(f, "#f"),
            Self::Nil => write!(f, "()"),
            Self::Pair(pair) => {
                write!(f, "({}", pair.0)?;
                let mut rest = &pair.1;
                loop {
                    match rest {
                        SkinkValue::Pair(pair) => {
                            write!(f, " {}", pair.0)?;
                            rest = &pair.1;
                        }
                        SkinkValue::Nil => return write!(f, ")"),
                        value => return write!(f, " . {})", value),
                    }
                }
            }
            Self::Closure(_) => write!(f, "#<closure>"),
            Self::Builtin(builtin) => write!(f, "#<builtin {}>", builtin.name),
        }
    }
}

impl fmt::Debug for SkinkValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (self as &dyn fmt::Display).fmt(f)
    }
}

/// A builtin procedure, identified by the name it is registered under.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub(crate) name: &'static str,
    pub(crate) func: BuiltinFn,
}

/// A user-defined function: parameter names, a shared reference to the
/// parsed body, and the environment captured at creation time. Invocation
/// never mutates any of the three.
pub struct Closure {
    pub(crate) params: Vec<Rc<str>>,
    pub(crate) body: Sexp,
    pub(crate) env: Rc<Frame>,
}

impl Closure {
    /// New frame for one invocation: arguments bound as locals, parent is
    /// the captured environment, not the caller's. This is what makes the
    /// scoping lexical rather than dynamic.
    fn call_frame(&self, arguments: Vec<SkinkValue>) -> Result<Rc<Frame>, SkinkError> {
        if arguments.len() != self.params.len() {
            return Err(SkinkError::EvaluationError);
        }

        let frame = Frame::child(&self.env);
        for (param, value) in self.params.iter().zip(arguments) {
            frame.define(param.clone(), value);
        }

        Ok(frame)
    }
}

/// One link of the environment chain. Frames only ever reference their
/// ancestors, so shared ownership through `Rc` needs no cycle collector
/// even though many closures and call frames may share one parent.
pub struct Frame {
    bindings: RefCell<HashMap<Rc<str>, SkinkValue>>,
    parent: Option<Rc<Frame>>,
}

impl Frame {
    pub(crate) fn root(bindings: HashMap<Rc<str>, SkinkValue>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(bindings),
            parent: None,
        })
    }

    pub fn child(parent: &Rc<Frame>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// A fresh frame over the builtin frame. Top-level definitions land
    /// here, never in the builtin frame itself.
    pub fn global() -> Rc<Self> {
        Self::child(&builtin_frame())
    }

    /// Walk from the local frame to the root. Absence anywhere in the
    /// chain is a NameError; a binding whose value happens to be #f or ()
    /// is still a perfectly good binding.
    pub fn get(&self, name: &str) -> EvaluationResult {
        let mut frame = self;
        loop {
            if let Some(value) = frame.bindings.borrow().get(name) {
                return Ok(value.clone());
            }
            match frame.parent.as_deref() {
                Some(parent) => frame = parent,
                None => return Err(SkinkError::NameError),
            }
        }
    }

    /// Bind in the local frame, shadowing any ancestor binding.
    pub fn define(&self, name: Rc<str>, value: SkinkValue) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// `set!`: update the nearest frame that already binds the name. The
    /// parentless root is the builtin frame, which stays immutable after
    /// initialization, so the walk stops before ever writing there: a
    /// name bound only in the builtin frame is not assignable.
    pub fn assign(&self, name: &str, value: SkinkValue) -> EvaluationResult {
        let mut frame = self;
        while let Some(parent) = frame.parent.as_deref() {
            {
                let mut bindings = frame.bindings.borrow_mut();
                if let Some(slot) = bindings.get_mut(name) {
                    *slot = value.clone();
                    return Ok(value);
                }
            }
            frame = parent;
        }

        Err(SkinkError::NameError)
    }

    /// `del`: remove and return the local binding. Ancestors are never
    /// searched.
    pub fn remove(&self, name: &str) -> EvaluationResult {
        self.bindings
            .borrow_mut()
            .remove(name)
            .ok_or(SkinkError::NameError)
    }
}

/// Evaluate one expression. With no environment a fresh child of the
/// builtin frame is used and discarded afterwards; callers that want
/// definitions to persist pass their own frame or use
/// [`evaluate_with_frame`].
pub fn evaluate(sexp: &Sexp, environment: Option<Rc<Frame>>) -> EvaluationResult {
    let environment = environment.unwrap_or_else(Frame::global);
    evaluate_in(sexp, environment)
}

/// Like [`evaluate`] with a fresh frame, but hands the frame back so a
/// session can thread it through later calls.
pub fn evaluate_with_frame(sexp: &Sexp) -> Result<(SkinkValue, Rc<Frame>), SkinkError> {
    let environment = Frame::global();
    let value = evaluate_in(sexp, environment.clone())?;
    Ok((value, environment))
}

/// The dispatch loop. Sub-expressions (operands, conditions, `let`
/// initializers) evaluate through ordinary recursion, but every tail
/// position -- a closure body being applied, the taken `if` branch, the
/// last operand of `begin`, a `let` body -- replaces the loop-local
/// `expr`/`env` and continues, so call depth stays constant no matter how
/// deep a tail-recursive program runs.
pub(crate) fn evaluate_in(sexp: &Sexp, environment: Rc<Frame>) -> EvaluationResult {
    let mut expr = sexp.clone();
    let mut env = environment;

    loop {
        let list = match expr {
            Sexp::Integer(value) => return Ok(SkinkValue::Integer(value)),
            Sexp::Float(value) => return Ok(SkinkValue::Float(value)),
            Sexp::Boolean(value) => return Ok(SkinkValue::Boolean(value)),
            Sexp::Nil => return Ok(SkinkValue::Nil),
            Sexp::Symbol(name) => return env.get(&name),
            Sexp::List(list) => list,
        };

        if list.is_empty() {
            return Err(SkinkError::EvaluationError);
        }

        if let Sexp::Symbol(head) = &list[0] {
            match &**head {
                "define" => return evaluate_define(&list[1..], &env),
                "lambda" => return evaluate_lambda(&list[1..], &env),
                "if" => {
                    if list.len() != 4 {
                        return Err(SkinkError::EvaluationError);
                    }
                    let condition = evaluate_in(&list[1], env.clone())?;
                    expr = if condition.truthy() { list[2].clone() } else { list[3].clone() };
                    continue;
                }
                "and" => return evaluate_and(&list[1..], &env),
                "or" => return evaluate_or(&list[1..], &env),
                "begin" => {
                    if list.len() < 2 {
                        return Err(SkinkError::EvaluationError);
                    }
                    for sexp in &list[1..list.len() - 1] {
                        evaluate_in(sexp, env.clone())?;
                    }
                    expr = list[list.len() - 1].clone();
                    continue;
                }
                "del" => return evaluate_del(&list[1..], &env),
                "let" => {
                    let (body, frame) = evaluate_let(&list[1..], &env)?;
                    expr = body;
                    env = frame;
                    continue;
                }
                "set!" => return evaluate_set_bang(&list[1..], &env),
                _ => {}
            }
        }

        let operator = evaluate_in(&list[0], env.clone())?;
        let arguments = evaluate_operands(&list[1..], &env)?;

        match operator {
            SkinkValue::Closure(closure) => {
                env = closure.call_frame(arguments)?;
                expr = closure.body.clone();
            }
            SkinkValue::Builtin(builtin) => return (builtin.func)(arguments),
            _ => return Err(SkinkError::EvaluationError),
        }
    }
}

/// Apply an already-evaluated procedure value. Used by the higher-order
/// builtins; closure bodies evaluated here recurse into the loop rather
/// than continuing it, which is fine because a builtin call is never a
/// tail position.
pub(crate) fn apply_function(function: &SkinkValue, arguments: Vec<SkinkValue>) -> EvaluationResult {
    match function {
        SkinkValue::Closure(closure) => {
            let frame = closure.call_frame(arguments)?;
            evaluate_in(&closure.body, frame)
        }
        SkinkValue::Builtin(builtin) => (builtin.func)(arguments),
        _ => Err(SkinkError::EvaluationError),
    }
}

fn evaluate_operands(list: &[Sexp], env: &Rc<Frame>) -> Result<Vec<SkinkValue>, SkinkError> {
    list.iter()
        .map(|sexp| evaluate_in(sexp, env.clone()))
        .collect()
}

fn symbol_names(list: &[Sexp]) -> Result<Vec<Rc<str>>, SkinkError> {
    list.iter()
        .map(|sexp| match sexp {
            Sexp::Symbol(name) => Ok(name.clone()),
            _ => Err(SkinkError::EvaluationError),
        })
        .collect()
}

fn evaluate_define(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    // Either (define name value) or the function-definition shorthand
    // (define (name param ...) body). Both bind in the local frame and
    // return the bound value.
    if list.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let signature = match &list[0] {
        Sexp::Symbol(name) => {
            let value = evaluate_in(&list[1], env.clone())?;
            env.define(name.clone(), value.clone());
            return Ok(value);
        }
        Sexp::List(signature) => signature,
        _ => return Err(SkinkError::EvaluationError),
    };

    if signature.is_empty() {
        return Err(SkinkError::EvaluationError);
    }
    let names = symbol_names(signature)?;
    let (name, params) = names.split_at(1);

    let closure = SkinkValue::Closure(Rc::new(Closure {
        params: params.to_vec(),
        body: list[1].clone(),
        env: env.clone(),
    }));

    env.define(name[0].clone(), closure.clone());
    Ok(closure)
}

fn evaluate_lambda(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    if list.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let params = match &list[0] {
        Sexp::List(params) => symbol_names(params)?,
        _ => return Err(SkinkError::EvaluationError),
    };

    Ok(SkinkValue::Closure(Rc::new(Closure {
        params,
        body: list[1].clone(),
        env: env.clone(),
    })))
}

fn evaluate_and(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    for sexp in list {
        if !evaluate_in(sexp, env.clone())?.truthy() {
            return Ok(SkinkValue::Boolean(false));
        }
    }

    Ok(SkinkValue::Boolean(true))
}

fn evaluate_or(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    for sexp in list {
        if evaluate_in(sexp, env.clone())?.truthy() {
            return Ok(SkinkValue::Boolean(true));
        }
    }

    Ok(SkinkValue::Boolean(false))
}

fn evaluate_del(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    if list.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    match &list[0] {
        Sexp::Symbol(name) => env.remove(name),
        _ => Err(SkinkError::EvaluationError),
    }
}

/// Evaluate a `let`'s initializers and build its frame; the body and the
/// frame go back to the loop so the body sits in tail position.
fn evaluate_let(list: &[Sexp], env: &Rc<Frame>) -> Result<(Sexp, Rc<Frame>), SkinkError> {
    if list.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let bindings = match &list[0] {
        Sexp::List(bindings) => bindings,
        _ => return Err(SkinkError::EvaluationError),
    };

    // Every initializer evaluates in the outer environment; none of them
    // sees the bindings being installed.
    let mut evaluated = Vec::with_capacity(bindings.len());
    for binding in bindings.iter() {
        let pair = match binding {
            Sexp::List(pair) if pair.len() == 2 => pair,
            _ => return Err(SkinkError::EvaluationError),
        };
        let name = match &pair[0] {
            Sexp::Symbol(name) => name.clone(),
            _ => return Err(SkinkError::EvaluationError),
        };
        evaluated.push((name, evaluate_in(&pair[1], env.clone())?));
    }

    let frame = Frame::child(env);
    for (name, value) in evaluated {
        frame.define(name, value);
    }

    Ok((list[1].clone(), frame))
}

fn evaluate_set_bang(list: &[Sexp], env: &Rc<Frame>) -> EvaluationResult {
    if list.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let name = match &list[0] {
        Sexp::Symbol(name) => name,
        _ => return Err(SkinkError::EvaluationError),
    };

    let value = evaluate_in(&list[1], env.clone())?;
    env.assign(name, value)
}
