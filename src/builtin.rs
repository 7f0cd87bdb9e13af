use std::collections::HashMap;
use std::rc::Rc;

use itertools::Itertools;

use crate::error::SkinkError;
use crate::interpreter::{apply_function, Builtin, BuiltinFn, EvaluationResult, Frame, SkinkValue};


fn as_f64(value: &SkinkValue) -> Result<f64, SkinkError> {
    match value {
        SkinkValue::Integer(value) => Ok(*value as f64),
        SkinkValue::Float(value) => Ok(*value),
        _ => Err(SkinkError::EvaluationError),
    }
}

// Integer arithmetic stays integer; a single float operand makes the
// whole result a float.
fn numeric_binop(
    a: &SkinkValue,
    b: &SkinkValue,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> EvaluationResult {
    match (a, b) {
        (SkinkValue::Integer(x), SkinkValue::Integer(y)) => Ok(SkinkValue::Integer(int_op(*x, *y))),
        _ => Ok(SkinkValue::Float(float_op(as_f64(a)?, as_f64(b)?))),
    }
}

fn builtin_add(values: Vec<SkinkValue>) -> EvaluationResult {
    values.iter().try_fold(SkinkValue::Integer(0), |acc, value| {
        numeric_binop(&acc, value, i64::wrapping_add, std::ops::Add::add)
    })
}

fn builtin_sub(values: Vec<SkinkValue>) -> EvaluationResult {
    match values.split_first() {
        None => Err(SkinkError::EvaluationError),
        Some((first, [])) => {
            numeric_binop(&SkinkValue::Integer(0), first, i64::wrapping_sub, std::ops::Sub::sub)
        }
        Some((first, rest)) => rest.iter().try_fold(first.clone(), |acc, value| {
            numeric_binop(&acc, value, i64::wrapping_sub, std::ops::Sub::sub)
        }),
    }
}

fn builtin_mul(values: Vec<SkinkValue>) -> EvaluationResult {
    values.iter().try_fold(SkinkValue::Integer(1), |acc, value| {
        numeric_binop(&acc, value, i64::wrapping_mul, std::ops::Mul::mul)
    })
}

// Division is always true division: the result is a float even for two
// integer operands, and dividing by zero gives inf/nan per IEEE-754.
fn builtin_div(values: Vec<SkinkValue>) -> EvaluationResult {
    let numbers = values.iter().map(as_f64).collect::<Result<Vec<_>, _>>()?;
    match numbers.split_first() {
        None => Err(SkinkError::EvaluationError),
        Some((first, [])) => Ok(SkinkValue::Float(1.0 / first)),
        Some((first, rest)) => {
            Ok(SkinkValue::Float(rest.iter().fold(*first, |acc, value| acc / value)))
        }
    }
}

fn builtin_compare(values: Vec<SkinkValue>, f: impl Fn(f64, f64) -> bool) -> EvaluationResult {
    if values.len() < 2 {
        return Err(SkinkError::EvaluationError);
    }

    let numbers = values.iter().map(as_f64).collect::<Result<Vec<_>, _>>()?;
    Ok(SkinkValue::Boolean(
        numbers.iter().tuple_windows().all(|(a, b)| f(*a, *b)),
    ))
}

fn builtin_greater(values: Vec<SkinkValue>) -> EvaluationResult {
    builtin_compare(values, |a, b| a > b)
}

fn builtin_greater_eq(values: Vec<SkinkValue>) -> EvaluationResult {
    builtin_compare(values, |a, b| a >= b)
}

fn builtin_less(values: Vec<SkinkValue>) -> EvaluationResult {
    builtin_compare(values, |a, b| a < b)
}

fn builtin_less_eq(values: Vec<SkinkValue>) -> EvaluationResult {
    builtin_compare(values, |a, b| a <= b)
}

// equal? accepts values of any kind and compares structurally: numbers
// across the integer/float split, pairs by deep car/cdr comparison, nil
// always equal to nil.
fn builtin_equal(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() < 2 {
        return Err(SkinkError::EvaluationError);
    }

    Ok(SkinkValue::Boolean(
        values.iter().tuple_windows().all(|(a, b)| a == b),
    ))
}

fn builtin_not(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    Ok(SkinkValue::Boolean(!values[0].truthy()))
}

fn builtin_cons(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    Ok(SkinkValue::Pair(Rc::new((values[0].clone(), values[1].clone()))))
}

fn builtin_car(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    match &values[0] {
        SkinkValue::Pair(pair) => Ok(pair.0.clone()),
        _ => Err(SkinkError::EvaluationError),
    }
}

fn builtin_cdr(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    match &values[0] {
        SkinkValue::Pair(pair) => Ok(pair.1.clone()),
        _ => Err(SkinkError::EvaluationError),
    }
}

fn builtin_list(mut values: Vec<SkinkValue>) -> EvaluationResult {
    let mut list = SkinkValue::Nil;
    while let Some(value) = values.pop() {
        list = SkinkValue::Pair(Rc::new((value, list)));
    }

    Ok(list)
}

/// Collect a proper list into a vector; anything whose cdr chain does not
/// end in nil is an evaluation error.
pub(crate) fn list_elements(value: &SkinkValue) -> Result<Vec<SkinkValue>, SkinkError> {
    let mut elements = Vec::new();
    let mut current = value;
    loop {
        match current {
            SkinkValue::Nil => return Ok(elements),
            SkinkValue::Pair(pair) => {
                elements.push(pair.0.clone());
                current = &pair.1;
            }
            _ => return Err(SkinkError::EvaluationError),
        }
    }
}

fn builtin_is_list(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    Ok(SkinkValue::Boolean(list_elements(&values[0]).is_ok()))
}

fn builtin_length(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 1 {
        return Err(SkinkError::EvaluationError);
    }

    Ok(SkinkValue::Integer(list_elements(&values[0])?.len() as i64))
}

fn builtin_list_ref(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let index = match &values[1] {
        SkinkValue::Integer(index) if *index >= 0 => *index,
        _ => return Err(SkinkError::EvaluationError),
    };

    // A prefix walk rather than a proper-list check up front: a bare pair
    // supports index 0 even though it is not a proper list.
    let mut current = &values[0];
    for _ in 0..index {
        match current {
            SkinkValue::Pair(pair) => current = &pair.1,
            _ => return Err(SkinkError::EvaluationError),
        }
    }

    match current {
        SkinkValue::Pair(pair) => Ok(pair.0.clone()),
        _ => Err(SkinkError::EvaluationError),
    }
}

fn builtin_append(values: Vec<SkinkValue>) -> EvaluationResult {
    let mut elements = Vec::new();
    for value in &values {
        elements.extend(list_elements(value)?);
    }

    builtin_list(elements)
}

fn builtin_map(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let mapped = list_elements(&values[1])?
        .into_iter()
        .map(|element| apply_function(&values[0], vec![element]))
        .collect::<Result<Vec<_>, _>>()?;

    builtin_list(mapped)
}

fn builtin_filter(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 2 {
        return Err(SkinkError::EvaluationError);
    }

    let mut kept = Vec::new();
    for element in list_elements(&values[1])? {
        if apply_function(&values[0], vec![element.clone()])?.truthy() {
            kept.push(element);
        }
    }

    builtin_list(kept)
}

fn builtin_reduce(values: Vec<SkinkValue>) -> EvaluationResult {
    if values.len() != 3 {
        return Err(SkinkError::EvaluationError);
    }

    let mut accumulator = values[2].clone();
    for element in list_elements(&values[1])? {
        accumulator = apply_function(&values[0], vec![accumulator, element])?;
    }

    Ok(accumulator)
}

fn builtin(name: &'static str, func: BuiltinFn) -> (Rc<str>, SkinkValue) {
    (Rc::from(name), SkinkValue::Builtin(Builtin { name, func }))
}

thread_local! {
    // The terminal frame of every environment chain. Populated once,
    // never written afterwards: top-level definitions go into a child.
    static BUILTIN_FRAME: Rc<Frame> = Frame::root(HashMap::from([
        builtin("+", builtin_add),
        builtin("-", builtin_sub),
        builtin("*", builtin_mul),
        builtin("/", builtin_div),

        builtin(">", builtin_greater),
        builtin(">=", builtin_greater_eq),
        builtin("<", builtin_less),
        builtin("<=", builtin_less_eq),
        builtin("equal?", builtin_equal),
        builtin("not", builtin_not),

        builtin("cons", builtin_cons),
        builtin("car", builtin_car),
        builtin("cdr", builtin_cdr),
        builtin("list", builtin_list),
        builtin("list?", builtin_is_list),
        builtin("length", builtin_length),
        builtin("list-ref", builtin_list_ref),
        builtin("append", builtin_append),
        builtin("map", builtin_map),
        builtin("filter", builtin_filter),
        builtin("reduce", builtin_reduce),
    ]));
}

pub(crate) fn builtin_frame() -> Rc<Frame> {
    BUILTIN_FRAME.with(Rc::clone)
}
