#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// Builtins, literals and loads from variables
#[derive(Arbitrary, Debug)]
enum SkinkAtom {
    Add, Sub, Mul, Div,
    True, False, Nil,
    Greater, GreaterEq,
    Less, LessEq, Equal, Not,

    Cons, Car, Cdr,
    List, IsList, Length,
    ListRef, Append, Map,
    Filter, Reduce,

    Identifier(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for SkinkAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            SkinkAtom::Add => "+",
            SkinkAtom::Sub => "-",
            SkinkAtom::Mul => "*",
            SkinkAtom::Div => "/",
            SkinkAtom::True => "#t",
            SkinkAtom::False => "#f",
            SkinkAtom::Nil => "nil",
            SkinkAtom::Greater => ">",
            SkinkAtom::GreaterEq => ">=",
            SkinkAtom::Less => "<",
            SkinkAtom::LessEq => "<=",
            SkinkAtom::Equal => "equal?",
            SkinkAtom::Not => "not",
            SkinkAtom::Cons => "cons",
            SkinkAtom::Car => "car",
            SkinkAtom::Cdr => "cdr",
            SkinkAtom::List => "list",
            SkinkAtom::IsList => "list?",
            SkinkAtom::Length => "length",
            SkinkAtom::ListRef => "list-ref",
            SkinkAtom::Append => "append",
            SkinkAtom::Map => "map",
            SkinkAtom::Filter => "filter",
            SkinkAtom::Reduce => "reduce",
            SkinkAtom::Identifier(identifier) => identifier,
            SkinkAtom::Integer(value) => return write!(f, "{}", value),
            SkinkAtom::Float(value) => return write!(f, "{}", value),
        })
    }
}

#[derive(Arbitrary, Debug)]
enum SkinkCommand {
    Lambda(Vec<SkinkCommand>),
    Define(Vec<SkinkCommand>),
    If(Vec<SkinkCommand>),
    And(Vec<SkinkCommand>),
    Or(Vec<SkinkCommand>),
    Begin(Vec<SkinkCommand>),
    Del(Vec<SkinkCommand>),
    Let(Vec<SkinkCommand>),
    Set(Vec<SkinkCommand>),

    Atom(SkinkAtom),
}

fn stringify_arguments(values: &[SkinkCommand]) -> String {
    values.iter()
        .map(SkinkCommand::to_string)
        .join(" ")
}

impl fmt::Display for SkinkCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Self::Atom(atom) = self {
            return atom.fmt(f);
        }

        let argument_str = match self {
            SkinkCommand::Lambda(args) |
            SkinkCommand::Define(args) |
            SkinkCommand::If(args) |
            SkinkCommand::And(args) |
            SkinkCommand::Or(args) |
            SkinkCommand::Begin(args) |
            SkinkCommand::Del(args) |
            SkinkCommand::Let(args) |
            SkinkCommand::Set(args)
                => stringify_arguments(args),
            SkinkCommand::Atom(_) => unreachable!("Handled separately at the start")
        };

        write!(f, "({} {})", match self {
            SkinkCommand::Lambda(_) => "lambda",
            SkinkCommand::Define(_) => "define",
            SkinkCommand::If(_) => "if",
            SkinkCommand::And(_) => "and",
            SkinkCommand::Or(_) => "or",
            SkinkCommand::Begin(_) => "begin",
            SkinkCommand::Del(_) => "del",
            SkinkCommand::Let(_) => "let",
            SkinkCommand::Set(_) => "set!",
            SkinkCommand::Atom(_) => unreachable!("Handled separately at the start")
        }, argument_str)
    }
}

fuzz_target!(|commands: Vec<SkinkCommand>| {
    let mut context = skink::EvaluationContext::new();

    for command in commands {
        let command = command.to_string();
        let _ = context.evaluate_str(&command);
    }
});
