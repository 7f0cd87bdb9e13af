use std::rc::Rc;

use logos::Logos;

use crate::error::SkinkError;


/// Lexical tokens of the surface syntax. Whitespace separates tokens and
/// `;` comments run to the end of the line; both are skipped by the lexer,
/// so no token ever carries comment text.
#[derive(Debug, Clone, Copy, PartialEq, Logos)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
pub enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    // Any run of characters that is not whitespace, a paren or a
    // comment start; the classifier decides what the chunk means.
    #[regex(r#"[^()\s;]+"#, |lex| lex.slice())]
    Atom(&'a str),
}

// Sexps are the basic building blocks of skink. The Rc innards make a
// clone an O(1) pointer copy, which is what lets the evaluator swap a
// function body into its loop state and share one parsed body across
// every invocation of a closure.
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Nil,
    Symbol(Rc<str>),
    List(Rc<[Sexp]>),
}

type ParseResult<O> = Result<O, SkinkError>;


pub fn tokenize(input: &str) -> ParseResult<Vec<Token<'_>>> {
    let mut tokens = vec![];
    let mut tokenizer = Token::lexer(input);

    while let Some(result) = tokenizer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(_) => return Err(SkinkError::SyntaxError),
        }
    }

    Ok(tokens)
}

/// Classify one atom token: integer, then float, then the fixed boolean
/// and empty-list literals, and anything left over is a symbol.
fn classify(atom: &str) -> Sexp {
    if let Ok(integer) = atom.parse::<i64>() {
        return Sexp::Integer(integer);
    }
    if let Ok(float) = atom.parse::<f64>() {
        return Sexp::Float(float);
    }

    match atom {
        "#t" => Sexp::Boolean(true),
        "#f" => Sexp::Boolean(false),
        "nil" => Sexp::Nil,
        symbol => Sexp::Symbol(Rc::from(symbol)),
    }
}

fn parse_token<'a, 'b: 'a>(token_recognizer: impl Fn(&'a Token<'b>) -> bool) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], &'a Token<'b>)> {
    move |tokens| {
        if tokens.is_empty() { return Err(SkinkError::SyntaxError); }

        if !token_recognizer(&tokens[0]) { return Err(SkinkError::SyntaxError); }
        Ok((&tokens[1..], &tokens[0]))
    }
}

fn parse_surrounds<'a, 'b: 'a, O>(
    start_recognizer: impl Fn(&'a Token<'b>) -> bool,
    internal_parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
    end_recognizer: impl Fn(&'a Token<'b>) -> bool,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    let start_parser = parse_token(start_recognizer);
    let end_parser = parse_token(end_recognizer);

    move |tokens| {
        let (tokens, _) = start_parser(tokens)?;
        let (tokens, internal) = internal_parser(tokens)?;
        let (tokens, _) = end_parser(tokens)?;

        Ok((tokens, internal))
    }
}

fn parse_repeated<'a, 'b: 'a, O>(
    parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Vec<O>)> {
    move |mut tokens| {
        let mut result = vec![];

        while let Ok((new_tokens, value)) = parser(tokens) {
            result.push(value);
            tokens = new_tokens;
        }

        Ok((tokens, result))
    }
}

fn parse_either<'a, 'b: 'a, O>(
    a: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
    b: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)>,
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    move |tokens| {
        if let Ok(a) = a(tokens) {
            return Ok(a);
        }
        b(tokens)
    }
}

fn parser_map<'a, 'b: 'a, I, O>(
    parser: impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], I)>,
    f: impl Fn(I) -> O
) -> impl Fn(&'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], O)> {
    move |tokens| {
        let (tokens, value) = parser(tokens)?;
        Ok((tokens, f(value)))
    }
}

fn parse_atom<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp)> {
    let (tokens, atom) = parse_token(|token| matches!(token, Token::Atom(_)))(tokens)?;
    match atom {
        Token::Atom(atom) => Ok((tokens, classify(atom))),
        _ => unreachable!()
    }
}

fn parse_list<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp)> {
    parse_surrounds(
        |token| matches!(token, Token::LeftParen),
        parser_map(
            parse_repeated(parse_sexp),
            |sexp_list| Sexp::List(sexp_list.into())
        ),
        |token| matches!(token, Token::RightParen)
    )(tokens)
}

fn parse_sexp<'a, 'b: 'a>(tokens: &'a [Token<'b>]) -> ParseResult<(&'a [Token<'b>], Sexp)> {
    parse_either(
        parse_atom,
        parse_list
    )(tokens)
}

/// Parse a token sequence into exactly one expression. Leftover tokens
/// after the first complete expression are a syntax error, as is an
/// unmatched paren in either direction.
pub fn parse(tokens: &[Token<'_>]) -> ParseResult<Sexp> {
    let (tokens, sexp) = parse_sexp(tokens)?;
    if !tokens.is_empty() { return Err(SkinkError::SyntaxError); }

    Ok(sexp)
}

pub fn parse_source(input: &str) -> ParseResult<Sexp> {
    parse(&tokenize(input)?)
}
