//! Normalization of infix regular expressions into postfix token order.
//!
//! The accepted syntax is ASCII letters and digits plus five operators:
//! `|` (alternation), `*` (zero-or-more), `?` (one-or-more), and `(`/`)`
//! for grouping. Concatenation is written by adjacency; the normalizer
//! inserts the internal binary operator `&` between adjacent operands
//! before converting to postfix order.

use std::error::Error;
use std::fmt::Display;

use smallvec::SmallVec;

use crate::Symbol;

/// Alternation operator.
pub const OR: char = '|';
/// Explicit concatenation operator. Internal only, never user-typed.
pub const AND: char = '&';
/// Zero-or-more quantifier.
pub const ZERO_OR_MORE: char = '*';
/// One-or-more quantifier. Note that this deviates from the common regex
/// convention, where `?` means zero-or-one.
pub const ONE_OR_MORE: char = '?';
/// Opening group bracket.
pub const OPEN_BRACKET: char = '(';
/// Closing group bracket.
pub const CLOSE_BRACKET: char = ')';

/// Errors raised while turning a regex string into an automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexError {
    /// The regex (or an input word) contains a character outside the
    /// accepted alphabet.
    InvalidSymbol(char),
    /// The regex contains mismatched `(`/`)` brackets.
    UnbalancedBrackets,
    /// The postfix token stream is malformed: an operator starved the
    /// operand stack, or more than one machine was left at the end.
    Structure(&'static str),
}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegexError::InvalidSymbol(c) => write!(f, "invalid symbol in regex: {:?}", c),
            RegexError::UnbalancedBrackets => write!(f, "unbalanced brackets in regex"),
            RegexError::Structure(msg) => write!(f, "malformed regex: {}", msg),
        }
    }
}

impl Error for RegexError {}

/// A single regex token.
/// Brackets only exist in infix order; they are consumed during the
/// conversion to postfix and never reach the Thompson builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// A literal alphabet symbol.
    Literal(Symbol),
    /// Alternation (`|`).
    Union,
    /// Concatenation (`&`).
    Concat,
    /// Zero-or-more repetition (`*`).
    Star,
    /// One-or-more repetition (`?`).
    Plus,
    /// Opening bracket.
    Open,
    /// Closing bracket.
    Close,
}

impl Token {
    fn from_char(c: char) -> Result<Self, RegexError> {
        match c {
            OR => Ok(Token::Union),
            AND => Ok(Token::Concat),
            ZERO_OR_MORE => Ok(Token::Star),
            ONE_OR_MORE => Ok(Token::Plus),
            OPEN_BRACKET => Ok(Token::Open),
            CLOSE_BRACKET => Ok(Token::Close),
            _ => Symbol::new(c).map(Token::Literal),
        }
    }

    /// Returns true for the binary operators `|` and `&`.
    fn is_binary(&self) -> bool {
        matches!(self, Token::Union | Token::Concat)
    }

    /// Returns true for the postfix quantifiers `*` and `?`.
    fn is_quantifier(&self) -> bool {
        matches!(self, Token::Star | Token::Plus)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Literal(s) => write!(f, "{}", s),
            Token::Union => write!(f, "{}", OR),
            Token::Concat => write!(f, "{}", AND),
            Token::Star => write!(f, "{}", ZERO_OR_MORE),
            Token::Plus => write!(f, "{}", ONE_OR_MORE),
            Token::Open => write!(f, "{}", OPEN_BRACKET),
            Token::Close => write!(f, "{}", CLOSE_BRACKET),
        }
    }
}

/// Validates an infix regex and rewrites it into postfix token order.
///
/// Whitespace is stripped first. Any other character outside the accepted
/// alphabet fails with [`RegexError::InvalidSymbol`]. Implicit concatenation
/// operators are inserted between adjacent operands, then the expression is
/// converted to postfix with a single-slot operator fold: before pushing a
/// binary operator, at most one operator is popped from the stack to the
/// output. Quantifiers and literals are already postfix by position and go
/// straight to the output.
///
/// The single-slot fold is intentionally not full precedence climbing;
/// together with implicit concatenation it reproduces the expected token
/// order and must not be replaced by a precedence-ordered pop loop, since
/// downstream state numbering depends on the exact output order.
pub fn prepare(infix: &str) -> Result<Vec<Token>, RegexError> {
    let mut tokens: SmallVec<[Token; 16]> = SmallVec::new();
    for c in infix.chars().filter(|c| !c.is_whitespace()) {
        tokens.push(Token::from_char(c)?);
    }

    // Insert implicit concatenation: after an operand (not an opening
    // bracket or a binary operator), if the next token is itself the start
    // of an operand, the two are concatenated.
    let mut spliced: Vec<Token> = Vec::with_capacity(tokens.len() * 2);
    for (i, &tok) in tokens.iter().enumerate() {
        spliced.push(tok);
        if tok != Token::Open && !tok.is_binary() {
            if let Some(&next) = tokens.get(i + 1) {
                if next != Token::Close && !next.is_binary() && !next.is_quantifier() {
                    spliced.push(Token::Concat);
                }
            }
        }
    }

    // Infix to postfix.
    let mut postfix: Vec<Token> = Vec::with_capacity(spliced.len());
    let mut operators: SmallVec<[Token; 8]> = SmallVec::new();
    let mut bracket_count: i32 = 0;

    for tok in spliced {
        match tok {
            Token::Union | Token::Concat => {
                if let Some(&top) = operators.last() {
                    if top != Token::Open {
                        postfix.push(operators.pop().unwrap());
                    }
                }
                operators.push(tok);
            }
            Token::Open => {
                bracket_count += 1;
                operators.push(tok);
            }
            Token::Close => {
                if operators.is_empty() {
                    return Err(RegexError::UnbalancedBrackets);
                }
                bracket_count -= 1;
                if *operators.last().unwrap() != Token::Open {
                    postfix.push(operators.pop().unwrap());
                }
                // Discard the matching opening bracket.
                if operators.pop().is_none() {
                    return Err(RegexError::UnbalancedBrackets);
                }
            }
            _ => postfix.push(tok),
        }
    }

    // The single-slot fold leaves at most one non-bracket operator behind.
    if let Some(op) = operators.pop() {
        postfix.push(op);
    }

    if bracket_count != 0 {
        return Err(RegexError::UnbalancedBrackets);
    }

    Ok(postfix)
}
