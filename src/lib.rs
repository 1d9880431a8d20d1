//! Exact regex matching through explicit automaton construction.
//!
//! A regular expression is normalized to postfix order, compiled into an
//! NFA by Thompson construction, determinized by subset construction, and
//! minimized by partition refinement; input words are then decided by
//! deterministic simulation. Every intermediate automaton is an ordinary
//! [`StateMachine`](automata::StateMachine) value that can be inspected,
//! printed or rendered to DOT.

pub mod automata;
pub mod regex;

use std::fmt::Display;

use quickcheck::Arbitrary;

use automata::{MachineError, StateMachine};
use regex::RegexError;

/// A single input symbol: an ASCII letter or digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(char);

impl Symbol {
    /// Creates a new `Symbol`.
    /// Fails with [`RegexError::InvalidSymbol`] for any character outside
    /// ASCII letters and digits.
    pub fn new(c: char) -> Result<Self, RegexError> {
        if c.is_ascii_alphanumeric() {
            Ok(Symbol(c))
        } else {
            Err(RegexError::InvalidSymbol(c))
        }
    }

    /// The `char` representation of this symbol.
    pub fn as_char(self) -> char {
        self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Arbitrary for Symbol {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        const ALPHANUMERIC: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        Symbol(*g.choose(ALPHANUMERIC).unwrap() as char)
    }
}

/// An input word over the symbol alphabet. This is the type fed to the
/// simulator; conversion from `&str` validates every character.
///
/// # Examples
/// ```
/// use remin::Word;
/// let word = Word::try_from("abb").unwrap();
/// assert_eq!(word.len(), 3);
/// assert!(Word::try_from("a b").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Word(Vec<Symbol>);

impl Word {
    /// The empty word.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An iterator over the symbols of the word.
    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<&str> for Word {
    type Error = RegexError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.chars().map(Symbol::new).collect()
    }
}

impl FromIterator<Symbol> for Word {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Word(iter.into_iter().collect())
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for s in self.iter() {
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}

impl Arbitrary for Word {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Word(Vec::arbitrary(g))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        Box::new(self.0.shrink().map(Word))
    }
}

/// Any failure of the regex-to-DFA pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The regex itself is malformed.
    Regex(RegexError),
    /// A structural invariant of a state machine was violated. These
    /// cannot occur when the pipeline stages run in the documented order.
    Machine(MachineError),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Regex(e) => write!(f, "{}", e),
            Error::Machine(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Regex(e) => Some(e),
            Error::Machine(e) => Some(e),
        }
    }
}

impl From<RegexError> for Error {
    fn from(e: RegexError) -> Self {
        Error::Regex(e)
    }
}

impl From<MachineError> for Error {
    fn from(e: MachineError) -> Self {
        Error::Machine(e)
    }
}

/// Compiles a regex into its minimal DFA.
///
/// # Examples
/// ```
/// use remin::compile;
/// let dfa = compile("(a|b)*abb").unwrap();
/// assert_eq!(dfa.num_states(), 4);
/// ```
pub fn compile(regex: &str) -> Result<StateMachine, Error> {
    let mut dfa = compile_unminimized(regex)?;
    automata::minimize(&mut dfa)?;
    Ok(dfa)
}

/// Compiles a regex into a DFA without the final minimization step.
/// The result accepts the same language as the minimal DFA but may carry
/// redundant states.
pub fn compile_unminimized(regex: &str) -> Result<StateMachine, Error> {
    let tokens = regex::prepare(regex)?;
    let nfa = automata::build_nfa(&tokens)?;
    let dfa = automata::determinize(&nfa)?;
    Ok(dfa)
}

/// Decides whether `input` is a member of the language described by
/// `regex`.
///
/// # Examples
/// ```
/// use remin::matches;
/// assert!(matches("(a|b)*abb", "ababaabb").unwrap());
/// assert!(!matches("(a|b)*abb", "ababaab").unwrap());
/// ```
pub fn matches(regex: &str, input: &str) -> Result<bool, Error> {
    let dfa = compile(regex)?;
    let word = Word::try_from(input)?;
    automata::accepts(&dfa, &word).map_err(Into::into)
}
