//! Thompson construction of an NFA from a postfix token sequence.
//!
//! The postfix stream is evaluated with an explicit stack of owned partial
//! machines. Sub-machines are fused by identifier sharing: renumbering the
//! right operand so that its init state carries the same identifier as the
//! left operand's catch state unions their edges without an explicit merge
//! step, because transitions reference states purely by identifier.

use crate::regex::{RegexError, Token};
use crate::{Error, Symbol};

use super::{Label, StateMachine};

/// Builds an NFA from a postfix token sequence.
///
/// An operator with too few operands on the stack, a bracket token leaking
/// into the stream, or more than one machine left at the end fails with
/// [`RegexError::Structure`]; the normalizer's bracket and operator
/// balancing prevents all three for well-formed input.
pub fn build_nfa(tokens: &[Token]) -> Result<StateMachine, Error> {
    let mut stack: Vec<StateMachine> = Vec::new();

    for &token in tokens {
        match token {
            Token::Literal(symbol) => stack.push(literal(symbol)?),
            Token::Star => {
                let sm = pop_one(&mut stack)?;
                stack.push(zero_or_more(sm)?);
            }
            Token::Plus => {
                let sm = pop_one(&mut stack)?;
                stack.push(one_or_more(sm)?);
            }
            Token::Concat => {
                let (sm1, sm2) = pop_two(&mut stack)?;
                stack.push(concat(sm1, sm2)?);
            }
            Token::Union => {
                let (sm1, sm2) = pop_two(&mut stack)?;
                stack.push(union(sm1, sm2)?);
            }
            Token::Open | Token::Close => {
                return Err(RegexError::Structure("bracket token in postfix stream").into())
            }
        }
    }

    let nfa = stack
        .pop()
        .ok_or(RegexError::Structure("empty token stream"))?;
    if !stack.is_empty() {
        return Err(RegexError::Structure("leftover operands after evaluation").into());
    }
    Ok(nfa)
}

fn pop_one(stack: &mut Vec<StateMachine>) -> Result<StateMachine, Error> {
    stack
        .pop()
        .ok_or_else(|| RegexError::Structure("quantifier without operand").into())
}

/// Pops the two topmost machines; the deeper one is the left operand.
fn pop_two(stack: &mut Vec<StateMachine>) -> Result<(StateMachine, StateMachine), Error> {
    let sm2 = stack
        .pop()
        .ok_or(RegexError::Structure("binary operator without operands"))?;
    let sm1 = stack
        .pop()
        .ok_or(RegexError::Structure("binary operator with one operand"))?;
    Ok((sm1, sm2))
}

/// The 2-state machine for a single symbol: `0 --s--> 1`, with state 1
/// both finish and catch state.
fn literal(symbol: Symbol) -> Result<StateMachine, Error> {
    let mut sm = StateMachine::new();
    sm.set_init_state(0)?;
    sm.add_finish_state(1);
    sm.set_catch_state(1)?;
    sm.add_transition(0, 1, Label::Symbol(symbol));
    Ok(sm)
}

/// Concatenation: `sm2` is renumbered so that its init state becomes equal
/// to `sm1`'s catch state, which fuses the two states into one. The result
/// keeps `sm1`'s init state and takes `sm2`'s catch state as both finish
/// and catch state.
fn concat(sm1: StateMachine, mut sm2: StateMachine) -> Result<StateMachine, Error> {
    let catch1 = sm1
        .catch_state()
        .ok_or(super::MachineError::Incomplete("catch state"))?;

    let mut sm = StateMachine::new();
    sm.set_init_state(sm1.init_state().ok_or(super::MachineError::Incomplete("init state"))?)?;
    for t in sm1.transitions() {
        sm.add_transition(t.from(), t.to(), t.label());
    }

    // sm2's states are numbered from 0, so shifting them by catch1 places
    // sm2's init state exactly on sm1's catch state.
    sm2.renumber_states(catch1.saturating_sub(1))?;
    for t in sm2.transitions() {
        sm.add_transition(t.from(), t.to(), t.label());
    }

    let catch2 = sm2
        .catch_state()
        .ok_or(super::MachineError::Incomplete("catch state"))?;
    sm.add_finish_state(catch2);
    sm.set_catch_state(catch2)?;
    Ok(sm)
}

/// Alternation: a fresh init state 0 branches by epsilon into both
/// sub-machines, which are renumbered into disjoint ranges, and both
/// sub-catch states reach a fresh catch state by epsilon.
fn union(mut sm1: StateMachine, mut sm2: StateMachine) -> Result<StateMachine, Error> {
    let mut sm = StateMachine::new();
    sm.set_init_state(0)?;

    sm1.renumber_states(0)?;
    let catch1 = sm1
        .catch_state()
        .ok_or(super::MachineError::Incomplete("catch state"))?;
    sm2.renumber_states(catch1)?;
    let catch2 = sm2
        .catch_state()
        .ok_or(super::MachineError::Incomplete("catch state"))?;

    let init1 = sm1.init_state().ok_or(super::MachineError::Incomplete("init state"))?;
    let init2 = sm2.init_state().ok_or(super::MachineError::Incomplete("init state"))?;
    sm.add_transition(0, init1, Label::Epsilon);
    sm.add_transition(0, init2, Label::Epsilon);

    for t in sm1.transitions().iter().chain(sm2.transitions()) {
        sm.add_transition(t.from(), t.to(), t.label());
    }

    sm.add_finish_state(catch2 + 1);
    sm.set_catch_state(catch2 + 1)?;
    sm.add_transition(catch1, catch2 + 1, Label::Epsilon);
    sm.add_transition(catch2, catch2 + 1, Label::Epsilon);
    Ok(sm)
}

/// Zero-or-more repetition: a fresh init state 0 reaches both the
/// sub-machine and a fresh catch state by epsilon; the sub-catch state
/// loops back to the sub-init state and also reaches the fresh catch
/// state.
fn zero_or_more(mut sm1: StateMachine) -> Result<StateMachine, Error> {
    let mut sm = StateMachine::new();
    sm.set_init_state(0)?;

    sm1.renumber_states(0)?;
    let init1 = sm1.init_state().ok_or(super::MachineError::Incomplete("init state"))?;
    let catch1 = sm1
        .catch_state()
        .ok_or(super::MachineError::Incomplete("catch state"))?;

    for t in sm1.transitions() {
        sm.add_transition(t.from(), t.to(), t.label());
    }
    // Loop edge enabling repetition.
    sm.add_transition(catch1, init1, Label::Epsilon);

    sm.add_finish_state(catch1 + 1);
    sm.set_catch_state(catch1 + 1)?;
    sm.add_transition(0, init1, Label::Epsilon);
    sm.add_transition(0, catch1 + 1, Label::Epsilon);
    sm.add_transition(catch1, catch1 + 1, Label::Epsilon);
    Ok(sm)
}

/// One-or-more repetition, built as one mandatory pass concatenated with a
/// zero-or-more repetition of a structural copy.
fn one_or_more(sm1: StateMachine) -> Result<StateMachine, Error> {
    let sm2 = zero_or_more(sm1.clone())?;
    concat(sm1, sm2)
}
