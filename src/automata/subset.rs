//! Subset construction: conversion of an NFA into an equivalent DFA.
//!
//! Each reachable set of NFA states becomes a single DFA state. DFA
//! identifiers are assigned in discovery order starting at 0, with a FIFO
//! worklist, so the output numbering is deterministic.

use std::collections::VecDeque;
use std::fmt::Display;

use bit_set::BitSet;
use indexmap::IndexMap;

use super::{Label, MachineError, StateId, StateMachine};

/// A set of NFA states, corresponding to a single state of the DFA.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
struct StateSet(BitSet);

impl StateSet {
    fn insert(&mut self, state: StateId) {
        self.0.insert(state);
    }

    /// Iterates the contained states in ascending order.
    fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.0.iter()
    }

    fn to_vec(&self) -> Vec<StateId> {
        self.iter().collect()
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<T: IntoIterator<Item = StateId>>(iter: T) -> Self {
        let mut set = StateSet::default();
        for state in iter {
            set.insert(state);
        }
        set
    }
}

impl Display for StateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        write!(f, "{{")?;
        for state in self.iter() {
            if first {
                first = false;
            } else {
                write!(f, ", ")?;
            }
            write!(f, "{}", state)?;
        }
        write!(f, "}}")
    }
}

/// Converts an NFA into an equivalent DFA via subset construction.
///
/// The DFA preserves the NFA's alphabet and its symbol discovery order.
/// A DFA state is a finish state iff its underlying subset contains an NFA
/// finish state. The resulting machine has no catch state; that marker is
/// meaningless once construction leaves the Thompson stage.
///
/// The number of DFA states can be exponential in the number of NFA
/// states.
pub fn determinize(nfa: &StateMachine) -> Result<StateMachine, MachineError> {
    let init = nfa
        .init_state()
        .ok_or(MachineError::Incomplete("init state"))?;

    let mut dfa = StateMachine::new();
    dfa.alphabet = nfa.alphabet.clone();

    // Maps each discovered subset of NFA states to its DFA identifier.
    let mut subset_ids: IndexMap<StateSet, StateId> = IndexMap::new();
    let mut queue: VecDeque<StateSet> = VecDeque::new();

    let seed: StateSet = nfa.epsilon_closure(init)?.into_iter().collect();
    dfa.set_init_state(0)?;
    if seed.iter().any(|q| nfa.is_finish(q)) {
        dfa.add_finish_state(0);
    }
    subset_ids.insert(seed.clone(), 0);
    queue.push_back(seed);

    let symbols: Vec<_> = nfa.alphabet().collect();

    while let Some(subset) = queue.pop_front() {
        // Subsets are registered before they are enqueued.
        let from = subset_ids[&subset];
        let sources = subset.to_vec();
        for &symbol in &symbols {
            let moved = nfa.move_set(&sources, symbol)?;
            if moved.is_empty() {
                continue;
            }
            let target: StateSet = nfa.epsilon_closure_set(&moved)?.into_iter().collect();
            let to = match subset_ids.get(&target) {
                Some(&id) => id,
                None => {
                    let id = subset_ids.len();
                    if target.iter().any(|q| nfa.is_finish(q)) {
                        dfa.add_finish_state(id);
                    }
                    subset_ids.insert(target.clone(), id);
                    queue.push_back(target);
                    id
                }
            };
            dfa.add_transition(from, to, Label::Symbol(symbol));
        }
    }

    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::build_nfa;
    use crate::regex::prepare;
    use crate::Symbol;

    fn sym(c: char) -> Symbol {
        Symbol::new(c).unwrap()
    }

    fn dfa_for(regex: &str) -> StateMachine {
        let nfa = build_nfa(&prepare(regex).unwrap()).unwrap();
        determinize(&nfa).unwrap()
    }

    /// Every state of a determinized machine has at most one successor per
    /// symbol.
    fn assert_deterministic(dfa: &StateMachine) {
        for state in dfa.states() {
            for symbol in dfa.alphabet() {
                assert!(dfa.move_on(state, symbol).unwrap().len() <= 1);
            }
        }
    }

    #[test]
    fn test_single_literal() {
        let dfa = dfa_for("a");
        assert_eq!(dfa.init_state(), Some(0));
        assert_eq!(dfa.num_states(), 2);
        assert_eq!(dfa.finish_states().collect::<Vec<_>>(), vec![1]);
        assert_deterministic(&dfa);
    }

    #[test]
    fn test_catch_state_dropped() {
        let dfa = dfa_for("ab");
        assert_eq!(dfa.catch_state(), None);
    }

    #[test]
    fn test_union_collapses_branches() {
        let dfa = dfa_for("a|b");
        assert_deterministic(&dfa);
        assert_eq!(dfa.init_state(), Some(0));
        // One a-successor and one b-successor from the start subset.
        assert_eq!(dfa.move_on(0, sym('a')).unwrap().len(), 1);
        assert_eq!(dfa.move_on(0, sym('b')).unwrap().len(), 1);
    }

    #[test]
    fn test_ids_in_discovery_order() {
        // (a|b)*abb discovers one subset per symbol in alphabet order from
        // each processed subset, FIFO.
        let dfa = dfa_for("(a|b)*abb");
        assert_eq!(dfa.states().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(dfa.init_state(), Some(0));
        assert_eq!(dfa.finish_states().collect::<Vec<_>>(), vec![4]);
        assert_eq!(
            dfa.alphabet().collect::<Vec<_>>(),
            vec![sym('a'), sym('b')]
        );
        assert_deterministic(&dfa);
    }

    #[test]
    fn test_star_initial_is_finish() {
        let dfa = dfa_for("(a|b)*");
        assert!(dfa.is_finish(0));
        assert_deterministic(&dfa);
    }

    #[test]
    fn test_alphabet_preserved() {
        let dfa = dfa_for("a?b?(abc)*");
        assert_eq!(
            dfa.alphabet().collect::<Vec<_>>(),
            vec![sym('a'), sym('b'), sym('c')]
        );
        assert_deterministic(&dfa);
    }
}
