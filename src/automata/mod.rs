//! Finite state machines and the regex-to-DFA construction pipeline.
//!
//! A single [`StateMachine`] representation is shared by every pipeline
//! stage: the Thompson builder produces it as an NFA, subset construction
//! rewrites it into a DFA, and the minimizer collapses equivalent DFA
//! states in place.

mod dot;
mod minimize;
mod sim;
mod subset;
mod thompson;

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use bit_set::BitSet;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::Symbol;

pub use minimize::minimize;
pub use sim::{accepts, simulate, Run, Step};
pub use subset::determinize;
pub use thompson::build_nfa;

/// Every state in an automaton is identified by a non-negative integer.
pub type StateId = usize;

/// The label of a transition: either a single alphabet symbol, consumed
/// from the input when the transition is taken, or epsilon, which is taken
/// without consuming any input.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Label {
    /// A transition taken on the given input symbol.
    Symbol(Symbol),
    /// An epsilon transition, taken without consuming input.
    Epsilon,
}

impl Label {
    /// Returns true if this is an epsilon transition.
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Symbol(s) => write!(f, "{}", s),
            Label::Epsilon => write!(f, "ε"),
        }
    }
}

/// A labeled directed edge between two states.
/// States are referenced purely by identifier, so two sub-machines fuse
/// automatically when an identifier is shared between them.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Transition {
    from: StateId,
    to: StateId,
    label: Label,
}

impl Transition {
    pub fn new(from: StateId, to: StateId, label: Label) -> Self {
        Self { from, to, label }
    }

    /// The source state of the transition.
    pub fn from(&self) -> StateId {
        self.from
    }

    /// The destination state of the transition.
    pub fn to(&self) -> StateId {
        self.to
    }

    /// The label of the transition.
    pub fn label(&self) -> Label {
        self.label
    }
}

/// Contract violations on a [`StateMachine`].
/// These indicate a pipeline stage being invoked out of order or with
/// arguments that break a structural invariant; they are not recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineError {
    /// The init state was set twice.
    InitAlreadySet,
    /// The catch state was set twice.
    CatchAlreadySet,
    /// `merge_states` was called with fewer than two distinct states.
    MergeTooFew(usize),
    /// An operation requires a structurally complete machine, but the named
    /// part is missing or empty.
    Incomplete(&'static str),
}

impl Display for MachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineError::InitAlreadySet => write!(f, "init state is already set"),
            MachineError::CatchAlreadySet => write!(f, "catch state is already set"),
            MachineError::MergeTooFew(n) => {
                write!(f, "merge requires at least 2 distinct states, got {}", n)
            }
            MachineError::Incomplete(part) => write!(f, "machine is incomplete: {} missing", part),
        }
    }
}

impl Error for MachineError {}

/// A finite state machine over single-character symbols.
///
/// The same structure represents both nondeterministic and deterministic
/// automata. It consists of a set of states in insertion order, an ordered
/// list of labeled transitions, one init state, the finish states, and the
/// alphabet of symbols observed on transitions (epsilon excluded, in
/// discovery order).
///
/// The catch state is a construction-time marker only: it denotes the
/// single accepting state produced by the most recent Thompson composition
/// step and is used to splice sub-machines together. It carries no meaning
/// after subset construction.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    states: IndexSet<StateId>,
    transitions: Vec<Transition>,
    init_state: Option<StateId>,
    catch_state: Option<StateId>,
    finish_states: IndexSet<StateId>,
    alphabet: IndexSet<Symbol>,
}

impl StateMachine {
    /// Creates a new, empty state machine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the init state. Fails if it is already set.
    /// The state is registered if it is new.
    pub fn set_init_state(&mut self, state: StateId) -> Result<(), MachineError> {
        if self.init_state.is_some() {
            return Err(MachineError::InitAlreadySet);
        }
        self.init_state = Some(state);
        self.states.insert(state);
        Ok(())
    }

    /// Sets the catch state. Fails if it is already set.
    pub fn set_catch_state(&mut self, state: StateId) -> Result<(), MachineError> {
        if self.catch_state.is_some() {
            return Err(MachineError::CatchAlreadySet);
        }
        self.catch_state = Some(state);
        self.states.insert(state);
        Ok(())
    }

    /// Adds a state to the set of finish states. Idempotent.
    pub fn add_finish_state(&mut self, state: StateId) {
        self.finish_states.insert(state);
        self.states.insert(state);
    }

    /// Adds a transition. Both endpoints are registered as states if they
    /// are new, the triple is dropped if it is a duplicate, and a
    /// non-epsilon label is recorded into the alphabet.
    pub fn add_transition(&mut self, from: StateId, to: StateId, label: Label) {
        self.states.insert(from);
        self.states.insert(to);
        let transition = Transition { from, to, label };
        if !self.transitions.contains(&transition) {
            self.transitions.push(transition);
        }
        if let Label::Symbol(sym) = label {
            self.alphabet.insert(sym);
        }
    }

    /// The init state, if set.
    pub fn init_state(&self) -> Option<StateId> {
        self.init_state
    }

    /// The catch state, if set.
    pub fn catch_state(&self) -> Option<StateId> {
        self.catch_state
    }

    /// Returns if the given state is a finish state.
    pub fn is_finish(&self, state: StateId) -> bool {
        self.finish_states.contains(&state)
    }

    /// An iterator over the finish states in insertion order.
    pub fn finish_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.finish_states.iter().copied()
    }

    /// An iterator over all states in insertion order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.iter().copied()
    }

    /// The number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// The transitions, in insertion order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// An iterator over the alphabet in discovery order.
    pub fn alphabet(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.alphabet.iter().copied()
    }

    /// Checks the core structural invariants: a machine must have states,
    /// an init state, at least one finish state, and transitions before the
    /// query and renumbering operations may be used on it.
    fn check_complete(&self) -> Result<(), MachineError> {
        if self.states.is_empty() {
            return Err(MachineError::Incomplete("states"));
        }
        if self.init_state.is_none() {
            return Err(MachineError::Incomplete("init state"));
        }
        if self.finish_states.is_empty() {
            return Err(MachineError::Incomplete("finish states"));
        }
        if self.transitions.is_empty() {
            return Err(MachineError::Incomplete("transitions"));
        }
        Ok(())
    }

    /// Shifts every state identifier up by `1 + offset`: all states, both
    /// endpoints of every transition, the finish states, the init state and
    /// the catch state. Used to make room when splicing one sub-machine's
    /// numbering above another's during Thompson construction.
    pub fn renumber_states(&mut self, offset: usize) -> Result<(), MachineError> {
        self.check_complete()?;
        let shift = 1 + offset;
        self.states = self.states.iter().map(|s| s + shift).collect();
        self.finish_states = self.finish_states.iter().map(|s| s + shift).collect();
        for t in &mut self.transitions {
            t.from += shift;
            t.to += shift;
        }
        self.init_state = self.init_state.map(|s| s + shift);
        self.catch_state = self.catch_state.map(|s| s + shift);
        Ok(())
    }

    /// Returns the epsilon closure of a state: all states reachable from it
    /// using only epsilon transitions, including the state itself. The
    /// result is sorted and duplicate-free.
    pub fn epsilon_closure(&self, state: StateId) -> Result<Vec<StateId>, MachineError> {
        self.check_complete()?;
        let mut closure = BitSet::new();
        let mut stack = vec![state];
        while let Some(q) = stack.pop() {
            if closure.insert(q) {
                for t in &self.transitions {
                    if t.from == q && t.label.is_epsilon() && !closure.contains(t.to) {
                        stack.push(t.to);
                    }
                }
            }
        }
        Ok(closure.iter().collect())
    }

    /// The union of the epsilon closures of the given states, sorted and
    /// duplicate-free.
    pub fn epsilon_closure_set(&self, states: &[StateId]) -> Result<Vec<StateId>, MachineError> {
        let mut union = BitSet::new();
        for &state in states {
            for q in self.epsilon_closure(state)? {
                union.insert(q);
            }
        }
        Ok(union.iter().collect())
    }

    /// The states directly reachable from `state` via a transition on
    /// `symbol`, sorted and duplicate-free. Empty if there is none.
    pub fn move_on(&self, state: StateId, symbol: Symbol) -> Result<Vec<StateId>, MachineError> {
        self.check_complete()?;
        Ok(self
            .transitions
            .iter()
            .filter(|t| t.from == state && t.label == Label::Symbol(symbol))
            .map(|t| t.to)
            .sorted_unstable()
            .dedup()
            .collect())
    }

    /// The union of [`StateMachine::move_on`] over the given states.
    pub fn move_set(
        &self,
        states: &[StateId],
        symbol: Symbol,
    ) -> Result<Vec<StateId>, MachineError> {
        let mut union = BitSet::new();
        for &state in states {
            for q in self.move_on(state, symbol)? {
                union.insert(q);
            }
        }
        Ok(union.iter().collect())
    }

    /// The states with a transition on `symbol` into `state`, sorted and
    /// duplicate-free. The reverse of [`StateMachine::move_on`].
    pub fn predecessors(&self, state: StateId, symbol: Symbol) -> Vec<StateId> {
        self.transitions
            .iter()
            .filter(|t| t.to == state && t.label == Label::Symbol(symbol))
            .map(|t| t.from)
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// The states with a transition on `symbol` into any of the given
    /// states.
    pub fn predecessors_set(&self, states: &[StateId], symbol: Symbol) -> Vec<StateId> {
        let mut union = BitSet::new();
        for &state in states {
            for q in self.predecessors(state, symbol) {
                union.insert(q);
            }
        }
        union.iter().collect()
    }

    /// Collapses all states in `group` into the single smallest identifier
    /// of the group, then re-densifies the remaining state identifiers to a
    /// contiguous zero-based range preserving their relative order.
    /// Transition endpoints, finish states, the init state and the catch
    /// state are rewritten accordingly; duplicate transitions, states and
    /// finish states that result from the collapse are removed, and the
    /// transition list is left in sorted order.
    ///
    /// Returns the mapping from pre-merge identifiers to post-merge
    /// identifiers, so that callers holding further state groups (the
    /// minimizer) can translate them before the next merge.
    pub fn merge_states(
        &mut self,
        group: &[StateId],
    ) -> Result<HashMap<StateId, StateId>, MachineError> {
        let group: Vec<StateId> = group.iter().copied().sorted_unstable().dedup().collect();
        if group.len() < 2 {
            return Err(MachineError::MergeTooFew(group.len()));
        }
        let target = group[0];

        // Dense renumbering over the surviving identifiers, ascending.
        let survivors: Vec<StateId> = self
            .states
            .iter()
            .copied()
            .filter(|s| *s == target || !group.contains(s))
            .sorted_unstable()
            .collect();
        let dense: HashMap<StateId, StateId> = survivors
            .iter()
            .copied()
            .enumerate()
            .map(|(new, old)| (old, new))
            .collect();
        let remap: HashMap<StateId, StateId> = self
            .states
            .iter()
            .copied()
            .map(|s| {
                if group.contains(&s) {
                    (s, dense[&target])
                } else {
                    (s, dense[&s])
                }
            })
            .collect();

        // Every endpoint is a registered state, so the lookups cannot miss.
        for t in &mut self.transitions {
            t.from = remap[&t.from];
            t.to = remap[&t.to];
        }
        self.transitions = self
            .transitions
            .iter()
            .copied()
            .sorted_unstable()
            .dedup()
            .collect();
        self.states = (0..survivors.len()).collect();
        self.finish_states = self
            .finish_states
            .iter()
            .map(|s| remap[s])
            .sorted_unstable()
            .collect();
        self.init_state = self.init_state.map(|s| remap[&s]);
        self.catch_state = self.catch_state.map(|s| remap[&s]);

        Ok(remap)
    }

    /// Returns the DOT representation of the machine, for rendering with
    /// Graphviz.
    pub fn dot(&self) -> String {
        let mut buf = Vec::new();
        ::dot::render(self, &mut buf).unwrap();
        String::from_utf8(buf).expect("DOT output is not valid UTF-8")
    }
}

impl Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "StateMachine {{")?;
        writeln!(f, "\tstates: {:?}", self.states.iter().collect::<Vec<_>>())?;
        writeln!(f, "\ttransitions:")?;
        for t in &self.transitions {
            writeln!(f, "\t\t{} --{}--> {}", t.from, t.label, t.to)?;
        }
        match self.init_state {
            Some(q0) => writeln!(f, "\tinit: {}", q0)?,
            None => writeln!(f, "\tinit: none")?,
        }
        match self.catch_state {
            Some(qc) => writeln!(f, "\tcatch: {}", qc)?,
            None => writeln!(f, "\tcatch: none")?,
        }
        writeln!(
            f,
            "\tfinish: {:?}",
            self.finish_states.iter().collect::<Vec<_>>()
        )?;
        writeln!(
            f,
            "\talphabet: {:?}",
            self.alphabet.iter().map(|s| s.as_char()).collect::<Vec<_>>()
        )?;
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Symbol {
        Symbol::new(c).unwrap()
    }

    /// 0 --a--> 1, init 0, finish = catch = 1.
    fn simple_machine() -> StateMachine {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(1);
        sm.set_catch_state(1).unwrap();
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm
    }

    #[test]
    fn test_set_init_twice() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        assert_eq!(sm.set_init_state(1), Err(MachineError::InitAlreadySet));
    }

    #[test]
    fn test_set_catch_twice() {
        let mut sm = StateMachine::new();
        sm.set_catch_state(1).unwrap();
        assert_eq!(sm.set_catch_state(2), Err(MachineError::CatchAlreadySet));
    }

    #[test]
    fn test_add_transition_registers_states() {
        let mut sm = StateMachine::new();
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        assert_eq!(sm.states().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sm.transitions().len(), 1);
        assert_eq!(sm.alphabet().collect::<Vec<_>>(), vec![sym('a')]);
    }

    #[test]
    fn test_add_transition_deduplicates() {
        let mut sm = StateMachine::new();
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        assert_eq!(sm.transitions().len(), 1);
    }

    #[test]
    fn test_epsilon_not_in_alphabet() {
        let mut sm = StateMachine::new();
        sm.add_transition(0, 1, Label::Epsilon);
        sm.add_transition(1, 2, Label::Symbol(sym('b')));
        assert_eq!(sm.alphabet().collect::<Vec<_>>(), vec![sym('b')]);
    }

    #[test]
    fn test_renumber_incomplete() {
        let mut sm = StateMachine::new();
        assert_eq!(
            sm.renumber_states(0),
            Err(MachineError::Incomplete("states"))
        );
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        assert_eq!(
            sm.renumber_states(0),
            Err(MachineError::Incomplete("init state"))
        );
    }

    #[test]
    fn test_renumber_default_offset() {
        let mut sm = simple_machine();
        sm.renumber_states(0).unwrap();
        assert_eq!(sm.states().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(sm.init_state(), Some(1));
        assert_eq!(sm.catch_state(), Some(2));
        assert_eq!(sm.finish_states().collect::<Vec<_>>(), vec![2]);
        assert_eq!(sm.transitions()[0].from(), 1);
        assert_eq!(sm.transitions()[0].to(), 2);
    }

    #[test]
    fn test_renumber_with_offset() {
        let mut sm = simple_machine();
        sm.renumber_states(2).unwrap();
        assert_eq!(sm.states().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(sm.init_state(), Some(3));
    }

    #[test]
    fn test_epsilon_closure_chain() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(3);
        sm.add_transition(0, 1, Label::Epsilon);
        sm.add_transition(1, 2, Label::Epsilon);
        sm.add_transition(2, 3, Label::Epsilon);
        sm.add_transition(3, 3, Label::Symbol(sym('a')));
        assert_eq!(sm.epsilon_closure(0).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(sm.epsilon_closure(2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_epsilon_closure_only_self() {
        let sm = simple_machine();
        assert_eq!(sm.epsilon_closure(0).unwrap(), vec![0]);
    }

    #[test]
    fn test_epsilon_closure_set_union() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(3);
        sm.add_transition(0, 1, Label::Epsilon);
        sm.add_transition(2, 3, Label::Epsilon);
        sm.add_transition(1, 2, Label::Symbol(sym('a')));
        assert_eq!(sm.epsilon_closure_set(&[0, 2]).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_move_on() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(2);
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(0, 2, Label::Symbol(sym('a')));
        sm.add_transition(0, 2, Label::Symbol(sym('b')));
        assert_eq!(sm.move_on(0, sym('a')).unwrap(), vec![1, 2]);
        assert_eq!(sm.move_on(0, sym('b')).unwrap(), vec![2]);
        assert!(sm.move_on(1, sym('a')).unwrap().is_empty());
    }

    #[test]
    fn test_move_set() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(3);
        sm.add_transition(0, 2, Label::Symbol(sym('a')));
        sm.add_transition(1, 3, Label::Symbol(sym('a')));
        assert_eq!(sm.move_set(&[0, 1], sym('a')).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_predecessors() {
        let mut sm = StateMachine::new();
        sm.add_transition(0, 2, Label::Symbol(sym('a')));
        sm.add_transition(1, 2, Label::Symbol(sym('a')));
        sm.add_transition(3, 2, Label::Symbol(sym('b')));
        assert_eq!(sm.predecessors(2, sym('a')), vec![0, 1]);
        assert_eq!(sm.predecessors(2, sym('b')), vec![3]);
        assert!(sm.predecessors(0, sym('a')).is_empty());
    }

    #[test]
    fn test_predecessors_set() {
        let mut sm = StateMachine::new();
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(2, 3, Label::Symbol(sym('a')));
        assert_eq!(sm.predecessors_set(&[1, 3], sym('a')), vec![0, 2]);
    }

    #[test]
    fn test_merge_too_few() {
        let mut sm = simple_machine();
        assert_eq!(sm.merge_states(&[1]), Err(MachineError::MergeTooFew(1)));
        assert_eq!(sm.merge_states(&[1, 1]), Err(MachineError::MergeTooFew(1)));
    }

    #[test]
    fn test_merge_collapses_and_renumbers() {
        // 0 --a--> 1 --b--> 2, merging {1, 2} with 2 a finish state.
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(2);
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(1, 2, Label::Symbol(sym('b')));
        sm.merge_states(&[1, 2]).unwrap();

        assert_eq!(sm.states().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sm.finish_states().collect::<Vec<_>>(), vec![1]);
        assert_eq!(sm.init_state(), Some(0));
        assert_eq!(
            sm.transitions(),
            &[
                Transition::new(0, 1, Label::Symbol(sym('a'))),
                Transition::new(1, 1, Label::Symbol(sym('b'))),
            ]
        );
    }

    #[test]
    fn test_merge_deduplicates_parallel_transitions() {
        // Both 1 and 2 have an a-edge to 3; after merging {1, 2} the two
        // edges coincide and must be deduplicated.
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(3);
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(0, 2, Label::Symbol(sym('b')));
        sm.add_transition(1, 3, Label::Symbol(sym('a')));
        sm.add_transition(2, 3, Label::Symbol(sym('a')));
        sm.merge_states(&[1, 2]).unwrap();

        assert_eq!(sm.states().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(
            sm.transitions(),
            &[
                Transition::new(0, 1, Label::Symbol(sym('a'))),
                Transition::new(0, 1, Label::Symbol(sym('b'))),
                Transition::new(1, 2, Label::Symbol(sym('a'))),
            ]
        );
    }

    #[test]
    fn test_merge_returns_remap() {
        let mut sm = StateMachine::new();
        sm.set_init_state(0).unwrap();
        sm.add_finish_state(3);
        sm.add_transition(0, 1, Label::Symbol(sym('a')));
        sm.add_transition(1, 2, Label::Symbol(sym('a')));
        sm.add_transition(2, 3, Label::Symbol(sym('a')));
        let remap = sm.merge_states(&[1, 2]).unwrap();
        assert_eq!(remap[&0], 0);
        assert_eq!(remap[&1], 1);
        assert_eq!(remap[&2], 1);
        assert_eq!(remap[&3], 2);
    }
}
