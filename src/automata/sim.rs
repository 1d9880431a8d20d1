//! Deterministic simulation of an input word against a DFA.

use crate::{Symbol, Word};

use super::{MachineError, StateId, StateMachine};

/// One step of a deterministic run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub from: StateId,
    pub symbol: Symbol,
    pub to: StateId,
}

/// The outcome of a simulation: the verdict plus the ordered transitions
/// taken, for diagnostic replay. A rejected run may end before the input
/// is exhausted, when a state has no successor on the next symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub accepted: bool,
    pub steps: Vec<Step>,
}

/// Runs the given word through a DFA, starting at the init state.
///
/// Each symbol must lead to exactly one successor; an empty successor set
/// (or, defensively, more than one — which a true DFA never produces)
/// rejects immediately. After the whole word is consumed, the word is
/// accepted iff the current state is a finish state. The empty word is
/// accepted iff the init state is a finish state.
pub fn simulate(dfa: &StateMachine, word: &Word) -> Result<Run, MachineError> {
    let init = dfa
        .init_state()
        .ok_or(MachineError::Incomplete("init state"))?;

    let mut current = init;
    let mut steps = Vec::with_capacity(word.len());
    for symbol in word.iter() {
        let successors = dfa.move_on(current, symbol)?;
        if successors.len() != 1 {
            return Ok(Run {
                accepted: false,
                steps,
            });
        }
        let next = successors[0];
        steps.push(Step {
            from: current,
            symbol,
            to: next,
        });
        current = next;
    }

    Ok(Run {
        accepted: dfa.is_finish(current),
        steps,
    })
}

/// Returns if the DFA accepts the given word.
pub fn accepts(dfa: &StateMachine, word: &Word) -> Result<bool, MachineError> {
    simulate(dfa, word).map(|run| run.accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automata::{build_nfa, determinize, minimize};
    use crate::regex::prepare;

    fn dfa_for(regex: &str) -> StateMachine {
        let nfa = build_nfa(&prepare(regex).unwrap()).unwrap();
        let mut dfa = determinize(&nfa).unwrap();
        minimize(&mut dfa).unwrap();
        dfa
    }

    fn word(s: &str) -> Word {
        Word::try_from(s).unwrap()
    }

    #[test]
    fn test_accepts_classic() {
        let dfa = dfa_for("(a|b)*abb");
        assert!(accepts(&dfa, &word("ababaabb")).unwrap());
        assert!(!accepts(&dfa, &word("ababaab")).unwrap());
    }

    #[test]
    fn test_empty_word() {
        let dfa = dfa_for("(a|b)*abb");
        assert!(!accepts(&dfa, &word("")).unwrap());
        let star = dfa_for("(a|b)*");
        assert!(accepts(&star, &word("")).unwrap());
    }

    #[test]
    fn test_symbol_outside_alphabet_rejects() {
        let dfa = dfa_for("(a|b)*abb");
        let run = simulate(&dfa, &word("abc")).unwrap();
        assert!(!run.accepted);
        // The run dies on 'c' with two steps already taken.
        assert_eq!(run.steps.len(), 2);
    }

    #[test]
    fn test_trace_replays_run() {
        let dfa = dfa_for("(a|b)*abb");
        let run = simulate(&dfa, &word("abb")).unwrap();
        assert!(run.accepted);
        assert_eq!(run.steps.len(), 3);
        assert_eq!(run.steps[0].from, dfa.init_state().unwrap());
        for pair in run.steps.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert!(dfa.is_finish(run.steps.last().unwrap().to));
    }

    #[test]
    fn test_simulate_incomplete_machine() {
        let sm = StateMachine::new();
        assert_eq!(
            simulate(&sm, &word("a")),
            Err(MachineError::Incomplete("init state"))
        );
    }

    #[test]
    fn test_one_or_more() {
        // `?` is one-or-more in this syntax.
        let dfa = dfa_for("a?");
        assert!(!accepts(&dfa, &word("")).unwrap());
        assert!(accepts(&dfa, &word("a")).unwrap());
        assert!(accepts(&dfa, &word("aaa")).unwrap());
        assert!(!accepts(&dfa, &word("b")).unwrap());
    }
}
