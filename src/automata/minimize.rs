//! In-place DFA minimization by backward partition refinement.
//!
//! The partition starts from the accepting/non-accepting split and is
//! refined by predecessor sets until no class contains two distinguishable
//! states. The split/enqueue policy below is deliberately preserved as-is
//! (including which half of a split gets re-enqueued), since the final
//! state numbering observable in tests depends on it; it is not a
//! textbook Hopcroft variant and is not required to be asymptotically
//! optimal.

use std::collections::VecDeque;

use itertools::Itertools;

use super::{MachineError, StateId, StateMachine};

/// Minimizes a DFA in place by collapsing equivalent states.
///
/// After refinement stabilizes, every equivalence class of two or more
/// states is merged via [`StateMachine::merge_states`], which re-densifies
/// the state numbering; the classes still pending are translated through
/// each merge's renumbering map so successive merges stay coherent.
///
/// Minimizing an already minimal DFA leaves its structure unchanged up to
/// renumbering.
pub fn minimize(dfa: &mut StateMachine) -> Result<(), MachineError> {
    dfa.check_complete()?;

    let finish: Vec<StateId> = dfa.finish_states().sorted_unstable().collect();
    let rest: Vec<StateId> = dfa
        .states()
        .filter(|s| !dfa.is_finish(*s))
        .sorted_unstable()
        .collect();

    let mut classes: Vec<Vec<StateId>> = vec![finish.clone(), rest.clone()];
    let mut queue: VecDeque<Vec<StateId>> = VecDeque::new();
    queue.push_back(finish);
    queue.push_back(rest);

    let symbols: Vec<_> = dfa.alphabet().collect();

    while let Some(class) = queue.pop_front() {
        for &symbol in &symbols {
            let preds = dfa.predecessors_set(&class, symbol);
            if preds.is_empty() {
                continue;
            }
            // Snapshot before mutation: splits produced for this symbol do
            // not feed back into the same pass.
            let snapshot = classes.clone();
            for d in snapshot {
                let (intersection, subtraction): (Vec<StateId>, Vec<StateId>) =
                    d.iter().copied().partition(|s| preds.binary_search(s).is_ok());
                if intersection.is_empty() || subtraction.is_empty() {
                    continue;
                }
                if let Some(pos) = classes.iter().position(|c| *c == d) {
                    classes.remove(pos);
                    classes.push(intersection.clone());
                    classes.push(subtraction.clone());
                }
                match queue.iter().position(|c| *c == d) {
                    Some(pos) => {
                        // The split class is still awaiting processing:
                        // both halves take its place.
                        queue.remove(pos);
                        queue.push_back(intersection);
                        queue.push_back(subtraction);
                    }
                    None => {
                        // Otherwise only the smaller half needs processing,
                        // ties broken toward the intersection.
                        if intersection.len() <= subtraction.len() {
                            queue.push_back(intersection);
                        } else {
                            queue.push_back(subtraction);
                        }
                    }
                }
            }
        }
    }

    let mut pending: Vec<Vec<StateId>> = classes.into_iter().filter(|c| c.len() >= 2).collect();
    for i in 0..pending.len() {
        let class = pending[i].clone();
        let remap = dfa.merge_states(&class)?;
        for later in pending[i + 1..].iter_mut() {
            for state in later.iter_mut() {
                *state = remap[state];
            }
        }
    }

    Ok(())
}
