//! DOT rendering of a [`StateMachine`], for visualization with Graphviz.
//!
//! This is a read-only view over the finished machine: finish states are
//! drawn as double circles, the init state is marked in its label, and
//! every transition becomes a labeled edge.

use super::{Label, StateId, StateMachine, Transition};

impl<'a> dot::Labeller<'a, StateId, Transition> for StateMachine {
    fn graph_id(&'a self) -> dot::Id<'a> {
        dot::Id::new("state_machine").unwrap()
    }

    fn node_id(&'a self, n: &StateId) -> dot::Id<'a> {
        dot::Id::new(format!("q{}", n)).unwrap()
    }

    fn node_shape(&'a self, node: &StateId) -> Option<dot::LabelText<'a>> {
        if self.finish_states.contains(node) {
            return Some(dot::LabelText::LabelStr("doublecircle".into()));
        }
        None
    }

    fn node_label(&'a self, n: &StateId) -> dot::LabelText<'a> {
        if self.init_state == Some(*n) {
            return dot::LabelText::LabelStr(format!("{} (Init)", self.node_id(n).name()).into());
        }
        dot::LabelText::LabelStr(self.node_id(n).name())
    }

    fn edge_label(&'a self, e: &Transition) -> dot::LabelText<'a> {
        match e.label() {
            Label::Symbol(s) => dot::LabelText::LabelStr(s.to_string().into()),
            Label::Epsilon => dot::LabelText::LabelStr("ε".into()),
        }
    }

    fn kind(&self) -> dot::Kind {
        dot::Kind::Digraph
    }
}

impl<'a> dot::GraphWalk<'a, StateId, Transition> for StateMachine {
    fn nodes(&'a self) -> dot::Nodes<'a, StateId> {
        self.states.iter().copied().collect::<Vec<_>>().into()
    }

    fn edges(&'a self) -> dot::Edges<'a, Transition> {
        self.transitions.clone().into()
    }

    fn source(&'a self, edge: &Transition) -> StateId {
        edge.from()
    }

    fn target(&'a self, edge: &Transition) -> StateId {
        edge.to()
    }
}
