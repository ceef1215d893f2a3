//! Conventional circuit-building interface over a [`Graph`].
//!
//! A [`Circuit`] tracks, for every live wire, the graph node currently at its
//! end (its *tail*). Wires are named by [`Label`]s: each qubit starts out as
//! `Label::Qubit(k)`, and applying an operator to several labels at once
//! consumes them and registers the result under the group of those labels.
//!
//! ```
//! # use qsim::circuit::{ Circuit, Label };
//! # fn main() -> Result<(), qsim::circuit::CircuitError> {
//! let mut circuit = Circuit::new(2);
//! circuit.initialize_bits(&[1, 1])?;
//! circuit.cnot().on([0, 1])?;
//! let states = circuit.execute()?;
//! let out = &states[&Label::group([0, 1])];
//! assert_eq!(out[2].re, 1.0); // ∣10⟩
//! # Ok(())
//! # }
//! ```

use std::fmt;
use itertools::Itertools;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use tracing::debug;
use crate::{
    algebra::{ self, Matrix, StateVector },
    error,
    eval::{ self, Evaluation },
    gates,
    graph::{ Graph, Node, NodeId },
    operator::Operator,
    schedule,
};

#[derive(Debug, Error)]
pub enum CircuitError {
    /// Returned when a target label does not name a live wire.
    #[error("label {0} does not name a live wire")]
    UnknownLabel(Label),

    /// Returned when the same label is targeted twice by one operation.
    #[error("label {0} is targeted more than once")]
    DuplicateTarget(Label),

    /// Returned when an operation is given no targets.
    #[error("operation requires at least one target")]
    NoTargets,

    /// Returned when the number of initial values does not match the number of
    /// qubits.
    #[error("expected {0} initial value(s), got {1}")]
    InitCount(usize, usize),

    /// Returned when executing a circuit with no initial state.
    #[error("circuit has no initial state")]
    NotInitialized,

    /// Returned when requesting results from a circuit that has not been
    /// executed since it was last modified.
    #[error("circuit has not been executed")]
    NotExecuted,

    #[error("simulation error: {0}")]
    SimError(#[from] crate::error::SimError),
}
pub type CircuitResult<T> = Result<T, CircuitError>;
use CircuitError::*;

/// Names a live wire (or bundle of wires) in a [`Circuit`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// A single qubit, by index.
    Qubit(usize),
    /// The output of an operation applied to several labels, in order.
    Group(Vec<Label>),
}

impl From<usize> for Label {
    fn from(k: usize) -> Self { Self::Qubit(k) }
}

impl Label {
    /// Create a new `Group` label.
    pub fn group<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        Self::Group(labels.into_iter().map(|l| l.into()).collect())
    }

    /// Return `true` if `self` is `Qubit`.
    pub fn is_qubit(&self) -> bool { matches!(self, Self::Qubit(_)) }

    /// Return `true` if `self` is `Group`.
    pub fn is_group(&self) -> bool { matches!(self, Self::Group(_)) }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qubit(k) => write!(f, "{}", k),
            Self::Group(labels) => write!(f, "({})", labels.iter().join(", ")),
        }
    }
}

/// A pending application of an operator, waiting for its targets.
///
/// Created by [`Circuit::op`] and its shorthands.
#[derive(Debug)]
pub struct OpHandle<'a> {
    circuit: &'a mut Circuit,
    op: Operator,
}

impl<'a> OpHandle<'a> {
    /// Apply the operator to the given targets, in order. See
    /// [`Circuit::apply`].
    pub fn on<I, L>(self, targets: I) -> CircuitResult<NodeId>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        self.circuit.apply(self.op, targets)
    }
}

/// A quantum circuit on a fixed number of qubits.
#[derive(Clone, Debug)]
pub struct Circuit {
    graph: Graph,
    heads: Vec<NodeId>,
    tails: HashMap<Label, NodeId>,
    state0: HashMap<NodeId, StateVector>,
    state: Option<Evaluation<StateVector>>,
    mstate: Option<Evaluation<Matrix>>,
}

impl Circuit {
    /// Create a new circuit on `n` qubits, with no operations applied.
    pub fn new(n: usize) -> Self {
        let mut graph = Graph::new();
        let mut heads: Vec<NodeId> = Vec::with_capacity(n);
        let mut tails: HashMap<Label, NodeId> = HashMap::default();
        for k in 0..n {
            let (id, g) = graph.push(Node::Input(1));
            graph = g;
            heads.push(id);
            tails.insert(Label::Qubit(k), id);
        }
        Self {
            graph,
            heads,
            tails,
            state0: HashMap::default(),
            state: None,
            mstate: None,
        }
    }

    /// Return the number of qubits.
    pub fn n(&self) -> usize { self.heads.len() }

    /// Return a reference to the underlying [`Graph`].
    pub fn graph(&self) -> &Graph { &self.graph }

    /// Return all live labels, sorted.
    pub fn labels(&self) -> Vec<Label> {
        self.tails.keys().cloned().sorted().collect()
    }

    /// Return the graph node at the end of the wire named by `label`, if it is
    /// live.
    pub fn tail(&self, label: &Label) -> Option<NodeId> {
        self.tails.get(label).copied()
    }

    /// Set each qubit's initial state to ∣0⟩ or ∣1⟩.
    pub fn initialize_bits(&mut self, bits: &[u8]) -> CircuitResult<()> {
        if bits.len() != self.heads.len() {
            return Err(InitCount(self.heads.len(), bits.len()));
        }
        let states: Vec<StateVector> =
            bits.iter()
            .map(|b| algebra::basis_vector(&[*b]))
            .collect::<Result<_, _>>()?;
        self.initialize_states(states)
    }

    /// Set each qubit's initial state to an arbitrary single-qubit vector.
    pub fn initialize_states<I>(&mut self, states: I) -> CircuitResult<()>
    where I: IntoIterator<Item = StateVector>
    {
        let states: Vec<StateVector> = states.into_iter().collect();
        if states.len() != self.heads.len() {
            return Err(InitCount(self.heads.len(), states.len()));
        }
        for v in states.iter() {
            let found = algebra::vector_width(v)?;
            if found != 1 {
                return Err(error::SimError::WidthMismatch { expected: 1, found }.into());
            }
        }
        self.state0 = self.heads.iter().copied().zip(states).collect();
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.state = None;
        self.mstate = None;
    }

    /// Begin applying an arbitrary operator.
    pub fn op(&mut self, op: Operator) -> OpHandle<'_> {
        OpHandle { circuit: self, op }
    }

    /// Begin applying an identity gate.
    pub fn i(&mut self) -> OpHandle<'_> { self.op(gates::i()) }

    /// Begin applying a Pauli *X* gate.
    pub fn x(&mut self) -> OpHandle<'_> { self.op(gates::x()) }

    /// Begin applying a Pauli *Y* gate.
    pub fn y(&mut self) -> OpHandle<'_> { self.op(gates::y()) }

    /// Begin applying a Pauli *Z* gate.
    pub fn z(&mut self) -> OpHandle<'_> { self.op(gates::z()) }

    /// Begin applying a Hadamard gate.
    pub fn h(&mut self) -> OpHandle<'_> { self.op(gates::h()) }

    /// Begin applying a phase rotation by `phi`.
    pub fn r(&mut self, phi: f64) -> OpHandle<'_> { self.op(gates::r(phi)) }

    /// Begin applying a CNOT gate.
    pub fn cnot(&mut self) -> OpHandle<'_> { self.op(gates::cnot()) }

    /// Apply `op` to the tensor product of the wires named by `targets`, in
    /// order, returning the ID of the new graph node.
    ///
    /// On success the targets are consumed and the result is registered under
    /// the single target's label, or under the group of all targets' labels if
    /// there is more than one. On failure the circuit is left unchanged.
    pub fn apply<I, L>(&mut self, op: Operator, targets: I)
        -> CircuitResult<NodeId>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let mut labels: Vec<Label> =
            targets.into_iter().map(|l| l.into()).collect();
        if labels.is_empty() { return Err(NoTargets); }
        if let Some(dup) = labels.iter().duplicates().next() {
            return Err(DuplicateTarget(dup.clone()));
        }
        let inputs: Vec<NodeId> =
            labels.iter()
            .map(|l| self.tails.get(l).copied().ok_or_else(|| UnknownLabel(l.clone())))
            .collect::<Result<_, _>>()?;
        let (id, graph) = self.graph.add_apply(op, &inputs)?;
        self.graph = graph;
        labels.iter().for_each(|l| { self.tails.remove(l); });
        let new_label =
            if labels.len() == 1 {
                labels.swap_remove(0)
            } else {
                Label::Group(labels)
            };
        self.tails.insert(new_label, id);
        self.invalidate();
        Ok(id)
    }

    /// Evaluate the circuit in both state and matrix modes, returning the state
    /// at the end of every live wire.
    pub fn execute(&mut self) -> CircuitResult<HashMap<Label, StateVector>> {
        if self.state0.is_empty() && !self.heads.is_empty() {
            return Err(NotInitialized);
        }
        let sched = schedule::schedule(&self.graph)?;
        let state =
            eval::evaluate_state(&self.graph, &sched, self.state0.clone())?;
        let mstate = eval::evaluate_matrix(&self.graph, &sched)?;
        let out: HashMap<Label, StateVector> =
            self.tails.iter()
            .filter_map(|(label, id)| {
                state.get(*id).map(|v| (label.clone(), v.clone()))
            })
            .collect();
        debug!(wires = out.len(), "executed circuit");
        self.state = Some(state);
        self.mstate = Some(mstate);
        Ok(out)
    }

    /// Return the state at the end of the wire named by `label` from the last
    /// execution.
    pub fn state_of<L>(&self, label: L) -> CircuitResult<&StateVector>
    where L: Into<Label>
    {
        let state = self.state.as_ref().ok_or(NotExecuted)?;
        let label = label.into();
        let id = self.tail(&label).ok_or_else(|| UnknownLabel(label.clone()))?;
        state.get(id)
            .ok_or(error::SimError::UninitializedInput(id).into())
    }

    /// Return the Kronecker product of the unitaries describing the wires named
    /// by `labels`, in order, from the last execution.
    pub fn opmatrix<I, L>(&self, labels: I) -> CircuitResult<Matrix>
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let mstate = self.mstate.as_ref().ok_or(NotExecuted)?;
        let mats: Vec<&Matrix> =
            labels.into_iter()
            .map(|l| {
                let l = l.into();
                self.tail(&l)
                    .and_then(|id| mstate.get(id))
                    .ok_or(UnknownLabel(l))
            })
            .collect::<Result<_, _>>()?;
        Ok(algebra::tensor_matrices(mats)?)
    }
}
