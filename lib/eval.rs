//! Evaluation of scheduled computation graphs.
//!
//! Two modes share a single traversal:
//! - *State mode* ([`evaluate_state`]) propagates caller-supplied state vectors
//! from the graph's inputs, producing the output state of every node.
//! - *Matrix mode* ([`evaluate_matrix`]) seeds every input with the identity
//! and propagates matrices instead, producing for every node the unitary that
//! maps the tensor product of the inputs feeding it to its output.
//!
//! In both modes, an `Apply` node combines the values of its inputs with a
//! Kronecker product in declared order and left-multiplies the result by the
//! node's (cached) operator matrix.

use rustc_hash::{ FxHashMap as HashMap, FxHashSet as HashSet };
use itertools::Itertools;
use tracing::{ debug, trace };
use crate::{
    algebra::{ self, Matrix, StateVector },
    cache::SimCache,
    error::{ SimError, SimResult },
    graph::{ Graph, Node, NodeId },
    schedule::Schedule,
};

use SimError::*;

pub(crate) mod private { pub trait PropagateSeal { } }
pub(crate) use private::PropagateSeal;

/// Values that can be pushed through a computation graph.
///
/// This trait is sealed; it is implemented only for [`StateVector`] and
/// [`Matrix`].
pub trait Propagate: Clone + PropagateSeal {
    /// Return the number of qubits described by `self`.
    fn width(&self) -> SimResult<usize>;

    /// Return `self ⊗ rhs`.
    fn kron(&self, rhs: &Self) -> Self;

    /// Return `op · self`.
    fn apply(&self, op: &Matrix) -> Self;
}

impl PropagateSeal for StateVector { }
impl Propagate for StateVector {
    fn width(&self) -> SimResult<usize> { algebra::vector_width(self) }

    fn kron(&self, rhs: &Self) -> Self { algebra::kron_vectors(self, rhs) }

    fn apply(&self, op: &Matrix) -> Self { op.dot(self) }
}

impl PropagateSeal for Matrix { }
impl Propagate for Matrix {
    fn width(&self) -> SimResult<usize> { algebra::matrix_width(self) }

    fn kron(&self, rhs: &Self) -> Self { algebra::kron_matrices(self, rhs) }

    fn apply(&self, op: &Matrix) -> Self { op.dot(self) }
}

/// Per-node results of a single evaluation pass.
#[derive(Clone, Debug)]
pub struct Evaluation<T> {
    values: HashMap<NodeId, T>,
}

impl<T> Evaluation<T> {
    /// Get a reference to the value computed for node `id`, if any.
    pub fn get(&self, id: NodeId) -> Option<&T> { self.values.get(&id) }

    /// Return `true` if a value was computed for node `id`.
    pub fn contains(&self, id: NodeId) -> bool { self.values.contains_key(&id) }

    /// Return the number of nodes with values.
    pub fn len(&self) -> usize { self.values.len() }

    /// Return `true` if no values were computed.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Return an iterator over all computed values with their node IDs, in
    /// ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> + '_ {
        self.values.iter()
            .sorted_by_key(|(id, _)| **id)
            .map(|(id, v)| (*id, v))
    }

    /// Return the values of the terminal nodes of `graph` (those not consumed
    /// by any other node), in ascending ID order.
    pub fn outputs(&self, graph: &Graph) -> Vec<(NodeId, &T)> {
        graph.terminal_ids().into_iter()
            .filter_map(|id| self.values.get(&id).map(|v| (id, v)))
            .collect()
    }

    /// Unpack `self` into a bare map.
    pub fn into_inner(self) -> HashMap<NodeId, T> { self.values }
}

fn propagate<T, F>(
    graph: &Graph,
    sched: &Schedule,
    cache: &mut SimCache,
    mut on_input: F,
) -> SimResult<Evaluation<T>>
where
    T: Propagate,
    F: FnMut(NodeId, usize) -> SimResult<Option<T>>,
{
    cache.clear();
    let mut values: HashMap<NodeId, T> = HashMap::default();
    let mut visited: HashSet<NodeId> = HashSet::default();
    for &id in sched.iter() {
        let node = graph.get_node(id).ok_or(MissingNode(id))?;
        match node {
            Node::Input(w) => {
                if let Some(v) = on_input(id, *w)? { values.insert(id, v); }
            },
            Node::Apply(op, inputs) => {
                let mut acc: Option<T> = None;
                for &input in inputs.iter() {
                    let Some(v) = values.get(&input) else {
                        return Err(
                            if graph.get_node(input).is_none() {
                                MissingNode(input)
                            } else if visited.contains(&input) {
                                UninitializedInput(input)
                            } else {
                                UnevaluatedInput { node: id, input }
                            }
                        );
                    };
                    acc = Some(match acc {
                        None => v.clone(),
                        Some(a) => a.kron(v),
                    });
                }
                let combined = acc.ok_or(EmptyInput)?;
                let found = combined.width()?;
                let expected = op.width();
                if found != expected {
                    return Err(WidthMismatch { expected, found });
                }
                trace!(node = id, op = %op, "applying operator");
                let value = combined.apply(cache.get_materialized(op));
                values.insert(id, value);
            },
        }
        visited.insert(id);
    }
    debug!(
        nodes = values.len(),
        cached = cache.len(),
        hits = cache.hits(),
        misses = cache.misses(),
        "evaluation finished"
    );
    Ok(Evaluation { values })
}

/// Evaluate `graph` in state mode, starting from the given input states.
///
/// `initial` must map input node IDs to state vectors of matching width. An
/// input that is never consumed may be left out, in which case it is also
/// absent from the result; an input that is consumed but has no value fails
/// with [`SimError::UninitializedInput`].
pub fn evaluate_state<I>(graph: &Graph, sched: &Schedule, initial: I)
    -> SimResult<Evaluation<StateVector>>
where I: IntoIterator<Item = (NodeId, StateVector)>
{
    evaluate_state_with(graph, sched, initial, &mut SimCache::new())
}

/// Like [`evaluate_state`], but materialize operators through `cache`.
///
/// The cache is cleared before evaluation begins, so entries and statistics
/// never carry over from a previous call. Afterward it holds only what this
/// pass materialized.
pub fn evaluate_state_with<I>(
    graph: &Graph,
    sched: &Schedule,
    initial: I,
    cache: &mut SimCache,
) -> SimResult<Evaluation<StateVector>>
where I: IntoIterator<Item = (NodeId, StateVector)>
{
    let mut initial: HashMap<NodeId, StateVector> =
        initial.into_iter().collect();
    for (id, v) in initial.iter() {
        let Some(node) = graph.get_node(*id) else {
            return Err(MissingNode(*id));
        };
        let Node::Input(expected) = node else { return Err(NotInput(*id)); };
        let found = algebra::vector_width(v)?;
        if found != *expected {
            return Err(WidthMismatch { expected: *expected, found });
        }
    }
    debug!(mode = "state", nodes = sched.len(), inputs = initial.len(), "evaluating");
    propagate(graph, sched, cache, |id, _| Ok(initial.remove(&id)))
}

/// Evaluate `graph` in matrix mode, seeding every input with the identity.
pub fn evaluate_matrix(graph: &Graph, sched: &Schedule)
    -> SimResult<Evaluation<Matrix>>
{
    evaluate_matrix_with(graph, sched, &mut SimCache::new())
}

/// Like [`evaluate_matrix`], but materialize operators through `cache`.
///
/// As with [`evaluate_state_with`], the cache is cleared first.
pub fn evaluate_matrix_with(
    graph: &Graph,
    sched: &Schedule,
    cache: &mut SimCache,
) -> SimResult<Evaluation<Matrix>>
{
    debug!(mode = "matrix", nodes = sched.len(), "evaluating");
    propagate(graph, sched, cache, |_, w| algebra::identity(w).map(Some))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_1_SQRT_2 as ONRT2;
    use ndarray as nd;
    use super::*;
    use crate::{
        algebra::{ approx_eq, basis_vector, state_vector },
        c,
        gates,
        operator::Operator,
        schedule::schedule,
    };

    fn h_x_matrix() -> Matrix {
        nd::array![
            [c!(0.0),   c!(ONRT2), c!(0.0),    c!(ONRT2) ],
            [c!(ONRT2), c!(0.0),   c!(ONRT2),  c!(0.0)   ],
            [c!(0.0),   c!(ONRT2), c!(0.0),    c!(-ONRT2)],
            [c!(ONRT2), c!(0.0),   c!(-ONRT2), c!(0.0)   ],
        ]
    }

    fn x_on_second() -> Matrix {
        nd::array![
            [c!(0.0), c!(1.0), c!(0.0), c!(0.0)],
            [c!(1.0), c!(0.0), c!(0.0), c!(0.0)],
            [c!(0.0), c!(0.0), c!(0.0), c!(1.0)],
            [c!(0.0), c!(0.0), c!(1.0), c!(0.0)],
        ]
    }

    // two 1-qubit inputs, `a` on the first and `b` on the second, joined by an
    // identity on both
    fn build_pair(a: Operator, b: Operator) -> (Graph, [NodeId; 3]) {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(a, &[i1]).unwrap();
        let (i2, g) = g.add_input(1).unwrap();
        let (o2, g) = g.add_apply(b, &[i2]).unwrap();
        let op = Operator::tensor(gates::i(), gates::i());
        let (o3, g) = g.add_apply(op, &[o1, o2]).unwrap();
        (g, [i1, i2, o3])
    }

    #[test]
    fn identity_passthrough() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(gates::i(), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        let v0 = state_vector([1.0, 0.0]).unwrap();
        let res = evaluate_state(&g, &s, [(i1, v0)]).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), res.get(i1).unwrap(), None));
    }

    #[test]
    fn pauli_x() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(gates::x(), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[0]).unwrap())]).unwrap();
        let expected = state_vector([0.0, 1.0]).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &expected, None));
    }

    #[test]
    fn multi_input() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (i2, g) = g.add_input(1).unwrap();
        let op = Operator::tensor(gates::x(), gates::x());
        let (o1, g) = g.add_apply(op, &[i1, i2]).unwrap();
        let s = schedule(&g).unwrap();
        let res =
            evaluate_state(
                &g, &s,
                [(i1, basis_vector(&[1]).unwrap()), (i2, basis_vector(&[0]).unwrap())],
            )
            .unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &basis_vector(&[0, 1]).unwrap(), None));
    }

    #[test]
    fn cnot() {
        let g = Graph::new();
        let (i1, g) = g.add_input(2).unwrap();
        let (o1, g) = g.add_apply(gates::cnot(), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[1, 1]).unwrap())]).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &basis_vector(&[1, 0]).unwrap(), None));
    }

    #[test]
    fn i_x_on_two_qubits() {
        let g = Graph::new();
        let (i1, g) = g.add_input(2).unwrap();
        let (o1, g) = g.add_apply(Operator::tensor(gates::i(), gates::x()), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[0, 0]).unwrap())]).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &basis_vector(&[0, 1]).unwrap(), None));
        let res = evaluate_matrix(&g, &s).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &x_on_second(), None));
    }

    #[test]
    fn i_x_split_inputs() {
        let (g, [i1, i2, o3]) = build_pair(gates::i(), gates::x());
        let s = schedule(&g).unwrap();
        let res =
            evaluate_state(
                &g, &s,
                [(i1, basis_vector(&[0]).unwrap()), (i2, basis_vector(&[0]).unwrap())],
            )
            .unwrap();
        assert!(approx_eq(res.get(o3).unwrap(), &basis_vector(&[0, 1]).unwrap(), None));
        let res = evaluate_matrix(&g, &s).unwrap();
        assert!(approx_eq(res.get(o3).unwrap(), &x_on_second(), None));
    }

    #[test]
    fn h_x_split_inputs() {
        let (g, [i1, i2, o3]) = build_pair(gates::h(), gates::x());
        let s = schedule(&g).unwrap();
        let res =
            evaluate_state(
                &g, &s,
                [(i1, basis_vector(&[0]).unwrap()), (i2, basis_vector(&[0]).unwrap())],
            )
            .unwrap();
        let expected = state_vector([0.0, ONRT2, 0.0, ONRT2]).unwrap();
        assert!(approx_eq(res.get(o3).unwrap(), &expected, None));
        let res = evaluate_matrix(&g, &s).unwrap();
        assert!(approx_eq(res.get(o3).unwrap(), &h_x_matrix(), None));
    }

    #[test]
    fn h_x_single_input() {
        let g = Graph::new();
        let (i1, g) = g.add_input(2).unwrap();
        let (o1, g) = g.add_apply(Operator::tensor(gates::h(), gates::x()), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        let res = evaluate_matrix(&g, &s).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &h_x_matrix(), None));
        assert!(approx_eq(res.get(i1).unwrap(), &algebra::identity(2).unwrap(), None));
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[0, 0]).unwrap())]).unwrap();
        let expected = state_vector([0.0, ONRT2, 0.0, ONRT2]).unwrap();
        assert!(approx_eq(res.get(o1).unwrap(), &expected, None));
    }

    #[test]
    fn modes_agree() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (i2, g) = g.add_input(1).unwrap();
        let (a, g) = g.add_apply(gates::h(), &[i1]).unwrap();
        let (b, g) = g.add_apply(gates::r(0.4), &[i2]).unwrap();
        let (c, g) = g.add_apply(gates::cnot(), &[a, b]).unwrap();
        let (d, g) = g.add_apply(Operator::tensor(gates::y(), gates::z()), &[c]).unwrap();
        let s = schedule(&g).unwrap();
        let v1 = state_vector([c!(0.6), c!(i 0.8)]).unwrap();
        let v2 = state_vector([c!(0.0), c!(1.0)]).unwrap();
        let states = evaluate_state(&g, &s, [(i1, v1.clone()), (i2, v2.clone())]).unwrap();
        let mats = evaluate_matrix(&g, &s).unwrap();
        let v0 = algebra::tensor_vectors([&v1, &v2]).unwrap();
        for node in [c, d] {
            let via_matrix = mats.get(node).unwrap().dot(&v0);
            assert!(approx_eq(states.get(node).unwrap(), &via_matrix, None));
        }
    }

    #[test]
    fn outputs_are_terminals() {
        let (g, [i1, i2, o3]) = build_pair(gates::h(), gates::x());
        let s = schedule(&g).unwrap();
        let res = evaluate_matrix(&g, &s).unwrap();
        assert_eq!(res.len(), g.len());
        let outs = res.outputs(&g);
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].0, o3);
        let ids: Vec<NodeId> = res.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, (0..g.len()).collect::<Vec<_>>());
        assert!(res.contains(i1) && res.contains(i2));
    }

    #[test]
    fn uninitialized_input() {
        let (g, [i1, i2, _]) = build_pair(gates::h(), gates::x());
        let s = schedule(&g).unwrap();
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[0]).unwrap())]);
        assert!(matches!(res, Err(UninitializedInput(id)) if id == i2));
    }

    #[test]
    fn unused_input_may_be_omitted() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(gates::x(), &[i1]).unwrap();
        let (i2, g) = g.add_input(1).unwrap();
        let s = schedule(&g).unwrap();
        let res = evaluate_state(&g, &s, [(i1, basis_vector(&[1]).unwrap())]).unwrap();
        assert!(!res.contains(i2));
        assert!(approx_eq(res.get(o1).unwrap(), &basis_vector(&[0]).unwrap(), None));
    }

    #[test]
    fn bad_initial_values() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(gates::x(), &[i1]).unwrap();
        let s = schedule(&g).unwrap();
        assert!(matches!(
            evaluate_state(&g, &s, [(i1, basis_vector(&[0, 0]).unwrap())]),
            Err(WidthMismatch { expected: 1, found: 2 }),
        ));
        assert!(matches!(
            evaluate_state(&g, &s, [(o1, basis_vector(&[0]).unwrap())]),
            Err(NotInput(id)) if id == o1,
        ));
        assert!(matches!(
            evaluate_state(&g, &s, [(9, basis_vector(&[0]).unwrap())]),
            Err(MissingNode(9)),
        ));
        assert!(matches!(
            evaluate_state(&g, &s, [(i1, StateVector::zeros(3))]),
            Err(InvalidWidth(3)),
        ));
    }

    #[test]
    fn malformed_graph_width() {
        let g = Graph::from_nodes([
            Node::Input(1),
            Node::Apply(gates::cnot(), vec![0]),
        ]);
        let s = schedule(&g).unwrap();
        assert!(matches!(
            evaluate_matrix(&g, &s),
            Err(WidthMismatch { expected: 2, found: 1 }),
        ));
    }

    #[test]
    fn bad_schedule() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (o1, g) = g.add_apply(gates::x(), &[i1]).unwrap();
        let s = Schedule::from(vec![o1, i1]);
        assert!(matches!(
            evaluate_matrix(&g, &s),
            Err(UnevaluatedInput { node, input }) if node == o1 && input == i1,
        ));
        let s = Schedule::from(vec![i1, 5]);
        assert!(matches!(evaluate_matrix(&g, &s), Err(MissingNode(5))));
    }

    #[test]
    fn no_inputs() {
        let g = Graph::from_nodes([Node::Apply(gates::x(), vec![])]);
        let s = schedule(&g).unwrap();
        assert!(matches!(evaluate_matrix(&g, &s), Err(EmptyInput)));
    }

    #[test]
    fn oversized_input() {
        let g = Graph::from_nodes([Node::Input(64)]);
        let s = schedule(&g).unwrap();
        assert!(matches!(evaluate_matrix(&g, &s), Err(InvalidWidth(_))));
    }

    #[test]
    fn cache_scoped_to_one_call() {
        let g = Graph::new();
        let (i1, g) = g.add_input(1).unwrap();
        let (a, g) = g.add_apply(gates::h(), &[i1]).unwrap();
        let (_, g) = g.add_apply(gates::z(), &[a]).unwrap();
        let s = schedule(&g).unwrap();
        let mut cache = SimCache::new();
        evaluate_matrix_with(&g, &s, &mut cache).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 2);

        let (i2, g2) = Graph::new().add_input(1).unwrap();
        let (_, g2) = g2.add_apply(gates::x(), &[i2]).unwrap();
        let s2 = schedule(&g2).unwrap();
        let init = [(i2, basis_vector(&[0]).unwrap())];
        evaluate_state_with(&g2, &s2, init, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);
    }

    #[test]
    fn cache_shared_within_pass() {
        let g = Graph::new();
        let (i1, g) = g.add_input(2).unwrap();
        let (a, g) = g.add_apply(Operator::tensor(gates::h(), gates::x()), &[i1]).unwrap();
        let (_, g) = g.add_apply(Operator::tensor(gates::h(), gates::x()), &[a]).unwrap();
        let s = schedule(&g).unwrap();
        let mut cache = SimCache::new();
        let res = evaluate_matrix_with(&g, &s, &mut cache).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        // H ⊗ X is self-inverse
        let out = res.outputs(&g);
        assert!(approx_eq(out[0].1, &algebra::identity(2).unwrap(), None));
    }
}
