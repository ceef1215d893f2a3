//! Deterministic topological ordering of computation graphs.

use std::{ cmp::Reverse, collections::BinaryHeap };
use rustc_hash::{ FxHashMap as HashMap, FxHashSet as HashSet };
use tracing::debug;
use crate::{
    error::{ SimError, SimResult },
    graph::{ Graph, NodeId },
};

/// A total order over the nodes of a graph in which every node follows all of
/// its inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule(Vec<NodeId>);

impl From<Vec<NodeId>> for Schedule {
    fn from(order: Vec<NodeId>) -> Self { Self(order) }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a NodeId;
    type IntoIter = std::slice::Iter<'a, NodeId>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl Schedule {
    /// Return an iterator over node IDs in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, NodeId> { self.0.iter() }

    /// Return the order as a slice.
    pub fn as_slice(&self) -> &[NodeId] { &self.0 }

    /// Return the number of scheduled nodes.
    pub fn len(&self) -> usize { self.0.len() }

    /// Return `true` if no nodes are scheduled.
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Return the position of node `id` in the order, if present.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.0.iter().position(|k| *k == id)
    }

    /// Unpack `self` into a bare `Vec`.
    pub fn into_vec(self) -> Vec<NodeId> { self.0 }
}

// Kahn's algorithm with a min-heap frontier; returns the nodes emitted before
// the frontier ran dry
fn kahn_order<I, F, J>(nodes: I, mut inbounds: F) -> (Vec<usize>, usize)
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> J,
    J: IntoIterator<Item = usize>,
{
    let mut indeg: HashMap<usize, usize> = HashMap::default();
    let mut outbounds: HashMap<usize, Vec<usize>> = HashMap::default();
    let mut frontier: BinaryHeap<Reverse<usize>> = BinaryHeap::new();
    for n in nodes.into_iter() {
        if indeg.contains_key(&n) { continue; }
        let deps: HashSet<usize> = inbounds(n).into_iter().collect();
        for dep in deps.iter() {
            outbounds.entry(*dep).or_default().push(n);
        }
        if deps.is_empty() { frontier.push(Reverse(n)); }
        indeg.insert(n, deps.len());
    }
    let total = indeg.len();
    let mut acc: Vec<usize> = Vec::with_capacity(total);
    while let Some(Reverse(n)) = frontier.pop() {
        acc.push(n);
        for m in outbounds.remove(&n).into_iter().flatten() {
            if let Some(d) = indeg.get_mut(&m) {
                *d -= 1;
                if *d == 0 { frontier.push(Reverse(m)); }
            }
        }
    }
    (acc, total)
}

/// Topologically sort `nodes` given a function returning the inbound
/// neighbors of each.
///
/// Among nodes whose dependencies are all satisfied, the smallest is always
/// emitted first, so the result is fully determined by the graph structure.
/// Repeated nodes and repeated inbound neighbors count once. Returns `None` if the graph contains
/// a cycle.
pub fn kahn_sort<I, F, J>(nodes: I, inbounds: F) -> Option<Vec<usize>>
where
    I: IntoIterator<Item = usize>,
    F: FnMut(usize) -> J,
    J: IntoIterator<Item = usize>,
{
    let (order, total) = kahn_order(nodes, inbounds);
    (order.len() == total).then_some(order)
}

/// Compute the evaluation order of `graph`.
///
/// Fails if any node references a non-existent input or if the graph contains
/// a cycle.
pub fn schedule(graph: &Graph) -> SimResult<Schedule> {
    for (_, node) in graph.nodes() {
        if let Some(missing) =
            node.inputs().iter().find(|id| graph.get_node(**id).is_none())
        {
            return Err(SimError::MissingNode(*missing));
        }
    }
    let (order, total) =
        kahn_order(
            0..graph.len(),
            |id| {
                graph.get_node(id)
                    .map(|node| node.inputs().to_vec())
                    .unwrap_or_default()
            },
        );
    if order.len() != total {
        return Err(SimError::CyclicGraph { scheduled: order.len(), total });
    }
    debug!(nodes = total, "scheduled graph");
    Ok(Schedule(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ thread_rng, Rng };
    use crate::{ gates, graph::Node, operator::Operator };

    fn build_simple() -> Graph {
        let g = Graph::new();
        let (i0, g) = g.add_input(1).unwrap();
        let (a0, g) = g.add_apply(gates::h(), &[i0]).unwrap();
        let (i1, g) = g.add_input(1).unwrap();
        let (a1, g) = g.add_apply(gates::x(), &[i1]).unwrap();
        let op = Operator::tensor(gates::i(), gates::i());
        let (_, g) = g.add_apply(op, &[a0, a1]).unwrap();
        g
    }

    // random graph built only through the checked builders: single-tail
    // Hadamard layers and two-tail merges
    fn build_random(n_ops: usize) -> Graph {
        let mut rng = thread_rng();
        let mut g = Graph::new();
        let mut tails: Vec<NodeId> = Vec::new();
        for _ in 0..6 {
            let (id, g2) = g.add_input(1).unwrap();
            g = g2;
            tails.push(id);
        }
        for _ in 0..n_ops {
            if tails.len() < 2 || rng.gen_bool(0.6) {
                let k = rng.gen_range(0..tails.len());
                let w = g.width_of(tails[k]).unwrap();
                let op =
                    Operator::tensor_all((0..w).map(|_| gates::h())).unwrap();
                let (id, g2) = g.add_apply(op, &[tails[k]]).unwrap();
                g = g2;
                tails[k] = id;
            } else {
                let a = tails.swap_remove(rng.gen_range(0..tails.len()));
                let b = tails.swap_remove(rng.gen_range(0..tails.len()));
                let w = g.width_of(a).unwrap() + g.width_of(b).unwrap();
                let op =
                    Operator::tensor_all((0..w).map(|_| gates::i())).unwrap();
                let (id, g2) = g.add_apply(op, &[b, a]).unwrap();
                g = g2;
                tails.push(id);
            }
        }
        g
    }

    fn respects_inputs(graph: &Graph, sched: &Schedule) -> bool {
        graph.nodes().all(|(id, node)| {
            let Some(pos) = sched.position_of(id) else { return false; };
            node.inputs().iter()
                .all(|inp| sched.position_of(*inp).is_some_and(|p| p < pos))
        })
    }

    #[test]
    fn ascending_when_unconstrained() {
        let g = build_simple();
        let s = schedule(&g).unwrap();
        assert_eq!(s.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn smallest_ready_first() {
        let g = Graph::from_nodes([
            Node::Apply(gates::x(), vec![2]),
            Node::Input(1),
            Node::Input(1),
            Node::Apply(gates::x(), vec![1]),
        ]);
        let s = schedule(&g).unwrap();
        assert_eq!(s.into_vec(), vec![1, 2, 0, 3]);
    }

    #[test]
    fn deterministic_and_valid() {
        for _ in 0..20 {
            let g = build_random(30);
            let s1 = schedule(&g).unwrap();
            let s2 = schedule(&g).unwrap();
            assert_eq!(s1, s2);
            assert_eq!(s1.len(), g.len());
            assert!(respects_inputs(&g, &s1));
        }
    }

    #[test]
    fn cycle_detected() {
        let g = Graph::from_nodes([
            Node::Input(1),
            Node::Apply(gates::x(), vec![2]),
            Node::Apply(gates::x(), vec![1]),
        ]);
        assert!(matches!(
            schedule(&g),
            Err(SimError::CyclicGraph { scheduled: 1, total: 3 }),
        ));

        let g = Graph::from_nodes([Node::Apply(gates::x(), vec![0])]);
        assert!(matches!(
            schedule(&g),
            Err(SimError::CyclicGraph { scheduled: 0, total: 1 }),
        ));
    }

    #[test]
    fn missing_reference() {
        let g = Graph::from_nodes([
            Node::Input(1),
            Node::Apply(gates::x(), vec![5]),
        ]);
        assert!(matches!(schedule(&g), Err(SimError::MissingNode(5))));
    }

    #[test]
    fn repeated_input_counts_once() {
        let g = Graph::from_nodes([
            Node::Input(1),
            Node::Apply(gates::cnot(), vec![0, 0]),
        ]);
        assert_eq!(schedule(&g).unwrap().into_vec(), vec![0, 1]);
    }

    #[test]
    fn generic_sort() {
        let edges: [(usize, usize); 3] = [(10, 3), (3, 7), (10, 7)];
        let order =
            kahn_sort(
                [7, 3, 10, 20],
                |n| edges.iter().filter(move |(_, to)| *to == n).map(|(from, _)| *from),
            )
            .unwrap();
        assert_eq!(order, vec![10, 3, 7, 20]);
        assert!(kahn_sort([1, 2], |n| [3 - n]).is_none());
        assert_eq!(kahn_sort(Vec::<usize>::new(), |_| [0_usize; 0]), Some(vec![]));
        assert_eq!(kahn_sort([1, 1], |_| [0_usize; 0]), Some(vec![1]));
        assert_eq!(kahn_sort([2, 1, 2], |n| (n == 2).then_some(1)), Some(vec![1, 2]));
    }

    #[test]
    fn empty_graph() {
        assert!(schedule(&Graph::new()).unwrap().is_empty());
    }
}
