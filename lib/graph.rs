//! Computation graphs of operator applications.
//!
//! A [`Graph`] is an append-only arena of [`Node`]s, identified by their
//! position in creation order. Builder methods never modify a graph in place;
//! each returns the identifier of the new node along with a new graph that
//! shares all previous nodes with the old one.

use std::{
    fs,
    io::Write,
    path::Path,
    sync::Arc,
};
use rustc_hash::FxHashSet as HashSet;
use crate::{
    algebra,
    error::{ SimError, SimResult },
    operator::Operator,
};

use SimError::*;

/// Identifies a node in a graph.
pub type NodeId = usize;

/// A single node in a computation graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A free input of some number of qubits.
    Input(usize),
    /// Application of an operator to the tensor product of the outputs of other
    /// nodes, in the order given.
    Apply(Operator, Vec<NodeId>),
}

impl Node {
    /// Return `true` if `self` is `Input`.
    pub fn is_input(&self) -> bool { matches!(self, Self::Input(_)) }

    /// Return `true` if `self` is `Apply`.
    pub fn is_apply(&self) -> bool { matches!(self, Self::Apply(..)) }

    /// Return the identifiers of the nodes feeding into `self`, in order.
    pub fn inputs(&self) -> &[NodeId] {
        match self {
            Self::Input(_) => &[],
            Self::Apply(_, inputs) => inputs,
        }
    }

    /// Return the number of qubits output by `self`.
    pub fn width(&self) -> usize {
        match self {
            Self::Input(w) => *w,
            Self::Apply(op, _) => op.width(),
        }
    }
}

/// An immutable directed acyclic graph of qubit inputs and operator
/// applications.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Arc<Node>>,
}

impl Graph {
    /// Create a new, empty graph.
    pub fn new() -> Self { Self::default() }

    /// Create a graph directly from a list of nodes, identified by their
    /// positions in `nodes`.
    ///
    /// No validation is performed: the result may contain forward references,
    /// cycles, or width mismatches. Such graphs are rejected later by
    /// [`schedule`][crate::schedule::schedule] or the evaluators.
    pub fn from_nodes<I>(nodes: I) -> Self
    where I: IntoIterator<Item = Node>
    {
        Self { nodes: nodes.into_iter().map(Arc::new).collect() }
    }

    /// Return the number of nodes.
    pub fn len(&self) -> usize { self.nodes.len() }

    /// Return `true` if there are no nodes.
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Get a reference to the node with ID `id`, if it exists.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|node| node.as_ref())
    }

    /// Return an iterator over all nodes with their IDs, in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(id, node)| (id, node.as_ref()))
    }

    /// Return the IDs of all `Input` nodes, in ascending order.
    pub fn input_ids(&self) -> Vec<NodeId> {
        self.nodes()
            .filter_map(|(id, node)| node.is_input().then_some(id))
            .collect()
    }

    /// Return the IDs of all nodes not consumed by any `Apply` node, in
    /// ascending order.
    pub fn terminal_ids(&self) -> Vec<NodeId> {
        let consumed: HashSet<NodeId> =
            self.nodes.iter()
            .flat_map(|node| node.inputs().iter().copied())
            .collect();
        (0..self.nodes.len())
            .filter(|id| !consumed.contains(id))
            .collect()
    }

    /// Return the number of qubits output by the node with ID `id`.
    pub fn width_of(&self, id: NodeId) -> SimResult<usize> {
        self.get_node(id).map(Node::width).ok_or(MissingNode(id))
    }

    pub(crate) fn push(&self, node: Node) -> (NodeId, Self) {
        let id = self.nodes.len();
        let mut nodes = self.nodes.clone();
        nodes.push(Arc::new(node));
        (id, Self { nodes })
    }

    /// Append a new input of `width` qubits, returning its ID and the new
    /// graph.
    pub fn add_input(&self, width: usize) -> SimResult<(NodeId, Self)> {
        if width == 0 { return Err(InvalidWidth(0)); }
        algebra::dimension(width)?;
        Ok(self.push(Node::Input(width)))
    }

    /// Append a new application of `op` to the outputs of `inputs`, returning
    /// its ID and the new graph.
    ///
    /// The order of `inputs` determines the order in which their outputs are
    /// tensored together. Fails if `inputs` is empty, if any input does not
    /// exist, or if the total width of the inputs differs from that of `op`.
    pub fn add_apply(&self, op: Operator, inputs: &[NodeId])
        -> SimResult<(NodeId, Self)>
    {
        if inputs.is_empty() { return Err(EmptyInput); }
        let found =
            inputs.iter()
            .try_fold(0, |acc, id| self.width_of(*id).map(|w| acc + w))?;
        let expected = op.width();
        if found != expected {
            return Err(WidthMismatch { expected, found });
        }
        Ok(self.push(Node::Apply(op, inputs.to_vec())))
    }

    /// Return an object containing an encoding of `self` in the [DOT
    /// language][dot-lang].
    ///
    /// Inputs are drawn at the left, terminal nodes are attached to outputs at
    /// the right, and each edge is labeled by its position in the consuming
    /// node's input list.
    ///
    /// [dot-lang]: https://en.wikipedia.org/wiki/DOT_(graph_description_language)
    pub fn to_graphviz(&self, name: &str) -> SimResult<tabbycat::Graph> {
        use tabbycat::*;
        use tabbycat::attributes::*;
        use crate::vizdefs::*;
        let mut statements =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rankdir(RankDir::LR)),
            )
            .add_attr(
                AttrType::Node,
                AttrList::new()
                    .add_pair(fontname(FONT))
                    .add_pair(fontsize(FONTSIZE))
                    .add_pair(margin(NODE_MARGIN)),
            );

        // inputs share a rank
        let mut inputs_subgraph_stmt =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rank(RankType::Source)),
            );
        for (id, node) in self.nodes() {
            if let Node::Input(w) = node {
                let attrs =
                    AttrList::new()
                    .add_pair(label(format!("In {} ({})", id, w)))
                    .add_pair(shape(Shape::Plaintext));
                inputs_subgraph_stmt =
                    inputs_subgraph_stmt.add_node(id.into(), None, Some(attrs));
            }
        }
        statements =
            statements.add_subgraph(SubGraph::cluster(inputs_subgraph_stmt));

        for (id, node) in self.nodes() {
            let Node::Apply(op, inputs) = node else { continue; };
            let color = if op.is_leaf() { LEAF_COLOR } else { TENSOR_COLOR };
            let attrs =
                AttrList::new()
                .add_pair(label(format!("{}", op)))
                .add_pair(shape(Shape::Rectangle))
                .add_pair(height(BOX_HEIGHT))
                .add_pair(style(Style::Filled))
                .add_pair(fillcolor(color));
            statements = statements.add_node(id.into(), None, Some(attrs));
            for (k, input) in inputs.iter().enumerate() {
                statements =
                    statements.add_edge(
                        Edge::head_node((*input).into(), None)
                        .line_to_node(id.into(), None)
                        .add_attrpair(label(format!("{}", k)))
                    );
            }
        }

        // outputs share a rank
        let mut outputs_subgraph_stmt =
            StmtList::new()
            .add_attr(
                AttrType::Graph,
                AttrList::new().add_pair(rank(RankType::Sink)),
            );
        let offset = self.nodes.len();
        let terminals = self.terminal_ids();
        for (k, id) in terminals.iter().enumerate() {
            let attrs =
                AttrList::new()
                .add_pair(label(format!("Out {}", id)))
                .add_pair(shape(Shape::Plaintext));
            outputs_subgraph_stmt =
                outputs_subgraph_stmt.add_node(
                    (offset + k).into(), None, Some(attrs));
        }
        statements =
            statements.add_subgraph(SubGraph::cluster(outputs_subgraph_stmt));
        for (k, id) in terminals.iter().enumerate() {
            statements =
                statements.add_edge(
                    Edge::head_node((*id).into(), None)
                    .line_to_node((offset + k).into(), None)
                );
        }

        GraphBuilder::default()
            .graph_type(GraphType::Graph)
            .strict(false)
            .id(Identity::quoted(name))
            .stmts(statements)
            .build()
            .map_err(GraphVizError)
    }

    /// Like [`to_graphviz`][Self::to_graphviz], but render directly to a string
    /// and write it to `path`.
    pub fn save_graphviz<P>(&self, name: &str, path: P) -> SimResult<()>
    where P: AsRef<Path>
    {
        let graphviz = self.to_graphviz(name)?;
        fs::OpenOptions::new()
            .write(true)
            .append(false)
            .create(true)
            .truncate(true)
            .open(path)?
            .write_all(format!("{}", graphviz).as_bytes())?;
        Ok(())
    }
}
