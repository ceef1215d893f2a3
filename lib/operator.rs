//! Operator trees.
//!
//! An [`Operator`] is either a dense leaf matrix or the Kronecker product of
//! two other operators. Composition is purely structural: no numeric work is
//! done until an operator is [materialized][Operator::materialize].

use std::{ fmt, sync::Arc };
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    algebra::{ self, Matrix },
    error::{ SimError, SimResult },
};

/// A dense, square matrix acting on a fixed number of qubits.
///
/// Matrix data is reference-counted, so cloning a `Leaf` is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    width: usize,
    matrix: nd::ArcArray2<C64>,
}

impl Leaf {
    /// Return the number of qubits acted on.
    pub fn width(&self) -> usize { self.width }

    /// Return a view of the underlying matrix.
    pub fn matrix(&self) -> nd::ArrayView2<'_, C64> { self.matrix.view() }
}

/// A unitary operator acting on some number of qubits.
#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    /// An elementary or precomputed dense operator.
    Leaf(Leaf),
    /// The Kronecker product `left ⊗ right`.
    Tensor(Arc<Operator>, Arc<Operator>),
}

impl From<Leaf> for Operator {
    fn from(leaf: Leaf) -> Self { Self::Leaf(leaf) }
}

impl Operator {
    /// Create a new leaf operator from a dense matrix.
    ///
    /// Fails if the matrix is not square or its side is not a power of two
    /// greater than one.
    pub fn leaf<S>(matrix: nd::ArrayBase<S, nd::Ix2>) -> SimResult<Self>
    where S: nd::DataOwned<Elem = C64>
    {
        let width = algebra::matrix_width(&matrix)?;
        if width == 0 { return Err(SimError::InvalidWidth(1)); }
        Ok(Self::Leaf(Leaf { width, matrix: matrix.into_shared() }))
    }

    pub(crate) fn leaf_unchecked(width: usize, matrix: Matrix) -> Self {
        Self::Leaf(Leaf { width, matrix: matrix.into_shared() })
    }

    /// Return the Kronecker product `a ⊗ b`.
    pub fn tensor(a: Operator, b: Operator) -> Self {
        Self::Tensor(Arc::new(a), Arc::new(b))
    }

    /// Left-fold a sequence of operators into their Kronecker product, with the
    /// first operator leftmost.
    pub fn tensor_all<I>(ops: I) -> SimResult<Self>
    where I: IntoIterator<Item = Operator>
    {
        let mut iter = ops.into_iter();
        let first = iter.next().ok_or(SimError::EmptyInput)?;
        Ok(iter.fold(first, Self::tensor))
    }

    /// Return `true` if `self` is `Leaf`.
    pub fn is_leaf(&self) -> bool { matches!(self, Self::Leaf(_)) }

    /// Return `true` if `self` is `Tensor`.
    pub fn is_tensor(&self) -> bool { matches!(self, Self::Tensor(..)) }

    /// Return the number of qubits acted on.
    pub fn width(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.width,
            Self::Tensor(a, b) => a.width() + b.width(),
        }
    }

    /// Expand `self` into a single dense matrix.
    pub fn materialize(&self) -> Matrix {
        match self {
            Self::Leaf(leaf) => leaf.matrix.to_owned(),
            Self::Tensor(a, b) =>
                algebra::kron_matrices(&a.materialize(), &b.materialize()),
        }
    }

    /// Return the canonical structural key of `self`.
    ///
    /// Two operators have equal keys if and only if they have the same tree
    /// shape and bit-identical leaf matrices.
    pub fn key(&self) -> OperatorKey {
        match self {
            Self::Leaf(leaf) => {
                let entries: Box<[(u64, u64)]> =
                    leaf.matrix.iter()
                    .map(|z| ((z.re + 0.0).to_bits(), (z.im + 0.0).to_bits()))
                    .collect();
                OperatorKey::Leaf { dim: leaf.matrix.nrows(), entries }
            },
            Self::Tensor(a, b) =>
                OperatorKey::Tensor(Box::new(a.key()), Box::new(b.key())),
        }
    }

    /// Return `true` if `self` is unitary to within an optional threshold,
    /// which defaults to [`EPSILON`][algebra::EPSILON].
    pub fn is_unitary(&self, thresh: Option<f64>) -> bool {
        let u = self.materialize();
        let udag = u.t().mapv(|z| z.conj());
        algebra::approx_eq(&udag.dot(&u), &Matrix::eye(u.nrows()), thresh)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => {
                let d = leaf.matrix.nrows();
                write!(f, "U[{}x{}]", d, d)
            },
            Self::Tensor(a, b) => write!(f, "({} ⊗ {})", a, b),
        }
    }
}

/// Hashable, content-based identity of an [`Operator`] tree.
///
/// Leaf entries are stored as the raw bit patterns of their real and imaginary
/// parts (with negative zero folded into positive zero), so equality here is
/// exact rather than approximate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperatorKey {
    Leaf { dim: usize, entries: Box<[(u64, u64)]> },
    Tensor(Box<OperatorKey>, Box<OperatorKey>),
}
