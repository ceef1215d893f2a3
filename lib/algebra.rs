//! Dense linear-algebra primitives: basis vectors, identity matrices, and
//! Kronecker products over `ndarray` storage.
//!
//! All vectors and matrices handled here describe systems of qubits, so every
//! dimension must be a power of two. The *qubit width* of a vector of length
//! 2<sup>*n*</sup> (or a square matrix of side 2<sup>*n*</sup>) is *n*.
//! Kronecker products follow the usual convention: in `a ⊗ b`, `a` acts on the
//! most significant qubits.

use ndarray::{ self as nd, Dimension };
use num_complex::Complex64 as C64;
use crate::error::{ SimError, SimResult };

use SimError::*;

/// Default threshold for approximate equality between complex numbers.
pub const EPSILON: f64 = 1e-12;

/// A dense vector of 2<sup>*n*</sup> amplitudes over the computational basis
/// of *n* qubits.
pub type StateVector = nd::Array1<C64>;

/// A dense complex matrix.
pub type Matrix = nd::Array2<C64>;

/// Return the base-2 logarithm of `dim`, or [`SimError::InvalidWidth`] if
/// `dim` is not a power of two.
pub fn qubit_width(dim: usize) -> SimResult<usize> {
    if dim.is_power_of_two() {
        Ok(dim.trailing_zeros() as usize)
    } else {
        Err(InvalidWidth(dim))
    }
}

/// Return the qubit width of a state vector.
pub fn vector_width<S>(v: &nd::ArrayBase<S, nd::Ix1>) -> SimResult<usize>
where S: nd::Data<Elem = C64>
{
    qubit_width(v.len())
}

/// Return the qubit width of a square matrix.
pub fn matrix_width<S>(m: &nd::ArrayBase<S, nd::Ix2>) -> SimResult<usize>
where S: nd::Data<Elem = C64>
{
    let (rows, cols) = m.dim();
    if rows != cols { return Err(NonSquare(rows, cols)); }
    qubit_width(rows)
}

/// Return 2<sup>`width`</sup>, or [`SimError::InvalidWidth`] if it does not fit
/// in a `usize`.
pub fn dimension(width: usize) -> SimResult<usize> {
    u32::try_from(width).ok()
        .and_then(|w| 1_usize.checked_shl(w))
        .ok_or(InvalidWidth(usize::MAX))
}

/// Create the computational basis vector labeled by `bits`, most significant
/// bit first.
///
/// ```
/// # use qsim::algebra::basis_vector;
/// let v = basis_vector(&[1, 0]).unwrap();
/// assert_eq!(v.len(), 4);
/// assert_eq!(v[2].re, 1.0);
/// ```
pub fn basis_vector(bits: &[u8]) -> SimResult<StateVector> {
    if bits.is_empty() { return Err(EmptyInput); }
    let dim = dimension(bits.len())?;
    let index =
        bits.iter()
        .try_fold(0_usize, |acc, b| {
            match *b {
                0 | 1 => Ok((acc << 1) | *b as usize),
                x => Err(InvalidBit(x)),
            }
        })?;
    let mut v = StateVector::zeros(dim);
    v[index] = C64::new(1.0, 0.0);
    Ok(v)
}

/// Create a state vector from raw amplitudes.
///
/// The number of amplitudes must be a power of two. No normalization is
/// performed.
pub fn state_vector<I, T>(amplitudes: I) -> SimResult<StateVector>
where
    I: IntoIterator<Item = T>,
    T: Into<C64>,
{
    let v: StateVector = amplitudes.into_iter().map(|a| a.into()).collect();
    vector_width(&v)?;
    Ok(v)
}

/// Create a state vector of width `width` with every amplitude equal to `val`.
pub fn const_vector<T>(val: T, width: usize) -> SimResult<StateVector>
where T: Into<C64>
{
    Ok(StateVector::from_elem(dimension(width)?, val.into()))
}

/// Return the identity matrix on `width` qubits.
pub fn identity(width: usize) -> SimResult<Matrix> {
    Ok(Matrix::eye(dimension(width)?))
}

/// Return the Kronecker product `a ⊗ b` of two vectors.
pub fn kron_vectors<S, T>(
    a: &nd::ArrayBase<S, nd::Ix1>,
    b: &nd::ArrayBase<T, nd::Ix1>,
) -> StateVector
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    let n = b.len();
    StateVector::from_shape_fn(a.len() * n, |k| a[k / n] * b[k % n])
}

/// Return the Kronecker product `a ⊗ b` of two matrices.
pub fn kron_matrices<S, T>(
    a: &nd::ArrayBase<S, nd::Ix2>,
    b: &nd::ArrayBase<T, nd::Ix2>,
) -> Matrix
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    nd::linalg::kron(a, b)
}

/// Fold a sequence of vectors into their Kronecker product, with the first
/// vector leftmost.
///
/// Every operand must have a power-of-two length.
pub fn tensor_vectors<'a, I>(vectors: I) -> SimResult<StateVector>
where I: IntoIterator<Item = &'a StateVector>
{
    let mut iter = vectors.into_iter();
    let first = iter.next().ok_or(EmptyInput)?;
    vector_width(first)?;
    iter.try_fold(first.clone(), |acc, v| {
        vector_width(v)?;
        Ok(kron_vectors(&acc, v))
    })
}

/// Fold a sequence of square matrices into their Kronecker product, with the
/// first matrix leftmost.
///
/// Every operand must be square with a power-of-two side.
pub fn tensor_matrices<'a, I>(matrices: I) -> SimResult<Matrix>
where I: IntoIterator<Item = &'a Matrix>
{
    let mut iter = matrices.into_iter();
    let first = iter.next().ok_or(EmptyInput)?;
    matrix_width(first)?;
    iter.try_fold(first.clone(), |acc, m| {
        matrix_width(m)?;
        Ok(kron_matrices(&acc, m))
    })
}

/// Return `true` if `a` and `b` have the same shape and all corresponding
/// elements differ in modulus by less than `thresh`, which defaults to
/// [`EPSILON`].
pub fn approx_eq<S, T, D>(
    a: &nd::ArrayBase<S, D>,
    b: &nd::ArrayBase<T, D>,
    thresh: Option<f64>,
) -> bool
where
    S: nd::Data<Elem = C64>,
    T: nd::Data<Elem = C64>,
    D: Dimension,
{
    let eps = thresh.unwrap_or(EPSILON);
    a.shape() == b.shape()
        && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < eps)
}
