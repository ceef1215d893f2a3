//! This package contains a small simulator for quantum circuits of qubits,
//! working over dense state vectors and unitary matrices.
//!
//! - [`graph`] describes computations as immutable graphs of qubit inputs and
//! operator applications.
//! - [`schedule`] orders graph nodes deterministically so that every node
//! follows its inputs.
//! - [`eval`] propagates either concrete [state vectors][dirac-bra-ket] or
//! whole unitaries through a scheduled graph, memoizing operator matrices via
//! [`cache`].
//! - [`circuit`] provides constructs for ordinary descriptions of quantum
//! circuits using the conventional [circuit notation][qcircuits].
//!
//! Operators are built from dense leaf matrices and lazy tensor products; see
//! [`operator`] and [`gates`]. Qubit ordering is big-endian throughout: in a
//! Kronecker product the leftmost factor acts on the most significant bit.
//!
//! [qcircuits]: https://en.wikipedia.org/wiki/Quantum_circuit
//! [dirac-bra-ket]: https://en.wikipedia.org/wiki/Bra%E2%80%93ket_notation
//!
//! # Further reading
//! - M. A. Nielsen and I. L. Chuang, *Quantum Computation and Quantum
//! Information*, Cambridge University Press (2010).
//! - A. B. Kahn, "Topological sorting of large networks." Communications of the
//! ACM **5**, 558 (1962).
//!

pub mod algebra;
pub mod cache;
pub mod circuit;
pub mod error;
pub mod eval;
pub mod gates;
pub mod graph;
pub mod operator;
pub mod schedule;
pub(crate) mod vizdefs;

pub use error::{ SimError, SimResult };
pub use graph::{ Graph, Node, NodeId };
pub use operator::Operator;
pub use schedule::{ schedule, Schedule };
pub use eval::{ evaluate_matrix, evaluate_state, Evaluation };
pub use circuit::{ Circuit, CircuitError, Label };

pub extern crate num_complex;
/// Handy macro to create `num_complex::Complex64`s from more natural and
/// succinct syntax.
///
/// ```
/// use std::f64::consts::PI;
/// use num_complex::Complex64;
/// use qsim::c;
///
/// assert_eq!( c!(i (-1.0)),    Complex64::new(0.0, -1.0)      );
/// assert_eq!( c!(e PI),        Complex64::cis(PI)             );
/// assert_eq!( c!(1.0),         Complex64::new(1.0, 0.0)       );
/// assert_eq!( c!(1.0 + i 1.0), Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0 - i 1.0), Complex64::new(1.0, -1.0)      );
/// assert_eq!( c!(1.0 + 1.0 i), Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0 - 1.0 i), Complex64::new(1.0, -1.0)      );
/// assert_eq!( c!(1.0, 1.0),    Complex64::new(1.0, 1.0)       );
/// assert_eq!( c!(1.0, e PI),   Complex64::from_polar(1.0, PI) );
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr )
        => { $crate::num_complex::Complex64::new(0.0, $im) };
    ( e $ph:expr )
        => { $crate::num_complex::Complex64::cis($ph) };
    ( $re:expr )
        => { $crate::num_complex::Complex64::new($re, 0.0) };
    ( $re:literal + i $im:literal )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - i $im:literal )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $re:literal + $im:literal i )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - $im:literal i )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $r:expr, e $ph:expr )
        => { $crate::num_complex::Complex64::from_polar($r, $ph) };
    ( $re:expr, $im:expr )
        => { $crate::num_complex::Complex64::new($re, $im) };
}
