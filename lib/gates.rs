//! Fixed catalog of elementary gates.
//!
//! Two-qubit gates use the basis ordering ∣*a*, *b*⟩ with *a* the most
//! significant qubit.

use std::f64::consts::FRAC_1_SQRT_2;
use ndarray as nd;
use crate::{ c, operator::Operator };

/// Identity.
pub fn i() -> Operator {
    Operator::leaf_unchecked(1, nd::array![
        [c!(1.0), c!(0.0)],
        [c!(0.0), c!(1.0)],
    ])
}

/// Pauli *X*.
pub fn x() -> Operator {
    Operator::leaf_unchecked(1, nd::array![
        [c!(0.0), c!(1.0)],
        [c!(1.0), c!(0.0)],
    ])
}

/// Pauli *Y*.
pub fn y() -> Operator {
    Operator::leaf_unchecked(1, nd::array![
        [c!(0.0),     c!(i -1.0)],
        [c!(i 1.0),   c!(0.0)     ],
    ])
}

/// Pauli *Z*.
pub fn z() -> Operator {
    Operator::leaf_unchecked(1, nd::array![
        [c!(1.0), c!(0.0) ],
        [c!(0.0), c!(-1.0)],
    ])
}

/// Hadamard.
pub fn h() -> Operator {
    let a = FRAC_1_SQRT_2;
    Operator::leaf_unchecked(1, nd::array![
        [c!(a), c!(a) ],
        [c!(a), c!(-a)],
    ])
}

/// Phase rotation diag(1, e<sup>*iφ*</sup>).
pub fn r(phi: f64) -> Operator {
    Operator::leaf_unchecked(1, nd::array![
        [c!(1.0), c!(0.0)  ],
        [c!(0.0), c!(e phi)],
    ])
}

/// Controlled-NOT on ∣control, target⟩.
pub fn cnot() -> Operator {
    Operator::leaf_unchecked(2, nd::array![
        [c!(1.0), c!(0.0), c!(0.0), c!(0.0)],
        [c!(0.0), c!(1.0), c!(0.0), c!(0.0)],
        [c!(0.0), c!(0.0), c!(0.0), c!(1.0)],
        [c!(0.0), c!(0.0), c!(1.0), c!(0.0)],
    ])
}
