//! Arithmetic on fixed-length vectors of reals.
//!
//! Every binary operation checks the operand lengths and reports a mismatch as a
//! [`DimensionError`]. Results are either freshly allocated (`add`, `sub`,
//! `blend`) or written into storage owned by the caller (`blend_into`,
//! `blend_assign`, `add_assign`, `scale`). The in-place forms cover the cases
//! where the target is also an operand, e.g. `z = z + a`; they are only offered
//! for elementwise operations.

use std::fmt::Display;

use ndarray::prelude::*;
use ndarray::Zip;
use num_traits::Float;
use thiserror::Error;

pub mod matrix;

/// Two arrays that take part in the same operation have different lengths.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("inconsistent array lengths: expected {expected}, found {found}")]
pub struct DimensionError {
    pub expected: usize,
    pub found: usize,
}

#[inline]
pub(crate) fn check_len(expected: usize, found: usize) -> Result<(), DimensionError> {
    if expected == found {
        Ok(())
    } else {
        Err(DimensionError { expected, found })
    }
}

/// Elementwise `a + b`.
pub fn add<A: Float>(a: ArrayView1<A>, b: ArrayView1<A>) -> Result<Array1<A>, DimensionError> {
    check_len(a.len(), b.len())?;
    Ok(Zip::from(&a).and(&b).map_collect(|&a, &b| a + b))
}

/// Elementwise `a - b`.
pub fn sub<A: Float>(a: ArrayView1<A>, b: ArrayView1<A>) -> Result<Array1<A>, DimensionError> {
    check_len(a.len(), b.len())?;
    Ok(Zip::from(&a).and(&b).map_collect(|&a, &b| a - b))
}

/// Scaled blend `sa * a + sb * b`.
pub fn blend<A: Float>(
    a: ArrayView1<A>,
    b: ArrayView1<A>,
    sa: A,
    sb: A,
) -> Result<Array1<A>, DimensionError> {
    check_len(a.len(), b.len())?;
    Ok(Zip::from(&a).and(&b).map_collect(|&a, &b| sa * a + sb * b))
}

/// Scaled blend `sa * a + sb * b`, written into `z`.
pub fn blend_into<A: Float>(
    mut z: ArrayViewMut1<A>,
    a: ArrayView1<A>,
    b: ArrayView1<A>,
    sa: A,
    sb: A,
) -> Result<(), DimensionError> {
    check_len(z.len(), a.len())?;
    check_len(z.len(), b.len())?;
    Zip::from(&mut z)
        .and(&a)
        .and(&b)
        .for_each(|z, &a, &b| *z = sa * a + sb * b);
    Ok(())
}

/// In-place blend `z = sz * z + sb * b`.
pub fn blend_assign<A: Float>(
    mut z: ArrayViewMut1<A>,
    b: ArrayView1<A>,
    sz: A,
    sb: A,
) -> Result<(), DimensionError> {
    check_len(z.len(), b.len())?;
    Zip::from(&mut z).and(&b).for_each(|z, &b| *z = sz * *z + sb * b);
    Ok(())
}

/// In-place sum `z = z + b`.
pub fn add_assign<A: Float>(mut z: ArrayViewMut1<A>, b: ArrayView1<A>) -> Result<(), DimensionError> {
    check_len(z.len(), b.len())?;
    Zip::from(&mut z).and(&b).for_each(|z, &b| *z = *z + b);
    Ok(())
}

/// Multiplies every element of `z` by `s`.
#[inline]
pub fn scale<A: Float>(mut z: ArrayViewMut1<A>, s: A) {
    z.mapv_inplace(|v| v * s);
}

pub fn dot<A: Float>(a: ArrayView1<A>, b: ArrayView1<A>) -> Result<A, DimensionError> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b.iter()).fold(A::zero(), |acc, (&a, &b)| acc + a * b))
}

#[inline]
pub fn sum<A: Float>(a: ArrayView1<A>) -> A {
    a.iter().fold(A::zero(), |acc, &v| acc + v)
}

/// Arithmetic mean, zero for an empty array.
pub fn mean<A: Float>(a: ArrayView1<A>) -> A {
    if a.is_empty() {
        return A::zero();
    }
    // The length of any array we can allocate fits in a float.
    sum(a) / A::from(a.len()).unwrap_or_else(A::one)
}

/// Euclidean (L2) norm.
pub fn mag<A: Float>(a: ArrayView1<A>) -> A {
    a.iter().fold(A::zero(), |acc, &v| acc + v * v).sqrt()
}

/// Scales `z` to unit length. A zero vector is left untouched.
pub fn normalize<A: Float>(mut z: ArrayViewMut1<A>) {
    let m = mag(z.view());
    if m == A::zero() {
        return;
    }
    z.mapv_inplace(|v| v / m);
}

/// Combined relative/absolute comparison, `|a - b| / (0.5 (|a| + |b|) + 1) <= tol`:
/// relative for large magnitudes, absolute for magnitudes well below one.
#[inline]
pub fn approx_equals<A: Float>(a: A, b: A, tol: A) -> bool {
    let half = A::from(0.5).unwrap_or_else(A::zero);
    (a - b).abs() / (half * (a.abs() + b.abs()) + A::one()) <= tol
}

/// Elementwise [`approx_equals`]. Arrays of different length are never equal.
pub fn approx_equals_vec<A: Float>(a: ArrayView1<A>, b: ArrayView1<A>, tol: A) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(&a, &b)| approx_equals(a, b, tol))
}

/// Renders `[a, b, c]`, which is valid JSON for finite values.
pub fn to_json_string<A: Display>(a: ArrayView1<A>) -> String {
    let items: Vec<String> = a.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}
