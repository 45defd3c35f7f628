//! Vertices and the simplex they form.
//!
//! A simplex in `n` dimensions holds `n + 1` vertices, each a point together
//! with the objective value at that point. Every mutating operation leaves the
//! vertices sorted ascending by value, so index 0 is the best point and index
//! `n` the worst.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Index;

use ndarray::prelude::*;

use crate::array::{self, DimensionError};
use crate::error::{ConfigError, Degeneracy, Error};
use crate::utils::WrappedFunction;

/// A point paired with its cached objective value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vertex {
    pub x: Array1<f64>,
    pub f: f64,
}

impl Vertex {
    pub fn new(x: Array1<f64>, f: f64) -> Self {
        Vertex { x, f }
    }

    /// The origin in `n` dimensions with a zero value.
    pub fn zeros(n: usize) -> Self {
        Vertex::new(Array1::zeros(n), 0.0)
    }

    pub fn dim(&self) -> usize {
        self.x.len()
    }

    /// Tolerant comparison of both the point and the value,
    /// see [`array::approx_equals`].
    pub fn approx_equals(&self, other: &Vertex, tol: f64) -> bool {
        array::approx_equals_vec(self.x.view(), other.x.view(), tol)
            && array::approx_equals(self.f, other.f, tol)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{\"x\":{}, \"f\":{}}}", array::to_json_string(self.x.view()), self.f)
    }
}

/// Orders objective values ascending. NaN sorts after every number.
#[inline]
fn compare(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// `n + 1` vertices in `n` dimensions, sorted ascending by objective value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Simplex {
    vertices: Vec<Vertex>,
}

impl Simplex {
    /// Wraps an explicit set of vertices, e.g. one restored from a checkpoint.
    /// The vertices must share one dimension `n >= 1` and there must be
    /// exactly `n + 1` of them. The result is sorted.
    pub fn from_vertices(vertices: Vec<Vertex>) -> Result<Self, Error> {
        let n = vertices.first().ok_or(Degeneracy::NoVertices)?.dim();
        if let Some(v) = vertices.iter().find(|v| v.dim() != n) {
            return Err(DimensionError { expected: n, found: v.dim() }.into());
        }
        if n == 0 || vertices.len() != n + 1 {
            return Err(Degeneracy::WrongCount { vertices: vertices.len(), dim: n }.into());
        }
        let mut simplex = Simplex { vertices };
        simplex.order();
        Ok(simplex)
    }

    /// Number of vertices, `n + 1`.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Dimension `n` of the parameter space.
    pub fn dim(&self) -> usize {
        self.vertices[0].dim()
    }

    pub fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub fn worst(&self) -> &Vertex {
        &self.vertices[self.vertices.len() - 1]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vertex> {
        self.vertices.iter()
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Sorts the vertices ascending by objective value.
    ///
    /// The sort is stable: vertices with equal values keep their current
    /// relative order, so sorting a sorted simplex changes nothing.
    pub fn order(&mut self) {
        self.vertices.sort_by(|a, b| compare(a.f, b.f));
    }

    /// Mean point and mean value of the best `len() - p` vertices, leaving the
    /// `p` worst ones out.
    pub fn centroid(&self, p: usize) -> Result<Vertex, Error> {
        if self.vertices.is_empty() {
            return Err(Degeneracy::NoVertices.into());
        }
        if p == 0 {
            return Err(ConfigError::ZeroExclusion.into());
        }
        let nv = self.vertices.len();
        if p >= nv {
            return Err(Degeneracy::NoneRemaining { vertices: nv, excluded: p }.into());
        }
        let k = nv - p;
        let mut c = Vertex::zeros(self.dim());
        for v in &self.vertices[..k] {
            array::add_assign(c.x.view_mut(), v.x.view())?;
            c.f += v.f;
        }
        let s = 1.0 / k as f64;
        array::scale(c.x.view_mut(), s);
        c.f *= s;
        Ok(c)
    }

    /// Population mean and standard deviation of the objective values.
    pub fn f_stats(&self) -> (f64, f64) {
        let nv = self.vertices.len() as f64;
        let mean = self.vertices.iter().map(|v| v.f).sum::<f64>() / nv;
        let variance = self
            .vertices
            .iter()
            .map(|v| (v.f - mean) * (v.f - mean))
            .sum::<f64>()
            / nv;
        (mean, variance.sqrt())
    }
}

impl Index<usize> for Simplex {
    type Output = Vertex;

    fn index(&self, i: usize) -> &Vertex {
        &self.vertices[i]
    }
}

impl<'a> IntoIterator for &'a Simplex {
    type Item = &'a Vertex;
    type IntoIter = std::slice::Iter<'a, Vertex>;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices.iter()
    }
}

/// JSON-compatible rendering, `{"n":2, "vertices":[{"x":[..], "f":..}, ..]}`.
impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{\"n\":{}, \"vertices\":[", self.vertices.len().saturating_sub(1))?;
        for (i, v) in self.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]}}")
    }
}

/// Builds the initial simplex around `x0`: the start point itself plus one
/// vertex per axis, displaced along that axis by `dx[i]`.
///
/// Returns the sorted simplex and the number of objective evaluations used,
/// which is always `n + 1`.
pub fn build_simplex<F>(
    x0: ArrayView1<f64>,
    dx: ArrayView1<f64>,
    func: F,
) -> Result<(Simplex, usize), Error>
where
    F: Fn(ArrayView1<f64>) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return Err(ConfigError::Empty.into());
    }
    if dx.len() != n {
        return Err(ConfigError::LengthMismatch { params: n, steps: dx.len() }.into());
    }
    if let Some(axis) = dx.iter().position(|&d| d == 0.0) {
        return Err(ConfigError::ZeroStep { axis }.into());
    }

    let points = std::iter::once(x0.to_owned()).chain((0..n).map(|i| {
        let mut x = x0.to_owned();
        x[i] += dx[i];
        x
    }));
    // the n + 1 evaluations are independent of each other
    let mut func = WrappedFunction::new(&func);
    let vertices = points
        .map(|x| {
            let f = func.call(x.view());
            Vertex::new(x, f)
        })
        .collect();

    let mut simplex = Simplex { vertices };
    simplex.order();
    Ok((simplex, func.num))
}
