//! General 3x3 matrices for frame-to-frame transforms.
//!
//! Unlike a pure rotation, the transform fitted from three sync points absorbs
//! whatever small shear and scale the mount's errors introduce, so its inverse
//! cannot be taken as the transpose. Inversion goes through an LU decomposition
//! with partial pivoting; a basis whose determinant is indistinguishable from
//! zero is reported as singular instead of producing huge, meaningless entries.
//!
//! # Storage Layout
//!
//! Row-major `[[f64; 3]; 3]`. A matrix multiplies a column vector on its right:
//!
//! ```text
//! | m00 m01 m02 |   | x |
//! | m10 m11 m12 | * | y |
//! | m20 m21 m22 |   | z |
//! ```
//!
//! [`from_columns`](Matrix3::from_columns) is the natural constructor for the
//! alignment basis matrices, whose columns are direction vectors.
//!
//! ```
//! use celestial_alignment::matrix::Matrix3;
//!
//! let m = Matrix3::from_rows([[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 8.0]]);
//! let inv = m.try_inverse().unwrap();
//! assert!((m * inv).max_difference(&Matrix3::identity()) < 1e-15);
//! ```

use crate::vector::DirectionVector;
use std::fmt;
use tracing::error;

/// Determinant magnitude below which a matrix is treated as singular.
pub const DEFAULT_SINGULAR_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix3 {
    elements: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix3 {
    pub fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    pub fn from_rows(elements: [[f64; 3]; 3]) -> Self {
        Self { elements }
    }

    /// Builds a matrix whose columns are the three given vectors.
    pub fn from_columns(c0: &DirectionVector, c1: &DirectionVector, c2: &DirectionVector) -> Self {
        Self::from_rows([
            [c0.x, c1.x, c2.x],
            [c0.y, c1.y, c2.y],
            [c0.z, c1.z, c2.z],
        ])
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.elements[row][col]
    }

    pub fn elements(&self) -> &[[f64; 3]; 3] {
        &self.elements
    }

    /// Matrix product `self * other`.
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = [[0.0; 3]; 3];

        for (i, row) in result.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                for k in 0..3 {
                    *cell += self.elements[i][k] * other.elements[k][j];
                }
            }
        }

        Self::from_rows(result)
    }

    /// Applies the matrix to a direction vector. The result is not renormalised.
    pub fn apply(&self, v: &DirectionVector) -> DirectionVector {
        let m = &self.elements;
        DirectionVector::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.elements;

        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    pub fn transpose(&self) -> Self {
        let m = &self.elements;
        Self::from_rows([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Inverse via LU decomposition, or `None` if the matrix is singular.
    pub fn try_inverse(&self) -> Option<Self> {
        self.try_inverse_with_tolerance(DEFAULT_SINGULAR_TOLERANCE)
    }

    /// Like [`try_inverse`](Self::try_inverse) with an explicit singularity threshold
    /// on `|det|`.
    pub fn try_inverse_with_tolerance(&self, tolerance: f64) -> Option<Self> {
        let lu = LuDecomposition::new(self)?;
        if lu.determinant().abs() < tolerance {
            return None;
        }
        let mut inverse = [[0.0; 3]; 3];
        for col in 0..3 {
            let mut unit = [0.0; 3];
            unit[col] = 1.0;
            let x = lu.solve(unit);
            for (row, value) in x.iter().enumerate() {
                inverse[row][col] = *value;
            }
        }
        Some(Self::from_rows(inverse))
    }

    /// Inverse, or the identity matrix when the matrix is singular.
    ///
    /// The substitution is logged at error level; it is never fatal.
    pub fn inverse_or_identity(&self, tolerance: f64) -> Self {
        match self.try_inverse_with_tolerance(tolerance) {
            Some(inverse) => inverse,
            None => {
                error!(
                    determinant = self.determinant(),
                    "singular basis matrix, substituting identity"
                );
                Self::identity()
            }
        }
    }

    /// Largest absolute element-wise difference between two matrices.
    pub fn max_difference(&self, other: &Self) -> f64 {
        let mut max_diff = 0.0_f64;
        for i in 0..3 {
            for j in 0..3 {
                max_diff = max_diff.max((self.elements[i][j] - other.elements[i][j]).abs());
            }
        }
        max_diff
    }
}

/// Packed `PA = LU` factorisation of a 3x3 matrix.
///
/// `L` is unit lower triangular and stored below the diagonal, `U` on and above it.
/// `perm[i]` is the source row that ended up in row `i`.
struct LuDecomposition {
    lu: [[f64; 3]; 3],
    perm: [usize; 3],
    sign: f64,
}

impl LuDecomposition {
    fn new(m: &Matrix3) -> Option<Self> {
        let mut lu = m.elements;
        let mut perm = [0, 1, 2];
        let mut sign = 1.0;

        for k in 0..3 {
            let pivot_row = (k..3)
                .max_by(|&a, &b| lu[a][k].abs().total_cmp(&lu[b][k].abs()))
                .unwrap_or(k);
            if pivot_row != k {
                lu.swap(pivot_row, k);
                perm.swap(pivot_row, k);
                sign = -sign;
            }
            let pivot = lu[k][k];
            if pivot == 0.0 {
                return None;
            }
            for i in k + 1..3 {
                lu[i][k] /= pivot;
                for j in k + 1..3 {
                    lu[i][j] -= lu[i][k] * lu[k][j];
                }
            }
        }

        Some(Self { lu, perm, sign })
    }

    fn determinant(&self) -> f64 {
        self.sign * self.lu[0][0] * self.lu[1][1] * self.lu[2][2]
    }

    fn solve(&self, b: [f64; 3]) -> [f64; 3] {
        let mut y = [0.0; 3];
        for i in 0..3 {
            let mut sum = b[self.perm[i]];
            for k in 0..i {
                sum -= self.lu[i][k] * y[k];
            }
            y[i] = sum;
        }
        let mut x = [0.0; 3];
        for i in (0..3).rev() {
            let mut sum = y[i];
            for k in i + 1..3 {
                sum -= self.lu[i][k] * x[k];
            }
            x[i] = sum / self.lu[i][i];
        }
        x
    }
}

impl std::ops::Mul for Matrix3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.multiply(&rhs)
    }
}

impl std::ops::Mul<&Matrix3> for &Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: &Matrix3) -> Matrix3 {
        self.multiply(rhs)
    }
}

impl std::ops::Mul<DirectionVector> for Matrix3 {
    type Output = DirectionVector;

    fn mul(self, v: DirectionVector) -> DirectionVector {
        self.apply(&v)
    }
}

impl std::ops::Mul<DirectionVector> for &Matrix3 {
    type Output = DirectionVector;

    fn mul(self, v: DirectionVector) -> DirectionVector {
        self.apply(&v)
    }
}

impl std::ops::Index<(usize, usize)> for Matrix3 {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.elements[row][col]
    }
}

impl fmt::Display for Matrix3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix3:")?;
        for row in &self.elements {
            writeln!(f, "  [{:12.9} {:12.9} {:12.9}]", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}
