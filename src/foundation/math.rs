/// 3D affine transform stored as a row-major 3x4 matrix `[A | t]`.
///
/// `apply(p) = A * p + t`. Composition follows matrix multiplication order: for
/// `a.concatenate(&b)` the result applies `b` first, then `a`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AffineTransform3D {
    m: [[f64; 4]; 3],
}

impl Default for AffineTransform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform3D {
    /// The identity transform.
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Build from raw row-major 3x4 coefficients.
    pub const fn from_rows(m: [[f64; 4]; 3]) -> Self {
        Self { m }
    }

    /// Uniform scaling about the origin.
    pub const fn from_scale(s: f64) -> Self {
        Self::from_scales([s, s, s])
    }

    /// Per-axis scaling about the origin.
    pub const fn from_scales(s: [f64; 3]) -> Self {
        Self {
            m: [
                [s[0], 0.0, 0.0, 0.0],
                [0.0, s[1], 0.0, 0.0],
                [0.0, 0.0, s[2], 0.0],
            ],
        }
    }

    /// Pure translation.
    pub const fn from_translation(t: [f64; 3]) -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, t[0]],
                [0.0, 1.0, 0.0, t[1]],
                [0.0, 0.0, 1.0, t[2]],
            ],
        }
    }

    /// Rotation by `radians` about the z (view) axis.
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            m: [
                [c, -s, 0.0, 0.0],
                [s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Raw row-major coefficients.
    pub const fn rows(&self) -> [[f64; 4]; 3] {
        self.m
    }

    /// Translation column.
    pub fn translation(&self) -> [f64; 3] {
        [self.m[0][3], self.m[1][3], self.m[2][3]]
    }

    /// `self ∘ other`: apply `other` first.
    pub fn concatenate(&self, other: &Self) -> Self {
        let a = &self.m;
        let b = &other.m;
        let mut out = [[0.0; 4]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for c in 0..4 {
                let mut v = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
                if c == 3 {
                    v += a[r][3];
                }
                row[c] = v;
            }
        }
        Self { m: out }
    }

    /// `other ∘ self`: apply `self` first.
    pub fn pre_concatenate(&self, other: &Self) -> Self {
        other.concatenate(self)
    }

    /// Transform a point.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.m;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2] + m[0][3],
            m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2] + m[1][3],
            m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2] + m[2][3],
        ]
    }

    /// Transform a direction (translation ignored).
    pub fn apply_vector(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse transform, or `None` when the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-300 {
            return None;
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        let mut a = [[0.0; 3]; 3];
        a[0][0] = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det;
        a[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        a[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        a[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        a[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        a[1][2] = (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det;
        a[2][0] = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det;
        a[2][1] = (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det;
        a[2][2] = (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det;

        let t = self.translation();
        let mut out = [[0.0; 4]; 3];
        for r in 0..3 {
            out[r][..3].copy_from_slice(&a[r]);
            out[r][3] = -(a[r][0] * t[0] + a[r][1] * t[1] + a[r][2] * t[2]);
        }
        Some(Self { m: out })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
