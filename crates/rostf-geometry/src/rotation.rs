//! Unit-quaternion rotations.
//!
//! [`Rotation`] stores a unit quaternion `(q0, q1, q2, q3)` with `q0` the
//! scalar part.  The vector part follows the *frame* convention: a rotation
//! built with [`Rotation::from_axis_angle`] stores `sin(-angle/2)·axis`, and
//! [`Rotation::apply_to`] still rotates vectors counter-clockwise about the
//! axis.  The ROS wire format uses the opposite sign, see
//! [`Rotation::from_xyzw`].
//!
//! # Example
//!
//! ```rust
//! use std::f64::consts::FRAC_PI_2;
//! use rostf_geometry::{Rotation, Vec3};
//!
//! let r = Rotation::from_axis_angle(Vec3::PLUS_K, FRAC_PI_2);
//! let v = r.apply_to(Vec3::PLUS_I);
//! assert!(v.approx_eq(Vec3::PLUS_J, 1e-12));
//!
//! // r⁻¹ ∘ r is the identity.
//! let back = r.revert().apply_to(v);
//! assert!(back.approx_eq(Vec3::PLUS_I, 1e-12));
//! ```

use std::fmt;
use std::ops::Mul;

use rostf_types::{GeometryError, MatrixFault};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::euler::{self, RotationOrder};
use crate::orthogonalize::{Matrix3, ORTHOGONALIZATION_MAX_ITERATIONS, determinant, orthogonalize};
use crate::vector::Vec3;

/// Below this the scalar part is too small for `asin` to be accurate.
const SMALL_SCALAR: f64 = 0.1;

/// Branch selector of the matrix to quaternion conversion.
const BRANCH_LIMIT: f64 = -0.19;

/// Relative tolerance under which two vectors count as opposite.
const ANTIPODAL_TOLERANCE: f64 = 2.0e-15;

// ────────────────────────────────────────────────────────────────────────────
// Rotation
// ────────────────────────────────────────────────────────────────────────────

/// A rotation in 3-D space stored as a unit quaternion.
///
/// `q` and `-q` describe the same rotation; no operation depends on which
/// sign is stored.
///
/// Deserialization normalizes the stored components and rejects a zero or
/// non-finite quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuaternion")]
pub struct Rotation {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
}

/// Unchecked quaternion components as they appear in serialized data.
#[derive(Deserialize)]
struct RawQuaternion {
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
}

impl TryFrom<RawQuaternion> for Rotation {
    type Error = GeometryError;

    fn try_from(raw: RawQuaternion) -> Result<Self, Self::Error> {
        let norm = (raw.q0 * raw.q0 + raw.q1 * raw.q1 + raw.q2 * raw.q2 + raw.q3 * raw.q3).sqrt();
        if !norm.is_finite() || norm == 0.0 {
            return Err(GeometryError::DegenerateQuaternion { norm });
        }
        Ok(Self::new(raw.q0, raw.q1, raw.q2, raw.q3, true))
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    /// The rotation that leaves every vector unchanged.
    pub const IDENTITY: Rotation = Rotation {
        q0: 1.0,
        q1: 0.0,
        q2: 0.0,
        q3: 0.0,
    };

    /// Build a rotation from raw quaternion components.
    ///
    /// With `normalize` the components are divided by their Euclidean norm.
    /// The caller guarantees a non-zero norm; a zero quaternion yields NaN
    /// components.  Without `normalize` the caller guarantees unit norm.
    pub fn new(q0: f64, q1: f64, q2: f64, q3: f64, normalize: bool) -> Self {
        if normalize {
            let inv = 1.0 / (q0 * q0 + q1 * q1 + q2 * q2 + q3 * q3).sqrt();
            Self {
                q0: q0 * inv,
                q1: q1 * inv,
                q2: q2 * inv,
                q3: q3 * inv,
            }
        } else {
            Self { q0, q1, q2, q3 }
        }
    }

    /// Rotation of `angle` radians about `axis`.
    ///
    /// A zero `axis` yields the identity.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let norm = axis.norm();
        if norm == 0.0 {
            debug!(angle, "zero rotation axis, using identity");
            return Self::IDENTITY;
        }

        let half = -0.5 * angle;
        let coeff = half.sin() / norm;
        Self {
            q0: half.cos(),
            q1: coeff * axis.x,
            q2: coeff * axis.y,
            q3: coeff * axis.z,
        }
    }

    /// Rotation from a 3×3 matrix, correcting it first when it is only
    /// approximately orthogonal.
    ///
    /// `threshold` is the convergence threshold of [`orthogonalize`].  The
    /// matrix is rejected when the correction does not settle within
    /// [`ORTHOGONALIZATION_MAX_ITERATIONS`] iterations or when the corrected
    /// matrix is not a proper rotation (determinant ≤ 0).
    pub fn from_matrix(m: &Matrix3, threshold: f64) -> Result<Self, GeometryError> {
        let ort = orthogonalize(m, threshold, ORTHOGONALIZATION_MAX_ITERATIONS).ok_or(
            MatrixFault::NotConvergent {
                iterations: ORTHOGONALIZATION_MAX_ITERATIONS,
            },
        )?;

        let det = determinant(&ort);
        if det.is_nan() || det <= 0.0 {
            return Err(MatrixFault::NonPositiveDeterminant { determinant: det }.into());
        }

        // Pick the largest of the four candidate components so that the
        // divisions below stay well conditioned.
        let s = ort[0][0] + ort[1][1] + ort[2][2];
        if s > BRANCH_LIMIT {
            let q0 = 0.5 * (s + 1.0).sqrt();
            let inv = 0.25 / q0;
            return Ok(Self {
                q0,
                q1: inv * (ort[1][2] - ort[2][1]),
                q2: inv * (ort[2][0] - ort[0][2]),
                q3: inv * (ort[0][1] - ort[1][0]),
            });
        }

        let s = ort[0][0] - ort[1][1] - ort[2][2];
        if s > BRANCH_LIMIT {
            let q1 = 0.5 * (s + 1.0).sqrt();
            let inv = 0.25 / q1;
            return Ok(Self {
                q0: inv * (ort[1][2] - ort[2][1]),
                q1,
                q2: inv * (ort[0][1] + ort[1][0]),
                q3: inv * (ort[0][2] + ort[2][0]),
            });
        }

        let s = ort[1][1] - ort[0][0] - ort[2][2];
        if s > BRANCH_LIMIT {
            let q2 = 0.5 * (s + 1.0).sqrt();
            let inv = 0.25 / q2;
            return Ok(Self {
                q0: inv * (ort[2][0] - ort[0][2]),
                q1: inv * (ort[0][1] + ort[1][0]),
                q2,
                q3: inv * (ort[2][1] + ort[1][2]),
            });
        }

        let s = ort[2][2] - ort[0][0] - ort[1][1];
        let q3 = 0.5 * (s + 1.0).sqrt();
        let inv = 0.25 / q3;
        Ok(Self {
            q0: inv * (ort[0][1] - ort[1][0]),
            q1: inv * (ort[0][2] + ort[2][0]),
            q2: inv * (ort[2][1] + ort[1][2]),
            q3,
        })
    }

    /// Like [`Rotation::from_matrix`] for a matrix whose shape is only known
    /// at runtime.
    pub fn from_rows(rows: &[Vec<f64>], threshold: f64) -> Result<Self, GeometryError> {
        let mut m = [[0.0; 3]; 3];
        let cols = rows.first().map_or(0, Vec::len);
        if rows.len() != 3 || rows.iter().any(|row| row.len() != 3) {
            return Err(MatrixFault::Shape {
                rows: rows.len(),
                cols,
            }
            .into());
        }
        for (dst, src) in m.iter_mut().zip(rows) {
            dst.copy_from_slice(src);
        }
        Self::from_matrix(&m, threshold)
    }

    /// Rotation that maps the pair `(u1, u2)` onto `(v1, v2)`.
    ///
    /// The pairs need not have matching lengths or angles: `v1` is rescaled
    /// to the length of `u1` and `v2` is adjusted inside the `(v1, v2)` plane
    /// so that the angle between the two pairs matches.  The result maps
    /// `u1` exactly onto the direction of `v1`.
    ///
    /// When either pair is colinear the plane is undefined and the result is
    /// [`Rotation::from_vectors`]`(u1, v1)`.
    pub fn from_vector_pairs(u1: Vec3, u2: Vec3, v1: Vec3, v2: Vec3) -> Result<Self, GeometryError> {
        let u1u1 = u1.norm_squared();
        let u2u2 = u2.norm_squared();
        let v1v1 = v1.norm_squared();
        let v2v2 = v2.norm_squared();
        if u1u1 == 0.0 || u2u2 == 0.0 || v1v1 == 0.0 || v2v2 == 0.0 {
            return Err(GeometryError::DegenerateVector);
        }

        if u1.cross(u2).norm_squared() == 0.0 || v1.cross(v2).norm_squared() == 0.0 {
            return Self::from_vectors(u1, v1);
        }

        // |v1| = |u1|
        let v1 = (u1u1 / v1v1).sqrt() * v1;

        // u1·u2 = v1·v2 and |v2| = |u2|
        let u1u2 = u1.dot(u2);
        let v1v2 = v1.dot(v2);
        let coeff_u = u1u2 / u1u1;
        let coeff_v = v1v2 / u1u1;
        let beta = ((u2u2 - u1u2 * coeff_u) / (v2v2 - v1v2 * coeff_v)).sqrt();
        let alpha = coeff_u - beta * coeff_v;
        let v2 = alpha * v1 + beta * v2;

        let d1 = v1 - u1;
        let d2 = v2 - u2;
        let mut u_ref = u1;
        let mut v_ref = v1;

        let mut k = d1.cross(d2);
        let mut c = k.dot(u1.cross(u2));
        if c == 0.0 {
            // The rotation axis lies in the (u1, u2) plane; retry with the
            // normals of both planes.
            let u3 = u1.cross(u2);
            let v3 = v1.cross(v2);
            let d3 = v3 - u3;
            k = d1.cross(d3);
            c = k.dot(u1.cross(u3));
            if c == 0.0 {
                // The axis is aligned with u1; use (u2, u3) instead.
                k = d2.cross(d3);
                c = k.dot(u2.cross(u3));
                if c == 0.0 {
                    return Ok(Self::IDENTITY);
                }
                u_ref = u2;
                v_ref = v2;
            }
        }

        let c = c.sqrt();
        let inv = 1.0 / (c + c);
        let q1 = inv * k.x;
        let q2 = inv * k.y;
        let q3 = inv * k.z;

        let k = Vec3::new(
            u_ref.y * q3 - u_ref.z * q2,
            u_ref.z * q1 - u_ref.x * q3,
            u_ref.x * q2 - u_ref.y * q1,
        );
        let c = k.norm_squared();
        let q0 = v_ref.dot(k) / (c + c);

        Ok(Self { q0, q1, q2, q3 })
    }

    /// Smallest rotation that maps the direction of `u` onto the direction
    /// of `v`.
    ///
    /// Opposite vectors have infinitely many smallest rotations; a half turn
    /// about [`Vec3::orthogonal`]`(u)` is returned.
    pub fn from_vectors(u: Vec3, v: Vec3) -> Result<Self, GeometryError> {
        let norm_product = u.norm() * v.norm();
        if norm_product == 0.0 {
            return Err(GeometryError::DegenerateVector);
        }

        let dot = u.dot(v);
        if dot < (ANTIPODAL_TOLERANCE - 1.0) * norm_product {
            let w = u.orthogonal().ok_or(GeometryError::DegenerateVector)?;
            return Ok(Self {
                q0: 0.0,
                q1: -w.x,
                q2: -w.y,
                q3: -w.z,
            });
        }

        let q0 = (0.5 * (1.0 + dot / norm_product)).sqrt();
        let coeff = 1.0 / (2.0 * q0 * norm_product);
        Ok(Self {
            q0,
            q1: coeff * (v.y * u.z - v.z * u.y),
            q2: coeff * (v.z * u.x - v.x * u.z),
            q3: coeff * (v.x * u.y - v.y * u.x),
        })
    }

    /// Rotation `r1 ∘ r2 ∘ r3` where `ri` turns by `ai` about the i-th axis
    /// of `order`.
    pub fn from_euler(order: RotationOrder, a1: f64, a2: f64, a3: f64) -> Self {
        let [axis1, axis2, axis3] = order.axes();
        let r1 = Self::from_axis_angle(axis1, a1);
        let r2 = Self::from_axis_angle(axis2, a2);
        let r3 = Self::from_axis_angle(axis3, a3);
        r1.compose(r2.compose(r3))
    }

    /// Rotation from a ROS wire quaternion `(x, y, z, w)`.
    ///
    /// The wire quaternion acts as `q·v·q*`, so its vector part has the
    /// opposite sign of the one stored here.  Returns `None` when the
    /// quaternion has zero or non-finite norm.
    pub fn from_xyzw(x: f64, y: f64, z: f64, w: f64) -> Option<Self> {
        let norm = (x * x + y * y + z * z + w * w).sqrt();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        Some(Self::new(w / norm, -x / norm, -y / norm, -z / norm, false))
    }

    /// The ROS wire quaternion `[x, y, z, w]` of this rotation.
    pub fn to_xyzw(&self) -> [f64; 4] {
        [-self.q1, -self.q2, -self.q3, self.q0]
    }

    /// Scalar part.
    pub fn q0(&self) -> f64 {
        self.q0
    }

    pub fn q1(&self) -> f64 {
        self.q1
    }

    pub fn q2(&self) -> f64 {
        self.q2
    }

    pub fn q3(&self) -> f64 {
        self.q3
    }

    /// The inverse rotation.
    pub fn revert(&self) -> Self {
        Self {
            q0: -self.q0,
            ..*self
        }
    }

    /// Unit rotation axis, oriented so that [`Rotation::angle`] is in
    /// `[0, π]`.  The identity reports `+X`.
    pub fn axis(&self) -> Vec3 {
        let squared_sine = self.q1 * self.q1 + self.q2 * self.q2 + self.q3 * self.q3;
        if squared_sine == 0.0 {
            return Vec3::PLUS_I;
        }
        let inverse = 1.0 / squared_sine.sqrt();
        if self.q0 < 0.0 {
            Vec3::new(self.q1, self.q2, self.q3) * inverse
        } else {
            Vec3::new(self.q1, self.q2, self.q3) * -inverse
        }
    }

    /// Rotation angle in `[0, π]`.
    pub fn angle(&self) -> f64 {
        if self.q0 < -SMALL_SCALAR || self.q0 > SMALL_SCALAR {
            let sine = (self.q1 * self.q1 + self.q2 * self.q2 + self.q3 * self.q3).sqrt();
            2.0 * sine.asin()
        } else if self.q0 < 0.0 {
            2.0 * (-self.q0).acos()
        } else {
            2.0 * self.q0.acos()
        }
    }

    /// Angles `[a1, a2, a3]` with `Rotation::from_euler(order, a1, a2, a3)`
    /// equal to `self`, or `None` at a representation singularity.
    pub fn euler_angles(&self, order: RotationOrder) -> Option<[f64; 3]> {
        euler::extract(self, order)
    }

    /// The rotation matrix, stored row-major.
    ///
    /// Rows are the images of the canonical vectors under the inverse
    /// rotation, so `matrix()[i][j]` is component `i` of
    /// `apply_to(e_j)`.
    pub fn matrix(&self) -> Matrix3 {
        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        let q0q0 = q0 * q0;
        let q0q1 = q0 * q1;
        let q0q2 = q0 * q2;
        let q0q3 = q0 * q3;
        let q1q1 = q1 * q1;
        let q1q2 = q1 * q2;
        let q1q3 = q1 * q3;
        let q2q2 = q2 * q2;
        let q2q3 = q2 * q3;
        let q3q3 = q3 * q3;

        [
            [
                2.0 * (q0q0 + q1q1) - 1.0,
                2.0 * (q1q2 + q0q3),
                2.0 * (q1q3 - q0q2),
            ],
            [
                2.0 * (q1q2 - q0q3),
                2.0 * (q0q0 + q2q2) - 1.0,
                2.0 * (q2q3 + q0q1),
            ],
            [
                2.0 * (q1q3 + q0q2),
                2.0 * (q2q3 - q0q1),
                2.0 * (q0q0 + q3q3) - 1.0,
            ],
        ]
    }

    /// Rotate `v`.
    pub fn apply_to(&self, v: Vec3) -> Vec3 {
        rotate(self.q0, self.q1, self.q2, self.q3, v)
    }

    /// Rotate `v` by the inverse rotation.
    pub fn apply_inverse_to(&self, v: Vec3) -> Vec3 {
        rotate(-self.q0, self.q1, self.q2, self.q3, v)
    }

    /// `self ∘ r`: applying the result equals applying `r`, then `self`.
    pub fn compose(&self, r: Rotation) -> Rotation {
        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        Rotation {
            q0: r.q0 * q0 - (r.q1 * q1 + r.q2 * q2 + r.q3 * q3),
            q1: r.q1 * q0 + r.q0 * q1 + (r.q2 * q3 - r.q3 * q2),
            q2: r.q2 * q0 + r.q0 * q2 + (r.q3 * q1 - r.q1 * q3),
            q3: r.q3 * q0 + r.q0 * q3 + (r.q1 * q2 - r.q2 * q1),
        }
    }

    /// `self⁻¹ ∘ r`: applying the result equals applying `r`, then the
    /// inverse of `self`.
    pub fn compose_inverse(&self, r: Rotation) -> Rotation {
        let (q0, q1, q2, q3) = (self.q0, self.q1, self.q2, self.q3);
        Rotation {
            q0: -r.q0 * q0 - (r.q1 * q1 + r.q2 * q2 + r.q3 * q3),
            q1: -r.q1 * q0 + r.q0 * q1 + (r.q2 * q3 - r.q3 * q2),
            q2: -r.q2 * q0 + r.q0 * q2 + (r.q3 * q1 - r.q1 * q3),
            q3: -r.q3 * q0 + r.q0 * q3 + (r.q1 * q2 - r.q2 * q1),
        }
    }

    /// Angle of the rotation taking `r1` to `r2`, in `[0, π]`.
    ///
    /// Zero for identical rotations, whichever quaternion sign each one
    /// stores.
    pub fn distance(r1: &Rotation, r2: &Rotation) -> f64 {
        r1.compose_inverse(*r2).angle()
    }
}

/// `q0` is passed separately so the inverse can flip its sign alone.
fn rotate(q0: f64, q1: f64, q2: f64, q3: f64, v: Vec3) -> Vec3 {
    let Vec3 { x, y, z } = v;
    let s = q1 * x + q2 * y + q3 * z;
    Vec3::new(
        2.0 * (q0 * (x * q0 - (q2 * z - q3 * y)) + s * q1) - x,
        2.0 * (q0 * (y * q0 - (q3 * x - q1 * z)) + s * q2) - y,
        2.0 * (q0 * (z * q0 - (q1 * y - q2 * x)) + s * q3) - z,
    )
}

/// `a * b` is `a.compose(b)`.
impl Mul for Rotation {
    type Output = Rotation;

    fn mul(self, rhs: Rotation) -> Rotation {
        self.compose(rhs)
    }
}

impl Mul<Vec3> for Rotation {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Vec3 {
        self.apply_to(v)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.q0, self.q1, self.q2, self.q3)
    }
}
