//! `rostf-geometry` – rotation algebra for coordinate-frame transforms.
//!
//! Converts between the usual rotation representations and composes
//! rotations without accumulating drift.
//!
//! # Modules
//!
//! - [`rotation`] – [`Rotation`]: unit quaternion with construction from an
//!   axis and angle, a (possibly noisy) matrix, one or two vector pairs, or
//!   an Euler angle triple; vector rotation, composition and inversion.
//! - [`euler`] – [`RotationOrder`]: the twelve Cardan/Euler orders and the
//!   angle extraction with singularity detection.
//! - [`orthogonalize`] – iterative correction of near-orthogonal matrices.
//! - [`vector`] – [`Vec3`]: the three-component vector everything acts on.
//!
//! # Example
//!
//! ```rust
//! use rostf_geometry::{Rotation, RotationOrder, Vec3};
//!
//! let r = Rotation::from_euler(RotationOrder::Zyx, 0.3, 0.2, 0.1);
//! let m = r.matrix();
//! let back = Rotation::from_matrix(&m, 1e-10).unwrap();
//! assert!(Rotation::distance(&r, &back) < 1e-9);
//!
//! let [yaw, pitch, roll] = back.euler_angles(RotationOrder::Zyx).unwrap();
//! assert!((yaw - 0.3).abs() < 1e-9);
//! assert!((pitch - 0.2).abs() < 1e-9);
//! assert!((roll - 0.1).abs() < 1e-9);
//! ```

pub mod euler;
pub mod orthogonalize;
pub mod rotation;
pub mod vector;

pub use euler::{RotationOrder, UnknownRotationOrder};
pub use orthogonalize::{Matrix3, ORTHOGONALIZATION_MAX_ITERATIONS, orthogonalize};
pub use rotation::Rotation;
pub use rostf_types::{GeometryError, MatrixFault};
pub use vector::Vec3;
