//! `rostf-types` – shared vocabulary of the rostf workspace.
//!
//! Holds the types every other crate agrees on:
//!
//! - [`Stamp`] – a ROS-style `(sec, nsec)` source timestamp.
//! - The inbound wire records ([`TransformRecord`], [`TfMessage`]) in the
//!   shape rosbridge publishes `geometry_msgs/TransformStamped` and
//!   `tf2_msgs/TFMessage` as JSON.
//! - [`GeometryError`] – failures of the rotation constructors.
//!
//! # Example
//!
//! ```rust
//! use rostf_types::{Stamp, TfMessage};
//!
//! let raw = r#"{"transforms": [{
//!     "header": {"stamp": {"secs": 12, "nsecs": 500000000}, "frame_id": "map"},
//!     "child_frame_id": "base_link",
//!     "transform": {
//!         "translation": {"x": 1.0, "y": 0.0, "z": 0.0},
//!         "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}
//!     }
//! }]}"#;
//!
//! let msg: TfMessage = serde_json::from_str(raw).unwrap();
//! assert_eq!(msg.transforms[0].header.stamp, Stamp::new(12, 500_000_000));
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SEC: i64 = 1_000_000_000;

// ────────────────────────────────────────────────────────────────────────────
// Stamp
// ────────────────────────────────────────────────────────────────────────────

/// Source timestamp of a transform, as carried in a ROS message header.
///
/// Ordering is lexicographic on `(sec, nsec)`, which matches chronological
/// order as long as `nsec` stays within `[0, 1e9)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// Whole seconds.
    #[serde(rename = "secs", alias = "sec")]
    pub sec: i32,
    /// Nanoseconds past `sec`.
    #[serde(rename = "nsecs", alias = "nanosec")]
    pub nsec: i32,
}

impl Stamp {
    /// The zero timestamp.
    pub const ZERO: Stamp = Stamp { sec: 0, nsec: 0 };

    /// Create a timestamp from its raw parts.
    pub fn new(sec: i32, nsec: i32) -> Self {
        Self { sec, nsec }
    }

    /// The earliest representable timestamp.
    pub const MIN: Stamp = Stamp { sec: i32::MIN, nsec: 0 };

    /// The latest representable timestamp.
    pub const MAX: Stamp = Stamp {
        sec: i32::MAX,
        nsec: (NANOS_PER_SEC - 1) as i32,
    };

    /// Build a timestamp from fractional seconds, rounding to the nearest
    /// nanosecond.
    ///
    /// Fails when `secs` is not finite or does not fit the `i32` seconds
    /// field.
    pub fn try_from_secs_f64(secs: f64) -> Result<Self, StampOutOfRange> {
        if !secs.is_finite() {
            return Err(StampOutOfRange { secs });
        }
        let whole = secs.floor();
        let mut sec = whole as i64;
        let mut nsec = ((secs - whole) * 1e9).round() as i64;
        if nsec >= NANOS_PER_SEC {
            sec += 1;
            nsec -= NANOS_PER_SEC;
        }
        let sec = i32::try_from(sec).map_err(|_| StampOutOfRange { secs })?;
        Ok(Self::new(sec, nsec as i32))
    }

    /// Like [`Stamp::try_from_secs_f64`], but clamps out-of-range values to
    /// [`Stamp::MIN`] / [`Stamp::MAX`] and maps NaN to [`Stamp::ZERO`].
    pub fn from_secs_f64(secs: f64) -> Self {
        match Self::try_from_secs_f64(secs) {
            Ok(stamp) => stamp,
            Err(_) if secs.is_nan() => Self::ZERO,
            Err(_) if secs < 0.0 => Self::MIN,
            Err(_) => Self::MAX,
        }
    }

    /// The current wall-clock time, clamped to [`Stamp::MAX`] past 2038.
    pub fn now() -> Self {
        Self::try_from(Utc::now()).unwrap_or(Self::MAX)
    }

    /// This timestamp expressed in fractional seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 / 1e9
    }

    /// Signed time elapsed from `earlier` to `self`, in seconds.
    ///
    /// Computed on widened integers so that timestamps far apart do not
    /// overflow before the conversion to `f64`.
    pub fn seconds_since(&self, earlier: Stamp) -> f64 {
        let secs = self.sec as i64 - earlier.sec as i64;
        let nsecs = self.nsec as i64 - earlier.nsec as i64;
        secs as f64 + nsecs as f64 / 1e9
    }
}

impl TryFrom<DateTime<Utc>> for Stamp {
    type Error = StampOutOfRange;

    fn try_from(t: DateTime<Utc>) -> Result<Self, Self::Error> {
        let out_of_range = || StampOutOfRange {
            secs: t.timestamp() as f64,
        };
        let sec = i32::try_from(t.timestamp()).map_err(|_| out_of_range())?;
        // Leap seconds push the sub-second part up to 1_999_999_999.
        let nsec = i32::try_from(t.timestamp_subsec_nanos()).map_err(|_| out_of_range())?;
        Ok(Self::new(sec, nsec))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire records
// ────────────────────────────────────────────────────────────────────────────

/// A translation as it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireVector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A Hamilton quaternion as it appears on the wire (`x, y, z, w` order).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for WireQuaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Message header: when the pose was produced and which frame it is
/// expressed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub stamp: Stamp,
    pub frame_id: String,
}

/// Translation plus rotation of a child frame relative to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTransform {
    pub translation: WireVector3,
    pub rotation: WireQuaternion,
}

/// One decoded pose record (`geometry_msgs/TransformStamped`).
///
/// `header.frame_id` names the parent frame, `child_frame_id` the child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub header: Header,
    pub child_frame_id: String,
    pub transform: WireTransform,
}

impl TransformRecord {
    /// Convenience constructor used by producers that do not go through
    /// JSON.
    pub fn new(
        parent_frame_id: impl Into<String>,
        child_frame_id: impl Into<String>,
        translation: WireVector3,
        rotation: WireQuaternion,
        stamp: Stamp,
    ) -> Self {
        Self {
            header: Header {
                stamp,
                frame_id: parent_frame_id.into(),
            },
            child_frame_id: child_frame_id.into(),
            transform: WireTransform {
                translation,
                rotation,
            },
        }
    }
}

/// A batch of pose records, as delivered on the `/tf` topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfMessage {
    pub transforms: Vec<TransformRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Why a matrix was rejected as a rotation matrix.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatrixFault {
    #[error("a {rows}x{cols} matrix cannot be a rotation matrix")]
    Shape { rows: usize, cols: usize },

    #[error("unable to orthogonalize matrix in {iterations} iterations")]
    NotConvergent { iterations: usize },

    #[error("the closest orthogonal matrix has a non-positive determinant {determinant}")]
    NonPositiveDeterminant { determinant: f64 },
}

/// A time that does not fit a [`Stamp`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("{secs} s is outside the representable stamp range")]
pub struct StampOutOfRange {
    pub secs: f64,
}

/// Failures of the rotation constructors.
///
/// Representation singularities (gimbal lock) are not errors: Euler angle
/// extraction reports them as `None`.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryError {
    #[error("invalid rotation matrix: {0}")]
    InvalidRotationMatrix(#[from] MatrixFault),

    #[error("zero norm for rotation defining vector")]
    DegenerateVector,

    #[error("quaternion norm {norm} is zero or not finite")]
    DegenerateQuaternion { norm: f64 },
}
