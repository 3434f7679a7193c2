//! [`FrameTransform`] – one timestamped pose of a child frame relative to its
//! parent – and [`combine`], which chains two of them.
//!
//! A transform from `A` to `B` maps coordinates expressed in `B` into `A`:
//! rotate by `rotation`, then add `translation`.
//!
//! # Example
//!
//! ```rust
//! use rostf_buffer::{FrameTransform, combine};
//! use rostf_geometry::{Rotation, Vec3};
//! use rostf_types::Stamp;
//!
//! // base_link is 1 m forward of map, laser is 0.5 m forward of base_link.
//! let base = FrameTransform::new("map", "base_link",
//!     Vec3::new(1.0, 0.0, 0.0), Rotation::IDENTITY, Stamp::new(10, 0));
//! let laser = FrameTransform::new("base_link", "laser",
//!     Vec3::new(0.5, 0.0, 0.0), Rotation::IDENTITY, Stamp::new(9, 0));
//!
//! let t = combine(Some(&base), Some(&laser)).unwrap();
//! assert_eq!(t.parent_frame(), "/map");
//! assert_eq!(t.child_frame(), "/laser");
//! assert!((t.translation().x - 1.5).abs() < 1e-12);
//! assert_eq!(t.stamp(), Stamp::new(9, 0));
//! ```

use rostf_geometry::{Rotation, RotationOrder, Vec3};
use rostf_types::{Stamp, TransformRecord, WireQuaternion};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::frame_id::canonicalize;

/// A rigid-body transform between two named frames at one instant.
///
/// Frame names are canonicalized on construction.  Values are never
/// mutated; every operation returns a new transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FrameTransformRepr")]
pub struct FrameTransform {
    parent_frame: String,
    child_frame: String,
    translation: Vec3,
    rotation: Rotation,
    stamp: Stamp,
}

/// Serialized form; deserialization goes back through
/// [`FrameTransform::new`] so frame names come out canonical.
#[derive(Deserialize)]
struct FrameTransformRepr {
    parent_frame: String,
    child_frame: String,
    translation: Vec3,
    rotation: Rotation,
    stamp: Stamp,
}

impl From<FrameTransformRepr> for FrameTransform {
    fn from(r: FrameTransformRepr) -> Self {
        Self::new(&r.parent_frame, &r.child_frame, r.translation, r.rotation, r.stamp)
    }
}

impl FrameTransform {
    pub fn new(
        parent_frame: &str,
        child_frame: &str,
        translation: Vec3,
        rotation: Rotation,
        stamp: Stamp,
    ) -> Self {
        Self {
            parent_frame: canonicalize(parent_frame).into_owned(),
            child_frame: canonicalize(child_frame).into_owned(),
            translation,
            rotation,
            stamp,
        }
    }

    /// Decode a wire record.  A zero quaternion is replaced by the identity.
    pub fn from_record(record: &TransformRecord) -> Self {
        let q = record.transform.rotation;
        let rotation = Rotation::from_xyzw(q.x, q.y, q.z, q.w).unwrap_or_else(|| {
            warn!(
                parent = %record.header.frame_id,
                child = %record.child_frame_id,
                "degenerate wire quaternion, using identity"
            );
            Rotation::IDENTITY
        });
        Self::new(
            &record.header.frame_id,
            &record.child_frame_id,
            record.transform.translation.into(),
            rotation,
            record.header.stamp,
        )
    }

    /// Encode back into a wire record.
    pub fn to_record(&self) -> TransformRecord {
        let [x, y, z, w] = self.rotation.to_xyzw();
        TransformRecord::new(
            self.parent_frame.clone(),
            self.child_frame.clone(),
            self.translation.into(),
            WireQuaternion { x, y, z, w },
            self.stamp,
        )
    }

    pub fn parent_frame(&self) -> &str {
        &self.parent_frame
    }

    pub fn child_frame(&self) -> &str {
        &self.child_frame
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    /// Chain `self` (A→B) with `next` (B→C) into A→C.
    ///
    /// Frame names are not checked; the result takes its parent from
    /// `self`, its child from `next` and the older of the two stamps.
    pub fn then(&self, next: &FrameTransform) -> FrameTransform {
        FrameTransform {
            parent_frame: self.parent_frame.clone(),
            child_frame: next.child_frame.clone(),
            translation: self.translation + self.rotation.apply_to(next.translation),
            rotation: self.rotation.compose(next.rotation),
            stamp: self.stamp.min(next.stamp),
        }
    }

    /// The transform in the opposite direction (B→A for an A→B transform).
    pub fn inverse(&self) -> FrameTransform {
        FrameTransform {
            parent_frame: self.child_frame.clone(),
            child_frame: self.parent_frame.clone(),
            translation: -self.rotation.apply_inverse_to(self.translation),
            rotation: self.rotation.revert(),
            stamp: self.stamp,
        }
    }

    /// Express a point given in the child frame in the parent frame.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.translation + self.rotation.apply_to(p)
    }

    /// Heading about the parent's Z axis, or `None` at gimbal lock.
    pub fn yaw(&self) -> Option<f64> {
        self.rotation
            .euler_angles(RotationOrder::Xyz)
            .map(|[_, _, yaw]| yaw)
    }
}

/// Chain two optional transforms, `t1` (A→B) then `t2` (B→C), into A→C.
///
/// Returns `None` when either side is missing, which lets lookup results be
/// passed straight through.
pub fn combine(t1: Option<&FrameTransform>, t2: Option<&FrameTransform>) -> Option<FrameTransform> {
    Some(t1?.then(t2?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostf_types::WireVector3;
    use std::f64::consts::FRAC_PI_2;

    fn tf(parent: &str, child: &str, t: Vec3, r: Rotation, sec: i32) -> FrameTransform {
        FrameTransform::new(parent, child, t, r, Stamp::new(sec, 0))
    }

    #[test]
    fn deserialize_canonicalizes_and_checks_rotation() {
        let json = r#"{
            "parent_frame": "map", "child_frame": "/odom",
            "translation": {"x": 1.0, "y": 0.0, "z": 0.0},
            "rotation": {"q0": 2.0, "q1": 0.0, "q2": 0.0, "q3": 0.0},
            "stamp": {"secs": 4, "nsecs": 0}
        }"#;
        let t: FrameTransform = serde_json::from_str(json).unwrap();
        assert_eq!(t.parent_frame(), "/map");
        assert_eq!(t.child_frame(), "/odom");
        assert_eq!(t.rotation(), Rotation::IDENTITY);

        let zero = json.replace(r#""q0": 2.0"#, r#""q0": 0.0"#);
        assert!(serde_json::from_str::<FrameTransform>(&zero).is_err());
    }

    fn assert_close(a: &FrameTransform, b: &FrameTransform) {
        assert_eq!(a.parent_frame(), b.parent_frame());
        assert_eq!(a.child_frame(), b.child_frame());
        assert!(a.translation().approx_eq(b.translation(), 1e-9), "{a:?} vs {b:?}");
        assert!(Rotation::distance(&a.rotation(), &b.rotation()) < 1e-9);
    }

    #[test]
    fn names_are_canonicalized() {
        let t = tf("map", "/odom", Vec3::ZERO, Rotation::IDENTITY, 0);
        assert_eq!(t.parent_frame(), "/map");
        assert_eq!(t.child_frame(), "/odom");
    }

    #[test]
    fn combine_with_missing_side_is_none() {
        let t = tf("a", "b", Vec3::ZERO, Rotation::IDENTITY, 0);
        assert!(combine(Some(&t), None).is_none());
        assert!(combine(None, Some(&t)).is_none());
        assert!(combine(None, None).is_none());
    }

    #[test]
    fn combine_rotates_child_translation() {
        // b is a quarter turn about Z from a; c is 1 m along b's X axis.
        let ab = tf(
            "a",
            "b",
            Vec3::new(1.0, 0.0, 0.0),
            Rotation::from_axis_angle(Vec3::PLUS_K, FRAC_PI_2),
            5,
        );
        let bc = tf("b", "c", Vec3::new(1.0, 0.0, 0.0), Rotation::IDENTITY, 7);
        let ac = combine(Some(&ab), Some(&bc)).unwrap();

        assert_eq!(ac.parent_frame(), "/a");
        assert_eq!(ac.child_frame(), "/c");
        assert!(ac.translation().approx_eq(Vec3::new(1.0, 1.0, 0.0), 1e-12));
        assert_eq!(ac.stamp(), Stamp::new(5, 0));
    }

    #[test]
    fn combine_with_identity_is_neutral() {
        let t = tf(
            "b",
            "c",
            Vec3::new(0.3, -1.2, 2.0),
            Rotation::from_euler(RotationOrder::Zyx, 0.4, 0.1, -0.7),
            3,
        );
        let id = tf("b", "b", Vec3::ZERO, Rotation::IDENTITY, 3);
        let out = combine(Some(&id), Some(&t)).unwrap();
        assert_close(&out, &t);
        assert_eq!(out.stamp(), t.stamp());
    }

    #[test]
    fn combine_is_associative() {
        let ab = tf("a", "b", Vec3::new(1.0, 2.0, 3.0), Rotation::from_axis_angle(Vec3::PLUS_I, 0.3), 1);
        let bc = tf("b", "c", Vec3::new(-0.5, 0.0, 1.0), Rotation::from_axis_angle(Vec3::PLUS_J, -1.1), 2);
        let cd = tf("c", "d", Vec3::new(0.0, 4.0, 0.0), Rotation::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 2.0), 3);

        let left = combine(combine(Some(&ab), Some(&bc)).as_ref(), Some(&cd)).unwrap();
        let right = combine(Some(&ab), combine(Some(&bc), Some(&cd)).as_ref()).unwrap();
        assert_close(&left, &right);
        assert_eq!(left.stamp(), right.stamp());
    }

    #[test]
    fn combined_transform_maps_points_like_the_chain() {
        let ab = tf("a", "b", Vec3::new(1.0, 2.0, 3.0), Rotation::from_axis_angle(Vec3::PLUS_K, 0.9), 1);
        let bc = tf("b", "c", Vec3::new(0.5, 0.0, -1.0), Rotation::from_axis_angle(Vec3::PLUS_I, 0.2), 1);
        let ac = ab.then(&bc);
        let p = Vec3::new(0.2, -0.4, 1.5);
        let expected = ab.transform_point(bc.transform_point(p));
        assert!(ac.transform_point(p).approx_eq(expected, 1e-12));
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = tf(
            "map",
            "base_link",
            Vec3::new(3.0, -1.0, 0.5),
            Rotation::from_euler(RotationOrder::Xyz, 0.1, -0.2, 1.4),
            4,
        );
        let inv = t.inverse();
        assert_eq!(inv.parent_frame(), "/base_link");
        assert_eq!(inv.child_frame(), "/map");

        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(inv.transform_point(t.transform_point(p)).approx_eq(p, 1e-12));

        let round = t.then(&inv);
        assert!(round.translation().approx_eq(Vec3::ZERO, 1e-12));
        assert!(round.rotation().angle() < 1e-7);
    }

    #[test]
    fn yaw_of_planar_pose() {
        let t = tf("odom", "base_link", Vec3::ZERO, Rotation::from_axis_angle(Vec3::PLUS_K, 0.75), 0);
        assert!((t.yaw().unwrap() - 0.75).abs() < 1e-12);

        let locked = tf("odom", "x", Vec3::ZERO, Rotation::from_axis_angle(Vec3::PLUS_J, FRAC_PI_2), 0);
        assert!(locked.yaw().is_none());
    }

    #[test]
    fn record_roundtrip_preserves_ros_convention() {
        let theta: f64 = 0.6;
        let record = TransformRecord::new(
            "odom",
            "base_link",
            WireVector3 { x: 1.0, y: 2.0, z: 0.0 },
            WireQuaternion {
                x: 0.0,
                y: 0.0,
                z: (theta / 2.0).sin(),
                w: (theta / 2.0).cos(),
            },
            Stamp::new(12, 5),
        );
        let t = FrameTransform::from_record(&record);
        assert_eq!(t.parent_frame(), "/odom");
        assert!((t.yaw().unwrap() - theta).abs() < 1e-12);

        let back = t.to_record();
        assert_eq!(back.header.frame_id, "/odom");
        assert_eq!(back.header.stamp, Stamp::new(12, 5));
        assert!((back.transform.rotation.z - record.transform.rotation.z).abs() < 1e-12);
        assert!((back.transform.rotation.w - record.transform.rotation.w).abs() < 1e-12);
    }

    #[test]
    fn zero_wire_quaternion_becomes_identity() {
        let record = TransformRecord::new(
            "a",
            "b",
            WireVector3::default(),
            WireQuaternion { x: 0.0, y: 0.0, z: 0.0, w: 0.0 },
            Stamp::ZERO,
        );
        assert_eq!(FrameTransform::from_record(&record).rotation(), Rotation::IDENTITY);
    }
}
