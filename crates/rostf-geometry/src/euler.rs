//! Cardan and Euler angle orders, and extraction of angle triples from a
//! [`Rotation`].
//!
//! A [`RotationOrder`] names the three axes of successive elementary
//! rotations.  Cardan orders use three distinct axes (`XYZ`, `ZYX`, …);
//! proper Euler orders reuse the first axis as the third (`ZXZ`, `XYX`, …).
//!
//! Extraction never fails with an error.  Near a representation
//! singularity (gimbal lock for Cardan orders, a middle angle of 0 or π for
//! Euler orders) the triple is not unique and [`extract`] returns `None`.
//!
//! | Family | Middle angle interval |
//! |--------|-----------------------|
//! | Cardan | `[-π/2, π/2]`         |
//! | Euler  | `[0, π]`              |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rotation::Rotation;
use crate::vector::Vec3;

/// A component beyond this magnitude marks a singular configuration.
const SINGULARITY_LIMIT: f64 = 1.0 - 1e-10;

/// The twelve supported rotation orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationOrder {
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
    Xyx,
    Xzx,
    Yxy,
    Yzy,
    Zxz,
    Zyz,
}

/// Returned when parsing an unknown order name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown rotation order '{0}'")]
pub struct UnknownRotationOrder(pub String);

impl RotationOrder {
    /// Every supported order, Cardan orders first.
    pub const ALL: [RotationOrder; 12] = [
        RotationOrder::Xyz,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Zyx,
        RotationOrder::Xyx,
        RotationOrder::Xzx,
        RotationOrder::Yxy,
        RotationOrder::Yzy,
        RotationOrder::Zxz,
        RotationOrder::Zyz,
    ];

    /// Three-letter name, e.g. `"ZYX"`.
    pub fn name(self) -> &'static str {
        match self {
            RotationOrder::Xyz => "XYZ",
            RotationOrder::Xzy => "XZY",
            RotationOrder::Yxz => "YXZ",
            RotationOrder::Yzx => "YZX",
            RotationOrder::Zxy => "ZXY",
            RotationOrder::Zyx => "ZYX",
            RotationOrder::Xyx => "XYX",
            RotationOrder::Xzx => "XZX",
            RotationOrder::Yxy => "YXY",
            RotationOrder::Yzy => "YZY",
            RotationOrder::Zxz => "ZXZ",
            RotationOrder::Zyz => "ZYZ",
        }
    }

    /// Axes of the first, second and third elementary rotations.
    pub fn axes(self) -> [Vec3; 3] {
        let axis = |c: u8| match c {
            b'X' => Vec3::PLUS_I,
            b'Y' => Vec3::PLUS_J,
            _ => Vec3::PLUS_K,
        };
        let name = self.name().as_bytes();
        [axis(name[0]), axis(name[1]), axis(name[2])]
    }

    /// True for proper Euler orders (first axis repeated as the third).
    pub fn is_euler(self) -> bool {
        let name = self.name().as_bytes();
        name[0] == name[2]
    }

    /// True for Cardan (Tait–Bryan) orders.
    pub fn is_cardan(self) -> bool {
        !self.is_euler()
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RotationOrder {
    type Err = UnknownRotationOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        RotationOrder::ALL
            .into_iter()
            .find(|order| order.name() == upper)
            .ok_or_else(|| UnknownRotationOrder(s.to_string()))
    }
}

fn singular(component: f64) -> bool {
    !(-SINGULARITY_LIMIT..=SINGULARITY_LIMIT).contains(&component)
}

/// Recover `(a1, a2, a3)` such that `Rotation::from_euler(order, a1, a2, a3)`
/// reproduces `r`, or `None` at a singularity.
///
/// Each arm rotates one canonical vector by `r` and another by `r⁻¹`; the
/// comments give their coordinates as functions of the angles.
pub fn extract(r: &Rotation, order: RotationOrder) -> Option<[f64; 3]> {
    let (i, j, k) = (Vec3::PLUS_I, Vec3::PLUS_J, Vec3::PLUS_K);

    match order {
        RotationOrder::Xyz => {
            // r(k)  = ( sin θ, -cos θ sin φ, cos θ cos φ)
            // r⁻¹(i) = ( cos ψ cos θ, -sin ψ cos θ, sin θ)
            let v1 = r.apply_to(k);
            let v2 = r.apply_inverse_to(i);
            if singular(v2.z) {
                return None;
            }
            Some([(-v1.y).atan2(v1.z), v2.z.asin(), (-v2.y).atan2(v2.x)])
        }
        RotationOrder::Xzy => {
            // r(j)  = (-sin ψ, cos ψ cos φ, cos ψ sin φ)
            // r⁻¹(i) = ( cos θ cos ψ, -sin ψ, sin θ cos ψ)
            let v1 = r.apply_to(j);
            let v2 = r.apply_inverse_to(i);
            if singular(v2.y) {
                return None;
            }
            Some([v1.z.atan2(v1.y), -v2.y.asin(), v2.z.atan2(v2.x)])
        }
        RotationOrder::Yxz => {
            // r(k)  = ( cos φ sin θ, -sin φ, cos φ cos θ)
            // r⁻¹(j) = ( sin ψ cos φ, cos ψ cos φ, -sin φ)
            let v1 = r.apply_to(k);
            let v2 = r.apply_inverse_to(j);
            if singular(v2.z) {
                return None;
            }
            Some([v1.x.atan2(v1.z), -v2.z.asin(), v2.x.atan2(v2.y)])
        }
        RotationOrder::Yzx => {
            // r(i)  = ( cos ψ cos θ, sin ψ, -cos ψ sin θ)
            // r⁻¹(j) = ( sin ψ, cos φ cos ψ, -sin φ cos ψ)
            let v1 = r.apply_to(i);
            let v2 = r.apply_inverse_to(j);
            if singular(v2.x) {
                return None;
            }
            Some([(-v1.z).atan2(v1.x), v2.x.asin(), (-v2.z).atan2(v2.y)])
        }
        RotationOrder::Zxy => {
            // r(j)  = (-cos φ sin ψ, cos φ cos ψ, sin φ)
            // r⁻¹(k) = (-sin θ cos φ, sin φ, cos θ cos φ)
            let v1 = r.apply_to(j);
            let v2 = r.apply_inverse_to(k);
            if singular(v2.y) {
                return None;
            }
            Some([(-v1.x).atan2(v1.y), v2.y.asin(), (-v2.x).atan2(v2.z)])
        }
        RotationOrder::Zyx => {
            // r(i)  = ( cos θ cos ψ, cos θ sin ψ, -sin θ)
            // r⁻¹(k) = (-sin θ, sin φ cos θ, cos φ cos θ)
            let v1 = r.apply_to(i);
            let v2 = r.apply_inverse_to(k);
            if singular(v2.x) {
                return None;
            }
            Some([v1.y.atan2(v1.x), -v2.x.asin(), v2.y.atan2(v2.z)])
        }
        RotationOrder::Xyx => {
            // r(i)  = ( cos θ, sin φ₁ sin θ, -cos φ₁ sin θ)
            // r⁻¹(i) = ( cos θ, sin θ sin φ₂, sin θ cos φ₂)
            let v1 = r.apply_to(i);
            let v2 = r.apply_inverse_to(i);
            if singular(v2.x) {
                return None;
            }
            Some([v1.y.atan2(-v1.z), v2.x.acos(), v2.y.atan2(v2.z)])
        }
        RotationOrder::Xzx => {
            // r(i)  = ( cos ψ, cos φ₁ sin ψ, sin φ₁ sin ψ)
            // r⁻¹(i) = ( cos ψ, -sin ψ cos φ₂, sin ψ sin φ₂)
            let v1 = r.apply_to(i);
            let v2 = r.apply_inverse_to(i);
            if singular(v2.x) {
                return None;
            }
            Some([v1.z.atan2(v1.y), v2.x.acos(), v2.z.atan2(-v2.y)])
        }
        RotationOrder::Yxy => {
            // r(j)  = ( sin θ₁ sin φ, cos φ, cos θ₁ sin φ)
            // r⁻¹(j) = ( sin φ sin θ₂, cos φ, -sin φ cos θ₂)
            let v1 = r.apply_to(j);
            let v2 = r.apply_inverse_to(j);
            if singular(v2.y) {
                return None;
            }
            Some([v1.x.atan2(v1.z), v2.y.acos(), v2.x.atan2(-v2.z)])
        }
        RotationOrder::Yzy => {
            // r(j)  = (-cos θ₁ sin ψ, cos ψ, sin θ₁ sin ψ)
            // r⁻¹(j) = ( sin ψ cos θ₂, cos ψ, sin ψ sin θ₂)
            let v1 = r.apply_to(j);
            let v2 = r.apply_inverse_to(j);
            if singular(v2.y) {
                return None;
            }
            Some([v1.z.atan2(-v1.x), v2.y.acos(), v2.z.atan2(v2.x)])
        }
        RotationOrder::Zxz => {
            // r(k)  = ( sin ψ₁ sin φ, -cos ψ₁ sin φ, cos φ)
            // r⁻¹(k) = ( sin φ sin ψ₂, sin φ cos ψ₂, cos φ)
            let v1 = r.apply_to(k);
            let v2 = r.apply_inverse_to(k);
            if singular(v2.z) {
                return None;
            }
            Some([v1.x.atan2(-v1.y), v2.z.acos(), v2.x.atan2(v2.y)])
        }
        RotationOrder::Zyz => {
            // r(k)  = ( cos ψ₁ sin θ, sin ψ₁ sin θ, cos θ)
            // r⁻¹(k) = (-sin θ cos ψ₂, sin θ sin ψ₂, cos θ)
            let v1 = r.apply_to(k);
            let v2 = r.apply_inverse_to(k);
            if singular(v2.z) {
                return None;
            }
            Some([v1.y.atan2(v1.x), v2.z.acos(), v2.y.atan2(-v2.x)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_angles(got: [f64; 3], expected: [f64; 3], order: RotationOrder) {
        for (g, e) in got.iter().zip(expected) {
            assert!(
                (g - e).abs() < 1e-9,
                "{order}: got {got:?}, expected {expected:?}"
            );
        }
    }

    #[test]
    fn roundtrip_every_order() {
        let triples: [[f64; 3]; 4] = [
            [0.1, 0.2, 0.3],
            [-0.5, 0.7, 1.2],
            [2.5, -1.0, -2.9],
            [-3.0, 1.5, 0.01],
        ];
        for order in RotationOrder::ALL {
            for [a1, a2, a3] in triples {
                // Move the middle angle into the order's open interval.
                let a2 = if order.is_euler() { a2.abs() + 0.3 } else { a2 };
                let r = Rotation::from_euler(order, a1, a2, a3);
                let got = r.euler_angles(order).expect("not singular");
                assert_angles(got, [a1, a2, a3], order);
            }
        }
    }

    #[test]
    fn cardan_gimbal_lock_yields_none() {
        let r = Rotation::from_euler(RotationOrder::Xyz, 0.3, FRAC_PI_2, 0.2);
        assert!(r.euler_angles(RotationOrder::Xyz).is_none());

        let r = Rotation::from_euler(RotationOrder::Zyx, 0.3, -FRAC_PI_2, 0.2);
        assert!(r.euler_angles(RotationOrder::Zyx).is_none());
    }

    #[test]
    fn euler_middle_angle_at_zero_or_pi_yields_none() {
        let r = Rotation::from_euler(RotationOrder::Zxz, 0.3, 0.0, 0.2);
        assert!(r.euler_angles(RotationOrder::Zxz).is_none());

        let r = Rotation::from_euler(RotationOrder::Zxz, 0.3, PI, 0.2);
        assert!(r.euler_angles(RotationOrder::Zxz).is_none());

        // The identity is singular for every proper Euler order.
        for order in RotationOrder::ALL.into_iter().filter(|o| o.is_euler()) {
            assert!(Rotation::IDENTITY.euler_angles(order).is_none(), "{order}");
        }
    }

    #[test]
    fn identity_has_zero_cardan_angles() {
        for order in RotationOrder::ALL.into_iter().filter(|o| o.is_cardan()) {
            let got = Rotation::IDENTITY.euler_angles(order).unwrap();
            assert_angles(got, [0.0, 0.0, 0.0], order);
        }
    }

    #[test]
    fn single_axis_rotation_shows_up_in_matching_slot() {
        let r = Rotation::from_axis_angle(Vec3::PLUS_K, 0.8);
        let got = r.euler_angles(RotationOrder::Xyz).unwrap();
        assert_angles(got, [0.0, 0.0, 0.8], RotationOrder::Xyz);
    }

    #[test]
    fn order_names_parse_back() {
        for order in RotationOrder::ALL {
            assert_eq!(order.name().parse::<RotationOrder>().unwrap(), order);
            assert_eq!(order.to_string(), order.name());
        }
        assert_eq!("zyx".parse::<RotationOrder>().unwrap(), RotationOrder::Zyx);
        assert!("XXY".parse::<RotationOrder>().is_err());
    }

    #[test]
    fn order_families() {
        let cardan = RotationOrder::ALL.iter().filter(|o| o.is_cardan()).count();
        assert_eq!(cardan, 6);
        assert!(RotationOrder::Zyz.is_euler());
        assert_eq!(
            RotationOrder::Yzx.axes(),
            [Vec3::PLUS_J, Vec3::PLUS_K, Vec3::PLUS_I]
        );
    }

    #[test]
    fn order_serializes_as_name() {
        let json = serde_json::to_string(&RotationOrder::Zyx).unwrap();
        assert_eq!(json, "\"ZYX\"");
    }
}
