//! Shortest-arc rotations with named degenerate cases.

use log::trace;
use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::frame::any_perpendicular;

/// The rotation that aims one direction onto another.
///
/// CCD needs, at every pivot, the minimal rotation mapping the current
/// end-effector direction onto the target direction. The two degenerate
/// geometries are explicit variants instead of inline guards so that each
/// is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aim {
    /// No usable rotation: one of the inputs is too short to define a
    /// direction (e.g. the target coincides with the pivot).
    Identity,
    /// A proper shortest-arc rotation.
    Minimal(UnitQuaternion<f32>),
    /// Antiparallel inputs, where the shortest arc is ambiguous: a
    /// half-turn about a deterministically chosen perpendicular axis.
    Flip(UnitQuaternion<f32>),
}

impl Aim {
    /// Classify and build the minimal rotation taking `from` onto `to`.
    ///
    /// Inputs shorter than `eps` yield [`Aim::Identity`]; the vectors are
    /// normalized internally otherwise.
    pub fn between(from: &Vector3<f32>, to: &Vector3<f32>, eps: f32) -> Self {
        if from.norm() < eps || to.norm() < eps {
            trace!("aim input shorter than {eps}; no rotation");
            return Self::Identity;
        }
        match UnitQuaternion::rotation_between(from, to) {
            Some(q) => Self::Minimal(q),
            // no shortest arc exists for an antiparallel pair
            None => {
                trace!("antiparallel aim; half-turn about an arbitrary perpendicular");
                let axis = any_perpendicular(&Unit::new_normalize(*from));
                Self::Flip(UnitQuaternion::from_axis_angle(&axis, std::f32::consts::PI))
            }
        }
    }

    /// The rotation to apply, identity included.
    pub fn quaternion(&self) -> UnitQuaternion<f32> {
        match self {
            Self::Identity => UnitQuaternion::identity(),
            Self::Minimal(q) | Self::Flip(q) => *q,
        }
    }
}
