//! Propagated local frame for the bend/twist angle parameterization.
//!
//! Both forward kinematics and angle extraction walk the chain carrying a
//! `(view, up)` pair; keeping the frame bookkeeping (and in particular the
//! quaternion composition order) in one type is what guarantees the two
//! stay exact inverses of each other.

use log::trace;
use nalgebra::{Unit, UnitQuaternion, UnitVector3, Vector3};

/// Threshold below which a vector is treated as having no usable direction.
pub const DEGENERACY_EPS: f32 = 1e-6;

/// Local frame of a linkage: unit forward (`view`) and unit `up` vectors.
///
/// The base frame is fixed (`view = +X`, `up = +Y`). Every subsequent frame
/// is derived by rotating both vectors with the same bend/twist quaternion,
/// so the pair stays orthonormal as it propagates down the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub view: UnitVector3<f32>,
    pub up: UnitVector3<f32>,
}

impl Frame {
    /// The virtual base frame every chain is anchored to.
    pub fn base() -> Self {
        Self {
            view: Vector3::x_axis(),
            up: Vector3::y_axis(),
        }
    }

    /// Right axis of the frame, `view × up`, normalized.
    ///
    /// If `view` and `up` are (near-)parallel the cross product carries no
    /// direction; an arbitrary but deterministic perpendicular of `view` is
    /// substituted. Frames propagated from [`Frame::base`] never reach that
    /// state, since both vectors rotate together and start orthogonal.
    pub fn right(&self) -> UnitVector3<f32> {
        let cross = self.view.into_inner().cross(&self.up.into_inner());
        if cross.norm() < DEGENERACY_EPS {
            trace!("view and up are parallel; substituting an arbitrary right axis");
            any_perpendicular(&self.view)
        } else {
            Unit::new_normalize(cross)
        }
    }

    /// Bend/twist rotation of a child linkage relative to this frame.
    ///
    /// `pitch` bends away from `view` about the `right` axis, toward `up`;
    /// `rotate` then twists the bend plane about `view` itself, measured
    /// from `up` (positive toward `right`). The pitch rotation reaches a
    /// vector first: `q = q_view(rotate) · q_right(pitch)`.
    pub fn bend_twist(&self, pitch: f32, rotate: f32) -> UnitQuaternion<f32> {
        let q_view = UnitQuaternion::from_axis_angle(&self.view, rotate);
        let q_right = UnitQuaternion::from_axis_angle(&self.right(), pitch);
        q_view * q_right
    }

    /// Rotate the whole frame by `q`, renormalizing both axes.
    pub fn apply(&mut self, q: &UnitQuaternion<f32>) {
        self.view = Unit::new_normalize(q * self.view.into_inner());
        self.up = Unit::new_normalize(q * self.up.into_inner());
    }

    /// Replace the forward axis, keeping `up` as-is.
    ///
    /// Angle extraction measures `view` from joint positions instead of
    /// rotating the previous one; the two agree whenever the extracted
    /// angles reproduce the positions exactly.
    pub fn set_view(&mut self, view: UnitVector3<f32>) {
        self.view = view;
    }
}

/// An arbitrary unit vector perpendicular to `v`, chosen deterministically:
/// the cross product with whichever world axis is least aligned with `v`.
pub fn any_perpendicular(v: &UnitVector3<f32>) -> UnitVector3<f32> {
    let axis = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.into_inner().cross(&axis))
}
