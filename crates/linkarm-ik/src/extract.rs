//! Re-derivation of bend/twist angles from Cartesian joint positions.

use nalgebra::{Point3, Unit};

use crate::frame::{Frame, DEGENERACY_EPS};

/// Recover `(pitch, rotate)` arrays from joint positions.
///
/// The designed inverse of the forward-kinematics frame propagation: each
/// linkage's direction is taken from `positions`, while its magnitude comes
/// from the configured `lengths` (any length drift in the input positions is
/// discarded). Feeding the output angles back through forward kinematics
/// reproduces the input directions whenever the bend/twist decomposition is
/// non-degenerate; when a linkage extends straight ahead (`pitch = 0`) its
/// twist is unobservable and comes back as `0`.
///
/// # Panics
///
/// Panics if `positions.len() != lengths.len() + 1`.
pub fn extract_angles(positions: &[Point3<f32>], lengths: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let mut pitch = vec![0.0; lengths.len()];
    let mut rotate = vec![0.0; lengths.len()];
    extract_angles_into(positions, lengths, &mut pitch, &mut rotate);
    (pitch, rotate)
}

/// In-place variant of [`extract_angles`], used by the CCD solver to refresh
/// caller-owned angle buffers after a geometric sweep.
///
/// # Panics
///
/// Panics if `positions.len() != lengths.len() + 1` or either output slice
/// does not have one entry per linkage.
pub fn extract_angles_into(
    positions: &[Point3<f32>],
    lengths: &[f32],
    pitch: &mut [f32],
    rotate: &mut [f32],
) {
    assert_eq!(
        positions.len(),
        lengths.len() + 1,
        "positions.len() must be lengths.len() + 1"
    );
    assert_eq!(pitch.len(), lengths.len());
    assert_eq!(rotate.len(), lengths.len());

    let mut frame = Frame::base();
    for i in 0..lengths.len() {
        let dir = Unit::new_normalize(positions[i + 1] - positions[i]);
        pitch[i] = frame.view.angle(&dir.into_inner());

        // component of the linkage direction lateral to the parent view axis
        let lateral = dir.into_inner() - dir.dot(&frame.view.into_inner()) * frame.view.into_inner();
        if lateral.norm() < DEGENERACY_EPS {
            // pure extension or reversal: the twist is unobservable
            rotate[i] = 0.0;
        } else {
            let twist = frame.up.angle(&lateral);
            rotate[i] = if frame.right().dot(&lateral) < 0.0 {
                -twist
            } else {
                twist
            };
        }

        // mirror the forward recurrence's frame bookkeeping exactly
        let q = frame.bend_twist(pitch[i], rotate[i]);
        frame.apply(&q);
        frame.set_view(dir);
    }
}
