//! Serial chain model and forward kinematics.

use nalgebra::Point3;

use linkarm_core::ChainError;

use crate::frame::Frame;

/// An open serial chain of rigid linkages.
///
/// `lengths[i]`, `pitch[i]` and `rotate[i]` all describe linkage `i`, which
/// connects joint `i` to joint `i + 1`; a chain of `n` linkages has `n + 1`
/// joints, joint 0 being the fixed base at the origin. Lengths are immutable
/// after construction. The angle arrays are the canonical mutable state;
/// Cartesian joint positions are always recomputed from them.
///
/// Angle domains are `pitch ∈ [0, π]` and `rotate ∈ (-π, π]`. The setters
/// keep values in domain; [`LinkChain::forward_kinematics`] itself performs
/// no validation and is total over those domains.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkChain {
    lengths: Vec<f32>,
    pitch: Vec<f32>,
    rotate: Vec<f32>,
}

impl LinkChain {
    /// Create a chain with the given linkage lengths, all angles zero
    /// (stretched straight along the base view axis, `+X`).
    ///
    /// # Errors
    ///
    /// [`ChainError::EmptyChain`] for zero linkages,
    /// [`ChainError::NonPositiveLength`] for any length that is not a
    /// positive finite number.
    pub fn new(lengths: Vec<f32>) -> Result<Self, ChainError> {
        if lengths.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        for (index, &value) in lengths.iter().enumerate() {
            if !(value.is_finite() && value > 0.0) {
                return Err(ChainError::NonPositiveLength { index, value });
            }
        }
        let n = lengths.len();
        Ok(Self {
            lengths,
            pitch: vec![0.0; n],
            rotate: vec![0.0; n],
        })
    }

    /// Create a chain with explicit initial angles.
    ///
    /// # Errors
    ///
    /// Everything [`LinkChain::new`] reports, plus
    /// [`ChainError::AngleCountMismatch`] when an angle array does not have
    /// one entry per linkage.
    pub fn with_angles(
        lengths: Vec<f32>,
        pitch: Vec<f32>,
        rotate: Vec<f32>,
    ) -> Result<Self, ChainError> {
        let mut chain = Self::new(lengths)?;
        chain.set_angles(&pitch, &rotate)?;
        Ok(chain)
    }

    /// Number of linkages.
    pub fn links(&self) -> usize {
        self.lengths.len()
    }

    /// Fixed linkage lengths.
    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    /// Bend angles, one per linkage.
    pub fn pitch(&self) -> &[f32] {
        &self.pitch
    }

    /// Twist angles, one per linkage.
    pub fn rotate(&self) -> &[f32] {
        &self.rotate
    }

    /// Maximum distance from the base the end effector can reach.
    pub fn reach(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// Set the bend angle of linkage `i`, clamped to `[0, π]`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set_bend(&mut self, i: usize, pitch: f32) {
        self.pitch[i] = clamp_pitch(pitch);
    }

    /// Set the twist angle of linkage `i`, wrapped into `(-π, π]`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set_twist(&mut self, i: usize, rotate: f32) {
        self.rotate[i] = wrap_twist(rotate);
    }

    /// Replace both angle arrays at once, e.g. to accept a solver result.
    /// Values are clamped/wrapped into their domains.
    ///
    /// # Errors
    ///
    /// [`ChainError::AngleCountMismatch`] when an array does not have one
    /// entry per linkage.
    pub fn set_angles(&mut self, pitch: &[f32], rotate: &[f32]) -> Result<(), ChainError> {
        for angles in [pitch, rotate] {
            if angles.len() != self.links() {
                return Err(ChainError::AngleCountMismatch {
                    expected: self.links(),
                    got: angles.len(),
                });
            }
        }
        for i in 0..self.links() {
            self.pitch[i] = clamp_pitch(pitch[i]);
            self.rotate[i] = wrap_twist(rotate[i]);
        }
        Ok(())
    }

    /// Compute the Cartesian joint positions from the current angles.
    ///
    /// Pure: walks the base frame down the chain, bending and twisting it
    /// per linkage, and steps each linkage length along the resulting view
    /// axis. `positions[0]` is the base, `positions[links()]` the end
    /// effector, and `|positions[i + 1] - positions[i]| == lengths[i]` up
    /// to float rounding.
    pub fn forward_kinematics(&self) -> Vec<Point3<f32>> {
        let mut positions = Vec::with_capacity(self.links() + 1);
        positions.push(Point3::origin());

        let mut frame = Frame::base();
        for i in 0..self.links() {
            let q = frame.bend_twist(self.pitch[i], self.rotate[i]);
            frame.apply(&q);
            let next = positions[i] + self.lengths[i] * frame.view.into_inner();
            positions.push(next);
        }
        positions
    }

    /// Current end-effector position.
    pub fn end_effector(&self) -> Point3<f32> {
        self.forward_kinematics()[self.links()]
    }
}

fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(0.0, std::f32::consts::PI)
}

fn wrap_twist(rotate: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let pi = std::f32::consts::PI;
    let wrapped = (rotate + pi).rem_euclid(tau) - pi;
    // rem_euclid lands in [-π, π); the domain closes at +π instead
    if wrapped == -pi {
        pi
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use linkarm_core::ChainError;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    #[test]
    fn rejects_empty_chain() {
        assert_eq!(LinkChain::new(vec![]), Err(ChainError::EmptyChain));
    }

    #[test]
    fn rejects_non_positive_length() {
        let err = LinkChain::new(vec![1.0, 0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            ChainError::NonPositiveLength {
                index: 1,
                value: 0.0
            }
        );
        assert!(LinkChain::new(vec![f32::NAN]).is_err());
    }

    #[test]
    fn rejects_mismatched_angle_arrays() {
        let err = LinkChain::with_angles(vec![1.0, 1.0], vec![0.0], vec![0.0, 0.0]).unwrap_err();
        assert_eq!(err, ChainError::AngleCountMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn zero_angles_stretch_along_x() {
        // Pins the index convention: positions[i] = sum of lengths[..i] on +X.
        let chain = LinkChain::new(vec![1.0, 2.0, 0.5]).unwrap();
        let positions = chain.forward_kinematics();
        assert_eq!(positions.len(), 4);
        let x = [0.0, 1.0, 3.0, 3.5];
        for (p, x) in positions.iter().zip(x) {
            assert_relative_eq!(*p, Point3::new(x, 0.0, 0.0), epsilon = 1e-6);
        }
    }

    #[test]
    fn first_linkage_owns_index_zero() {
        // pitch[0] bends the first linkage straight toward base up (+Y)
        let mut chain = LinkChain::new(vec![1.0, 1.0]).unwrap();
        chain.set_bend(0, FRAC_PI_2);
        let positions = chain.forward_kinematics();
        assert_relative_eq!(positions[1], Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        // second linkage had no bend of its own: it continues straight
        assert_relative_eq!(positions[2], Point3::new(0.0, 2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn twist_turns_bend_plane() {
        let mut chain = LinkChain::new(vec![1.0]).unwrap();
        chain.set_bend(0, FRAC_PI_2);
        chain.set_twist(0, FRAC_PI_2);
        assert_relative_eq!(chain.end_effector(), Point3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        chain.set_twist(0, -FRAC_PI_2);
        assert_relative_eq!(chain.end_effector(), Point3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn lengths_preserved_for_arbitrary_angles() {
        let chain = LinkChain::with_angles(
            vec![1.0, 0.8, 1.3, 0.4],
            vec![0.3, FRAC_PI_2, 2.4, FRAC_PI_4],
            vec![0.5, -1.8, PI, -0.2],
        )
        .unwrap();
        let positions = chain.forward_kinematics();
        for i in 0..chain.links() {
            let d = (positions[i + 1] - positions[i]).norm();
            assert_relative_eq!(d, chain.lengths()[i], epsilon = 1e-5);
        }
    }

    #[test]
    fn setters_keep_angles_in_domain() {
        let mut chain = LinkChain::new(vec![1.0]).unwrap();

        chain.set_bend(0, -1.0);
        assert_eq!(chain.pitch()[0], 0.0);
        chain.set_bend(0, 4.0);
        assert_eq!(chain.pitch()[0], PI);

        chain.set_twist(0, PI + 0.5);
        assert_relative_eq!(chain.rotate()[0], -PI + 0.5, epsilon = 1e-5);
        chain.set_twist(0, -PI);
        assert_relative_eq!(chain.rotate()[0], PI, epsilon = 1e-6);
    }

    #[test]
    fn reach_is_total_length() {
        let chain = LinkChain::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_relative_eq!(chain.reach(), 6.0);
    }
}
