//! Cyclic Coordinate Descent (CCD) solver for chain inverse kinematics.
//!
//! Perturbs joint positions directly — one backward sweep per pass, each
//! pivot applying the minimal rotation that closes the gap to the target —
//! then re-derives the bend/twist angles so both chain representations stay
//! consistent. CCD is a greedy local heuristic with no convergence
//! guarantee: non-convergence is a normal outcome reported through the
//! returned residual, not an error.

use log::debug;
use nalgebra::{Point3, Unit, UnitQuaternion};

use crate::aim::Aim;
use crate::chain::LinkChain;
use crate::extract::extract_angles_into;
use crate::frame::DEGENERACY_EPS;

/// Configuration for the CCD solver.
#[derive(Debug, Clone)]
pub struct CcdConfig {
    /// Maximum passes over the chain (default: 10).
    pub max_iterations: u32,
    /// End-effector distance below which the solve is accepted; also guards
    /// near-zero directions inside a pass (default: 1e-3).
    pub tolerance: f32,
}

impl Default for CcdConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-3,
        }
    }
}

/// Result of a CCD solve: a new chain state plus diagnostics.
///
/// The solver never mutates the chain it was given; apply the returned
/// angles with [`LinkChain::set_angles`] to accept the solution.
#[derive(Debug, Clone)]
pub struct IkResult {
    /// Solved bend angles, one per linkage.
    pub pitch: Vec<f32>,
    /// Solved twist angles, one per linkage.
    pub rotate: Vec<f32>,
    /// Joint positions consistent with the solved angles.
    pub positions: Vec<Point3<f32>>,
    /// Final end-effector distance to the target.
    pub residual: f32,
    /// Passes actually run.
    pub iterations: u32,
    /// Whether `residual` dropped below the configured tolerance.
    pub converged: bool,
}

/// Cyclic Coordinate Descent solver.
pub struct CcdSolver {
    config: CcdConfig,
}

impl CcdSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: CcdConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CcdConfig::default())
    }

    /// Run the retry loop: up to `max_iterations` passes of [`solve_step`]
    /// over a snapshot of the chain's state, stopping early once the
    /// residual drops below tolerance.
    ///
    /// An unreachable target (further from the base than
    /// [`LinkChain::reach`]) plateaus at `dist(target, base) - reach`; the
    /// loop then terminates by budget exhaustion with `converged: false`.
    pub fn solve(&self, chain: &LinkChain, target: &Point3<f32>) -> IkResult {
        let mut positions = chain.forward_kinematics();
        let mut pitch = chain.pitch().to_vec();
        let mut rotate = chain.rotate().to_vec();

        let mut residual = (positions[chain.links()] - *target).norm();
        let mut iterations = 0;

        while residual >= self.config.tolerance && iterations < self.config.max_iterations {
            residual = solve_step(
                &mut positions,
                &mut pitch,
                &mut rotate,
                chain.lengths(),
                target,
                self.config.tolerance,
            );
            iterations += 1;
            debug!("ccd pass {iterations}: residual {residual}");
        }

        let converged = residual < self.config.tolerance;
        if converged && iterations > 0 {
            // a converging pass skips its own re-extraction; sync the angle
            // snapshot with the final positions before handing it out
            extract_angles_into(&positions, chain.lengths(), &mut pitch, &mut rotate);
        }

        IkResult {
            pitch,
            rotate,
            positions,
            residual,
            iterations,
            converged,
        }
    }
}

/// One CCD pass, mutating the caller's buffers in place.
///
/// Performs the backward sweep (end effector toward base, each pivot
/// contributing the minimal rotation that maps the end effector onto the
/// target as seen from that pivot), rigidly propagates the collected
/// rotations to every downstream joint, and — unless the pass itself
/// converged — refreshes `pitch`/`rotate` from the moved positions.
///
/// Returns the resulting end-effector distance to `target`; `0.0` without
/// any mutation when the chain already satisfies the target within
/// `tolerance`.
///
/// A target at or beyond the chain's full extension is the backward
/// sweep's stall case: every pivot wants the chain perfectly straight, and
/// per-pass progress shrinks toward zero near that singularity. The
/// optimal configuration there is known exactly, so such targets are
/// handled by laying the chain straight toward the target instead of
/// sweeping, leaving the residual at `dist(target, base) - reach` (zero
/// for a target right on the reachable boundary).
///
/// # Panics
///
/// Panics if the buffer dimensions disagree: `positions` must be one longer
/// than `lengths`, and the angle slices must match `lengths`.
pub fn solve_step(
    positions: &mut [Point3<f32>],
    pitch: &mut [f32],
    rotate: &mut [f32],
    lengths: &[f32],
    target: &Point3<f32>,
    tolerance: f32,
) -> f32 {
    let n = lengths.len();
    assert_eq!(
        positions.len(),
        n + 1,
        "positions.len() must be lengths.len() + 1"
    );
    assert_eq!(pitch.len(), n);
    assert_eq!(rotate.len(), n);

    if (positions[n] - *target).norm() < tolerance {
        return 0.0;
    }

    // Full-extension singularity: the sweep stalls against a target at or
    // past the reachable boundary, but the optimal configuration there is
    // simply the chain laid straight toward the target.
    let gap = *target - positions[0];
    let reach: f32 = lengths.iter().sum();
    if gap.norm() + tolerance >= reach && gap.norm() > DEGENERACY_EPS {
        let dir = Unit::new_normalize(gap);
        for i in 0..n {
            positions[i + 1] = positions[i] + lengths[i] * dir.into_inner();
        }
        extract_angles_into(positions, lengths, pitch, rotate);
        return (positions[n] - *target).norm();
    }

    // Backward sweep: only the end effector moves while the per-pivot
    // rotations are collected.
    let mut end_effector = positions[n];
    let mut pivots: Vec<UnitQuaternion<f32>> = vec![UnitQuaternion::identity(); n];
    for i in (0..n).rev() {
        let v1 = end_effector - positions[i];
        let v2 = *target - positions[i];
        let q = Aim::between(&v1, &v2, tolerance).quaternion();
        end_effector = positions[i] + q * (end_effector - positions[i]);
        pivots[i] = q;
    }

    // Forward propagation: each pivot rotation turns its entire sub-chain
    // rigidly, outermost pivot first, reproducing the swept end effector.
    for i in (0..n).rev() {
        let origin = positions[i];
        for j in (i + 1)..=n {
            positions[j] = origin + pivots[i] * (positions[j] - origin);
        }
    }
    debug_assert!(
        (positions[n] - end_effector).norm() < 1e-4,
        "propagated end effector diverged from the swept one"
    );

    let residual = (positions[n] - *target).norm();
    if residual < tolerance {
        return residual;
    }

    extract_angles_into(positions, lengths, pitch, rotate);
    residual
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    fn unit_chain() -> LinkChain {
        LinkChain::new(vec![1.0; 4]).unwrap()
    }

    #[test]
    fn already_solved_target_is_a_no_op() {
        let chain = unit_chain();
        let mut positions = chain.forward_kinematics();
        let before = positions.clone();
        let mut pitch = chain.pitch().to_vec();
        let mut rotate = chain.rotate().to_vec();

        // target right on the end effector
        let target = Point3::new(4.0, 0.0, 0.0);
        let residual = solve_step(
            &mut positions,
            &mut pitch,
            &mut rotate,
            chain.lengths(),
            &target,
            1e-3,
        );

        assert_eq!(residual, 0.0);
        assert_eq!(positions, before);
        assert_eq!(pitch, chain.pitch());
        assert_eq!(rotate, chain.rotate());
    }

    #[test]
    fn reachable_target_converges_within_budget() {
        // straight 4-linkage chain folding up to (0, 4, 0)
        let solver = CcdSolver::with_defaults();
        let result = solver.solve(&unit_chain(), &Point3::new(0.0, 4.0, 0.0));

        assert!(
            result.converged,
            "residual {} after {} passes",
            result.residual, result.iterations
        );
        assert!(result.residual < 1e-3);
        assert!(result.iterations <= 10);
    }

    #[test]
    fn solved_angles_reproduce_solved_positions() {
        let chain = unit_chain();
        let target = Point3::new(1.0, 2.0, 1.0);
        let solver = CcdSolver::new(CcdConfig {
            max_iterations: 50,
            ..CcdConfig::default()
        });
        let result = solver.solve(&chain, &target);
        assert!(result.converged);

        let mut accepted = chain.clone();
        accepted.set_angles(&result.pitch, &result.rotate).unwrap();
        let positions = accepted.forward_kinematics();
        for (rebuilt, solved) in positions.iter().zip(&result.positions) {
            assert_relative_eq!(*rebuilt, *solved, epsilon = 1e-3);
        }
        assert!((accepted.end_effector() - target).norm() < 2e-3);
    }

    #[test]
    fn unreachable_target_plateaus_without_diverging() {
        let solver = CcdSolver::with_defaults();
        let target = Point3::new(100.0, 0.0, 0.0);
        let result = solver.solve(&unit_chain(), &target);

        assert!(!result.converged);
        assert_eq!(result.iterations, 10);
        // best effort: reach ends 96 short of the target, no NaN anywhere
        assert_relative_eq!(result.residual, 96.0, epsilon = 1e-2);
        for p in &result.positions {
            assert!(p.coords.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn sweep_is_rigid() {
        // one pass from a bent configuration must preserve every linkage
        // length: sub-chains rotate, they never stretch
        let chain = LinkChain::with_angles(
            vec![1.0, 0.8, 1.2, 1.0],
            vec![0.6, FRAC_PI_4, 1.2, 0.3],
            vec![0.1, -0.9, 2.2, 0.0],
        )
        .unwrap();
        let mut positions = chain.forward_kinematics();
        let mut pitch = chain.pitch().to_vec();
        let mut rotate = chain.rotate().to_vec();

        solve_step(
            &mut positions,
            &mut pitch,
            &mut rotate,
            chain.lengths(),
            &Point3::new(-1.0, 1.5, 0.5),
            1e-3,
        );

        for i in 0..chain.links() {
            let d = (positions[i + 1] - positions[i]).norm();
            assert_relative_eq!(d, chain.lengths()[i], epsilon = 1e-4);
        }
        assert_relative_eq!(positions[0], Point3::origin(), epsilon = 1e-6);
    }

    #[test]
    fn solve_leaves_the_input_chain_untouched() {
        let chain = unit_chain();
        let before = chain.clone();
        let _ = CcdSolver::with_defaults().solve(&chain, &Point3::new(0.0, 2.0, 1.0));
        assert_eq!(chain, before);
    }

    #[test]
    fn full_extension_target_straightens_chain() {
        // target right on the reachable boundary: one pass lays the chain
        // straight toward it and lands the end effector on the target
        let chain = unit_chain();
        let mut positions = chain.forward_kinematics();
        let mut pitch = chain.pitch().to_vec();
        let mut rotate = chain.rotate().to_vec();

        let residual = solve_step(
            &mut positions,
            &mut pitch,
            &mut rotate,
            chain.lengths(),
            &Point3::new(0.0, 4.0, 0.0),
            1e-3,
        );

        assert!(residual < 1e-3, "residual {residual}");
        for (i, p) in positions.iter().enumerate() {
            assert_relative_eq!(*p, Point3::new(0.0, i as f32, 0.0), epsilon = 1e-5);
        }
        // the re-extracted angles describe the same pose: one quarter-turn
        // bend at the base, everything after it straight
        assert_relative_eq!(pitch[0], std::f32::consts::FRAC_PI_2, epsilon = 1e-4);
        for i in 1..4 {
            assert_relative_eq!(pitch[i], 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn residual_decreases_on_first_pass() {
        let chain = unit_chain();
        let target = Point3::new(0.5, 2.0, 0.0);
        let mut positions = chain.forward_kinematics();
        let start = (positions[4] - target).norm();
        let mut pitch = chain.pitch().to_vec();
        let mut rotate = chain.rotate().to_vec();

        let residual = solve_step(
            &mut positions,
            &mut pitch,
            &mut rotate,
            chain.lengths(),
            &target,
            1e-3,
        );
        assert!(residual < start, "{residual} !< {start}");
    }
}
