use crate::{constrain_float, safe_sqrt, ResolvedSetpoint};
use nalgebra::{Vector2, Vector3};

/// Outer loop of the cascade: P-control from position error to a velocity
/// setpoint, clamped to the velocity limits.
#[derive(Clone, Copy, Debug)]
pub struct PositionLoop {
    /// P-gain for the horizontal axes.
    pub gain_xy: f32,
    /// P-gain for the vertical axis.
    pub gain_z: f32,
    /// Maximum horizontal speed in m/s.
    pub vel_max_xy: f32,
    /// Maximum speed upwards in m/s.
    pub vel_max_z_up: f32,
    /// Maximum speed downwards in m/s.
    pub vel_max_z_down: f32,
}

impl PositionLoop {
    /// Produce the velocity setpoint for this cycle.
    ///
    /// On feed-forward-only axes the resolved position setpoint equals the
    /// measured position, so the P term vanishes and the feed-forward passes
    /// through unchanged.
    pub fn velocity_setpoint(
        &self,
        resolved: &ResolvedSetpoint,
        position: Vector3<f32>,
    ) -> Vector3<f32> {
        // 1. P-control on the position error, per axis
        let err = resolved.position - position;
        let p_term = Vector3::new(self.gain_xy * err.x, self.gain_xy * err.y, self.gain_z * err.z);

        // 2. Sum with the velocity feed-forward
        let vel_sp = p_term + resolved.velocity_ff;

        // 3. Clamp the horizontal magnitude, keeping the feed-forward intact
        let xy = constrain_xy(resolved.velocity_ff.xy(), p_term.xy(), self.vel_max_xy);

        // 4. Asymmetric vertical clamp (z points down, so upwards is negative)
        let z = constrain_float(vel_sp.z, -self.vel_max_z_up, self.vel_max_z_down);

        Vector3::new(xy.x, xy.y, z)
    }
}

/// Clamp `ff + p` to at most `max` magnitude by reducing only the `p`
/// component; the feed-forward `ff` has priority.
///
/// With the sum over the limit and `ff` itself within it, `p` is shrunk
/// along its own direction until the sum lands exactly on the limit circle.
/// With zero feed-forward this is a direction-preserving magnitude clamp.
pub fn constrain_xy(ff: Vector2<f32>, p: Vector2<f32>, max: f32) -> Vector2<f32> {
    let combined = ff + p;
    if combined.norm() <= max {
        return combined;
    }

    let ff_norm = ff.norm();
    if ff_norm >= max {
        // The feed-forward alone saturates the limit
        return ff * (max / ff_norm);
    }

    let p_norm = p.norm();
    if p_norm < f32::EPSILON {
        return ff;
    }

    // Positive root of |ff + s * unit(p)| = max
    let unit = p / p_norm;
    let along = unit.dot(&ff);
    let s = safe_sqrt(along * along + max * max - ff.norm_squared()) - along;

    ff + unit * s
}
