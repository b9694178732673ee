use crate::{Setpoint, VehicleState};
use nalgebra::Vector3;

/// Fully-populated setpoint produced by the interface mapping stage.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolvedSetpoint {
    /// Effective position setpoint. On feed-forward-only axes it is pinned
    /// to the measured position, so the position loop sees zero error there
    /// and no stale error reappears when position control re-engages.
    pub position: Vector3<f32>,
    /// Velocity feed-forward, zero on components without a velocity setpoint.
    pub velocity_ff: Vector3<f32>,
    /// Yaw setpoint in radians.
    pub yaw: f32,
    /// Yaw-speed setpoint in radians/second.
    pub yawspeed: f32,
}

/// Resolve a partially-specified [`Setpoint`] against the current state.
///
/// Fallbacks per field:
/// * position unset: pinned to the measured position (feed-forward-only axis)
/// * velocity unset: feed-forward of zero
/// * yaw unset: hold the current yaw
/// * yaw-rate unset: zero
///
/// The horizontal pair engages position control only as a unit; with x or y
/// missing, both fall back to feed-forward-only.
pub fn map_setpoint(state: &VehicleState, setpoint: &Setpoint) -> ResolvedSetpoint {
    let mut resolved = ResolvedSetpoint {
        position: state.position,
        velocity_ff: Vector3::zeros(),
        yaw: setpoint.yaw.unwrap_or(state.yaw),
        yawspeed: setpoint.yaw_rate.unwrap_or(0.),
    };

    if let (Some(x), Some(y)) = (setpoint.position[0], setpoint.position[1]) {
        resolved.position.x = x;
        resolved.position.y = y;
    }

    if let Some(z) = setpoint.position[2] {
        resolved.position.z = z;
    }

    for i in 0..3 {
        if let Some(v) = setpoint.velocity[i] {
            resolved.velocity_ff[i] = v;
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::map_setpoint;
    use crate::{Setpoint, VehicleState};
    use nalgebra::Vector3;

    fn state() -> VehicleState {
        VehicleState {
            position: Vector3::new(1., 2., -3.),
            velocity: Vector3::new(0.5, 0., 0.),
            velocity_dot: Vector3::zeros(),
            yaw: 0.7,
        }
    }

    #[test]
    fn empty_setpoint_pins_to_state() {
        let resolved = map_setpoint(&state(), &Setpoint::default());

        assert_eq!(resolved.position, state().position);
        assert_eq!(resolved.velocity_ff, Vector3::zeros());
        assert_eq!(resolved.yaw, 0.7);
        assert_eq!(resolved.yawspeed, 0.);
    }

    #[test]
    fn position_setpoint_overrides_per_axis_group() {
        let setpoint = Setpoint {
            position: [Some(5.), Some(6.), None],
            ..Default::default()
        };
        let resolved = map_setpoint(&state(), &setpoint);

        assert_eq!(resolved.position, Vector3::new(5., 6., -3.));
    }

    #[test]
    fn half_set_horizontal_pair_is_feed_forward_only() {
        let setpoint = Setpoint {
            position: [Some(5.), None, Some(-10.)],
            velocity: [None, Some(1.5), None],
            ..Default::default()
        };
        let resolved = map_setpoint(&state(), &setpoint);

        // xy pinned to the measured position, z engaged
        assert_eq!(resolved.position, Vector3::new(1., 2., -10.));
        assert_eq!(resolved.velocity_ff, Vector3::new(0., 1.5, 0.));
    }

    #[test]
    fn yaw_defaults() {
        let setpoint = Setpoint {
            yaw: Some(-0.2),
            yaw_rate: Some(0.1),
            ..Default::default()
        };
        let resolved = map_setpoint(&state(), &setpoint);

        assert_eq!(resolved.yaw, -0.2);
        assert_eq!(resolved.yawspeed, 0.1);
    }
}
