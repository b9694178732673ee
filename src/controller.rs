use crate::constrain_float;
use crate::interface;
use crate::params::{ParameterSource, Params};
use crate::position::PositionLoop;
use crate::setpoint::{Constraints, Setpoint, VehicleState};
use crate::velocity::VelocityLoop;
use core::f32::consts::FRAC_PI_2;
use nalgebra::Vector3;

/// Core position control cascade for a multicopter.
///
/// One call to [`generate_thrust_yaw_setpoint`](Self::generate_thrust_yaw_setpoint)
/// runs the full cycle: interface mapping, the position P-loop and the
/// velocity PID-loop. State, setpoint and constraints are copied in through
/// the `update_*` methods before the call; outputs are read back through the
/// getters after it. The integral accumulator is the only state that
/// persists across cycles.
///
/// A setpoint carrying a full thrust vector bypasses both loops and passes
/// the thrust through, bounded to the stabilized-mode thrust range. This is
/// the path for manually-stabilized flight modes.
pub struct PositionController {
    state: VehicleState,
    setpoint: Setpoint,
    constraints: Constraints,
    params: Params,
    thr_int: Vector3<f32>,

    thr_sp: Vector3<f32>,
    yaw_sp: f32,
    yawspeed_sp: f32,
    vel_sp: Vector3<f32>,
    pos_sp: Vector3<f32>,
}

impl Default for PositionController {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl PositionController {
    pub fn new(params: Params) -> Self {
        Self {
            state: VehicleState::default(),
            setpoint: Setpoint::default(),
            constraints: Constraints {
                tilt_max: params.limits.tilt_max,
                vel_max_z_up: params.limits.vel_max_z_up,
            },
            params,
            thr_int: Vector3::zeros(),
            thr_sp: Vector3::zeros(),
            yaw_sp: 0.,
            yawspeed_sp: 0.,
            vel_sp: Vector3::zeros(),
            pos_sp: Vector3::zeros(),
        }
    }

    /// Update the current vehicle state.
    pub fn update_state(&mut self, state: VehicleState) {
        self.state = state;
    }

    /// Update the desired setpoint. A setpoint carrying a full thrust vector
    /// selects the pass-through path for the next cycle.
    pub fn update_setpoint(&mut self, setpoint: Setpoint) {
        self.setpoint = setpoint;
    }

    /// Apply constraints that are stricter than the global limits. Anything
    /// looser is clamped down to them.
    pub fn update_constraints(&mut self, constraints: Constraints) {
        let limits = &self.params.limits;
        self.constraints = Constraints {
            tilt_max: constrain_float(constraints.tilt_max, 0., limits.tilt_max.min(FRAC_PI_2)),
            vel_max_z_up: constrain_float(constraints.vel_max_z_up, 0., limits.vel_max_z_up),
        };
    }

    /// Poll the parameter source and refresh the cached gains and limits if
    /// it reports a change.
    pub fn update_params(&mut self, source: &mut impl ParameterSource) {
        self.params.refresh(source);
    }

    /// Run the P-position and PID-velocity controllers, updating the thrust,
    /// yaw and yaw-speed setpoints for this cycle over `dt` seconds.
    pub fn generate_thrust_yaw_setpoint(&mut self, dt: f32) {
        let resolved = interface::map_setpoint(&self.state, &self.setpoint);
        self.yaw_sp = resolved.yaw;
        self.yawspeed_sp = resolved.yawspeed;

        if let Some(thrust) = self.setpoint.thrust {
            self.pass_through(thrust);
            return;
        }

        self.pos_sp = resolved.position;
        self.vel_sp = self
            .position_loop()
            .velocity_setpoint(&resolved, self.state.position);
        self.thr_sp = self.velocity_loop().thrust_setpoint(
            self.vel_sp,
            self.state.velocity,
            self.state.velocity_dot,
            &mut self.thr_int,
            dt,
        );
    }

    /// Set the horizontal integral components to zero, typically on a mode
    /// transition to avoid carrying the accumulator over.
    pub fn reset_integral_xy(&mut self) {
        self.thr_int.x = 0.;
        self.thr_int.y = 0.;
    }

    /// Set the vertical integral component to zero.
    pub fn reset_integral_z(&mut self) {
        self.thr_int.z = 0.;
    }

    /// The thrust setpoint in normalized units.
    pub fn thrust_setpoint(&self) -> Vector3<f32> {
        self.thr_sp
    }

    /// The yaw setpoint in radians.
    pub fn yaw_setpoint(&self) -> f32 {
        self.yaw_sp
    }

    /// The yaw-speed setpoint in radians/second.
    pub fn yawspeed_setpoint(&self) -> f32 {
        self.yawspeed_sp
    }

    /// The resolved velocity setpoint, exposed for downstream diagnostics.
    pub fn velocity_setpoint(&self) -> Vector3<f32> {
        self.vel_sp
    }

    /// The resolved position setpoint, exposed for downstream diagnostics.
    pub fn position_setpoint(&self) -> Vector3<f32> {
        self.pos_sp
    }

    /// Thrust was already generated upstream: bound its magnitude to the
    /// stabilized-mode thrust range and pin the resolved setpoints to the
    /// current state.
    fn pass_through(&mut self, thrust: Vector3<f32>) {
        let limits = &self.params.limits;
        let mag = thrust.norm();

        self.thr_sp = if mag > limits.thr_max {
            thrust * (limits.thr_max / mag)
        } else if mag < limits.thr_min_stab && mag > f32::EPSILON {
            thrust * (limits.thr_min_stab / mag)
        } else {
            thrust
        };

        self.pos_sp = self.state.position;
        self.vel_sp = self.state.velocity;
    }

    fn position_loop(&self) -> PositionLoop {
        PositionLoop {
            gain_xy: self.params.gains.pos_p_xy,
            gain_z: self.params.gains.pos_p_z,
            vel_max_xy: self.params.limits.vel_max_xy,
            vel_max_z_up: self.constraints.vel_max_z_up,
            vel_max_z_down: self.params.limits.vel_max_z_down,
        }
    }

    fn velocity_loop(&self) -> VelocityLoop {
        let gains = &self.params.gains;
        let limits = &self.params.limits;
        VelocityLoop {
            gain_p_xy: gains.vel_p_xy,
            gain_p_z: gains.vel_p_z,
            gain_i_xy: gains.vel_i_xy,
            gain_i_z: gains.vel_i_z,
            gain_d_xy: gains.vel_d_xy,
            gain_d_z: gains.vel_d_z,
            thr_hover: limits.thr_hover,
            thr_min: limits.thr_min_position,
            thr_max: limits.thr_max,
            tilt_max: self.constraints.tilt_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PositionController;
    use crate::{Constraints, Gains, Limits, Params, Setpoint, VehicleState};
    use approx::assert_relative_eq;
    use core::f32::consts::FRAC_PI_2;
    use nalgebra::Vector3;

    const DT: f32 = 0.02;

    fn params() -> Params {
        Params {
            gains: Gains {
                pos_p_xy: 1.,
                pos_p_z: 1.,
                ..Default::default()
            },
            limits: Limits::default(),
        }
    }

    fn cycle(controller: &mut PositionController, setpoint: Setpoint) {
        controller.update_setpoint(setpoint);
        controller.generate_thrust_yaw_setpoint(DT);
    }

    #[test]
    fn position_step_produces_matching_velocity_setpoint() {
        let mut controller = PositionController::new(params());
        controller.update_state(VehicleState::default());

        cycle(
            &mut controller,
            Setpoint {
                position: [Some(1.), Some(0.), Some(0.)],
                ..Default::default()
            },
        );

        assert_relative_eq!(controller.velocity_setpoint(), Vector3::new(1., 0., 0.));
        assert_relative_eq!(controller.position_setpoint(), Vector3::new(1., 0., 0.));
    }

    #[test]
    fn unset_position_axis_stays_pinned_to_measurement() {
        let mut controller = PositionController::new(params());
        let setpoint = Setpoint {
            velocity: [Some(2.), Some(0.), None],
            ..Default::default()
        };

        for x in 0..3 {
            controller.update_state(VehicleState {
                position: Vector3::new(x as f32, 0., -5.),
                ..Default::default()
            });
            cycle(&mut controller, setpoint);

            assert_relative_eq!(
                controller.position_setpoint(),
                Vector3::new(x as f32, 0., -5.)
            );
            assert_relative_eq!(controller.velocity_setpoint().x, 2.);
        }
    }

    #[test]
    fn skip_controller_passes_thrust_through() {
        let mut controller = PositionController::new(params());
        controller.update_state(VehicleState {
            position: Vector3::new(1., 2., -3.),
            velocity: Vector3::new(0.1, 0., 0.),
            ..Default::default()
        });

        let thrust = Vector3::new(0.1, -0.1, -0.5);
        cycle(
            &mut controller,
            Setpoint {
                thrust: Some(thrust),
                ..Default::default()
            },
        );

        assert_relative_eq!(controller.thrust_setpoint(), thrust);
        // Resolved setpoints pin to the vehicle state on the pass-through path
        assert_relative_eq!(controller.position_setpoint(), Vector3::new(1., 2., -3.));
        assert_relative_eq!(controller.velocity_setpoint(), Vector3::new(0.1, 0., 0.));
    }

    #[test]
    fn pass_through_bounds_the_thrust_magnitude() {
        let mut controller = PositionController::new(params());

        cycle(
            &mut controller,
            Setpoint {
                thrust: Some(Vector3::new(0., 0., -2.)),
                ..Default::default()
            },
        );
        assert_relative_eq!(controller.thrust_setpoint(), Vector3::new(0., 0., -1.));

        cycle(
            &mut controller,
            Setpoint {
                thrust: Some(Vector3::new(0., 0., -0.01)),
                ..Default::default()
            },
        );
        assert_relative_eq!(controller.thrust_setpoint(), Vector3::new(0., 0., -0.08));
    }

    #[test]
    fn yaw_holds_current_when_unset() {
        let mut controller = PositionController::new(params());
        controller.update_state(VehicleState {
            yaw: 1.2,
            ..Default::default()
        });

        cycle(&mut controller, Setpoint::default());
        assert_relative_eq!(controller.yaw_setpoint(), 1.2);
        assert_relative_eq!(controller.yawspeed_setpoint(), 0.);

        cycle(
            &mut controller,
            Setpoint {
                yaw: Some(0.3),
                yaw_rate: Some(-0.5),
                ..Default::default()
            },
        );
        assert_relative_eq!(controller.yaw_setpoint(), 0.3);
        assert_relative_eq!(controller.yawspeed_setpoint(), -0.5);
    }

    #[test]
    fn integral_resets_are_independent() {
        let mut controller = PositionController::new(params());
        controller.update_state(VehicleState::default());

        // Wind up all three axes with a persistent velocity error
        let setpoint = Setpoint {
            velocity: [Some(1.), Some(1.), Some(0.5)],
            ..Default::default()
        };
        for _ in 0..20 {
            cycle(&mut controller, setpoint);
        }
        assert!(controller.thr_int.x > 0.);
        assert!(controller.thr_int.y > 0.);
        assert!(controller.thr_int.z > 0.);

        let z_before = controller.thr_int.z;
        controller.reset_integral_xy();
        assert_eq!(controller.thr_int.x, 0.);
        assert_eq!(controller.thr_int.y, 0.);
        assert_eq!(controller.thr_int.z, z_before);

        controller.reset_integral_z();
        assert_eq!(controller.thr_int.z, 0.);
    }

    #[test]
    fn constraints_are_clamped_to_global_limits() {
        let mut controller = PositionController::new(params());

        controller.update_constraints(Constraints {
            tilt_max: FRAC_PI_2 + 1.,
            vel_max_z_up: 100.,
        });

        assert_eq!(controller.constraints.tilt_max, params().limits.tilt_max);
        assert_eq!(
            controller.constraints.vel_max_z_up,
            params().limits.vel_max_z_up
        );

        controller.update_constraints(Constraints {
            tilt_max: 0.2,
            vel_max_z_up: 1.,
        });
        assert_eq!(controller.constraints.tilt_max, 0.2);
        assert_eq!(controller.constraints.vel_max_z_up, 1.);
    }

    #[test]
    fn constrained_up_speed_limits_the_climb_setpoint() {
        let mut controller = PositionController::new(params());
        controller.update_state(VehicleState::default());
        controller.update_constraints(Constraints {
            tilt_max: 0.5,
            vel_max_z_up: 0.5,
        });

        cycle(
            &mut controller,
            Setpoint {
                position: [None, None, Some(-50.)],
                ..Default::default()
            },
        );

        assert_relative_eq!(controller.velocity_setpoint().z, -0.5);
    }
}
