use crate::{constrain_float, safe_sqrt};
use nalgebra::{Vector2, Vector3};
use num_traits::Float;

/// Inner loop of the cascade: PID-control from velocity error to a thrust
/// vector, with anti-windup, tilt limiting and thrust saturation.
///
/// The thrust vector is expressed in the z-down frame, so hovering means a
/// negative vertical component. The vertical axis is satisfied first; the
/// horizontal thrust then gets whatever the tilt cone and the total thrust
/// budget leave over, which preserves altitude authority under saturation.
#[derive(Clone, Copy, Debug)]
pub struct VelocityLoop {
    pub gain_p_xy: f32,
    pub gain_p_z: f32,
    pub gain_i_xy: f32,
    pub gain_i_z: f32,
    pub gain_d_xy: f32,
    pub gain_d_z: f32,
    /// Thrust at the hover equilibrium point.
    pub thr_hover: f32,
    /// Minimum thrust magnitude; mode-dependent floor.
    pub thr_min: f32,
    /// Maximum thrust magnitude.
    pub thr_max: f32,
    /// Maximum tilt in radians, below pi/2.
    pub tilt_max: f32,
}

impl VelocityLoop {
    /// Run one PID step over `dt` seconds.
    ///
    /// `thr_int` is the persistent integral of the velocity error; it is
    /// advanced here (frozen on saturated axes) and owned by the caller so
    /// it survives across cycles and can be reset on mode transitions.
    pub fn thrust_setpoint(
        &self,
        vel_sp: Vector3<f32>,
        velocity: Vector3<f32>,
        velocity_dot: Vector3<f32>,
        thr_int: &mut Vector3<f32>,
        dt: f32,
    ) -> Vector3<f32> {
        let vel_err = vel_sp - velocity;

        // The estimator may briefly report a non-finite derivative; the D
        // term is dropped rather than poisoning the thrust vector.
        let vel_dot = velocity_dot.map(|d| if d.is_finite() { d } else { 0. });

        // 1. Vertical axis first. The hover bias maps zero velocity error at
        //    hover onto -thr_hover instead of zero thrust.
        let thrust_z = self.gain_p_z * vel_err.z + self.gain_i_z * thr_int.z
            - self.gain_d_z * vel_dot.z
            - self.thr_hover;

        // 2. The thrust limits are negated and swapped in the z-down frame.
        let u_min = -self.thr_max;
        let u_max = -self.thr_min;
        let thrust_sp_z = constrain_float(thrust_z, u_min, u_max);

        // 3. Vertical anti-windup: freeze while clamped with the error still
        //    pushing outward.
        let stop_integral_z =
            (thrust_z >= u_max && vel_err.z >= 0.) || (thrust_z <= u_min && vel_err.z <= 0.);
        if !stop_integral_z {
            thr_int.z = self.integrate(thr_int.z, vel_err.z, self.gain_i_z, dt);
        }

        // 4. Horizontal thrust demand.
        let thrust_xy = Vector2::new(
            self.gain_p_xy * vel_err.x + self.gain_i_xy * thr_int.x - self.gain_d_xy * vel_dot.x,
            self.gain_p_xy * vel_err.y + self.gain_i_xy * thr_int.y - self.gain_d_xy * vel_dot.y,
        );

        // 5. Allowed horizontal magnitude: the tighter of the tilt cone at
        //    the clamped vertical thrust and the remaining total budget.
        //    tan is no usable cone bound at or just past pi/2, where the f32
        //    value rounds to a negative tangent; the total budget governs then.
        let max_budget = safe_sqrt(self.thr_max * self.thr_max - thrust_sp_z * thrust_sp_z);
        let tan_tilt = self.tilt_max.tan();
        let max_tilt = if tan_tilt.is_finite() && tan_tilt >= 0. {
            thrust_sp_z.abs() * tan_tilt
        } else {
            max_budget
        };
        let thrust_max_xy = max_tilt.min(max_budget);

        let saturated_xy = thrust_xy.norm_squared() > thrust_max_xy * thrust_max_xy;
        let thrust_sp_xy = if saturated_xy {
            let mag = thrust_xy.norm();
            if mag > f32::EPSILON {
                thrust_xy * (thrust_max_xy / mag)
            } else {
                Vector2::zeros()
            }
        } else {
            thrust_xy
        };

        // 6. Horizontal anti-windup: freeze both components while saturated
        //    with the error still pushing outward.
        let pushing_out = vel_err.xy().dot(&vel_sp.xy()) >= 0.;
        if !(saturated_xy && pushing_out) {
            thr_int.x = self.integrate(thr_int.x, vel_err.x, self.gain_i_xy, dt);
            thr_int.y = self.integrate(thr_int.y, vel_err.y, self.gain_i_xy, dt);
        }

        Vector3::new(thrust_sp_xy.x, thrust_sp_xy.y, thrust_sp_z)
    }

    /// Advance one integral component, bounding its effective contribution
    /// so prolonged saturation cannot wind it past the thrust range.
    fn integrate(&self, int: f32, err: f32, gain: f32, dt: f32) -> f32 {
        if gain <= 0. {
            return 0.;
        }
        constrain_float(int + err * dt, -self.thr_max / gain, self.thr_max / gain)
    }
}
