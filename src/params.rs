use core::f32::consts::FRAC_PI_4;

/// Controller gains per axis group.
///
/// `pos_*` is the P-gain of the position loop, `vel_*` are the PID gains of
/// the velocity loop. Horizontal x and y share one gain.
#[derive(Clone, Copy, Debug)]
pub struct Gains {
    pub pos_p_xy: f32,
    pub pos_p_z: f32,
    pub vel_p_xy: f32,
    pub vel_p_z: f32,
    pub vel_i_xy: f32,
    pub vel_i_z: f32,
    pub vel_d_xy: f32,
    pub vel_d_z: f32,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            pos_p_xy: 0.95,
            pos_p_z: 1.,
            vel_p_xy: 0.09,
            vel_p_z: 0.2,
            vel_i_xy: 0.02,
            vel_i_z: 0.02,
            vel_d_xy: 0.01,
            vel_d_z: 0.,
        }
    }
}

/// Global velocity, thrust and tilt limits.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Maximum horizontal speed in m/s.
    pub vel_max_xy: f32,
    /// Maximum speed upwards in m/s.
    pub vel_max_z_up: f32,
    /// Maximum speed downwards in m/s.
    pub vel_max_z_down: f32,
    /// Maximum normalized thrust.
    pub thr_max: f32,
    /// Minimum thrust in any position-controlled mode.
    pub thr_min_position: f32,
    /// Minimum thrust in stabilized mode.
    pub thr_min_stab: f32,
    /// Thrust at the hover equilibrium point of the velocity controller.
    pub thr_hover: f32,
    /// Maximum tilt in radians.
    pub tilt_max: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            vel_max_xy: 12.,
            vel_max_z_up: 3.,
            vel_max_z_down: 1.,
            thr_max: 1.,
            thr_min_position: 0.12,
            thr_min_stab: 0.08,
            thr_hover: 0.5,
            tilt_max: FRAC_PI_4,
        }
    }
}

/// Read-only provider of named scalar parameters.
///
/// The storage and transport behind it are external; values are assumed to
/// be validated at the source (positive limits, `thr_min < thr_max`).
pub trait ParameterSource {
    /// Poll for a change notification, clearing it.
    fn updated(&mut self) -> bool;

    /// Current value of a named parameter.
    fn get(&self, name: &str) -> Option<f32>;
}

/// Snapshot of [`Gains`] and [`Limits`] held between refresh points.
#[derive(Clone, Copy, Debug, Default)]
pub struct Params {
    pub gains: Gains,
    pub limits: Limits,
}

impl Params {
    /// Re-read every parameter if the source reports a change.
    ///
    /// Best-effort: a missing key keeps its cached value, and a stale cache
    /// for one cycle is acceptable.
    pub fn refresh(&mut self, source: &mut impl ParameterSource) {
        if source.updated() {
            self.reload(source);
        }
    }

    /// Unconditionally re-read every parameter from the source.
    pub fn reload(&mut self, source: &impl ParameterSource) {
        let mut read = |name, value: &mut f32| {
            if let Some(v) = source.get(name) {
                *value = v;
            }
        };

        read("POS_P_XY", &mut self.gains.pos_p_xy);
        read("POS_P_Z", &mut self.gains.pos_p_z);
        read("VEL_P_XY", &mut self.gains.vel_p_xy);
        read("VEL_P_Z", &mut self.gains.vel_p_z);
        read("VEL_I_XY", &mut self.gains.vel_i_xy);
        read("VEL_I_Z", &mut self.gains.vel_i_z);
        read("VEL_D_XY", &mut self.gains.vel_d_xy);
        read("VEL_D_Z", &mut self.gains.vel_d_z);

        read("VEL_MAX_XY", &mut self.limits.vel_max_xy);
        read("VEL_MAX_Z_UP", &mut self.limits.vel_max_z_up);
        read("VEL_MAX_Z_DN", &mut self.limits.vel_max_z_down);
        read("THR_MAX", &mut self.limits.thr_max);
        read("THR_MIN_POS", &mut self.limits.thr_min_position);
        read("THR_MIN_STAB", &mut self.limits.thr_min_stab);
        read("THR_HOVER", &mut self.limits.thr_hover);
        read("TILT_MAX", &mut self.limits.tilt_max);
    }
}
