use nalgebra::Vector3;

/// Current vehicle state, copied in from the estimator once per cycle.
///
/// The z axis points down: climbing means a negative vertical velocity.
#[derive(Clone, Copy, Debug, Default)]
pub struct VehicleState {
    /// Local position in meters.
    pub position: Vector3<f32>,
    /// Velocity in m/s.
    pub velocity: Vector3<f32>,
    /// Velocity derivative in m/s^2. Non-finite components are treated as zero.
    pub velocity_dot: Vector3<f32>,
    /// Yaw in radians.
    pub yaw: f32,
}

/// Desired setpoint for one control cycle.
///
/// Every field may independently be absent; the interface mapping stage
/// resolves absent fields against the current [`VehicleState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Setpoint {
    /// Desired position in meters, per component.
    pub position: [Option<f32>; 3],
    /// Desired velocity in m/s, per component. Acts as feed-forward when a
    /// position setpoint is present on the same axis group.
    pub velocity: [Option<f32>; 3],
    /// Desired acceleration in m/s^2. Not supported yet; carried for
    /// interface completeness and ignored.
    pub acceleration: [Option<f32>; 3],
    /// Desired thrust in normalized units. When set, the position and
    /// velocity loops are bypassed and this vector passes to the output.
    pub thrust: Option<Vector3<f32>>,
    /// Desired yaw in radians.
    pub yaw: Option<f32>,
    /// Desired yaw-speed in radians/second.
    pub yaw_rate: Option<f32>,
}

/// Constraints that depend on the flight mode and are stricter than the
/// global limits.
#[derive(Clone, Copy, Debug)]
pub struct Constraints {
    /// Maximum tilt in radians, always below pi/2.
    pub tilt_max: f32,
    /// Maximum speed upwards in m/s, always below the global upward limit.
    pub vel_max_z_up: f32,
}
