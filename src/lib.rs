//! # copter-position-control
//! A `#![no_std]` cascaded position controller core for multirotor vehicles.
//!
//! [`PositionController`] contains a P-controller for position and a
//! PID-controller for velocity. It consumes the vehicle position, velocity
//! and yaw, a desired position/velocity/thrust/yaw/yaw-speed setpoint and
//! mode-dependent [`Constraints`], and produces a thrust vector and a yaw
//! setpoint once per control cycle.
//!
//! If both a position and a velocity setpoint are present, the velocity
//! setpoint acts as feed-forward. When the combined velocity exceeds the
//! horizontal limit the feed-forward keeps priority and the position-control
//! component is the one reduced.
//!
//! A setpoint field that is `None` is considered not set.
//!
//! # Components
//! [`PositionLoop`] and [`VelocityLoop`] are the two cascade stages, usable
//! on their own for testing or analysis.
//!
//! [`Params`] caches the gains and limits read from an injected
//! [`ParameterSource`].

#![no_std]

use num_traits::Float;

mod controller;
pub use controller::PositionController;

mod interface;
pub use interface::{map_setpoint, ResolvedSetpoint};

mod params;
pub use params::{Gains, Limits, ParameterSource, Params};

mod position;
pub use position::PositionLoop;

mod setpoint;
pub use setpoint::{Constraints, Setpoint, VehicleState};

mod velocity;
pub use velocity::VelocityLoop;

fn constrain_float(amt: f32, low: f32, high: f32) -> f32 {
    if amt.is_nan() {
        return (low + high) / 2.0;
    }

    if amt < low {
        return low;
    }

    if amt > high {
        return high;
    }

    amt
}

fn safe_sqrt(v: f32) -> f32 {
    let ret = v.sqrt();
    if ret.is_nan() {
        return 0.0;
    }
    ret
}
