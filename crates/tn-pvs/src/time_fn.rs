//! Travel-time functions and their registry.
//!
//! A time function converts a link's physical length and the kinematic
//! parameters of its network level into a travel time:
//!
//! | Argument       | Unit  |
//! |----------------|-------|
//! | `distance`     | m     |
//! | `v_max`        | km/h  |
//! | `acceleration` | m/s²  |
//! | `deceleration` | m/s²  |
//! | *return*       | min   |
//!
//! Functions are plain `fn` pointers, so the signature is checked by the
//! compiler and a registered function cannot capture state.

use std::collections::BTreeMap;

use crate::{PvsError, PvsResult};

/// `(distance_m, v_max_kmh, acceleration, deceleration) -> minutes`
pub type TimeFunction = fn(f64, f64, f64, f64) -> f64;

/// Round to one decimal, ties to even.
#[inline]
fn round_tenth(minutes: f64) -> f64 {
    (minutes * 10.0).round_ties_even() / 10.0
}

// ── Built-in functions ────────────────────────────────────────────────────────

/// Symmetric uniformly accelerated rectilinear motion.
///
/// The vehicle accelerates at `acceleration` up to `v_max`, cruises, then
/// brakes at `|deceleration|`.  When the link is too short to reach `v_max`
/// the peak speed is lowered so that acceleration and braking meet.
pub fn suarm(distance: f64, v_max: f64, acceleration: f64, deceleration: f64) -> f64 {
    let v = v_max / 3.6;
    let a = acceleration;
    let d = deceleration.abs();
    let ta_max = v / a;
    let td_max = v / d;
    let d_ad_max = (ta_max + td_max) * (v / 2.0);

    let total_s = if distance > d_ad_max {
        (distance - d_ad_max) / v + ta_max + td_max
    } else {
        let td = (2.0 * distance / ((d * d / a) + d)).sqrt();
        let ta = td * (d / a);
        ta + td
    };
    round_tenth(total_s / 60.0)
}

/// Constant cruising speed over the whole link; acceleration is ignored.
pub fn constant_speed(distance: f64, v_max: f64, _acceleration: f64, _deceleration: f64) -> f64 {
    round_tenth(distance / (v_max / 3.6) / 60.0)
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Named time functions.  The travel-time set refers to one by its `tf_name`.
#[derive(Clone, Debug, Default)]
pub struct TimeFunctionRegistry {
    functions: BTreeMap<String, TimeFunction>,
}

impl TimeFunctionRegistry {
    /// Registry without any function.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `suarm` and `constant_speed`.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        r.functions.insert("suarm".to_owned(), suarm);
        r.functions.insert("constant_speed".to_owned(), constant_speed);
        r
    }

    /// Add `function` under `name`.  Names are unique.
    pub fn register(&mut self, name: &str, function: TimeFunction) -> PvsResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PvsError::InvalidValue {
                name: "tf_name".to_owned(),
                value: String::new(),
            });
        }
        if self.functions.contains_key(name) {
            return Err(PvsError::DuplicateTimeFunction(name.to_owned()));
        }
        self.functions.insert(name.to_owned(), function);
        log::debug!("registered time function {name:?}");
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> PvsResult<TimeFunction> {
        self.functions.get(name).copied().ok_or_else(|| PvsError::UnknownTimeFunction {
            name: name.to_owned(),
            available: self.names().join(", "),
        })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}
