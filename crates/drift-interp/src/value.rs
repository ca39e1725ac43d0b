use std::fmt;

/// A tracked scalar: a concrete 64-bit float, or the no-information marker.
///
/// `Unknown` is the top of a flat two-level lattice (every concrete value
/// below it, nothing above). A cell is unknown when it was never written,
/// when its name does not exist in the program, or when unknownness reached
/// it through arithmetic. Arithmetic over `Unknown` stays `Unknown` — the
/// analysis loses precision, it never guesses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Known(f64),
    Unknown,
}

impl Value {
    pub fn is_unknown(self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn known(self) -> Option<f64> {
        match self {
            Value::Known(v) => Some(v),
            Value::Unknown => None,
        }
    }

    /// Combine two values with `f`, unknown-dominant.
    pub fn zip_with(self, other: Value, f: impl FnOnce(f64, f64) -> f64) -> Value {
        match (self, other) {
            (Value::Known(a), Value::Known(b)) => Value::Known(f(a, b)),
            _ => Value::Unknown,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Known(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Known(v) => write!(f, "{v}"),
            Value::Unknown => write!(f, "unknown"),
        }
    }
}
