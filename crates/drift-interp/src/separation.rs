use drift_ir::{Place, Procedure};

use crate::report::SeparationReport;
use crate::store::ValueStore;
use crate::value::Value;

/// Absolute difference of two tracked values; unknown dominates.
pub fn separation(a: Value, b: Value) -> Value {
    a.zip_with(b, |x, y| (x - y).abs())
}

/// The two designated variables whose separation is tracked.
///
/// Names are resolved against the procedure's user variables once, up
/// front. A name that does not exist in the program is not an error: its
/// value reads as unknown for the whole run, so every reported separation
/// is unknown too.
#[derive(Clone, Debug)]
pub struct SeparationTracker {
    name_a: String,
    name_b: String,
    place_a: Option<Place>,
    place_b: Option<Place>,
}

impl SeparationTracker {
    pub fn new(proc: &Procedure, name_a: impl Into<String>, name_b: impl Into<String>) -> Self {
        let name_a = name_a.into();
        let name_b = name_b.into();
        let place_a = proc.find_var(&name_a).map(Place::Var);
        let place_b = proc.find_var(&name_b).map(Place::Var);
        Self {
            name_a,
            name_b,
            place_a,
            place_b,
        }
    }

    /// Current separation snapshot. Pure: each call reads only the store's
    /// present contents.
    pub fn measure(&self, store: &ValueStore) -> SeparationReport {
        let value_a = self.read(self.place_a, store);
        let value_b = self.read(self.place_b, store);
        SeparationReport {
            name_a: self.name_a.clone(),
            value_a,
            name_b: self.name_b.clone(),
            value_b,
            separation: separation(value_a, value_b),
        }
    }

    fn read(&self, place: Option<Place>, store: &ValueStore) -> Value {
        place.map_or(Value::Unknown, |p| store.read(p))
    }
}
