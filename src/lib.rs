pub use drift_interp as interp;
pub use drift_ir as ir;
pub use drift_parse as parse;

pub mod prelude {
    pub use drift_interp::{
        ReportSink, SeparationAnalysis, SeparationReport, SeparationTracker, Value, ValueStore,
    };
    pub use drift_ir::*;
    pub use drift_parse::parse_program;
}
