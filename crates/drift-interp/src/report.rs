use std::fmt;

use crate::value::Value;

/// One separation measurement, emitted after every instruction and once per
/// completed block.
#[derive(Clone, Debug, PartialEq)]
pub struct SeparationReport {
    pub name_a: String,
    pub value_a: Value,
    pub name_b: String,
    pub value_b: Value,
    pub separation: Value,
}

impl fmt::Display for SeparationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sep between '{}' - {} and '{}' - {} = {}",
            self.name_a, self.value_a, self.name_b, self.value_b, self.separation
        )
    }
}

/// Where the engine delivers its measurements. Formatting and I/O live
/// behind this seam; the engine itself never prints.
pub trait ReportSink {
    /// A block has been entered and is about to be interpreted.
    fn enter_block(&mut self, label: &str) {
        let _ = label;
    }

    /// Separation state after one instruction.
    fn after_instruction(&mut self, report: &SeparationReport) {
        let _ = report;
    }

    /// Block-level separation, emitted after the block's successors have
    /// been fully explored.
    fn after_block(&mut self, label: &str, report: &SeparationReport) {
        let _ = (label, report);
    }
}
