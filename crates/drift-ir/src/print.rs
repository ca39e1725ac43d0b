use std::fmt;

use crate::inst::{Instruction, Operand};
use crate::proc::{Procedure, Program, Terminator};

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "proc @{} {{", self.name())?;
        for block in self.blocks() {
            let info = self.block(block);
            writeln!(f, "^{}:", info.label)?;
            for inst in &info.instructions {
                write!(f, "    ")?;
                self.fmt_inst(f, inst)?;
                writeln!(f)?;
            }
            match &info.terminator {
                Terminator::Branch(targets) => {
                    write!(f, "    br ")?;
                    for (i, target) in targets.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "^{}", self.block(*target).label)?;
                    }
                    writeln!(f)?;
                }
                Terminator::Return => writeln!(f, "    ret")?,
            }
        }
        writeln!(f, "}}")
    }
}

impl Procedure {
    fn fmt_inst(&self, f: &mut fmt::Formatter<'_>, inst: &Instruction) -> fmt::Result {
        match inst {
            Instruction::Alloc { var } => write!(f, "alloc %{}", self.var_name(*var)),
            Instruction::Store { src, dest } => {
                write!(f, "store ")?;
                self.fmt_operand(f, src)?;
                write!(f, " -> %{}", self.place_name(*dest))
            }
            Instruction::Load { src, dest } => {
                write!(
                    f,
                    "%{} = load %{}",
                    self.temp_name(*dest),
                    self.place_name(*src)
                )
            }
            Instruction::Binary { op, dest, operands } => {
                write!(f, "%{} = {}", self.temp_name(*dest), op.mnemonic())?;
                for (i, operand) in operands.iter().enumerate() {
                    write!(f, "{}", if i == 0 { " " } else { ", " })?;
                    self.fmt_operand(f, operand)?;
                }
                Ok(())
            }
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, operand: &Operand) -> fmt::Result {
        match operand {
            Operand::Const(c) => write!(f, "{c}"),
            Operand::Place(p) => write!(f, "%{}", self.place_name(*p)),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, proc) in self.procedures().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{proc}")?;
        }
        Ok(())
    }
}
