//! Resolution of the raw parse into `drift-ir`.
//!
//! Runs three passes per procedure: block labels first (branches may point
//! forward), then destination definitions (temporaries may be referenced
//! before their textual definition along some path), then instruction
//! bodies. An operand name that resolves to nothing is interned as a
//! never-written variable — it reads as unknown during analysis instead of
//! failing the load.

use drift_ir::{
    BinOp, BlockId, Instruction, Operand, Place, Procedure, Program, TempId, Terminator, VarId,
};
use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::parser::{RawInstKind, RawOperand, RawProc, RawProgram, RawTerm};

pub(crate) fn lower(raw: RawProgram<'_>) -> Result<Program, ParseError> {
    let mut procedures = Vec::with_capacity(raw.procs.len());
    for proc in raw.procs {
        procedures.push(lower_proc(proc)?);
    }
    Ok(Program::new(procedures))
}

fn lower_proc(raw: RawProc<'_>) -> Result<Procedure, ParseError> {
    let mut proc = Procedure::new(raw.name);

    let mut labels: FxHashMap<&str, BlockId> = FxHashMap::default();
    for block in &raw.blocks {
        if labels.contains_key(block.label) {
            return Err(ParseError::DuplicateBlock {
                line: block.line,
                label: block.label.to_owned(),
            });
        }
        labels.insert(block.label, proc.push_block(block.label));
    }

    let mut vars: FxHashMap<&str, VarId> = FxHashMap::default();
    let mut temps: FxHashMap<&str, TempId> = FxHashMap::default();
    for block in &raw.blocks {
        for inst in &block.instrs {
            match &inst.kind {
                RawInstKind::Alloc { var } => {
                    if temps.contains_key(var) {
                        return Err(ParseError::Redefinition {
                            line: inst.line,
                            name: (*var).to_owned(),
                        });
                    }
                    if !vars.contains_key(var) {
                        vars.insert(*var, proc.add_var(*var));
                    }
                }
                RawInstKind::Load { dest, .. } | RawInstKind::Binary { dest, .. } => {
                    if vars.contains_key(dest) || temps.contains_key(dest) {
                        return Err(ParseError::Redefinition {
                            line: inst.line,
                            name: (*dest).to_owned(),
                        });
                    }
                    temps.insert(*dest, proc.add_temp(*dest));
                }
                RawInstKind::Store { .. } => {}
            }
        }
    }

    for (block, raw_block) in proc.blocks().zip(&raw.blocks) {
        let mut instructions = Vec::with_capacity(raw_block.instrs.len());
        for inst in &raw_block.instrs {
            let lowered = match &inst.kind {
                RawInstKind::Alloc { var } => Instruction::Alloc { var: vars[var] },
                RawInstKind::Store { src, dest } => Instruction::Store {
                    src: lower_operand(&mut proc, &mut vars, &temps, src),
                    dest: resolve(&mut proc, &mut vars, &temps, dest),
                },
                RawInstKind::Load { src, dest } => Instruction::Load {
                    src: resolve(&mut proc, &mut vars, &temps, src),
                    dest: temps[dest],
                },
                RawInstKind::Binary {
                    dest,
                    mnemonic,
                    operands,
                } => Instruction::Binary {
                    op: BinOp::from_mnemonic(mnemonic),
                    dest: temps[dest],
                    operands: operands
                        .iter()
                        .map(|operand| lower_operand(&mut proc, &mut vars, &temps, operand))
                        .collect(),
                },
            };
            instructions.push(lowered);
        }

        let terminator = match &raw_block.term {
            RawTerm::Branch(targets) => {
                let mut resolved = drift_ir::SmallVec::new();
                for target in targets {
                    match labels.get(target) {
                        Some(id) => resolved.push(*id),
                        None => {
                            return Err(ParseError::UndefinedBlock {
                                line: raw_block.term_line,
                                label: (*target).to_owned(),
                            });
                        }
                    }
                }
                Terminator::Branch(resolved)
            }
            RawTerm::Return => Terminator::Return,
        };

        let info = proc.block_mut(block);
        info.instructions = instructions;
        info.terminator = terminator;
    }

    Ok(proc)
}

fn lower_operand<'s>(
    proc: &mut Procedure,
    vars: &mut FxHashMap<&'s str, VarId>,
    temps: &FxHashMap<&'s str, TempId>,
    operand: &RawOperand<'s>,
) -> Operand {
    match *operand {
        RawOperand::Number(value) => Operand::Const(value),
        RawOperand::Name(name) => Operand::Place(resolve(proc, vars, temps, name)),
    }
}

/// Resolve a `%name` reference: declared variables first, then temporaries.
/// Unresolved names are interned as fresh, never-written variables.
fn resolve<'s>(
    proc: &mut Procedure,
    vars: &mut FxHashMap<&'s str, VarId>,
    temps: &FxHashMap<&'s str, TempId>,
    name: &'s str,
) -> Place {
    if let Some(var) = vars.get(name) {
        return Place::Var(*var);
    }
    if let Some(temp) = temps.get(name) {
        return Place::Temp(*temp);
    }
    Place::Var(*vars.entry(name).or_insert_with(|| proc.add_var(name)))
}
