use drift_ir::{BinOp, Instruction, Operand, Place};
use log::debug;

use crate::store::ValueStore;
use crate::value::Value;

/// Apply one instruction's effect to the store.
///
/// Never fails: missing sources read as [`Value::Unknown`], and opcodes the
/// value model does not cover leave their destination untouched rather than
/// aborting the analysis.
pub fn apply(store: &mut ValueStore, inst: &Instruction) {
    match inst {
        Instruction::Alloc { var } => store.allocate(Place::Var(*var)),
        Instruction::Store { src, dest } => {
            let value = resolve(store, src);
            store.write(*dest, value);
        }
        // A load snapshots the source into a fresh identity; later writes to
        // the source must not reach the copy.
        Instruction::Load { src, dest } => {
            let value = store.read(*src);
            store.write(Place::Temp(*dest), value);
        }
        Instruction::Binary {
            op: BinOp::Unmodeled(mnemonic),
            dest: _,
            operands: _,
        } => {
            debug!("opcode '{mnemonic}' is not modeled; destination left unbound");
        }
        Instruction::Binary { op, dest, operands } => {
            let mut values = operands.iter().map(|operand| resolve(store, operand));
            let Some(seed) = values.next() else {
                debug!("binary '{}' has no operands; destination left unbound", op.mnemonic());
                return;
            };
            let result = values.fold(seed, |acc, current| combine(op, acc, current));
            store.write(Place::Temp(*dest), result);
        }
    }
}

fn resolve(store: &ValueStore, operand: &Operand) -> Value {
    match operand {
        Operand::Const(c) => Value::Known(*c),
        Operand::Place(place) => store.read(*place),
    }
}

/// Fold step for one binary opcode.
///
/// `Rem` is operand passthrough: it yields the current operand when that is
/// known and discards the accumulator entirely — so an unknown left-hand
/// side does not poison the result the way it does for the arithmetic ops.
fn combine(op: &BinOp, acc: Value, current: Value) -> Value {
    match op {
        BinOp::Add => acc.zip_with(current, |a, b| a + b),
        BinOp::Sub => acc.zip_with(current, |a, b| a - b),
        BinOp::Mul => acc.zip_with(current, |a, b| a * b),
        BinOp::Rem => match current {
            Value::Known(_) => current,
            Value::Unknown => Value::Unknown,
        },
        // Filtered out by the caller; conservative fallback.
        BinOp::Unmodeled(_) => Value::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use drift_ir::Procedure;

    use super::*;

    struct Fixture {
        proc: Procedure,
        store: ValueStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                proc: Procedure::new("p"),
                store: ValueStore::new(),
            }
        }

        fn var(&mut self, name: &str) -> Place {
            Place::Var(self.proc.add_var(name))
        }

        fn temp(&mut self, name: &str) -> drift_ir::TempId {
            self.proc.add_temp(name)
        }
    }

    #[test]
    fn store_resolves_constants_and_places() {
        let mut fx = Fixture::new();
        let i = fx.var("i");
        let j = fx.var("j");
        apply(
            &mut fx.store,
            &Instruction::Store {
                src: Operand::Const(4.0),
                dest: i,
            },
        );
        apply(
            &mut fx.store,
            &Instruction::Store {
                src: Operand::Place(i),
                dest: j,
            },
        );
        assert_eq!(fx.store.read(j), Value::Known(4.0));
    }

    #[test]
    fn load_is_a_snapshot_not_an_alias() {
        let mut fx = Fixture::new();
        let i = fx.var("i");
        let t0 = fx.temp("t0");
        fx.store.write(i, Value::Known(1.0));
        apply(&mut fx.store, &Instruction::Load { src: i, dest: t0 });
        fx.store.write(i, Value::Known(9.0));
        assert_eq!(fx.store.read(Place::Temp(t0)), Value::Known(1.0));
    }

    #[test]
    fn arithmetic_folds_left_to_right() {
        let mut fx = Fixture::new();
        let t0 = fx.temp("t0");
        apply(
            &mut fx.store,
            &Instruction::Binary {
                op: BinOp::Sub,
                dest: t0,
                operands: vec![
                    Operand::Const(10.0),
                    Operand::Const(3.0),
                    Operand::Const(2.0),
                ],
            },
        );
        assert_eq!(fx.store.read(Place::Temp(t0)), Value::Known(5.0));
    }

    #[test]
    fn unknown_operands_poison_arithmetic() {
        let mut fx = Fixture::new();
        let ghost = fx.var("ghost");
        for op in [BinOp::Add, BinOp::Sub, BinOp::Mul] {
            let dest = fx.temp("t");
            apply(
                &mut fx.store,
                &Instruction::Binary {
                    op,
                    dest,
                    operands: vec![Operand::Const(1.0), Operand::Place(ghost)],
                },
            );
            assert_eq!(fx.store.read(Place::Temp(dest)), Value::Unknown);
        }
    }

    #[test]
    fn rem_passes_the_current_operand_through() {
        let mut fx = Fixture::new();
        let ghost = fx.var("ghost");

        // Known right-hand side wins even against an unknown accumulator.
        let t0 = fx.temp("t0");
        apply(
            &mut fx.store,
            &Instruction::Binary {
                op: BinOp::Rem,
                dest: t0,
                operands: vec![Operand::Place(ghost), Operand::Const(3.0)],
            },
        );
        assert_eq!(fx.store.read(Place::Temp(t0)), Value::Known(3.0));

        // A known accumulator is still discarded.
        let t1 = fx.temp("t1");
        apply(
            &mut fx.store,
            &Instruction::Binary {
                op: BinOp::Rem,
                dest: t1,
                operands: vec![Operand::Const(7.0), Operand::Place(ghost)],
            },
        );
        assert_eq!(fx.store.read(Place::Temp(t1)), Value::Unknown);
    }

    #[test]
    fn unmodeled_opcodes_leave_the_destination_absent() {
        let mut fx = Fixture::new();
        let t0 = fx.temp("t0");
        apply(
            &mut fx.store,
            &Instruction::Binary {
                op: BinOp::Unmodeled("xor".to_owned()),
                dest: t0,
                operands: vec![Operand::Const(1.0), Operand::Const(2.0)],
            },
        );
        // Absent cells read as unknown, but nothing was written.
        assert_eq!(fx.store.iter().count(), 0);
        assert_eq!(fx.store.read(Place::Temp(t0)), Value::Unknown);
    }
}
