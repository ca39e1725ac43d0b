mod inst;
mod loops;
mod print;
mod proc;

pub use inst::{BinOp, Instruction, Operand, Place};
pub use loops::{LoopInfo, LoopMap, StructureIssue};
pub use proc::{BlockId, BlockInfo, Procedure, Program, TempId, Terminator, VarId};

pub use smallvec::{self, SmallVec};
