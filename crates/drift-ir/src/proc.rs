use smallvec::SmallVec;

use crate::inst::{Instruction, Place};

macro_rules! arena_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(raw: usize) -> Self {
                Self(raw as u32)
            }

            /// Raw arena index.
            pub fn raw(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id! {
    /// A unique identifier for a basic block within one [`Procedure`].
    BlockId
}

arena_id! {
    /// A user variable introduced by an `alloc` instruction.
    VarId
}

arena_id! {
    /// An anonymous temporary produced by a `load` or binary instruction.
    ///
    /// Temporaries live in their own namespace, so a temporary identity can
    /// never collide with a user variable name.
    TempId
}

/// How a block hands control to its successors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    /// Transfer to one of the listed blocks. Multiple targets are
    /// unconditional alternatives; the analysis explores every one.
    Branch(SmallVec<[BlockId; 2]>),
    /// Leave the procedure. No successors.
    Return,
}

impl Terminator {
    pub fn successors(&self) -> &[BlockId] {
        match self {
            Terminator::Branch(targets) => targets,
            Terminator::Return => &[],
        }
    }
}

/// A straight-line sequence of instructions with a single entry and one
/// terminator naming successor blocks.
#[derive(Clone, Debug)]
pub struct BlockInfo {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Terminator,
}

/// One procedure's control-flow graph plus its variable and temporary
/// name tables. The first pushed block is the entry.
#[derive(Clone, Debug, Default)]
pub struct Procedure {
    name: String,
    blocks: Vec<BlockInfo>,
    var_names: Vec<String>,
    temp_names: Vec<String>,
}

impl Procedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            var_names: Vec::new(),
            temp_names: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The entry block, or `None` for an empty procedure.
    pub fn entry(&self) -> Option<BlockId> {
        (!self.blocks.is_empty()).then(|| BlockId::new(0))
    }

    /// Append an empty block ending in [`Terminator::Return`]. The caller
    /// fills in instructions and the real terminator via [`Self::block_mut`].
    pub fn push_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(BlockInfo {
            label: label.into(),
            instructions: Vec::new(),
            terminator: Terminator::Return,
        });
        id
    }

    pub fn block(&self, id: BlockId) -> &BlockInfo {
        &self.blocks[id.raw()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BlockInfo {
        &mut self.blocks[id.raw()]
    }

    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + use<> {
        (0..self.blocks.len()).map(BlockId::new)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Intern a user variable, returning the existing id if the name is
    /// already known.
    pub fn add_var(&mut self, name: impl Into<String>) -> VarId {
        let name = name.into();
        if let Some(existing) = self.find_var(&name) {
            return existing;
        }
        let id = VarId::new(self.var_names.len());
        self.var_names.push(name);
        id
    }

    /// Mint a fresh temporary identity. Names are kept for diagnostics only;
    /// the id is the identity.
    pub fn add_temp(&mut self, name: impl Into<String>) -> TempId {
        let id = TempId::new(self.temp_names.len());
        self.temp_names.push(name.into());
        id
    }

    pub fn find_var(&self, name: &str) -> Option<VarId> {
        self.var_names
            .iter()
            .position(|n| n == name)
            .map(VarId::new)
    }

    pub fn find_temp(&self, name: &str) -> Option<TempId> {
        self.temp_names
            .iter()
            .position(|n| n == name)
            .map(TempId::new)
    }

    pub fn var_name(&self, id: VarId) -> &str {
        &self.var_names[id.raw()]
    }

    pub fn temp_name(&self, id: TempId) -> &str {
        &self.temp_names[id.raw()]
    }

    pub fn place_name(&self, place: Place) -> &str {
        match place {
            Place::Var(v) => self.var_name(v),
            Place::Temp(t) => self.temp_name(t),
        }
    }
}

/// An ordered collection of procedures as produced by the program loader.
#[derive(Clone, Debug, Default)]
pub struct Program {
    procedures: Vec<Procedure>,
}

impl Program {
    pub fn new(procedures: Vec<Procedure>) -> Self {
        Self { procedures }
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }

    pub fn find(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.name() == name)
    }
}
