use drift_ir::{BlockId, LoopMap, Procedure};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::error::EngineError;
use crate::eval;
use crate::report::ReportSink;
use crate::separation::SeparationTracker;
use crate::store::ValueStore;

/// Default recursion bound for [`SeparationAnalysis`]; see
/// [`SeparationAnalysis::with_max_depth`].
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// Per-branch traversal state: the active-loop stack and the backedge
/// replay flag.
///
/// Every recursive descent operates on its own copy, so sibling branches
/// never observe each other's loop-stack mutations. The entry context has
/// an empty stack and the replay armed — the first loop a traversal meets
/// is allowed exactly one replay.
#[derive(Clone, Debug)]
pub struct TraversalContext {
    loop_stack: SmallVec<[BlockId; 4]>,
    replay_armed: bool,
}

impl Default for TraversalContext {
    fn default() -> Self {
        Self {
            loop_stack: SmallVec::new(),
            replay_armed: true,
        }
    }
}

/// The traversal controller: walks one procedure's blocks depth-first,
/// interpreting instructions and measuring the separation as it goes.
///
/// Loop exploration is bounded instead of iterated to a fixed point: each
/// loop body is entered at most twice per traversal into it (once on the
/// way in, once through the backedge replay), and an encounter with the
/// innermost active header closes the branch. This is deliberately an
/// approximation — it trades completeness for termination.
pub struct SeparationAnalysis<'p> {
    proc: &'p Procedure,
    loops: &'p LoopMap,
    store: ValueStore,
    tracker: SeparationTracker,
    max_depth: usize,
}

impl<'p> SeparationAnalysis<'p> {
    pub fn new(proc: &'p Procedure, loops: &'p LoopMap, name_a: &str, name_b: &str) -> Self {
        Self {
            proc,
            loops,
            store: ValueStore::new(),
            tracker: SeparationTracker::new(proc, name_a, name_b),
            max_depth: DEFAULT_DEPTH_LIMIT,
        }
    }

    /// Set the defensive recursion bound. Exceeding it surfaces as
    /// [`EngineError::DepthLimit`] instead of an unbounded stack when the
    /// CFG's cycles escape the loop model.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Walk the procedure from its entry block, delivering measurements to
    /// `sink`.
    pub fn run<R: ReportSink>(&mut self, sink: &mut R) -> Result<(), EngineError> {
        let entry = self.proc.entry().ok_or_else(|| EngineError::MissingEntry {
            name: self.proc.name().to_owned(),
        })?;
        self.visit(entry, TraversalContext::default(), 0, sink)
    }

    /// Cell state accumulated so far; mainly useful after [`Self::run`].
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    fn visit<R: ReportSink>(
        &mut self,
        block: BlockId,
        mut ctx: TraversalContext,
        depth: usize,
        sink: &mut R,
    ) -> Result<(), EngineError> {
        let info = self.proc.block(block);
        if depth >= self.max_depth {
            return Err(EngineError::DepthLimit {
                limit: self.max_depth,
                label: info.label.clone(),
            });
        }
        debug!(
            "visit ^{} (depth {depth}, loops {:?}, replay {})",
            info.label, ctx.loop_stack, ctx.replay_armed
        );
        sink.enter_block(&info.label);

        if self.loops.is_header(block) {
            ctx.loop_stack.push(block);
        }
        if self.loops.is_exit(block) {
            if ctx.loop_stack.pop().is_none() {
                warn!("loop exit '^{}' reached with no active loop", info.label);
            }
            // Re-arm the replay for any enclosing loop.
            ctx.replay_armed = true;
        }

        for inst in &info.instructions {
            eval::apply(&mut self.store, inst);
            sink.after_instruction(&self.tracker.measure(&self.store));
        }

        for &succ in info.terminator.successors() {
            let to_exit = self.loops.is_exit(succ);
            if to_exit && !ctx.replay_armed {
                // The one replay through this loop is already spent; bound
                // the exploration here instead of converging.
                debug!("^{}: replay spent, not descending into exit", info.label);
                return Ok(());
            } else if to_exit && !ctx.loop_stack.is_empty() {
                // Follow the exit exactly once, with the replay disarmed on
                // this branch only.
                let mut branch = ctx.clone();
                branch.replay_armed = false;
                self.visit(succ, branch, depth + 1, sink)?;
            } else if ctx.loop_stack.last() == Some(&succ) {
                // Back at the innermost active header: this branch is done.
                debug!("^{}: back edge to active header, closing branch", info.label);
                return Ok(());
            } else {
                self.visit(succ, ctx.clone(), depth + 1, sink)?;
            }
        }

        sink.after_block(&info.label, &self.tracker.measure(&self.store));
        Ok(())
    }
}
