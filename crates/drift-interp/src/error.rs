/// Error type for traversal failures.
///
/// Missing runtime information is never an error (it degrades to unknown);
/// these variants cover the cases where the walk itself cannot proceed.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The defensive recursion bound tripped — the CFG contains a cycle the
    /// loop model does not recognize (irreducible or unstructured flow).
    #[error("traversal depth limit of {limit} exceeded at block '^{label}'")]
    DepthLimit { limit: usize, label: String },
    /// The procedure has no blocks to analyze.
    #[error("procedure '@{name}' has no entry block")]
    MissingEntry { name: String },
}
