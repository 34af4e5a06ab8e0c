use thiserror::Error;

/// Errors actually returned by a `Result`-returning function in this
/// crate. Other rows of spec.md §7's error table (metadata miss, invalid
/// value, queue-full, cache-not-ready, config reload failure) are handled
/// as local control flow at the point they occur — logged and counted via
/// the metrics in `metrics.rs` — rather than surfaced through this type,
/// since nothing downstream of those sites needs to branch on them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("append is missing the __name__ label")]
    MissingName,
    #[error("batch has no sample with both pre-relabel job and instance set")]
    NoTargetInfo,
}
