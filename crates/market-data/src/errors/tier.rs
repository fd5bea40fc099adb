/// How far a failure propagates.
///
/// | Tier | Operation result | Diagnostic event |
/// |------|------------------|------------------|
/// | `Hard` | Fails | Only for missing-array cases |
/// | `Soft` | Succeeds with the point dropped | Always |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureTier {
    /// Abort the enclosing operation and return the error to the caller.
    Hard,

    /// Drop the offending point, emit a warning and keep going.
    Soft,
}

/// Coarse classification of a [`MarketDataError`](super::MarketDataError).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Session acquisition failed.
    Auth,
    /// A request failed or the provider rejected it.
    Transport,
    /// A required structure is absent or misaligned.
    DataShape,
    /// A single point is unusable.
    DataPoint,
    /// Well-formed response, but no record matches.
    NotFound,
}
