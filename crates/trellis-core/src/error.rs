/// Argument-validation failures surfaced at public setters.
///
/// Everything else in the failure taxonomy (stale indices/ids, missing
/// sources, pre-layout geometry) degrades to sentinels or no-ops instead of
/// reaching this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("fixed item height must be positive, got {0}")]
    InvalidItemHeight(f32),
}
