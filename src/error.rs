use thiserror::Error;

/// Error taxonomy for the filter pipeline: I/O, Format, Type, and Encoding
/// failures, per the fatal/recoverable split the pipeline enforces.
#[derive(Error, Debug)]
pub enum HprofRedactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported id size: {0} (must be 4 or 8)")]
    UnsupportedIdSize(u32),

    #[error("unsupported record tag: {0:#04x}")]
    UnsupportedRecordTag(u8),

    #[error("unsupported heap dump subrecord tag: {0:#04x}")]
    UnsupportedSubRecordTag(u8),

    #[error("unsupported primitive type tag: {0:#04x}")]
    UnsupportedPrimitiveType(u8),

    #[error("{record} length mismatch: expected {expected}, got {actual}")]
    RecordLengthMismatch {
        record: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("heap dump segment length mismatch: {0} byte(s) remaining after walking subrecords")]
    SegmentLengthMismatch(u64),

    #[error(
        "instance dump data length {declared} does not match flattened layout size {computed} for class {class_id:#x}"
    )]
    InstanceLayoutMismatch {
        class_id: u64,
        declared: u32,
        computed: u32,
    },

    #[error("utf8 record body would exceed u32::MAX after transformation")]
    Utf8LengthOverflow,

    #[error("invalid modified UTF-8: {0}")]
    InvalidMutf8(String),

    #[error("unknown transformer name: {0:?}")]
    UnknownTransformer(String),

    #[error("input source must be re-openable for a two-pass filter, not a one-shot pipe")]
    NotReopenable,
}

pub type Result<T> = std::result::Result<T, HprofRedactError>;
