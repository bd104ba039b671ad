use thiserror::Error;

/// Errors produced while decoding bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bytes before the value was complete
    #[error("Unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    /// The bytes were present but do not encode a valid value of the type
    #[error("Invalid value for {type_name}")]
    InvalidValue { type_name: &'static str },
}
