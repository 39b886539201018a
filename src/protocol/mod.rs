//! Protocol module - wire format, request encoding, response decoding and
//! validation.
//!
//! This module implements the binary protocol spoken with the target board:
//! - request encoding (task count + C/T/D per task)
//! - fixed-length response decoding per metric mode
//! - batch validation (marker, ids, flags, verdict agreement)

mod decoder;
mod encoder;
mod validator;
mod wire_format;

pub use decoder::ResponseDecoder;
pub use encoder::encode_task_set;
pub use validator::{validate, ValidationRules};
pub use wire_format::{
    method_len, request_len, response_len, BASE_FIELDS, FIELD_SIZE, MAGIC, TASK_FIELDS,
};
