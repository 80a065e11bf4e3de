//! Shared decoding layer for the OBJ/MTL pipelines.
//! Everything here works on borrowed `&str` slices; nothing allocates except
//! error payloads.

pub mod cursor;
pub mod error;
pub mod face;
pub mod number;
pub mod path;

pub use cursor::{Cursor, classify_line};
pub use error::{DecodeError, DecodeResult};
pub use face::{FaceCorner, decode_face_corner};
pub use number::{decode_float, decode_floats, decode_int, decode_int_trimmed};
pub use path::file_extension_matches;
