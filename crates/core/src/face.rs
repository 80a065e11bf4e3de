//! Face-corner tokens: `v`, `v/vt`, `v/vt/vn` and `v//vn`.

use crate::cursor::Cursor;
use crate::error::{DecodeError, DecodeResult};
use crate::number::decode_int;

/// One face corner as 1-based (position, uv, normal) indices.
/// `0` marks an absent component; OBJ indices never use 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceCorner {
    pub position: i32,
    pub uv: i32,
    pub normal: i32,
}

impl FaceCorner {
    pub const fn new(position: i32, uv: i32, normal: i32) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }

    #[inline]
    pub fn has_uv(&self) -> bool {
        self.uv != 0
    }

    #[inline]
    pub fn has_normal(&self) -> bool {
        self.normal != 0
    }
}

impl From<(i32, i32, i32)> for FaceCorner {
    fn from((position, uv, normal): (i32, i32, i32)) -> Self {
        Self::new(position, uv, normal)
    }
}

/// Decode one corner token. Negative components are relative to the end and
/// resolve to `vertex_count + value`, using the count at the time the face
/// line is read.
pub fn decode_face_corner(token: &str, vertex_count: usize) -> DecodeResult<FaceCorner> {
    let mut cursor = Cursor::new(token.trim());

    let position = cursor.take_until('/');
    if position.is_empty() {
        return Err(if token.trim().is_empty() {
            DecodeError::EmptyToken
        } else {
            DecodeError::invalid(token)
        });
    }
    let position = resolve(decode_int(position)?, vertex_count, position)?;

    // `v//vn`: the character right after the first slash is another slash.
    if cursor.eat('/') {
        let normal = component(cursor.rest(), vertex_count)?;
        return Ok(FaceCorner::new(position, 0, normal));
    }

    let uv = component(cursor.take_until('/'), vertex_count)?;
    let normal = cursor.take_until('/');
    if !cursor.is_empty() {
        // More than three components.
        return Err(DecodeError::invalid(token));
    }
    let normal = component(normal, vertex_count)?;

    Ok(FaceCorner::new(position, uv, normal))
}

/// Optional component; empty means absent.
fn component(token: &str, vertex_count: usize) -> DecodeResult<i32> {
    if token.is_empty() {
        return Ok(0);
    }
    resolve(decode_int(token)?, vertex_count, token)
}

fn resolve(raw: i32, vertex_count: usize, token: &str) -> DecodeResult<i32> {
    if raw >= 0 {
        return Ok(raw);
    }
    let resolved = i64::try_from(vertex_count).unwrap_or(i64::MAX) + i64::from(raw);
    i32::try_from(resolved).map_err(|_| DecodeError::Overflow {
        token: token.to_owned(),
    })
}
