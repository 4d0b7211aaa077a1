//! Registry wire format
//!
//! `[magic byte 0x00][schema id: u32 big-endian][payload]`

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::mdml::schema::error::{SchemaError, SchemaResult};

pub const MAGIC_BYTE: u8 = 0x00;
pub const HEADER_LEN: usize = 5;

/// Prefixes `payload` with the magic byte and `schema_id`
pub fn frame(schema_id: u32, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(MAGIC_BYTE);
    buf.put_u32(schema_id);
    buf.put_slice(payload);
    buf.freeze()
}

/// Splits a framed message into its schema id and payload
pub fn unframe(data: &[u8]) -> SchemaResult<(u32, &[u8])> {
    if data.len() < HEADER_LEN {
        return Err(SchemaError::Frame(format!(
            "{} bytes is too short to contain a schema id",
            data.len()
        )));
    }
    if data[0] != MAGIC_BYTE {
        return Err(SchemaError::Frame(format!(
            "invalid magic byte: expected 0x00, got 0x{:02x}",
            data[0]
        )));
    }
    let mut id_bytes = &data[1..HEADER_LEN];
    let schema_id = id_bytes.get_u32();
    Ok((schema_id, &data[HEADER_LEN..]))
}
