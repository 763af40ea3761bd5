//! Wire framing: the legacy NUL-terminated packet frame, plus the
//! length-prefixed helper codec used inside certain payloads.
//!
//! The two codecs are never mixed within a single field (see design notes).

use std::io::prelude::*;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ProtocolError, Result};

/// The untyped (tag, payload) pair produced by the frame codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub tag: u16,
    pub payload: String,
}

impl RawPacket {
    pub fn new(tag: u16, payload: impl Into<String>) -> RawPacket {
        RawPacket { tag, payload: payload.into() }
    }
}

pub trait ReadExactExt: Read {
    /// Returns a `Vec<u8>` containing the next `len` bytes in the reader.
    fn read_exact_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut n_read = 0usize;
        while n_read < buf.len() {
            match self.read(&mut buf[n_read..])? {
                0 => return Err(ProtocolError::Frame { bytes_read: n_read }),
                n => n_read += n,
            }
        }
        Ok(buf)
    }
}

impl<R: Read + ?Sized> ReadExactExt for R {}

/// Reads one tag byte followed by a NUL-terminated legacy string.
pub fn read_frame<R: Read + ?Sized>(src: &mut R) -> Result<RawPacket> {
    let mut tag_buf = [0u8; 1];
    match src.read(&mut tag_buf)? {
        0 => return Err(ProtocolError::Transport(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed"))),
        _ => {}
    }
    let tag = tag_buf[0] as u16;

    let mut payload = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match src.read(&mut byte)? {
            0 => return Err(ProtocolError::Frame { bytes_read: payload.len() + 1 }),
            _ => {}
        }
        if byte[0] == 0 {
            break;
        }
        payload.push(byte[0]);
    }

    let payload = String::from_utf8(payload)
        .map_err(|_| ProtocolError::Malformed { variant: "frame", raw: String::new() })?;
    Ok(RawPacket::new(tag, payload))
}

/// Writes one tag byte followed by a NUL-terminated legacy string.
pub fn write_frame<W: Write + ?Sized>(dst: &mut W, packet: &RawPacket) -> Result<()> {
    dst.write_all(&[packet.tag as u8])?;
    dst.write_all(packet.payload.as_bytes())?;
    dst.write_all(&[0u8])?;
    Ok(())
}

/// Length-prefixed ("utility") string codec: an unsigned 64-bit
/// little-endian length followed by the UTF-8 bytes. Distinct from the
/// NUL-terminated legacy string used for frame payloads themselves.
pub fn write_utility_string<W: Write + ?Sized>(dst: &mut W, value: &str) -> Result<()> {
    dst.write_u64::<LittleEndian>(value.len() as u64)?;
    dst.write_all(value.as_bytes())?;
    Ok(())
}

pub fn read_utility_string<R: Read + ?Sized>(src: &mut R) -> Result<String> {
    let len = src.read_u64::<LittleEndian>()?;
    let bytes = src.read_exact_vec(len as usize)?;
    String::from_utf8(bytes).map_err(|_| ProtocolError::Malformed { variant: "utility_string", raw: String::new() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_round_trip() {
        let packet = RawPacket::new(0x04, "alice;2.0.6");
        let mut buf = Vec::new();
        write_frame(&mut buf, &packet).unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn frame_does_not_bleed_across_boundaries() {
        let a = RawPacket::new(0x02, "auto");
        let b = RawPacket::new(0x10, "");
        let c = RawPacket::new(0x01, "Many bad packets");

        let mut buf = Vec::new();
        for packet in [&a, &b, &c] {
            write_frame(&mut buf, packet).unwrap();
        }

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), a);
        assert_eq!(read_frame(&mut cursor).unwrap(), b);
        assert_eq!(read_frame(&mut cursor).unwrap(), c);
    }

    #[test]
    fn frame_empty_payload() {
        let packet = RawPacket::new(0x11, "");
        let mut buf = Vec::new();
        write_frame(&mut buf, &packet).unwrap();
        assert_eq!(buf, vec![0x11, 0]);
    }

    #[test]
    fn premature_eof_mid_frame_is_fatal() {
        // tag byte with no terminating NUL
        let mut cursor = Cursor::new(vec![0x04u8, b'a', b'b']);
        let err = read_frame(&mut cursor).unwrap_err();
        assert!(matches!(err, ProtocolError::Frame { .. }));
    }

    #[test]
    fn utility_string_round_trip() {
        let mut buf = Vec::new();
        write_utility_string(&mut buf, "hello world").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_utility_string(&mut cursor).unwrap(), "hello world");
    }
}
