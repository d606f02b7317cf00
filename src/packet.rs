//! Wire format for the four packet kinds exchanged with clients.
//!
//! All multi-byte integers are big-endian. Strings are NUL-terminated.
//! No I/O happens here.

use crate::BlockNumber;
use crate::BLOCK_SIZE;
use crate::DATAGRAM_SIZE;
use bytes::Buf;
use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

const OP_RRQ: u16 = 1;
const OP_WRQ: u16 = 2;
const OP_DATA: u16 = 3;
const OP_ACK: u16 = 4;
const OP_ERROR: u16 = 5;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("datagram too short: {0} bytes")]
    Truncated(usize),
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u16),
    #[error("write requests are not supported")]
    WriteRequest,
    #[error("missing NUL terminator")]
    MissingTerminator,
    #[error("string is not valid UTF-8")]
    InvalidString,
    #[error("data payload of {0} bytes exceeds the block size")]
    OversizedPayload(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    ReadRequest {
        filename: String,
        mode: String,
    },
    Data {
        block: BlockNumber,
        payload: Bytes,
    },
    Ack {
        block: BlockNumber,
    },
    Error {
        code: u16,
        message: String,
    },
}

impl Packet {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(DATAGRAM_SIZE);
        match self {
            Packet::ReadRequest { filename, mode } => {
                buf.put_u16(OP_RRQ);
                buf.put_slice(filename.as_bytes());
                buf.put_u8(0);
                buf.put_slice(mode.as_bytes());
                buf.put_u8(0);
            }
            Packet::Data { block, payload } => {
                buf.put_u16(OP_DATA);
                buf.put_u16(*block);
                buf.put_slice(payload);
            }
            Packet::Ack { block } => {
                buf.put_u16(OP_ACK);
                buf.put_u16(*block);
            }
            Packet::Error { code, message } => {
                buf.put_u16(OP_ERROR);
                buf.put_u16(*code);
                buf.put_slice(message.as_bytes());
                buf.put_u8(0);
            }
        }
        buf.freeze()
    }

    pub fn decode(datagram: &[u8]) -> Result<Self, DecodeError> {
        let len = datagram.len();
        if len < 2 {
            return Err(DecodeError::Truncated(len));
        }
        let mut rest = datagram;
        match rest.get_u16() {
            OP_RRQ => {
                let (filename, rest) = take_string(rest)?;
                let (mode, _) = take_string(rest)?;
                Ok(Packet::ReadRequest { filename, mode })
            }
            OP_WRQ => Err(DecodeError::WriteRequest),
            OP_DATA => {
                if rest.remaining() < 2 {
                    return Err(DecodeError::Truncated(len));
                }
                let block = rest.get_u16();
                if rest.remaining() > BLOCK_SIZE {
                    return Err(DecodeError::OversizedPayload(rest.remaining()));
                }
                Ok(Packet::Data {
                    block,
                    payload: Bytes::copy_from_slice(rest),
                })
            }
            OP_ACK => {
                if rest.remaining() < 2 {
                    return Err(DecodeError::Truncated(len));
                }
                Ok(Packet::Ack {
                    block: rest.get_u16(),
                })
            }
            OP_ERROR => {
                if rest.remaining() < 2 {
                    return Err(DecodeError::Truncated(len));
                }
                let code = rest.get_u16();
                let (message, _) = take_string(rest)?;
                Ok(Packet::Error { code, message })
            }
            opcode => Err(DecodeError::UnknownOpcode(opcode)),
        }
    }
}

fn take_string(buf: &[u8]) -> Result<(String, &[u8]), DecodeError> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(DecodeError::MissingTerminator)?;
    let s = std::str::from_utf8(&buf[..nul]).map_err(|_| DecodeError::InvalidString)?;
    Ok((s.to_owned(), &buf[nul + 1..]))
}
