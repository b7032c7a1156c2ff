use super::constants::HEADER_LEN;
use super::{FrameError, MAX_BODY_LEN, MsgType, PROTO_VERSION, ProtoError, SignalingMsg};
use super::{decode_msg, encode_msg};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read, Write};

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, msg_type: MsgType, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body too large"))?;
    let mut header = [0u8; HEADER_LEN];
    header[0] = PROTO_VERSION;
    header[1] = msg_type.as_u8();
    BigEndian::write_u32(&mut header[4..8], len);
    w.write_all(&header)?;
    w.write_all(body)?;
    w.flush()?;
    Ok(())
}

/// Validate a header and return (type, body length).
fn parse_header(header: &[u8], max_body: usize) -> Result<(MsgType, usize), FrameError> {
    if header[0] != PROTO_VERSION {
        return Err(ProtoError::InvalidFormat("bad proto version").into());
    }
    let msg_type = MsgType::from_u8(header[1])?;
    // flags ignored for now
    let len = BigEndian::read_u32(&header[4..8]) as usize;
    if len > max_body {
        return Err(ProtoError::TooLarge.into());
    }
    Ok((msg_type, len))
}

/// Read a single frame, enforcing a max body length. Blocks until complete.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<(MsgType, Vec<u8>), FrameError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header)?;
    let (msg_type, len) = parse_header(&header, max_body)?;

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;
    Ok((msg_type, body))
}

/// Encode and write one message. Bodies over `MAX_BODY_LEN` are rejected
/// before anything reaches the stream.
pub fn write_msg<W: Write>(w: &mut W, msg: &SignalingMsg) -> Result<(), FrameError> {
    let (msg_type, body) = encode_msg(msg)?;
    if body.len() > MAX_BODY_LEN {
        return Err(ProtoError::TooLarge.into());
    }
    write_frame(w, msg_type, &body)?;
    Ok(())
}

/// Blocking read of one message.
pub fn read_msg<R: Read>(r: &mut R) -> Result<SignalingMsg, FrameError> {
    let (msg_type, body) = read_frame(r, MAX_BODY_LEN)?;
    Ok(decode_msg(msg_type, &body)?)
}

/// Incremental frame reader for streams with a read timeout.
///
/// Bytes are accumulated across calls, so a timeout in the middle of a frame
/// never loses data. This lets one thread alternate between reading and
/// writing on a stream that cannot be split (TLS).
#[derive(Debug)]
pub struct FrameReader {
    buf: Vec<u8>,
    max_body: usize,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(MAX_BODY_LEN)
    }
}

impl FrameReader {
    pub fn new(max_body: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_body,
        }
    }

    /// Returns the next complete message, `Ok(None)` if the stream had no
    /// complete frame yet (timeout / would block).
    ///
    /// A clean EOF is reported as `FrameError::Io(UnexpectedEof)`.
    pub fn poll<R: Read>(&mut self, r: &mut R) -> Result<Option<SignalingMsg>, FrameError> {
        if let Some(msg) = self.try_parse()? {
            return Ok(Some(msg));
        }

        let mut chunk = [0u8; 4096];
        match r.read(&mut chunk) {
            Ok(0) => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed connection").into()),
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                self.try_parse()
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_parse(&mut self) -> Result<Option<SignalingMsg>, FrameError> {
        if self.buf.len() < HEADER_LEN {
            return Ok(None);
        }
        let (msg_type, len) = parse_header(&self.buf[..HEADER_LEN], self.max_body)?;
        let total = HEADER_LEN + len;
        if self.buf.len() < total {
            return Ok(None);
        }

        let msg = decode_msg(msg_type, &self.buf[HEADER_LEN..total]);
        self.buf.drain(..total);
        Ok(Some(msg?))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::{Envelope, SessionDescription};
    use std::io::Cursor;

    /// Hands out at most `step` bytes per read, then reports a timeout once.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        stall: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            if self.stall {
                self.stall = false;
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "no data yet"));
            }
            self.stall = true;
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            let n = self.step.min(out.len()).min(self.data.len() - self.pos);
            out[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn terminate() -> SignalingMsg {
        SignalingMsg::Envelope(Envelope::Terminate {
            sender_id: "u1".into(),
            receiver_id: "s1".into(),
        })
    }

    #[test]
    fn blocking_read_write_roundtrip() {
        let mut wire = Vec::new();
        write_msg(&mut wire, &terminate()).unwrap();
        write_msg(&mut wire, &SignalingMsg::Pong { nonce: 9 }).unwrap();

        let mut r = Cursor::new(wire);
        assert_eq!(read_msg(&mut r).unwrap(), terminate());
        assert_eq!(read_msg(&mut r).unwrap(), SignalingMsg::Pong { nonce: 9 });
    }

    #[test]
    fn frame_reader_reassembles_across_timeouts() {
        let mut wire = Vec::new();
        write_msg(&mut wire, &terminate()).unwrap();
        write_msg(&mut wire, &SignalingMsg::Ping { nonce: 1 }).unwrap();

        let mut src = Trickle {
            data: wire,
            pos: 0,
            step: 3,
            stall: false,
        };
        let mut reader = FrameReader::default();
        let mut got = Vec::new();

        for _ in 0..200 {
            match reader.poll(&mut src) {
                Ok(Some(msg)) => got.push(msg),
                Ok(None) => {}
                Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(got, vec![terminate(), SignalingMsg::Ping { nonce: 1 }]);
    }

    #[test]
    fn bad_version_is_a_protocol_error() {
        let mut wire = Vec::new();
        write_msg(&mut wire, &SignalingMsg::Ping { nonce: 1 }).unwrap();
        wire[0] = 9;
        let err = read_msg(&mut Cursor::new(wire)).expect_err("bad version");
        assert!(matches!(err, FrameError::Proto(ProtoError::InvalidFormat(_))));
    }

    #[test]
    fn oversized_message_is_not_written() {
        let huge = SignalingMsg::Envelope(Envelope::Offer {
            sender_id: "u1".into(),
            receiver_id: "s1".into(),
            offer: SessionDescription::offer("a".repeat(MAX_BODY_LEN)),
        });
        let mut wire = Vec::new();
        let err = write_msg(&mut wire, &huge).expect_err("too large");
        assert!(matches!(err, FrameError::Proto(ProtoError::TooLarge)));
        assert!(wire.is_empty());
    }

    #[test]
    fn oversized_frame_is_rejected_before_reading_body() {
        let mut header = vec![PROTO_VERSION, MsgType::Register.as_u8(), 0, 0];
        header.extend_from_slice(&(MAX_BODY_LEN as u32 + 1).to_be_bytes());
        let mut reader = FrameReader::default();
        let err = reader.poll(&mut Cursor::new(header)).expect_err("too large");
        assert!(matches!(err, FrameError::Proto(ProtoError::TooLarge)));
    }
}
