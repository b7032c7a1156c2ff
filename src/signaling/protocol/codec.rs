use super::{
    Envelope, IceCandidate, MsgType, ProtoError, SessionDescription, SignalingMsg,
};
use byteorder::{BigEndian, ByteOrder};
use std::str;

// ---- Encode to body bytes -------------------------------------------------

pub fn encode_msg(msg: &SignalingMsg) -> Result<(MsgType, Vec<u8>), ProtoError> {
    let mut body = Vec::new();

    match msg {
        SignalingMsg::Register { identity } => {
            put_str16(&mut body, identity)?;
        }
        SignalingMsg::Envelope(env) => encode_envelope(&mut body, env)?,
        SignalingMsg::Ping { nonce } | SignalingMsg::Pong { nonce } => {
            put_u64(&mut body, *nonce);
        }
    }

    Ok((msg.msg_type(), body))
}

fn encode_envelope(body: &mut Vec<u8>, env: &Envelope) -> Result<(), ProtoError> {
    put_str16(body, env.sender_id())?;
    put_str16(body, env.receiver_id())?;

    match env {
        Envelope::Offer { offer, .. } => put_description(body, offer)?,
        Envelope::Answer {
            answer, accepted, ..
        } => {
            put_u8(body, u8::from(*accepted));
            match answer {
                Some(desc) => {
                    put_u8(body, 1);
                    put_description(body, desc)?;
                }
                None => put_u8(body, 0),
            }
        }
        Envelope::Candidate { candidate, .. } => {
            put_str32(body, &candidate.candidate)?;
            match &candidate.sdp_mid {
                Some(mid) => {
                    put_u8(body, 1);
                    put_str16(body, mid)?;
                }
                None => put_u8(body, 0),
            }
            match candidate.sdp_mline_index {
                Some(idx) => {
                    put_u8(body, 1);
                    put_u16(body, idx);
                }
                None => put_u8(body, 0),
            }
        }
        Envelope::Terminate { .. } => {}
    }
    Ok(())
}

// ---- Decode from body bytes ----------------------------------------------

pub fn decode_msg(msg_type: MsgType, body: &[u8]) -> Result<SignalingMsg, ProtoError> {
    let mut cursor = Cursor::new(body);

    let msg = match msg_type {
        MsgType::Register => SignalingMsg::Register {
            identity: cursor.get_str16()?.to_owned(),
        },
        MsgType::Offer | MsgType::Answer | MsgType::Candidate | MsgType::CallEnded => {
            SignalingMsg::Envelope(decode_envelope(msg_type, &mut cursor)?)
        }
        MsgType::Ping => SignalingMsg::Ping {
            nonce: cursor.get_u64()?,
        },
        MsgType::Pong => SignalingMsg::Pong {
            nonce: cursor.get_u64()?,
        },
    };

    cursor.finish()?;
    Ok(msg)
}

fn decode_envelope(msg_type: MsgType, cursor: &mut Cursor<'_>) -> Result<Envelope, ProtoError> {
    let sender_id = cursor.get_str16()?.to_owned();
    let receiver_id = cursor.get_str16()?.to_owned();

    let env = match msg_type {
        MsgType::Offer => Envelope::Offer {
            sender_id,
            receiver_id,
            offer: cursor.get_description()?,
        },
        MsgType::Answer => {
            let accepted = cursor.get_bool()?;
            let answer = if cursor.get_bool()? {
                Some(cursor.get_description()?)
            } else {
                None
            };
            Envelope::Answer {
                sender_id,
                receiver_id,
                answer,
                accepted,
            }
        }
        MsgType::Candidate => {
            let candidate = cursor.get_str32()?.to_owned();
            let sdp_mid = if cursor.get_bool()? {
                Some(cursor.get_str16()?.to_owned())
            } else {
                None
            };
            let sdp_mline_index = if cursor.get_bool()? {
                Some(cursor.get_u16()?)
            } else {
                None
            };
            Envelope::Candidate {
                sender_id,
                receiver_id,
                candidate: IceCandidate {
                    candidate,
                    sdp_mid,
                    sdp_mline_index,
                },
            }
        }
        MsgType::CallEnded => Envelope::Terminate {
            sender_id,
            receiver_id,
        },
        MsgType::Register | MsgType::Ping | MsgType::Pong => {
            return Err(ProtoError::InvalidFormat("not an envelope type"));
        }
    };
    Ok(env)
}

// ---- Primitive write helpers ---------------------------------------------

fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// str16 = u16 length + UTF-8 bytes
fn put_str16(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    let len = s.len();
    let len16 = u16::try_from(len).map_err(|_| ProtoError::StringTooLong {
        max: u16::MAX as usize,
        actual: len,
    })?;
    put_u16(buf, len16);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// str32 = u32 length + UTF-8 bytes (SDP bodies, candidate lines)
fn put_str32(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    let len = s.len();
    let len32 = u32::try_from(len).map_err(|_| ProtoError::StringTooLong {
        max: u32::MAX as usize,
        actual: len,
    })?;
    put_u32(buf, len32);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// desc = str16 type + str32 sdp
fn put_description(buf: &mut Vec<u8>, desc: &SessionDescription) -> Result<(), ProtoError> {
    put_str16(buf, &desc.sdp_type)?;
    put_str32(buf, &desc.sdp)
}

// ---- Cursor for decoding --------------------------------------------------

#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtoError> {
        if self.buf.len() < len {
            return Err(ProtoError::Truncated);
        }
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    fn get_u8(&mut self) -> Result<u8, ProtoError> {
        Ok(self.get_bytes(1)?[0])
    }

    /// Strict 0/1 flag.
    fn get_bool(&mut self) -> Result<bool, ProtoError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ProtoError::InvalidFormat("flag byte must be 0 or 1")),
        }
    }

    fn get_u16(&mut self) -> Result<u16, ProtoError> {
        Ok(BigEndian::read_u16(self.get_bytes(2)?))
    }

    fn get_u32(&mut self) -> Result<u32, ProtoError> {
        Ok(BigEndian::read_u32(self.get_bytes(4)?))
    }

    fn get_u64(&mut self) -> Result<u64, ProtoError> {
        Ok(BigEndian::read_u64(self.get_bytes(8)?))
    }

    fn get_str16(&mut self) -> Result<&'a str, ProtoError> {
        let len = self.get_u16()? as usize;
        let bytes = self.get_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
    }

    fn get_str32(&mut self) -> Result<&'a str, ProtoError> {
        let len = self.get_u32()? as usize;
        let bytes = self.get_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
    }

    fn get_description(&mut self) -> Result<SessionDescription, ProtoError> {
        let sdp_type = self.get_str16()?.to_owned();
        let sdp = self.get_str32()?.to_owned();
        Ok(SessionDescription { sdp_type, sdp })
    }

    /// Enforce that we've consumed the whole body.
    fn finish(self) -> Result<(), ProtoError> {
        if !self.buf.is_empty() {
            Err(ProtoError::InvalidFormat("trailing bytes in message body"))
        } else {
            Ok(())
        }
    }
}
