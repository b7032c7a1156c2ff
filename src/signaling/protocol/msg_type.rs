// ---- Message type byte ----------------------------------------------------

use crate::signaling::protocol::ProtoError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MsgType {
    Register = 0x01,

    Offer = 0x20,
    Answer = 0x21,
    Candidate = 0x22,
    CallEnded = 0x24,

    Ping = 0x30,
    Pong = 0x31,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Result<MsgType, ProtoError> {
        use MsgType::*;
        match v {
            0x01 => Ok(Register),
            0x20 => Ok(Offer),
            0x21 => Ok(Answer),
            0x22 => Ok(Candidate),
            0x24 => Ok(CallEnded),
            0x30 => Ok(Ping),
            0x31 => Ok(Pong),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Event name used in logs (`video-call-offer`, `call-ended`, ...).
    pub fn event_name(self) -> &'static str {
        match self {
            MsgType::Register => "register",
            MsgType::Offer => "video-call-offer",
            MsgType::Answer => "video-call-answer",
            MsgType::Candidate => "ice-candidate",
            MsgType::CallEnded => "call-ended",
            MsgType::Ping => "ping",
            MsgType::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_bytes_are_stable() {
        for t in [
            MsgType::Register,
            MsgType::Offer,
            MsgType::Answer,
            MsgType::Candidate,
            MsgType::CallEnded,
            MsgType::Ping,
            MsgType::Pong,
        ] {
            assert_eq!(MsgType::from_u8(t.as_u8()), Ok(t));
        }
        assert_eq!(MsgType::from_u8(0x23), Err(ProtoError::UnknownType(0x23)));
    }
}
