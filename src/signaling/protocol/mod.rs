//! Wire protocol spoken between call clients and the relay.
//!
//! Every message travels in one frame:
//!
//! ```text
//! [ver: u8][msg_type: u8][flags: u16][body_len: u32 BE][body ...]
//! ```
//!
//! The body layout per message type lives in [`codec`].

pub mod codec;
pub mod constants;
pub mod errors;
pub mod framing;
pub mod msg;
pub mod msg_type;
pub mod types;

pub use codec::{decode_msg, encode_msg};
pub use constants::{MAX_BODY_LEN, PROTO_VERSION};
pub use errors::{FrameError, ProtoError};
pub use framing::{FrameReader, read_msg, write_frame, write_msg};
pub use msg::{Envelope, SignalingMsg};
pub use msg_type::MsgType;
pub use types::{IceCandidate, ParticipantId, SdpType, SessionDescription};
