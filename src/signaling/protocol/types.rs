use std::fmt;
use std::str::FromStr;

// ---- Basic types ----------------------------------------------------------

/// Stable identity handed out by the authentication service (user or
/// specialist id). Opaque to the relay.
pub type ParticipantId = String;

// ---- Session descriptions -------------------------------------------------

/// Closed set of session description kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
    PrAnswer,
    Rollback,
}

impl SdpType {
    pub fn as_str(self) -> &'static str {
        match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
            SdpType::PrAnswer => "pranswer",
            SdpType::Rollback => "rollback",
        }
    }
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SdpType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offer" => Ok(SdpType::Offer),
            "answer" => Ok(SdpType::Answer),
            "pranswer" => Ok(SdpType::PrAnswer),
            "rollback" => Ok(SdpType::Rollback),
            _ => Err(()),
        }
    }
}

/// Session description as it travels through the relay.
///
/// The relay never looks inside; clients validate `sdp_type` with
/// [`SessionDescription::kind`] before acting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub sdp_type: String,
    pub sdp: String,
}

impl SessionDescription {
    pub fn new(kind: SdpType, sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: kind.as_str().to_owned(),
            sdp: sdp.into(),
        }
    }

    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Offer, sdp)
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::new(SdpType::Answer, sdp)
    }

    /// Parsed type; `None` when the type field is empty or unknown.
    pub fn kind(&self) -> Option<SdpType> {
        self.sdp_type.parse().ok()
    }

    /// True when this is a description of the given kind.
    pub fn is(&self, kind: SdpType) -> bool {
        self.kind() == Some(kind)
    }
}

// ---- Connectivity candidates ----------------------------------------------

/// A single network-path candidate for the direct media connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    /// `candidate:...` attribute line.
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_mline_index: Option<u16>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
        }
    }

    pub fn with_mid(mut self, mid: impl Into<String>, mline_index: u16) -> Self {
        self.sdp_mid = Some(mid.into());
        self.sdp_mline_index = Some(mline_index);
        self
    }

    /// An empty candidate line carries no usable path.
    pub fn is_well_formed(&self) -> bool {
        !self.candidate.trim().is_empty()
    }
}
