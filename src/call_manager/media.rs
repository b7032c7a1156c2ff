use std::fmt;

/// What the caller asks the capture device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl MediaConstraints {
    /// Calls always request both.
    pub fn audio_video() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// Handle to one local or remote media track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    PermissionDenied,
    DeviceUnavailable(String),
    Other(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::PermissionDenied => write!(f, "media permission denied"),
            MediaError::DeviceUnavailable(dev) => write!(f, "media device unavailable: {dev}"),
            MediaError::Other(msg) => write!(f, "media error: {msg}"),
        }
    }
}

impl std::error::Error for MediaError {}

/// Captured local audio/video. Dropping it without `stop()` may leave the
/// device busy, so the call manager always stops it explicitly.
pub trait LocalMedia: Send {
    fn tracks(&self) -> Vec<MediaTrack>;
    fn stop(&mut self);
}

/// Capture backend (camera + microphone).
pub trait MediaDevices: Send {
    fn acquire(&mut self, constraints: MediaConstraints) -> Result<Box<dyn LocalMedia>, MediaError>;
}
