//! Media adapters for the civic AI service.
//!
//! Uploaded media is staged in a scoped temp file ([`StagedUpload`]) and handed to one of two
//! external models:
//!
//! - speech recognition through an OpenAI-compatible transcription endpoint ([`WhisperHttpClient`]),
//! - image safety through a local NudeNet ONNX detector ([`NudeNetDetector`]).
//!
//! Both sit behind traits ([`Transcriber`], [`SafetyDetector`]) so the server can be tested with
//! fakes.

pub mod error;
pub mod safety;
pub mod transcribe;

mod nudenet;
mod staging;

pub use crate::error::MediaError;
pub use crate::nudenet::{
    decode_predictions, letterbox, load_image, Letterbox, NudeNetDetector, CANDIDATE_SCORE, NMS_IOU,
    NMS_SCORE,
};
pub use crate::safety::{
    verdict, Detection, SafetyConfig, SafetyDetector, SafetyReport, SafetyStatus, NUDENET_LABELS,
    UNSAFE_LABELS,
};
pub use crate::staging::{StagedUpload, DEFAULT_AUDIO_EXT, DEFAULT_IMAGE_EXT};
pub use crate::transcribe::{Transcriber, Transcript, TranscriptionConfig, WhisperHttpClient};
