use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::MediaError;

/// Classes emitted by the NudeNet detector, in output-channel order.
pub const NUDENET_LABELS: [&str; 18] = [
    "FEMALE_GENITALIA_COVERED",
    "FACE_FEMALE",
    "BUTTOCKS_EXPOSED",
    "FEMALE_BREAST_EXPOSED",
    "FEMALE_GENITALIA_EXPOSED",
    "MALE_BREAST_EXPOSED",
    "ANUS_EXPOSED",
    "FEET_EXPOSED",
    "BELLY_COVERED",
    "FEET_COVERED",
    "ARMPITS_COVERED",
    "ARMPITS_EXPOSED",
    "FACE_MALE",
    "BELLY_EXPOSED",
    "MALE_GENITALIA_EXPOSED",
    "ANUS_COVERED",
    "FEMALE_BREAST_COVERED",
    "BUTTOCKS_COVERED",
];

/// Classes that make an image unsafe when detected above the threshold.
pub const UNSAFE_LABELS: [&str; 6] = [
    "BUTTOCKS_EXPOSED",
    "FEMALE_BREAST_EXPOSED",
    "FEMALE_GENITALIA_EXPOSED",
    "MALE_BREAST_EXPOSED",
    "ANUS_EXPOSED",
    "MALE_GENITALIA_EXPOSED",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SafetyConfig {
    pub enabled: bool,
    pub model_path: PathBuf,
    /// Downloaded into `model_path` when the file is missing.
    pub model_url: Option<String>,
    pub auth_header: Option<String>,
    /// An unsafe class must score strictly above this to flag the image.
    pub threshold: f32,
    /// Square side the model was exported for.
    pub input_size: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: PathBuf::from("./models/nudenet/320n.onnx"),
            model_url: None,
            auth_header: None,
            threshold: 0.5,
            input_size: 320,
        }
    }
}

/// One labelled region. `bbox` is `[x, y, width, height]` in original image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub label: String,
    pub score: f32,
    #[serde(rename = "box")]
    pub bbox: [i32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyStatus {
    Safe,
    Nude,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub status: SafetyStatus,
    pub detections: Vec<Detection>,
}

impl SafetyReport {
    pub fn from_detections(detections: Vec<Detection>, threshold: f32) -> Self {
        Self {
            status: verdict(&detections, threshold),
            detections,
        }
    }
}

/// `Nude` as soon as one unsafe class scores above `threshold`.
pub fn verdict(detections: &[Detection], threshold: f32) -> SafetyStatus {
    let flagged = detections
        .iter()
        .any(|d| d.score > threshold && UNSAFE_LABELS.contains(&d.label.as_str()));
    if flagged {
        SafetyStatus::Nude
    } else {
        SafetyStatus::Safe
    }
}

/// Image-safety detector. Blocking; async callers should use `spawn_blocking`.
pub trait SafetyDetector: Send + Sync {
    fn model_name(&self) -> &str;

    fn inspect(&self, image_path: &Path) -> Result<SafetyReport, MediaError>;
}
