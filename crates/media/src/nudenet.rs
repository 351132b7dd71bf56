use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};
use onnxruntime::ndarray::Array4;
use std::path::{Path, PathBuf};

use crate::safety::{Detection, SafetyConfig, SafetyDetector, SafetyReport, NUDENET_LABELS};
use crate::MediaError;

/// Minimum class score for a raw prediction to be considered at all.
pub const CANDIDATE_SCORE: f32 = 0.2;
/// Minimum score kept by non-maximum suppression.
pub const NMS_SCORE: f32 = 0.25;
/// Overlap above which the weaker of two boxes is suppressed.
pub const NMS_IOU: f32 = 0.45;

/// Decodes an image file, sniffing the format from its leading bytes.
///
/// Staged uploads carry whatever extension the client sent, so the name is not trusted.
pub fn load_image(path: &Path) -> Result<DynamicImage, MediaError> {
    Ok(image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?)
}

/// Square, resized model input plus the factor mapping model pixels back to the source image.
#[derive(Debug, Clone)]
pub struct Letterbox {
    pub input: Array4<f32>,
    pub scale: f32,
}

/// Pads the image to a square (right and bottom, black), resizes to `input_size` and lays the
/// pixels out as `1 × 3 × H × W` RGB in `[0, 1]`.
pub fn letterbox(image: &DynamicImage, input_size: u32) -> Letterbox {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let side = width.max(height).max(1);

    let mut canvas = RgbImage::new(side, side);
    imageops::replace(&mut canvas, &rgb, 0, 0);
    let resized = imageops::resize(&canvas, input_size, input_size, FilterType::Triangle);

    let size = input_size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, channel, y as usize, x as usize]] = f32::from(pixel[channel]) / 255.0;
        }
    }

    Letterbox {
        input,
        scale: side as f32 / input_size as f32,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RawBox {
    class: usize,
    score: f32,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
}

impl RawBox {
    fn iou(&self, other: &RawBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.w).min(other.x + other.w);
        let bottom = (self.y + self.h).min(other.y + other.h);
        let inter = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.w * self.h + other.w * other.h - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// Turns the `(1, 4 + C, N)` prediction tensor into detections in source-image pixels.
///
/// Each column holds `cx, cy, w, h` followed by one score per class. The best class is kept when
/// it reaches [`CANDIDATE_SCORE`]; overlapping boxes are then thinned with [`non_max_suppression`].
pub fn decode_predictions(
    output: &[f32],
    shape: &[usize],
    scale: f32,
) -> Result<Vec<Detection>, MediaError> {
    let (rows, columns) = match shape {
        [1, rows, columns] => (*rows, *columns),
        _ => {
            return Err(MediaError::Inference(format!(
                "unexpected detector output shape {shape:?}"
            )))
        }
    };
    if rows != 4 + NUDENET_LABELS.len() || output.len() != rows * columns {
        return Err(MediaError::Inference(format!(
            "detector output {shape:?} does not match {} classes",
            NUDENET_LABELS.len()
        )));
    }

    let at = |row: usize, column: usize| output[row * columns + column];
    let mut candidates = Vec::new();
    for column in 0..columns {
        let (class, score) = (0..NUDENET_LABELS.len())
            .map(|class| (class, at(4 + class, column)))
            .fold((0, f32::MIN), |best, next| if next.1 > best.1 { next } else { best });
        if score < CANDIDATE_SCORE {
            continue;
        }
        let (cx, cy, w, h) = (at(0, column), at(1, column), at(2, column), at(3, column));
        candidates.push(RawBox {
            class,
            score,
            x: (cx - w / 2.0) * scale,
            y: (cy - h / 2.0) * scale,
            w: w * scale,
            h: h * scale,
        });
    }

    Ok(non_max_suppression(candidates, NMS_SCORE, NMS_IOU)
        .into_iter()
        .map(|b| Detection {
            label: NUDENET_LABELS[b.class].to_string(),
            score: b.score,
            bbox: [b.x as i32, b.y as i32, b.w as i32, b.h as i32],
        })
        .collect())
}

/// Greedy, class-agnostic suppression: highest score first, drop anything overlapping a kept box
/// by more than `iou_threshold`.
fn non_max_suppression(mut boxes: Vec<RawBox>, score_threshold: f32, iou_threshold: f32) -> Vec<RawBox> {
    boxes.retain(|b| b.score > score_threshold);
    boxes.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<RawBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// NudeNet exposed-body-part detector running on ONNX Runtime.
#[derive(Debug, Clone)]
pub struct NudeNetDetector {
    model_path: PathBuf,
    threshold: f32,
    input_size: u32,
}

impl NudeNetDetector {
    /// Resolves (or downloads) the model and opens a session once to validate it.
    pub async fn load(cfg: &SafetyConfig) -> Result<Self, MediaError> {
        if cfg.input_size == 0 {
            return Err(MediaError::InvalidConfig(
                "input_size must be greater than zero".into(),
            ));
        }
        let model_path = semantic::ensure_local_file(
            &cfg.model_path,
            cfg.model_url.as_deref(),
            cfg.auth_header.as_deref(),
        )
        .await?;
        semantic::cached_session(&model_path)?;
        tracing::info!(path = %model_path.display(), "safety model loaded");

        Ok(Self {
            model_path,
            threshold: cfg.threshold,
            input_size: cfg.input_size,
        })
    }

    fn run(&self, letterbox: Letterbox) -> Result<Vec<Detection>, MediaError> {
        let session = semantic::cached_session(&self.model_path)?;
        let mut session = session.borrow_mut();
        let outputs = session
            .run::<f32, f32, _>(vec![letterbox.input.into_dyn()])
            .map_err(|e| MediaError::Inference(e.to_string()))?;
        let prediction = outputs
            .first()
            .ok_or_else(|| MediaError::Inference("detector returned no outputs".into()))?;

        let shape = prediction.shape().to_vec();
        let flat: Vec<f32> = prediction.iter().copied().collect();
        decode_predictions(&flat, &shape, letterbox.scale)
    }
}

impl SafetyDetector for NudeNetDetector {
    fn model_name(&self) -> &str {
        "nudenet"
    }

    fn inspect(&self, image_path: &Path) -> Result<SafetyReport, MediaError> {
        let image = load_image(image_path)?;
        let detections = self.run(letterbox(&image, self.input_size))?;
        Ok(SafetyReport::from_detections(detections, self.threshold))
    }
}
