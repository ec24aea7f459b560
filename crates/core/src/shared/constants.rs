pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Used when a video does not report a usable frame rate.
pub const FALLBACK_FPS: f64 = 30.0;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_FRAME_INTERVAL_SECS: f64 = 1.0;

/// Face detector score below which a box is discarded before embedding.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CSV_HEADER: [&str; 3] = ["name", "confidence", "first_seen_sec"];
