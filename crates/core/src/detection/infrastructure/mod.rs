pub mod arcface_model;
pub mod onnx_face_embedder;
pub mod onnx_session;
pub mod onnx_yolo_person_detector;
pub mod yolo;
