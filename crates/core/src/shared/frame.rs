use ndarray::ArrayView3;

/// A decoded video frame or still image: tightly packed RGB bytes, row-major.
///
/// Pixel-format conversion happens in the readers; everything downstream
/// sees RGB24.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Decode-order position within the source; 0 for still images.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Square crop centered on the `[x1, y1, x2, y2]` box, clamped to the frame.
    ///
    /// Returns `None` when the clamped crop is empty.
    pub fn square_crop(&self, bbox: [f64; 4]) -> Option<Frame> {
        let fw = self.width as f64;
        let fh = self.height as f64;

        let cx = (bbox[0] + bbox[2]) / 2.0;
        let cy = (bbox[1] + bbox[3]) / 2.0;
        let half = (bbox[2] - bbox[0]).max(bbox[3] - bbox[1]) / 2.0;

        let x1 = (cx - half).max(0.0).min(fw) as usize;
        let y1 = (cy - half).max(0.0).min(fh) as usize;
        let x2 = (cx + half).max(0.0).min(fw) as usize;
        let y2 = (cy + half).max(0.0).min(fh) as usize;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let channels = self.channels as usize;
        let row_bytes = self.width as usize * channels;
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            let start = row * row_bytes + x1 * channels;
            data.extend_from_slice(&self.data[start..start + (x2 - x1) * channels]);
        }

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        ))
    }
}
