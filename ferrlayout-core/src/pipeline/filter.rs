use crate::layout::element::{Detection, LayoutPayload};

/// Keeps detections scoring strictly above `threshold`, most confident first.
///
/// The sort is stable, so equal scores keep their model order.
pub fn filter_and_sort(mut detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections.retain(|detection| detection.score() > threshold);
    detections.sort_by(|a, b| b.score().total_cmp(&a.score()));
    detections
}

pub fn to_payload(detections: &[Detection]) -> Vec<LayoutPayload> {
    detections.iter().map(LayoutPayload::from).collect()
}
