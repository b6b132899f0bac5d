use crate::tracker::Detection;

/// Greedy non-maximum suppression.
///
/// Boxes are visited by descending confidence; each kept box removes every
/// remaining box whose IoU with it is at least `iou_threshold`.
pub fn non_max_suppression(mut boxes: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept
            .iter()
            .any(|k| k.bbox.iou(&candidate.bbox) >= iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
