//! Decoding of raw detector rows into face detections.

use headswap_core::core::constants::{DETECTION_ROW_LEN, NUM_LANDMARKS};
use headswap_core::domain::FaceDetection;
use ndarray::ArrayView2;

/// Score filtering, non-maximum suppression and primary-face selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionPostProcess {
    /// Rows scoring below this are discarded.
    pub score_threshold: f32,
    /// Boxes overlapping a higher-scoring box above this IoU are suppressed.
    pub nms_iou_threshold: f32,
}

impl DetectionPostProcess {
    pub fn new(score_threshold: f32, nms_iou_threshold: f32) -> Self {
        Self {
            score_threshold,
            nms_iou_threshold,
        }
    }

    /// Decodes `[N, 15]` rows into detections that survive thresholding and NMS.
    ///
    /// Survivors keep their original row order. Rows with non-finite values
    /// are dropped.
    pub fn apply(&self, rows: ArrayView2<'_, f32>) -> Vec<FaceDetection> {
        let candidates: Vec<FaceDetection> = rows
            .outer_iter()
            .filter(|row| row.len() >= DETECTION_ROW_LEN)
            .filter_map(|row| {
                let values: Vec<f32> = row.iter().take(DETECTION_ROW_LEN).copied().collect();
                if values.iter().any(|v| !v.is_finite()) {
                    return None;
                }
                let mut landmarks = [[0.0f32; 2]; NUM_LANDMARKS];
                for (i, point) in landmarks.iter_mut().enumerate() {
                    *point = [values[5 + 2 * i], values[6 + 2 * i]];
                }
                Some(FaceDetection {
                    bbox: [values[0], values[1], values[2], values[3]],
                    landmarks,
                    score: values[4],
                })
            })
            .filter(|det| det.score >= self.score_threshold && det.area() > 0.0)
            .collect();

        let keep = self.nms(&candidates);
        candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(_, det)| det)
            .collect()
    }

    /// Greedy NMS; returns a keep flag per candidate.
    fn nms(&self, candidates: &[FaceDetection]) -> Vec<bool> {
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        // Stable sort keeps row order among equal scores.
        order.sort_by(|&a, &b| candidates[b].score.total_cmp(&candidates[a].score));

        let mut keep = vec![false; candidates.len()];
        let mut suppressed = vec![false; candidates.len()];
        for (pos, &i) in order.iter().enumerate() {
            if suppressed[i] {
                continue;
            }
            keep[i] = true;
            for &j in &order[pos + 1..] {
                if !suppressed[j] && candidates[i].iou(&candidates[j]) > self.nms_iou_threshold {
                    suppressed[j] = true;
                }
            }
        }
        keep
    }
}

/// Picks the face to swap when several are detected.
///
/// The largest box wins; equal areas fall back to the higher score, then to
/// the earlier detection.
pub fn select_primary(detections: &[FaceDetection]) -> Option<FaceDetection> {
    let mut best: Option<&FaceDetection> = None;
    for det in detections {
        best = match best {
            None => Some(det),
            Some(current) => {
                let larger = det.area() > current.area();
                let same_area_higher_score =
                    det.area() == current.area() && det.score > current.score;
                if larger || same_area_higher_score {
                    Some(det)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.copied()
}
