//! Raw model output to suppressed detections.

use std::collections::BTreeSet;

use ndarray::{ArrayView2, ArrayView3, Axis, s};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::suppress::labels::Labels;
use crate::suppress::nms::non_max_suppression;
use crate::tracker::{Detection, Rect};

/// Channels carrying box geometry ahead of the class scores.
const BOX_CHANNELS: usize = 4;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SuppressorConfig {
    /// A candidate survives only with a best class score strictly above this.
    pub confidence_threshold: f32,
    /// Boxes overlapping a kept box by at least this IoU are dropped.
    pub iou_threshold: f32,
    /// Lowercase class names allowed through.
    pub target_classes: BTreeSet<String>,
}

impl Default for SuppressorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.35,
            iou_threshold: 0.45,
            target_classes: ["car", "bicycle", "bus", "truck", "motorcycle"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Turns a `[1, channels, elements]` output tensor into detections.
///
/// Channels 0..4 hold `cx, cy, w, h`; the rest are per-class scores.
#[derive(Debug, Clone)]
pub struct BoxSuppressor {
    config: SuppressorConfig,
    labels: Labels,
}

impl BoxSuppressor {
    pub fn new(config: SuppressorConfig, labels: Labels) -> Self {
        Self { config, labels }
    }

    pub fn config(&self) -> &SuppressorConfig {
        &self.config
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Suppress a flat output buffer laid out as `[1, channels, elements]`.
    pub fn suppress(&self, output: &[f32], channels: usize, elements: usize) -> Result<Vec<Detection>> {
        let shape_err = || Error::OutputShape {
            len: output.len(),
            channels,
            elements,
        };
        if channels <= BOX_CHANNELS || output.len() != channels * elements {
            return Err(shape_err());
        }

        let view = ArrayView3::from_shape((1, channels, elements), output).map_err(|_| shape_err())?;
        Ok(self.suppress_view(view.index_axis(Axis(0), 0)))
    }

    /// Suppress an already shaped `[channels, elements]` view.
    pub fn suppress_view(&self, predictions: ArrayView2<f32>) -> Vec<Detection> {
        if predictions.nrows() <= BOX_CHANNELS {
            return Vec::new();
        }

        let threshold = self.config.confidence_threshold;
        let mut candidates = Vec::new();

        for column in predictions.columns() {
            let scores = column.slice(s![BOX_CHANNELS..]);

            let mut best: Option<(usize, f32)> = None;
            for (index, &score) in scores.iter().enumerate() {
                if score > best.map_or(threshold, |(_, s)| s) {
                    best = Some((index, score));
                }
            }
            let Some((class_index, confidence)) = best else {
                continue;
            };

            let Some(label) = self.labels.get(class_index) else {
                trace!(class_index, "score channel has no label");
                continue;
            };
            let class_name = label.to_lowercase();
            if !self.config.target_classes.contains(&class_name) {
                continue;
            }

            let bbox = Rect::from_cxcywh(column[0], column[1], column[2], column[3]);
            if !bbox.is_normalized() {
                continue;
            }

            candidates.push(Detection::from_rect(bbox, confidence, class_index, class_name));
        }

        let before = candidates.len();
        let kept = non_max_suppression(candidates, self.config.iou_threshold);
        debug!(candidates = before, kept = kept.len(), "suppressed model output");
        kept
    }
}
