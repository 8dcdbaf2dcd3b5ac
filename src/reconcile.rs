//! Multi-engine result reconciliation
//!
//! Picks the more confident engine as primary and merges both engines' boxes,
//! suppressing detections that overlap a more confident one.

use crate::engine::{BoundingBox, EngineResult, ReconciledResult};

/// Boxes overlapping a kept box by more than this IoU are duplicates
pub const DUPLICATE_IOU_THRESHOLD: f64 = 0.7;

/// Intersection over union of two axis-aligned boxes.
///
/// Returns 0 when the union is empty, so zero-size boxes never match.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let x_overlap = (a.right().min(b.right()) - (a.x as i64).max(b.x as i64)).max(0);
    let y_overlap = (a.bottom().min(b.bottom()) - (a.y as i64).max(b.y as i64)).max(0);
    let intersection = (x_overlap * y_overlap) as u64;

    let union = a.area() + b.area() - intersection;
    if union == 0 {
        return 0.0;
    }

    intersection as f64 / union as f64
}

/// Greedy suppression of overlapping boxes.
///
/// Boxes are visited by descending confidence, keeping input order among
/// equal confidences; a box is kept unless its IoU with an already kept box
/// exceeds `DUPLICATE_IOU_THRESHOLD`.
pub fn dedup_boxes(mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<BoundingBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let duplicate = kept
            .iter()
            .any(|existing| iou(&candidate, existing) > DUPLICATE_IOU_THRESHOLD);
        if !duplicate {
            kept.push(candidate);
        }
    }

    kept
}

/// Order two results as (primary, secondary).
///
/// `a` wins only with a strictly higher confidence; ties go to `b`.
pub fn select_primary<'r>(
    a: &'r EngineResult,
    b: &'r EngineResult,
) -> (&'r EngineResult, &'r EngineResult) {
    if a.confidence > b.confidence {
        (a, b)
    } else {
        (b, a)
    }
}

/// Merge two engine results into one consensus result.
///
/// Text and confidence come from the primary verbatim; boxes are the
/// deduplicated union, primary boxes first.
pub fn reconcile(a: &EngineResult, b: &EngineResult) -> ReconciledResult {
    let (primary, secondary) = select_primary(a, b);

    let all_boxes: Vec<BoundingBox> = primary
        .bounding_boxes
        .iter()
        .chain(secondary.bounding_boxes.iter())
        .cloned()
        .collect();
    let total = all_boxes.len();
    let bounding_boxes = dedup_boxes(all_boxes);

    tracing::debug!(
        "Reconciled {} (conf {:.2}) over {} (conf {:.2}): kept {} of {} boxes",
        primary.engine,
        primary.confidence,
        secondary.engine,
        secondary.confidence,
        bounding_boxes.len(),
        total
    );

    ReconciledResult {
        text: primary.text.clone(),
        confidence: primary.confidence,
        bounding_boxes,
        primary_engine: primary.engine,
        secondary_engine: secondary.engine,
        combined: true,
    }
}
