use crate::detection::domain::alignment::Point;
use crate::shared::bbox::BoundingBox;

/// One raw detector candidate, already rescaled to frame space.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub landmarks: [Point; 5],
    pub score: f32,
}

/// Greedy non-maximum suppression.
///
/// Candidates are stably sorted by descending score — ties keep their
/// original detection order, which keeps the output reproducible — then
/// the best box suppresses every remaining box whose IoU with it exceeds
/// `iou_threshold`.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut suppressed = vec![false; candidates.len()];
    let mut kept = Vec::with_capacity(candidates.len());

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if !suppressed[j] && candidates[i].bbox.iou(&candidates[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
        kept.push(candidates[i].clone());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Candidate {
        Candidate {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            landmarks: [(0.0, 0.0); 5],
            score,
        }
    }

    #[test]
    fn test_suppresses_overlapping_lower_score() {
        // IoU between these two boxes exceeds 0.4, so only 0.9 survives
        let kept = non_max_suppression(
            vec![
                cand(0.0, 0.0, 100.0, 100.0, 0.9),
                cand(10.0, 10.0, 100.0, 100.0, 0.8),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_output_independent_of_input_order() {
        let a = cand(0.0, 0.0, 100.0, 100.0, 0.9);
        let b = cand(10.0, 10.0, 100.0, 100.0, 0.8);
        let forward = non_max_suppression(vec![a.clone(), b.clone()], 0.4);
        let reversed = non_max_suppression(vec![b, a], 0.4);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].score, reversed[0].score);
    }

    #[test]
    fn test_idempotent() {
        let once = non_max_suppression(
            vec![
                cand(0.0, 0.0, 100.0, 100.0, 0.9),
                cand(5.0, 5.0, 105.0, 105.0, 0.7),
                cand(300.0, 300.0, 400.0, 400.0, 0.6),
            ],
            0.4,
        );
        let twice = non_max_suppression(once.clone(), 0.4);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.bbox, b.bbox);
        }
    }

    #[test]
    fn test_keeps_disjoint_boxes() {
        let kept = non_max_suppression(
            vec![
                cand(0.0, 0.0, 50.0, 50.0, 0.9),
                cand(200.0, 200.0, 250.0, 250.0, 0.5),
            ],
            0.4,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_ties_keep_detection_order() {
        // Equal scores: the earlier detection wins the overlap
        let first = cand(0.0, 0.0, 100.0, 100.0, 0.8);
        let second = cand(10.0, 10.0, 110.0, 110.0, 0.8);
        let kept = non_max_suppression(vec![first.clone(), second], 0.4);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox, first.bbox);
    }

    #[test]
    fn test_empty_input() {
        assert!(non_max_suppression(Vec::new(), 0.4).is_empty());
    }
}
