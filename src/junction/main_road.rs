use crate::math::Vector3;
use crate::network::SegmentId;

/// Segment end summary used to score main road candidates.
#[derive(Debug, Clone, Copy)]
pub struct MainRoadCandidate {
    /// Segment of the candidate end.
    pub segment: SegmentId,
    /// Horizontal unit direction leaving the node.
    pub direction: Vector3,
    /// Full width of the segment.
    pub width: f64,
}

/// The two segments treated as the straight-through road of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainRoad {
    first: Option<SegmentId>,
    second: Option<SegmentId>,
    auto: bool,
}

impl Default for MainRoad {
    fn default() -> Self {
        Self {
            first: None,
            second: None,
            auto: true,
        }
    }
}

impl MainRoad {
    /// First main segment.
    #[must_use]
    pub fn first(&self) -> Option<SegmentId> {
        self.first
    }

    /// Second main segment.
    #[must_use]
    pub fn second(&self) -> Option<SegmentId> {
        self.second
    }

    /// Whether the pair is re-selected automatically.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// Whether `segment` belongs to the pair.
    #[must_use]
    pub fn contains(&self, segment: SegmentId) -> bool {
        self.first == Some(segment) || self.second == Some(segment)
    }

    /// Pins a user-chosen pair; it survives until one of them disappears.
    pub fn pin(&mut self, first: SegmentId, second: SegmentId) {
        self.first = Some(first);
        self.second = Some(second);
        self.auto = false;
    }

    /// Returns to automatic selection.
    pub fn unpin(&mut self) {
        self.auto = true;
    }

    /// Refreshes the pair against the current segment ends.
    pub fn update(&mut self, candidates: &[MainRoadCandidate]) {
        if !self.auto {
            let present = |id: Option<SegmentId>| {
                id.is_some_and(|id| candidates.iter().any(|c| c.segment == id))
            };
            if present(self.first) && present(self.second) {
                return;
            }
            tracing::debug!("pinned main road lost a segment, regenerating");
            self.auto = true;
        }
        let (first, second) = select(candidates);
        self.first = first;
        self.second = second;
    }
}

/// Weight of a candidate pair: `(wA·wB)^p` with `p` growing from −1 for
/// identical directions to 1 for opposite ones.
#[must_use]
pub fn pair_weight(a: &MainRoadCandidate, b: &MainRoadCandidate) -> f64 {
    let cos = a.direction.dot(&b.direction).clamp(-1.0, 1.0);
    let power = cos.acos() / std::f64::consts::PI * 2.0 - 1.0;
    (a.width * b.width).powf(power)
}

/// Picks the highest-weight pair; the first pair in candidate order wins ties.
#[must_use]
pub fn select(candidates: &[MainRoadCandidate]) -> (Option<SegmentId>, Option<SegmentId>) {
    match candidates {
        [] => (None, None),
        [only] => (Some(only.segment), None),
        _ => {
            let mut best: Option<(f64, SegmentId, SegmentId)> = None;
            for (i, a) in candidates.iter().enumerate() {
                for b in &candidates[i + 1..] {
                    let weight = pair_weight(a, b);
                    if best.is_none_or(|(w, _, _)| weight > w) {
                        best = Some((weight, a.segment, b.segment));
                    }
                }
            }
            best.map_or((None, None), |(_, a, b)| (Some(a), Some(b)))
        }
    }
}
