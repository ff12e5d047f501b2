use crate::math::intersect_2d::segment_segment_intersect_2d;

use super::curve::Curve;

/// Padding applied to bounding boxes during subdivision.
const BOUNDS_PADDING: f64 = 1e-6;

/// Result of a curve-curve intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Parameter on the first curve.
    pub first_t: f64,
    /// Parameter on the second curve.
    pub second_t: f64,
}

/// Finds the intersection of two curves in the horizontal plane that lies
/// closest to the start of `first`.
///
/// Both curves are subdivided while their bounding boxes overlap, up to
/// `depth` levels; the leaves are intersected as straight chords. Returns
/// `None` when the curves do not cross, which includes parallel and
/// collinear curves.
#[must_use]
pub fn intersect_single<A, B>(first: &A, second: &B, depth: u32) -> Option<Intersection>
where
    A: Curve,
    B: Curve,
{
    let mut best = None;
    subdivide(
        &Span::new(first.cut(0.0, 1.0), 0.0, 1.0),
        &Span::new(second.cut(0.0, 1.0), 0.0, 1.0),
        depth,
        &mut best,
    );
    best
}

/// A piece of a curve together with the parameter range it covers.
struct Span<C> {
    curve: C,
    t0: f64,
    t1: f64,
}

impl<C: Curve> Span<C> {
    fn new(curve: C, t0: f64, t1: f64) -> Self {
        Self { curve, t0, t1 }
    }

    fn split(&self) -> [Self; 2] {
        let mid = 0.5 * (self.t0 + self.t1);
        [
            Self::new(self.curve.cut(0.0, 0.5), self.t0, mid),
            Self::new(self.curve.cut(0.5, 1.0), mid, self.t1),
        ]
    }

    fn global(&self, local: f64) -> f64 {
        self.t0 + (self.t1 - self.t0) * local
    }
}

fn subdivide<A, B>(first: &Span<A>, second: &Span<B>, depth: u32, best: &mut Option<Intersection>)
where
    A: Curve,
    B: Curve,
{
    // Nothing in this branch can beat a hit found earlier along `first`.
    if best.is_some_and(|hit| hit.first_t < first.t0) {
        return;
    }
    if !first
        .curve
        .bounds()
        .overlaps_xy(&second.curve.bounds(), BOUNDS_PADDING)
    {
        return;
    }

    if depth == 0 {
        let hit = segment_segment_intersect_2d(
            &first.curve.position(0.0),
            &first.curve.position(1.0),
            &second.curve.position(0.0),
            &second.curve.position(1.0),
        );
        if let Some((t, u)) = hit {
            let candidate = Intersection {
                first_t: first.global(t),
                second_t: second.global(u),
            };
            match *best {
                Some(current) if current.first_t <= candidate.first_t => {}
                _ => *best = Some(candidate),
            }
        }
        return;
    }

    for a in first.split() {
        for b in second.split() {
            subdivide(&a, &b, depth - 1, best);
        }
    }
}
