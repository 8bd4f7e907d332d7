use geo_types::{Coord, LineString, Point};

/// Cut points closer together than this along the line are treated as the
/// same location.
const ARC_EPSILON: f64 = 1e-12;

/// Projects a point onto a polyline and returns the arc-length distance from
/// the line's first vertex to the nearest point on the line.
///
/// Distances are planar, in coordinate space. Returns `None` for degenerate
/// geometries with fewer than 2 points.
pub fn project_arc_length(line: &LineString<f64>, point: Point<f64>) -> Option<f64> {
    if line.0.len() < 2 {
        return None;
    }

    let p = Coord {
        x: point.x(),
        y: point.y(),
    };
    let mut traversed = 0.0;
    let mut best_distance = f64::INFINITY;
    let mut best_arc = 0.0;

    for segment in line.lines() {
        let d = segment.delta();
        let length_sq = d.x * d.x + d.y * d.y;

        // Fraction along this segment of the perpendicular foot, clamped to
        // the segment. Zero-length segments project onto their start vertex.
        let t = if length_sq > 0.0 {
            let v = p - segment.start;
            ((v.x * d.x + v.y * d.y) / length_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let projected = segment.start + d * t;
        let offset = p - projected;
        let distance = offset.x.hypot(offset.y);
        if distance < best_distance {
            best_distance = distance;
            best_arc = traversed + t * length_sq.sqrt();
        }

        traversed += length_sq.sqrt();
    }

    Some(best_arc)
}

/// Total planar length of a polyline in coordinate space.
pub fn arc_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|s| {
            let d = s.delta();
            d.x.hypot(d.y)
        })
        .sum()
}

/// Interpolates the point at the given arc-length distance from the line's
/// first vertex. Distances beyond the ends clamp to the end vertices.
fn point_at(line: &LineString<f64>, arc: f64) -> Coord<f64> {
    let mut traversed = 0.0;
    for segment in line.lines() {
        let d = segment.delta();
        let length = d.x.hypot(d.y);
        if traversed + length >= arc && length > 0.0 {
            let t = ((arc - traversed) / length).clamp(0.0, 1.0);
            return segment.start + d * t;
        }
        traversed += length;
    }
    // Past the last vertex.
    *line.0.last().expect("slicing requires a non-empty line")
}

/// Extracts the sub-polyline between the projections of `start` and `end`.
///
/// Both endpoints are projected to arc-length positions along the line; the
/// slice always runs low-to-high regardless of argument order, so
/// `slice(g, a, b)` equals `slice(g, b, a)`. Interpolated points are inserted
/// exactly at the two cut boundaries, so the result's endpoints lie on the
/// original line rather than being rounded to existing vertices. Points
/// between the cuts are carried over unchanged and never reordered.
///
/// Returns `None` when the geometry has fewer than 2 points. When both
/// endpoints project to the same location the result is a single-point
/// geometry; callers must treat that as "no usable segment", not an error.
pub fn slice(line: &LineString<f64>, start: Point<f64>, end: Point<f64>) -> Option<LineString<f64>> {
    let mut low = project_arc_length(line, start)?;
    let mut high = project_arc_length(line, end)?;
    if low > high {
        std::mem::swap(&mut low, &mut high);
    }

    let first = point_at(line, low);
    if high - low < ARC_EPSILON {
        return Some(LineString::from(vec![first]));
    }

    let mut coords = vec![first];
    let mut traversed = 0.0;
    for segment in line.lines() {
        let d = segment.delta();
        traversed += d.x.hypot(d.y);
        // Interior vertices strictly between the cuts; a cut landing exactly
        // on a vertex is already covered by the interpolated boundary point.
        if traversed > low + ARC_EPSILON && traversed < high - ARC_EPSILON {
            coords.push(segment.end);
        }
    }
    coords.push(point_at(line, high));

    Some(LineString::from(coords))
}
