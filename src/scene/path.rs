use eframe::egui::{Pos2, Rect, pos2};

const MAX_DASHES: f32 = 4_096.0;

/// Orthogonal parent-to-child route: down to the vertical midpoint, across, then down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElbowPath {
    pub start: Pos2,
    pub end: Pos2,
    pub mid_y: f32,
}

impl ElbowPath {
    pub fn new(start: Pos2, end: Pos2) -> Self {
        Self {
            start,
            end,
            mid_y: (start.y + end.y) * 0.5,
        }
    }

    pub fn corners(&self) -> [Pos2; 4] {
        [
            self.start,
            pos2(self.start.x, self.mid_y),
            pos2(self.end.x, self.mid_y),
            self.end,
        ]
    }

    fn segment_lengths(&self) -> [f32; 3] {
        [
            (self.mid_y - self.start.y).abs(),
            (self.end.x - self.start.x).abs(),
            (self.end.y - self.mid_y).abs(),
        ]
    }

    pub fn length(&self) -> f32 {
        self.segment_lengths().iter().sum()
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_points(&self.corners())
    }

    /// Point `distance` world units along the path, clamped to its ends.
    pub fn point_at_distance(&self, distance: f32) -> Pos2 {
        let corners = self.corners();
        let mut remaining = distance.max(0.0);
        for (index, length) in self.segment_lengths().into_iter().enumerate() {
            if remaining <= length {
                if length <= f32::EPSILON {
                    return corners[index];
                }
                let from = corners[index];
                let to = corners[index + 1];
                return from + (to - from) * (remaining / length);
            }
            remaining -= length;
        }
        self.end
    }

    /// Arc-length parameterisation with `t` in `[0, 1]`; zero-length paths give `start`.
    pub fn point_at(&self, t: f32) -> Pos2 {
        let length = self.length();
        if !(length > f32::EPSILON) {
            return self.start;
        }
        self.point_at_distance(t.clamp(0.0, 1.0) * length)
    }

    /// Dash polylines with a phase that runs continuously round both corners.
    ///
    /// A dash straddling a corner comes back as a three-point polyline. Non-positive
    /// lengths, or more dashes than can sensibly be drawn, yield the solid path.
    pub fn dashes(&self, dash_length: f32, gap_length: f32) -> Vec<Vec<Pos2>> {
        let length = self.length();
        if length <= f32::EPSILON {
            return Vec::new();
        }
        let period = dash_length + gap_length;
        if dash_length <= 0.0 || gap_length <= 0.0 || length / period > MAX_DASHES {
            return vec![self.corners().to_vec()];
        }

        let corners = self.corners();
        let lengths = self.segment_lengths();
        let corner_distances = [lengths[0], lengths[0] + lengths[1]];

        let mut dashes = Vec::with_capacity((length / period).ceil() as usize);
        let mut cursor = 0.0;
        while cursor < length {
            let dash_end = (cursor + dash_length).min(length);
            let mut polyline = vec![self.point_at_distance(cursor)];
            for (corner, &distance) in corner_distances.iter().enumerate() {
                if distance > cursor && distance < dash_end {
                    polyline.push(corners[corner + 1]);
                }
            }
            polyline.push(self.point_at_distance(dash_end));
            dashes.push(polyline);
            cursor = dash_end + gap_length;
        }
        dashes
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn corners_follow_the_elbow() {
        let path = ElbowPath::new(pos2(0.0, 0.0), pos2(40.0, 100.0));
        assert_eq!(
            path.corners(),
            [
                pos2(0.0, 0.0),
                pos2(0.0, 50.0),
                pos2(40.0, 50.0),
                pos2(40.0, 100.0)
            ]
        );
        assert_eq!(path.length(), 140.0);
    }

    #[test]
    fn point_at_is_arc_length_proportional() {
        let path = ElbowPath::new(pos2(0.0, 0.0), pos2(10.0, 20.0));
        assert_eq!(path.point_at(0.0), pos2(0.0, 0.0));
        assert_eq!(path.point_at(0.5), pos2(5.0, 10.0));
        assert_eq!(path.point_at(1.0), pos2(10.0, 20.0));
    }

    #[test]
    fn zero_length_path_returns_start() {
        let point = pos2(3.0, 4.0);
        let path = ElbowPath::new(point, point);
        assert_eq!(path.point_at(0.7), point);
        assert!(path.dashes(4.0, 2.0).is_empty());
    }

    #[test]
    fn dash_phase_runs_through_corners() {
        let path = ElbowPath::new(pos2(0.0, 0.0), pos2(10.0, 20.0));
        let dashes = path.dashes(4.0, 2.0);

        assert_eq!(dashes.len(), 5);
        assert_eq!(dashes[2], vec![pos2(2.0, 10.0), pos2(6.0, 10.0)]);
        assert_eq!(
            dashes[3],
            vec![pos2(8.0, 10.0), pos2(10.0, 10.0), pos2(10.0, 12.0)]
        );
        assert_eq!(dashes[4], vec![pos2(10.0, 14.0), pos2(10.0, 18.0)]);
    }

    #[test]
    fn invalid_dash_lengths_fall_back_to_solid() {
        let path = ElbowPath::new(pos2(0.0, 0.0), pos2(10.0, 20.0));
        assert_eq!(path.dashes(0.0, 2.0), vec![path.corners().to_vec()]);
    }

    fn on_elbow(path: &ElbowPath, point: Pos2) -> bool {
        const EPS: f32 = 1e-3;
        let between =
            |value: f32, a: f32, b: f32| value >= a.min(b) - EPS && value <= a.max(b) + EPS;
        let first = (point.x - path.start.x).abs() <= EPS
            && between(point.y, path.start.y, path.mid_y);
        let second =
            (point.y - path.mid_y).abs() <= EPS && between(point.x, path.start.x, path.end.x);
        let third =
            (point.x - path.end.x).abs() <= EPS && between(point.y, path.mid_y, path.end.y);
        first || second || third
    }

    proptest! {
        #[test]
        fn particles_stay_on_the_elbow(
            sx in -500.0f32..500.0,
            sy in -500.0f32..500.0,
            ex in -500.0f32..500.0,
            ey in -500.0f32..500.0,
            t in 0.0f32..1.0,
        ) {
            let path = ElbowPath::new(pos2(sx, sy), pos2(ex, ey));
            let point = path.point_at(t);
            prop_assert!(path.bounds().expand(1e-3).contains(point));
            prop_assert!(on_elbow(&path, point), "{point:?} off {path:?}");
        }
    }
}
