//! Marker animation: interpolated "smooth move" between samples and
//! vertex-by-vertex playback of a pre-fetched route.

use crate::geo::{interpolate, GeoPoint};

/// `steps` evenly spaced frames from `from` to `to`, the last one exactly `to`.
pub fn smooth_move(from: GeoPoint, to: GeoPoint, steps: usize) -> Vec<GeoPoint> {
    if steps == 0 {
        return vec![to];
    }
    (1..=steps)
        .map(|i| {
            if i == steps {
                to
            } else {
                interpolate(from, to, i as f64 / steps as f64)
            }
        })
        .collect()
}

/// Walks a route one vertex per frame.
#[derive(Debug, Clone)]
pub struct RoutePlayback {
    path: Vec<GeoPoint>,
    next: usize,
}

impl RoutePlayback {
    pub fn new(path: Vec<GeoPoint>) -> Self {
        Self { path, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.path.len() - self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.path.len()
    }
}

impl Iterator for RoutePlayback {
    type Item = GeoPoint;

    fn next(&mut self) -> Option<GeoPoint> {
        let point = *self.path.get(self.next)?;
        self.next += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { latitude: lat, longitude: lon }
    }

    #[test]
    fn test_smooth_move_frames() {
        let frames = smooth_move(p(0.0, 0.0), p(4.0, 8.0), 4);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], p(1.0, 2.0));
        assert_eq!(frames[1], p(2.0, 4.0));
        assert_eq!(*frames.last().unwrap(), p(4.0, 8.0));
    }

    #[test]
    fn test_smooth_move_zero_steps_jumps() {
        assert_eq!(smooth_move(p(0.0, 0.0), p(1.0, 1.0), 0), vec![p(1.0, 1.0)]);
    }

    #[test]
    fn test_route_playback() {
        let mut playback = RoutePlayback::new(vec![p(0.0, 0.0), p(0.5, 0.5), p(1.0, 1.0)]);
        assert_eq!(playback.remaining(), 3);
        assert_eq!(playback.next(), Some(p(0.0, 0.0)));
        assert_eq!(playback.remaining(), 2);
        let rest: Vec<_> = playback.by_ref().collect();
        assert_eq!(rest, vec![p(0.5, 0.5), p(1.0, 1.0)]);
        assert!(playback.is_finished());
        assert_eq!(playback.next(), None);
    }
}
