/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Dispersion-based fixation detection over a window of samples.

use crate::GazeSample;

/// Converts an angular tolerance into the chord length it subtends on a unit
/// sphere, so it can be scaled by the viewing distance.
pub fn normalized_threshold(degrees: f64) -> f64 {
    (2.0 * (1.0 - degrees.to_radians().cos())).sqrt()
}

/// Sum of the per-axis ranges of the combined 3D gaze point.
/// Samples without a valid 3D gaze point add no spread.
pub fn dispersion<'a, I>(samples: I) -> f64
where
    I: IntoIterator<Item = &'a GazeSample>,
{
    let mut bounds: Option<([f64; 3], [f64; 3])> = None;
    for point in samples
        .into_iter()
        .filter_map(|sample| sample.combined.valid_gaze_point_3d())
    {
        let point = point.to_array();
        let (min, max) = bounds.get_or_insert((point, point));
        for axis in 0..3 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }
    match bounds {
        Some((min, max)) => (0..3).map(|axis| max[axis] - min[axis]).sum(),
        None => 0.0,
    }
}

/// The dispersion allowed at the window's mean viewing distance.
pub fn max_deviation<'a, I>(samples: I, normalized_threshold: f64) -> f64
where
    I: IntoIterator<Item = &'a GazeSample>,
{
    let (sum, count) = samples
        .into_iter()
        .filter_map(|sample| sample.combined.gaze_distance())
        .fold((0.0, 0usize), |(sum, count), distance| (sum + distance, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64 * normalized_threshold
}

/// An empty window is trivially a fixation; callers only test full windows.
pub fn is_fixation<'a, I>(samples: I, normalized_threshold: f64) -> bool
where
    I: IntoIterator<Item = &'a GazeSample>,
    I::IntoIter: Clone,
{
    let samples = samples.into_iter();
    dispersion(samples.clone()) <= max_deviation(samples, normalized_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EyeData;
    use crate::Validated;
    use euclid::Point2D;
    use euclid::Point3D;

    fn sample_at(x: f64, y: f64, z: f64) -> GazeSample {
        let eye = EyeData::new(
            Validated::valid(Point2D::new(0.5, 0.5)),
            Some(Validated::valid(Point3D::new(x, y, z))),
            Some(Validated::valid(Point3D::new(0.0, 0.0, 600.0))),
            None,
        );
        GazeSample::new(0.0, eye, eye)
    }

    #[test]
    fn threshold_of_one_degree() {
        let threshold = normalized_threshold(1.0);
        // Chord of 1 degree is almost exactly the arc length.
        assert!((threshold - 1.0f64.to_radians()).abs() < 1e-6);
        assert_eq!(normalized_threshold(0.0), 0.0);
    }

    #[test]
    fn identical_samples_are_a_fixation() {
        let window: Vec<_> = (0..60).map(|_| sample_at(1.0, 2.0, 0.0)).collect();
        assert_eq!(dispersion(&window), 0.0);
        assert!(is_fixation(&window, normalized_threshold(0.01)));
        assert!(is_fixation(&window, normalized_threshold(1.0)));
    }

    #[test]
    fn spread_samples_are_not_a_fixation() {
        let window: Vec<_> = (0..60)
            .map(|i| sample_at((i % 2) as f64 * 100.0, 0.0, 0.0))
            .collect();
        assert_eq!(dispersion(&window), 100.0);
        assert!(!is_fixation(&window, normalized_threshold(1.0)));
    }

    #[test]
    fn dispersion_sums_axis_ranges() {
        let window = vec![
            sample_at(0.0, 0.0, 0.0),
            sample_at(2.0, -1.0, 0.5),
            sample_at(1.0, 3.0, 0.0),
        ];
        assert!((dispersion(&window) - (2.0 + 4.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn max_deviation_scales_with_distance() {
        let window = vec![sample_at(0.0, 0.0, 0.0), sample_at(0.0, 0.0, 0.0)];
        assert!((max_deviation(&window, 0.5) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn samples_without_3d_add_no_spread() {
        let cursor = EyeData::from_point_2d(Point2D::new(0.9, 0.1), true);
        let mut window = vec![GazeSample::new(0.0, cursor, cursor); 3];
        assert_eq!(dispersion(&window), 0.0);
        assert_eq!(max_deviation(&window, 1.0), 0.0);
        assert!(is_fixation(&window, 1.0));

        window.push(sample_at(5.0, 0.0, 0.0));
        window.push(sample_at(7.0, 0.0, 0.0));
        assert_eq!(dispersion(&window), 2.0);
    }
}
