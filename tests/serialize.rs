#![cfg(feature = "serde")]

use approx::assert_relative_eq;
use nalgebra::Point2;
use nurbs2d::prelude::*;

#[test]
fn test_serialization_round_trip() {
    let spline = Spline::try_with_data(
        3,
        SplineType::ClampedOpen,
        vec![
            Point2::new(0., 0.),
            Point2::new(1., 2.),
            Point2::new(2., 2.),
            Point2::new(3., 0.),
            Point2::new(4., 1.),
        ],
        vec![],
        vec![0., 0., 0., 0., 0.5, 1., 1., 1., 1.],
    )
    .unwrap();

    let json = serde_json::to_string_pretty(&spline).unwrap();
    let mut deserialized: Spline<f64> = serde_json::from_str(&json).unwrap();
    assert!(deserialized.validate());

    // the stroke cache is not serialized, a single update restores it
    assert!(deserialized.stroke().is_empty());
    deserialized.update();
    assert_eq!(deserialized.stroke().len(), spline.stroke().len());

    for i in 0..=10 {
        let u = i as f64 / 10.;
        assert_relative_eq!(deserialized.point_at(u), spline.point_at(u));
    }
}
