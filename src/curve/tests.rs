use approx::assert_relative_eq;
use nalgebra::Point2;

use super::interpolate::fit_parameters;
use super::{Axis, Spline, SplineType};

fn open_cubic() -> Spline<f64> {
    Spline::try_with_data(
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
    .unwrap()
}

#[test]
fn clamped_curve_interpolates_endpoints() {
    let spline = open_cubic();
    assert!(spline.validate());
    assert_relative_eq!(spline.point_at(0.), Point2::new(0., 0.), epsilon = 1e-12);
    assert_relative_eq!(spline.point_at(1.), Point2::new(4., 1.), epsilon = 1e-12);
}

#[test]
fn degree_out_of_range_is_rejected() {
    assert!(Spline::<f64>::try_new(0, false).is_err());
    assert!(Spline::<f64>::try_new(4, false).is_err());

    let mut spline = open_cubic();
    assert!(spline.set_degree(5).is_err());
    assert_eq!(spline.degree(), 3);
}

#[test]
fn incremental_construction_stays_valid() {
    let mut spline = Spline::<f64>::try_new(2, false).unwrap();
    spline.add_control_point(Point2::new(0., 0.), 1.);
    spline.add_control_point(Point2::new(1., 2.), 1.);
    assert!(!spline.validate());
    assert!(spline.stroke().is_empty());

    spline.add_control_point(Point2::new(2., 0.), 1.);
    assert!(spline.validate());
    assert_eq!(spline.stroke().len(), 33);

    spline.add_control_point(Point2::new(3., 1.), 1.);
    assert!(spline.validate());
    let (start, end) = spline.knots_domain();
    assert_relative_eq!(spline.point_at(start), Point2::new(0., 0.), epsilon = 1e-12);
    assert_relative_eq!(spline.point_at(end), Point2::new(3., 1.), epsilon = 1e-12);

    spline.remove_last_control_point();
    assert!(spline.validate());
    assert_eq!(spline.control_points().len(), 3);
}

#[test]
fn invalid_point_and_weight_edits_are_ignored() {
    let mut spline = open_cubic();
    let before = spline.control_points().to_vec();

    spline.set_control_point(99, Point2::new(5., 5.));
    spline.remove_control_point(99);
    spline.set_weight(1, -1.0);
    spline.set_weight(99, 2.0);
    assert_eq!(spline.control_points(), before.as_slice());
    assert_relative_eq!(spline.weight_at(1).unwrap(), 1.0);
    assert_eq!(spline.control_point_at(1), Some(&Point2::new(1., 2.)));
    assert_eq!(spline.control_point_at(99), None);

    // wrong-length weight sequence is rejected wholesale
    spline.set_weights(vec![1.0, 2.0]);
    assert_eq!(spline.weights().len(), 5);
    assert!(spline.validate());
}

#[test]
fn set_weights_on_closed_curve_handles_logical_length() {
    let mut spline = Spline::try_with_data(
        2,
        SplineType::WrappedClosed,
        vec![
            Point2::new(0., 0.),
            Point2::new(2., 0.),
            Point2::new(2., 2.),
            Point2::new(0., 2.),
        ],
        vec![],
        vec![],
    )
    .unwrap();

    // the logical count, what weights() reports, gets wrap duplicates added
    spline.set_weights(vec![2.0, 1.0, 1.0, 1.0]);
    assert!(spline.validate());
    assert!(spline.has_wrapped_control_points());
    assert_relative_eq!(spline.weight_at(0).unwrap(), 2.0);
    assert_relative_eq!(spline.weight_at(4).unwrap(), 2.0);

    // the wrap-expanded count is accepted as well
    spline.set_weights(vec![1.0; 6]);
    assert!(spline.validate());
    assert_relative_eq!(spline.weight_at(0).unwrap(), 1.0);

    // any other length is ignored
    spline.set_weights(vec![1.0; 3]);
    assert_eq!(spline.weights().len(), 4);
    assert!(spline.validate());

    // non-positive weights are rejected wholesale
    spline.set_weights(vec![-1.0; 4]);
    assert_relative_eq!(spline.weight_at(0).unwrap(), 1.0);
    assert!(spline.validate());
}

#[test]
fn knot_edit_on_closed_curve_keeps_the_seam() {
    let mut spline = Spline::try_with_data(
        2,
        SplineType::WrappedClosed,
        vec![
            Point2::new(0., 0.),
            Point2::new(2., 0.),
            Point2::new(2., 2.),
            Point2::new(0., 2.),
        ],
        vec![],
        vec![],
    )
    .unwrap();

    spline.set_knot(3, 2.5);
    assert!(spline.validate());
    assert_relative_eq!(spline.knots()[3], 2.5);
    // the seam span mirrors the edited one
    assert_relative_eq!(spline.knots()[7], 6.5);

    let (start, end) = spline.knots_domain();
    assert_relative_eq!(spline.point_at(start), spline.point_at(end), epsilon = 1e-9);
    assert_relative_eq!(
        spline.tangent_at(start),
        spline.tangent_at(end),
        epsilon = 1e-9
    );

    // whole-vector replacement gets the same seam repair
    spline.set_knot_vector(vec![0., 1., 2., 3.5, 4., 5., 6., 7., 8.]);
    assert!(spline.validate());
    assert_relative_eq!(spline.knots()[7], 7.5);
    assert_relative_eq!(spline.point_at(start), spline.point_at(end), epsilon = 1e-9);
}

#[test]
fn knot_edits_keep_the_curve_valid_or_unchanged() {
    let mut spline = open_cubic();

    // raising an end knot would break the clamped end condition
    let before = spline.knots().to_vec();
    spline.set_knot(8, 2.0);
    assert_eq!(spline.knots().to_vec(), before);

    // moving the interior knot is fine
    spline.set_knot(4, 0.25);
    assert!(spline.validate());
    assert_relative_eq!(spline.knots()[4], 0.25);

    spline.set_knot_vector(vec![0., 0., 0., 0., 0.75, 1., 1., 1., 1.]);
    assert!(spline.validate());

    // wrong length is rejected wholesale
    spline.set_knot_vector(vec![0., 1.]);
    assert_eq!(spline.knots().len(), 9);
    assert!(spline.validate());
}

#[test]
fn knot_insertion_preserves_shape() {
    let mut spline = open_cubic();
    let samples: Vec<_> = (0..=20).map(|i| i as f64 / 20.).collect();
    let before: Vec<_> = samples.iter().map(|u| spline.point_at(*u)).collect();

    spline.insert_knot(0.7);
    assert!(spline.validate());
    assert_eq!(spline.control_points().len(), 6);
    assert_eq!(spline.knots().len(), 10);

    for (u, expected) in samples.iter().zip(before.iter()) {
        assert_relative_eq!(spline.point_at(*u), *expected, epsilon = 1e-9);
    }
}

#[test]
fn knot_insertion_ignores_unrefinable_requests() {
    let mut spline = open_cubic();

    // endpoint insertion cannot refine the curve
    spline.insert_knot(0.0);
    spline.insert_knot(1.0);
    spline.insert_knot(-2.0);
    assert_eq!(spline.control_points().len(), 5);

    // multiplicity saturates at the degree
    spline.insert_knot(0.5);
    spline.insert_knot(0.5);
    assert_eq!(spline.control_points().len(), 7);
    spline.insert_knot(0.5);
    assert_eq!(spline.control_points().len(), 7);
    assert!(spline.validate());
}

#[test]
fn knot_insertion_on_closed_curve_keeps_it_closed() {
    let mut spline = Spline::try_with_data(
        2,
        SplineType::WrappedClosed,
        vec![
            Point2::new(0., 0.),
            Point2::new(2., 0.),
            Point2::new(2., 2.),
            Point2::new(0., 2.),
        ],
        vec![],
        vec![],
    )
    .unwrap();
    assert!(spline.validate());

    spline.insert_knot(0.5);
    assert!(spline.is_closed());
    assert!(spline.validate());
    assert_eq!(spline.control_points().len(), 5);
}

#[test]
fn closed_curve_joins_seamlessly() {
    let spline = Spline::try_with_data(
        2,
        SplineType::WrappedClosed,
        vec![
            Point2::new(0., 0.),
            Point2::new(2., 0.),
            Point2::new(2., 2.),
            Point2::new(0., 2.),
        ],
        vec![],
        vec![],
    )
    .unwrap();
    assert!(spline.has_wrapped_control_points());
    assert_eq!(spline.control_points().len(), 4);
    assert_eq!(spline.knots().len(), 9);
    assert_eq!(spline.unwrapped_knots().len(), 7);

    let (start, end) = spline.knots_domain();
    assert_relative_eq!(spline.point_at(start), spline.point_at(end), epsilon = 1e-9);
    assert_relative_eq!(
        spline.tangent_at(start),
        spline.tangent_at(end),
        epsilon = 1e-9
    );
}

#[test]
fn set_closed_with_too_few_points_only_flips_the_tag() {
    let mut spline = Spline::<f64>::try_new(2, false).unwrap();
    spline.add_control_point(Point2::new(0., 0.), 1.);
    spline.add_control_point(Point2::new(1., 0.), 1.);

    spline.set_closed(true);
    assert!(spline.is_closed());
    assert!(!spline.validate());

    // the next edit rebuilds a proper closed curve
    spline.add_control_point(Point2::new(1., 1.), 1.);
    assert!(spline.validate());
    assert!(spline.has_wrapped_control_points());
}

#[test]
fn type_round_trip_holds_invariants() {
    let mut spline = open_cubic();

    spline.change_type(SplineType::Standard);
    assert!(spline.validate());
    assert_eq!(spline.knots().start_multiplicity(), 1);
    assert_eq!(spline.knots().end_multiplicity(), 1);

    spline.change_type(SplineType::WrappedClosed);
    assert!(spline.validate());
    assert!(spline.has_wrapped_control_points());

    spline.change_type(SplineType::ClampedOpen);
    assert!(spline.validate());
    assert!(spline.knots().is_clamped(spline.degree()));
}

#[test]
fn rational_quarter_circle() {
    let w = std::f64::consts::FRAC_1_SQRT_2;
    let spline = Spline::try_with_data(
        2,
        SplineType::ClampedOpen,
        vec![
            Point2::new(1., 0.),
            Point2::new(1., 1.),
            Point2::new(0., 1.),
        ],
        vec![1., w, 1.],
        vec![0., 0., 0., 1., 1., 1.],
    )
    .unwrap();

    assert_relative_eq!(spline.point_at(0.5), Point2::new(w, w), epsilon = 1e-12);
    for i in 0..=10 {
        let u = i as f64 / 10.;
        assert_relative_eq!(spline.point_at(u).coords.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(spline.curvature_at(u), 1.0, epsilon = 1e-9);
    }
    // the circle is traversed counterclockwise
    assert!(spline.signed_curvature_at(0.5) > 0.);
}

#[test]
fn derivatives_match_finite_differences() {
    let spline = open_cubic();
    let h = 1e-5;
    for i in 1..10 {
        let u = i as f64 / 10.;
        let ders = spline.derivatives_at(u, 2);
        let fd1 = (spline.point_at(u + h) - spline.point_at(u - h)) / (2. * h);
        let fd2 = (spline.point_at(u + h).coords - spline.point_at(u).coords * 2.
            + spline.point_at(u - h).coords)
            / (h * h);
        assert_relative_eq!(ders[1], fd1, epsilon = 1e-6);
        assert_relative_eq!(ders[2], fd2, epsilon = 1e-4);
    }
}

#[test]
fn fit_parameters_are_monotone_and_normalized() {
    let points = vec![
        Point2::new(0., 0.),
        Point2::new(1., 1.),
        Point2::new(2., 0.),
        Point2::new(3., -1.),
        Point2::new(4., 0.),
    ];
    let u = fit_parameters(&points, true).unwrap();
    assert_eq!(u[0], 0.);
    assert_eq!(u[4], 1.);
    assert!(u.windows(2).all(|w| w[0] < w[1]));

    let coincident = vec![Point2::new(1., 1.); 4];
    assert!(fit_parameters(&coincident, true).is_none());
}

#[test]
fn fitted_curve_passes_through_fit_points() {
    let points = vec![
        Point2::new(0., 0.),
        Point2::new(1., 1.),
        Point2::new(2., 0.),
        Point2::new(3., -1.),
        Point2::new(4., 0.),
    ];
    let mut spline = Spline::<f64>::try_new(3, false).unwrap();
    spline.set_fit_points(points.clone(), true);
    assert!(spline.validate());
    assert_eq!(spline.kind(), SplineType::ClampedOpen);
    assert_eq!(spline.fit_points(), points.as_slice());

    let u = fit_parameters(&points, true).unwrap();
    for (u_i, p_i) in u.iter().zip(points.iter()) {
        assert_relative_eq!(spline.point_at(*u_i), *p_i, epsilon = 1e-8);
    }
}

#[test]
fn fitting_degenerate_point_sets() {
    let mut spline = Spline::<f64>::try_new(3, false).unwrap();

    spline.set_fit_points(vec![Point2::new(1., 1.)], true);
    assert!(spline.control_points().is_empty());
    assert!(spline.stroke().is_empty());

    // coincident points collapse to a single-point degenerate curve
    spline.set_fit_points(vec![Point2::new(1., 1.); 5], true);
    assert_eq!(spline.fit_points().len(), 5);
    assert_eq!(spline.control_points().len(), 1);
    assert_eq!(spline.knots().to_vec(), vec![0., 0., 1., 1.]);
    assert!(!spline.validate());
}

#[test]
fn fitting_a_closed_point_set() {
    let points = vec![
        Point2::new(0., 0.),
        Point2::new(2., 0.),
        Point2::new(2., 2.),
        Point2::new(0., 2.),
        Point2::new(0., 0.),
    ];
    let mut spline = Spline::<f64>::try_new(3, false).unwrap();
    spline.set_fit_points(points, true);
    assert!(spline.is_closed());
    assert!(spline.validate());

    let (start, end) = spline.knots_domain();
    assert_relative_eq!(spline.point_at(start), spline.point_at(end), epsilon = 1e-9);
}

#[test]
fn tight_bounding_box_covers_the_curve_peak() {
    let spline = Spline::try_with_data(
        2,
        SplineType::ClampedOpen,
        vec![
            Point2::new(0., 0.),
            Point2::new(1., 2.),
            Point2::new(2., 0.),
        ],
        vec![],
        vec![0., 0., 0., 1., 1., 1.],
    )
    .unwrap();

    let zeros = spline.find_derivative_zeros(Axis::Y);
    assert_eq!(zeros.len(), 1);
    assert_relative_eq!(zeros[0], 0.5, epsilon = 1e-8);
    assert!(spline.find_derivative_zeros(Axis::X).is_empty());

    let bb = spline.tight_bounding_box().unwrap();
    assert_relative_eq!(*bb.min(), Point2::new(0., 0.), epsilon = 1e-8);
    assert_relative_eq!(*bb.max(), Point2::new(2., 1.), epsilon = 1e-8);

    // the control net bound is looser
    let cb = spline.control_bounding_box().unwrap();
    assert_relative_eq!(*cb.max(), Point2::new(2., 2.), epsilon = 1e-12);
    assert!(cb.contains(bb.max()));
}

#[test]
fn stroke_follows_the_curve() {
    let spline = open_cubic();
    let stroke = spline.stroke();
    assert_eq!(stroke.len(), 33);
    assert_relative_eq!(stroke[0], Point2::new(0., 0.), epsilon = 1e-12);
    assert_relative_eq!(stroke[32], Point2::new(4., 1.), epsilon = 1e-12);
}

#[test]
fn parameter_estimate_tracks_knots() {
    let spline = open_cubic();
    assert_relative_eq!(spline.estimate_parameter_at(0), 0.0);
    assert_relative_eq!(spline.estimate_parameter_at(1), 0.5);
    assert_relative_eq!(spline.estimate_parameter_at(99), 0.0);
}

#[test]
fn cast_between_float_types() {
    let spline = open_cubic();
    let f32_spline: Spline<f32> = spline.cast();
    assert!(f32_spline.validate());
    assert_relative_eq!(
        f32_spline.point_at(0.5),
        Point2::new(spline.point_at(0.5).x as f32, spline.point_at(0.5).y as f32),
        epsilon = 1e-5
    );
}
