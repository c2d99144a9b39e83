//! Unit tests for demand.

use cellflow_core::SimRng;

use crate::curve::DemandCurve;
use crate::error::DemandError;

#[cfg(test)]
mod count_tests {
    use super::*;

    #[test]
    fn zero_curve_generates_nothing() {
        let curve = DemandCurve::new(vec![0.0, 0.0]);
        let mut rng = SimRng::new(1);
        for t in 0..2 {
            assert_eq!(curve.generate_count(t, 0.0, &mut rng), 0);
        }
    }

    #[test]
    fn integer_demand_is_exact_without_noise() {
        let curve = DemandCurve::new(vec![3.0]);
        let mut rng = SimRng::new(1);
        for _ in 0..100 {
            assert_eq!(curve.generate_count(0, 0.0, &mut rng), 3);
        }
    }

    #[test]
    fn fractional_demand_bernoulli_tail() {
        // Value 2.3 with no noise: 2 with p = 0.7, 3 with p = 0.3, and an
        // empirical mean within 0.02 of 2.3 over 1e5 draws.
        let curve = DemandCurve::new(vec![2.3]);
        let mut rng = SimRng::new(12345);
        let trials = 100_000u64;
        let mut total = 0u64;
        for _ in 0..trials {
            let n = curve.generate_count(0, 0.0, &mut rng);
            assert!(n == 2 || n == 3, "unexpected count {n}");
            total += n as u64;
        }
        let mean = total as f64 / trials as f64;
        assert!((mean - 2.3).abs() < 0.02, "mean {mean}");
    }

    #[test]
    fn out_of_range_time_clamps_to_last_entry() {
        let curve = DemandCurve::new(vec![1.0, 5.0]);
        let mut rng = SimRng::new(1);
        assert_eq!(curve.generate_count(99, 0.0, &mut rng), 5);
    }

    #[test]
    fn noise_never_goes_negative() {
        let curve = DemandCurve::new(vec![0.4]);
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            // Counts stay within the possible support {0, 1} even at full noise.
            let n = curve.generate_count(0, 1.0, &mut rng);
            assert!(n <= 1, "count {n}");
        }
    }
}

#[cfg(test)]
mod adjust_tests {
    use super::*;

    #[test]
    fn affine_transform_without_noise() {
        let raw = DemandCurve::new(vec![1.0, 2.0, 3.0]);
        let mut rng = SimRng::new(1);
        let adjusted = raw.adjusted(2.0, 0.5, 0.0, &mut rng);
        assert_eq!(adjusted.values(), &[2.5, 4.5, 6.5]);
    }

    #[test]
    fn negative_results_clamp_to_zero() {
        let raw = DemandCurve::new(vec![1.0]);
        let mut rng = SimRng::new(1);
        let adjusted = raw.adjusted(1.0, -5.0, 0.0, &mut rng);
        assert_eq!(adjusted.values(), &[0.0]);
    }

    #[test]
    fn daily_noise_factor_is_shared_across_slots() {
        let raw = DemandCurve::new(vec![1.0, 2.0, 4.0]);
        let mut rng = SimRng::new(99);
        let adjusted = raw.adjusted(1.0, 0.0, 0.5, &mut rng);
        // One shared factor preserves the ratios between slots.
        let f = adjusted.values()[0];
        assert!((adjusted.values()[1] - 2.0 * f).abs() < 1e-12);
        assert!((adjusted.values()[2] - 4.0 * f).abs() < 1e-12);
    }

    #[test]
    fn noise_bounds_respected() {
        let raw = DemandCurve::new(vec![10.0]);
        let mut rng = SimRng::new(3);
        for _ in 0..1000 {
            let v = raw.adjusted(1.0, 0.0, 0.2, &mut rng).values()[0];
            assert!((8.0..=12.0).contains(&v), "value {v}");
        }
    }
}

#[cfg(test)]
mod loader_tests {
    use super::*;

    #[test]
    fn loads_values_skipping_header() {
        let csv = "time,demand\n0,1.5\n1,2.25\n2,0\n";
        let curve = DemandCurve::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(curve.values(), &[1.5, 2.25, 0.0]);
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = DemandCurve::from_csv_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, DemandError::EmptyCurve));

        let err = DemandCurve::from_csv_reader("time,demand\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DemandError::EmptyCurve));
    }

    #[test]
    fn unparseable_value_is_rejected() {
        let csv = "time,demand\n0,abc\n";
        let err = DemandCurve::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DemandError::Parse { record: 1, .. }));
    }

    #[test]
    fn short_record_is_rejected() {
        let csv = "time,demand\n0\n";
        let err = DemandCurve::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DemandError::ShortRecord { .. }));
    }
}
