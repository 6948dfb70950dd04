//! Distance-to-volume conversion for a horizontal cylindrical tank.
//!
//! The sensor measures the air gap above the water. Depth is derived from the
//! known empty-tank distance, the wetted cross-section is a circular segment,
//! and the result is scaled so that a full tank reads exactly the nominal
//! capacity. Out-of-range distances are clamped rather than rejected.

mod geometry;

pub use geometry::TankGeometry;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeEstimate {
    pub volume_liters: f64,
    pub fill_percent: f64,
    /// The measured distance put the water outside the tank cross-section and
    /// the estimate is pinned at empty or full.
    pub out_of_range: bool,
}

impl VolumeEstimate {
    fn empty(out_of_range: bool) -> Self {
        Self {
            volume_liters: 0.0,
            fill_percent: 0.0,
            out_of_range,
        }
    }

    fn full(geometry: &TankGeometry, out_of_range: bool) -> Self {
        Self {
            volume_liters: geometry.total_liters(),
            fill_percent: 100.0,
            out_of_range,
        }
    }
}

/// Converts a measured distance into a volume and fill percentage.
///
/// Never fails: NaN or out-of-domain distances yield an empty or full tank
/// with `out_of_range` set.
pub fn convert(distance_cm: f64, geometry: &TankGeometry) -> VolumeEstimate {
    if distance_cm.is_nan() {
        return VolumeEstimate::empty(true);
    }

    let diameter = geometry.diameter_cm();
    let raw_height = geometry.raw_height_cm(distance_cm);
    let out_of_range = !(0.0..=diameter).contains(&raw_height);
    let h = raw_height.clamp(0.0, diameter);

    if h <= 0.0 {
        return VolumeEstimate::empty(out_of_range);
    }
    // arccos hits its boundary at full depth; the full cylinder is exact.
    if h >= diameter {
        return VolumeEstimate::full(geometry, out_of_range);
    }

    let area = segment_area_cm2(geometry.radius_cm(), h);
    let raw_liters = area * geometry.length_cm() / 1000.0;
    let calibration = geometry.total_liters() / geometry.geometric_full_liters();
    let volume_liters = (raw_liters * calibration).clamp(0.0, geometry.total_liters());
    let fill_percent = (volume_liters / geometry.total_liters() * 100.0).clamp(0.0, 100.0);

    VolumeEstimate {
        volume_liters,
        fill_percent,
        out_of_range,
    }
}

/// Area of the circular segment of height `h` in a circle of radius `r`.
/// Requires `0 < h < 2r`.
fn segment_area_cm2(r: f64, h: f64) -> f64 {
    let offset = r - h;
    let chord_term = (2.0 * r * h - h * h).max(0.0).sqrt();
    let angle = (offset / r).clamp(-1.0, 1.0).acos();
    r * r * angle - offset * chord_term
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_tank() -> TankGeometry {
        TankGeometry::new(10_000.0, 184.5, 436.4, 20.0).unwrap()
    }

    #[test]
    fn full_air_gap_reads_exactly_full() {
        let estimate = convert(20.0, &reference_tank());
        assert_eq!(estimate.volume_liters, 10_000.0);
        assert_eq!(estimate.fill_percent, 100.0);
        assert!(!estimate.out_of_range);
    }

    #[test]
    fn max_distance_reads_empty() {
        let estimate = convert(204.5, &reference_tank());
        assert_eq!(estimate.volume_liters, 0.0);
        assert_eq!(estimate.fill_percent, 0.0);
        assert!(!estimate.out_of_range);
    }

    #[test]
    fn half_depth_is_half_volume() {
        let estimate = convert(112.25, &reference_tank());
        assert!((estimate.volume_liters - 5_000.0).abs() < 1e-6);
        assert!((estimate.fill_percent - 50.0).abs() < 1e-8);
    }

    #[test]
    fn volume_grows_as_distance_shrinks() {
        let tank = reference_tank();
        let mut previous = -1.0;
        let mut distance = 204.5;
        while distance >= 20.0 {
            let estimate = convert(distance, &tank);
            assert!(estimate.volume_liters >= previous, "distance {distance}");
            assert!((0.0..=100.0).contains(&estimate.fill_percent));
            previous = estimate.volume_liters;
            distance -= 0.5;
        }
    }

    #[test]
    fn out_of_domain_distances_are_clamped_and_flagged() {
        let tank = reference_tank();

        let submerged = convert(5.0, &tank);
        assert_eq!(submerged.fill_percent, 100.0);
        assert!(submerged.out_of_range);

        let below_bottom = convert(500.0, &tank);
        assert_eq!(below_bottom.fill_percent, 0.0);
        assert!(below_bottom.out_of_range);

        let negative = convert(-3.0, &tank);
        assert_eq!(negative.volume_liters, 10_000.0);
        assert!(negative.out_of_range);

        let nan = convert(f64::NAN, &tank);
        assert_eq!(nan.volume_liters, 0.0);
        assert!(nan.out_of_range);
    }

    #[test]
    fn calibration_scales_to_nominal_capacity() {
        // Geometric volume of this cylinder is ~11 667 L; nominal is 10 000 L.
        let tank = reference_tank();
        assert!(tank.geometric_full_liters() > tank.total_liters());

        let quarter_depth = tank.empty_distance_cm() - tank.diameter_cm() / 4.0;
        let estimate = convert(quarter_depth, &tank);
        let r = tank.radius_cm();
        let expected = segment_area_cm2(r, r / 2.0) / (std::f64::consts::PI * r * r) * 10_000.0;
        assert!((estimate.volume_liters - expected).abs() < 1e-6);
    }
}
