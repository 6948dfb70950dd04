use serde::Serialize;

use crate::error::InvalidGeometry;

/// Dimensions of a horizontal cylindrical tank with a distance sensor mounted
/// above it.
///
/// Built once at startup through [`TankGeometry::new`], which rejects
/// dimensions that cannot describe a cylinder, and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TankGeometry {
    total_liters: f64,
    diameter_cm: f64,
    length_cm: f64,
    full_air_gap_cm: f64,
}

impl TankGeometry {
    pub fn new(
        total_liters: f64,
        diameter_cm: f64,
        length_cm: f64,
        full_air_gap_cm: f64,
    ) -> Result<Self, InvalidGeometry> {
        if !(total_liters.is_finite() && total_liters > 0.0) {
            return Err(InvalidGeometry::TotalLiters(total_liters));
        }
        if !(diameter_cm.is_finite() && diameter_cm > 0.0) {
            return Err(InvalidGeometry::Diameter(diameter_cm));
        }
        if !(length_cm.is_finite() && length_cm > 0.0) {
            return Err(InvalidGeometry::Length(length_cm));
        }
        if !(full_air_gap_cm.is_finite() && full_air_gap_cm >= 0.0) {
            return Err(InvalidGeometry::FullAirGap(full_air_gap_cm));
        }

        Ok(Self {
            total_liters,
            diameter_cm,
            length_cm,
            full_air_gap_cm,
        })
    }

    pub fn total_liters(&self) -> f64 {
        self.total_liters
    }

    pub fn diameter_cm(&self) -> f64 {
        self.diameter_cm
    }

    pub fn length_cm(&self) -> f64 {
        self.length_cm
    }

    pub fn full_air_gap_cm(&self) -> f64 {
        self.full_air_gap_cm
    }

    pub fn radius_cm(&self) -> f64 {
        self.diameter_cm / 2.0
    }

    /// Distance the sensor reports when the tank is empty.
    pub fn empty_distance_cm(&self) -> f64 {
        self.full_air_gap_cm + self.diameter_cm
    }

    /// Water depth for a measured distance, before clamping.
    pub fn raw_height_cm(&self, distance_cm: f64) -> f64 {
        self.empty_distance_cm() - distance_cm
    }

    /// Volume of the full cylinder from its dimensions alone, in liters.
    pub fn geometric_full_liters(&self) -> f64 {
        let r = self.radius_cm();
        std::f64::consts::PI * r * r * self.length_cm / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_dimensions() {
        assert_eq!(
            TankGeometry::new(0.0, 184.5, 436.4, 20.0),
            Err(InvalidGeometry::TotalLiters(0.0))
        );
        assert_eq!(
            TankGeometry::new(10_000.0, -1.0, 436.4, 20.0),
            Err(InvalidGeometry::Diameter(-1.0))
        );
        assert!(matches!(
            TankGeometry::new(10_000.0, 184.5, f64::NAN, 20.0),
            Err(InvalidGeometry::Length(_))
        ));
        assert_eq!(
            TankGeometry::new(10_000.0, 184.5, 436.4, -0.5),
            Err(InvalidGeometry::FullAirGap(-0.5))
        );
    }

    #[test]
    fn zero_air_gap_is_allowed() {
        let geometry = TankGeometry::new(1_000.0, 100.0, 200.0, 0.0).unwrap();
        assert_eq!(geometry.empty_distance_cm(), 100.0);
    }
}
