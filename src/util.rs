pub mod math {
    use std::f32::consts::TAU;

    /// Unit direction for azimuth `theta` and polar angle `phi`, with +Y as the pole.
    pub fn spherical_to_cartesian(theta: f32, phi: f32) -> glam::Vec3 {
        glam::Vec3::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin())
    }

    /// Wrap an angle into `[0, 2π)`.
    pub fn wrap_angle(angle: f32) -> f32 {
        let wrapped = angle.rem_euclid(TAU);
        // rem_euclid rounds tiny negative inputs up to exactly TAU
        if wrapped >= TAU {
            0.0
        } else {
            wrapped
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wrap_angle_reenters_from_opposite_edge() {
            assert_eq!(wrap_angle(0.0), 0.0);
            assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
            assert!((wrap_angle(-0.5) - (TAU - 0.5)).abs() < 1e-5);
            assert_eq!(wrap_angle(TAU), 0.0);
            assert!(wrap_angle(-1e-9) < TAU);
        }

        #[test]
        fn spherical_equator_points_along_x() {
            let dir = spherical_to_cartesian(0.0, std::f32::consts::FRAC_PI_2);
            assert!((dir - glam::Vec3::X).length() < 1e-6);
        }
    }
}
