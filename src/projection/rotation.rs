// Copyright 2025 Cowboy AI, LLC.

//! Spherical rotation by yaw (λ), pitch (φ) and roll (γ)
//!
//! Angles are taken in degrees and applied in radians. Rotating by `[λ, φ, γ]`
//! first shifts longitudes by λ, then tilts the sphere by φ and rolls it by γ.

use std::f64::consts::PI;

const TAU: f64 = PI * 2.0;

/// Precomputed rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    delta_lambda: f64,
    cos_delta_phi: f64,
    sin_delta_phi: f64,
    cos_delta_gamma: f64,
    sin_delta_gamma: f64,
    tilted: bool,
}

impl Rotation {
    /// Build from a `[λ, φ, γ]` triple in degrees
    pub fn from_degrees(rotate: [f64; 3]) -> Self {
        let delta_lambda = (rotate[0].to_radians()) % TAU;
        let delta_phi = rotate[1].to_radians();
        let delta_gamma = rotate[2].to_radians();
        Self {
            delta_lambda,
            cos_delta_phi: delta_phi.cos(),
            sin_delta_phi: delta_phi.sin(),
            cos_delta_gamma: delta_gamma.cos(),
            sin_delta_gamma: delta_gamma.sin(),
            tilted: delta_phi != 0.0 || delta_gamma != 0.0,
        }
    }

    /// Rotate `(λ, φ)` in radians
    pub fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap(lambda + self.delta_lambda);
        if !self.tilted {
            return (lambda, phi);
        }
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * self.cos_delta_phi + x * self.sin_delta_phi;
        (
            (y * self.cos_delta_gamma - k * self.sin_delta_gamma)
                .atan2(x * self.cos_delta_phi - z * self.sin_delta_phi),
            clamp_unit(k * self.cos_delta_gamma + y * self.sin_delta_gamma).asin(),
        )
    }

    /// Undo [`Rotation::forward`]
    pub fn invert(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (lambda, phi) = if self.tilted {
            let cos_phi = phi.cos();
            let x = lambda.cos() * cos_phi;
            let y = lambda.sin() * cos_phi;
            let z = phi.sin();
            let k = z * self.cos_delta_gamma - y * self.sin_delta_gamma;
            (
                (y * self.cos_delta_gamma + z * self.sin_delta_gamma)
                    .atan2(x * self.cos_delta_phi + k * self.sin_delta_phi),
                clamp_unit(k * self.cos_delta_phi - x * self.sin_delta_phi).asin(),
            )
        } else {
            (lambda, phi)
        };
        (wrap(lambda - self.delta_lambda), phi)
    }
}

fn wrap(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - TAU
    } else if lambda < -PI {
        lambda + TAU
    } else {
        lambda
    }
}

pub(crate) fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = Rotation::from_degrees([0.0, 0.0, 0.0]);
        assert_eq!(rotation.forward(0.3, -0.2), (0.3, -0.2));
        assert_eq!(rotation.invert(0.3, -0.2), (0.3, -0.2));
    }

    #[test]
    fn test_yaw_moves_focus_to_origin() {
        let rotation = Rotation::from_degrees([-2.0, 0.0, 0.0]);
        let (lambda, phi) = rotation.forward(2f64.to_radians(), 0.0);
        assert!(close((lambda, phi), (0.0, 0.0)));
    }

    #[test]
    fn test_pitch_moves_focus_to_origin() {
        let rotation = Rotation::from_degrees([-10.0, -45.0, 0.0]);
        let focus = rotation.forward(10f64.to_radians(), 45f64.to_radians());
        assert!(close(focus, (0.0, 0.0)));
    }

    #[test]
    fn test_forward_then_invert() {
        let rotation = Rotation::from_degrees([30.0, -20.0, 15.0]);
        for &(lambda, phi) in &[(0.1, 0.2), (-2.0, 1.0), (3.0, -1.2)] {
            let (rl, rp) = rotation.forward(lambda, phi);
            assert!(close(rotation.invert(rl, rp), (lambda, phi)));
        }
    }
}
