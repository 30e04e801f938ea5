// Copyright 2025 Cowboy AI, LLC.

//! Raw projection formulas
//!
//! Raw projections map `(λ, φ)` radians on the unit sphere to planar `(x, y)`
//! with y pointing north. Scaling, translation and rotation are applied by
//! [`StandardProjection`](super::StandardProjection).

use std::f64::consts::{FRAC_PI_2, PI};

use super::rotation::clamp_unit;

const EPSILON: f64 = 1e-6;
const EPSILON2: f64 = 1e-12;

/// Projection formula kinds shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawProjection {
    /// Conformal cylindrical
    Mercator,
    /// Plate carrée
    Equirectangular,
    /// Lambert conformal conic
    ConicConformal,
    /// Albers equal-area conic
    ConicEqualArea,
    /// Equidistant conic
    ConicEquidistant,
    /// Lambert azimuthal equal-area
    AzimuthalEqualArea,
    /// Azimuthal equidistant
    AzimuthalEquidistant,
    /// Orthographic (globe view)
    Orthographic,
    /// Stereographic
    Stereographic,
    /// Natural Earth I
    NaturalEarth,
    /// Equal Earth
    EqualEarth,
}

impl RawProjection {
    /// Whether the formula depends on two standard parallels
    pub fn uses_parallels(self) -> bool {
        matches!(
            self,
            RawProjection::ConicConformal
                | RawProjection::ConicEqualArea
                | RawProjection::ConicEquidistant
        )
    }
}

/// A raw projection with its parallel-dependent constants resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawKernel {
    Mercator,
    Equirectangular,
    CylindricalEqualArea { cos_phi0: f64 },
    ConicConformal { n: f64, f: f64 },
    ConicEqualArea { n: f64, c: f64, r0: f64 },
    ConicEquidistant { n: f64, g: f64 },
    AzimuthalEqualArea,
    AzimuthalEquidistant,
    Orthographic,
    Stereographic,
    NaturalEarth,
    EqualEarth,
}

impl RawKernel {
    /// Resolve a kind; `parallels` are degrees and ignored by non-conic kinds
    pub(crate) fn new(kind: RawProjection, parallels: [f64; 2]) -> Self {
        let y0 = parallels[0].to_radians();
        let y1 = parallels[1].to_radians();
        match kind {
            RawProjection::Mercator => RawKernel::Mercator,
            RawProjection::Equirectangular => RawKernel::Equirectangular,
            RawProjection::ConicConformal => {
                let cy0 = y0.cos();
                let n = if y0 == y1 {
                    y0.sin()
                } else {
                    (cy0 / y1.cos()).ln() / (tany(y1) / tany(y0)).ln()
                };
                if !n.is_finite() || n.abs() < EPSILON {
                    return RawKernel::Mercator;
                }
                let f = cy0 * tany(y0).powf(n) / n;
                RawKernel::ConicConformal { n, f }
            }
            RawProjection::ConicEqualArea => {
                let sy0 = y0.sin();
                let n = (sy0 + y1.sin()) / 2.0;
                if n.abs() < EPSILON {
                    return RawKernel::CylindricalEqualArea { cos_phi0: y0.cos() };
                }
                let c = 1.0 + sy0 * (2.0 * n - sy0);
                RawKernel::ConicEqualArea {
                    n,
                    c,
                    r0: c.sqrt() / n,
                }
            }
            RawProjection::ConicEquidistant => {
                let cy0 = y0.cos();
                let n = if y0 == y1 {
                    y0.sin()
                } else {
                    (cy0 - y1.cos()) / (y1 - y0)
                };
                if n.abs() < EPSILON {
                    return RawKernel::Equirectangular;
                }
                RawKernel::ConicEquidistant { n, g: cy0 / n + y0 }
            }
            RawProjection::AzimuthalEqualArea => RawKernel::AzimuthalEqualArea,
            RawProjection::AzimuthalEquidistant => RawKernel::AzimuthalEquidistant,
            RawProjection::Orthographic => RawKernel::Orthographic,
            RawProjection::Stereographic => RawKernel::Stereographic,
            RawProjection::NaturalEarth => RawKernel::NaturalEarth,
            RawProjection::EqualEarth => RawKernel::EqualEarth,
        }
    }

    /// Project radians; `None` where the formula is singular
    pub(crate) fn forward(&self, lambda: f64, phi: f64) -> Option<[f64; 2]> {
        let out = match *self {
            RawKernel::Mercator => {
                if FRAC_PI_2 - phi.abs() < EPSILON {
                    return None;
                }
                [lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln()]
            }
            RawKernel::Equirectangular => [lambda, phi],
            RawKernel::CylindricalEqualArea { cos_phi0 } => {
                [lambda * cos_phi0, phi.sin() / cos_phi0]
            }
            RawKernel::ConicConformal { n, f } => {
                let phi = if f > 0.0 {
                    phi.max(-FRAC_PI_2 + EPSILON)
                } else {
                    phi.min(FRAC_PI_2 - EPSILON)
                };
                let r = f / tany(phi).powf(n);
                [r * (n * lambda).sin(), f - r * (n * lambda).cos()]
            }
            RawKernel::ConicEqualArea { n, c, r0 } => {
                let r = (c - 2.0 * n * phi.sin()).max(0.0).sqrt() / n;
                let x = lambda * n;
                [r * x.sin(), r0 - r * x.cos()]
            }
            RawKernel::ConicEquidistant { n, g } => {
                let gy = g - phi;
                let nx = n * lambda;
                [gy * nx.sin(), g - gy * nx.cos()]
            }
            RawKernel::AzimuthalEqualArea => {
                azimuthal_forward(lambda, phi, |cxcy| (2.0 / (1.0 + cxcy)).sqrt())?
            }
            RawKernel::AzimuthalEquidistant => azimuthal_forward(lambda, phi, |cxcy| {
                let c = clamp_unit(cxcy).acos();
                if c == 0.0 {
                    0.0
                } else {
                    c / c.sin()
                }
            })?,
            RawKernel::Orthographic => [phi.cos() * lambda.sin(), phi.sin()],
            RawKernel::Stereographic => {
                let cy = phi.cos();
                let k = 1.0 + lambda.cos() * cy;
                [cy * lambda.sin() / k, phi.sin() / k]
            }
            RawKernel::NaturalEarth => {
                let phi2 = phi * phi;
                let phi4 = phi2 * phi2;
                [
                    lambda
                        * (0.8707 - 0.131979 * phi2
                            + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
                    phi * (1.007226
                        + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
                ]
            }
            RawKernel::EqualEarth => {
                let l = (EE_M * phi.sin()).asin();
                let l2 = l * l;
                let l6 = l2 * l2 * l2;
                [
                    lambda * l.cos()
                        / (EE_M * (EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2))),
                    l * (EE_A1 + EE_A2 * l2 + l6 * (EE_A3 + EE_A4 * l2)),
                ]
            }
        };
        finite(out)
    }

    /// Inverse of [`RawKernel::forward`]
    pub(crate) fn invert(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let out = match *self {
            RawKernel::Mercator => [x, 2.0 * y.exp().atan() - FRAC_PI_2],
            RawKernel::Equirectangular => [x, y],
            RawKernel::CylindricalEqualArea { cos_phi0 } => {
                [x / cos_phi0, clamp_unit(y * cos_phi0).asin()]
            }
            RawKernel::ConicConformal { n, f } => {
                let fy = f - y;
                let r = sign(n) * (x * x + fy * fy).sqrt();
                let l = conic_longitude(x, fy, n);
                [l / n, 2.0 * (f / r).powf(1.0 / n).atan() - FRAC_PI_2]
            }
            RawKernel::ConicEqualArea { n, c, r0 } => {
                let r0y = r0 - y;
                let l = conic_longitude(x, r0y, n);
                [
                    l / n,
                    clamp_unit((c - (x * x + r0y * r0y) * n * n) / (2.0 * n)).asin(),
                ]
            }
            RawKernel::ConicEquidistant { n, g } => {
                let gy = g - y;
                let l = conic_longitude(x, gy, n);
                [l / n, g - sign(n) * (x * x + gy * gy).sqrt()]
            }
            RawKernel::AzimuthalEqualArea => {
                azimuthal_invert(x, y, |z| 2.0 * clamp_unit(z / 2.0).asin())
            }
            RawKernel::AzimuthalEquidistant => azimuthal_invert(x, y, |z| z),
            RawKernel::Orthographic => {
                if x * x + y * y > 1.0 + EPSILON {
                    return None;
                }
                azimuthal_invert(x, y, |z| clamp_unit(z).asin())
            }
            RawKernel::Stereographic => azimuthal_invert(x, y, |z| 2.0 * z.atan()),
            RawKernel::NaturalEarth => {
                let mut phi = y;
                let mut i = 25;
                loop {
                    let phi2 = phi * phi;
                    let phi4 = phi2 * phi2;
                    let delta = (phi
                        * (1.007226
                            + phi2
                                * (0.015085
                                    + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
                        - y)
                        / (1.007226
                            + phi2
                                * (0.015085 * 3.0
                                    + phi4
                                        * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2
                                            - 0.005916 * 11.0 * phi4)));
                    phi -= delta;
                    i -= 1;
                    if delta.abs() <= EPSILON || i == 0 {
                        break;
                    }
                }
                let phi2 = phi * phi;
                [
                    x / (0.8707
                        + phi2
                            * (-0.131979
                                + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2)))),
                    phi,
                ]
            }
            RawKernel::EqualEarth => {
                let mut l = y;
                for _ in 0..12 {
                    let l2 = l * l;
                    let l6 = l2 * l2 * l2;
                    let fy = l * (EE_A1 + EE_A2 * l2 + l6 * (EE_A3 + EE_A4 * l2)) - y;
                    let fpy = EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2);
                    let delta = fy / fpy;
                    l -= delta;
                    if delta.abs() < EPSILON2 {
                        break;
                    }
                }
                let l2 = l * l;
                let l6 = l2 * l2 * l2;
                [
                    EE_M * x * (EE_A1 + 3.0 * EE_A2 * l2 + l6 * (7.0 * EE_A3 + 9.0 * EE_A4 * l2))
                        / l.cos(),
                    clamp_unit(l.sin() / EE_M).asin(),
                ]
            }
        };
        finite(out)
    }
}

const EE_A1: f64 = 1.340264;
const EE_A2: f64 = -0.081106;
const EE_A3: f64 = 0.000893;
const EE_A4: f64 = 0.003796;
const EE_M: f64 = 0.866_025_403_784_438_6;

fn tany(y: f64) -> f64 {
    ((FRAC_PI_2 + y) / 2.0).tan()
}

/// -1, 0 or 1; zero stays zero unlike `f64::signum`
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn conic_longitude(x: f64, ry: f64, n: f64) -> f64 {
    let mut l = x.atan2(ry.abs()) * sign(ry);
    if ry * n < 0.0 {
        l -= PI * sign(x) * sign(ry);
    }
    l
}

fn azimuthal_forward(lambda: f64, phi: f64, scale: impl Fn(f64) -> f64) -> Option<[f64; 2]> {
    let cx = lambda.cos();
    let cy = phi.cos();
    let k = scale(cx * cy);
    if !k.is_finite() {
        return None;
    }
    Some([k * cy * lambda.sin(), k * phi.sin()])
}

fn azimuthal_invert(x: f64, y: f64, angle: impl Fn(f64) -> f64) -> [f64; 2] {
    let z = (x * x + y * y).sqrt();
    let c = angle(z);
    let sc = c.sin();
    let cc = c.cos();
    [
        (x * sc).atan2(z * cc),
        if z == 0.0 { 0.0 } else { clamp_unit(y * sc / z).asin() },
    ]
}

fn finite(p: [f64; 2]) -> Option<[f64; 2]> {
    (p[0].is_finite() && p[1].is_finite()).then_some(p)
}
