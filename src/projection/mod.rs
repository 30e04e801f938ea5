// Copyright 2025 Cowboy AI, LLC.

//! The projection interface
//!
//! A [`Projection`] maps geographic positions to canvas pixels and back, and
//! can wrap a [`GeoStream`] so that geometry flows through it. Territory
//! sub-projections and the composite built from them both implement it, so
//! callers never need to know which one they hold.

mod clip;
mod raw;
mod rotation;
mod standard;
mod stream;

pub use clip::{clip_polyline, clip_ring, ClipRectStream};
pub use raw::RawProjection;
pub use rotation::Rotation;
pub use standard::StandardProjection;
pub use stream::{replay, BoundsStream, GeoStream, RecordingStream, StreamEvent};

use std::fmt;

use crate::geometry::{stream_geometry, Geometry, Position};

/// Scale the fitting routines start from
const FIT_BASE_SCALE: f64 = 150.0;

/// A configurable map projection
///
/// Accessors mirror the usual projection knobs. Knobs a projection cannot
/// honour (parallels on a cylindrical projection, distance on anything but a
/// perspective projection) report `false` from their setter and are ignored.
pub trait Projection: fmt::Debug + Send + Sync {
    /// Project `[longitude, latitude]` to a pixel, `None` if not visible
    fn project(&self, coordinates: Position) -> Option<[f64; 2]>;

    /// Pixel back to `[longitude, latitude]`, `None` if outside the projection
    fn invert(&self, point: [f64; 2]) -> Option<Position>;

    /// Wrap `sink` so geographic geometry streamed in arrives projected
    fn stream<'a>(&'a self, sink: &'a mut dyn GeoStream) -> Box<dyn GeoStream + 'a>;

    /// Scale factor
    fn scale(&self) -> f64;

    /// Set the scale factor
    fn set_scale(&mut self, scale: f64);

    /// Pixel the projection center lands on
    fn translate(&self) -> [f64; 2];

    /// Move the projection center
    fn set_translate(&mut self, translate: [f64; 2]);

    /// `[λ, φ, γ]` rotation in degrees
    fn rotate(&self) -> [f64; 3];

    /// Set the rotation
    fn set_rotate(&mut self, rotate: [f64; 3]);

    /// `[longitude, latitude]` placed at the translate pixel
    fn center(&self) -> Position;

    /// Set the center
    fn set_center(&mut self, center: Position);

    /// Standard parallels, for projections that have them
    fn parallels(&self) -> Option<[f64; 2]> {
        None
    }

    /// Set the standard parallels; `false` when unsupported
    fn set_parallels(&mut self, _parallels: [f64; 2]) -> bool {
        false
    }

    /// Small-circle clip radius in degrees
    fn clip_angle(&self) -> Option<f64>;

    /// Set or clear the small-circle clip radius
    fn set_clip_angle(&mut self, angle: Option<f64>);

    /// Pixel clip rectangle `[[x0, y0], [x1, y1]]`
    fn clip_extent(&self) -> Option<[[f64; 2]; 2]>;

    /// Set or clear the pixel clip rectangle
    fn set_clip_extent(&mut self, extent: Option<[[f64; 2]; 2]>);

    /// Resampling threshold in pixels, for implementations that resample
    fn precision(&self) -> f64;

    /// Set the resampling threshold
    fn set_precision(&mut self, precision: f64);

    /// Perspective distance in sphere radii; `false` when unsupported
    fn set_distance(&mut self, _distance: f64) -> bool {
        false
    }

    /// Perspective tilt in degrees; `false` when unsupported
    fn set_tilt(&mut self, _tilt: f64) -> bool {
        false
    }

    /// Clone behind a box
    fn clone_box(&self) -> Box<dyn Projection>;

    /// Set scale and translate so `object` fills `extent`
    ///
    /// The clip extent is lifted while measuring and restored afterwards.
    /// Objects that project to nothing, or to a single pixel, leave the
    /// projection unchanged.
    fn fit_extent(&mut self, extent: [[f64; 2]; 2], object: &Geometry) {
        let clip = self.clip_extent();
        let previous_scale = self.scale();
        let previous_translate = self.translate();
        self.set_clip_extent(None);
        self.set_scale(FIT_BASE_SCALE);
        self.set_translate([0.0, 0.0]);

        let mut measure = BoundsStream::default();
        {
            let mut stream = self.stream(&mut measure);
            stream_geometry(object, stream.as_mut());
        }

        let fitted = measure.bounds().and_then(|b| {
            let w = extent[1][0] - extent[0][0];
            let h = extent[1][1] - extent[0][1];
            let k = (w / (b[1][0] - b[0][0])).min(h / (b[1][1] - b[0][1]));
            (k.is_finite() && k > 0.0).then(|| {
                let x = extent[0][0] + (w - k * (b[1][0] + b[0][0])) / 2.0;
                let y = extent[0][1] + (h - k * (b[1][1] + b[0][1])) / 2.0;
                (FIT_BASE_SCALE * k, [x, y])
            })
        });

        match fitted {
            Some((scale, translate)) => {
                self.set_scale(scale);
                self.set_translate(translate);
            }
            None => {
                self.set_scale(previous_scale);
                self.set_translate(previous_translate);
            }
        }
        self.set_clip_extent(clip);
    }

    /// [`Projection::fit_extent`] with the extent anchored at the origin
    fn fit_size(&mut self, size: [f64; 2], object: &Geometry) {
        self.fit_extent([[0.0, 0.0], size], object);
    }
}

impl Clone for Box<dyn Projection> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_size_centers_object() {
        let mut projection = StandardProjection::new(RawProjection::Equirectangular);
        let square = Geometry::Polygon {
            coordinates: vec![vec![
                [-10.0, -10.0],
                [10.0, -10.0],
                [10.0, 10.0],
                [-10.0, 10.0],
                [-10.0, -10.0],
            ]],
        };
        projection.fit_size([200.0, 200.0], &square);

        let [x0, y0] = projection.project([-10.0, 10.0]).unwrap();
        let [x1, y1] = projection.project([10.0, -10.0]).unwrap();
        assert!((x0 - 0.0).abs() < 1e-6 && (y0 - 0.0).abs() < 1e-6);
        assert!((x1 - 200.0).abs() < 1e-6 && (y1 - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_ignores_degenerate_object() {
        let mut projection = StandardProjection::new(RawProjection::Mercator);
        projection.set_scale(321.0);
        projection.fit_size(
            [100.0, 100.0],
            &Geometry::Point {
                coordinates: [2.0, 46.0],
            },
        );
        assert_eq!(projection.scale(), 321.0);
    }

    #[test]
    fn test_boxed_clone_is_independent() {
        let original: Box<dyn Projection> =
            Box::new(StandardProjection::new(RawProjection::Mercator));
        let mut copy = original.clone();
        copy.set_scale(999.0);
        assert_ne!(original.scale(), copy.scale());
    }
}
