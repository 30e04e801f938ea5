// Copyright 2025 Cowboy AI, LLC.

//! Single-formula projections

use super::clip::ClipRectStream;
use super::raw::{RawKernel, RawProjection};
use super::rotation::Rotation;
use super::stream::GeoStream;
use super::Projection;
use crate::geometry::Position;

const DEFAULT_SCALE: f64 = 150.0;
const DEFAULT_TRANSLATE: [f64; 2] = [480.0, 250.0];
const DEFAULT_PARALLELS: [f64; 2] = [30.0, 50.0];
const DEFAULT_PRECISION: f64 = 0.1;
const CLIP_EPSILON: f64 = 1e-9;

/// A raw projection plus scale, translate, rotation, center and clipping
///
/// Segments between projected vertices are drawn straight; no adaptive
/// resampling is done, and `precision` is only recorded so callers that
/// resample downstream can read it back.
#[derive(Debug, Clone)]
pub struct StandardProjection {
    kind: RawProjection,
    kernel: RawKernel,
    scale: f64,
    translate: [f64; 2],
    rotate: [f64; 3],
    center: Position,
    parallels: [f64; 2],
    clip_angle: Option<f64>,
    clip_extent: Option<[[f64; 2]; 2]>,
    precision: f64,
    rotation: Rotation,
    center_offset: [f64; 2],
}

impl StandardProjection {
    /// Create with default settings for `kind`
    pub fn new(kind: RawProjection) -> Self {
        let clip_angle = match kind {
            RawProjection::Orthographic => Some(90.0),
            RawProjection::Stereographic => Some(142.0),
            _ => None,
        };
        let mut projection = Self {
            kind,
            kernel: RawKernel::new(kind, DEFAULT_PARALLELS),
            scale: DEFAULT_SCALE,
            translate: DEFAULT_TRANSLATE,
            rotate: [0.0, 0.0, 0.0],
            center: [0.0, 0.0],
            parallels: DEFAULT_PARALLELS,
            clip_angle,
            clip_extent: None,
            precision: DEFAULT_PRECISION,
            rotation: Rotation::from_degrees([0.0, 0.0, 0.0]),
            center_offset: [0.0, 0.0],
        };
        projection.recenter();
        projection
    }

    /// Builder-style parallels, for registry constructors
    pub fn with_parallels(mut self, parallels: [f64; 2]) -> Self {
        self.set_parallels(parallels);
        self
    }

    /// Builder-style rotation
    pub fn with_rotate(mut self, rotate: [f64; 3]) -> Self {
        self.set_rotate(rotate);
        self
    }

    /// Builder-style center
    pub fn with_center(mut self, center: Position) -> Self {
        self.set_center(center);
        self
    }

    /// Formula in use
    pub fn kind(&self) -> RawProjection {
        self.kind
    }

    fn recenter(&mut self) {
        self.rotation = Rotation::from_degrees(self.rotate);
        self.center_offset = self
            .kernel
            .forward(self.center[0].to_radians(), self.center[1].to_radians())
            .unwrap_or([0.0, 0.0]);
    }

    /// Rotate and clip by angle; `(λ, φ)` radians or `None` when hidden
    fn rotated(&self, coordinates: Position) -> Option<(f64, f64)> {
        let (lambda, phi) = self
            .rotation
            .forward(coordinates[0].to_radians(), coordinates[1].to_radians());
        if let Some(angle) = self.clip_angle {
            if lambda.cos() * phi.cos() < angle.to_radians().cos() - CLIP_EPSILON {
                return None;
            }
        }
        Some((lambda, phi))
    }

    fn to_pixel(&self, raw: [f64; 2]) -> [f64; 2] {
        [
            self.translate[0] + self.scale * (raw[0] - self.center_offset[0]),
            self.translate[1] - self.scale * (raw[1] - self.center_offset[1]),
        ]
    }
}

impl Projection for StandardProjection {
    fn project(&self, coordinates: Position) -> Option<[f64; 2]> {
        let (lambda, phi) = self.rotated(coordinates)?;
        let raw = self.kernel.forward(lambda, phi)?;
        Some(self.to_pixel(raw))
    }

    fn invert(&self, point: [f64; 2]) -> Option<Position> {
        let x = (point[0] - self.translate[0]) / self.scale + self.center_offset[0];
        let y = (self.translate[1] - point[1]) / self.scale + self.center_offset[1];
        let [lambda, phi] = self.kernel.invert(x, y)?;
        let (lambda, phi) = self.rotation.invert(lambda, phi);
        let result = [lambda.to_degrees(), phi.to_degrees()];
        (result[0].is_finite() && result[1].is_finite()).then_some(result)
    }

    fn stream<'a>(&'a self, sink: &'a mut dyn GeoStream) -> Box<dyn GeoStream + 'a> {
        let downstream: Box<dyn GeoStream + 'a> = match self.clip_extent {
            Some(extent) => Box::new(ClipRectStream::new(extent, Box::new(sink))),
            None => Box::new(sink),
        };
        Box::new(ProjectStream {
            projection: self,
            sink: downstream,
            in_line: false,
            line_open: false,
            in_polygon: false,
        })
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn translate(&self) -> [f64; 2] {
        self.translate
    }

    fn set_translate(&mut self, translate: [f64; 2]) {
        self.translate = translate;
    }

    fn rotate(&self) -> [f64; 3] {
        self.rotate
    }

    fn set_rotate(&mut self, rotate: [f64; 3]) {
        self.rotate = rotate;
        self.recenter();
    }

    fn center(&self) -> Position {
        self.center
    }

    fn set_center(&mut self, center: Position) {
        self.center = center;
        self.recenter();
    }

    fn parallels(&self) -> Option<[f64; 2]> {
        self.kind.uses_parallels().then_some(self.parallels)
    }

    fn set_parallels(&mut self, parallels: [f64; 2]) -> bool {
        if !self.kind.uses_parallels() {
            return false;
        }
        self.parallels = parallels;
        self.kernel = RawKernel::new(self.kind, parallels);
        self.recenter();
        true
    }

    fn clip_angle(&self) -> Option<f64> {
        self.clip_angle
    }

    fn set_clip_angle(&mut self, angle: Option<f64>) {
        self.clip_angle = angle.filter(|a| *a > 0.0);
    }

    fn clip_extent(&self) -> Option<[[f64; 2]; 2]> {
        self.clip_extent
    }

    fn set_clip_extent(&mut self, extent: Option<[[f64; 2]; 2]>) {
        self.clip_extent = extent;
    }

    fn precision(&self) -> f64 {
        self.precision
    }

    fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    fn clone_box(&self) -> Box<dyn Projection> {
        Box::new(self.clone())
    }
}

/// Projects incoming geographic coordinates into the downstream sink
///
/// A hidden vertex inside an open line ends the visible run; the next
/// visible vertex starts a new one. Hidden ring vertices are dropped.
struct ProjectStream<'a> {
    projection: &'a StandardProjection,
    sink: Box<dyn GeoStream + 'a>,
    in_line: bool,
    line_open: bool,
    in_polygon: bool,
}

impl GeoStream for ProjectStream<'_> {
    fn point(&mut self, x: f64, y: f64) {
        match self.projection.project([x, y]) {
            Some([px, py]) => {
                if self.in_line && !self.line_open {
                    self.sink.line_start();
                    self.line_open = true;
                }
                self.sink.point(px, py);
            }
            None => {
                if self.in_line && !self.in_polygon && self.line_open {
                    self.sink.line_end();
                    self.line_open = false;
                }
            }
        }
    }

    fn line_start(&mut self) {
        self.in_line = true;
        self.line_open = false;
    }

    fn line_end(&mut self) {
        if self.line_open {
            self.sink.line_end();
        }
        self.in_line = false;
        self.line_open = false;
    }

    fn polygon_start(&mut self) {
        self.in_polygon = true;
        self.sink.polygon_start();
    }

    fn polygon_end(&mut self) {
        self.in_polygon = false;
        self.sink.polygon_end();
    }

    fn sphere(&mut self) {
        self.sink.sphere();
    }
}
