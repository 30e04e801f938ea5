// Copyright 2025 Cowboy AI, LLC.

//! The composite projection produced by a build

use super::instance::SubProjectionInstance;
use super::router::{RouterStream, TerritoryRouter};
use crate::configuration::TerritoryProjectionConfig;
use crate::geometry::{extent_contains, stream_geometry, Geometry, Position};
use crate::projection::{BoundsStream, ClipRectStream, GeoStream, Projection};
use tracing::debug;

/// Several territory projections behaving as one
///
/// Scale and translate act on every part: the scale is the shared reference
/// scale each part multiplies, the translate is the anchor each part's
/// pixel offset is measured from. Positioning (`rotate`, `center`,
/// `clip_angle`) belongs to the parts and is ignored here.
///
/// Fitting scales the whole layout: the reference scale and every pixel
/// offset and inset grow by the same factor, so insets stay where they were
/// drawn relative to the mainland.
#[derive(Debug, Clone)]
pub struct CompositeProjection {
    instances: Vec<SubProjectionInstance>,
    router: TerritoryRouter,
    reference_scale: f64,
    translate: [f64; 2],
    precision: f64,
    clip_extent: Option<[[f64; 2]; 2]>,
    layout_scale: f64,
}

impl CompositeProjection {
    pub(crate) fn new(
        instances: Vec<SubProjectionInstance>,
        reference_scale: f64,
        anchor: [f64; 2],
        precision: f64,
    ) -> Self {
        let territories: Vec<TerritoryProjectionConfig> =
            instances.iter().map(|i| i.territory().clone()).collect();
        Self {
            router: TerritoryRouter::new(&territories),
            instances,
            reference_scale,
            translate: anchor,
            precision,
            clip_extent: None,
            layout_scale: 1.0,
        }
    }

    /// Parts in declaration order
    pub fn instances(&self) -> &[SubProjectionInstance] {
        &self.instances
    }

    /// Territory codes in declaration order
    pub fn territory_codes(&self) -> Vec<&str> {
        self.instances.iter().map(SubProjectionInstance::code).collect()
    }

    /// Projection drawing one territory
    pub fn sub_projection(&self, code: &str) -> Option<&dyn Projection> {
        self.instances
            .iter()
            .find(|i| i.code() == code)
            .map(SubProjectionInstance::projection)
    }

    /// Ownership rules in use
    pub fn router(&self) -> &TerritoryRouter {
        &self.router
    }

    /// Territory a position is drawn by
    pub fn owner_of(&self, position: Position) -> Option<&str> {
        self.router
            .owner_of_point(position)
            .and_then(|i| self.instances.get(i))
            .map(SubProjectionInstance::code)
    }

    /// Factor fitting has applied to pixel offsets and insets
    pub fn layout_scale(&self) -> f64 {
        self.layout_scale
    }

    fn place_all(&mut self) {
        for instance in &mut self.instances {
            instance.place_scaled(self.reference_scale, self.translate, self.layout_scale);
        }
    }

    fn inverts_inside(instance: &SubProjectionInstance, point: [f64; 2]) -> Option<Position> {
        let projection = instance.projection();
        if let Some(extent) = projection.clip_extent() {
            if !extent_contains(&extent, point) {
                return None;
            }
        }
        let position = projection.invert(point)?;
        match instance.territory().bounds {
            Some(bounds) if !bounds.contains_point(position) => None,
            _ => Some(position),
        }
    }
}

impl Projection for CompositeProjection {
    fn project(&self, coordinates: Position) -> Option<[f64; 2]> {
        let owner = self.router.owner_of_point(coordinates)?;
        self.instances.get(owner)?.projection().project(coordinates)
    }

    fn invert(&self, point: [f64; 2]) -> Option<Position> {
        self.router
            .priority_order()
            .filter_map(|i| self.instances.get(i))
            .find_map(|instance| Self::inverts_inside(instance, point))
            .or_else(|| {
                self.router
                    .catch_all()
                    .and_then(|i| self.instances.get(i))
                    .and_then(|instance| instance.projection().invert(point))
            })
    }

    fn stream<'a>(&'a self, sink: &'a mut dyn GeoStream) -> Box<dyn GeoStream + 'a> {
        let downstream: Box<dyn GeoStream + 'a> = match self.clip_extent {
            Some(extent) => Box::new(ClipRectStream::new(extent, Box::new(sink))),
            None => Box::new(sink),
        };
        Box::new(RouterStream::new(&self.router, &self.instances, downstream))
    }

    fn scale(&self) -> f64 {
        self.reference_scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.reference_scale = scale;
        self.place_all();
    }

    fn translate(&self) -> [f64; 2] {
        self.translate
    }

    fn set_translate(&mut self, translate: [f64; 2]) {
        self.translate = translate;
        self.place_all();
    }

    fn rotate(&self) -> [f64; 3] {
        [0.0, 0.0, 0.0]
    }

    fn set_rotate(&mut self, rotate: [f64; 3]) {
        debug!(?rotate, "rotate ignored on a composite projection");
    }

    fn center(&self) -> Position {
        [0.0, 0.0]
    }

    fn set_center(&mut self, center: Position) {
        debug!(?center, "center ignored on a composite projection");
    }

    fn clip_angle(&self) -> Option<f64> {
        None
    }

    fn set_clip_angle(&mut self, angle: Option<f64>) {
        debug!(?angle, "clip angle ignored on a composite projection");
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
        for instance in &mut self.instances {
            instance.set_precision(precision);
        }
    }

    fn clone_box(&self) -> Box<dyn Projection> {
        Box::new(self.clone())
    }

    /// Scale the whole layout about the translate point so `object` fills `extent`
    ///
    /// Output is a similarity of the current output: offsets, insets and
    /// geographic scale all change by one factor. Objects that project to
    /// nothing, or to a single pixel, leave the projection unchanged.
    fn fit_extent(&mut self, extent: [[f64; 2]; 2], object: &Geometry) {
        let clip = self.clip_extent.take();
        let mut measure = BoundsStream::default();
        {
            let mut stream = self.stream(&mut measure);
            stream_geometry(object, stream.as_mut());
        }
        self.clip_extent = clip;

        let Some([[x0, y0], [x1, y1]]) = measure.bounds() else {
            return;
        };
        let [tx, ty] = self.translate;
        let (x0, y0, x1, y1) = (x0 - tx, y0 - ty, x1 - tx, y1 - ty);
        let w = extent[1][0] - extent[0][0];
        let h = extent[1][1] - extent[0][1];
        let k = (w / (x1 - x0)).min(h / (y1 - y0));
        if !(k.is_finite() && k > 0.0) {
            return;
        }

        self.reference_scale *= k;
        self.layout_scale *= k;
        self.translate = [
            extent[0][0] + (w - k * (x1 + x0)) / 2.0,
            extent[0][1] + (h - k * (y1 + y0)) / 2.0,
        ];
        self.place_all();
        debug!(scale = self.reference_scale, layout_scale = self.layout_scale, "composite fitted");
    }
}
