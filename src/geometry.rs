// Copyright 2025 Cowboy AI, LLC.

//! Geometry value objects
//!
//! Geographic positions are `[longitude, latitude]` in degrees; pixel
//! positions are `[x, y]` with y growing downwards.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::projection::GeoStream;

/// `[longitude, latitude]` in degrees
pub type Position = [f64; 2];

/// Geographic bounding box
///
/// Serialized as `[[minLon, minLat], [maxLon, maxLat]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 2]; 2]", into = "[[f64; 2]; 2]")]
pub struct GeoBounds {
    /// South-west corner
    pub min: Position,
    /// North-east corner
    pub max: Position,
}

impl GeoBounds {
    /// Create bounds from two corners
    pub fn new(min: Position, max: Position) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` when there are none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = GeoBounds::new(*first, *first);
        for p in iter {
            bounds.min[0] = bounds.min[0].min(p[0]);
            bounds.min[1] = bounds.min[1].min(p[1]);
            bounds.max[0] = bounds.max[0].max(p[0]);
            bounds.max[1] = bounds.max[1].max(p[1]);
        }
        Some(bounds)
    }

    /// Whether a position lies inside (edges included)
    pub fn contains_point(&self, p: Position) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    /// Whether another box lies entirely inside this one
    pub fn contains_bounds(&self, other: &GeoBounds) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Whether the two boxes share any area
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.min[0] < other.max[0]
            && other.min[0] < self.max[0]
            && self.min[1] < other.max[1]
            && other.min[1] < self.max[1]
    }

    /// Midpoint of the box
    pub fn center(&self) -> Position {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    /// Area in square degrees
    pub fn area(&self) -> f64 {
        (self.max[0] - self.min[0]).max(0.0) * (self.max[1] - self.min[1]).max(0.0)
    }

    /// Min strictly below max on both axes and both corners on the globe
    pub fn is_well_formed(&self) -> bool {
        let in_range = |p: Position| {
            (-180.0..=180.0).contains(&p[0]) && (-90.0..=90.0).contains(&p[1])
        };
        self.min[0] < self.max[0] && self.min[1] < self.max[1] && in_range(self.min) && in_range(self.max)
    }

    /// Closed polygon tracing the box outline, each edge split into `steps`
    ///
    /// Edges are densified because parallels and meridians curve under most
    /// projections and the corners alone under-estimate the projected extent.
    pub fn to_polygon(&self, steps: usize) -> Geometry {
        let steps = steps.max(1);
        let [x0, y0] = self.min;
        let [x1, y1] = self.max;
        let corners = [[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
        let mut ring = Vec::with_capacity(steps * 4 + 1);
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            for s in 0..steps {
                let t = s as f64 / steps as f64;
                ring.push([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]);
            }
        }
        ring.push(corners[0]);
        Geometry::Polygon {
            coordinates: vec![ring],
        }
    }
}

impl From<[[f64; 2]; 2]> for GeoBounds {
    fn from(value: [[f64; 2]; 2]) -> Self {
        GeoBounds::new(value[0], value[1])
    }
}

impl From<GeoBounds> for [[f64; 2]; 2] {
    fn from(value: GeoBounds) -> Self {
        [value.min, value.max]
    }
}

/// Pixel rectangle `[x1, y1, x2, y2]`
///
/// Stored relative to a territory's placement point; [`PixelExtent::placed_at`]
/// turns it into absolute canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PixelExtent {
    /// Left edge
    pub x1: f64,
    /// Top edge
    pub y1: f64,
    /// Right edge
    pub x2: f64,
    /// Bottom edge
    pub y2: f64,
}

impl PixelExtent {
    /// Create an extent from its four edges
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Absolute `[[x0, y0], [x1, y1]]` extent once placed at `origin`
    pub fn placed_at(&self, origin: [f64; 2]) -> [[f64; 2]; 2] {
        [
            [origin[0] + self.x1.min(self.x2), origin[1] + self.y1.min(self.y2)],
            [origin[0] + self.x1.max(self.x2), origin[1] + self.y1.max(self.y2)],
        ]
    }
}

impl From<[f64; 4]> for PixelExtent {
    fn from(v: [f64; 4]) -> Self {
        PixelExtent::new(v[0], v[1], v[2], v[3])
    }
}

impl From<PixelExtent> for [f64; 4] {
    fn from(e: PixelExtent) -> Self {
        [e.x1, e.y1, e.x2, e.y2]
    }
}

/// Whether a pixel lies inside an absolute extent
pub fn extent_contains(extent: &[[f64; 2]; 2], p: [f64; 2]) -> bool {
    p[0] >= extent[0][0] && p[0] <= extent[1][0] && p[1] >= extent[0][1] && p[1] <= extent[1][1]
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasDimensions {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl CanvasDimensions {
    /// Create canvas dimensions
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel at the middle of the canvas
    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }

    /// Both sides finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// GeoJSON geometry plus the whole-globe `Sphere`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Single position
    Point {
        /// The position
        coordinates: Position,
    },
    /// Several positions
    MultiPoint {
        /// The positions
        coordinates: Vec<Position>,
    },
    /// Open polyline
    LineString {
        /// Vertices
        coordinates: Vec<Position>,
    },
    /// Several polylines
    MultiLineString {
        /// One vertex list per line
        coordinates: Vec<Vec<Position>>,
    },
    /// Exterior ring followed by holes; rings repeat their first position
    Polygon {
        /// Rings
        coordinates: Vec<Vec<Position>>,
    },
    /// Several polygons
    MultiPolygon {
        /// Rings per polygon
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// Mixed collection
    GeometryCollection {
        /// Members
        geometries: Vec<Geometry>,
    },
    /// The whole globe
    Sphere,
}

/// Feed a geometry into a stream
///
/// Polygon rings are emitted without their closing position; the
/// `line_end` inside a polygon implies the ring closes.
pub fn stream_geometry(geometry: &Geometry, stream: &mut dyn GeoStream) {
    match geometry {
        Geometry::Point { coordinates } => stream.point(coordinates[0], coordinates[1]),
        Geometry::MultiPoint { coordinates } => {
            for p in coordinates {
                stream.point(p[0], p[1]);
            }
        }
        Geometry::LineString { coordinates } => stream_line(coordinates, stream, false),
        Geometry::MultiLineString { coordinates } => {
            for line in coordinates {
                stream_line(line, stream, false);
            }
        }
        Geometry::Polygon { coordinates } => stream_polygon(coordinates, stream),
        Geometry::MultiPolygon { coordinates } => {
            for polygon in coordinates {
                stream_polygon(polygon, stream);
            }
        }
        Geometry::GeometryCollection { geometries } => {
            for g in geometries {
                stream_geometry(g, stream);
            }
        }
        Geometry::Sphere => stream.sphere(),
    }
}

fn stream_line(coordinates: &[Position], stream: &mut dyn GeoStream, closed: bool) {
    let n = if closed && coordinates.len() > 1 {
        coordinates.len() - 1
    } else {
        coordinates.len()
    };
    stream.line_start();
    for p in &coordinates[..n] {
        stream.point(p[0], p[1]);
    }
    stream.line_end();
}

fn stream_polygon(rings: &[Vec<Position>], stream: &mut dyn GeoStream) {
    stream.polygon_start();
    for ring in rings {
        stream_line(ring, stream, true);
    }
    stream.polygon_end();
}
