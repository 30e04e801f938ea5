// Copyright 2025 Cowboy AI, LLC.

//! Geometry streams
//!
//! A stream is a visitor that receives a geometry traversal one call at a
//! time. Projections wrap a downstream sink with their own transform so
//! geometry can be piped through several stages before it reaches a
//! renderer.

/// Visitor receiving a geometry traversal
pub trait GeoStream {
    /// A vertex (or a stand-alone point outside any line)
    fn point(&mut self, x: f64, y: f64);

    /// A line or ring begins
    fn line_start(&mut self) {}

    /// A line or ring ends; inside a polygon the ring closes implicitly
    fn line_end(&mut self) {}

    /// A polygon begins; its rings follow
    fn polygon_start(&mut self) {}

    /// A polygon ends
    fn polygon_end(&mut self) {}

    /// The whole globe
    fn sphere(&mut self) {}
}

impl<S: GeoStream + ?Sized> GeoStream for &mut S {
    fn point(&mut self, x: f64, y: f64) {
        (**self).point(x, y)
    }

    fn line_start(&mut self) {
        (**self).line_start()
    }

    fn line_end(&mut self) {
        (**self).line_end()
    }

    fn polygon_start(&mut self) {
        (**self).polygon_start()
    }

    fn polygon_end(&mut self) {
        (**self).polygon_end()
    }

    fn sphere(&mut self) {
        (**self).sphere()
    }
}

/// One recorded stream call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamEvent {
    /// `point(x, y)`
    Point(f64, f64),
    /// `line_start()`
    LineStart,
    /// `line_end()`
    LineEnd,
    /// `polygon_start()`
    PolygonStart,
    /// `polygon_end()`
    PolygonEnd,
    /// `sphere()`
    Sphere,
}

impl StreamEvent {
    /// Send this call to a stream
    pub fn apply(self, stream: &mut dyn GeoStream) {
        match self {
            StreamEvent::Point(x, y) => stream.point(x, y),
            StreamEvent::LineStart => stream.line_start(),
            StreamEvent::LineEnd => stream.line_end(),
            StreamEvent::PolygonStart => stream.polygon_start(),
            StreamEvent::PolygonEnd => stream.polygon_end(),
            StreamEvent::Sphere => stream.sphere(),
        }
    }
}

/// Send a recorded sequence to a stream, in order
pub fn replay(events: &[StreamEvent], stream: &mut dyn GeoStream) {
    for event in events {
        event.apply(stream);
    }
}

/// Sink that records every call it receives
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingStream {
    /// Calls in arrival order
    pub events: Vec<StreamEvent>,
}

impl RecordingStream {
    /// Number of recorded calls matching `event`'s variant
    pub fn count(&self, event: StreamEvent) -> usize {
        let wanted = std::mem::discriminant(&event);
        self.events
            .iter()
            .filter(|e| std::mem::discriminant(*e) == wanted)
            .count()
    }

    /// Recorded point coordinates
    pub fn points(&self) -> Vec<[f64; 2]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Point(x, y) => Some([*x, *y]),
                _ => None,
            })
            .collect()
    }
}

impl GeoStream for RecordingStream {
    fn point(&mut self, x: f64, y: f64) {
        self.events.push(StreamEvent::Point(x, y));
    }

    fn line_start(&mut self) {
        self.events.push(StreamEvent::LineStart);
    }

    fn line_end(&mut self) {
        self.events.push(StreamEvent::LineEnd);
    }

    fn polygon_start(&mut self) {
        self.events.push(StreamEvent::PolygonStart);
    }

    fn polygon_end(&mut self) {
        self.events.push(StreamEvent::PolygonEnd);
    }

    fn sphere(&mut self) {
        self.events.push(StreamEvent::Sphere);
    }
}

/// Sink accumulating the bounding box of every point it receives
#[derive(Debug, Clone, Default)]
pub struct BoundsStream {
    bounds: Option<[[f64; 2]; 2]>,
}

impl BoundsStream {
    /// `[[x0, y0], [x1, y1]]`, or `None` if no point arrived
    pub fn bounds(&self) -> Option<[[f64; 2]; 2]> {
        self.bounds
    }
}

impl GeoStream for BoundsStream {
    fn point(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.bounds = Some(match self.bounds {
            None => [[x, y], [x, y]],
            Some([[x0, y0], [x1, y1]]) => [[x0.min(x), y0.min(y)], [x1.max(x), y1.max(y)]],
        });
    }
}
