// Copyright 2025 Cowboy AI, LLC.

//! Rectangular clipping of projected geometry
//!
//! Rings are clipped as closed polygons (Sutherland–Hodgman), open lines are
//! cut into the runs that stay inside the rectangle (Liang–Barsky).

use super::stream::GeoStream;

/// Stream stage dropping everything outside `[[x0, y0], [x1, y1]]`
pub struct ClipRectStream<'a> {
    extent: [[f64; 2]; 2],
    sink: Box<dyn GeoStream + 'a>,
    in_polygon: bool,
    polygon_open: bool,
    in_line: bool,
    buffer: Vec<[f64; 2]>,
}

impl<'a> ClipRectStream<'a> {
    /// Wrap `sink`
    pub fn new(extent: [[f64; 2]; 2], sink: Box<dyn GeoStream + 'a>) -> Self {
        Self {
            extent,
            sink,
            in_polygon: false,
            polygon_open: false,
            in_line: false,
            buffer: Vec::new(),
        }
    }

    fn inside(&self, p: [f64; 2]) -> bool {
        p[0] >= self.extent[0][0]
            && p[0] <= self.extent[1][0]
            && p[1] >= self.extent[0][1]
            && p[1] <= self.extent[1][1]
    }

    fn emit_line(&mut self, points: &[[f64; 2]]) {
        self.sink.line_start();
        for p in points {
            self.sink.point(p[0], p[1]);
        }
        self.sink.line_end();
    }
}

impl GeoStream for ClipRectStream<'_> {
    fn point(&mut self, x: f64, y: f64) {
        if self.in_line {
            self.buffer.push([x, y]);
        } else if self.inside([x, y]) {
            self.sink.point(x, y);
        }
    }

    fn line_start(&mut self) {
        self.in_line = true;
        self.buffer.clear();
    }

    fn line_end(&mut self) {
        self.in_line = false;
        let points = std::mem::take(&mut self.buffer);
        if self.in_polygon {
            let ring = clip_ring(&points, &self.extent);
            if ring.len() >= 3 {
                if !self.polygon_open {
                    self.sink.polygon_start();
                    self.polygon_open = true;
                }
                self.emit_line(&ring);
            }
        } else if points.len() == 1 {
            if self.inside(points[0]) {
                self.emit_line(&points);
            }
        } else {
            for run in clip_polyline(&points, &self.extent) {
                self.emit_line(&run);
            }
        }
    }

    fn polygon_start(&mut self) {
        self.in_polygon = true;
        self.polygon_open = false;
    }

    fn polygon_end(&mut self) {
        if self.polygon_open {
            self.sink.polygon_end();
        }
        self.in_polygon = false;
        self.polygon_open = false;
    }

    fn sphere(&mut self) {
        self.sink.sphere();
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Edge {
    fn keeps(self, p: [f64; 2]) -> bool {
        match self {
            Edge::Left(x) => p[0] >= x,
            Edge::Right(x) => p[0] <= x,
            Edge::Top(y) => p[1] >= y,
            Edge::Bottom(y) => p[1] <= y,
        }
    }

    fn crossing(self, a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
        match self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a[0]) / (b[0] - a[0]);
                [x, a[1] + t * (b[1] - a[1])]
            }
            Edge::Top(y) | Edge::Bottom(y) => {
                let t = (y - a[1]) / (b[1] - a[1]);
                [a[0] + t * (b[0] - a[0]), y]
            }
        }
    }
}

/// Clip a closed ring (no repeated closing point)
pub fn clip_ring(ring: &[[f64; 2]], extent: &[[f64; 2]; 2]) -> Vec<[f64; 2]> {
    let edges = [
        Edge::Left(extent[0][0]),
        Edge::Right(extent[1][0]),
        Edge::Top(extent[0][1]),
        Edge::Bottom(extent[1][1]),
    ];
    let mut output = ring.to_vec();
    for edge in edges {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut previous = input[input.len() - 1];
        for &current in &input {
            match (edge.keeps(previous), edge.keeps(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(edge.crossing(previous, current)),
                (false, true) => {
                    output.push(edge.crossing(previous, current));
                    output.push(current);
                }
                (false, false) => {}
            }
            previous = current;
        }
    }
    output
}

/// Cut an open line into the runs inside the extent
pub fn clip_polyline(line: &[[f64; 2]], extent: &[[f64; 2]; 2]) -> Vec<Vec<[f64; 2]>> {
    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for pair in line.windows(2) {
        match clip_segment(pair[0], pair[1], extent) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() > 1 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            }
            None => {
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

fn clip_segment(
    a: [f64; 2],
    b: [f64; 2],
    extent: &[[f64; 2]; 2],
) -> Option<([f64; 2], [f64; 2])> {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    let checks = [
        (-dx, a[0] - extent[0][0]),
        (dx, extent[1][0] - a[0]),
        (-dy, a[1] - extent[0][1]),
        (dy, extent[1][1] - a[1]),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }
    Some((
        [a[0] + t0 * dx, a[1] + t0 * dy],
        [a[0] + t1 * dx, a[1] + t1 * dy],
    ))
}
