// Copyright 2025 Cowboy AI, LLC.

//! Territory ownership and the routing stream
//!
//! Ownership is decided against declared geographic bounds. Non-primary
//! territories are consulted first, smallest bounds first, so an island
//! nested inside a larger region resolves to the island. Primary territories
//! come next, and geometry nobody claims falls to the catch-all.

use super::instance::SubProjectionInstance;
use crate::configuration::TerritoryProjectionConfig;
use crate::geometry::{GeoBounds, Position};
use crate::projection::GeoStream;
use std::cmp::Ordering;

/// Decides which territory owns a point, line or ring
#[derive(Debug, Clone, Default)]
pub struct TerritoryRouter {
    priority: Vec<(usize, GeoBounds)>,
    catch_all: Option<usize>,
}

impl TerritoryRouter {
    /// Router over `territories`, indexed by their position in the slice
    pub fn new(territories: &[TerritoryProjectionConfig]) -> Self {
        let mut secondary: Vec<(usize, GeoBounds)> = territories
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.role.is_primary())
            .filter_map(|(i, t)| t.bounds.map(|b| (i, b)))
            .collect();
        // stable: equal areas keep declaration order
        secondary.sort_by(|a, b| a.1.area().partial_cmp(&b.1.area()).unwrap_or(Ordering::Equal));

        let primary = territories
            .iter()
            .enumerate()
            .filter(|(_, t)| t.role.is_primary())
            .filter_map(|(i, t)| t.bounds.map(|b| (i, b)));

        let catch_all = territories
            .iter()
            .position(|t| t.role.is_primary())
            .or_else(|| (!territories.is_empty()).then_some(0));

        Self {
            priority: secondary.into_iter().chain(primary).collect(),
            catch_all,
        }
    }

    /// Territory receiving what no bounds claim
    pub fn catch_all(&self) -> Option<usize> {
        self.catch_all
    }

    /// Territories with bounds, in the order they are consulted
    pub fn priority_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.priority.iter().map(|(i, _)| *i)
    }

    /// Owner of a single position
    pub fn owner_of_point(&self, position: Position) -> Option<usize> {
        self.priority
            .iter()
            .find(|(_, b)| b.contains_point(position))
            .map(|(i, _)| *i)
            .or(self.catch_all)
    }

    /// Owner of a line or ring, judged by its bounding box
    ///
    /// Full containment wins over containment of the box center.
    pub fn owner_of_ring(&self, ring: &[Position]) -> Option<usize> {
        let Some(extent) = GeoBounds::from_points(ring) else {
            return self.catch_all;
        };
        self.priority
            .iter()
            .find(|(_, b)| b.contains_bounds(&extent))
            .or_else(|| {
                let center = extent.center();
                self.priority.iter().find(|(_, b)| b.contains_point(center))
            })
            .map(|(i, _)| *i)
            .or(self.catch_all)
    }

    /// Pairs of non-primary territories whose bounds overlap
    pub fn overlapping(territories: &[TerritoryProjectionConfig]) -> Vec<(String, String)> {
        let bounded: Vec<(&str, GeoBounds)> = territories
            .iter()
            .filter(|t| !t.role.is_primary())
            .filter_map(|t| t.bounds.map(|b| (t.code.as_str(), b)))
            .collect();
        let mut pairs = Vec::new();
        for (i, (a, a_bounds)) in bounded.iter().enumerate() {
            for (b, b_bounds) in &bounded[i + 1..] {
                if a_bounds.intersects(b_bounds) {
                    pairs.push((a.to_string(), b.to_string()));
                }
            }
        }
        pairs
    }
}

/// Stream that hands each buffered unit to the sub-projection owning it
///
/// Lines are routed whole. Polygons are buffered until `polygon_end`, each
/// ring is routed on its own, and every owner receives one polygon holding
/// its rings in their original order. Rings are never split.
pub struct RouterStream<'a> {
    router: &'a TerritoryRouter,
    instances: &'a [SubProjectionInstance],
    sink: Box<dyn GeoStream + 'a>,
    in_polygon: bool,
    in_line: bool,
    line: Vec<Position>,
    rings: Vec<Vec<Position>>,
}

impl<'a> RouterStream<'a> {
    /// Route into `sink` through `instances`
    pub fn new(
        router: &'a TerritoryRouter,
        instances: &'a [SubProjectionInstance],
        sink: Box<dyn GeoStream + 'a>,
    ) -> Self {
        Self {
            router,
            instances,
            sink,
            in_polygon: false,
            in_line: false,
            line: Vec::new(),
            rings: Vec::new(),
        }
    }

    fn instance(&self, index: Option<usize>) -> Option<&'a SubProjectionInstance> {
        let instances = self.instances;
        index.and_then(|i| instances.get(i))
    }
}

fn emit_line(stream: &mut dyn GeoStream, points: &[Position]) {
    stream.line_start();
    for p in points {
        stream.point(p[0], p[1]);
    }
    stream.line_end();
}

impl GeoStream for RouterStream<'_> {
    fn point(&mut self, x: f64, y: f64) {
        if self.in_line {
            self.line.push([x, y]);
            return;
        }
        if let Some(instance) = self.instance(self.router.owner_of_point([x, y])) {
            instance.projection().stream(self.sink.as_mut()).point(x, y);
        }
    }

    fn line_start(&mut self) {
        self.in_line = true;
        self.line.clear();
    }

    fn line_end(&mut self) {
        self.in_line = false;
        let line = std::mem::take(&mut self.line);
        if self.in_polygon {
            self.rings.push(line);
            return;
        }
        if let Some(instance) = self.instance(self.router.owner_of_ring(&line)) {
            let mut stream = instance.projection().stream(self.sink.as_mut());
            emit_line(stream.as_mut(), &line);
        }
    }

    fn polygon_start(&mut self) {
        self.in_polygon = true;
        self.rings.clear();
    }

    fn polygon_end(&mut self) {
        self.in_polygon = false;
        let rings = std::mem::take(&mut self.rings);

        let mut groups: Vec<(usize, Vec<Vec<Position>>)> = Vec::new();
        for ring in rings {
            let Some(owner) = self.router.owner_of_ring(&ring) else {
                continue;
            };
            match groups.iter_mut().find(|(o, _)| *o == owner) {
                Some((_, owned)) => owned.push(ring),
                None => groups.push((owner, vec![ring])),
            }
        }

        for (owner, owned) in groups {
            let Some(instance) = self.instance(Some(owner)) else {
                continue;
            };
            let mut stream = instance.projection().stream(self.sink.as_mut());
            stream.polygon_start();
            for ring in &owned {
                emit_line(stream.as_mut(), ring);
            }
            stream.polygon_end();
        }
    }

    fn sphere(&mut self) {
        for instance in self.instances {
            instance.projection().stream(self.sink.as_mut()).sphere();
        }
    }
}
