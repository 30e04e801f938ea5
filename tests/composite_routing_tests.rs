// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;

use composite_projection::{
    stream_geometry, CanvasDimensions, CompositeConfiguration, CompositeProjection,
    CompositeProjectionBuilder, GeoBounds, Geometry, PixelExtent, Projection, ProjectionFamily,
    ProjectionParameters, ProjectionRegistry, RecordingStream, StreamEvent,
    TerritoryProjectionConfig, TerritoryRole,
};
use composite_projection::projection::BoundsStream;
use pretty_assertions::assert_eq;

fn france() -> CompositeConfiguration {
    let mut configuration =
        CompositeConfiguration::new("france", "France", 2700.0, CanvasDimensions::new(960.0, 500.0))
            .unwrap();
    configuration
        .add_territory(
            TerritoryProjectionConfig::new(
                "FR-MET",
                "Metropolitan France",
                TerritoryRole::Primary,
                "conic-conformal",
                ProjectionFamily::Conic,
            )
            .with_parameters(ProjectionParameters {
                rotate: Some([-3.0, -46.5, 0.0]),
                parallels: Some([44.0, 49.0]),
                ..Default::default()
            })
            .with_bounds(GeoBounds::new([-5.5, 41.0], [10.0, 51.5])),
        )
        .unwrap();
    configuration
        .add_territory(
            TerritoryProjectionConfig::new(
                "FR-GP",
                "Guadeloupe",
                TerritoryRole::Secondary,
                "mercator",
                ProjectionFamily::Cylindrical,
            )
            .with_parameters(ProjectionParameters {
                center: Some([-61.4, 16.2]),
                scale_multiplier: Some(1.4),
                ..Default::default()
            })
            .with_translate_offset([-350.0, 150.0])
            .with_pixel_clip_extent(PixelExtent::new(-60.0, -60.0, 60.0, 60.0))
            .with_bounds(GeoBounds::new([-61.9, 15.8], [-60.9, 16.6])),
        )
        .unwrap();
    configuration
}

fn builder() -> CompositeProjectionBuilder {
    CompositeProjectionBuilder::new(france(), Arc::new(ProjectionRegistry::standard()))
}

fn composite(auto_fit: bool) -> CompositeProjection {
    builder().build(960.0, 500.0, auto_fit).unwrap()
}

fn square(center: [f64; 2], half: f64) -> Vec<[f64; 2]> {
    let [x, y] = center;
    vec![
        [x - half, y - half],
        [x + half, y - half],
        [x + half, y + half],
        [x - half, y + half],
        [x - half, y - half],
    ]
}

fn record(projection: &dyn Projection, geometry: &Geometry) -> RecordingStream {
    let mut sink = RecordingStream::default();
    {
        let mut stream = projection.stream(&mut sink);
        stream_geometry(geometry, stream.as_mut());
    }
    sink
}

#[test]
fn a_ring_inside_a_territory_reaches_only_that_territory() {
    let composite = composite(true);
    let island = Geometry::Polygon {
        coordinates: vec![square([-61.4, 16.2], 0.2)],
    };

    let routed = record(&composite, &island);
    let direct = record(composite.sub_projection("FR-GP").unwrap(), &island);

    assert_eq!(routed, direct);
    assert_eq!(routed.count(StreamEvent::LineStart), 1);
    assert_eq!(routed.count(StreamEvent::LineEnd), 1);
}

#[test]
fn every_ring_reaches_exactly_one_territory() {
    let composite = composite(true);
    let mixed = Geometry::MultiPolygon {
        coordinates: vec![
            vec![square([2.0, 46.0], 1.0)],
            vec![square([-61.4, 16.2], 0.2)],
            vec![square([5.0, 45.0], 0.5)],
        ],
    };

    let routed = record(&composite, &mixed);

    assert_eq!(routed.count(StreamEvent::PolygonStart), 3);
    assert_eq!(routed.count(StreamEvent::LineStart), 3);
    assert_eq!(routed.count(StreamEvent::LineEnd), 3);
}

#[test]
fn rings_of_one_polygon_are_grouped_by_owner() {
    let composite = composite(true);
    let polygon = Geometry::Polygon {
        coordinates: vec![
            square([2.0, 46.0], 1.0),
            square([-61.4, 16.2], 0.2),
            square([2.0, 46.0], 0.2),
        ],
    };

    let routed = record(&composite, &polygon);

    assert_eq!(routed.count(StreamEvent::PolygonStart), 2);
    assert_eq!(routed.count(StreamEvent::PolygonEnd), 2);
    assert_eq!(routed.count(StreamEvent::LineStart), 3);
}

#[test]
fn lines_are_routed_whole() {
    let composite = composite(true);
    let line = Geometry::LineString {
        coordinates: vec![[-61.7, 16.0], [-61.3, 16.3], [-61.0, 16.5]],
    };

    let routed = record(&composite, &line);
    let direct = record(composite.sub_projection("FR-GP").unwrap(), &line);
    assert_eq!(routed, direct);
}

#[test]
fn the_sphere_reaches_every_territory() {
    let composite = composite(false);
    let routed = record(&composite, &Geometry::Sphere);
    assert_eq!(routed.count(StreamEvent::Sphere), 2);
}

#[test]
fn points_are_owned_by_the_smallest_claiming_territory() {
    let composite = composite(true);
    assert_eq!(composite.owner_of([-61.4, 16.2]), Some("FR-GP"));
    assert_eq!(composite.owner_of([2.0, 46.0]), Some("FR-MET"));
    // unclaimed geometry falls to the primary territory
    assert_eq!(composite.owner_of([100.0, 0.0]), Some("FR-MET"));

    let projected = composite.project([-61.4, 16.2]).unwrap();
    let direct = composite
        .sub_projection("FR-GP")
        .unwrap()
        .project([-61.4, 16.2])
        .unwrap();
    assert_eq!(projected, direct);
}

#[test]
fn invert_finds_the_territory_under_a_pixel() {
    let composite = composite(true);
    for position in [[-61.4, 16.2], [2.0, 46.0]] {
        let pixel = composite.project(position).unwrap();
        let back = composite.invert(pixel).unwrap();
        assert!(
            (back[0] - position[0]).abs() < 1e-6 && (back[1] - position[1]).abs() < 1e-6,
            "{position:?} came back as {back:?}"
        );
    }
}

#[test]
fn scale_and_translate_act_on_every_territory() {
    let mut composite = composite(false);
    assert_eq!(composite.scale(), 2700.0);
    assert_eq!(composite.translate(), [480.0, 250.0]);

    composite.set_scale(2000.0);
    composite.set_translate([100.0, 100.0]);

    let guadeloupe = composite.sub_projection("FR-GP").unwrap();
    assert_eq!(guadeloupe.scale(), 2000.0 * 1.4);
    assert_eq!(guadeloupe.translate(), [-250.0, 250.0]);
    let mainland = composite.sub_projection("FR-MET").unwrap();
    assert_eq!(mainland.scale(), 2000.0);
    assert_eq!(mainland.translate(), [100.0, 100.0]);
}

#[test]
fn positioning_setters_are_ignored_and_precision_is_broadcast() {
    let mut composite = composite(false);
    let rotate_before = composite.sub_projection("FR-MET").unwrap().rotate();

    composite.set_rotate([40.0, 10.0, 0.0]);
    composite.set_center([10.0, 10.0]);
    composite.set_clip_angle(Some(30.0));
    composite.set_precision(0.5);

    assert_eq!(composite.rotate(), [0.0, 0.0, 0.0]);
    assert_eq!(composite.clip_angle(), None);
    assert_eq!(composite.sub_projection("FR-MET").unwrap().rotate(), rotate_before);
    for code in composite.territory_codes() {
        assert_eq!(composite.sub_projection(code).unwrap().precision(), 0.5);
    }
}

#[test]
fn builder_edits_show_up_in_the_next_build() {
    let mut builder = builder();
    builder.update_translation_offset("FR-GP", [-300.0, 100.0]).unwrap();
    builder.update_scale("FR-GP", 2.0).unwrap();

    let guadeloupe = builder.instance("FR-GP").unwrap().projection();
    assert_eq!(guadeloupe.translate(), [180.0, 350.0]);
    assert_eq!(guadeloupe.scale(), 5400.0);

    let composite = builder.build(960.0, 500.0, false).unwrap();
    assert_eq!(composite.sub_projection("FR-GP").unwrap().translate(), [180.0, 350.0]);
}

#[test]
fn unknown_projection_ids_fall_back_to_a_family_default() {
    let mut builder = builder();
    builder
        .add_territory(
            TerritoryProjectionConfig::new(
                "FR-RE",
                "Réunion",
                TerritoryRole::Secondary,
                "no-such-projection",
                ProjectionFamily::Azimuthal,
            )
            .with_bounds(GeoBounds::new([55.2, -21.4], [55.9, -20.8])),
        )
        .unwrap();

    let instance = builder.instance("FR-RE").unwrap();
    assert_eq!(
        instance.projection_id(),
        ProjectionRegistry::default_id_for(ProjectionFamily::Azimuthal)
    );
    assert_eq!(builder.build(960.0, 500.0, true).unwrap().territory_codes().len(), 3);
}

fn output_bounds(projection: &dyn Projection, geometry: &Geometry) -> [[f64; 2]; 2] {
    let mut measure = BoundsStream::default();
    {
        let mut stream = projection.stream(&mut measure);
        stream_geometry(geometry, stream.as_mut());
    }
    measure.bounds().unwrap()
}

fn both_territories() -> Geometry {
    Geometry::GeometryCollection {
        geometries: vec![
            GeoBounds::new([-5.5, 41.0], [10.0, 51.5]).to_polygon(16),
            GeoBounds::new([-61.9, 15.8], [-60.9, 16.6]).to_polygon(16),
        ],
    }
}

#[test]
fn fitting_keeps_every_territory_inside_the_extent() {
    for auto_fit in [false, true] {
        let mut composite = composite(auto_fit);
        let geometry = both_territories();
        composite.fit_size([200.0, 200.0], &geometry);

        let [[x0, y0], [x1, y1]] = output_bounds(&composite, &geometry);
        let eps = 1e-6;
        assert!(
            x0 >= -eps && y0 >= -eps && x1 <= 200.0 + eps && y1 <= 200.0 + eps,
            "fitted bounds {:?} (auto_fit = {auto_fit})",
            [[x0, y0], [x1, y1]]
        );
        // the limiting dimension is filled
        assert!((x1 - x0 - 200.0).abs() < 1e-6 || (y1 - y0 - 200.0).abs() < 1e-6);
    }
}

#[test]
fn fitting_scales_insets_with_the_layout() {
    let mut composite = composite(false);
    composite.fit_extent([[10.0, 20.0], [210.0, 170.0]], &both_territories());

    let k = composite.layout_scale();
    assert!(k > 0.0 && k < 1.0);
    assert!((composite.scale() - 2700.0 * k).abs() < 1e-6);

    let [ax, ay] = composite.translate();
    let guadeloupe = composite.sub_projection("FR-GP").unwrap();
    let [gx, gy] = guadeloupe.translate();
    assert!((gx - (ax - 350.0 * k)).abs() < 1e-6 && (gy - (ay + 150.0 * k)).abs() < 1e-6);
    let [[cx0, cy0], [cx1, cy1]] = guadeloupe.clip_extent().unwrap();
    assert!((cx1 - cx0 - 120.0 * k).abs() < 1e-6 && (cy1 - cy0 - 120.0 * k).abs() < 1e-6);
}

#[test]
fn fitting_a_single_point_changes_nothing() {
    let mut composite = composite(false);
    composite.fit_size(
        [200.0, 200.0],
        &Geometry::Point {
            coordinates: [2.0, 46.0],
        },
    );
    assert_eq!(composite.scale(), 2700.0);
    assert_eq!(composite.layout_scale(), 1.0);
}
