use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use lagoon_core::model::{BridgeConnection, BridgePoint, BuildingPoint, CanalPoint};
use lagoon_core::prelude::*;

/// Grid of square parcels separated by canals, neighbours joined by bridges
fn city(side: usize) -> Dataset {
    let size = 0.001;
    let gap = 0.0004;
    let step = size + gap;
    let mut parcels = Vec::with_capacity(side * side);

    for row in 0..side {
        for col in 0..side {
            let south = 45.0 + row as f64 * step;
            let west = 12.0 + col as f64 * step;
            let id = format!("p{row}-{col}");
            let mut parcel = Parcel::new(
                id.clone(),
                vec![
                    LatLng::new(south, west),
                    LatLng::new(south, west + size),
                    LatLng::new(south + size, west + size),
                    LatLng::new(south + size, west),
                ],
            );
            parcel.center = Some(LatLng::new(south + size / 2.0, west + size / 2.0));
            for i in 0..4 {
                parcel.building_points.push(BuildingPoint {
                    id: Some(format!("{id}-h{i}")),
                    lat: south + size * (0.2 + 0.2 * f64::from(i)),
                    lng: west + size * 0.3,
                });
            }
            if col + 1 < side {
                let lat = south + size / 2.0;
                parcel.bridge_points.push(BridgePoint {
                    id: Some(format!("{id}-e")),
                    edge: LatLng::new(lat, west + size),
                    connection: Some(BridgeConnection {
                        target_polygon_id: format!("p{row}-{}", col + 1),
                        target_point: LatLng::new(lat, west + step),
                        distance: None,
                    }),
                    is_constructed: Some(true),
                });
            }
            if col > 0 {
                let lat = south + size / 2.0;
                parcel.bridge_points.push(BridgePoint {
                    id: Some(format!("{id}-w")),
                    edge: LatLng::new(lat, west),
                    connection: Some(BridgeConnection {
                        target_polygon_id: format!("p{row}-{}", col - 1),
                        target_point: LatLng::new(lat, west - gap),
                        distance: None,
                    }),
                    is_constructed: Some(true),
                });
            }
            parcel.canal_points.push(CanalPoint {
                id: Some(format!("{id}-dock")),
                edge: LatLng::new(south, west + size / 2.0),
                is_constructed: Some(true),
            });
            parcels.push(parcel);
        }
    }

    Dataset::from_parcels(parcels)
}

fn bench_land_graph(c: &mut Criterion) {
    let dataset = city(12);
    c.bench_function("build land graph 12x12", |b| {
        b.iter(|| build_land_graph(black_box(&dataset), PathfindingMode::All));
    });
}

fn bench_routing(c: &mut Criterion) {
    let network = RoutingNetwork::build(Arc::new(city(12)), PathfindingMode::Real);
    let start = Point::new(45.0003, 12.0003);
    let end = Point::new(45.0003, 12.0003 + 11.0 * 0.0014);
    c.bench_function("land route across 12 parcels", |b| {
        b.iter(|| network.find_path(black_box(&start), black_box(&end)));
    });

    let water_end = Point::new(45.0003 + 11.0 * 0.0014, 12.0003);
    c.bench_function("water route across grid", |b| {
        b.iter(|| network.find_water_only_path(black_box(&start), black_box(&water_end)));
    });
}

criterion_group!(benches, bench_land_graph, bench_routing);
criterion_main!(benches);
