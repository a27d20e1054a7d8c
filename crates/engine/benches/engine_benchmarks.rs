//! Microbenchmarks for the engine hot paths: dock selection and stock
//! reservation cycles.

use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};

use freightnet_core::{DriverId, ProductId, QueueEntryId, ShipmentId, WarehouseId};
use freightnet_dockqueue::{select_next, QueueEntry};
use freightnet_engine::{InMemoryStore, RecordStore, StockService};
use freightnet_registry::{Product, Warehouse};

fn bench_select_next(c: &mut Criterion) {
    let warehouse_id = WarehouseId::new();
    let t0 = Utc::now();
    let entries: Vec<QueueEntry> = (0..1_000)
        .map(|i| {
            QueueEntry::new(
                QueueEntryId::new(),
                warehouse_id,
                ShipmentId::new(),
                DriverId::new(),
                (i % 10) as i32,
                60,
                t0 + Duration::seconds(i),
            )
        })
        .collect();

    c.bench_function("select_next/1000_waiting", |b| {
        b.iter(|| select_next(entries.iter()).map(|e| e.id))
    });
}

fn bench_reserve_release(c: &mut Criterion) {
    let store = Arc::new(InMemoryStore::new());
    let product_id = ProductId::new();
    let warehouse_id = WarehouseId::new();
    store
        .write(|t| {
            t.products.insert(
                product_id,
                Product::new(product_id, "SKU-BENCH", "Bench pallet", 100)?,
            );
            t.warehouses.insert(
                warehouse_id,
                Warehouse::new(warehouse_id, "WH-BENCH", "Bench Hub", "1 Bench Rd", "Bench")?,
            );
            Ok(())
        })
        .unwrap();
    let stock = StockService::new(store);
    stock.receive(product_id, warehouse_id, 1_000_000).unwrap();

    c.bench_function("stock/reserve_release_cycle", |b| {
        b.iter(|| {
            stock.reserve(product_id, warehouse_id, 5).unwrap();
            stock.release(product_id, warehouse_id, 5).unwrap();
        })
    });
}

criterion_group!(benches, bench_select_next, bench_reserve_release);
criterion_main!(benches);
