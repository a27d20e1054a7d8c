//! End-to-end tests for the fulfillment flows: create → queue → load →
//! transit → deliver → settle, against the in-memory store.

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use freightnet_core::{DomainError, DriverId, ProductId, ShipmentId, WarehouseId};
use freightnet_dockqueue::QueueStatus;
use freightnet_ledger::EntryType;
use freightnet_registry::{Driver, DriverStatus, Product, Warehouse};
use freightnet_shipments::{LegCascade, LegStatus, NewLeg, ShipmentDetails, ShipmentStatus};

use crate::record_store::{InMemoryStore, RecordStore};
use crate::services::financial::FinancialService;
use crate::services::queue::{EnqueueRequest, QueueService};
use crate::services::shipments::{NewShipment, NewShipmentItem, ShipmentService};
use crate::services::stock::StockService;

struct Harness {
    store: Arc<InMemoryStore>,
    stock: StockService<Arc<InMemoryStore>>,
    shipments: ShipmentService<Arc<InMemoryStore>>,
    queue: QueueService<Arc<InMemoryStore>>,
    financial: FinancialService<Arc<InMemoryStore>>,
    product_id: ProductId,
    origin: WarehouseId,
    destination: WarehouseId,
    driver_id: DriverId,
}

/// One product (unit price 10) with 100 units on hand at the origin, two
/// warehouses, one available driver.
fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let product_id = ProductId::new();
    let origin = WarehouseId::new();
    let destination = WarehouseId::new();
    let driver_id = DriverId::new();

    store
        .write(|t| {
            let mut product = Product::new(product_id, "SKU-PAL", "Pallet of tiles", 10)?;
            product.low_stock_threshold = 5;
            t.products.insert(product_id, product);
            t.warehouses.insert(
                origin,
                Warehouse::new(origin, "WH-A", "North Hub", "1 Dock Rd", "North")?,
            );
            t.warehouses.insert(
                destination,
                Warehouse::new(destination, "WH-B", "South Hub", "2 Dock Rd", "South")?,
            );
            t.drivers.insert(
                driver_id,
                Driver::new(driver_id, "Asha", "Raman", "DL-9911", "+15550101")?,
            );
            Ok(())
        })
        .unwrap();

    let stock = StockService::new(store.clone());
    stock.receive(product_id, origin, 100).unwrap();

    Harness {
        stock,
        shipments: ShipmentService::new(store.clone()),
        queue: QueueService::new(store.clone()),
        financial: FinancialService::new(store.clone()),
        store,
        product_id,
        origin,
        destination,
        driver_id,
    }
}

fn new_shipment(h: &Harness, quantity: i64, legs: Vec<NewLeg>) -> NewShipment {
    NewShipment {
        origin_warehouse_id: h.origin,
        destination_warehouse_id: Some(h.destination),
        driver_id: None,
        details: ShipmentDetails::default(),
        items: vec![NewShipmentItem {
            product_id: h.product_id,
            quantity,
        }],
        legs,
        is_multi_leg: false,
    }
}

fn leg(sequence: u32, from: WarehouseId, to: WarehouseId) -> NewLeg {
    NewLeg {
        sequence,
        from_warehouse_id: from,
        to_warehouse_id: to,
        scheduled_departure_date: None,
        scheduled_arrival_date: None,
        distance_km: Some(42.0),
    }
}

/// Walk a freshly created shipment through the dock to `InTransit`.
fn load_through_dock(h: &Harness, shipment_id: ShipmentId) {
    h.queue
        .enqueue(EnqueueRequest::new(h.origin, shipment_id, h.driver_id))
        .unwrap();
    let entry = h.queue.select_next(h.origin).unwrap().unwrap();
    h.queue.start_loading(entry.id).unwrap();
    h.queue.finish_loading(entry.id).unwrap();
}

#[test]
fn creating_a_shipment_reserves_stock_and_snapshots_prices() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 30, vec![])).unwrap();

    assert_eq!(shipment.status(), ShipmentStatus::Pending);
    assert_eq!(shipment.total_value(), 300);
    assert_eq!(shipment.total_weight(), 30);
    assert!(shipment.tracking_number().starts_with("TRK-"));

    let record = h.stock.stock_by_warehouse(h.origin).unwrap()[0].clone();
    assert_eq!(record.quantity(), 100);
    assert_eq!(record.reserved(), 30);
    assert_eq!(record.available(), 70);

    // Later catalog price changes do not touch the snapshot.
    h.store
        .write(|t| {
            t.products.get_mut(&h.product_id).unwrap().unit_price = 999;
            Ok(())
        })
        .unwrap();
    let reloaded = h.shipments.shipment(shipment.id_typed()).unwrap();
    assert_eq!(reloaded.items()[0].unit_price, 10);
    assert_eq!(reloaded.total_value(), 300);
}

#[test]
fn failed_creation_leaves_no_partial_reservation() {
    let h = harness();
    let scarce = ProductId::new();
    h.store
        .write(|t| {
            t.products
                .insert(scarce, Product::new(scarce, "SKU-SCARCE", "Rare part", 50)?);
            Ok(())
        })
        .unwrap();

    // First item is satisfiable, second has no stock at all.
    let mut req = new_shipment(&h, 40, vec![]);
    req.items.push(NewShipmentItem {
        product_id: scarce,
        quantity: 1,
    });
    let err = h.shipments.create(req).unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock(_)));

    let record = h.stock.stock_by_warehouse(h.origin).unwrap()[0].clone();
    assert_eq!(record.reserved(), 0);
    assert_eq!(record.available(), 100);
    assert!(h.shipments.shipments(None, None).unwrap().is_empty());
}

#[test]
fn unknown_references_fail_with_not_found() {
    let h = harness();
    let mut req = new_shipment(&h, 1, vec![]);
    req.origin_warehouse_id = WarehouseId::new();
    assert!(matches!(
        h.shipments.create(req),
        Err(DomainError::NotFound(_))
    ));

    assert!(matches!(
        h.shipments.shipment(ShipmentId::new()),
        Err(DomainError::NotFound(_))
    ));
    assert!(matches!(
        h.shipments.by_tracking_number("TRK-0-MISSING"),
        Err(DomainError::NotFound(_))
    ));
}

#[test]
fn dock_flow_moves_shipment_and_driver_together() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 10, vec![])).unwrap();

    let entry = h
        .queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id).with_priority(2))
        .unwrap();
    assert_eq!(entry.status(), QueueStatus::Waiting);
    assert_eq!(
        h.shipments.shipment(shipment.id_typed()).unwrap().status(),
        ShipmentStatus::Queued
    );

    let started = h.queue.start_loading(entry.id).unwrap();
    assert_eq!(started.status(), QueueStatus::Loading);
    assert!(started.start_loading_time().is_some());
    let loading = h.shipments.shipment(shipment.id_typed()).unwrap();
    assert_eq!(loading.status(), ShipmentStatus::Loading);
    assert!(loading.actual_pickup_date().is_some());

    let finished = h.queue.finish_loading(entry.id).unwrap();
    assert_eq!(finished.status(), QueueStatus::Completed);
    assert!(finished.finish_loading_time().is_some());
    assert_eq!(
        h.shipments.shipment(shipment.id_typed()).unwrap().status(),
        ShipmentStatus::InTransit
    );
    let driver = h.store.read(|t| Ok(t.driver(h.driver_id)?.clone())).unwrap();
    assert_eq!(driver.status(), DriverStatus::OnRoute);

    let stats = h.queue.statistics(h.origin).unwrap();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.waiting, 0);
}

#[test]
fn duplicate_enqueue_is_rejected_while_waiting() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 5, vec![])).unwrap();
    h.queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id))
        .unwrap();

    let err = h
        .queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id))
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateEntry(_)));
}

#[test]
fn cancelling_a_waiting_entry_reverts_the_shipment() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 5, vec![])).unwrap();
    let entry = h
        .queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id))
        .unwrap();

    let cancelled = h.queue.cancel(entry.id).unwrap();
    assert_eq!(cancelled.status(), QueueStatus::Cancelled);
    assert_eq!(
        h.shipments.shipment(shipment.id_typed()).unwrap().status(),
        ShipmentStatus::Pending
    );

    // The slot is free again.
    h.queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id))
        .unwrap();
}

#[test]
fn select_next_honours_priority_then_fifo() {
    let h = harness();
    let s1 = h.shipments.create(new_shipment(&h, 1, vec![])).unwrap();
    let s2 = h.shipments.create(new_shipment(&h, 1, vec![])).unwrap();
    let s3 = h.shipments.create(new_shipment(&h, 1, vec![])).unwrap();

    h.queue
        .enqueue(EnqueueRequest::new(h.origin, s1.id_typed(), h.driver_id).with_priority(5))
        .unwrap();
    sleep(StdDuration::from_millis(3));
    h.queue
        .enqueue(EnqueueRequest::new(h.origin, s2.id_typed(), h.driver_id).with_priority(5))
        .unwrap();

    // FIFO within the same priority band.
    let next = h.queue.select_next(h.origin).unwrap().unwrap();
    assert_eq!(next.shipment_id, s1.id_typed());

    sleep(StdDuration::from_millis(3));
    let e3 = h
        .queue
        .enqueue(EnqueueRequest::new(h.origin, s3.id_typed(), h.driver_id).with_priority(10))
        .unwrap();

    // Higher priority wins despite arriving last.
    let next = h.queue.select_next(h.origin).unwrap().unwrap();
    assert_eq!(next.shipment_id, s3.id_typed());

    // Reprioritising reorders immediately.
    h.queue.reprioritize(e3.id, 0).unwrap();
    let next = h.queue.select_next(h.origin).unwrap().unwrap();
    assert_eq!(next.shipment_id, s1.id_typed());
}

#[test]
fn finish_loading_out_of_order_changes_nothing() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 5, vec![])).unwrap();
    let entry = h
        .queue
        .enqueue(EnqueueRequest::new(h.origin, shipment.id_typed(), h.driver_id))
        .unwrap();

    let err = h.queue.finish_loading(entry.id).unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));

    // Entry, shipment, and driver all kept their state.
    let entry = h.store.read(|t| Ok(t.queue_entry(entry.id)?.clone())).unwrap();
    assert_eq!(entry.status(), QueueStatus::Waiting);
    assert!(entry.finish_loading_time().is_none());
    assert_eq!(
        h.shipments.shipment(shipment.id_typed()).unwrap().status(),
        ShipmentStatus::Queued
    );
    let driver = h.store.read(|t| Ok(t.driver(h.driver_id)?.clone())).unwrap();
    assert_eq!(driver.status(), DriverStatus::Available);
}

#[test]
fn multi_leg_route_cascades_to_delivery() {
    let h = harness();
    let legs = vec![
        leg(1, h.origin, h.destination),
        leg(2, h.destination, h.origin),
    ];
    let shipment = h.shipments.create(new_shipment(&h, 30, legs)).unwrap();
    assert!(shipment.is_multi_leg());
    let id = shipment.id_typed();

    load_through_dock(&h, id);
    let in_transit = h.shipments.shipment(id).unwrap();
    assert_eq!(in_transit.leg(1).unwrap().status(), LegStatus::InTransit);
    assert_eq!(in_transit.leg(2).unwrap().status(), LegStatus::Pending);

    let (leg1, cascade) = h.shipments.update_leg_status(id, 1, LegStatus::Arrived).unwrap();
    assert_eq!(cascade, LegCascade::None);
    assert!(leg1.actual_arrival_date().is_some());

    // Goods physically change warehouses mid-route.
    h.shipments.unload_at_warehouse(id, h.destination).unwrap();
    let origin_stock = h.stock.stock_by_warehouse(h.origin).unwrap()[0].clone();
    assert_eq!(origin_stock.quantity(), 70);
    assert_eq!(origin_stock.reserved(), 0);
    let dest_stock = h.stock.stock_by_warehouse(h.destination).unwrap()[0].clone();
    assert_eq!(dest_stock.quantity(), 30);
    assert_eq!(dest_stock.available(), 30);

    h.shipments.update_leg_status(id, 1, LegStatus::Unloaded).unwrap();
    let (_, cascade) = h.shipments.update_leg_status(id, 1, LegStatus::Completed).unwrap();
    assert_eq!(cascade, LegCascade::NextLegStarted(2));
    let mid_route = h.shipments.shipment(id).unwrap();
    assert_eq!(mid_route.leg(2).unwrap().status(), LegStatus::InTransit);
    assert_eq!(mid_route.status(), ShipmentStatus::InTransit);

    h.shipments.update_leg_status(id, 2, LegStatus::Arrived).unwrap();
    let (_, cascade) = h.shipments.update_leg_status(id, 2, LegStatus::Completed).unwrap();
    assert_eq!(cascade, LegCascade::ShipmentDelivered);
    let delivered = h.shipments.shipment(id).unwrap();
    assert_eq!(delivered.status(), ShipmentStatus::Delivered);
    assert!(delivered.actual_delivery_date().is_some());
}

#[test]
fn unloading_twice_fails_without_touching_the_destination() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 30, vec![])).unwrap();
    let id = shipment.id_typed();

    h.shipments.unload_at_warehouse(id, h.destination).unwrap();
    let err = h.shipments.unload_at_warehouse(id, h.destination).unwrap_err();
    assert!(matches!(err, DomainError::InsufficientStock(_)));

    let dest_stock = h.stock.stock_by_warehouse(h.destination).unwrap()[0].clone();
    assert_eq!(dest_stock.quantity(), 30);
}

#[test]
fn settlement_pays_the_driver_and_books_the_profit() {
    let h = harness();
    // 100 units at price 10 -> total value 1000.
    let shipment = h.shipments.create(new_shipment(&h, 100, vec![])).unwrap();
    let id = shipment.id_typed();
    h.shipments.assign_driver(id, h.driver_id).unwrap();
    load_through_dock(&h, id);
    h.shipments.update_status(id, ShipmentStatus::Delivered).unwrap();

    let outcome = h.financial.settle(id, 50, 20).unwrap();
    assert_eq!(outcome.payment.entry_type(), EntryType::Payment);
    assert_eq!(outcome.payment.amount(), 650);
    assert_eq!(outcome.payment.balance_before(), 0);
    assert_eq!(outcome.payment.balance_after(), 650);
    assert_eq!(outcome.payment.reference(), format!("PAY-{}", shipment.tracking_number()));

    let expense = outcome.expense.unwrap();
    assert_eq!(expense.entry_type(), EntryType::Expense);
    assert_eq!(expense.amount(), -70);
    assert_eq!(expense.balance_before(), 650);
    assert_eq!(expense.balance_after(), 580);

    assert_eq!(outcome.shipment.driver_payment(), Some(650));
    assert_eq!(outcome.shipment.fuel_cost(), Some(50));
    assert_eq!(outcome.shipment.other_expenses(), Some(20));
    assert_eq!(outcome.shipment.company_profit(), Some(280));

    let report = h.financial.driver_balance(h.driver_id).unwrap();
    assert_eq!(report.balance, 580);
    assert_eq!(report.total_earnings, 650);
    assert_eq!(report.total_expenses, 70);
    assert_eq!(report.entry_count, 2);
    assert!(report.is_reconciled());

    // Settling twice would double-pay.
    assert!(matches!(
        h.financial.settle(id, 50, 20),
        Err(DomainError::InvalidState(_))
    ));

    let company = h.financial.company_report(None, None).unwrap();
    assert_eq!(company.shipment_count, 1);
    assert_eq!(company.total_revenue, 1000);
    assert_eq!(company.total_driver_payments, 650);
    assert_eq!(company.total_expenses, 70);
    assert_eq!(company.total_profit, 280);

    // Out-of-range window sees nothing.
    let later = Utc::now() + Duration::days(1);
    let empty = h.financial.company_report(Some(later), None).unwrap();
    assert_eq!(empty.shipment_count, 0);
    assert_eq!(empty.total_revenue, 0);
}

#[test]
fn settlement_guards_status_and_driver() {
    let h = harness();
    let shipment = h.shipments.create(new_shipment(&h, 10, vec![])).unwrap();
    let id = shipment.id_typed();

    assert!(matches!(
        h.financial.settle(id, 10, 0),
        Err(DomainError::InvalidState(_))
    ));

    // Delivered but never assigned a driver.
    h.shipments.force_status(id, ShipmentStatus::Delivered).unwrap();
    assert!(matches!(
        h.financial.settle(id, 10, 0),
        Err(DomainError::MissingDriver(_))
    ));
}

#[test]
fn assign_driver_requires_availability() {
    let h = harness();
    let first = h.shipments.create(new_shipment(&h, 5, vec![])).unwrap();
    let second = h.shipments.create(new_shipment(&h, 5, vec![])).unwrap();

    h.shipments.assign_driver(first.id_typed(), h.driver_id).unwrap();
    let err = h
        .shipments
        .assign_driver(second.id_typed(), h.driver_id)
        .unwrap_err();
    assert!(matches!(err, DomainError::DriverUnavailable(_)));
    assert_eq!(
        h.shipments.shipment(second.id_typed()).unwrap().driver_id(),
        None
    );
}

#[test]
fn ledger_postings_move_and_guard_the_balance() {
    let h = harness();

    let err = h
        .financial
        .create_transaction(h.driver_id, EntryType::Expense, -10, None, None)
        .unwrap_err();
    assert!(matches!(err, DomainError::InsufficientBalance(_)));
    assert_eq!(h.financial.driver_balance(h.driver_id).unwrap().balance, 0);

    h.financial
        .create_transaction(h.driver_id, EntryType::Payment, 100, Some("Advance".into()), None)
        .unwrap();
    let expense = h
        .financial
        .create_transaction(h.driver_id, EntryType::Expense, -30, None, None)
        .unwrap();
    assert_eq!(expense.balance_after(), 70);
    assert!(expense.reference().starts_with("TXN-"));

    let history = h.financial.driver_transactions(h.driver_id, None, None).unwrap();
    assert_eq!(history.len(), 2);
    // Newest first.
    assert_eq!(history[0].amount(), -30);
    assert_eq!(history[1].amount(), 100);

    let payments = h
        .financial
        .driver_transactions(h.driver_id, Some(EntryType::Payment), None)
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount(), 100);

    let report = h.financial.driver_balance(h.driver_id).unwrap();
    assert_eq!(report.balance, 70);
    assert!(report.is_reconciled());
}

#[test]
fn status_filters_and_listing_order() {
    let h = harness();
    let s1 = h.shipments.create(new_shipment(&h, 1, vec![])).unwrap();
    sleep(StdDuration::from_millis(3));
    let s2 = h.shipments.create(new_shipment(&h, 1, vec![])).unwrap();
    h.queue
        .enqueue(EnqueueRequest::new(h.origin, s2.id_typed(), h.driver_id))
        .unwrap();

    let all = h.shipments.shipments(None, None).unwrap();
    assert_eq!(all.len(), 2);
    // Newest first.
    assert_eq!(all[0].id_typed(), s2.id_typed());

    let queued = h
        .shipments
        .shipments(Some(ShipmentStatus::Queued), None)
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].id_typed(), s2.id_typed());

    let found = h.shipments.by_tracking_number(s1.tracking_number()).unwrap();
    assert_eq!(found.id_typed(), s1.id_typed());
}

#[test]
fn low_stock_alerts_respect_threshold_and_scope() {
    let h = harness();
    assert!(h.stock.low_stock(Some(h.origin)).unwrap().is_empty());

    // 96 of 100 reserved leaves 4 available against a threshold of 5.
    h.stock.reserve(h.product_id, h.origin, 96).unwrap();
    let alerts = h.stock.low_stock(Some(h.origin)).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].available, 4);
    assert_eq!(alerts[0].threshold, 5);

    // Stock at another warehouse lifts the unscoped total back out.
    h.stock.receive(h.product_id, h.destination, 50).unwrap();
    assert!(h.stock.low_stock(None).unwrap().is_empty());
    assert_eq!(h.stock.low_stock(Some(h.origin)).unwrap().len(), 1);

    h.stock.release(h.product_id, h.origin, 96).unwrap();
    assert!(h.stock.low_stock(Some(h.origin)).unwrap().is_empty());
}
