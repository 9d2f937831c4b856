//! Shipment lifecycle integration tests

use shipment_service::contract::{ShipmentStatus, TrackingError};

mod common;
use common::{instant, service_with_store};
use shipment_service::domain::GpsPoint;

#[tokio::test]
async fn finalize_moves_unstarted_packages_to_ready() {
    let (service, store) = service_with_store();
    let partner = store.add_user("ACME Relief", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    let p1 = store.add_package(shipment.id, 1, None);
    let p2 = store.add_package(shipment.id, 2, Some(ShipmentStatus::InProgress));
    let p3 = store.add_package(shipment.id, 3, Some(ShipmentStatus::PickedUp));

    let result = service.finalize_shipment(shipment.id).await.unwrap();

    assert_eq!(result.status, ShipmentStatus::Ready);
    assert_eq!(store.package(p1.id).status, Some(ShipmentStatus::Ready));
    assert_eq!(store.package(p2.id).status, Some(ShipmentStatus::Ready));
    // A package already moving is left alone
    assert_eq!(store.package(p3.id).status, Some(ShipmentStatus::PickedUp));
}

#[tokio::test]
async fn finalize_twice_is_rejected() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);

    service.finalize_shipment(shipment.id).await.unwrap();
    let err = service.finalize_shipment(shipment.id).await.unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn reopen_reverts_exactly_the_ready_packages() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::Ready);
    let ready = store.add_package(shipment.id, 1, Some(ShipmentStatus::Ready));
    let moving = store.add_package(shipment.id, 2, Some(ShipmentStatus::InTransit));

    let result = service.reopen_shipment(shipment.id).await.unwrap();

    assert_eq!(result.status, ShipmentStatus::InProgress);
    assert_eq!(store.package(ready.id).status, Some(ShipmentStatus::InProgress));
    assert_eq!(store.package(moving.id).status, Some(ShipmentStatus::InTransit));
}

#[tokio::test]
async fn reopen_is_rejected_once_shipped() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::PickedUp);
    let err = service.reopen_shipment(shipment.id).await.unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn cancel_is_rejected_for_received_shipments() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::Received);
    let err = service.cancel_shipment(shipment.id).await.unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));

    let in_progress = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    let result = service.cancel_shipment(in_progress.id).await.unwrap();
    assert_eq!(result.status, ShipmentStatus::Canceled);
}

#[tokio::test]
async fn losing_a_shipment_records_acceptability_and_note() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InTransit);

    let result = service
        .mark_shipment_lost(shipment.id, true, "truck hijacked at the border")
        .await
        .unwrap();

    assert_eq!(result.status, ShipmentStatus::Lost);
    assert!(result.acceptable);
    assert_eq!(result.status_note, "truck hijacked at the border");

    // Only shipped shipments can be lost
    let unshipped = store.add_shipment(partner.id, ShipmentStatus::Ready);
    let err = service.mark_shipment_lost(unshipped.id, false, "").await.unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));
}

#[tokio::test]
async fn printing_finalizes_an_in_progress_shipment() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    store.add_package(shipment.id, 1, Some(ShipmentStatus::InProgress));

    let result = service.record_print(shipment.id).await.unwrap();
    assert_eq!(result.status, ShipmentStatus::Ready);

    // Printing again changes nothing
    let again = service.record_print(shipment.id).await.unwrap();
    assert_eq!(again.status, ShipmentStatus::Ready);
}

#[tokio::test]
async fn saving_stamps_status_dates_once() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let mut shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);

    shipment.status = ShipmentStatus::PickedUp;
    let saved = service.save_shipment(shipment).await.unwrap();
    let stamped = saved.date_picked_up.unwrap();

    // A second save never moves an already-set marker
    let mut again = saved.clone();
    again.status = ShipmentStatus::PickedUp;
    let resaved = service.save_shipment(again).await.unwrap();
    assert_eq!(resaved.date_picked_up, Some(stamped));

    let mut transit = resaved.clone();
    transit.status = ShipmentStatus::InTransit;
    let transit = service.save_shipment(transit).await.unwrap();
    assert!(transit.date_in_transit.is_some());
    assert_eq!(transit.date_picked_up, Some(stamped));
}

#[tokio::test]
async fn package_past_pickup_ratchets_shipment_forward_only() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::Ready);
    let mut package = store.add_package(shipment.id, 1, Some(ShipmentStatus::Ready));

    package.status = Some(ShipmentStatus::Received);
    service.save_package(package).await.unwrap();

    // Promoted to PickedUp, not dragged all the way to Received
    assert_eq!(store.shipment(shipment.id).status, ShipmentStatus::PickedUp);

    // A later save never demotes
    let mut other = store.add_package(shipment.id, 2, Some(ShipmentStatus::Ready));
    other.status = Some(ShipmentStatus::PickedUp);
    service.save_package(other).await.unwrap();
    assert_eq!(store.shipment(shipment.id).status, ShipmentStatus::PickedUp);
}

#[tokio::test]
async fn saving_a_new_package_assigns_number_and_code() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    store.add_package(shipment.id, 4, Some(ShipmentStatus::InProgress));

    let package = shipment_service::contract::Package {
        id: 0,
        shipment_id: shipment.id,
        name: "Extra".to_string(),
        description: String::new(),
        number_in_shipment: 0,
        status: Some(ShipmentStatus::InProgress),
        code: String::new(),
        kit_id: None,
        last_scan_id: None,
        last_scan_status_label: None,
        date_picked_up: None,
        date_in_transit: None,
        date_received: None,
    };
    let saved = service.save_package(package).await.unwrap();
    assert_eq!(saved.number_in_shipment, 5);
    assert_eq!(saved.code, format!("/JO{}.5", shipment.id));
}

#[tokio::test]
async fn verbose_status_shows_percentage_only_when_it_should() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);

    // Received with 2 of 4 packages received
    let shipment = store.add_shipment(partner.id, ShipmentStatus::Received);
    store.add_package(shipment.id, 1, Some(ShipmentStatus::Received));
    store.add_package(shipment.id, 2, Some(ShipmentStatus::Received));
    store.add_package(shipment.id, 3, Some(ShipmentStatus::InTransit));
    store.add_package(shipment.id, 4, Some(ShipmentStatus::InTransit));
    assert_eq!(service.verbose_status(shipment.id).await.unwrap(), "Received (50%)");

    // At 100% the parenthetical disappears
    let complete = store.add_shipment(partner.id, ShipmentStatus::Received);
    store.add_package(complete.id, 1, Some(ShipmentStatus::Received));
    assert_eq!(service.verbose_status(complete.id).await.unwrap(), "Received");

    // Other statuses never show a percentage, even partially complete
    let picked = store.add_shipment(partner.id, ShipmentStatus::PickedUp);
    store.add_package(picked.id, 1, Some(ShipmentStatus::PickedUp));
    store.add_package(picked.id, 2, Some(ShipmentStatus::Ready));
    assert_eq!(service.verbose_status(picked.id).await.unwrap(), "Picked up");

    // No packages, no percentage
    let empty = store.add_shipment(partner.id, ShipmentStatus::InTransit);
    assert_eq!(service.verbose_status(empty.id).await.unwrap(), "In transit");
}

#[tokio::test]
async fn deleting_a_shipment_cascades_and_clears_report_rows() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let donor = store.add_donor("ECHO");
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InTransit);
    let package = store.add_package(shipment.id, 1, Some(ShipmentStatus::InTransit));
    store.add_package_item(package.id, Some(donor.id), Some(99), 10, "2.00");

    // Materialize the aggregates, then record a scan against the package
    service.refresh_donor_shipment_data(Some(donor.id), shipment.id).await.unwrap();
    service.refresh_donor_category_data(Some(donor.id), Some(99)).await.unwrap();
    service
        .record_package_scan(
            &package.code,
            instant(2015, 4, 6, 10, 0, 0),
            GpsPoint::default(),
            None,
            Some(ShipmentStatus::InTransit),
        )
        .await
        .unwrap();
    assert!(store.donor_shipment_row(Some(donor.id), shipment.id).is_some());
    assert_eq!(store.scan_count(), 1);

    service.delete_shipment(shipment.id).await.unwrap();

    assert!(store.packages_of(shipment.id).is_empty());
    assert_eq!(store.item_count(), 0);
    assert_eq!(store.scan_count(), 0);
    assert!(store.donor_shipment_row(Some(donor.id), shipment.id).is_none());
    // The donor×category aggregate lost its last item and was removed
    assert!(store.donor_category_row(Some(donor.id), Some(99)).is_none());

    // Deleting again reports the shipment as gone
    let err = service.delete_shipment(shipment.id).await.unwrap_err();
    assert!(matches!(err, TrackingError::NotFound { .. }));
}

#[tokio::test]
async fn background_delete_runs_to_completion() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    store.add_package(shipment.id, 1, Some(ShipmentStatus::InProgress));

    let handle = shipment_service::ingest::spawn_delete_shipment(service.clone(), shipment.id);
    handle.await.unwrap();

    assert!(store.packages_of(shipment.id).is_empty());

    // A task for an id that is already gone logs and exits cleanly
    let handle = shipment_service::ingest::spawn_delete_shipment(service, shipment.id);
    handle.await.unwrap();
}

#[tokio::test]
async fn donor_shipment_row_removed_with_last_item() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let donor = store.add_donor("OFDA");
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    let package = store.add_package(shipment.id, 1, Some(ShipmentStatus::InProgress));
    let item = store.add_package_item(package.id, Some(donor.id), Some(5), 3, "1.50");

    service.refresh_donor_shipment_data(Some(donor.id), shipment.id).await.unwrap();
    assert!(store.donor_shipment_row(Some(donor.id), shipment.id).is_some());

    service.delete_package_item(item.id).await.unwrap();

    assert!(store.donor_shipment_row(Some(donor.id), shipment.id).is_none());
}

#[tokio::test]
async fn shipment_donor_summary_tracks_item_donors() {
    let (service, store) = service_with_store();
    let partner = store.add_user("P", "USER-1", "", shipment_service::contract::UserRole::Partner);
    let echo = store.add_donor("ECHO");
    let ofda = store.add_donor("OFDA");
    let category = 7;
    let item_a = store.add_catalog_item("Blankets", "4.00", category, Some(echo.id));
    let item_b = store.add_catalog_item("Tarps", "6.00", category, Some(ofda.id));
    let shipment = store.add_shipment(partner.id, ShipmentStatus::InProgress);
    let package = store.add_package(shipment.id, 1, Some(ShipmentStatus::InProgress));

    service.add_item_to_package(package.id, item_a.id, 2).await.unwrap();
    assert_eq!(store.shipment(shipment.id).donor.as_deref(), Some("ECHO"));

    service.add_item_to_package(package.id, item_b.id, 1).await.unwrap();
    assert_eq!(store.shipment(shipment.id).donor.as_deref(), Some("Multiple"));
}
