//! Cart checkout/checkin flow against the in-memory store

mod helpers;

use assert_matches::assert_matches;
use helpers::*;

use studio_gear::models::{ApprovalStatus, MembershipStatus, StudioRole, TransactionType, UnitStatus};
use studio_gear::services::checkout::CheckoutOptions;
use studio_gear::services::CheckoutFlow;
use studio_gear::state::{FlowMode, FlowStep};
use studio_gear::utils::errors::GearError;

async fn stage(flow: &mut CheckoutFlow, code: &str) {
    flow.handle_scan(code).await.unwrap();
    flow.begin_photo().unwrap();
    flow.capture_photo(test_photo(), "image/jpeg").unwrap();
    flow.confirm_photo().unwrap();
}

#[tokio::test]
async fn test_checkout_commits_cart() {
    init_test_logging();
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    flow.handle_scan(CAMERA_CODE).await.unwrap();
    assert_eq!(flow.step(), FlowStep::ConfirmItem);
    assert_eq!(flow.current().unwrap().unit.code, CAMERA_CODE);

    flow.begin_photo().unwrap();
    flow.capture_photo(test_photo(), "image/jpeg").unwrap();
    flow.confirm_photo().unwrap();
    assert_eq!(flow.step(), FlowStep::Scan);
    assert_eq!(flow.cart().len(), 1);

    flow.proceed_to_cart().unwrap();
    let report = flow.confirm_transaction().await.unwrap();

    assert_eq!(flow.step(), FlowStep::Success);
    assert!(flow.cart().is_empty());
    assert_eq!(report.mode, FlowMode::Checkout);
    assert_eq!(report.transactions.len(), 1);

    let tx = &report.transactions[0];
    assert_eq!(tx.kind, TransactionType::Checkout);
    assert_eq!(tx.quantity, 1);
    assert_eq!(tx.equipment_item_id, Some(fixture.units[0].id));
    assert_eq!(tx.user_id, fixture.context.user_id);
    assert!(tx.approval_status.is_none());
    assert!(tx.photo_url.as_deref().unwrap().starts_with("memory://transaction-photos/"));

    assert_eq!(fixture.store.unit(fixture.units[0].id).status, UnitStatus::CheckedOut);
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 4);

    let photos = fixture.store.photo_paths();
    assert_eq!(photos.len(), 1);
    let prefix = format!("{}/{}/", fixture.context.studio_id, fixture.units[0].id);
    assert!(photos[0].1.starts_with(&prefix));

    flow.start_over().unwrap();
    assert_eq!(flow.step(), FlowStep::Scan);
    assert_eq!(flow.mode(), FlowMode::Checkout);
}

#[tokio::test]
async fn test_checkin_restores_availability() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    fixture.check_out(&fixture.units[1]);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());
    flow.set_mode(FlowMode::Checkin).unwrap();

    stage(&mut flow, "CAM-002-CD34").await;
    flow.proceed_to_cart().unwrap();
    let report = flow.confirm_transaction().await.unwrap();

    assert_eq!(report.transactions[0].kind, TransactionType::Checkin);
    assert_eq!(fixture.store.unit(fixture.units[1].id).status, UnitStatus::Available);
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 5);
}

#[tokio::test]
async fn test_unknown_code_stays_on_scan() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    let err = flow.handle_scan("NOPE-000").await.unwrap_err();
    assert_matches!(err, GearError::NotFound(_));
    assert_eq!(flow.step(), FlowStep::Scan);
    assert_eq!(
        flow.message(),
        Some("Item not found. Make sure you are scanning a valid label.")
    );
}

#[tokio::test]
async fn test_status_mismatch_is_rejected() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    fixture.check_out(&fixture.units[0]);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    let err = flow.handle_scan(CAMERA_CODE).await.unwrap_err();
    assert_matches!(err, GearError::StateConflict(ref m) if m == "This item is already checked out.");

    flow.set_mode(FlowMode::Checkin).unwrap();
    let err = flow.handle_scan("CAM-002-CD34").await.unwrap_err();
    assert_matches!(err, GearError::StateConflict(ref m) if m == "This item is not currently checked out.");
}

#[tokio::test]
async fn test_same_unit_cannot_be_staged_twice() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    stage(&mut flow, CAMERA_CODE).await;
    let err = flow.handle_scan(CAMERA_CODE).await.unwrap_err();
    assert_matches!(err, GearError::StateConflict(_));
    assert_eq!(flow.cart().len(), 1);
}

#[tokio::test]
async fn test_photo_is_required_by_default() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    flow.handle_scan(CAMERA_CODE).await.unwrap();
    flow.begin_photo().unwrap();
    let err = flow.confirm_photo().unwrap_err();
    assert_matches!(err, GearError::InvalidInput(_));
    assert_eq!(flow.step(), FlowStep::Photo);

    flow.capture_photo(test_photo(), "image/jpeg").unwrap();
    flow.retake_photo().unwrap();
    assert!(flow.current().unwrap().photo.is_none());

    flow.cancel_item().unwrap();
    assert_eq!(flow.step(), FlowStep::Scan);
    assert!(flow.current().is_none());
    assert!(flow.cart().is_empty());
}

#[tokio::test]
async fn test_photo_optional_when_disabled() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let options = CheckoutOptions {
        require_photo: false,
        approval_workflow: true,
        ..CheckoutOptions::default()
    };
    let mut flow = fixture.checkout_flow(options);

    flow.handle_scan(CAMERA_CODE).await.unwrap();
    flow.begin_photo().unwrap();
    flow.confirm_photo().unwrap();
    flow.proceed_to_cart().unwrap();
    let report = flow.confirm_transaction().await.unwrap();

    let tx = &report.transactions[0];
    assert!(tx.photo_url.is_none());
    assert_eq!(tx.approval_status, Some(ApprovalStatus::Pending));
    assert!(fixture.store.photo_paths().is_empty());
}

#[tokio::test]
async fn test_mode_locked_while_cart_has_items() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    stage(&mut flow, CAMERA_CODE).await;
    assert_matches!(flow.set_mode(FlowMode::Checkin), Err(GearError::StateConflict(_)));

    assert!(flow.remove_code("cam-001-ab12").unwrap());
    assert!(flow.cart().is_empty());
    flow.set_mode(FlowMode::Checkin).unwrap();
    assert_eq!(flow.mode(), FlowMode::Checkin);
}

#[tokio::test]
async fn test_removing_last_item_leaves_cart_view() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    assert_matches!(flow.proceed_to_cart(), Err(GearError::InvalidInput(_)));

    stage(&mut flow, CAMERA_CODE).await;
    flow.proceed_to_cart().unwrap();
    assert_eq!(flow.step(), FlowStep::Cart);

    assert!(flow.remove_from_cart(fixture.units[0].id).unwrap());
    assert_eq!(flow.step(), FlowStep::Scan);
}

#[tokio::test]
async fn test_failed_item_is_compensated_and_earlier_items_stay() {
    init_test_logging();
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    stage(&mut flow, CAMERA_CODE).await;
    stage(&mut flow, "CAM-002-CD34").await;
    flow.proceed_to_cart().unwrap();

    fixture.store.fail_after(Fault::RecordTransaction, 1);
    let err = flow.confirm_transaction().await.unwrap_err();

    assert_matches!(
        err,
        GearError::CommitFailed { committed: 1, compensation_failures: 0, .. }
    );
    assert_eq!(flow.step(), FlowStep::Cart);
    assert_eq!(flow.message(), Some("Failed to complete transaction. Please try again."));
    assert_eq!(flow.cart().len(), 1);
    assert_eq!(flow.cart()[0].unit.code, "CAM-002-CD34");

    // First item committed, second fully rolled back
    assert_eq!(fixture.store.unit(fixture.units[0].id).status, UnitStatus::CheckedOut);
    assert_eq!(fixture.store.unit(fixture.units[1].id).status, UnitStatus::Available);
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 4);
    assert_eq!(fixture.store.transactions().len(), 1);
    assert_eq!(fixture.store.photo_paths().len(), 1);
}

#[tokio::test]
async fn test_concurrent_status_change_is_a_conflict() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    stage(&mut flow, CAMERA_CODE).await;
    flow.proceed_to_cart().unwrap();

    // Someone else checks the unit out between scan and commit
    fixture.check_out(&fixture.units[0]);

    let err = flow.confirm_transaction().await.unwrap_err();
    assert_matches!(err, GearError::CommitFailed { committed: 0, .. });
    assert_eq!(err.user_message(), "This item is already checked out.");
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 4);
    assert!(fixture.store.transactions().is_empty());
}

#[tokio::test]
async fn test_revoked_membership_blocks_commit() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut flow = fixture.checkout_flow(CheckoutOptions::default());

    stage(&mut flow, CAMERA_CODE).await;
    flow.proceed_to_cart().unwrap();

    fixture.store.set_membership_status(
        fixture.context.studio_id,
        fixture.context.user_id,
        MembershipStatus::Disabled,
    );

    let err = flow.confirm_transaction().await.unwrap_err();
    assert_matches!(err, GearError::PermissionDenied(_));
    assert_eq!(flow.step(), FlowStep::Cart);
    assert_eq!(fixture.store.unit(fixture.units[0].id).status, UnitStatus::Available);
}
