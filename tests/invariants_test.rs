//! Availability bounds and unit status under arbitrary and concurrent use

mod helpers;

use helpers::*;
use proptest::prelude::*;

use studio_gear::models::{StudioRole, UnitStatus};
use studio_gear::services::checkout::CheckoutOptions;
use studio_gear::services::labels::equipment_payload;
use studio_gear::services::quick_scan::check_quantity;
use studio_gear::state::FlowMode;
use studio_gear::utils::helpers::generate_unit_code;

proptest! {
    #[test]
    fn prop_quantity_check_matches_bounds(total in 0i32..50, taken in 0i32..50, quantity in -5i32..60) {
        let available = (total - taken).max(0);
        let equipment = test_equipment(uuid::Uuid::new_v4(), "Cable", total, available);

        let checkout_ok = check_quantity(FlowMode::Checkout, &equipment, quantity).is_ok();
        prop_assert_eq!(checkout_ok, quantity >= 1 && quantity <= available);

        let checkin_ok = check_quantity(FlowMode::Checkin, &equipment, quantity).is_ok();
        prop_assert_eq!(checkin_ok, quantity >= 1 && available + quantity <= total);
    }

    #[test]
    fn prop_unit_codes_have_fixed_shape(index in 1usize..999) {
        let code = generate_unit_code("CAM", index);
        let parts: Vec<&str> = code.split('-').collect();
        prop_assert_eq!(parts.len(), 3);
        prop_assert_eq!(parts[1], format!("{:03}", index));
        prop_assert_eq!(parts[2].len(), 4);
        prop_assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn prop_availability_stays_in_bounds(ops in prop::collection::vec((any::<bool>(), 1i32..4), 1..20)) {
        tokio_test::block_on(async {
            let fixture = StudioFixture::new(StudioRole::Colleague);
            let payload = equipment_payload(fixture.context.studio_id, fixture.camera.id);
            let mut station = fixture.scan_station(false);

            for (checkout, quantity) in ops {
                let mode = if checkout { FlowMode::Checkout } else { FlowMode::Checkin };
                station.set_mode(mode);
                station.handle_scan(&payload).await.unwrap();
                station.set_quantity(quantity).unwrap();

                let before = fixture.store.equipment(fixture.camera.id).available_quantity;
                let expected_ok = check_quantity(mode, &fixture.store.equipment(fixture.camera.id), quantity).is_ok();
                let result = station.confirm().await;
                assert_eq!(result.is_ok(), expected_ok);

                let after = fixture.store.equipment(fixture.camera.id).available_quantity;
                assert!((0..=5).contains(&after));
                if result.is_ok() {
                    assert_eq!(after, before + mode.availability_delta(quantity));
                } else {
                    assert_eq!(after, before);
                }
                station.next_scan().unwrap();
            }
        });
    }
}

#[tokio::test]
async fn test_same_unit_committed_by_two_carts_once() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let options = CheckoutOptions {
        require_photo: false,
        ..CheckoutOptions::default()
    };
    let mut first = fixture.checkout_flow(options.clone());
    let mut second = fixture.checkout_flow(options);

    for flow in [&mut first, &mut second] {
        flow.handle_scan(CAMERA_CODE).await.unwrap();
        flow.begin_photo().unwrap();
        flow.confirm_photo().unwrap();
        flow.proceed_to_cart().unwrap();
    }

    let (a, b) = futures::future::join(first.confirm_transaction(), second.confirm_transaction()).await;
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    assert_eq!(fixture.store.unit(fixture.units[0].id).status, UnitStatus::CheckedOut);
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 4);
    assert_eq!(fixture.store.transactions().len(), 1);
}
