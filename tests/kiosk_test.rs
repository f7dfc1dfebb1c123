//! Kiosk event handling over the cart flow and the quick-scan station

mod helpers;

use helpers::*;

use studio_gear::handlers::kiosk::{Control, Kiosk, KioskEvent, Station};
use studio_gear::models::{StudioRole, UnitStatus};
use studio_gear::services::checkout::CheckoutOptions;
use studio_gear::services::labels::equipment_payload;
use studio_gear::state::FlowMode;

async fn send(kiosk: &mut Kiosk, event: KioskEvent) -> (Control, Vec<String>) {
    let mut out = Vec::new();
    let control = kiosk.handle(event, &mut out).await;
    (control, out)
}

fn command(text: &str) -> KioskEvent {
    KioskEvent::Command(text.to_string())
}

#[tokio::test]
async fn test_cart_kiosk_session() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let options = CheckoutOptions {
        require_photo: false,
        ..CheckoutOptions::default()
    };
    let mut kiosk = Kiosk::new(Station::Cart(fixture.checkout_flow(options)));

    let (_, out) = send(&mut kiosk, KioskEvent::Scan(CAMERA_CODE.to_string())).await;
    assert!(out[0].starts_with("Camera [CAM-001-AB12]"));

    let (_, out) = send(&mut kiosk, KioskEvent::Scan("CAM-002-CD34".to_string())).await;
    assert_eq!(out, vec!["Finish the current item first (:confirm or :cancel).".to_string()]);

    let (_, out) = send(&mut kiosk, command(":confirm")).await;
    assert_eq!(out, vec!["Added to cart (1 items).".to_string()]);
    assert_eq!(kiosk.prompt(), "[checkout | scan | cart: 1]");

    let (_, out) = send(&mut kiosk, command(":mode")).await;
    assert_eq!(out, vec!["Clear the cart before switching between checkout and checkin.".to_string()]);

    send(&mut kiosk, command(":cart")).await;
    let (control, out) = send(&mut kiosk, command(":commit")).await;
    assert_eq!(control, Control::Continue);
    assert_eq!(out, vec!["Done: 1 checkout transaction(s) recorded.".to_string()]);
    assert_eq!(fixture.store.unit(fixture.units[0].id).status, UnitStatus::CheckedOut);

    let (control, _) = send(&mut kiosk, command(":quit")).await;
    assert_eq!(control, Control::Quit);
}

#[tokio::test]
async fn test_unknown_scan_keeps_kiosk_running() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut kiosk = Kiosk::new(Station::Cart(fixture.checkout_flow(CheckoutOptions::default())));

    let (control, out) = send(&mut kiosk, KioskEvent::Scan("BOGUS".to_string())).await;
    assert_eq!(control, Control::Continue);
    assert_eq!(out, vec!["Item not found. Make sure you are scanning a valid label.".to_string()]);

    let (control, _) = send(&mut kiosk, command(":nonsense")).await;
    assert_eq!(control, Control::Continue);
}

#[tokio::test]
async fn test_quick_kiosk_quantity_checkin() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    fixture.store.set_available(fixture.camera.id, 2);
    let mut kiosk = Kiosk::new(Station::Quick(fixture.scan_station(false)));
    kiosk.set_mode(FlowMode::Checkin).unwrap();

    let payload = equipment_payload(fixture.context.studio_id, fixture.camera.id);
    let (_, out) = send(&mut kiosk, KioskEvent::Scan(payload)).await;
    assert_eq!(out, vec!["Camera: 2 of 5 available. Set :qty <n>, then :confirm.".to_string()]);

    send(&mut kiosk, command(":qty 3")).await;
    let (_, out) = send(&mut kiosk, command(":confirm")).await;
    assert_eq!(out, vec!["Done: checkin 3 x Camera. :next to continue.".to_string()]);
    assert_eq!(fixture.store.equipment(fixture.camera.id).available_quantity, 5);

    send(&mut kiosk, command(":next")).await;
    assert_eq!(kiosk.prompt(), "[checkin | scan]");
}

#[tokio::test]
async fn test_closed_input_ends_session() {
    let fixture = StudioFixture::new(StudioRole::Colleague);
    let mut kiosk = Kiosk::new(Station::Quick(fixture.scan_station(false)));
    let (control, out) = send(&mut kiosk, KioskEvent::Closed).await;
    assert_eq!(control, Control::Quit);
    assert!(out.is_empty());
}
