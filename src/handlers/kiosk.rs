//! Kiosk handler
//!
//! Reads scanned codes from stdin (keyboard-wedge scanners type a code and
//! press enter) through the `CodeScanner`, and drives either the cart flow
//! or the quick-scan station. Lines starting with `:` are commands.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, info, warn};

use crate::services::quick_scan::StationTarget;
use crate::services::scanner::{CameraDevice, CodeScanner, Facing, Frame, LineCamera, ScanCallback};
use crate::services::{CheckoutFlow, ScanStation, ServiceFactory, StudioContext};
use crate::state::{FlowMode, FlowStep};
use crate::utils::errors::{ErrorKind, GearError, Result, ScannerResult};
use crate::utils::helpers::content_type_for_path;

const HELP: &str = "Commands: :mode :photo <path> :retake :confirm :cancel :cart :remove <code> :more :commit :qty <n> :next :help :quit";

/// Input delivered to the kiosk loop, in the order it was typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskEvent {
    Scan(String),
    Command(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    /// Toggle checkout/checkin
    Mode,
    Photo(PathBuf),
    Retake,
    Confirm,
    Cancel,
    Cart,
    Remove(String),
    More,
    Commit,
    Quantity(i32),
    Next,
    Help,
    Quit,
}

impl KioskCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim().trim_start_matches(':');
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "mode" => KioskCommand::Mode,
            "photo" if !arg.is_empty() => KioskCommand::Photo(PathBuf::from(arg)),
            "photo" => return Err(GearError::InvalidInput("Usage: :photo <path>".to_string())),
            "retake" => KioskCommand::Retake,
            "confirm" | "ok" => KioskCommand::Confirm,
            "cancel" => KioskCommand::Cancel,
            "cart" => KioskCommand::Cart,
            "remove" if !arg.is_empty() => KioskCommand::Remove(arg.to_string()),
            "remove" => return Err(GearError::InvalidInput("Usage: :remove <code>".to_string())),
            "more" => KioskCommand::More,
            "commit" => KioskCommand::Commit,
            "qty" => {
                let quantity = arg
                    .parse::<i32>()
                    .map_err(|_| GearError::InvalidInput("Usage: :qty <number>".to_string()))?;
                KioskCommand::Quantity(quantity)
            }
            "next" => KioskCommand::Next,
            "help" | "?" => KioskCommand::Help,
            "quit" | "exit" | "q" => KioskCommand::Quit,
            other => return Err(GearError::InvalidInput(format!("Unknown command :{}. {}", other, HELP))),
        };
        Ok(command)
    }
}

/// Camera wrapper that diverts `:` lines to the kiosk as commands.
///
/// Commands and scans leave through the same channel from the same task,
/// so they keep their input order. Commands are not debounced.
pub struct CommandFilter<D> {
    inner: D,
    events: UnboundedSender<KioskEvent>,
}

impl<D> CommandFilter<D> {
    pub fn new(inner: D, events: UnboundedSender<KioskEvent>) -> Self {
        Self { inner, events }
    }
}

#[async_trait]
impl<D: CameraDevice> CameraDevice for CommandFilter<D> {
    async fn start(&mut self, facing: Facing, fps: u32) -> ScannerResult<()> {
        self.inner.start(facing, fps).await
    }

    async fn next_frame(&mut self) -> ScannerResult<Frame> {
        match self.inner.next_frame().await? {
            Frame::Decoded(text) if text.starts_with(':') => {
                let _ = self.events.send(KioskEvent::Command(text));
                Ok(Frame::Miss)
            }
            Frame::Closed => {
                let _ = self.events.send(KioskEvent::Closed);
                Ok(Frame::Closed)
            }
            other => Ok(other),
        }
    }

    async fn stop(&mut self) -> ScannerResult<()> {
        self.inner.stop().await
    }

    fn is_scanning(&self) -> bool {
        self.inner.is_scanning()
    }
}

pub enum Station {
    Cart(CheckoutFlow),
    Quick(ScanStation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Event interpreter; every call returns the lines to show
pub struct Kiosk {
    station: Station,
}

impl Kiosk {
    pub fn new(station: Station) -> Self {
        Self { station }
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn mode(&self) -> FlowMode {
        match &self.station {
            Station::Cart(flow) => flow.mode(),
            Station::Quick(station) => station.mode(),
        }
    }

    pub fn set_mode(&mut self, mode: FlowMode) -> Result<()> {
        match &mut self.station {
            Station::Cart(flow) => flow.set_mode(mode),
            Station::Quick(station) => {
                station.set_mode(mode);
                Ok(())
            }
        }
    }

    /// Status line shown after every event
    pub fn prompt(&self) -> String {
        match &self.station {
            Station::Cart(flow) => format!("[{} | {} | cart: {}]", flow.mode(), flow.step(), flow.cart().len()),
            Station::Quick(station) => format!("[{} | {}]", station.mode(), station.step()),
        }
    }

    pub async fn handle(&mut self, event: KioskEvent, out: &mut Vec<String>) -> Control {
        let result = match event {
            KioskEvent::Closed => return Control::Quit,
            KioskEvent::Scan(code) => self.handle_scan(&code, out).await,
            KioskEvent::Command(line) => match KioskCommand::parse(&line) {
                Ok(KioskCommand::Quit) => return Control::Quit,
                Ok(KioskCommand::Help) => {
                    out.push(HELP.to_string());
                    Ok(())
                }
                Ok(command) => self.handle_command(command, out).await,
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(()) => Control::Continue,
            Err(e) => {
                out.push(e.user_message());
                if e.kind() == ErrorKind::Permission {
                    out.push("Leaving the kiosk.".to_string());
                    Control::Quit
                } else {
                    Control::Continue
                }
            }
        }
    }

    async fn handle_scan(&mut self, code: &str, out: &mut Vec<String>) -> Result<()> {
        match &mut self.station {
            Station::Cart(flow) => {
                if flow.step() != FlowStep::Scan {
                    out.push("Finish the current item first (:confirm or :cancel).".to_string());
                    return Ok(());
                }
                flow.handle_scan(code).await?;
                if let Some(item) = flow.current() {
                    out.push(format!(
                        "{} [{}] - {}. Add a photo with :photo <path>, then :confirm.",
                        item.equipment.name, item.unit.code, item.unit.status
                    ));
                }
                Ok(())
            }
            Station::Quick(station) => {
                if !station.handle_scan(code).await? {
                    out.push("Busy - press :next to scan again.".to_string());
                    return Ok(());
                }
                match station.target() {
                    Some(StationTarget::Unit(item)) => out.push(format!(
                        "{} [{}]. :confirm to {}.",
                        item.equipment.name,
                        item.unit.code,
                        station.mode()
                    )),
                    Some(StationTarget::Equipment(equipment)) => out.push(format!(
                        "{}: {} of {} available. Set :qty <n>, then :confirm.",
                        equipment.name, equipment.available_quantity, equipment.total_quantity
                    )),
                    None => {}
                }
                Ok(())
            }
        }
    }

    async fn handle_command(&mut self, command: KioskCommand, out: &mut Vec<String>) -> Result<()> {
        match &mut self.station {
            Station::Cart(flow) => handle_cart_command(flow, command, out).await,
            Station::Quick(station) => handle_quick_command(station, command, out).await,
        }
    }
}

async fn handle_cart_command(flow: &mut CheckoutFlow, command: KioskCommand, out: &mut Vec<String>) -> Result<()> {
    match command {
        KioskCommand::Mode => {
            flow.set_mode(flow.mode().toggled())?;
            out.push(format!("Mode: {}", flow.mode()));
        }
        KioskCommand::Photo(path) => {
            if flow.step() == FlowStep::ConfirmItem {
                flow.begin_photo()?;
            }
            let bytes = tokio::fs::read(&path).await?;
            flow.capture_photo(bytes, content_type_for_path(&path))?;
            out.push("Photo captured. :confirm to add, :retake to discard.".to_string());
        }
        KioskCommand::Retake => {
            flow.retake_photo()?;
            out.push("Photo discarded.".to_string());
        }
        KioskCommand::Confirm => {
            if flow.step() == FlowStep::ConfirmItem {
                flow.begin_photo()?;
            }
            flow.confirm_photo()?;
            out.push(format!("Added to cart ({} items).", flow.cart().len()));
        }
        KioskCommand::Cancel => {
            flow.cancel_item()?;
            out.push("Item dropped.".to_string());
        }
        KioskCommand::Cart => {
            flow.proceed_to_cart()?;
            for item in flow.cart() {
                out.push(format!(
                    "  {} [{}]{}",
                    item.equipment.name,
                    item.unit.code,
                    if item.photo.is_some() { " (photo)" } else { "" }
                ));
            }
            out.push(":commit to finish, :remove <code> or :more to keep scanning.".to_string());
        }
        KioskCommand::Remove(code) => {
            if flow.remove_code(&code)? {
                out.push(format!("Removed {}.", code));
            } else {
                out.push(format!("{} is not in the cart.", code));
            }
        }
        KioskCommand::More => flow.add_more()?,
        KioskCommand::Commit => {
            let report = flow.confirm_transaction().await?;
            out.push(format!(
                "Done: {} {} transaction(s) recorded.",
                report.transactions.len(),
                report.mode
            ));
            flow.start_over()?;
        }
        KioskCommand::Quantity(_) | KioskCommand::Next => {
            out.push("Not available in cart mode.".to_string());
        }
        KioskCommand::Help | KioskCommand::Quit => {}
    }
    Ok(())
}

async fn handle_quick_command(station: &mut ScanStation, command: KioskCommand, out: &mut Vec<String>) -> Result<()> {
    match command {
        KioskCommand::Mode => {
            station.set_mode(station.mode().toggled());
            out.push(format!("Mode: {}", station.mode()));
        }
        KioskCommand::Quantity(quantity) => {
            station.set_quantity(quantity)?;
            out.push(format!("Quantity: {}", quantity));
        }
        KioskCommand::Confirm | KioskCommand::Commit => {
            let transaction = station.confirm().await?;
            let name = station
                .target()
                .map(|t| t.equipment().name.clone())
                .unwrap_or_default();
            out.push(format!("Done: {} {} x {}. :next to continue.", transaction.kind, transaction.quantity, name));
        }
        KioskCommand::Next | KioskCommand::Cancel => station.next_scan()?,
        KioskCommand::Photo(_)
        | KioskCommand::Retake
        | KioskCommand::Cart
        | KioskCommand::Remove(_)
        | KioskCommand::More => {
            out.push("Not available at the quick-scan station.".to_string());
        }
        KioskCommand::Help | KioskCommand::Quit => {}
    }
    Ok(())
}

/// Handle `kiosk` - run until stdin closes or `:quit`
pub async fn run_kiosk(services: &ServiceFactory, context: StudioContext, quick: bool, checkin: bool) -> Result<()> {
    let station = if quick {
        Station::Quick(services.scan_station(context))
    } else {
        Station::Cart(services.checkout_flow(context))
    };
    let mut kiosk = Kiosk::new(station);
    if checkin {
        kiosk.set_mode(FlowMode::Checkin)?;
    }

    let (events_tx, mut events_rx) = unbounded_channel();
    let scan_tx = events_tx.clone();
    let callback: ScanCallback = Arc::new(move |code| {
        let _ = scan_tx.send(KioskEvent::Scan(code));
    });

    let camera = CommandFilter::new(LineCamera::new(BufReader::new(tokio::io::stdin())), events_tx);
    let mut scanner = CodeScanner::new(Box::new(camera), services.settings.scanner.clone(), callback);
    if let Err(e) = scanner.start().await {
        println!("Camera unavailable: {}", e);
        return Err(e);
    }

    info!(studio_id = %context.studio_id, quick, "Kiosk started");
    println!("Scan a label or type :help. {}", kiosk.prompt());

    while let Some(event) = events_rx.recv().await {
        debug!(event = ?event, "Kiosk event");
        let mut out = Vec::new();
        let control = kiosk.handle(event, &mut out).await;
        for line in &out {
            println!("{}", line);
        }
        if control == Control::Quit {
            break;
        }
        println!("{}", kiosk.prompt());
    }

    // Give a closing camera a moment to hand over its last frames
    tokio::time::sleep(Duration::from_millis(10)).await;
    if let Err(e) = scanner.stop().await {
        warn!(error = %e, "Scanner did not stop cleanly");
    }
    info!("Kiosk stopped");
    Ok(())
}
