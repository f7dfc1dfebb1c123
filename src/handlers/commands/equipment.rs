//! Equipment and label command handlers

use std::io::Write;
use std::path::PathBuf;

use uuid::Uuid;

use super::active_context;
use crate::models::{CodeType, UpdateEquipmentRequest};
use crate::services::export::{BulkExporter, LabelSelection};
use crate::services::inventory::NewEquipment;
use crate::services::ServiceFactory;
use crate::state::CapturedPhoto;
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::{content_type_for_path, format_relative_time, truncate_text};
use crate::utils::logging::log_export;

pub struct AddEquipmentArgs {
    pub name: String,
    pub category: String,
    pub sku: Option<String>,
    pub quantity: i32,
    pub notes: Option<String>,
    pub code_type: String,
    pub photo: PathBuf,
}

pub struct LabelArgs {
    pub search: Option<String>,
    pub exclude: Vec<String>,
    pub style: Option<String>,
    pub size: Option<String>,
    pub output: Option<PathBuf>,
}

fn parse_code_type(value: &str) -> Result<CodeType> {
    match value.trim().to_lowercase().as_str() {
        "qr" => Ok(CodeType::Qr),
        "barcode" => Ok(CodeType::Barcode),
        other => Err(GearError::InvalidInput(format!("Unknown code type: {}", other))),
    }
}

/// Handle `equipment`
pub async fn handle_list(services: &ServiceFactory, search: Option<&str>) -> Result<()> {
    let context = active_context(services).await?;
    let items = services.inventory_service.list_equipment(&context, search).await?;

    if items.is_empty() {
        println!("No equipment found.");
        return Ok(());
    }
    for item in &items {
        println!(
            "  {}  {:<30} {:<12} {}/{} available",
            item.id,
            truncate_text(&item.name, 30),
            truncate_text(&item.category, 12),
            item.available_quantity,
            item.total_quantity
        );
    }
    Ok(())
}

/// Handle `show-equipment`
pub async fn handle_show(services: &ServiceFactory, equipment_id: Uuid) -> Result<()> {
    let context = active_context(services).await?;
    let detail = services
        .inventory_service
        .equipment_detail(&context, equipment_id)
        .await?;
    let equipment = &detail.equipment;

    println!("{} ({})", equipment.name, equipment.category);
    if let Some(sku) = &equipment.sku {
        println!("SKU:       {}", sku);
    }
    println!(
        "Available: {} of {} ({} checked out)",
        equipment.available_quantity,
        equipment.total_quantity,
        equipment.checked_out_quantity()
    );
    if let Some(notes) = &equipment.notes {
        println!("Notes:     {}", notes);
    }

    println!("\nUnits:");
    for unit in &detail.units {
        println!("  {:<16} {}", unit.code, unit.status);
    }

    println!("\nRecent transactions:");
    if detail.transactions.is_empty() {
        println!("  (none)");
    }
    for tx in &detail.transactions {
        println!("  {:<8} {:>3}  {}", tx.kind.as_str(), tx.quantity, format_relative_time(tx.created_at));
    }
    Ok(())
}

/// Handle `add-equipment`
pub async fn handle_add(services: &ServiceFactory, args: AddEquipmentArgs) -> Result<()> {
    let context = active_context(services).await?;
    let code_type = parse_code_type(&args.code_type)?;
    let bytes = tokio::fs::read(&args.photo).await?;

    let created = services
        .inventory_service
        .add_equipment(
            &context,
            NewEquipment {
                name: args.name,
                category: args.category,
                sku: args.sku,
                quantity: args.quantity,
                notes: args.notes,
                code_type,
                photo: Some(CapturedPhoto {
                    bytes,
                    content_type: content_type_for_path(&args.photo).to_string(),
                }),
            },
        )
        .await?;

    println!("Added {} ({}) with {} units:", created.equipment.name, created.equipment.id, created.units.len());
    for unit in &created.units {
        println!("  {}", unit.code);
    }
    Ok(())
}

/// Handle `edit-equipment`
pub async fn handle_edit(
    services: &ServiceFactory,
    equipment_id: Uuid,
    name: Option<String>,
    category: Option<String>,
    sku: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let context = active_context(services).await?;
    let update = UpdateEquipmentRequest {
        name,
        category,
        sku,
        notes,
        updated_at: None,
    };
    let equipment = services
        .inventory_service
        .update_equipment(&context, equipment_id, update)
        .await?;
    println!("Updated {}.", equipment.name);
    Ok(())
}

pub async fn handle_delete(services: &ServiceFactory, equipment_id: Uuid) -> Result<()> {
    let context = active_context(services).await?;
    services
        .inventory_service
        .delete_equipment(&context, equipment_id)
        .await?;
    println!("Equipment deleted.");
    Ok(())
}

/// Handle `labels` - render the selected unit labels into a ZIP archive
pub async fn handle_labels(services: &ServiceFactory, args: LabelArgs) -> Result<()> {
    let context = active_context(services).await?;
    let units = services.inventory_service.list_units(&context).await?;

    let mut selection = LabelSelection::from_units(units);
    if let Some(search) = &args.search {
        selection.filter(search);
    }

    // On the command line the search is the picker: groups it hides are left out
    let visible: Vec<Uuid> = selection.visible_groups().map(|group| group.equipment_id).collect();
    let exclude = &args.exclude;
    let excluded: Vec<Uuid> = selection
        .groups()
        .iter()
        .flat_map(|group| {
            let hidden = !visible.contains(&group.equipment_id);
            group.units.iter().filter(move |unit| {
                hidden || exclude.iter().any(|code| code.eq_ignore_ascii_case(&unit.code))
            })
        })
        .map(|unit| unit.id)
        .collect();
    for unit_id in excluded {
        if selection.is_selected(unit_id) {
            selection.toggle_unit(unit_id);
        }
    }

    let exporter = BulkExporter::new(services.label_rasterizer(args.style.as_deref(), args.size.as_deref())?);

    let specs = selection.selected();
    let archive = exporter.export(&specs, |percent| {
        print!("\rRendering labels... {:>3}%", percent);
        let _ = std::io::stdout().flush();
    });
    println!();
    let archive = archive?;

    let dir = args.output.unwrap_or_else(|| PathBuf::from(&services.settings.labels.output_dir));
    let path = archive.write_to(&dir).await?;
    log_export(context.studio_id, archive.entries.len(), path.to_str());
    println!("Saved {} labels to {}", archive.entries.len(), path.display());
    Ok(())
}
