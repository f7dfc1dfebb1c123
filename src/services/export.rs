//! Bulk label export
//!
//! Units are picked through a `LabelSelection`, rasterised one by one into
//! PNG label cards and packed into a single ZIP archive. The archive is only
//! built once every label has rendered; one failure aborts the export.

use std::collections::{BTreeMap, HashSet};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::{imageops, GrayImage, Luma};
use tracing::{debug, info};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::{EquipmentUnit, UnitWithEquipment};
use crate::services::labels;
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::{epoch_millis, sanitize_file_stem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// QR code of the unit payload
    Qr,
    /// Code 128 of the unit code
    Barcode,
}

impl std::str::FromStr for LabelStyle {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "qr" => Ok(LabelStyle::Qr),
            "barcode" => Ok(LabelStyle::Barcode),
            other => Err(GearError::InvalidInput(format!("Unknown label style: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSize {
    Small,
    Medium,
    Large,
}

impl LabelSize {
    /// Card width in points
    pub fn width(&self) -> u32 {
        match self {
            LabelSize::Small => 140,
            LabelSize::Medium => 180,
            LabelSize::Large => 240,
        }
    }

    /// Edge of the code image in points
    pub fn code_size(&self) -> u32 {
        match self {
            LabelSize::Small => 80,
            LabelSize::Medium => 110,
            LabelSize::Large => 150,
        }
    }

    pub fn padding(&self) -> u32 {
        match self {
            LabelSize::Small => 8,
            LabelSize::Medium => 12,
            LabelSize::Large => 16,
        }
    }
}

impl std::str::FromStr for LabelSize {
    type Err = GearError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "small" | "s" => Ok(LabelSize::Small),
            "medium" | "m" => Ok(LabelSize::Medium),
            "large" | "l" => Ok(LabelSize::Large),
            other => Err(GearError::InvalidInput(format!("Unknown label size: {}", other))),
        }
    }
}

/// Everything needed to draw one unit label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub unit_id: Uuid,
    pub studio_id: Uuid,
    pub code: String,
    pub equipment_name: String,
}

impl LabelSpec {
    pub fn new(unit: &EquipmentUnit, equipment_name: &str) -> Self {
        Self {
            unit_id: unit.id,
            studio_id: unit.studio_id,
            code: unit.code.clone(),
            equipment_name: equipment_name.to_string(),
        }
    }

    /// `<equipment-name-sanitized>_<unit-code>.png`
    pub fn file_name(&self) -> String {
        format!("{}_{}.png", sanitize_file_stem(&self.equipment_name), self.code)
    }
}

/// Units of one equipment template
#[derive(Debug, Clone)]
pub struct LabelGroup {
    pub equipment_id: Uuid,
    pub equipment_name: String,
    pub units: Vec<EquipmentUnit>,
}

/// Which units to export. Everything starts selected.
#[derive(Debug, Clone)]
pub struct LabelSelection {
    groups: Vec<LabelGroup>,
    selected: HashSet<Uuid>,
    search: String,
}

impl LabelSelection {
    /// Group units by template (ordered by template name)
    pub fn from_units(rows: Vec<UnitWithEquipment>) -> Self {
        let mut grouped: BTreeMap<(String, Uuid), Vec<EquipmentUnit>> = BTreeMap::new();
        for row in rows {
            grouped
                .entry((row.equipment.name.clone(), row.equipment.id))
                .or_default()
                .push(row.unit);
        }

        let groups: Vec<LabelGroup> = grouped
            .into_iter()
            .map(|((equipment_name, equipment_id), units)| LabelGroup {
                equipment_id,
                equipment_name,
                units,
            })
            .collect();
        let selected = groups
            .iter()
            .flat_map(|g| g.units.iter().map(|u| u.id))
            .collect();

        Self {
            groups,
            selected,
            search: String::new(),
        }
    }

    pub fn groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    /// Groups whose name matches the current search
    pub fn visible_groups(&self) -> impl Iterator<Item = &LabelGroup> {
        let needle = self.search.to_lowercase();
        self.groups
            .iter()
            .filter(move |g| needle.is_empty() || g.equipment_name.to_lowercase().contains(&needle))
    }

    pub fn filter(&mut self, search: &str) {
        self.search = search.trim().to_string();
    }

    pub fn is_selected(&self, unit_id: Uuid) -> bool {
        self.selected.contains(&unit_id)
    }

    pub fn toggle_unit(&mut self, unit_id: Uuid) {
        if !self.selected.remove(&unit_id) {
            self.selected.insert(unit_id);
        }
    }

    /// Deselect the group if fully selected, otherwise select all of it
    pub fn toggle_group(&mut self, equipment_id: Uuid) {
        let Some(group) = self.groups.iter().find(|g| g.equipment_id == equipment_id) else {
            return;
        };
        let ids: Vec<Uuid> = group.units.iter().map(|u| u.id).collect();
        if ids.iter().all(|id| self.selected.contains(id)) {
            for id in &ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(ids);
        }
    }

    /// Clear the selection if everything is selected, otherwise select all
    pub fn toggle_all(&mut self) {
        let total: usize = self.groups.iter().map(|g| g.units.len()).sum();
        if self.selected.len() == total {
            self.selected.clear();
        } else {
            self.selected = self
                .groups
                .iter()
                .flat_map(|g| g.units.iter().map(|u| u.id))
                .collect();
        }
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Every selected unit in display order; the search only narrows the picker
    pub fn selected(&self) -> Vec<LabelSpec> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.units
                    .iter()
                    .filter(|u| self.selected.contains(&u.id))
                    .map(move |u| LabelSpec::new(u, &g.equipment_name))
            })
            .collect()
    }
}

/// Turns a label into PNG bytes
pub trait LabelRasterizer: Send + Sync {
    fn rasterize(&self, label: &LabelSpec) -> Result<Vec<u8>>;
}

/// Draws the code centred on a white card sized after `LabelSize`
#[derive(Debug, Clone)]
pub struct PngLabelRasterizer {
    pub style: LabelStyle,
    pub size: LabelSize,
    pub scale: u32,
}

impl PngLabelRasterizer {
    pub fn new(style: LabelStyle, size: LabelSize, scale: u32) -> Self {
        Self {
            style,
            size,
            scale: scale.max(1),
        }
    }

    fn code_image(&self, label: &LabelSpec, inner_width: u32) -> Result<GrayImage> {
        let code_edge = self.size.code_size() * self.scale;
        match self.style {
            LabelStyle::Qr => {
                let payload = labels::unit_payload(label.studio_id, label.unit_id);
                let qr = labels::qr_image(&payload, code_edge)?;
                Ok(imageops::resize(&qr, code_edge, code_edge, imageops::FilterType::Nearest))
            }
            LabelStyle::Barcode => {
                let bars = labels::barcode_image(&label.code, labels::BARCODE_MODULE_WIDTH, labels::BARCODE_HEIGHT)?;
                let height = code_edge / 2;
                Ok(imageops::resize(&bars, inner_width, height, imageops::FilterType::Nearest))
            }
        }
    }
}

impl LabelRasterizer for PngLabelRasterizer {
    fn rasterize(&self, label: &LabelSpec) -> Result<Vec<u8>> {
        let width = self.size.width() * self.scale;
        let padding = self.size.padding() * self.scale;
        let inner_width = width.saturating_sub(padding * 2).max(1);

        let code = self.code_image(label, inner_width)?;
        let height = code.height() + padding * 2;

        let mut card = GrayImage::from_pixel(width, height, Luma([255]));
        let x = (width.saturating_sub(code.width())) / 2;
        imageops::overlay(&mut card, &code, x as i64, padding as i64);

        labels::encode_png(&card)
    }
}

/// A finished export
#[derive(Debug, Clone)]
pub struct LabelArchive {
    /// `studio_labels_<epoch-millis>.zip`
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
}

impl LabelArchive {
    /// Write the archive into `dir`, returning the full path
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), entries = self.entries.len(), "Label archive written");
        Ok(path)
    }
}

/// Renders labels and packs them into a ZIP
pub struct BulkExporter<R: LabelRasterizer> {
    rasterizer: R,
}

impl<R: LabelRasterizer> BulkExporter<R> {
    pub fn new(rasterizer: R) -> Self {
        Self { rasterizer }
    }

    /// Render every label, reporting percent complete after each one
    pub fn export<F>(&self, labels: &[LabelSpec], mut progress: F) -> Result<LabelArchive>
    where
        F: FnMut(u8),
    {
        if labels.is_empty() {
            return Err(GearError::InvalidInput("No labels selected to save.".to_string()));
        }

        let total = labels.len();
        let mut rendered = Vec::with_capacity(total);
        for (i, label) in labels.iter().enumerate() {
            let png = self.rasterizer.rasterize(label)?;
            rendered.push((label.file_name(), png));

            let percent = (((i + 1) as f64 / total as f64) * 100.0).round() as u8;
            progress(percent);
            debug!(code = %label.code, percent = percent, "Label rendered");
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        let mut entries = Vec::with_capacity(total);
        for (name, png) in rendered {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&png)?;
            entries.push(name);
        }
        let bytes = zip.finish()?.into_inner();

        Ok(LabelArchive {
            file_name: format!("studio_labels_{}.zip", epoch_millis()),
            bytes,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{CodeType, UnitStatus};

    fn unit(equipment_id: Uuid, code: &str) -> EquipmentUnit {
        EquipmentUnit {
            id: Uuid::new_v4(),
            equipment_id,
            studio_id: Uuid::nil(),
            code: code.to_string(),
            code_type: CodeType::Qr,
            status: UnitStatus::Available,
            photo_url: None,
            created_at: Utc::now(),
        }
    }

    fn selection() -> (LabelSelection, Uuid, Uuid) {
        let camera = Uuid::new_v4();
        let tripod = Uuid::new_v4();
        let mut groups = vec![
            LabelGroup { equipment_id: tripod, equipment_name: "Tripod".into(), units: vec![unit(tripod, "TRI-001-AAAA")] },
            LabelGroup {
                equipment_id: camera,
                equipment_name: "Camera".into(),
                units: vec![unit(camera, "CAM-001-AAAA"), unit(camera, "CAM-002-BBBB")],
            },
        ];
        groups.sort_by(|a, b| a.equipment_name.cmp(&b.equipment_name));
        let selected = groups.iter().flat_map(|g| g.units.iter().map(|u| u.id)).collect();
        (LabelSelection { groups, selected, search: String::new() }, camera, tripod)
    }

    #[test]
    fn test_size_table() {
        assert_eq!((LabelSize::Small.width(), LabelSize::Small.code_size(), LabelSize::Small.padding()), (140, 80, 8));
        assert_eq!((LabelSize::Medium.width(), LabelSize::Medium.code_size(), LabelSize::Medium.padding()), (180, 110, 12));
        assert_eq!((LabelSize::Large.width(), LabelSize::Large.code_size(), LabelSize::Large.padding()), (240, 150, 16));
    }

    #[test]
    fn test_toggles() {
        let (mut selection, camera, _) = selection();
        assert_eq!(selection.selected_count(), 3);

        selection.toggle_group(camera);
        assert_eq!(selection.selected_count(), 1);
        selection.toggle_group(camera);
        assert_eq!(selection.selected_count(), 3);

        selection.toggle_all();
        assert_eq!(selection.selected_count(), 0);
        selection.toggle_all();
        assert_eq!(selection.selected_count(), 3);

        let first = selection.groups()[0].units[0].id;
        selection.toggle_unit(first);
        assert!(!selection.is_selected(first));
        selection.toggle_group(camera);
        assert_eq!(selection.selected_count(), 3);
    }

    #[test]
    fn test_filter_hides_groups_but_keeps_selection() {
        let (mut selection, _, _) = selection();
        selection.filter("tri");
        assert_eq!(selection.visible_groups().count(), 1);

        let labels = selection.selected();
        assert_eq!(labels.len(), 3);
        assert!(labels.iter().any(|l| l.file_name() == "tripod_TRI-001-AAAA.png"));
    }

    #[test]
    fn test_rasterized_card_width() {
        let label = LabelSpec {
            unit_id: Uuid::new_v4(),
            studio_id: Uuid::new_v4(),
            code: "CAM-001-AB12".into(),
            equipment_name: "Camera".into(),
        };
        for style in [LabelStyle::Qr, LabelStyle::Barcode] {
            let png = PngLabelRasterizer::new(style, LabelSize::Small, 2).rasterize(&label).unwrap();
            let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png).unwrap();
            assert_eq!(decoded.width(), 280);
        }
    }
}
