//! Dashboard layout: which sections each view shows, and in what order.

use crate::record::ParseTagError;
use crate::store::{load_or_default, save_json, KeyValueStore, StoreError, LAYOUT_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Overview,
    Spreads,
    Markets,
    Data,
}

impl View {
    pub const ALL: [View; 4] = [View::Overview, View::Spreads, View::Markets, View::Data];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Spreads => "spreads",
            View::Markets => "markets",
            View::Data => "data",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == normalized)
            .ok_or_else(|| ParseTagError {
                kind: "view",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: String,
    pub component: String,
    pub enabled: bool,
    pub order: usize,
}

impl SectionConfig {
    fn new(id: &str, component: &str, order: usize) -> Self {
        SectionConfig {
            id: id.to_string(),
            component: component.to_string(),
            enabled: true,
            order,
        }
    }
}

/// Sections of every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub overview: Vec<SectionConfig>,
    pub spreads: Vec<SectionConfig>,
    pub markets: Vec<SectionConfig>,
    pub data: Vec<SectionConfig>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            overview: vec![
                SectionConfig::new("heatmap-correlation", "HeatMapCorrelationRow", 0),
                SectionConfig::new("main-chart", "MainChartCommentary", 1),
                SectionConfig::new("secondary-charts", "SecondaryCharts", 2),
                SectionConfig::new("data-table", "MarketDataTable", 3),
            ],
            spreads: vec![
                SectionConfig::new("spread-selector", "SpreadSelector", 0),
                SectionConfig::new("main-spread", "MainSpreadAnalysis", 1),
                SectionConfig::new("all-spreads", "AllSpreadsGrid", 2),
            ],
            markets: vec![
                SectionConfig::new("market-heatmap", "MarketHeatMap", 0),
                SectionConfig::new("correlation-matrix", "CorrelationMatrix", 1),
                SectionConfig::new("market-charts", "MarketChartsGrid", 2),
            ],
            data: vec![
                SectionConfig::new("complete-data-table", "CompleteDataTable", 0),
                SectionConfig::new("correlation-matrix-data", "CorrelationMatrix", 1),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A move referenced a position outside the view
    IndexOutOfRange { view: View, index: usize, len: usize },
    /// No section with this id in the view
    SectionNotFound { view: View, id: String },
    Store(StoreError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::IndexOutOfRange { view, index, len } => write!(
                f,
                "Position {} is out of range for view '{}' with {} sections",
                index, view, len
            ),
            LayoutError::SectionNotFound { view, id } => {
                write!(f, "Section '{}' not found in view '{}'", id, view)
            }
            LayoutError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for LayoutError {}

impl From<StoreError> for LayoutError {
    fn from(err: StoreError) -> Self {
        LayoutError::Store(err)
    }
}

impl LayoutConfig {
    pub fn sections(&self, view: View) -> &[SectionConfig] {
        match view {
            View::Overview => &self.overview,
            View::Spreads => &self.spreads,
            View::Markets => &self.markets,
            View::Data => &self.data,
        }
    }

    fn sections_mut(&mut self, view: View) -> &mut Vec<SectionConfig> {
        match view {
            View::Overview => &mut self.overview,
            View::Spreads => &mut self.spreads,
            View::Markets => &mut self.markets,
            View::Data => &mut self.data,
        }
    }

    /// Moves the section at `old_index` to `new_index` and renumbers the
    /// view's `order` fields to match positions.
    pub fn update_section_order(
        &mut self,
        view: View,
        old_index: usize,
        new_index: usize,
    ) -> Result<(), LayoutError> {
        let sections = self.sections_mut(view);
        let len = sections.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(LayoutError::IndexOutOfRange { view, index, len });
            }
        }

        let moved = sections.remove(old_index);
        sections.insert(new_index, moved);
        for (order, section) in sections.iter_mut().enumerate() {
            section.order = order;
        }
        Ok(())
    }

    /// Flips the `enabled` flag of a section.
    pub fn toggle_section(&mut self, view: View, section_id: &str) -> Result<bool, LayoutError> {
        let section = self
            .sections_mut(view)
            .iter_mut()
            .find(|section| section.id == section_id)
            .ok_or_else(|| LayoutError::SectionNotFound {
                view,
                id: section_id.to_string(),
            })?;
        section.enabled = !section.enabled;
        Ok(section.enabled)
    }

    /// Enabled sections of a view, sorted by `order`.
    pub fn active_sections(&self, view: View) -> Vec<SectionConfig> {
        let mut active: Vec<SectionConfig> = self
            .sections(view)
            .iter()
            .filter(|section| section.enabled)
            .cloned()
            .collect();
        active.sort_by_key(|section| section.order);
        active
    }
}

/// Loads the stored layout, or the default layout when none is stored or
/// the stored one is unreadable.
pub fn load_layout<S: KeyValueStore + ?Sized>(store: &S) -> LayoutConfig {
    load_or_default(store, LAYOUT_KEY)
}

pub fn save_layout<S: KeyValueStore + ?Sized>(
    store: &mut S,
    layout: &LayoutConfig,
) -> Result<(), StoreError> {
    save_json(store, LAYOUT_KEY, layout)
}

/// Forgets the stored layout and returns the default.
pub fn reset_layout<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<LayoutConfig, StoreError> {
    store.remove(LAYOUT_KEY)?;
    Ok(LayoutConfig::default())
}
