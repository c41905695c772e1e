//! LED index layout
//!
//! Airports take indices `0..N` in configured order, placeholders included.
//! The legend follows at `N + offset`. The whole layout is validated against
//! the strip length before anything is assigned.

use std::fmt;

use super::legend::{LegendSlot, LegendSpec};
use crate::Result;
use crate::error::MetarMapError;
use crate::models::observation::normalize_station_id;

/// Airport list entry that reserves an LED without showing weather
pub const PLACEHOLDER_CODE: &str = "NULL";

/// Physical strip dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strip {
    pub length: usize,
}

/// Configured content of one airport position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCode {
    Airport(String),
    Placeholder,
}

impl SlotCode {
    #[must_use]
    pub fn parse(code: &str) -> Self {
        let code = normalize_station_id(code);
        if code == PLACEHOLDER_CODE {
            SlotCode::Placeholder
        } else {
            SlotCode::Airport(code)
        }
    }
}

/// One position of the ordered airport list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirportSlot {
    pub position: usize,
    pub code: SlotCode,
}

/// Turn the configured airport list into slots
#[must_use]
pub fn airport_slots(codes: &[String]) -> Vec<AirportSlot> {
    codes
        .iter()
        .enumerate()
        .map(|(position, code)| AirportSlot {
            position,
            code: SlotCode::parse(code),
        })
        .collect()
}

/// Stations to request from the feed, placeholders removed
#[must_use]
pub fn station_codes(codes: &[String]) -> Vec<String> {
    airport_slots(codes)
        .into_iter()
        .filter_map(|slot| match slot.code {
            SlotCode::Airport(code) => Some(code),
            SlotCode::Placeholder => None,
        })
        .collect()
}

/// What drives an LED index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSource {
    Airport(String),
    /// Reserved index, no color lookup
    Placeholder,
    Legend(LegendSlot),
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSource::Airport(code) => f.write_str(code),
            SlotSource::Placeholder => f.write_str(PLACEHOLDER_CODE),
            SlotSource::Legend(slot) => write!(f, "{slot}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub index: usize,
    pub source: SlotSource,
}

/// Assign LED indices to airports and legend. Fails without partial output if the strip is too short.
pub fn layout(airport_codes: &[String], legend: &LegendSpec, strip: Strip) -> Result<Vec<LayoutEntry>> {
    let airports = airport_codes.len();
    // an empty legend reserves no gap either
    let legend_start = if legend.size() > 0 {
        airports + legend.offset
    } else {
        airports
    };
    let required = legend_start + legend.size();
    if required > strip.length {
        return Err(MetarMapError::layout(required, strip.length));
    }

    let airport_entries = airport_slots(airport_codes).into_iter().map(|slot| LayoutEntry {
        index: slot.position,
        source: match slot.code {
            SlotCode::Airport(code) => SlotSource::Airport(code),
            SlotCode::Placeholder => SlotSource::Placeholder,
        },
    });
    let legend_entries = legend.slots.iter().enumerate().map(|(i, slot)| LayoutEntry {
        index: legend_start + i,
        source: SlotSource::Legend(*slot),
    });

    Ok(airport_entries.chain(legend_entries).collect())
}
