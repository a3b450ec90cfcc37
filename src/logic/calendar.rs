use crate::error::{Result, SprinklerError};
use crate::models::TemperatureBasis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub month: u32,
    pub basis: TemperatureBasis,
    pub multiplier: f64,
}

impl CalendarEntry {
    pub fn new(month: u32, basis: TemperatureBasis, multiplier: f64) -> Self {
        Self {
            month,
            basis,
            multiplier,
        }
    }
}

/// Month → (temperature basis, seasonal multiplier).
///
/// Always holds exactly twelve entries with positive multipliers; that is
/// checked once in [`SeasonalCalendar::new`] so lookups only fail on a bad month.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalCalendar {
    entries: [CalendarEntry; 12],
}

impl SeasonalCalendar {
    pub fn new(entries: &[CalendarEntry]) -> Result<Self> {
        if entries.len() != 12 {
            return Err(SprinklerError::Config(format!(
                "calendar needs 12 months, got {}",
                entries.len()
            )));
        }

        let mut slots: [Option<CalendarEntry>; 12] = [None; 12];
        for entry in entries {
            if !(1..=12).contains(&entry.month) {
                return Err(SprinklerError::Config(format!(
                    "calendar month {} is outside 1-12",
                    entry.month
                )));
            }
            if !entry.multiplier.is_finite() || entry.multiplier <= 0.0 {
                return Err(SprinklerError::Config(format!(
                    "calendar multiplier for month {} must be positive, got {}",
                    entry.month, entry.multiplier
                )));
            }
            let slot = &mut slots[(entry.month - 1) as usize];
            if slot.is_some() {
                return Err(SprinklerError::Config(format!(
                    "calendar month {} is listed twice",
                    entry.month
                )));
            }
            *slot = Some(*entry);
        }

        // Twelve entries, no duplicates, all in range: every slot is filled
        let mut table = Self::default().entries;
        for (i, slot) in slots.into_iter().enumerate() {
            if let Some(entry) = slot {
                table[i] = entry;
            }
        }

        Ok(Self { entries: table })
    }

    fn entry(&self, month: u32) -> Result<&CalendarEntry> {
        if !(1..=12).contains(&month) {
            return Err(SprinklerError::Config(format!(
                "month {} is outside 1-12",
                month
            )));
        }
        Ok(&self.entries[(month - 1) as usize])
    }

    pub fn basis_for(&self, month: u32) -> Result<TemperatureBasis> {
        self.entry(month).map(|e| e.basis)
    }

    pub fn multiplier_for(&self, month: u32) -> Result<f64> {
        self.entry(month).map(|e| e.multiplier)
    }

    pub fn entries(&self) -> &[CalendarEntry] {
        &self.entries
    }
}

impl Default for SeasonalCalendar {
    /// Cool months key off the overnight low, summer off the daytime high
    fn default() -> Self {
        use TemperatureBasis::{Average, High, Low};

        let basis = [
            Low, Low, Average, Average, Average, High, High, High, Average, Average, Average, Low,
        ];
        let mut entries = [CalendarEntry::new(1, Low, 1.0); 12];
        for (i, b) in basis.into_iter().enumerate() {
            entries[i] = CalendarEntry::new(i as u32 + 1, b, 1.0);
        }
        Self { entries }
    }
}
