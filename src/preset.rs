//! Named colors and the brightness cycle.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::frame::Rgb;

/// A named color tuned for the lamp at a given time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Day,
    WarmDay,
    Afternoon,
    Night,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Day, Preset::WarmDay, Preset::Afternoon, Preset::Night];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Day => "day",
            Preset::WarmDay => "warm-day",
            Preset::Afternoon => "afternoon",
            Preset::Night => "night",
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            Preset::Day => Rgb::new(255, 80, 20),
            Preset::WarmDay => Rgb::new(255, 70, 20),
            Preset::Afternoon => Rgb::new(255, 50, 20),
            Preset::Night => Rgb::new(255, 0, 0),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Case-insensitive; `_` and `-` are interchangeable.
impl FromStr for Preset {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| ParseError::UnknownPreset(s.trim().to_string()))
    }
}

/// Brightness steps the lamp button walks through.
pub const LEVEL_STEPS: [u8; 6] = [255, 200, 150, 100, 50, 20];

/// Endless round-robin over [`LEVEL_STEPS`].
#[derive(Debug, Default, Clone)]
pub struct LevelCycle {
    counter: usize,
}

impl LevelCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// `rounds` full passes over [`LEVEL_STEPS`].
    pub fn rounds(rounds: usize) -> impl Iterator<Item = u8> {
        Self::new().take(LEVEL_STEPS.len().saturating_mul(rounds))
    }
}

impl Iterator for LevelCycle {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let level = LEVEL_STEPS[self.counter % LEVEL_STEPS.len()];
        self.counter = self.counter.wrapping_add(1);
        Some(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_colors() {
        assert_eq!(Preset::Day.color(), Rgb::new(255, 80, 20));
        assert_eq!(Preset::WarmDay.color(), Rgb::new(255, 70, 20));
        assert_eq!(Preset::Afternoon.color(), Rgb::new(255, 50, 20));
        assert_eq!(Preset::Night.color(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn preset_lookup_by_name() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("NIGHT".parse::<Preset>().unwrap(), Preset::Night);
        assert_eq!("warm_day".parse::<Preset>().unwrap(), Preset::WarmDay);
        assert_eq!(" Afternoon ".parse::<Preset>().unwrap(), Preset::Afternoon);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(
            "dusk".parse::<Preset>().unwrap_err(),
            ParseError::UnknownPreset(String::from("dusk"))
        );
    }

    #[test]
    fn level_cycle_wraps() {
        let levels: Vec<u8> = LevelCycle::new().take(8).collect();
        assert_eq!(levels, vec![255, 200, 150, 100, 50, 20, 255, 200]);
    }

    #[test]
    fn rounds_cover_whole_passes() {
        assert_eq!(LevelCycle::rounds(2).count(), 2 * LEVEL_STEPS.len());
        assert_eq!(LevelCycle::rounds(0).count(), 0);
    }

    #[test]
    fn huge_round_count_does_not_overflow() {
        let levels: Vec<u8> = LevelCycle::rounds(usize::MAX).take(7).collect();
        assert_eq!(levels, vec![255, 200, 150, 100, 50, 20, 255]);
    }
}
