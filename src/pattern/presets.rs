//! Built-in strum patterns

use super::Pattern;
use crate::error::Result;
use crate::meter::TimeSignature;
use log::warn;

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub time_signature: TimeSignature,
    pub notation: &'static str,
}

impl Preset {
    pub fn pattern(&self) -> Result<Pattern> {
        Pattern::parse(self.time_signature, self.notation)
    }
}

/// Ordered so the first preset of each meter is its default.
pub const PRESETS: &[Preset] = &[
    Preset {
        id: "basic_44",
        name: "Basic 4/4",
        category: "Trainer",
        description: "Two downs, then down-up eighths.",
        time_signature: TimeSignature::FourFour,
        notation: "D4 D4 D8 U8 D8 U8",
    },
    Preset {
        id: "basic_34",
        name: "Basic 3/4",
        category: "Trainer",
        description: "Down, down-up, down.",
        time_signature: TimeSignature::ThreeFour,
        notation: "D4 D8 U8 D4",
    },
    Preset {
        id: "basic_68",
        name: "Basic 6/8",
        category: "Trainer",
        description: "Two groups of three eighths.",
        time_signature: TimeSignature::SixEight,
        notation: "D8 U8 D8 D8 U8 D8",
    },
    Preset {
        id: "funk",
        name: "Funk",
        category: "Trainer",
        description: "A burst of sixteenths between two quarters.",
        time_signature: TimeSignature::FourFour,
        notation: "D4 D8 D16 U16 D16 U16 D16 U16 D4",
    },
    Preset {
        id: "gallop",
        name: "Gallop",
        category: "Trainer",
        description: "Eighth plus two sixteenths, three times over.",
        time_signature: TimeSignature::FourFour,
        notation: "D8 D16 U16 D8 D16 U16 D8 D16 U16 D4",
    },
    Preset {
        id: "44_rock_standard",
        name: "The Driver",
        category: "Rock",
        description: "Constant 8th notes. Driving and energetic.",
        time_signature: TimeSignature::FourFour,
        notation: "D8 U8 D8 U8 D8 U8 D8 U8",
    },
    Preset {
        id: "44_island",
        name: "Island Strum",
        category: "Pop/Folk",
        description: "The essential campfire strum. Syncopated feel.",
        time_signature: TimeSignature::FourFour,
        notation: "D4 D8 U8 -8 U8 D8 U8",
    },
    Preset {
        id: "44_funk_16",
        name: "Funky 16ths",
        category: "Funk",
        description: "Quick 16th note motion (1-e-&-a).",
        time_signature: TimeSignature::FourFour,
        notation: "D8 D16 U16 -8 D16 U16 D16 U16 D16 U16 D4",
    },
    Preset {
        id: "44_triplet_feel",
        name: "Blues Shuffle",
        category: "Blues",
        description: "Triplet feel in 4/4 (swing).",
        time_signature: TimeSignature::FourFour,
        notation: "D:0.1666 U:0.0834 D:0.1666 U:0.0834 D:0.1666 U:0.0834 D:0.1666 U:0.0834",
    },
    Preset {
        id: "44_pop_ballad",
        name: "Pop Ballad",
        category: "Pop",
        description: "Spacious and open. Great for slow songs.",
        time_signature: TimeSignature::FourFour,
        notation: "D4 D4 D4 D8 U8",
    },
    Preset {
        id: "44_syncopated",
        name: "Wonder Strum",
        category: "Pop",
        description: "Features a dotted rhythm opener.",
        time_signature: TimeSignature::FourFour,
        notation: "D4. U8 -8 U8 D4",
    },
    Preset {
        id: "34_waltz_basic",
        name: "Basic Waltz",
        category: "Folk",
        description: "ONE two three, ONE two three.",
        time_signature: TimeSignature::ThreeFour,
        notation: "D4 D4 D4",
    },
    Preset {
        id: "34_waltz_filled",
        name: "Filled Waltz",
        category: "Folk",
        description: "Adding motion to the 2nd and 3rd beats.",
        time_signature: TimeSignature::ThreeFour,
        notation: "D4 D8 U8 D8 U8",
    },
    Preset {
        id: "68_folk_picker",
        name: "Folk Picker",
        category: "Folk",
        description: "Emphasis on the outer beats.",
        time_signature: TimeSignature::SixEight,
        notation: "D4. D8 U8 D8",
    },
    Preset {
        id: "68_slow_blues",
        name: "Slow Blues",
        category: "Blues",
        description: "ONE-and-a TWO-and-a.",
        time_signature: TimeSignature::SixEight,
        notation: "D8 U8 D8 D8 U8 D8",
    },
];

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Default pattern for a meter: its first preset, or a plain pulse for meters
/// the library does not cover.
pub fn default_for(time_signature: TimeSignature) -> Result<Pattern> {
    let preset = PRESETS
        .iter()
        .find(|p| p.time_signature == time_signature);

    match preset.map(|p| (p, p.pattern())) {
        Some((_, Ok(pattern))) => Ok(pattern),
        Some((p, Err(e))) => {
            warn!("Preset '{}' is invalid ({}), using a pulse", p.id, e);
            Pattern::pulse(time_signature)
        }
        None => Pattern::pulse(time_signature),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_is_a_valid_measure() {
        for preset in PRESETS {
            let pattern = preset
                .pattern()
                .unwrap_or_else(|e| panic!("preset {} invalid: {}", preset.id, e));
            assert_eq!(pattern.time_signature(), preset.time_signature);
        }
    }

    #[test]
    fn test_preset_ids_are_unique() {
        let mut ids: Vec<_> = PRESETS.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PRESETS.len());
    }

    #[test]
    fn test_defaults_per_meter() {
        assert_eq!(default_for(TimeSignature::FourFour).unwrap().len(), 6);
        assert_eq!(default_for(TimeSignature::ThreeFour).unwrap().len(), 4);
        assert_eq!(default_for(TimeSignature::SixEight).unwrap().len(), 6);

        let five = TimeSignature::custom(5, 4).unwrap();
        assert_eq!(default_for(five).unwrap(), Pattern::pulse(five).unwrap());
    }

    #[test]
    fn test_spelled_out_common_meter_gets_its_preset() {
        let four = TimeSignature::custom(4, 4).unwrap();
        let basic = find_preset("basic_44").unwrap().pattern().unwrap();
        assert_eq!(default_for(four).unwrap(), basic);

        let six: TimeSignature = "6/8".parse().unwrap();
        let basic = find_preset("basic_68").unwrap().pattern().unwrap();
        assert_eq!(default_for(six).unwrap(), basic);
    }

    #[test]
    fn test_no_preset_opens_on_a_rest() {
        for preset in PRESETS {
            let pattern = preset.pattern().unwrap();
            assert!(!pattern.steps()[0].articulation.is_rest(), "{}", preset.id);
        }
    }
}
