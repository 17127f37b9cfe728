// Compact text form of a pattern: whitespace separated tokens, each an
// articulation symbol followed by a note value, e.g. "D4 D8 U8 -8 U8 D8 U8".
// Durations with no named value are written as "D:0.1666".

use super::{Articulation, Pattern, Step};
use crate::duration::{classify, NoteValue};
use crate::error::{Result, TrainerError};
use crate::meter::TimeSignature;

fn parse_token(token: &str) -> Result<Step> {
    let bad = || TrainerError::InvalidNotation(format!("'{}'", token));

    let mut chars = token.chars();
    let articulation = chars
        .next()
        .and_then(Articulation::from_symbol)
        .ok_or_else(bad)?;
    let rest = chars.as_str();

    let duration = if let Some(raw) = rest.strip_prefix(':') {
        raw.parse::<f64>().map_err(|_| bad())?
    } else {
        NoteValue::from_symbol(rest).ok_or_else(bad)?.fraction()
    };

    Ok(Step::new(duration, articulation))
}

fn format_step(step: &Step) -> String {
    match classify(step.duration) {
        Some(value) if (value.fraction() - step.duration).abs() < 1e-9 => {
            format!("{}{}", step.articulation.symbol(), value.symbol())
        }
        _ => format!("{}:{}", step.articulation.symbol(), step.duration),
    }
}

impl Pattern {
    /// Parses the text notation and validates the result like [`Pattern::new`].
    pub fn parse(time_signature: TimeSignature, text: &str) -> Result<Self> {
        let steps = text
            .split_whitespace()
            .map(parse_token)
            .collect::<Result<Vec<_>>>()?;
        Pattern::new(time_signature, steps)
    }

    pub fn to_notation(&self) -> String {
        self.steps()
            .iter()
            .map(format_step)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strum arrows, one per step, for quick terminal display.
    pub fn arrows(&self) -> String {
        self.steps().iter().map(|s| s.articulation.arrow()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_island_strum() {
        let p = Pattern::parse(TimeSignature::FourFour, "D4 D8 U8 -8 U8 D8 U8").unwrap();
        assert_eq!(p.len(), 7);
        assert_eq!(p.steps()[0], Step::down(0.25));
        assert_eq!(p.steps()[3], Step::rest(0.125));
        assert_eq!(p.arrows(), "↓↓↑·↑↓↑");
    }

    #[test]
    fn test_parse_dotted_triplet_and_raw() {
        let p = Pattern::parse(TimeSignature::FourFour, "D4. U8 D12 U12 D12 x:0.25").unwrap();
        assert_eq!(p.steps()[0].duration, 0.375);
        assert_eq!(p.steps()[2].note_value(), Some(NoteValue::TripletThird));
        assert_eq!(p.steps()[5].articulation, Articulation::Mute);
    }

    #[test]
    fn test_notation_keeps_irregular_values() {
        let p = Pattern::parse(TimeSignature::FourFour, "D:0.1666 U:0.0834 D2 D4").unwrap();
        assert_eq!(p.to_notation(), "D:0.1666 U:0.0834 D2 D4");
    }

    #[test]
    fn test_bad_tokens() {
        for text in ["Q4", "D3", "D", "D:abc", ""] {
            assert!(
                Pattern::parse(TimeSignature::FourFour, text).is_err(),
                "'{}' should not parse",
                text
            );
        }
    }
}
