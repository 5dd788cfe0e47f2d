use thiserror::Error;

/// The quality identifier was not in the chord table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown chord quality: {0:?}")]
pub struct UnknownQuality(pub String);

/// Chord qualities and their interval sequences, in semitones from the root.
/// The sequence order defines the voice index and is not required to ascend;
/// `"7alt"` deliberately keeps its descending run as enumerated.
static CHORD_TABLE: [(&str, &[i8]); 37] = [
    ("maj", &[0, 4, 7]),
    ("min", &[0, 3, 7]),
    ("dom7", &[0, 4, 7, 10]),
    ("maj7", &[0, 4, 7, 11]),
    ("min7", &[0, 3, 7, 10]),
    ("m7b5", &[0, 3, 6, 10]),
    ("dim", &[0, 3, 6]),
    ("sus2", &[0, 2, 7]),
    ("sus4", &[0, 5, 7]),
    ("power", &[0, 7]),
    ("add9", &[0, 4, 7, 14]),
    ("maj6", &[0, 4, 7, 9]),
    ("maj69", &[0, 4, 7, 9, 14]),
    ("maj9", &[0, 4, 7, 11, 14]),
    ("maj7#11", &[0, 4, 7, 11, 18]),
    ("maj7#5", &[0, 4, 8, 11]),
    ("9", &[0, 4, 7, 10, 14]),
    ("11", &[0, 5, 7, 10, 17]),
    ("13", &[0, 4, 7, 10, 14, 21]),
    ("7b9", &[0, 4, 7, 10, 13]),
    ("7#9", &[0, 4, 7, 10, 15]),
    ("7b5", &[0, 4, 6, 10]),
    ("7#5", &[0, 4, 8, 10]),
    ("7b9b13", &[0, 4, 7, 10, 13, 20]),
    ("7#11", &[0, 4, 7, 10, 18]),
    ("7alt", &[0, 4, 10, 13, 15, 6, 8]),
    ("7sus4", &[0, 5, 7, 10]),
    ("9sus4", &[0, 5, 10, 14]),
    ("min6", &[0, 3, 7, 9]),
    ("min69", &[0, 3, 7, 9, 14]),
    ("min9", &[0, 3, 7, 10, 14]),
    ("min11", &[0, 3, 7, 10, 14, 17]),
    ("min13", &[0, 3, 7, 10, 14, 21]),
    ("minMaj7", &[0, 3, 7, 11]),
    ("m9b5", &[0, 3, 6, 10, 14]),
    ("dim7", &[0, 3, 6, 9]),
    ("aug", &[0, 4, 8]),
];

/// Looks up the interval sequence for a chord quality.
pub fn intervals(quality: &str) -> Result<&'static [i8], UnknownQuality> {
    CHORD_TABLE
        .iter()
        .find(|(name, _)| *name == quality)
        .map(|(_, intervals)| *intervals)
        .ok_or_else(|| UnknownQuality(quality.to_owned()))
}

/// Iterates the known quality identifiers in table order.
pub fn qualities() -> impl Iterator<Item = &'static str> {
    CHORD_TABLE.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn every_quality_is_non_empty() {
        for quality in qualities() {
            assert!(!intervals(quality).unwrap().is_empty(), "{quality}");
        }
    }

    #[test]
    fn no_duplicate_qualities() {
        assert_eq!(qualities().duplicates().next(), None);
    }

    #[test]
    fn triads_and_sevenths() {
        assert_eq!(intervals("maj").unwrap(), &[0, 4, 7]);
        assert_eq!(intervals("min7").unwrap(), &[0, 3, 7, 10]);
        assert_eq!(intervals("maj7").unwrap(), &[0, 4, 7, 11]);
    }

    #[test]
    fn altered_dominant_keeps_its_voicing_order() {
        // Not ascending, on purpose.
        assert_eq!(intervals("7alt").unwrap(), &[0, 4, 10, 13, 15, 6, 8]);
    }

    #[test]
    fn unknown_quality_is_rejected() {
        let err = intervals("nope").unwrap_err();
        assert_eq!(err, UnknownQuality("nope".to_owned()));
    }
}
