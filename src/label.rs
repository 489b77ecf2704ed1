//! YOLO label record parsing and size classification.
//!
//! A label line holds five whitespace-separated tokens:
//! `class_id center_x center_y width height`. Only the class id, width and
//! height are read; the center tokens just have to be present. Parsing never
//! fails hard: a line either yields a [`LabelRecord`] or a [`SkipReason`]
//! that the caller logs and moves past.

use std::fmt;

use serde::Serialize;

/// Number of tokens in a well-formed label line.
pub const FIELD_COUNT: usize = 5;

/// Boxes with a normalized area below this are `small`.
pub const SMALL_AREA_LIMIT: f64 = 0.02;

/// Boxes with a normalized area below this (and not small) are `medium`.
pub const MEDIUM_AREA_LIMIT: f64 = 0.15;

/// Token positions read from a line, with their names for skip messages.
const NUMERIC_FIELDS: [(usize, &str); 3] = [(0, "class_id"), (3, "width"), (4, "height")];

/// One parsed annotation line. Box centers are never aggregated, so they are
/// not kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRecord {
    pub class_id: f64,
    pub width: f64,
    pub height: f64,
}

impl LabelRecord {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Width over height, or `0.0` when the height is not positive.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            0.0
        }
    }

    pub fn size_class(&self) -> SizeClass {
        classify(self.area())
    }
}

/// Size bucket derived from a box's normalized area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// All classes in export order.
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets a normalized box area into small / medium / large.
pub fn classify(area: f64) -> SizeClass {
    if area < SMALL_AREA_LIMIT {
        SizeClass::Small
    } else if area < MEDIUM_AREA_LIMIT {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

/// Why a label line did not produce a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    WrongTokenCount { found: usize },
    InvalidNumber { field: &'static str, token: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::WrongTokenCount { found } => {
                write!(f, "expected {} tokens, found {}", FIELD_COUNT, found)
            }
            SkipReason::InvalidNumber { field, token } => {
                write!(f, "invalid {} '{}'; expected a number", field, token)
            }
        }
    }
}

/// Result of parsing one label line.
#[derive(Clone, Debug, PartialEq)]
pub enum LineOutcome {
    Record(LabelRecord),
    Skip(SkipReason),
}

/// Counts whitespace-separated tokens without allocating.
pub fn token_count(line: &str) -> usize {
    line.split_whitespace().count()
}

/// True when a line has the five-token shape of a label record.
///
/// This is the only check the validator applies to file contents.
pub fn has_record_shape(line: &str) -> bool {
    token_count(line) == FIELD_COUNT
}

/// Parses one label line.
pub fn parse_record(line: &str) -> LineOutcome {
    let mut tokens = line.split_whitespace();
    // Take one extra token so overlong lines are detected without collecting them.
    let fields: Vec<&str> = tokens.by_ref().take(FIELD_COUNT + 1).collect();

    if fields.len() != FIELD_COUNT {
        let found = fields.len() + tokens.count();
        return LineOutcome::Skip(SkipReason::WrongTokenCount { found });
    }

    let mut values = [0.0f64; NUMERIC_FIELDS.len()];
    for (slot, (position, field)) in values.iter_mut().zip(NUMERIC_FIELDS) {
        let token = fields[position];
        match token.parse::<f64>() {
            Ok(value) => *slot = value,
            Err(_) => {
                return LineOutcome::Skip(SkipReason::InvalidNumber {
                    field,
                    token: token.to_string(),
                })
            }
        }
    }

    let [class_id, width, height] = values;
    LineOutcome::Record(LabelRecord {
        class_id,
        width,
        height,
    })
}

/// Splits label file text into lines.
///
/// Any of `\n`, `\r\n` or a lone `\r` ends a line. Unlike [`str::lines`],
/// a trailing terminator yields a final empty line, so the number of items
/// is always one more than the number of line breaks.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').flat_map(|line| {
        let line = line.strip_suffix('\r').unwrap_or(line);
        line.split('\r')
    })
}
