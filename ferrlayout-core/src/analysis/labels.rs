use std::{fmt, str::FromStr};

use crate::consts::DEFAULT_BOX_COLOR;

/// Class vocabulary a layout model was trained on.
///
/// The index of a name in [`LabelSet::names`] is the class index in the
/// model output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelSet {
    #[default]
    DocLayNet,
    PubLayNet,
}

const DOCLAYNET: [&str; 11] = [
    "Caption",
    "Footnote",
    "Formula",
    "List-Item",
    "Page-Footer",
    "Page-Header",
    "Picture",
    "Section-Header",
    "Table",
    "Text",
    "Title",
];

const PUBLAYNET: [&str; 5] = ["Text", "Title", "List", "Table", "Figure"];

impl LabelSet {
    pub const fn names(&self) -> &'static [&'static str] {
        match self {
            LabelSet::DocLayNet => &DOCLAYNET,
            LabelSet::PubLayNet => &PUBLAYNET,
        }
    }

    pub const fn label_size(&self) -> usize {
        self.names().len()
    }

    /// Name of class `idx`, `None` when the index is outside the vocabulary.
    pub fn name(&self, idx: usize) -> Option<&'static str> {
        self.names().get(idx).copied()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSet::DocLayNet => f.write_str("doclaynet"),
            LabelSet::PubLayNet => f.write_str("publaynet"),
        }
    }
}

impl FromStr for LabelSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "doclaynet" => Ok(LabelSet::DocLayNet),
            "publaynet" => Ok(LabelSet::PubLayNet),
            other => Err(format!(
                "unknown label set `{other}`, expected `doclaynet` or `publaynet`"
            )),
        }
    }
}

/// Box color used by the annotator for a detection type.
pub fn box_color(kind: &str) -> [u8; 3] {
    match kind {
        "Text" => [0, 255, 0],     // Green
        "Title" => [255, 0, 0],    // Red
        "Figure" => [0, 0, 255],   // Blue
        "Table" => [255, 165, 0],  // Orange
        "List" => [255, 0, 255],   // Magenta
        _ => DEFAULT_BOX_COLOR,
    }
}
