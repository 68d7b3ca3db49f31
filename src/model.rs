#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub(crate) fn parse(val: &str) -> Alignment {
        match val {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }

    pub(crate) fn as_wml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Character formatting forced onto the speaker code and heading runs.
#[derive(Clone, Debug, PartialEq)]
pub struct RunStyle {
    pub font_name: String,
    pub font_size: f32, // points
    pub bold: bool,
}

impl Default for RunStyle {
    fn default() -> Self {
        RunStyle {
            font_name: "Arial".to_string(),
            font_size: 12.0,
            bold: true,
        }
    }
}

/// Read-only view of a body paragraph, as returned by [`crate::inspect`].
#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub alignment: Option<Alignment>, // None = inherited from the style
    pub runs: Vec<Run>,
    pub has_image: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub bold: bool,
    pub shaded: bool,
}
