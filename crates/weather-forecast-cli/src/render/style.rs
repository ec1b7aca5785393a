const ESC: char = '\u{1b}';

const WIND_OCTANTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Blue,
    Cyan,
    Green,
    Yellow,
    Red,
}

impl Style {
    fn sgr(self) -> &'static str {
        match self {
            Self::Bold => "1",
            Self::Dim => "2",
            Self::Blue => "34",
            Self::Cyan => "36",
            Self::Green => "32",
            Self::Yellow => "33",
            Self::Red => "31",
        }
    }
}

/// ANSI styling switch; a disabled palette returns text untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(self) -> bool {
        self.enabled
    }

    pub fn paint(self, style: Style, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{ESC}[{}m{text}{ESC}[0m", style.sgr())
    }

    pub fn temperature(self, celsius: f64) -> String {
        self.paint(
            TemperatureBand::from_celsius(celsius).style(),
            &format!("{celsius:.1}"),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureBand {
    Freezing,
    Cold,
    Mild,
    Warm,
    Hot,
}

impl TemperatureBand {
    pub fn from_celsius(celsius: f64) -> Self {
        if celsius < 0.0 {
            Self::Freezing
        } else if celsius < 10.0 {
            Self::Cold
        } else if celsius < 20.0 {
            Self::Mild
        } else if celsius < 30.0 {
            Self::Warm
        } else {
            Self::Hot
        }
    }

    pub fn style(self) -> Style {
        match self {
            Self::Freezing => Style::Blue,
            Self::Cold => Style::Cyan,
            Self::Mild => Style::Green,
            Self::Warm => Style::Yellow,
            Self::Hot => Style::Red,
        }
    }
}

pub fn wind_direction_label(degrees: f64) -> &'static str {
    let index = (degrees.rem_euclid(360.0) / 45.0).round() as usize % WIND_OCTANTS.len();
    WIND_OCTANTS[index]
}

/// Removes CSI escape sequences (`ESC [ ... final`).
pub fn strip_ansi(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != ESC {
            output.push(ch);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
        }
    }

    output
}

pub fn visible_width(input: &str) -> usize {
    strip_ansi(input).chars().count()
}
