//! CSS color helpers for gradients and alpha-blended overlays.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`. Anything else yields `None`.
    pub fn parse_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#')?;
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(digits.get(0..2)?, 16).ok()?;
                let g = u8::from_str_radix(digits.get(2..4)?, 16).ok()?;
                let b = u8::from_str_radix(digits.get(4..6)?, 16).ok()?;
                Some(Rgb { r, g, b })
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, ch) in channels.iter_mut().zip(digits.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Rgb::new(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    pub fn brighten(self, amount: f64) -> Rgb {
        let lift = |c: u8| -> u8 {
            let c = c as f64;
            (c + (255.0 - c) * amount.clamp(0.0, 1.0)).round() as u8
        };
        Rgb::new(lift(self.r), lift(self.g), lift(self.b))
    }

    pub fn darken(self, amount: f64) -> Rgb {
        let drop = |c: u8| -> u8 { (c as f64 * (1.0 - amount.clamp(0.0, 1.0))).round() as u8 };
        Rgb::new(drop(self.r), drop(self.g), drop(self.b))
    }

    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn rgba(self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

const FALLBACK: Rgb = Rgb::new(136, 136, 136);

/// `rgba(...)` for a hex color, falling back to grey when the hex is malformed.
pub fn rgba_css(hex: &str, alpha: f64) -> String {
    Rgb::parse_hex(hex).unwrap_or(FALLBACK).rgba(alpha)
}

pub fn brighten_css(hex: &str, amount: f64) -> String {
    Rgb::parse_hex(hex).unwrap_or(FALLBACK).brighten(amount).css()
}

pub fn darken_css(hex: &str, amount: f64) -> String {
    Rgb::parse_hex(hex).unwrap_or(FALLBACK).darken(amount).css()
}

/// Colors handed out to freshly drawn areas, in order.
pub const AREA_PALETTE: [&str; 8] = [
    "#4a9eff", "#26de81", "#f7b731", "#a55eea", "#ff6b6b", "#2bcbba", "#fd9644", "#778ca3",
];
