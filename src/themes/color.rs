use serde::{Deserialize, Serialize};

use crate::error::{CohlResult, Error};

/// RGBA color with 8-bit components
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct Color {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

fn parse_hex_component(hex: &str, original: &str) -> CohlResult<u8> {
    u8::from_str_radix(hex, 16).map_err(|_| Error::InvalidHexColor {
        value: original.to_string(),
        reason: format!("invalid hex component '{}'", hex),
    })
}

impl Color {
    pub(crate) const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
    pub(crate) const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Outputs the hex value for that colour.
    #[inline]
    pub fn as_hex(&self) -> String {
        if self.a < 255 {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        } else {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        }
    }

    #[inline]
    pub(crate) fn as_css_color_property(&self) -> String {
        format!("color: {};", self.as_hex())
    }

    #[inline]
    pub(crate) fn as_css_bg_color_property(&self) -> String {
        format!("background-color: {};", self.as_hex())
    }

    /// Truecolor SGR parameters for the foreground, without the `\x1b[` and `m`
    pub(crate) fn as_ansi_fg(&self, out: &mut String) {
        out.push_str(&format!("38;2;{};{};{}", self.r, self.g, self.b));
    }

    pub(crate) fn as_ansi_bg(&self, out: &mut String) {
        out.push_str(&format!("48;2;{};{};{}", self.r, self.g, self.b));
    }

    /// Creates a Color from a string (in theory a hex but it can also be black/white).
    ///
    /// Errors if the string is not a valid hex colour.
    pub fn from_hex(hex: &str) -> CohlResult<Self> {
        let original = hex;
        let hex = hex.trim_start_matches('#');

        if hex == "white" {
            return Ok(Color::WHITE);
        } else if hex == "black" {
            return Ok(Color::BLACK);
        }
        if !hex.is_ascii() {
            return Err(Error::InvalidHexColor {
                value: original.to_string(),
                reason: "not ascii".to_string(),
            });
        }
        let component = |range: std::ops::Range<usize>| parse_hex_component(&hex[range], original);
        // short forms repeat each digit: #F00 is #FF0000
        match hex.len() {
            3 | 4 => {
                let mut c = [255; 4];
                for (i, out) in c.iter_mut().enumerate().take(hex.len()) {
                    *out = component(i..i + 1)? * 17;
                }
                Ok(Color {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                    a: c[3],
                })
            }
            6 | 8 => {
                let mut c = [255; 4];
                for (i, out) in c.iter_mut().enumerate().take(hex.len() / 2) {
                    *out = component(i * 2..i * 2 + 2)?;
                }
                Ok(Color {
                    r: c[0],
                    g: c[1],
                    b: c[2],
                    a: c[3],
                })
            }
            _ => Err(Error::InvalidHexColor {
                value: original.to_string(),
                reason: format!("invalid length {}", hex.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_parse_hex_colors() {
        let inputs = vec![
            ("#F00", Color::rgb(255, 0, 0)),
            ("#369", Color::rgb(51, 102, 153)),
            (
                "#F008",
                Color {
                    r: 255,
                    g: 0,
                    b: 0,
                    a: 136,
                },
            ),
            ("#1e1e1e", Color::rgb(30, 30, 30)),
            (
                "#FF000080",
                Color {
                    r: 255,
                    g: 0,
                    b: 0,
                    a: 128,
                },
            ),
            ("white", Color::WHITE),
            ("black", Color::BLACK),
        ];

        for (input, expected) in inputs {
            let color = Color::from_hex(input).unwrap();
            assert_eq!(color, expected, "{input}");
        }
    }

    #[test]
    fn error_on_invalid_format() {
        assert!(Color::from_hex("#FF").is_err());
        assert!(Color::from_hex("#FFFFF").is_err());
        assert!(Color::from_hex("#GGGGGG").is_err());
    }

    #[test]
    fn hex_output() {
        assert_eq!(Color::rgb(255, 0, 0).as_hex(), "#FF0000");
        assert_eq!(Color::from_hex("#FF000080").unwrap().as_hex(), "#FF000080");
    }

    #[test]
    fn ansi_output() {
        let mut out = String::new();
        Color::rgb(1, 2, 3).as_ansi_fg(&mut out);
        out.push(';');
        Color::rgb(4, 5, 6).as_ansi_bg(&mut out);
        assert_eq!(out, "38;2;1;2;3;48;2;4;5;6");
    }
}
