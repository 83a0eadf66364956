use anyhow::{anyhow, Context};
use derive_more::{Add, Display, Mul, Sub};
use serde::{Deserialize, Serialize};
use std::ops;

/// A 2D point in screen space. The origin is the top-left corner of the map,
/// with Y increasing downward.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Display,
    PartialEq,
    Add,
    Sub,
    Mul,
    Serialize,
    Deserialize,
)]
#[display(fmt = "({}, {})", "self.x", "self.y")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An RGB color
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color3 {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color3 {
    pub const fn new_int(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parse an HTML color code: `#rrggbb`
    pub fn from_html(code: &str) -> anyhow::Result<Self> {
        let hex = code
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| anyhow!("expected #rrggbb, got {:?}", code))?;
        let component = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("invalid color code {:?}", code))
        };
        Ok(Self::new_int(component(0)?, component(2)?, component(4)?))
    }

    /// Convert this color to an HTML color code: `#rrggbb`
    pub fn to_html(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

// Scale a color by a constant
impl ops::Mul<f32> for Color3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        let scale = |component: u8| {
            (component as f32 * rhs).round().clamp(0.0, 255.0) as u8
        };
        Self::new_int(scale(self.red), scale(self.green), scale(self.blue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_codes() {
        let color = Color3::from_html("#144da3").unwrap();
        assert_eq!(color, Color3::new_int(20, 77, 163));
        assert_eq!(color.to_html(), "#144da3");
        assert_eq!(
            Color3::from_html("#FFFFFF").unwrap(),
            Color3::new_int(255, 255, 255)
        );

        for invalid in
            &["144da3", "#144da", "#144da3f", "#ggggggg", "#14é4d"]
        {
            assert!(
                Color3::from_html(invalid).is_err(),
                "expected error for {:?}",
                invalid
            );
        }
    }

    #[test]
    fn test_scale() {
        let color = Color3::new_int(100, 200, 250);
        assert_eq!(color * 0.5, Color3::new_int(50, 100, 125));
        assert_eq!(color * 2.0, Color3::new_int(200, 255, 255));
    }
}
