#![forbid(unsafe_code)]

//! Inline style properties and CSS value formatting.

use std::fmt;

/// Inline style properties the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum StyleProp {
    Opacity,
    Transform,
    Transition,
    Background,
    BoxShadow,
    BackdropFilter,
    Width,
    Height,
    Left,
    Top,
}

impl StyleProp {
    /// CSS property name.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::Transform => "transform",
            Self::Transition => "transition",
            Self::Background => "background",
            Self::BoxShadow => "box-shadow",
            Self::BackdropFilter => "backdrop-filter",
            Self::Width => "width",
            Self::Height => "height",
            Self::Left => "left",
            Self::Top => "top",
        }
    }
}

impl fmt::Display for StyleProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// Format a number the way CSS serializes it: zero is bare, everything else
/// uses the shortest round-trip representation.
#[must_use]
pub fn css_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}")
    }
}

/// `<n>px`, with zero rendered bare.
#[must_use]
pub fn px(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        format!("{value}px")
    }
}

/// A `translateY(..) [scale(..)] [rotate(..)]` transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub translate_y: f64,
    pub scale: Option<f64>,
    pub rotate_deg: Option<f64>,
}

impl Transform {
    #[must_use]
    pub const fn translate_y(px: f64) -> Self {
        Self {
            translate_y: px,
            scale: None,
            rotate_deg: None,
        }
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub const fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotate_deg = Some(degrees);
        self
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translateY({})", px(self.translate_y))?;
        if let Some(scale) = self.scale {
            write!(f, " scale({})", css_number(scale))?;
        }
        if let Some(deg) = self.rotate_deg {
            write!(f, " rotate({}deg)", css_number(deg))?;
        }
        Ok(())
    }
}
