#![forbid(unsafe_code)]

//! Host events delivered to a page.

use crate::surface::ElementId;

/// An input event from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum PageEvent {
    /// The page scrolled to vertical `offset`.
    Scroll { offset: f64 },
    /// The host observed `target` crossing into view at `ratio`.
    Intersection { target: ElementId, ratio: f64 },
    /// A click at client coordinates `(x, y)`.
    Click { target: ElementId, x: f64, y: f64 },
    PointerEnter { target: ElementId },
    PointerLeave { target: ElementId },
    /// The viewport was resized.
    Resize { width: f64, height: f64 },
}

/// Discriminant of a [`PageEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Intersection,
    Click,
    PointerEnter,
    PointerLeave,
    Resize,
}

impl PageEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Intersection { .. } => EventKind::Intersection,
            Self::Click { .. } => EventKind::Click,
            Self::PointerEnter { .. } => EventKind::PointerEnter,
            Self::PointerLeave { .. } => EventKind::PointerLeave,
            Self::Resize { .. } => EventKind::Resize,
        }
    }

    /// Element the event is addressed to, if any.
    #[must_use]
    pub const fn target(&self) -> Option<ElementId> {
        match self {
            Self::Intersection { target, .. }
            | Self::Click { target, .. }
            | Self::PointerEnter { target }
            | Self::PointerLeave { target } => Some(*target),
            Self::Scroll { .. } | Self::Resize { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_and_kind() {
        let click = PageEvent::Click {
            target: ElementId::new(3),
            x: 1.0,
            y: 2.0,
        };
        assert_eq!(click.kind(), EventKind::Click);
        assert_eq!(click.target(), Some(ElementId::new(3)));
        assert_eq!(PageEvent::Scroll { offset: 10.0 }.target(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_shape() {
        let event: PageEvent =
            serde_json::from_str(r#"{"kind":"pointer_enter","target":4}"#).expect("json");
        assert_eq!(
            event,
            PageEvent::PointerEnter {
                target: ElementId::new(4)
            }
        );
        let json = serde_json::to_string(&PageEvent::Scroll { offset: 120.0 }).expect("json");
        assert_eq!(json, r#"{"kind":"scroll","offset":120.0}"#);
    }
}
