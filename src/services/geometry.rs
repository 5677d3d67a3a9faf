//! Display selection and window centering

use std::str::FromStr;

use serde::Serialize;

const FALLBACK_SCREEN_WIDTH: u32 = 1920;
const FALLBACK_SCREEN_HEIGHT: u32 = 1080;

const MIN_WIDTH: u32 = 200;
const MAX_WIDTH: u32 = 1200;
const MIN_HEIGHT: u32 = 200;
const MAX_HEIGHT: u32 = 1000;

/// A display's usable work area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Display {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
    pub is_internal: bool,
}

impl Display {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            is_primary: false,
            is_internal: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn internal(mut self) -> Self {
        self.is_internal = true;
        self
    }
}

/// Parses `WIDTHxHEIGHT+LEFT+TOP` (offsets optional), as used by X11 geometry
impl FromStr for Display {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid display geometry '{}', expected WIDTHxHEIGHT+LEFT+TOP", s);

        let (size, offsets) = match s.find(['+', '-']) {
            Some(index) => s.split_at(index),
            None => (s, ""),
        };
        let (width, height) = size.split_once('x').ok_or_else(invalid)?;
        let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = height.trim().parse::<u32>().map_err(|_| invalid())?;

        let mut coords = Vec::new();
        let mut rest = offsets;
        while !rest.is_empty() {
            let sign = if rest.starts_with('-') { -1 } else { 1 };
            rest = &rest[1..];
            let end = rest.find(['+', '-']).unwrap_or(rest.len());
            let value = rest[..end].parse::<i32>().map_err(|_| invalid())?;
            coords.push(sign * value);
            rest = &rest[end..];
        }

        let (left, top) = match coords.as_slice() {
            [] => (0, 0),
            [left, top] => (*left, *top),
            _ => return Err(invalid()),
        };
        Ok(Display::new(left, top, width, height).primary())
    }
}

/// Final window rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// The display flagged primary, else the internal one, else the first
pub fn primary_display(displays: &[Display]) -> Option<&Display> {
    displays
        .iter()
        .find(|display| display.is_primary)
        .or_else(|| displays.iter().find(|display| display.is_internal))
        .or_else(|| displays.first())
}

/// Center a window of the requested size on `display`.
///
/// The size is clamped to sane bounds and the origin never leaves the work
/// area's top-left corner. Without display info a 1920x1080 screen at the
/// origin is assumed.
pub fn centered_placement(width: u32, height: u32, display: Option<&Display>) -> Placement {
    let width = width.clamp(MIN_WIDTH, MAX_WIDTH);
    let height = height.clamp(MIN_HEIGHT, MAX_HEIGHT);

    let (screen_left, screen_top, screen_width, screen_height) = match display {
        Some(display) => (display.left, display.top, display.width, display.height),
        None => (0, 0, FALLBACK_SCREEN_WIDTH, FALLBACK_SCREEN_HEIGHT),
    };

    let left = screen_left.saturating_add(centered_offset(screen_width, width));
    let top = screen_top.saturating_add(centered_offset(screen_height, height));

    Placement {
        left: left.max(screen_left),
        top: top.max(screen_top),
        width,
        height,
    }
}

fn centered_offset(outer: u32, inner: u32) -> i32 {
    ((i64::from(outer) - i64::from(inner)) as f64 / 2.0).round() as i32
}
