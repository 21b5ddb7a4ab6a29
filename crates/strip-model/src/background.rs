//! Export backgrounds: the representation the rasterizer consumes.
//!
//! Live previews can rely on a styling engine to resolve gradient classes;
//! the rasterizer cannot, so every frame style carries an explicit
//! background expressed in CSS syntax (`white`, `rgb(..)`,
//! `linear-gradient(to bottom right, ..)`) that is parsed once into this
//! type and sampled per pixel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::ModelError;

/// Side or corner a linear gradient runs towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    ToTop,
    ToRight,
    ToBottom,
    ToLeft,
    ToTopRight,
    ToBottomRight,
    ToBottomLeft,
    ToTopLeft,
}

impl GradientDirection {
    const ALL: [GradientDirection; 8] = [
        GradientDirection::ToTop,
        GradientDirection::ToRight,
        GradientDirection::ToBottom,
        GradientDirection::ToLeft,
        GradientDirection::ToTopRight,
        GradientDirection::ToBottomRight,
        GradientDirection::ToBottomLeft,
        GradientDirection::ToTopLeft,
    ];

    /// Unit steps along x and y (`-1`, `0` or `1`).
    fn axes(self) -> (i8, i8) {
        match self {
            Self::ToTop => (0, -1),
            Self::ToRight => (1, 0),
            Self::ToBottom => (0, 1),
            Self::ToLeft => (-1, 0),
            Self::ToTopRight => (1, -1),
            Self::ToBottomRight => (1, 1),
            Self::ToBottomLeft => (-1, 1),
            Self::ToTopLeft => (-1, -1),
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::ToTop => "to top",
            Self::ToRight => "to right",
            Self::ToBottom => "to bottom",
            Self::ToLeft => "to left",
            Self::ToTopRight => "to top right",
            Self::ToBottomRight => "to bottom right",
            Self::ToBottomLeft => "to bottom left",
            Self::ToTopLeft => "to top left",
        }
    }

    /// Parse a side/corner keyword; corner words may come in either order.
    fn parse(input: &str) -> Option<Self> {
        let words: Vec<&str> = input.split_whitespace().collect();
        if words.first() != Some(&"to") {
            return None;
        }
        let mut sides: Vec<&str> = words[1..].to_vec();
        if sides.is_empty() || sides.len() > 2 {
            return None;
        }
        if sides.len() == 2 && matches!(sides[0], "left" | "right") {
            sides.swap(0, 1);
        }
        let normalized = format!("to {}", sides.join(" "));
        Self::ALL.into_iter().find(|d| d.keyword() == normalized)
    }

    /// Position of `(x, y)` along the gradient line, in `[0.0, 1.0]`.
    ///
    /// Corner gradients use the CSS magic-corner geometry: the isolines run
    /// parallel to the diagonal joining the two neighbouring corners, which
    /// reduces to the mean of the two axis ratios.
    pub fn progress(self, x: f32, y: f32, width: f32, height: f32) -> f32 {
        let along = |pos: f32, len: f32, step: i8| {
            let ratio = if len > 0.0 { pos / len } else { 0.0 };
            if step > 0 {
                ratio
            } else {
                1.0 - ratio
            }
        };
        let (dx, dy) = self.axes();
        let t = match (dx, dy) {
            (0, _) => along(y, height, dy),
            (_, 0) => along(x, width, dx),
            _ => (along(x, width, dx) + along(y, height, dy)) / 2.0,
        };
        t.clamp(0.0, 1.0)
    }
}

/// One color stop with its resolved position in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub color: Rgba,
    pub position: f32,
}

/// Background usable by the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportBackground {
    Solid {
        color: Rgba,
    },
    LinearGradient {
        direction: GradientDirection,
        stops: Vec<ColorStop>,
    },
}

impl ExportBackground {
    /// Neutral background used by the "no frame" style.
    pub const NEUTRAL: ExportBackground = ExportBackground::Solid { color: Rgba::WHITE };

    pub fn solid(color: Rgba) -> Self {
        Self::Solid { color }
    }

    /// Gradient with evenly spaced stops.
    pub fn linear(direction: GradientDirection, colors: &[Rgba]) -> Self {
        let positions: Vec<Option<f32>> = vec![None; colors.len()];
        Self::LinearGradient {
            direction,
            stops: resolve_stops(colors, &positions),
        }
    }

    /// Parse a CSS background value: a color or a `linear-gradient(..)`.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let s = input.trim();
        let invalid = |reason: String| ModelError::InvalidBackground {
            input: input.to_string(),
            reason,
        };

        let lower = s.to_ascii_lowercase();
        let Some(body) = lower.strip_prefix("linear-gradient(") else {
            return Rgba::parse(s)
                .map(Self::solid)
                .map_err(|e| invalid(e.to_string()));
        };
        let body = body
            .strip_suffix(')')
            .ok_or_else(|| invalid("missing closing parenthesis".into()))?;

        let mut args = split_top_level(body).into_iter().peekable();
        let direction = match args.peek() {
            Some(first) if first.starts_with("to ") => {
                let keyword = args.next().unwrap_or_default();
                GradientDirection::parse(&keyword)
                    .ok_or_else(|| invalid(format!("unknown direction `{keyword}`")))?
            }
            _ => GradientDirection::ToBottom,
        };

        let mut colors = Vec::new();
        let mut positions = Vec::new();
        for arg in args {
            let (color, position) = split_stop(&arg).map_err(invalid)?;
            colors.push(Rgba::parse(color).map_err(|e| invalid(e.to_string()))?);
            positions.push(position);
        }
        if colors.len() < 2 {
            return Err(invalid("a gradient needs at least two color stops".into()));
        }

        Ok(Self::LinearGradient {
            direction,
            stops: resolve_stops(&colors, &positions),
        })
    }

    /// Sample the background at pixel `(x, y)` of a `width` x `height` box.
    /// Pixel centers are used so results do not drift with the box size.
    pub fn color_at(&self, x: u32, y: u32, width: u32, height: u32) -> Rgba {
        match self {
            Self::Solid { color } => *color,
            Self::LinearGradient { direction, stops } => {
                let t = direction.progress(
                    x as f32 + 0.5,
                    y as f32 + 0.5,
                    width as f32,
                    height as f32,
                );
                sample_stops(stops, t)
            }
        }
    }

    pub fn is_gradient(&self) -> bool {
        matches!(self, Self::LinearGradient { .. })
    }

    /// CSS text that [`ExportBackground::parse`] reads back to the same value.
    pub fn to_css(&self) -> String {
        match self {
            Self::Solid { color } => color.to_css(),
            Self::LinearGradient { direction, stops } => {
                let stops = stops
                    .iter()
                    .map(|s| format!("{} {}%", s.color.to_css(), trim_percent(s.position)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("linear-gradient({}, {stops})", direction.keyword())
            }
        }
    }
}

fn trim_percent(position: f32) -> String {
    let pct = (position * 1000.0).round() / 10.0;
    if pct.fract() == 0.0 {
        format!("{}", pct as i32)
    } else {
        format!("{pct:.1}")
    }
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Separate `color [N%]`.
fn split_stop(arg: &str) -> Result<(&str, Option<f32>), String> {
    let Some(idx) = arg.rfind(char::is_whitespace) else {
        return Ok((arg, None));
    };
    let (color, tail) = (arg[..idx].trim(), arg[idx..].trim());
    if color.ends_with(',') || color.is_empty() || !tail.ends_with('%') {
        return Ok((arg, None));
    }
    let pct: f32 = tail
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("invalid stop position `{tail}`"))?;
    Ok((color, Some(pct / 100.0)))
}

/// Fill in missing stop positions following CSS rules: the first defaults
/// to 0, the last to 1, gaps are spread evenly, and positions never go
/// backwards.
fn resolve_stops(colors: &[Rgba], positions: &[Option<f32>]) -> Vec<ColorStop> {
    let n = colors.len();
    let mut resolved: Vec<Option<f32>> = positions.to_vec();
    if n == 0 {
        return Vec::new();
    }
    if resolved[0].is_none() {
        resolved[0] = Some(0.0);
    }
    if n > 1 && resolved[n - 1].is_none() {
        resolved[n - 1] = Some(1.0);
    }

    let mut max_so_far = f32::MIN;
    for p in resolved.iter_mut().flatten() {
        *p = p.max(max_so_far);
        max_so_far = *p;
    }

    let mut i = 0;
    while i < n {
        if resolved[i].is_some() {
            i += 1;
            continue;
        }
        let start = i - 1;
        let mut end = i;
        while resolved[end].is_none() {
            end += 1;
        }
        let (from, to) = (resolved[start].unwrap_or(0.0), resolved[end].unwrap_or(1.0));
        let span = (end - start) as f32;
        for (k, slot) in resolved.iter_mut().enumerate().take(end).skip(start + 1) {
            *slot = Some(from + (to - from) * (k - start) as f32 / span);
        }
        i = end;
    }

    colors
        .iter()
        .zip(resolved)
        .map(|(color, position)| ColorStop {
            color: *color,
            position: position.unwrap_or(0.0),
        })
        .collect()
}

fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.position {
        return first.color;
    }
    if t >= last.position {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.position && t <= b.position {
            let span = b.position - a.position;
            if span <= f32::EPSILON {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.position) / span);
        }
    }
    last.color
}

impl FromStr for ExportBackground {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportBackground::parse(s)
    }
}

impl fmt::Display for ExportBackground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}
