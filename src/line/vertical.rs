//! # Vertical Metrics
//!
//! Combines the strut of the block with the boxes of every run on a line
//! into one line box. Heights are measured from the baseline, positive
//! upward, and combined by min/max only. The final placements are handed
//! to the painter as offsets down from the top of the line.

use crate::config::MetricsConfig;
use crate::font::FontMetrics;
use crate::style::{FontState, LineStacking, VerticalAlign};

use super::{Run, RunContent};

/// A vertical extent relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VBox {
    /// Above the baseline (usually positive).
    pub top: f64,
    /// Below the baseline (usually negative).
    pub bottom: f64,
}

impl VBox {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    pub fn union(self, other: VBox) -> VBox {
        VBox {
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
        }
    }

    fn shifted(self, dy: f64) -> VBox {
        VBox {
            top: self.top + dy,
            bottom: self.bottom + dy,
        }
    }
}

/// Font measurements of one run, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontExtent {
    pub ascent: f64,
    /// Negative.
    pub descent: f64,
    pub x_height: f64,
    /// Underline (position, thickness); position negative below baseline.
    pub underline: (f64, f64),
    /// Strikeout (position, thickness).
    pub strikeout: (f64, f64),
}

impl FontExtent {
    /// Measure a font at a size, substituting ratios for missing tables.
    pub fn measure(metrics: &FontMetrics, size: f64, config: &MetricsConfig) -> Self {
        let (ascent, descent) = match (metrics.ascent_em(), metrics.descent_em()) {
            (Some(a), Some(d)) => (a, d),
            _ => (config.fallback_ascent, config.fallback_descent),
        };
        let x_height = metrics.x_height_em().unwrap_or(ascent * 0.5);
        let underline = metrics.underline_em().unwrap_or((-0.1, 0.05));
        let strikeout = metrics
            .strikeout_em()
            .unwrap_or((x_height / 2.0, underline.1));
        Self {
            ascent: ascent * size,
            descent: descent * size,
            x_height: x_height * size,
            underline: (underline.0 * size, underline.1 * size),
            strikeout: (strikeout.0 * size, strikeout.1 * size),
        }
    }

    pub fn content(&self) -> VBox {
        VBox::new(self.ascent, self.descent)
    }

    /// The content area grown (or shrunk) by half-leading to `line_height`.
    pub fn inline_box(&self, line_height: Option<f64>) -> VBox {
        let content = self.content();
        match line_height {
            Some(lh) => {
                let half_leading = (lh - content.height()) / 2.0;
                VBox::new(content.top + half_leading, content.bottom - half_leading)
            }
            None => content,
        }
    }
}

/// The block's own font and line height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strut {
    pub extent: FontExtent,
    pub inline: VBox,
}

impl Strut {
    /// `line_height` is a multiplier of the font size.
    pub fn new(extent: FontExtent, font: &FontState, line_height: Option<f64>) -> Self {
        Self {
            extent,
            inline: extent.inline_box(line_height.map(|m| m * font.size)),
        }
    }
}

/// What a run brings to the line box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunExtent {
    pub font: FontExtent,
    /// Glyph content area, shifted by the baseline shift.
    pub content: VBox,
    /// Box including half-leading, shifted by the baseline shift.
    pub inline: VBox,
    pub baseline_shift: f64,
    /// Objects aligned to the top or bottom of the line box: their height.
    pub line_relative: Option<(VerticalAlign, f64)>,
}

/// Resolved vertical geometry of one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBox {
    /// Top of the line box above the baseline.
    pub box_top: f64,
    /// Bottom of the line box relative to the baseline (negative below).
    pub box_bottom: f64,
    /// Distance from the top of the line down to the baseline.
    pub glyph_baseline_origin: f64,
    pub stack_height: f64,
}

/// Vertical placement of one run, as offsets down from the line top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPlacement {
    pub top: f64,
    pub bottom: f64,
    /// The run's own baseline (after its shift).
    pub baseline: f64,
    pub font: FontExtent,
}

pub struct VerticalMetricsResolver<'a> {
    config: &'a MetricsConfig,
}

impl<'a> VerticalMetricsResolver<'a> {
    pub fn new(config: &'a MetricsConfig) -> Self {
        Self { config }
    }

    pub fn strut(&self, metrics: &FontMetrics, font: &FontState, line_height: Option<f64>) -> Strut {
        Strut::new(FontExtent::measure(metrics, font.size, self.config), font, line_height)
    }

    /// What `run` contributes, given its font's metrics and the strut.
    pub fn run_extent(&self, run: &Run, metrics: &FontMetrics, strut: &Strut) -> RunExtent {
        let font = FontExtent::measure(metrics, run.font.size, self.config);
        let shift = run.style.baseline_shift;
        match &run.content {
            RunContent::Text(_) => RunExtent {
                font,
                content: font.content().shifted(shift),
                inline: font
                    .inline_box(run.style.line_height.map(|m| m * run.font.size))
                    .shifted(shift),
                baseline_shift: shift,
                line_relative: None,
            },
            RunContent::Object { object, .. } => {
                let (_, h) = object.clamped_size();
                let (boxed, line_relative) = match object.vertical_align {
                    VerticalAlign::Baseline => (VBox::new(h, 0.0).shifted(shift), None),
                    VerticalAlign::Middle => {
                        let mid = font.x_height / 2.0 + shift;
                        (VBox::new(mid + h / 2.0, mid - h / 2.0), None)
                    }
                    VerticalAlign::TextTop => {
                        let top = strut.extent.ascent;
                        (VBox::new(top, top - h), None)
                    }
                    VerticalAlign::TextBottom => {
                        let bottom = strut.extent.descent;
                        (VBox::new(bottom + h, bottom), None)
                    }
                    align @ (VerticalAlign::Top | VerticalAlign::Bottom) => {
                        (VBox::new(h, 0.0), Some((align, h)))
                    }
                };
                RunExtent {
                    font,
                    content: boxed,
                    inline: boxed,
                    baseline_shift: shift,
                    line_relative,
                }
            }
        }
    }

    /// Combine the strut and the run extents into the line box.
    pub fn resolve(
        &self,
        strut: &Strut,
        runs: &[RunExtent],
        stacking: LineStacking,
    ) -> (LineBox, Vec<RunPlacement>) {
        let pick = |e: &RunExtent| match stacking {
            LineStacking::MaxHeight => e.content,
            _ => e.inline,
        };

        let mut union = strut.inline;
        if stacking != LineStacking::BlockLineHeight {
            for extent in runs.iter().filter(|e| e.line_relative.is_none()) {
                union = union.union(pick(extent));
            }
        }

        // Top/bottom aligned objects hang from the final box edges; the box
        // grows downward until the tallest of them fits.
        let tallest = runs
            .iter()
            .filter_map(|e| e.line_relative.map(|(_, h)| h))
            .fold(0.0_f64, f64::max);
        if stacking != LineStacking::BlockLineHeight && tallest > union.height() {
            union.bottom = union.top - tallest;
        }
        let boxes: Vec<VBox> = runs
            .iter()
            .map(|extent| match extent.line_relative {
                Some((VerticalAlign::Top, h)) => VBox::new(union.top, union.top - h),
                Some((_, h)) => VBox::new(union.bottom + h, union.bottom),
                None => pick(extent),
            })
            .collect();

        let mut stack_height = union.height();
        let mut box_bottom = union.bottom;
        if stacking == LineStacking::GridHeight {
            let cell = strut.inline.height();
            if cell > 0.0 {
                let cells = (stack_height / cell - 1e-9).ceil().max(1.0);
                stack_height = cells * cell;
                box_bottom = union.top - stack_height;
            }
        }

        let origin = union.top;
        let line_box = LineBox {
            box_top: union.top,
            box_bottom,
            glyph_baseline_origin: origin,
            stack_height,
        };
        let placements = runs
            .iter()
            .zip(boxes)
            .map(|(extent, b)| RunPlacement {
                top: origin - b.top,
                bottom: origin - b.bottom,
                baseline: origin - extent.baseline_shift,
                font: extent.font,
            })
            .collect();
        (line_box, placements)
    }
}
