/// Paginated report layout.
///
/// Layout produces a display list: pages of draw operations with explicit
/// coordinates, measured in PDF points on an A4 page. The y axis grows
/// downward from the top edge; serializers flip it as needed.
///
/// A cursor walks down the page. Before each block of known height the layout
/// checks whether it still fits above the footer reserve and starts a new page
/// if not. Footers need the total page count, so they are stamped in a second
/// pass once every page exists.
use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::classifier::ClassifiedAdvice;
use crate::error::ReportError;
use crate::pdf::text_width;
use crate::plain_text::flatten;
use crate::prediction::NumericResult;
use crate::view::{strip_emphasis, NO_RECOMMENDATIONS};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 40.0;
pub const FOOTER_RESERVE: f32 = 50.0;
pub const LINE_HEIGHT: f32 = 14.0;
pub const BODY_FONT_SIZE: f32 = 10.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BULLET_INDENT: f32 = 16.0;
const TEXT_WIDTH: f32 = CONTENT_WIDTH - BULLET_INDENT;
const HEADER_HEIGHT: f32 = 90.0;
const METRICS_HEIGHT: f32 = 70.0;
const TECHNIQUE_HEIGHT: f32 = 50.0;
const PARAMS_HEIGHT: f32 = 90.0;
const SECTION_HEADING_HEIGHT: f32 = 28.0;
const SECTION_GAP: f32 = 16.0;
const ITEM_GAP: f32 = 4.0;

pub const REPORT_TITLE: &str = "EcoOyster";
pub const REPORT_SUBTITLE: &str = "Oyster Production Prediction Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

const WHITE: Rgb = Rgb(255, 255, 255);
const INK: Rgb = Rgb(33, 37, 41);
const MUTED: Rgb = Rgb(108, 117, 125);
const BRAND: Rgb = Rgb(14, 116, 144);
const PANEL: Rgb = Rgb(236, 246, 249);
const HIGHLIGHT: Rgb = Rgb(21, 128, 61);

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Text run; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Rgb,
        text: String,
    },
    /// Filled rectangle; `(x, y)` is the top-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    /// Filled round bullet centred on `(x, y)`.
    Bullet { x: f32, y: f32, radius: f32, color: Rgb },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text runs on the page, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Everything a report needs: the prediction, its advice, and when it was generated.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub result: &'a NumericResult,
    pub advice: &'a ClassifiedAdvice,
    pub generated_at: NaiveDateTime,
}

/// Lay out the full report.
///
/// Fails only when a single advice item is taller than a whole page.
pub fn build_report(input: &ReportInput<'_>) -> Result<ReportDocument, ReportError> {
    let mut layout = Layout::new();

    layout.header(input.generated_at);
    layout.metrics(input.result);
    layout.technique(input.result);
    layout.parameters(input.result);

    let mut items: Vec<String> = flatten(input.advice)
        .into_iter()
        .map(strip_emphasis)
        .collect();
    if items.is_empty() {
        items.push(NO_RECOMMENDATIONS.to_string());
    }
    layout.advice(&items)?;

    let document = layout.finish(input.generated_at);
    debug!(
        pages = document.page_count(),
        items = items.len(),
        "report laid out"
    );
    Ok(document)
}

/// Largest number of wrapped lines a single advice item may occupy.
pub fn max_lines_per_page() -> usize {
    ((PAGE_HEIGHT - FOOTER_RESERVE - MARGIN) / LINE_HEIGHT).floor() as usize
}

struct Layout {
    pages: Vec<Vec<DrawOp>>,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            cursor: MARGIN,
        }
    }

    fn bottom() -> f32 {
        PAGE_HEIGHT - FOOTER_RESERVE
    }

    /// Start a new page unless a block of `height` still fits on this one.
    fn ensure_space(&mut self, height: f32) {
        if self.cursor + height > Self::bottom() {
            self.pages.push(Vec::new());
            self.cursor = MARGIN;
        }
    }

    fn draw(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    fn text(&mut self, x: f32, y: f32, size: f32, font: Font, color: Rgb, text: impl Into<String>) {
        self.draw(DrawOp::Text {
            x,
            y,
            size,
            font,
            color,
            text: text.into(),
        });
    }

    fn panel(&mut self, height: f32, fill: Rgb) {
        self.draw(DrawOp::Rect {
            x: MARGIN,
            y: self.cursor,
            width: CONTENT_WIDTH,
            height,
            fill,
        });
    }

    fn header(&mut self, generated_at: NaiveDateTime) {
        self.draw(DrawOp::Rect {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: HEADER_HEIGHT,
            fill: BRAND,
        });
        self.text(MARGIN, 38.0, 22.0, Font::Bold, WHITE, REPORT_TITLE);
        self.text(MARGIN, 58.0, 12.0, Font::Regular, WHITE, REPORT_SUBTITLE);
        self.text(
            MARGIN,
            76.0,
            9.0,
            Font::Regular,
            WHITE,
            format!("Report date: {}", generated_at.format("%B %-d, %Y")),
        );
        self.cursor = HEADER_HEIGHT + SECTION_GAP;
    }

    fn metrics(&mut self, result: &NumericResult) {
        self.ensure_space(METRICS_HEIGHT);
        let top = self.cursor;
        self.panel(METRICS_HEIGHT, PANEL);
        self.text(MARGIN + 12.0, top + 22.0, 11.0, Font::Bold, INK, "Predicted Oyster Production");
        self.text(
            MARGIN + 12.0,
            top + 52.0,
            22.0,
            Font::Bold,
            HIGHLIGHT,
            format!("{} metric tons", result.display_value()),
        );
        self.cursor = top + METRICS_HEIGHT + SECTION_GAP;
    }

    fn technique(&mut self, result: &NumericResult) {
        self.ensure_space(TECHNIQUE_HEIGHT);
        let top = self.cursor;
        self.panel(TECHNIQUE_HEIGHT, PANEL);
        self.text(MARGIN + 12.0, top + 20.0, 9.0, Font::Bold, MUTED, "FARMING TECHNIQUE");
        self.text(
            MARGIN + 12.0,
            top + 38.0,
            13.0,
            Font::Bold,
            INK,
            result.inputs.technique.name(),
        );
        self.cursor = top + TECHNIQUE_HEIGHT + SECTION_GAP;
    }

    fn parameters(&mut self, result: &NumericResult) {
        self.ensure_space(PARAMS_HEIGHT);
        let top = self.cursor;
        let inputs = &result.inputs;

        self.text(MARGIN, top + 14.0, 12.0, Font::Bold, INK, "Input Parameters");
        self.draw(DrawOp::Line {
            x1: MARGIN,
            y1: top + 20.0,
            x2: PAGE_WIDTH - MARGIN,
            y2: top + 20.0,
            width: 0.5,
            color: MUTED,
        });

        let cells = [
            ("Salinity", format!("{} ppt", inputs.salinity)),
            ("Farming Technique", inputs.technique.name().to_string()),
            ("Typhoon Events", inputs.typhoon_count.to_string()),
            ("Flood Events", inputs.flood_count.to_string()),
        ];
        let column_width = CONTENT_WIDTH / 2.0;
        for (index, (label, value)) in cells.into_iter().enumerate() {
            let x = MARGIN + column_width * (index % 2) as f32;
            let row_top = top + 30.0 + 30.0 * (index / 2) as f32;
            self.text(x, row_top + 8.0, 8.0, Font::Bold, MUTED, label.to_uppercase());
            self.text(x, row_top + 22.0, 11.0, Font::Regular, INK, value);
        }
        self.cursor = top + PARAMS_HEIGHT + SECTION_GAP;
    }

    fn advice(&mut self, items: &[String]) -> Result<(), ReportError> {
        self.ensure_space(SECTION_HEADING_HEIGHT + LINE_HEIGHT);
        let top = self.cursor;
        self.text(MARGIN, top + 14.0, 12.0, Font::Bold, INK, "AI-Powered Recommendations");
        self.draw(DrawOp::Line {
            x1: MARGIN,
            y1: top + 20.0,
            x2: PAGE_WIDTH - MARGIN,
            y2: top + 20.0,
            width: 0.5,
            color: MUTED,
        });
        self.cursor = top + SECTION_HEADING_HEIGHT;

        let max_lines = max_lines_per_page();
        for (index, item) in items.iter().enumerate() {
            let lines = wrap_text(item, TEXT_WIDTH, BODY_FONT_SIZE);
            if lines.is_empty() {
                continue;
            }
            if lines.len() > max_lines {
                warn!(item = index, lines = lines.len(), max_lines, "advice item cannot fit on one page");
                return Err(ReportError::LayoutOverflow {
                    item: index,
                    lines: lines.len(),
                    max_lines,
                });
            }

            self.ensure_space(LINE_HEIGHT);
            self.draw(DrawOp::Bullet {
                x: MARGIN + 5.0,
                y: self.cursor + LINE_HEIGHT / 2.0,
                radius: 1.8,
                color: BRAND,
            });
            for (line_index, line) in lines.into_iter().enumerate() {
                if line_index > 0 {
                    self.ensure_space(LINE_HEIGHT);
                }
                let baseline = self.cursor + LINE_HEIGHT - 3.5;
                self.text(MARGIN + BULLET_INDENT, baseline, BODY_FONT_SIZE, Font::Regular, INK, line);
                self.cursor += LINE_HEIGHT;
            }
            self.cursor += ITEM_GAP;
        }
        Ok(())
    }

    /// Stamp every page with the same "Page X of N" footer.
    fn finish(self, generated_at: NaiveDateTime) -> ReportDocument {
        let total = self.pages.len();
        let stamp = format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
        let rule_y = PAGE_HEIGHT - FOOTER_RESERVE + 12.0;
        let text_y = PAGE_HEIGHT - FOOTER_RESERVE + 28.0;

        let pages = self
            .pages
            .into_iter()
            .enumerate()
            .map(|(index, mut ops)| {
                let number = index + 1;
                let page_label = format!("Page {number} of {total}");
                let label_x = PAGE_WIDTH - MARGIN - text_width(&page_label, 8.0);
                ops.push(DrawOp::Line {
                    x1: MARGIN,
                    y1: rule_y,
                    x2: PAGE_WIDTH - MARGIN,
                    y2: rule_y,
                    width: 0.5,
                    color: MUTED,
                });
                ops.push(DrawOp::Text {
                    x: MARGIN,
                    y: text_y,
                    size: 8.0,
                    font: Font::Regular,
                    color: MUTED,
                    text: stamp.clone(),
                });
                ops.push(DrawOp::Text {
                    x: label_x,
                    y: text_y,
                    size: 8.0,
                    font: Font::Regular,
                    color: MUTED,
                    text: page_label,
                });
                Page { number, ops }
            })
            .collect();

        ReportDocument {
            title: format!("{REPORT_TITLE} {REPORT_SUBTITLE}"),
            pages,
        }
    }
}

/// Greedy word wrap using Helvetica advance widths.
///
/// Words wider than `max_width` on their own are broken by characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;
    let space_width = text_width(" ", size);

    for word in text.split_whitespace() {
        let word_width = text_width(word, size);
        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + space_width + word_width
        };
        if needed <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_width = needed;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        for c in word.chars() {
            let mut buf = [0u8; 4];
            let char_width = text_width(c.encode_utf8(&mut buf), size);
            if !current.is_empty() && current_width + char_width > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            current.push(c);
            current_width += char_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
