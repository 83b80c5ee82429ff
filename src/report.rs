/// Report module: self-contained HTML for footprint results.
///
/// Two surfaces:
/// - a result card for a single day (total, category badge, description,
///   per-activity contribution bars, tip line)
/// - a log chart over a computed footprint frame (one bar per row,
///   colored by category, with threshold guides)
///
/// Everything is emitted server-side as a static HTML string with inline
/// SVG/CSS, suitable for `IPython.display.HTML` in Jupyter.
use std::fmt::Write as FmtWrite;

use polars::datatypes::AnyValue;
use polars::prelude::*;

use crate::error::FootprintError;
use crate::footprint::{
    ActivityInput, Category, FootprintResult, AVERAGE_BELOW_KG, EXCELLENT_BELOW_KG, GOOD_BELOW_KG,
};
use crate::schema::*;

// ── Config ──────────────────────────────────────────────────────────────────

/// Configuration shared by the result card and the log chart.
pub struct ReportConfig {
    /// Heading text (default: "Your Daily Carbon Footprint")
    pub title: Option<String>,
    /// Footer tip line; None suppresses the footer
    pub tip: Option<String>,
    /// Pixel height per bar row
    pub row_height_px: u32,
    /// Pixel length of the longest bar
    pub max_bar_px: u32,
}

pub const DEFAULT_TIP: &str = "The average daily carbon footprint globally is about 16 kg CO2";

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: None,
            tip: Some(DEFAULT_TIP.to_string()),
            row_height_px: 22,
            max_bar_px: 420,
        }
    }
}

// ── Category colors ─────────────────────────────────────────────────────────

const FALLBACK_HEX: &str = "#868e96";

/// Fixed hex per color tag. The contract only requires a consistent
/// mapping; these follow the original form's badge colors.
pub fn category_hex(category: Category) -> &'static str {
    match category {
        Category::Excellent => "#40c057",
        Category::Good => "#fab005",
        Category::Average => "#fd7e14",
        Category::High => "#fa5252",
    }
}

// ── Result card ─────────────────────────────────────────────────────────────

/// One-day result card. Total is rounded to two decimals here and only
/// here; the underlying result stays unrounded.
pub fn render_result_card(
    input: &ActivityInput,
    result: &FootprintResult,
    config: &ReportConfig,
) -> String {
    let title = config.title.as_deref().unwrap_or("Your Daily Carbon Footprint");
    let bar_h = config.row_height_px.max(12);
    let max_bar = config.max_bar_px.max(60) as f64;

    let terms = input.terms();
    let max_term = terms
        .iter()
        .map(|(_, kg)| *kg)
        .fold(f64::MIN, f64::max)
        .max(1e-9);

    let mut bars = String::new();
    for (label, kg) in terms {
        let w = (kg / max_term * max_bar).max(0.0);
        write!(
            bars,
            r##"<div class="ct-bar-row"><span class="ct-bar-label">{label}</span><span class="ct-bar" style="width:{w:.1}px;"></span><span class="ct-bar-value">{kg:.2} kg CO2</span></div>"##,
            label = escape_html(label),
            w = w,
            kg = kg,
        )
        .unwrap();
    }

    let tip_html = match config.tip.as_deref() {
        Some(tip) => format!(
            r##"<div class="ct-tip">Tip: {}</div>"##,
            escape_html(tip)
        ),
        None => String::new(),
    };

    format!(
        r##"<div class="ct-card" style="font-family:sans-serif; max-width:640px; border:1px solid #dee2e6; border-radius:4px; background:#fff;">
  <style>
    .ct-card .ct-header {{ padding:8px 12px; border-bottom:1px solid #dee2e6; font-size:14px; font-weight:600; color:#495057; }}
    .ct-card .ct-body {{ padding:12px; }}
    .ct-card .ct-total {{ font-size:28px; font-weight:700; color:#212529; }}
    .ct-card .ct-badge {{ display:inline-block; margin-left:8px; padding:2px 10px; border-radius:10px; color:#fff; font-size:13px; vertical-align:middle; }}
    .ct-card .ct-description {{ margin-top:4px; font-size:13px; color:#495057; }}
    .ct-card .ct-bar-row {{ display:flex; align-items:center; gap:8px; height:{bar_h}px; }}
    .ct-card .ct-bar-label {{ width:110px; text-align:right; font-size:12px; color:#495057; }}
    .ct-card .ct-bar {{ display:inline-block; height:{inner_h}px; background:#4dabf7; border-radius:2px; }}
    .ct-card .ct-bar-value {{ font-size:11px; color:#868e96; }}
    .ct-card .ct-tip {{ padding:8px 12px; border-top:1px solid #dee2e6; font-size:12px; color:#2b8a3e; }}
  </style>
  <div class="ct-header">{title}</div>
  <div class="ct-body">
    <span class="ct-total">{total:.2} kg CO2</span><span class="ct-badge" style="background:{badge_hex};">{category_label}</span>
    <div class="ct-description">{description}</div>
    <div style="margin-top:12px;">{bars}</div>
  </div>
  {tip_html}
</div>"##,
        bar_h = bar_h,
        inner_h = bar_h.saturating_sub(8).max(6),
        title = escape_html(title),
        total = result.total_kg_co2,
        badge_hex = category_hex(result.category),
        category_label = result.category.label(),
        description = result.category.description(),
        bars = bars,
        tip_html = tip_html,
    )
}

// ── Log chart ───────────────────────────────────────────────────────────────

struct LogEntry {
    label: String,
    category_label: String,
    total_kg_co2: f64,
    color: &'static str,
}

fn extract_entries(footprints: &DataFrame) -> Result<Vec<LogEntry>, FootprintError> {
    let n = footprints.height();
    let totals = footprints
        .column(emission::TOTAL_KG_CO2)?
        .as_materialized_series()
        .f64()?;
    let cats = footprints.column(emission::CATEGORY)?.str()?;
    let dates = footprints
        .column(timeseries::DATE_TIME)
        .ok()
        .map(|c| c.as_materialized_series());

    let mut entries = Vec::with_capacity(n);
    for i in 0..n {
        let total_kg_co2 = totals.get(i).unwrap_or(0.0);
        let category_label = cats.get(i).unwrap_or("").to_string();
        let color = Category::from_label(&category_label)
            .map(category_hex)
            .unwrap_or(FALLBACK_HEX);

        let label = dates
            .and_then(|s| match s.get(i) {
                Ok(AnyValue::Datetime(us, _, _)) => format_date_us(us),
                _ => None,
            })
            .unwrap_or_else(|| format!("day {}", i + 1));

        entries.push(LogEntry {
            label,
            category_label,
            total_kg_co2,
            color,
        });
    }
    Ok(entries)
}

fn format_date_us(us: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_micros(us).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Log chart over a computed footprint frame: one bar per row, labeled
/// by `date_time` (or row index), colored by category, with dashed
/// guides at the three category thresholds.
pub fn render_log_chart(
    footprints: &DataFrame,
    config: &ReportConfig,
) -> Result<String, FootprintError> {
    let entries = extract_entries(footprints)?;
    if entries.is_empty() {
        return Ok("<div>No footprint entries to visualize.</div>".to_string());
    }

    let title = config
        .title
        .as_deref()
        .unwrap_or("Daily Carbon Footprint Log");
    let row_h = config.row_height_px.max(12) as f64;
    let max_bar = config.max_bar_px.max(60) as f64;

    let max_total = entries
        .iter()
        .map(|e| e.total_kg_co2)
        .fold(f64::MIN, f64::max)
        .max(1e-9);

    let margin_left = 130.0;
    let margin_top = 26.0;
    let value_gutter = 110.0;
    let width = margin_left + max_bar + value_gutter;
    let height = margin_top + entries.len() as f64 * row_h + 10.0;

    // Dashed guides at the category thresholds that fall inside the scale
    let mut guides = String::new();
    for threshold in [EXCELLENT_BELOW_KG, GOOD_BELOW_KG, AVERAGE_BELOW_KG] {
        if threshold > max_total {
            continue;
        }
        let x = margin_left + threshold / max_total * max_bar;
        write!(
            guides,
            r##"<line class="guide" x1="{x:.1}" y1="{y1}" x2="{x:.1}" y2="{y2:.1}" /><text class="guide-label" x="{x:.1}" y="{ly}">{threshold:.0}</text>"##,
            x = x,
            y1 = margin_top - 4.0,
            y2 = height - 6.0,
            ly = margin_top - 8.0,
            threshold = threshold,
        )
        .unwrap();
    }

    let mut rows = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let y = margin_top + i as f64 * row_h;
        let bar_w = (entry.total_kg_co2 / max_total * max_bar).max(0.0);
        let text_y = y + row_h / 2.0 + 4.0;
        let tooltip = format!(
            "{}: {:.2} kg CO2 ({})",
            entry.label, entry.total_kg_co2, entry.category_label
        );
        write!(
            rows,
            r##"<text class="entry-label" x="{lx}" y="{ty:.1}">{label}</text><rect class="entry-bar" x="{bx}" y="{by:.1}" width="{bw:.1}" height="{bh:.1}" fill="{color}"><title>{tooltip}</title></rect><text class="entry-value" x="{vx:.1}" y="{ty:.1}">{total:.2} kg CO2</text>"##,
            lx = margin_left - 10.0,
            ty = text_y,
            label = escape_html(&entry.label),
            bx = margin_left,
            by = y + 3.0,
            bw = bar_w,
            bh = row_h - 6.0,
            color = entry.color,
            tooltip = escape_html(&tooltip),
            vx = margin_left + bar_w + 6.0,
            total = entry.total_kg_co2,
        )
        .unwrap();
    }

    let tip_html = match config.tip.as_deref() {
        Some(tip) => format!(
            r##"<div style="padding:6px 12px; border-top:1px solid #dee2e6; font-family:sans-serif; font-size:12px; color:#2b8a3e;">Tip: {}</div>"##,
            escape_html(tip)
        ),
        None => String::new(),
    };

    let html = format!(
        r##"<div style="position:relative; width:100%; border:1px solid #dee2e6; border-radius:4px; background:#fff;">
  <div style="padding:4px 8px; border-bottom:1px solid #dee2e6; font-family:sans-serif; font-size:12px; color:#495057;">
    <span style="font-weight:600;">{title}</span>
  </div>
  <div style="overflow:auto; max-height:600px;">
    <svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}">
      <style>
        .entry-label {{ font-family: sans-serif; font-size: 12px; fill: #495057; text-anchor: end; }}
        .entry-value {{ font-family: sans-serif; font-size: 11px; fill: #868e96; }}
        .entry-bar {{ cursor: pointer; }}
        .entry-bar:hover {{ stroke: #495057; stroke-width: 1; }}
        .guide {{ stroke: #dee2e6; stroke-dasharray: 3 3; }}
        .guide-label {{ font-family: sans-serif; font-size: 10px; fill: #868e96; text-anchor: middle; }}
      </style>
      {guides}
      {rows}
    </svg>
  </div>
  {tip_html}
</div>"##,
        title = escape_html(title),
        width = width,
        height = height,
        guides = guides,
        rows = rows,
        tip_html = tip_html,
    );

    Ok(html)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
