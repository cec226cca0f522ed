//! One-month closing price chart rendered to PNG
//!
//! The chart is drawn straight into an RGB buffer: background, horizontal
//! grid with price labels, plot frame, the close-price polyline with one
//! marker per close, then the title, axis captions, first and last dates and
//! a legend in a small built-in bitmap font.

mod glyphs;

use crate::api::{MarketDataGateway, Quote};
use crate::error::{Result, StockError};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Colours and geometry of the chart
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    /// Extra space left of the plot for price labels
    pub label_gutter: u32,
    pub grid_lines: u32,
    pub line_thickness: u32,
    pub marker_radius: u32,
    pub background: Rgb<u8>,
    pub frame: Rgb<u8>,
    pub grid: Rgb<u8>,
    pub line: Rgb<u8>,
    pub marker: Rgb<u8>,
    pub text: Rgb<u8>,
    pub title_scale: u32,
    pub label_scale: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            margin: 50,
            label_gutter: 40,
            grid_lines: 5,
            line_thickness: 2,
            marker_radius: 4,
            background: Rgb([255, 255, 255]),
            frame: Rgb([60, 60, 60]),
            grid: Rgb([225, 225, 225]),
            line: Rgb([31, 119, 180]),
            marker: Rgb([214, 39, 40]),
            text: Rgb([33, 33, 33]),
            title_scale: 3,
            label_scale: 2,
        }
    }
}

/// An encoded chart and where each close was plotted
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub png: Vec<u8>,
    /// Pixel position of each close, in input order
    pub points: Vec<(u32, u32)>,
}

/// Text drawn around the plot; empty strings are skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartLabels {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub legend: String,
    /// Captions under the first and last points
    pub x_range: Option<(String, String)>,
}

impl ChartLabels {
    /// Labels for a one-month close chart of `symbol`
    pub fn month(symbol: &str, quotes: &[Quote]) -> Self {
        let day = |q: &Quote| q.date.format("%Y-%m-%d").to_string();
        Self {
            title: format!("{symbol} Closing Prices (1 Month)"),
            x_axis: "Date".to_string(),
            y_axis: "Close Price (USD)".to_string(),
            legend: "Close".to_string(),
            x_range: quotes.first().zip(quotes.last()).map(|(a, b)| (day(a), day(b))),
        }
    }
}

/// Daily bars for the last month
pub async fn fetch_month_quotes(
    gateway: &dyn MarketDataGateway,
    symbol: &str,
) -> Result<Vec<Quote>> {
    let quotes = gateway.history_range(symbol, "1mo").await?;
    if quotes.is_empty() {
        return Err(StockError::unavailable(symbol, "no price history for the last month"));
    }
    Ok(quotes)
}

/// Fetch a month of closes and render them
pub async fn render_month_chart(
    gateway: &dyn MarketDataGateway,
    symbol: &str,
    style: &ChartStyle,
) -> Result<RenderedChart> {
    let quotes = fetch_month_quotes(gateway, symbol).await?;
    debug!(symbol, points = quotes.len(), "Rendering month chart");

    let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
    render_line_chart(&closes, &ChartLabels::month(symbol, &quotes), style)
}

/// Rasterise a line chart of `closes` into a PNG
pub fn render_line_chart(
    closes: &[f64],
    labels: &ChartLabels,
    style: &ChartStyle,
) -> Result<RenderedChart> {
    if closes.is_empty() {
        return Err(StockError::unavailable("chart", "no closing prices to plot"));
    }
    if closes.iter().any(|c| !c.is_finite()) {
        return Err(StockError::ChartError("closing prices must be finite".to_string()));
    }
    let left = style.margin + style.label_gutter;
    if style.width <= left + style.margin || style.height <= style.margin * 2 {
        return Err(StockError::ChartError(format!(
            "canvas {}x{} is too small for margin {} and gutter {}",
            style.width, style.height, style.margin, style.label_gutter
        )));
    }

    let mut img: RgbImage = ImageBuffer::from_pixel(style.width, style.height, style.background);

    let right = style.width - style.margin;
    let top = style.margin;
    let bottom = style.height - style.margin;
    let (min, max) = price_bounds(closes);
    let label_scale = style.label_scale.max(1);
    let label_height = glyphs::GLYPH_HEIGHT * label_scale;

    // Horizontal grid, evenly spaced between top and bottom, priced on the left
    let divisions = style.grid_lines.max(1);
    for i in 0..=divisions {
        let y = top + (bottom - top) * i / divisions;
        if i > 0 && i < divisions {
            draw_line(&mut img, (left, y), (right, y), 1, style.grid);
        }

        let price = max - (max - min) * f64::from(i) / f64::from(divisions);
        let label = format!("{price:.2}");
        let scale = if glyphs::text_width(&label, label_scale) + 6 <= left {
            label_scale
        } else {
            1
        };
        let x = left.saturating_sub(glyphs::text_width(&label, scale) + 6);
        let y = y.saturating_sub(glyphs::GLYPH_HEIGHT * scale / 2);
        draw_text(&mut img, &label, (x, y), scale, style.text);
    }

    // Frame
    draw_line(&mut img, (left, top), (right, top), 1, style.frame);
    draw_line(&mut img, (left, bottom), (right, bottom), 1, style.frame);
    draw_line(&mut img, (left, top), (left, bottom), 1, style.frame);
    draw_line(&mut img, (right, top), (right, bottom), 1, style.frame);

    let points = plot_points(closes, (min, max), left, right, top, bottom);

    for pair in points.windows(2) {
        draw_line(&mut img, pair[0], pair[1], style.line_thickness, style.line);
    }
    for &point in &points {
        draw_disc(&mut img, point, style.marker_radius, style.marker);
    }

    // Title centred in the top margin
    let title_scale = style.title_scale.max(1);
    let title_width = glyphs::text_width(&labels.title, title_scale);
    let caption_row = top.saturating_sub(label_height + 4);
    let title_y = caption_row.saturating_sub(glyphs::GLYPH_HEIGHT * title_scale + 4);
    draw_text(
        &mut img,
        &labels.title,
        (style.width.saturating_sub(title_width) / 2, title_y),
        title_scale,
        style.text,
    );

    // Y axis caption above the price labels, legend opposite it
    let caption_origin = (style.margin / 2, caption_row);
    draw_text(&mut img, &labels.y_axis, caption_origin, label_scale, style.text);
    if !labels.legend.is_empty() {
        let text_width = glyphs::text_width(&labels.legend, label_scale);
        let swatch = 24;
        let text_x = right.saturating_sub(text_width);
        let swatch_x = text_x.saturating_sub(swatch + 6);
        let mid = caption_row + label_height / 2;
        let swatch_end = (swatch_x + swatch, mid);
        draw_line(&mut img, (swatch_x, mid), swatch_end, style.line_thickness, style.line);
        draw_disc(&mut img, (swatch_x + swatch / 2, mid), style.marker_radius, style.marker);
        draw_text(&mut img, &labels.legend, (text_x, caption_row), label_scale, style.text);
    }

    // First and last dates under their points, x caption centred below
    let date_row = bottom + 8;
    if let (Some((first, last)), Some(&(first_x, _)), Some(&(last_x, _))) =
        (&labels.x_range, points.first(), points.last())
    {
        draw_text(&mut img, first, (first_x, date_row), label_scale, style.text);
        if points.len() > 1 {
            let x = last_x.saturating_sub(glyphs::text_width(last, label_scale));
            draw_text(&mut img, last, (x, date_row), label_scale, style.text);
        }
    }
    let caption_width = glyphs::text_width(&labels.x_axis, label_scale);
    let caption_x = (left + right).saturating_sub(caption_width) / 2;
    draw_text(
        &mut img,
        &labels.x_axis,
        (caption_x, date_row + label_height + 4),
        label_scale,
        style.text,
    );

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(RenderedChart { png, points })
}

/// Lowest and highest close, widened when the series is flat
fn price_bounds(closes: &[f64]) -> (f64, f64) {
    let (min, max) = closes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| (lo.min(c), hi.max(c)));
    if (max - min).abs() < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

/// Map closes into the plot rectangle; higher prices sit higher
fn plot_points(
    closes: &[f64],
    (min, max): (f64, f64),
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
) -> Vec<(u32, u32)> {
    let width = f64::from(right - left);
    let height = f64::from(bottom - top);
    let steps = closes.len().saturating_sub(1).max(1) as f64;

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let x = if closes.len() == 1 {
                f64::from(left) + width / 2.0
            } else {
                f64::from(left) + width * i as f64 / steps
            };
            let y = f64::from(bottom) - height * (close - min) / (max - min);
            (x.round() as u32, y.round() as u32)
        })
        .collect()
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Bresenham line, widened by stamping a square brush
fn draw_line(img: &mut RgbImage, from: (u32, u32), to: (u32, u32), thickness: u32, color: Rgb<u8>) {
    let (mut x0, mut y0) = (i64::from(from.0), i64::from(from.1));
    let (x1, y1) = (i64::from(to.0), i64::from(to.1));
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let half = i64::from(thickness.max(1)) / 2;
    let span = i64::from(thickness.max(1));

    loop {
        for ox in 0..span {
            for oy in 0..span {
                put(img, x0 - half + ox, y0 - half + oy, color);
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draw `text` with its top-left corner at `origin`
fn draw_text(img: &mut RgbImage, text: &str, origin: (u32, u32), scale: u32, color: Rgb<u8>) {
    let (mut x, y) = (i64::from(origin.0), i64::from(origin.1));
    let scale = i64::from(scale.max(1));

    for c in text.chars() {
        for (row, bits) in (0_i64..).zip(glyphs::glyph(c)) {
            for col in 0..i64::from(glyphs::GLYPH_WIDTH) {
                if bits & (1 << (i64::from(glyphs::GLYPH_WIDTH) - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        put(img, x + col * scale + dx, y + row * scale + dy, color);
                    }
                }
            }
        }
        x += i64::from(glyphs::ADVANCE) * scale;
    }
}

fn draw_disc(img: &mut RgbImage, center: (u32, u32), radius: u32, color: Rgb<u8>) {
    let (cx, cy) = (i64::from(center.0), i64::from(center.1));
    let r = i64::from(radius);
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gateway::fake::FakeGateway;
    use std::ops::Range;

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 180.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.3).collect()
    }

    fn plain(closes: &[f64]) -> RenderedChart {
        render_line_chart(closes, &ChartLabels::default(), &ChartStyle::default()).unwrap()
    }

    /// Pixels of `color` inside the given columns and rows
    fn ink_in(img: &RgbImage, color: Rgb<u8>, xs: Range<u32>, ys: Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == color)
            .count()
    }

    #[test]
    fn test_month_of_closes_renders_png() {
        let style = ChartStyle::default();
        let labels = ChartLabels {
            title: "AAPL Closing Prices (1 Month)".to_string(),
            ..ChartLabels::default()
        };
        let chart = render_line_chart(&closes(22), &labels, &style).unwrap();

        assert_eq!(chart.points.len(), 22);
        assert_eq!(&chart.png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&chart.png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1000, 600));

        for &(x, y) in &chart.points {
            assert_eq!(*decoded.get_pixel(x, y), style.marker);
        }
    }

    #[test]
    fn test_points_follow_prices() {
        let chart = plain(&[10.0, 20.0, 15.0]);
        let &[first, second, third] = chart.points.as_slice() else {
            panic!("expected three points");
        };

        // plot starts after the margin plus the price label gutter
        assert_eq!(first.0, 90);
        assert_eq!(third.0, 950);
        // lowest close on the bottom edge, highest on the top edge
        assert_eq!(first.1, 550);
        assert_eq!(second.1, 50);
        assert!(third.1 > second.1 && third.1 < first.1);
    }

    #[test]
    fn test_flat_and_single_series() {
        let flat = plain(&[5.0, 5.0, 5.0]);
        assert!(flat.points.iter().all(|p| p.1 == flat.points[0].1));

        let single = plain(&[42.0]);
        assert_eq!(single.points, vec![(520, 300)]);
    }

    #[test]
    fn test_title_axes_and_legend_are_drawn() {
        let style = ChartStyle::default();
        let quotes = FakeGateway::with_closes(&closes(5)).quotes;
        let labels = ChartLabels::month("AAPL", &quotes);
        assert_eq!(labels.title, "AAPL Closing Prices (1 Month)");
        assert_eq!(
            labels.x_range,
            Some(("2024-01-01".to_string(), "2024-01-05".to_string()))
        );

        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let labelled = render_line_chart(&closes, &labels, &style).unwrap();
        let bare = render_line_chart(&closes, &ChartLabels::default(), &style).unwrap();
        let labelled = image::load_from_memory(&labelled.png).unwrap().to_rgb8();
        let bare = image::load_from_memory(&bare.png).unwrap().to_rgb8();

        // title band above the plot
        assert!(ink_in(&labelled, style.text, 200..800, 0..30) > 0);
        assert_eq!(ink_in(&bare, style.text, 200..800, 0..30), 0);
        // legend swatch and caption top right
        assert!(ink_in(&labelled, style.line, 800..950, 30..50) > 0);
        assert_eq!(ink_in(&bare, style.line, 800..950, 30..50), 0);
        // dates and x caption below the plot
        assert!(ink_in(&labelled, style.text, 90..950, 552..600) > 0);
        assert_eq!(ink_in(&bare, style.text, 90..950, 552..600), 0);
        // price labels are drawn either way
        assert!(ink_in(&bare, style.text, 0..90, 50..550) > 0);
    }

    #[test]
    fn test_price_labels_shrink_to_fit_gutter() {
        let style = ChartStyle::default();
        let closes = [98_000.0, 99_500.0];
        let chart = render_line_chart(&closes, &ChartLabels::default(), &style).unwrap();
        let img = image::load_from_memory(&chart.png).unwrap().to_rgb8();

        // "99500.00" at scale 2 would overflow the 90px gutter; scale 1 fits
        assert!(ink_in(&img, style.text, 0..90, 40..60) > 0);
        assert_eq!(ink_in(&img, style.text, 0..4, 0..600), 0);
    }

    #[test]
    fn test_empty_series_is_unavailable() {
        let err =
            render_line_chart(&[], &ChartLabels::default(), &ChartStyle::default()).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_non_finite_rejected() {
        let closes = [1.0, f64::NAN];
        let err = render_line_chart(&closes, &ChartLabels::default(), &ChartStyle::default())
            .unwrap_err();
        assert!(matches!(err, StockError::ChartError(_)));
    }

    #[test]
    fn test_gutter_counts_toward_minimum_width() {
        let style = ChartStyle {
            width: 130,
            ..ChartStyle::default()
        };
        let err = render_line_chart(&[1.0], &ChartLabels::default(), &style).unwrap_err();
        assert!(matches!(err, StockError::ChartError(_)));
    }

    #[tokio::test]
    async fn test_render_month_chart_from_gateway() {
        let gateway = FakeGateway::with_closes(&closes(21));
        let chart = render_month_chart(&gateway, "AAPL", &ChartStyle::default())
            .await
            .unwrap();
        assert_eq!(chart.points.len(), 21);
    }

    #[tokio::test]
    async fn test_no_history_is_unavailable() {
        let gateway = FakeGateway::default();
        let err = fetch_month_quotes(&gateway, "AAPL").await.unwrap_err();
        assert!(err.is_no_data());
    }
}
