use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{greens, ColorMap, ACCENT};
use crate::data::aggregate::safe_ratio;
use crate::data::error::PipelineResult;
use crate::data::model::{Table, Value};

const PLOT_HEIGHT: f32 = 260.0;

/// How bars are filled.
#[derive(Debug, Clone, Copy)]
pub enum Fill {
    Solid(Color32),
    /// Light-to-dark green by bar value.
    Greens,
}

fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn numeric_column(table: &Table, column: &str) -> PipelineResult<Vec<f64>> {
    Ok(table
        .column_values(column)?
        .map(|v| v.as_f64().unwrap_or(0.0))
        .collect())
}

fn label_column(table: &Table, column: &str) -> PipelineResult<Vec<String>> {
    Ok(table.column_values(column)?.map(Value::to_string).collect())
}

fn min_max(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// One bar per row: `label_col` on the category axis, `value_col` as height.
pub fn bar_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    label_col: &str,
    value_col: &str,
    fill: Fill,
    horizontal: bool,
) -> PipelineResult<()> {
    let labels = label_column(table, label_col)?;
    let values = numeric_column(table, value_col)?;
    let (min, max) = min_max(&values);

    // Horizontal charts list the first row at the top.
    let n = values.len();
    let pos = |i: usize| if horizontal { (n - 1 - i) as f64 } else { i as f64 };

    let bars: Vec<Bar> = values
        .iter()
        .zip(&labels)
        .enumerate()
        .map(|(i, (&v, label))| {
            let color = match fill {
                Fill::Solid(c) => c,
                Fill::Greens => greens(v, min, max),
            };
            Bar::new(pos(i), v).name(label).fill(color).width(0.7)
        })
        .collect();

    let mut axis_labels = labels;
    if horizontal {
        axis_labels.reverse();
    }

    let mut chart = BarChart::new(bars).name(value_col);
    let mut plot = Plot::new(id)
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false);
    if horizontal {
        chart = chart.horizontal();
        plot = plot.y_axis_formatter(category_axis(axis_labels));
    } else {
        plot = plot.x_axis_formatter(category_axis(axis_labels));
    }
    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
    Ok(())
}

/// Share of each category in `value_col`, drawn as bars labelled with their
/// percentage.
pub fn share_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    label_col: &str,
    value_col: &str,
) -> PipelineResult<()> {
    let values = numeric_column(table, value_col)?;
    let total: f64 = values.iter().sum();
    let labels: Vec<String> = label_column(table, label_col)?
        .into_iter()
        .zip(&values)
        .map(|(l, &v)| format!("{l} ({:.1}%)", safe_ratio(v, total) * 100.0))
        .collect();
    let palette = [ACCENT, crate::color::ACCENT_DARK];

    let bars: Vec<Bar> = values
        .iter()
        .zip(&labels)
        .enumerate()
        .map(|(i, (&v, label))| {
            Bar::new(i as f64, safe_ratio(v, total) * 100.0)
                .name(label)
                .fill(palette[i % palette.len()])
                .width(0.7)
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars).name("share %")));
    Ok(())
}

/// Bars grouped by `category_col`, one coloured series per distinct
/// `series_col` value (long-form input).
pub fn grouped_bar_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    category_col: &str,
    series_col: &str,
    value_col: &str,
) -> PipelineResult<()> {
    let categories: Vec<Value> = table
        .distinct(category_col)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();
    let series: Vec<Value> = table
        .distinct(series_col)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();
    let colors = [ACCENT, crate::color::ACCENT_DARK];

    let cat_idx = table.column_index(category_col)?;
    let ser_idx = table.column_index(series_col)?;
    let val_idx = table.column_index(value_col)?;

    let width = 0.8 / series.len().max(1) as f64;
    let charts: Vec<BarChart> = series
        .iter()
        .enumerate()
        .map(|(s, name)| {
            let bars = table
                .rows()
                .iter()
                .filter(|r| &r[ser_idx] == name)
                .filter_map(|r| {
                    let c = categories.iter().position(|v| v == &r[cat_idx])?;
                    let x = c as f64 - 0.4 + width * (s as f64 + 0.5);
                    Some(Bar::new(x, r[val_idx].as_f64().unwrap_or(0.0)).width(width))
                })
                .collect();
            BarChart::new(bars)
                .name(name.to_string())
                .color(colors[s % colors.len()])
        })
        .collect();

    let labels = categories.iter().map(Value::to_string).collect();
    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
    Ok(())
}

/// One stacked bar per `category_col` value, a coloured segment per
/// `series_col` value (long-form input).
pub fn stacked_bar_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    category_col: &str,
    series_col: &str,
    value_col: &str,
) -> PipelineResult<()> {
    let cat_idx = table.column_index(category_col)?;
    let ser_idx = table.column_index(series_col)?;
    let val_idx = table.column_index(value_col)?;

    let mut cells: BTreeMap<(Value, Value), f64> = BTreeMap::new();
    for row in table.rows() {
        *cells
            .entry((row[cat_idx].clone(), row[ser_idx].clone()))
            .or_default() += row[val_idx].as_f64().unwrap_or(0.0);
    }
    let categories: Vec<Value> = table
        .distinct(category_col)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();
    let color_map = table.distinct(series_col).map(ColorMap::new);

    // Every series holds one bar per category so segments line up.
    let mut charts: Vec<BarChart> = Vec::new();
    for name in table.distinct(series_col).into_iter().flatten() {
        let bars = categories
            .iter()
            .enumerate()
            .map(|(i, cat)| {
                let v = cells.get(&(cat.clone(), name.clone())).copied().unwrap_or(0.0);
                Bar::new(i as f64, v).width(0.7)
            })
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(name.to_string())
            .color(color_map.as_ref().map_or(ACCENT, |cm| cm.color_for(name)))
            .stack_on(&below);
        charts.push(chart);
    }

    let labels = categories.iter().map(Value::to_string).collect();
    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .allow_drag(false)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
    Ok(())
}

// ---------------------------------------------------------------------------
// Line and bubble charts
// ---------------------------------------------------------------------------

/// `y_col` over the categorical `x_col`, one line per `series_col` value when
/// given.
pub fn line_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    x_col: &str,
    y_col: &str,
    series_col: Option<&str>,
) -> PipelineResult<()> {
    let xs: Vec<Value> = table
        .distinct(x_col)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();
    let x_idx = table.column_index(x_col)?;
    let y_idx = table.column_index(y_col)?;
    let s_idx = series_col.map(|c| table.column_index(c)).transpose()?;

    let mut series: BTreeMap<Value, Vec<[f64; 2]>> = BTreeMap::new();
    for row in table.rows() {
        let Some(x) = xs.iter().position(|v| v == &row[x_idx]) else {
            continue;
        };
        let key = s_idx.map_or(Value::from(y_col), |i| row[i].clone());
        series
            .entry(key)
            .or_default()
            .push([x as f64, row[y_idx].as_f64().unwrap_or(0.0)]);
    }

    let color_map = series_col
        .and_then(|c| table.distinct(c))
        .map(ColorMap::new);
    let labels = xs.iter().map(Value::to_string).collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            for (name, mut points) in series {
                points.sort_by(|a, b| a[0].total_cmp(&b[0]));
                let color = color_map
                    .as_ref()
                    .map_or(ACCENT, |cm| cm.color_for(&name));
                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(name.to_string())
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(Points::new(points).radius(3.0).color(color));
            }
        });
    Ok(())
}

/// Scatter of `x_col` against `y_col`, marker radius from `size_col`, one
/// colour per `series_col` value.
pub fn bubble_chart(
    ui: &mut Ui,
    id: &str,
    table: &Table,
    x_col: &str,
    y_col: &str,
    size_col: &str,
    series_col: &str,
) -> PipelineResult<()> {
    let xs = numeric_column(table, x_col)?;
    let ys = numeric_column(table, y_col)?;
    let sizes = numeric_column(table, size_col)?;
    let names: Vec<&Value> = table.column_values(series_col)?.collect();
    let (_, max_size) = min_max(&sizes);
    let color_map = table.distinct(series_col).map(ColorMap::new);

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(x_col)
        .y_axis_label(y_col)
        .show(ui, |plot_ui| {
            for i in 0..xs.len() {
                let radius = 3.0 + 15.0 * safe_ratio(sizes[i], max_size) as f32;
                let color = color_map
                    .as_ref()
                    .map_or(ACCENT, |cm| cm.color_for(names[i]));
                plot_ui.points(
                    Points::new(vec![[xs[i], ys[i]]])
                        .radius(radius)
                        .color(color)
                        .name(names[i].to_string()),
                );
            }
        });
    Ok(())
}
