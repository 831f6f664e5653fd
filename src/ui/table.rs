use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::greens;
use crate::data::model::{Table, Value};

// ---------------------------------------------------------------------------
// Result table widget
// ---------------------------------------------------------------------------

/// Render a pipeline result as a plain table. When `shade` names a numeric
/// column, its cells are tinted on the green scale.
pub fn result_table(ui: &mut Ui, id: &str, table: &Table, shade: Option<&str>) {
    let shade_idx = shade.and_then(|c| table.column_index(c).ok());
    let range = shade_idx.map(|i| {
        table
            .rows()
            .iter()
            .filter_map(|r| r[i].as_f64())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    });

    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(240.0)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(90.0), table.columns().len())
            .header(20.0, |mut header| {
                for col in table.columns() {
                    header.col(|ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|mut body| {
                for row in table.rows() {
                    body.row(18.0, |mut r| {
                        for (i, v) in row.iter().enumerate() {
                            r.col(|ui| {
                                let mut text = RichText::new(format_cell(v));
                                if let (Some(si), Some((lo, hi))) = (shade_idx, range) {
                                    if si == i {
                                        if let Some(n) = v.as_f64() {
                                            text = text.color(greens(n, lo, hi));
                                        }
                                    }
                                }
                                ui.label(text);
                            });
                        }
                    });
                }
            });
    });
}

/// Cell text: thousands separators for integers.
pub fn format_cell(v: &Value) -> String {
    match v {
        Value::Integer(i) => thousands(*i),
        other => other.to_string(),
    }
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(-1234567), "-1,234,567");
    }

    #[test]
    fn floats_keep_two_decimals() {
        assert_eq!(format_cell(&Value::Float(12.346)), "12.35");
        assert_eq!(format_cell(&Value::Missing), "<missing>");
    }
}
