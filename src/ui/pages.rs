use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::color::ACCENT;
use crate::config::THRESHOLD_RANGE;
use crate::data::campaign::{self, SortOrder};
use crate::data::classify::MARKET_SIGNAL_COLUMN;
use crate::data::error::{PipelineError, PipelineResult};
use crate::data::model::Value;
use crate::data::streaming::{self, EngagementMetric};
use crate::state::AppState;
use crate::ui::plot::{self, Fill};
use crate::ui::table::{format_cell, result_table, thousands};

// ---------------------------------------------------------------------------
// Shared widgets
// ---------------------------------------------------------------------------

fn no_dataset(ui: &mut Ui, what: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading(format!("Open the {what} table to begin  (File → Open…)"));
    });
}

/// Empty-state or error line for a section that could not be built.
fn show_result(ui: &mut Ui, result: PipelineResult<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_no_data() => {
            ui.label(RichText::new("No data for the current selection.").italics());
        }
        Err(e) => {
            ui.label(RichText::new(format!("Error: {e}")).color(Color32::RED));
        }
    }
}

fn metric_tile(ui: &mut Ui, title: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.label(RichText::new(title).small());
        ui.heading(RichText::new(value).color(ACCENT));
    });
}

fn scalar_text(v: &PipelineResult<f64>, suffix: &str) -> String {
    match v {
        Ok(n) => format!("{n:.1}{suffix}"),
        Err(_) => "—".to_string(),
    }
}

fn total_text(v: &Value) -> String {
    match v {
        Value::Float(f) => thousands(f.round() as i64),
        other => format_cell(other),
    }
}

/// Single-choice drop-down over a column's distinct values.
fn choice_combo(
    ui: &mut Ui,
    id: &str,
    label: &str,
    current: &mut Option<Value>,
    options: Option<&BTreeSet<Value>>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        let selected = current.as_ref().map(Value::to_string).unwrap_or_default();
        egui::ComboBox::from_id_salt(id)
            .selected_text(selected)
            .show_ui(ui, |ui: &mut Ui| {
                for v in options.into_iter().flatten().filter(|v| !v.is_missing()) {
                    let is_current = current.as_ref() == Some(v);
                    if ui.selectable_label(is_current, v.to_string()).clicked() {
                        *current = Some(v.clone());
                    }
                }
            });
    });
}

fn require_choice<'a>(choice: &'a Option<Value>, what: &str) -> PipelineResult<&'a Value> {
    choice
        .as_ref()
        .ok_or_else(|| PipelineError::no_data(what.to_string()))
}

// ---------------------------------------------------------------------------
// Streaming performance
// ---------------------------------------------------------------------------

pub fn streaming_page(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        filtered_streaming,
        streaming_controls: controls,
        config,
        ..
    } = state;
    let Some(df) = filtered_streaming.as_ref() else {
        no_dataset(ui, "streaming");
        return;
    };

    ui.heading("Streaming Performance");
    ui.label(RichText::new("Content, regions and user segments").small());
    ui.add_space(6.0);

    // ---- KPIs ----
    match streaming::kpis(df) {
        Ok(k) => {
            ui.columns(4, |cols: &mut [Ui]| {
                metric_tile(&mut cols[0], "Total Streams", total_text(&k.total_streams));
                metric_tile(&mut cols[1], "Active Listeners", total_text(&k.active_listeners));
                let top = k
                    .top_artist
                    .as_ref()
                    .map_or_else(|_| "—".to_string(), Value::to_string);
                metric_tile(&mut cols[2], "Top Artist", top);
                metric_tile(
                    &mut cols[3],
                    "Premium Share (%)",
                    format!("{:.1}", k.premium_share_pct),
                );
            });
            if let Err(e) = k.top_artist {
                show_result(ui, Err(e));
            }
        }
        Err(e) => show_result(ui, Err(e)),
    }
    ui.separator();

    // ---- Top artists ----
    ui.strong("Top Artists by Streams");
    ui.add(
        egui::Slider::new(
            &mut controls.artist_limit,
            config.artist_limit_min..=config.artist_limit_max,
        )
        .text("Number of Artists"),
    );
    let r = streaming::top_artists(df, controls.artist_limit).and_then(|t| {
        plot::bar_chart(
            ui,
            "top_artists",
            &t,
            streaming::ARTIST_NAME,
            streaming::STREAMS,
            Fill::Solid(ACCENT),
            true,
        )
    });
    show_result(ui, r);
    ui.separator();

    // ---- Genre by region ----
    ui.strong("Streams by Genre & Region");
    let r = streaming::genre_by_region(df).and_then(|t| {
        plot::stacked_bar_chart(ui, "genre_by_region", &t, streaming::REGION, streaming::GENRE, streaming::STREAMS)
    });
    show_result(ui, r);
    ui.separator();

    // ---- Genre mix in one region ----
    ui.strong("Genre Mix by Focus Region");
    choice_combo(
        ui,
        "focus_region",
        "Focus Region",
        &mut controls.focus_region,
        df.distinct(streaming::REGION),
    );
    let r = require_choice(&controls.focus_region, "focus region")
        .and_then(|region| streaming::genre_for_region(df, region))
        .and_then(|t| {
            plot::bar_chart(ui, "genre_region", &t, streaming::GENRE, streaming::STREAMS, Fill::Greens, false)
        });
    show_result(ui, r);
    ui.separator();

    // ---- Free vs premium in one genre ----
    ui.strong("Free vs Premium Streams by Genre");
    choice_combo(
        ui,
        "split_genre",
        "Select Genre",
        &mut controls.split_genre,
        df.distinct(streaming::GENRE),
    );
    let r = require_choice(&controls.split_genre, "genre")
        .and_then(|genre| streaming::subscription_split_for_genre(df, genre))
        .and_then(|t| {
            plot::bar_chart(
                ui,
                "split_genre",
                &t,
                streaming::SUBSCRIPTION_TYPE,
                streaming::STREAMS,
                Fill::Solid(ACCENT),
                false,
            )
        });
    show_result(ui, r);
    ui.separator();

    // ---- Genre adoption by market ----
    ui.strong("Global Streams by Market (Genre Focus)");
    choice_combo(
        ui,
        "map_genre",
        "Genre",
        &mut controls.map_genre,
        df.distinct(streaming::GENRE),
    );
    let r = require_choice(&controls.map_genre, "map genre")
        .and_then(|genre| streaming::genre_map(df, genre))
        .and_then(|t| {
            let t = crate::data::aggregate::sort_by(&t, streaming::STREAMS, true)?;
            result_table(ui, "genre_map", &t, Some(streaming::STREAMS));
            let high = t
                .column_values(MARKET_SIGNAL_COLUMN)?
                .filter(|v| v.as_str().is_some_and(|s| s.starts_with("High")))
                .count();
            ui.label(format!("{high} high-adoption market(s)"));
            Ok(())
        });
    show_result(ui, r);
    ui.separator();

    // ---- Country drill-down ----
    ui.strong("Country-level Top Artist Drill-down");
    choice_combo(
        ui,
        "drill_country",
        "Select Country",
        &mut controls.drill_country,
        df.distinct(streaming::COUNTRY),
    );
    let r = require_choice(&controls.drill_country, "country")
        .and_then(|country| streaming::country_drilldown(df, country, config.drilldown_limit))
        .and_then(|t| {
            plot::bar_chart(
                ui,
                "drilldown",
                &t,
                streaming::ARTIST_NAME,
                streaming::STREAMS,
                Fill::Solid(ACCENT),
                false,
            )
        });
    show_result(ui, r);
    ui.separator();

    // ---- Monthly trend ----
    ui.strong("Monthly Streams Trend");
    choice_combo(
        ui,
        "trend_subscription",
        "Subscription Type",
        &mut controls.trend_subscription,
        df.distinct(streaming::SUBSCRIPTION_TYPE),
    );
    let r = require_choice(&controls.trend_subscription, "subscription type")
        .and_then(|sub| streaming::monthly_trend(df, sub))
        .and_then(|t| plot::line_chart(ui, "monthly_trend", &t, streaming::MONTH, streaming::STREAMS, None));
    show_result(ui, r);
    ui.separator();

    // ---- Free vs premium ----
    ui.strong("Free vs Premium Engagement");
    let r = streaming::subscription_split(df).and_then(|t| {
        plot::share_chart(ui, "subscription_split", &t, streaming::SUBSCRIPTION_TYPE, streaming::STREAMS)
    });
    show_result(ui, r);
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Metric");
        for m in EngagementMetric::ALL {
            ui.radio_value(&mut controls.engagement, m, m.column());
        }
    });
    let metric = controls.engagement;
    let r = streaming::engagement(df, metric).and_then(|t| {
        plot::bar_chart(
            ui,
            "engagement",
            &t,
            streaming::SUBSCRIPTION_TYPE,
            metric.column(),
            Fill::Solid(crate::color::ACCENT_DARK),
            false,
        )
    });
    show_result(ui, r);
}

// ---------------------------------------------------------------------------
// Marketing campaign impact
// ---------------------------------------------------------------------------

pub fn campaign_page(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        filtered_campaigns,
        campaign_controls: controls,
        ..
    } = state;
    let Some(cdf) = filtered_campaigns.as_ref() else {
        no_dataset(ui, "campaign");
        return;
    };

    ui.heading("Marketing Campaign Impact");
    ui.add_space(6.0);

    // ---- KPIs ----
    match campaign::kpis(cdf) {
        Ok(k) => {
            ui.columns(3, |cols: &mut [Ui]| {
                metric_tile(&mut cols[0], "Total Net User Gain", total_text(&k.net_user_gain));
                metric_tile(
                    &mut cols[1],
                    "Avg User Growth %",
                    scalar_text(&k.avg_user_growth_pct, "%"),
                );
                metric_tile(
                    &mut cols[2],
                    "Avg Premium Growth %",
                    scalar_text(&k.avg_premium_growth_pct, "%"),
                );
            });
            if let Err(e) = k.avg_user_growth_pct {
                show_result(ui, Err(e));
            }
        }
        Err(e) => show_result(ui, Err(e)),
    }
    ui.separator();

    // ---- Net gain by campaign ----
    ui.strong("Net User Gain by Campaign");
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Sort by");
        for order in [SortOrder::HighestFirst, SortOrder::LowestFirst] {
            ui.radio_value(&mut controls.sort_order, order, order.label());
        }
    });
    let r = campaign::net_gain_by_campaign(cdf, controls.sort_order).and_then(|t| {
        plot::bar_chart(ui, "net_gain", &t, campaign::CAMPAIGN_NAME, campaign::NET_USER_GAIN, Fill::Greens, false)
    });
    show_result(ui, r);
    ui.separator();

    // ---- Growth vs premium ----
    ui.strong("Campaign User Growth vs Premium Growth");
    ui.add(
        egui::Slider::new(&mut controls.user_growth_threshold, THRESHOLD_RANGE)
            .text("User Growth Threshold (%)"),
    );
    ui.add(
        egui::Slider::new(&mut controls.premium_growth_threshold, THRESHOLD_RANGE)
            .text("Premium Growth Threshold (%)"),
    );
    let r = campaign::growth_comparison_long(cdf).and_then(|t| {
        plot::grouped_bar_chart(ui, "growth", &t, campaign::CAMPAIGN_NAME, campaign::METRIC, campaign::GROWTH)
    });
    show_result(ui, r);
    let r = campaign::scale_candidates(
        cdf,
        controls.user_growth_threshold,
        controls.premium_growth_threshold,
    )
    .map(|t| {
        let names: Vec<String> = t
            .column_values(campaign::CAMPAIGN_NAME)
            .map(|it| it.map(Value::to_string).collect())
            .unwrap_or_default();
        if names.is_empty() {
            ui.label("No campaign clears both thresholds.");
        } else {
            ui.label(format!("Scale candidates: {}", names.join(", ")));
        }
    });
    show_result(ui, r);
    ui.separator();

    // ---- Monthly gain ----
    ui.strong("Net User Gain Trend by Campaign");
    let r = campaign::monthly_gain(cdf).and_then(|t| {
        plot::line_chart(
            ui,
            "monthly_gain",
            &t,
            campaign::MONTH,
            campaign::NET_USER_GAIN,
            Some(campaign::CAMPAIGN_NAME),
        )
    });
    show_result(ui, r);
    ui.separator();

    // ---- Gain by genre ----
    ui.strong("User Growth by Target Genre");
    let r = campaign::gain_by_genre(cdf).and_then(|t| {
        plot::bar_chart(ui, "gain_genre", &t, campaign::TARGET_GENRE, campaign::NET_USER_GAIN, Fill::Greens, false)
    });
    show_result(ui, r);
    ui.separator();

    // ---- Premium ranking ----
    ui.strong("Premium Conversion Effectiveness (Ranking)");
    let r = campaign::premium_ranking(cdf).and_then(|t| {
        plot::bar_chart(
            ui,
            "premium_rank",
            &t,
            campaign::CAMPAIGN_NAME,
            campaign::PREMIUM_GROWTH_PCT,
            Fill::Greens,
            false,
        )
    });
    show_result(ui, r);
    ui.separator();

    // ---- Premium uplift ----
    ui.strong("Premium Conversion Impact");
    let r = campaign::premium_uplift(cdf).and_then(|t| {
        plot::bubble_chart(
            ui,
            "uplift",
            &t,
            campaign::USER_GROWTH_PCT,
            campaign::PREMIUM_GROWTH_PCT,
            campaign::ABS_USER_GAIN,
            campaign::CAMPAIGN_NAME,
        )
    });
    show_result(ui, r);
}
