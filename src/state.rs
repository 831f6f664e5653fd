use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::DashboardConfig;
use crate::data::campaign::{self, SortOrder};
use crate::data::filter::{filter, init_constraints, Constraints};
use crate::data::loader::{Dataset, TableCache};
use crate::data::model::{Table, Value};
use crate::data::streaming::{self, EngagementMetric};

// ---------------------------------------------------------------------------
// Pages and per-page controls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Streaming,
    Campaigns,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Streaming, Page::Campaigns];

    pub fn label(&self) -> &'static str {
        match self {
            Page::Streaming => "🎵 Streaming Performance",
            Page::Campaigns => "📣 Marketing Campaign Impact",
        }
    }

    pub fn dataset(&self) -> Dataset {
        match self {
            Page::Streaming => Dataset::Streaming,
            Page::Campaigns => Dataset::Campaigns,
        }
    }
}

/// Visual-local selectors of the streaming page.
#[derive(Debug, Clone, Default)]
pub struct StreamingControls {
    pub artist_limit: usize,
    pub focus_region: Option<Value>,
    pub trend_subscription: Option<Value>,
    pub engagement: EngagementMetric,
    pub map_genre: Option<Value>,
    pub split_genre: Option<Value>,
    pub drill_country: Option<Value>,
}

/// Visual-local selectors of the campaign page.
#[derive(Debug, Clone, Default)]
pub struct CampaignControls {
    pub sort_order: SortOrder,
    pub user_growth_threshold: f64,
    pub premium_growth_threshold: f64,
}

/// Keep a single-choice selector pointing at an available option: the current
/// choice if still offered, otherwise the first option.
pub fn ensure_choice(current: &mut Option<Value>, options: Option<&BTreeSet<Value>>) {
    let Some(options) = options else {
        *current = None;
        return;
    };
    let still_valid = current.as_ref().is_some_and(|c| options.contains(c));
    if !still_valid {
        *current = options.iter().find(|v| !v.is_missing()).cloned();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. The pipeline never reads it;
/// it only receives the values stored here as parameters.
pub struct AppState {
    pub config: DashboardConfig,
    pub page: Page,

    /// Source tables, immutable once loaded.
    pub streaming: Option<Arc<Table>>,
    pub campaigns: Option<Arc<Table>>,

    /// Sidebar constraint sets.
    pub streaming_filters: Constraints,
    pub campaign_filters: Constraints,

    /// Source tables narrowed by the sidebar (cached).
    pub filtered_streaming: Option<Table>,
    pub filtered_campaigns: Option<Table>,

    pub streaming_controls: StreamingControls,
    pub campaign_controls: CampaignControls,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    cache: TableCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let streaming_controls = StreamingControls {
            artist_limit: config.artist_limit,
            ..Default::default()
        };
        let campaign_controls = CampaignControls {
            sort_order: SortOrder::default(),
            user_growth_threshold: config.user_growth_threshold,
            premium_growth_threshold: config.premium_growth_threshold,
        };
        Self {
            config,
            page: Page::default(),
            streaming: None,
            campaigns: None,
            streaming_filters: Constraints::new(),
            campaign_filters: Constraints::new(),
            filtered_streaming: None,
            filtered_campaigns: None,
            streaming_controls,
            campaign_controls,
            status_message: None,
            cache: TableCache::default(),
        }
    }

    /// Load (or fetch from cache) a dataset and make it current.
    pub fn load(&mut self, dataset: Dataset, path: &Path) -> Result<()> {
        let table = self.cache.get_or_load(dataset, path)?;
        self.set_table(dataset, table);
        self.status_message = None;
        Ok(())
    }

    /// Ingest a loaded table: every filter starts fully selected.
    pub fn set_table(&mut self, dataset: Dataset, table: Arc<Table>) {
        match dataset {
            Dataset::Streaming => {
                self.streaming_filters = init_constraints(&table, &streaming::FILTER_COLUMNS);
                self.streaming = Some(table);
            }
            Dataset::Campaigns => {
                self.campaign_filters = init_constraints(&table, &campaign::FILTER_COLUMNS);
                self.campaigns = Some(table);
            }
        }
        self.refilter(dataset);
    }

    pub fn source(&self, dataset: Dataset) -> Option<&Arc<Table>> {
        match dataset {
            Dataset::Streaming => self.streaming.as_ref(),
            Dataset::Campaigns => self.campaigns.as_ref(),
        }
    }

    pub fn filters(&self, dataset: Dataset) -> &Constraints {
        match dataset {
            Dataset::Streaming => &self.streaming_filters,
            Dataset::Campaigns => &self.campaign_filters,
        }
    }

    pub fn filters_mut(&mut self, dataset: Dataset) -> &mut Constraints {
        match dataset {
            Dataset::Streaming => &mut self.streaming_filters,
            Dataset::Campaigns => &mut self.campaign_filters,
        }
    }

    pub fn filtered(&self, dataset: Dataset) -> Option<&Table> {
        match dataset {
            Dataset::Streaming => self.filtered_streaming.as_ref(),
            Dataset::Campaigns => self.filtered_campaigns.as_ref(),
        }
    }

    /// Recompute the filtered view after a filter change.
    pub fn refilter(&mut self, dataset: Dataset) {
        let Some(source) = self.source(dataset) else {
            return;
        };
        let view = match filter(source, self.filters(dataset)) {
            Ok(t) => Some(t),
            Err(e) => {
                log::error!("Filtering {dataset} failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                None
            }
        };
        match dataset {
            Dataset::Streaming => {
                self.filtered_streaming = view;
                self.sync_streaming_choices();
            }
            Dataset::Campaigns => self.filtered_campaigns = view,
        }
    }

    /// Point every single-choice selector at something the filtered view
    /// still contains.
    fn sync_streaming_choices(&mut self) {
        let view = self.filtered_streaming.as_ref();
        let c = &mut self.streaming_controls;
        ensure_choice(&mut c.focus_region, view.and_then(|t| t.distinct(streaming::REGION)));
        ensure_choice(
            &mut c.trend_subscription,
            view.and_then(|t| t.distinct(streaming::SUBSCRIPTION_TYPE)),
        );
        ensure_choice(&mut c.map_genre, view.and_then(|t| t.distinct(streaming::GENRE)));
        ensure_choice(&mut c.split_genre, view.and_then(|t| t.distinct(streaming::GENRE)));
        ensure_choice(&mut c.drill_country, view.and_then(|t| t.distinct(streaming::COUNTRY)));
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, dataset: Dataset, column: &str, value: &Value) {
        let selected = self.filters_mut(dataset).entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.refilter(dataset);
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, dataset: Dataset, column: &str) {
        let all = self
            .source(dataset)
            .and_then(|t| t.distinct(column))
            .cloned();
        if let Some(all_vals) = all {
            self.filters_mut(dataset).insert(column.to_string(), all_vals);
            self.refilter(dataset);
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, dataset: Dataset, column: &str) {
        self.filters_mut(dataset)
            .insert(column.to_string(), BTreeSet::new());
        self.refilter(dataset);
    }
}
