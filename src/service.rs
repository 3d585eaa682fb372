//! Entity-level forecasting service.
//!
//! Wires a [`DataSource`] through the data cache, the orchestrator and the
//! forecast cache, and derives the reports built on top of forecasts: stock
//! recommendations, model comparisons and sales summaries.

use crate::cache::{DataCache, ForecastCache};
use crate::config::EngineConfig;
use crate::core::{DemandSeries, FallbackReason, Forecast, ForecastMethod};
use crate::data::{category_members, find_product, DataSource, Product, SalesRecord};
use crate::error::{ForecastError, Result};
use crate::models::BackendKind;
use crate::orchestrator::Orchestrator;
use crate::utils::mean;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// What a forecast is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "entity", content = "id")]
pub enum Entity {
    /// The whole catalog.
    General,
    Product(u32),
    Category(u32),
}

impl Entity {
    /// Identity of the trained model serving this entity.
    pub fn model_key(&self) -> String {
        match self {
            Entity::General => "general_sales".to_string(),
            Entity::Product(id) => format!("product_{}", id),
            Entity::Category(id) => format!("category_{}", id),
        }
    }

    /// Forecast-cache kind of this entity.
    pub fn cache_kind(&self) -> &'static str {
        match self {
            Entity::General => "ml_general_forecast",
            Entity::Product(_) => "ml_product_forecast",
            Entity::Category(_) => "ml_category_forecast",
        }
    }

    /// Forecast-cache target id.
    pub fn target(&self) -> String {
        match self {
            Entity::General => String::new(),
            Entity::Product(id) | Entity::Category(id) => id.to_string(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::General => write!(f, "all sales"),
            Entity::Product(id) => write!(f, "product {}", id),
            Entity::Category(id) => write!(f, "category {}", id),
        }
    }
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Raw model or fallback output.
    pub predicted: f64,
    /// Whole units, never below one.
    pub units: u64,
}

impl ForecastPoint {
    fn new(date: NaiveDate, predicted: f64) -> Self {
        Self {
            date,
            predicted,
            units: whole_units(predicted),
        }
    }
}

/// A forecast for one entity, as served to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityForecast {
    pub entity: Entity,
    /// Product or category label, when the catalog knows it.
    pub name: Option<String>,
    pub points: Vec<ForecastPoint>,
    pub method: ForecastMethod,
    /// Daily observations the forecast was computed from.
    pub history_points: usize,
}

impl EntityForecast {
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.predicted).sum()
    }
}

/// A forecast together with whether it came from the forecast cache.
#[derive(Debug, Clone)]
pub struct ForecastResponse {
    pub forecast: Arc<EntityForecast>,
    pub cached: bool,
}

/// Suggested stock level for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub product_id: u32,
    pub product_name: String,
    pub price: f64,
    /// Sum of the forecast horizon.
    pub predicted_demand: f64,
    /// `safety_days` times the mean daily sales.
    pub safety_stock: f64,
    pub recommended_stock: f64,
    pub estimated_cost: f64,
    pub average_daily_sales: f64,
    pub recent_30day_average: f64,
    /// Days the recommended stock lasts at the mean daily rate (0 without sales).
    pub turnover_days: f64,
    pub total_historical_sales: f64,
    pub data_points: usize,
    pub method: ForecastMethod,
}

/// One backend's forecast in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparedForecast {
    pub backend: BackendKind,
    pub points: Vec<ForecastPoint>,
    pub method: ForecastMethod,
}

/// Several backends forecasting the same recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub entity: Entity,
    pub history: Vec<(NaiveDate, f64)>,
    pub forecasts: Vec<ComparedForecast>,
}

/// Catalog-wide sales statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_quantity: f64,
    pub total_orders: usize,
    pub average_order_size: f64,
    pub average_daily_sales: f64,
    pub busiest_day: NaiveDate,
    pub busiest_day_quantity: f64,
    pub models_cached: usize,
}

/// A best-selling product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: u32,
    pub name: String,
    pub total_sold: f64,
    pub price: f64,
}

/// Sales within a closed date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_quantity: f64,
    pub total_orders: usize,
    pub daily: Vec<(NaiveDate, f64)>,
    pub top_products: Vec<TopProduct>,
}

/// Description of the active models and their fixed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub active_models: usize,
    pub cached_models: Vec<String>,
    /// When the most recently trained cached model was fitted.
    pub last_trained: Option<DateTime<Utc>>,
    pub backend: String,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub feature_window: usize,
    pub features: Vec<String>,
    pub alternatives: Vec<String>,
}

const TOP_IN_RANGE: usize = 5;
const RECENT_DAYS: usize = 30;

/// Forecasts and reports over one data source.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use demand_forecast::data::InMemorySource;
/// use demand_forecast::service::{Entity, ForecastService};
///
/// let source = Arc::new(InMemorySource::new("empty", Vec::new(), Vec::new()));
/// let service = ForecastService::with_defaults(source);
///
/// let response = service.forecast(Entity::General).unwrap();
/// assert!(!response.cached);
/// assert_eq!(response.forecast.points.len(), 7);
/// assert!(response.forecast.points.iter().all(|p| p.units == 10));
/// ```
pub struct ForecastService {
    config: EngineConfig,
    source: Arc<dyn DataSource>,
    data: DataCache,
    forecasts: ForecastCache<EntityForecast>,
    orchestrator: Orchestrator,
}

impl fmt::Debug for ForecastService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastService")
            .field("source", &self.source.id())
            .field("data", &self.data)
            .field("forecasts", &self.forecasts)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl ForecastService {
    /// Create a service after validating `config`.
    pub fn new(config: EngineConfig, source: Arc<dyn DataSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, source))
    }

    pub fn with_defaults(source: Arc<dyn DataSource>) -> Self {
        Self::build(EngineConfig::default(), source)
    }

    fn build(config: EngineConfig, source: Arc<dyn DataSource>) -> Self {
        Self {
            data: DataCache::new(&config.cache),
            forecasts: ForecastCache::new(&config.cache),
            orchestrator: Orchestrator::new(config.clone()),
            config,
            source,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Forecast the configured horizon for `entity`.
    ///
    /// Fails only with [`ForecastError::InvalidEntity`]; every data or model
    /// problem is answered with a fallback forecast. Results are cached unless
    /// the source returned no sales or a product or category was served
    /// without a catalog to validate it against.
    pub fn forecast(&self, entity: Entity) -> Result<ForecastResponse> {
        let kind = entity.cache_kind();
        let target = entity.target();
        if let Some(hit) = self.forecasts.get(kind, &target) {
            return Ok(ForecastResponse {
                forecast: hit,
                cached: true,
            });
        }

        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.sales_max_rows);
        let EntityHistory {
            name,
            series,
            validated,
        } = self.entity_series(entity, &sales)?;

        let forecast = self.orchestrator.forecast(
            &entity.model_key(),
            series.values(),
            self.config.service.horizon,
            BackendKind::TreeEnsemble,
        );
        info!(
            "forecast for {} via {} from {} days",
            entity,
            forecast.method().label(),
            series.len()
        );

        let result = EntityForecast {
            entity,
            name,
            points: dated_points(&forecast, &series),
            method: forecast.method().clone(),
            history_points: series.len(),
        };

        let forecast = if sales.is_empty() {
            debug!("source returned no sales, not caching forecast for {}", entity);
            Arc::new(result)
        } else if !validated {
            debug!("catalog unavailable, not caching forecast for {}", entity);
            Arc::new(result)
        } else {
            self.forecasts.insert(kind, &target, result)
        };
        Ok(ForecastResponse {
            forecast,
            cached: false,
        })
    }

    /// Recommend a stock level covering the forecast horizon plus safety stock.
    ///
    /// The product's name and price come from the catalog, so a catalog that
    /// cannot be loaded is reported as the load error rather than as an
    /// unknown product.
    pub fn recommend_stock(&self, product_id: u32) -> Result<StockRecommendation> {
        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.stock_sales_max_rows);
        let products = self.data.try_products(self.source.as_ref())?;
        let product = find_product(&products, product_id).ok_or_else(|| {
            ForecastError::InvalidEntity(format!("product {} not found", product_id))
        })?;

        let series =
            DemandSeries::from_records(sales.iter().filter(|r| r.product_id == product_id));
        let forecast = self.orchestrator.forecast(
            &format!("stock_{}", product_id),
            series.values(),
            self.config.service.horizon,
            BackendKind::TreeEnsemble,
        );

        let average = if series.is_empty() {
            0.0
        } else {
            mean(series.values())
        };
        let recent = if series.is_empty() {
            0.0
        } else {
            mean(series.tail_values(RECENT_DAYS))
        };

        let predicted_demand = forecast.total();
        let safety_stock = average * self.config.service.safety_days;
        let recommended_stock = predicted_demand + safety_stock;
        let turnover_days = if average > 0.0 {
            recommended_stock / average
        } else {
            0.0
        };

        Ok(StockRecommendation {
            product_id,
            product_name: product.name.clone(),
            price: product.price,
            predicted_demand,
            safety_stock,
            recommended_stock,
            estimated_cost: recommended_stock * product.price,
            average_daily_sales: average,
            recent_30day_average: recent,
            turnover_days,
            total_historical_sales: series.total(),
            data_points: series.len(),
            method: forecast.method().clone(),
        })
    }

    /// Forecast the recent history of `entity` with the tree ensemble,
    /// ARIMA(1,1,1) and the additive decomposition side by side.
    pub fn compare_models(&self, entity: Entity) -> Result<ModelComparison> {
        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.sales_max_rows);
        let series = self.entity_series(entity, &sales)?.series;
        let recent = series.tail(self.config.model.training_tail);
        let key = format!("compare_{}", entity.model_key());

        let forecasts = [
            BackendKind::TreeEnsemble,
            BackendKind::Arima,
            BackendKind::AdditiveDecomposition,
        ]
        .into_iter()
        .map(|backend| {
            let forecast = self.orchestrator.forecast(
                &key,
                recent.values(),
                self.config.service.horizon,
                backend,
            );
            ComparedForecast {
                backend,
                points: dated_points(&forecast, &recent),
                method: forecast.method().clone(),
            }
        })
        .collect();

        Ok(ModelComparison {
            entity,
            history: recent
                .dates()
                .iter()
                .copied()
                .zip(recent.values().iter().copied())
                .collect(),
            forecasts,
        })
    }

    /// Totals, averages and the busiest day over all loaded sales.
    pub fn sales_summary(&self) -> Result<SalesSummary> {
        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.analytics_max_rows);
        let series = DemandSeries::from_records(sales.iter());
        let (busiest_day, busiest_day_quantity) = series.peak().ok_or(ForecastError::EmptyData)?;

        let quantities: Vec<f64> = sales.iter().map(|r| r.quantity).collect();
        Ok(SalesSummary {
            total_quantity: quantities.iter().sum(),
            total_orders: sales.len(),
            average_order_size: mean(&quantities),
            average_daily_sales: mean(series.values()),
            busiest_day,
            busiest_day_quantity,
            models_cached: self.orchestrator.models().len(),
        })
    }

    /// The `limit` best-selling products by total quantity.
    pub fn top_products(&self, limit: usize) -> Result<Vec<TopProduct>> {
        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.analytics_max_rows);
        let products = self.data.products(self.source.as_ref());
        if sales.is_empty() || products.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        Ok(rank_products(sales.iter(), &products, limit))
    }

    /// Sales between `start` and `end`, both inclusive.
    pub fn sales_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<RangeSummary> {
        if end < start {
            return Err(ForecastError::InvalidParameter(format!(
                "range end {} precedes start {}",
                end, start
            )));
        }

        let sales = self
            .data
            .sales(self.source.as_ref(), self.config.service.analytics_max_rows);
        let products = self.data.products(self.source.as_ref());
        let in_range: Vec<&SalesRecord> = sales
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();
        if in_range.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let daily = DemandSeries::from_records(in_range.iter().copied());
        Ok(RangeSummary {
            start,
            end,
            total_quantity: in_range.iter().map(|r| r.quantity).sum(),
            total_orders: in_range.len(),
            daily: daily
                .dates()
                .iter()
                .copied()
                .zip(daily.values().iter().copied())
                .collect(),
            top_products: rank_products(in_range.iter().copied(), &products, TOP_IN_RANGE),
        })
    }

    /// The cached models and the parameters they were trained with.
    pub fn model_report(&self) -> ModelReport {
        let model = &self.config.model;
        let entries = self.orchestrator.models().entries();
        let cached_models: Vec<String> = entries.iter().map(|e| e.key().to_string()).collect();

        let mut features: Vec<String> = (1..=model.window)
            .map(|lag| format!("lag_{}", lag))
            .collect();
        features.extend(["mean", "std", "max", "min", "trend"].iter().map(|s| s.to_string()));

        ModelReport {
            active_models: cached_models.len(),
            cached_models,
            last_trained: entries.iter().map(|e| e.trained_at()).max(),
            backend: BackendKind::TreeEnsemble.name().to_string(),
            n_estimators: model.ensemble.n_estimators,
            max_depth: model.ensemble.max_depth,
            feature_window: model.window,
            features,
            alternatives: [BackendKind::Arima, BackendKind::AdditiveDecomposition]
                .iter()
                .map(|k| k.name().to_string())
                .chain(std::iter::once("RecentAverage".to_string()))
                .collect(),
        }
    }

    /// Drop one trained model so the next request retrains it.
    pub fn invalidate_model(&self, model_key: &str) -> bool {
        let removed = self.orchestrator.models().invalidate(model_key);
        if removed {
            info!("invalidated model '{}'", model_key);
        }
        removed
    }

    /// Empty every cache layer.
    pub fn clear_caches(&self) {
        self.data.clear();
        self.forecasts.clear();
        self.orchestrator.models().clear();
        info!("cleared data, forecast and model caches");
    }

    /// Catalog label and daily series for an entity.
    ///
    /// Validation needs a catalog; when none could be loaded the entity is
    /// served unnamed and marked unvalidated.
    fn entity_series(&self, entity: Entity, sales: &[SalesRecord]) -> Result<EntityHistory> {
        match entity {
            Entity::General => Ok(EntityHistory::validated(
                None,
                DemandSeries::from_records(sales),
            )),
            Entity::Product(id) => {
                let series = product_series(sales, id);
                let Ok(products) = self.data.try_products(self.source.as_ref()) else {
                    return Ok(EntityHistory::unvalidated(series));
                };
                let product = find_product(&products, id).ok_or_else(|| {
                    ForecastError::InvalidEntity(format!("product {} not found", id))
                })?;
                Ok(EntityHistory::validated(Some(product.name.clone()), series))
            }
            Entity::Category(id) => {
                let Ok(products) = self.data.try_products(self.source.as_ref()) else {
                    return Ok(EntityHistory::unvalidated(DemandSeries::empty()));
                };
                let members: HashSet<u32> = category_members(&products, id).into_iter().collect();
                if members.is_empty() {
                    return Err(ForecastError::InvalidEntity(format!(
                        "category {} has no products",
                        id
                    )));
                }
                let series = DemandSeries::from_records(
                    sales.iter().filter(|r| members.contains(&r.product_id)),
                );
                Ok(EntityHistory::validated(Some(format!("Category {}", id)), series))
            }
        }
    }
}

/// The history an entity forecast is computed from.
struct EntityHistory {
    name: Option<String>,
    series: DemandSeries,
    /// Whether the entity was checked against a loaded catalog.
    validated: bool,
}

impl EntityHistory {
    fn validated(name: Option<String>, series: DemandSeries) -> Self {
        Self {
            name,
            series,
            validated: true,
        }
    }

    fn unvalidated(series: DemandSeries) -> Self {
        Self {
            name: None,
            series,
            validated: false,
        }
    }
}

fn product_series(sales: &[SalesRecord], id: u32) -> DemandSeries {
    DemandSeries::from_records(sales.iter().filter(|r| r.product_id == id))
}

/// Whole units for a prediction: floor, never below one.
fn whole_units(predicted: f64) -> u64 {
    if predicted.is_finite() {
        predicted.floor().max(1.0) as u64
    } else {
        1
    }
}

/// Forecast points dated from the day after the last observation, or from
/// tomorrow when there is no history.
fn dated_points(forecast: &Forecast, series: &DemandSeries) -> Vec<ForecastPoint> {
    let last = series
        .last_date()
        .unwrap_or_else(|| Utc::now().date_naive());
    forecast
        .dated(last)
        .into_iter()
        .map(|(date, predicted)| ForecastPoint::new(date, predicted))
        .collect()
}

/// Rank products by total quantity and join the top `limit` with the catalog.
fn rank_products<'a, I>(sales: I, products: &[Product], limit: usize) -> Vec<TopProduct>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut totals: HashMap<u32, f64> = HashMap::new();
    for record in sales {
        *totals.entry(record.product_id).or_insert(0.0) += record.quantity;
    }

    let mut ranked: Vec<(u32, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    ranked
        .into_iter()
        .take(limit)
        .filter_map(|(id, total)| {
            find_product(products, id).map(|p| TopProduct {
                product_id: id,
                name: p.name.clone(),
                total_sold: total,
                price: p.price,
            })
        })
        .collect()
}

/// Whether a forecast was served without any history.
pub fn is_no_data(method: &ForecastMethod) -> bool {
    matches!(
        method,
        ForecastMethod::Fallback {
            reason: FallbackReason::NoData
        }
    )
}
