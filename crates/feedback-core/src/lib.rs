#![deny(warnings)]

//! Core value objects for the round-feedback engine.
//!
//! This crate defines the serializable snapshots a round-closing job hands to
//! the engine, the result it gets back, and validation helpers callers run
//! before invoking the engine.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Computed KPIs for one team in one round.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    /// Gross revenue in BRL.
    pub revenue: f64,
    /// Net profit in BRL (negative for a loss).
    pub profit: f64,
    /// Profit margin in percent (e.g. 16.0 = 16%).
    pub margin: f64,
    /// Market share in percent.
    pub market_share: f64,
    /// Return on investment in percent.
    pub roi: f64,
    /// Brand perception index in percent.
    pub brand_perception: f64,
    /// Customer satisfaction index in percent.
    pub customer_satisfaction: f64,
    /// Total costs in BRL.
    pub costs: f64,
}

/// One of the six levers a round outcome is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKey {
    Price,
    Product,
    Place,
    Promo,
    Competitor,
    Event,
}

impl EffectKey {
    /// Key under which the breakdown's `explanations` map stores this effect.
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKey::Price => "priceEffect",
            EffectKey::Product => "productEffect",
            EffectKey::Place => "placeEffect",
            EffectKey::Promo => "promoEffect",
            EffectKey::Competitor => "competitorEffect",
            EffectKey::Event => "eventEffect",
        }
    }

    /// Human-readable lever name used in narrative bullets.
    pub fn label(self) -> &'static str {
        match self {
            EffectKey::Price => "Price",
            EffectKey::Product => "Product",
            EffectKey::Place => "Distribution",
            EffectKey::Promo => "Promotion",
            EffectKey::Competitor => "Competition",
            EffectKey::Event => "Market events",
        }
    }
}

/// Attribution of a round's outcome to marketing-mix levers.
///
/// Effects are fractional multipliers: `0.05` means +5%. A missing effect is
/// read as zero, but an explicit `0.0` is still a present value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationBreakdown {
    #[serde(default)]
    pub price_effect: Option<f64>,
    #[serde(default)]
    pub product_effect: Option<f64>,
    #[serde(default)]
    pub place_effect: Option<f64>,
    #[serde(default)]
    pub promo_effect: Option<f64>,
    #[serde(default)]
    pub competitor_effect: Option<f64>,
    #[serde(default)]
    pub event_effect: Option<f64>,
    /// Free-text explanation per effect key (`"priceEffect"`, ...).
    #[serde(default)]
    pub explanations: HashMap<String, String>,
}

impl SimulationBreakdown {
    /// Value of one effect, defaulting to zero when absent.
    pub fn effect(&self, key: EffectKey) -> f64 {
        let v = match key {
            EffectKey::Price => self.price_effect,
            EffectKey::Product => self.product_effect,
            EffectKey::Place => self.place_effect,
            EffectKey::Promo => self.promo_effect,
            EffectKey::Competitor => self.competitor_effect,
            EffectKey::Event => self.event_effect,
        };
        v.unwrap_or(0.0)
    }

    /// All six effects in fixed order: price, product, place, promo, competitor, event.
    pub fn effects(&self) -> [(EffectKey, f64); 6] {
        [
            EffectKey::Price,
            EffectKey::Product,
            EffectKey::Place,
            EffectKey::Promo,
            EffectKey::Competitor,
            EffectKey::Event,
        ]
        .map(|k| (k, self.effect(k)))
    }

    pub fn explanation(&self, key: EffectKey) -> Option<&str> {
        self.explanations.get(key.as_str()).map(String::as_str)
    }
}

/// How hard rival teams pushed back this round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionLevel {
    Passive,
    Moderate,
    Aggressive,
}

/// Rival teams' reaction this round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResponse {
    pub reaction_level: ReactionLevel,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// One active market event's effect. Multipliers are ratios around 1.0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventImpact {
    pub event_type: String,
    pub event_title: String,
    #[serde(default)]
    pub revenue_multiplier: Option<f64>,
    #[serde(default)]
    pub cost_multiplier: Option<f64>,
    #[serde(default)]
    pub demand_multiplier: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// The team's submitted 4Ps decisions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingDecision {
    pub price: f64,
    /// Budget per promotion channel in BRL.
    #[serde(default)]
    pub promotion_budgets: BTreeMap<String, f64>,
    #[serde(default)]
    pub distribution_channels: Vec<String>,
    #[serde(default)]
    pub product_quality: Option<String>,
}

impl MarketingDecision {
    pub fn total_promotion_budget(&self) -> f64 {
        self.promotion_budgets.values().sum()
    }
}

/// Everything the engine needs for one team in one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    #[serde(default)]
    pub previous_result: Option<RoundResult>,
    pub current_result: RoundResult,
    #[serde(default)]
    pub decisions: Option<MarketingDecision>,
    #[serde(default)]
    pub simulation_breakdown: Option<SimulationBreakdown>,
    #[serde(default)]
    pub competitor_response: Option<CompetitorResponse>,
    #[serde(default)]
    pub event_impacts: Vec<EventImpact>,
    /// 1-based round number.
    pub round_number: u32,
    #[serde(default)]
    pub team_name: Option<String>,
}

impl FeedbackInput {
    /// Input with only the current result; all collaborators absent.
    pub fn new(current_result: RoundResult, round_number: u32) -> Self {
        Self {
            previous_result: None,
            current_result,
            decisions: None,
            simulation_breakdown: None,
            competitor_response: None,
            event_impacts: Vec::new(),
            round_number,
            team_name: None,
        }
    }

    pub fn with_previous(mut self, previous: RoundResult) -> Self {
        self.previous_result = Some(previous);
        self
    }

    pub fn with_breakdown(mut self, breakdown: SimulationBreakdown) -> Self {
        self.simulation_breakdown = Some(breakdown);
        self
    }

    pub fn with_competitor(mut self, competitor: CompetitorResponse) -> Self {
        self.competitor_response = Some(competitor);
        self
    }

    pub fn with_events(mut self, events: Vec<EventImpact>) -> Self {
        self.event_impacts = events;
        self
    }

    pub fn with_team(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }
}

/// Closed set of marketing-mix areas a recommendation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketingArea {
    #[serde(rename = "Produto")]
    Product,
    #[serde(rename = "Preço")]
    Price,
    #[serde(rename = "Praça")]
    Place,
    #[serde(rename = "Promoção")]
    Promotion,
}

impl MarketingArea {
    pub const ALL: [MarketingArea; 4] = [
        MarketingArea::Product,
        MarketingArea::Price,
        MarketingArea::Place,
        MarketingArea::Promotion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MarketingArea::Product => "Produto",
            MarketingArea::Price => "Preço",
            MarketingArea::Place => "Praça",
            MarketingArea::Promotion => "Promoção",
        }
    }
}

impl fmt::Display for MarketingArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One actionable suggestion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecommendation {
    pub area: MarketingArea,
    /// Imperative sentence.
    pub action: String,
    /// Why, tied to the numbers that triggered it.
    pub rationale: String,
    /// Cost of following the advice versus ignoring it.
    pub tradeoff: String,
}

/// Tag identifying which generator produced a feedback object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVersion {
    V1Deterministic,
    V2Deterministic,
    FallbackDeterministic,
}

impl EngineVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineVersion::V1Deterministic => "v1_deterministic",
            EngineVersion::V2Deterministic => "v2_deterministic",
            EngineVersion::FallbackDeterministic => "fallback_deterministic",
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of one engine invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFeedback {
    pub summary: String,
    pub what_happened: Vec<String>,
    pub why_it_happened: Vec<String>,
    /// At most four, one per area.
    pub recommendations: Vec<FeedbackRecommendation>,
    /// ISO-8601 UTC timestamp, millisecond precision.
    pub generated_at: String,
    pub engine_version: EngineVersion,
}

/// Validation errors for engine inputs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite value in field `{field}`")]
    NonFinite { field: &'static str },
    /// Rounds are numbered from 1.
    #[error("round number {0} is out of range, rounds start at 1")]
    RoundOutOfRange(u32),
}

fn finite(field: &'static str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn finite_opt(field: &'static str, v: Option<f64>) -> Result<(), ValidationError> {
    v.map_or(Ok(()), |v| finite(field, v))
}

/// Validate that every KPI of a round result is finite.
pub fn validate_round_result(r: &RoundResult) -> Result<(), ValidationError> {
    finite("revenue", r.revenue)?;
    finite("profit", r.profit)?;
    finite("margin", r.margin)?;
    finite("marketShare", r.market_share)?;
    finite("roi", r.roi)?;
    finite("brandPerception", r.brand_perception)?;
    finite("customerSatisfaction", r.customer_satisfaction)?;
    finite("costs", r.costs)?;
    Ok(())
}

/// Validate that every present effect is finite.
pub fn validate_breakdown(b: &SimulationBreakdown) -> Result<(), ValidationError> {
    for (key, v) in b.effects() {
        finite(key.as_str(), v)?;
    }
    Ok(())
}

/// Validate that every present multiplier is finite.
pub fn validate_event(e: &EventImpact) -> Result<(), ValidationError> {
    finite_opt("revenueMultiplier", e.revenue_multiplier)?;
    finite_opt("costMultiplier", e.cost_multiplier)?;
    finite_opt("demandMultiplier", e.demand_multiplier)?;
    Ok(())
}

/// Validate a whole input, including the round number.
pub fn validate_input(input: &FeedbackInput) -> Result<(), ValidationError> {
    if input.round_number == 0 {
        return Err(ValidationError::RoundOutOfRange(input.round_number));
    }
    validate_round_result(&input.current_result)?;
    if let Some(prev) = &input.previous_result {
        validate_round_result(prev)?;
    }
    if let Some(b) = &input.simulation_breakdown {
        validate_breakdown(b)?;
    }
    for e in &input.event_impacts {
        validate_event(e)?;
    }
    Ok(())
}
