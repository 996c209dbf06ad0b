//! Prioritized marketing-mix recommendations.
//!
//! Rules are evaluated in table order; each may append one recommendation.
//! Later rules can see what earlier rules produced. The list is then reduced
//! to the first recommendation per area and capped at four.

use crate::analyzer::Deltas;
use crate::format::{format_currency, format_percent, format_signed_percent};
use feedback_core::{
    CompetitorResponse, EventImpact, FeedbackRecommendation, MarketingArea, ReactionLevel,
    RoundResult, SimulationBreakdown,
};
use tracing::debug;

pub const MAX_RECOMMENDATIONS: usize = 4;

const PRICE_HURTING: f64 = -0.05;
const PRICE_HELPING: f64 = 0.1;
const THIN_MARGIN: f64 = 15.0;
const PROMO_WEAK: f64 = 0.02;
const COST_HEAVY_RATIO: f64 = 0.5;
const PROMO_STRONG: f64 = 0.15;
const PLACE_HURTING: f64 = -0.03;
const PRODUCT_HURTING: f64 = -0.03;
const DEMAND_SURGE: f64 = 1.1;
const CRITICAL_MARGIN: f64 = 10.0;
const LOW_BRAND: f64 = 40.0;
const LOW_SHARE: f64 = 10.0;

/// Everything a rule may inspect.
#[derive(Clone, Copy, Debug)]
pub struct RuleContext<'a> {
    pub breakdown: Option<&'a SimulationBreakdown>,
    pub competitor: Option<&'a CompetitorResponse>,
    pub events: &'a [EventImpact],
    pub current: &'a RoundResult,
    pub deltas: &'a Deltas,
}

impl RuleContext<'_> {
    fn effect(&self, pick: fn(&SimulationBreakdown) -> Option<f64>) -> Option<f64> {
        self.breakdown.map(|b| pick(b).unwrap_or(0.0))
    }

    fn price_effect(&self) -> Option<f64> {
        self.effect(|b| b.price_effect)
    }

    fn promo_effect(&self) -> Option<f64> {
        self.effect(|b| b.promo_effect)
    }

    fn place_effect(&self) -> Option<f64> {
        self.effect(|b| b.place_effect)
    }

    fn product_effect(&self) -> Option<f64> {
        self.effect(|b| b.product_effect)
    }

    fn surging_event(&self) -> Option<&EventImpact> {
        self.events
            .iter()
            .find(|e| e.demand_multiplier.is_some_and(|m| m > DEMAND_SURGE))
    }
}

/// One entry of a recommendation table.
pub struct Rule {
    pub name: &'static str,
    pub fires: fn(&RuleContext<'_>, &[FeedbackRecommendation]) -> bool,
    pub build: fn(&RuleContext<'_>) -> FeedbackRecommendation,
}

fn has_area(list: &[FeedbackRecommendation], area: MarketingArea) -> bool {
    list.iter().any(|r| r.area == area)
}

fn rec(area: MarketingArea, action: &str, rationale: String, tradeoff: &str) -> FeedbackRecommendation {
    FeedbackRecommendation {
        area,
        action: action.to_string(),
        rationale,
        tradeoff: tradeoff.to_string(),
    }
}

fn effect_pct(v: Option<f64>) -> String {
    format_signed_percent(v.unwrap_or(0.0) * 100.0)
}

/// Round rules, in evaluation order.
///
/// The two price rules and the two promotion rules cover disjoint ranges of
/// their effect, so at most one of each pair fires.
pub const ROUND_RULES: [Rule; 10] = [
    Rule {
        name: "review_pricing",
        fires: |ctx, _| ctx.price_effect().is_some_and(|v| v < PRICE_HURTING),
        build: |ctx| {
            rec(
                MarketingArea::Price,
                "Review your pricing strategy: the current price is hurting results.",
                format!(
                    "Price had a negative effect of {} on this round's outcome.",
                    effect_pct(ctx.price_effect())
                ),
                "Lowering the price can recover volume but compresses margin; keeping it risks losing more share.",
            )
        },
    },
    Rule {
        name: "raise_price_for_margin",
        fires: |ctx, _| {
            ctx.price_effect().is_some_and(|v| v > PRICE_HELPING)
                && ctx.current.margin < THIN_MARGIN
        },
        build: |ctx| {
            rec(
                MarketingArea::Price,
                "Consider raising the price to protect your margin.",
                format!(
                    "Price is helping ({}) but the margin is only {}, below {}.",
                    effect_pct(ctx.price_effect()),
                    format_percent(ctx.current.margin),
                    format_percent(THIN_MARGIN)
                ),
                "A higher price improves margin per unit but may cut volume if customers are price-sensitive.",
            )
        },
    },
    Rule {
        name: "redistribute_promotion",
        fires: |ctx, _| {
            ctx.promo_effect().is_some_and(|v| v < PROMO_WEAK)
                && ctx.current.costs > ctx.current.revenue * COST_HEAVY_RATIO
        },
        build: |ctx| {
            rec(
                MarketingArea::Promotion,
                "Redistribute your promotion budget toward channels with better return.",
                format!(
                    "Promotion contributed only {} while costs ({}) exceed half of revenue ({}).",
                    effect_pct(ctx.promo_effect()),
                    format_currency(ctx.current.costs),
                    format_currency(ctx.current.revenue)
                ),
                "Shifting or cutting spend frees cash, but pulling back too far can weaken awareness.",
            )
        },
    },
    Rule {
        name: "keep_promotion",
        fires: |ctx, _| ctx.promo_effect().is_some_and(|v| v > PROMO_STRONG),
        build: |ctx| {
            rec(
                MarketingArea::Promotion,
                "Keep your promotion strategy and optimize the best-performing channels.",
                format!(
                    "Promotion drove a {} effect this round.",
                    effect_pct(ctx.promo_effect())
                ),
                "Sustaining spend keeps momentum but ties up budget that could fund other levers.",
            )
        },
    },
    Rule {
        name: "revisit_distribution",
        fires: |ctx, _| ctx.place_effect().is_some_and(|v| v < PLACE_HURTING),
        build: |ctx| {
            rec(
                MarketingArea::Place,
                "Revisit your distribution channels and coverage.",
                format!(
                    "Distribution had a negative effect of {} on results.",
                    effect_pct(ctx.place_effect())
                ),
                "New or changed channels raise logistics costs; ignoring the problem limits product availability.",
            )
        },
    },
    Rule {
        name: "improve_quality",
        fires: |ctx, _| ctx.product_effect().is_some_and(|v| v < PRODUCT_HURTING),
        build: |ctx| {
            rec(
                MarketingArea::Product,
                "Improve the perceived quality of your product.",
                format!(
                    "Product had a negative effect of {} on results.",
                    effect_pct(ctx.product_effect())
                ),
                "Quality investment raises unit cost; neglecting it erodes brand and satisfaction.",
            )
        },
    },
    Rule {
        name: "differentiate_product",
        fires: |ctx, list| {
            ctx.competitor
                .is_some_and(|c| c.reaction_level == ReactionLevel::Aggressive)
                && !has_area(list, MarketingArea::Product)
        },
        build: |ctx| {
            let rationale = match ctx.competitor.and_then(|c| c.explanation.as_deref()) {
                Some(why) => format!("Competitors reacted aggressively this round: {why}"),
                None => "Competitors reacted aggressively this round and are contesting your customers.".to_string(),
            };
            rec(
                MarketingArea::Product,
                "Differentiate your product to avoid head-to-head competition.",
                rationale,
                "Differentiation takes investment and time, while competing on price alone squeezes margin.",
            )
        },
    },
    Rule {
        name: "capitalize_on_event",
        fires: |ctx, list| {
            ctx.surging_event().is_some() && !has_area(list, MarketingArea::Promotion)
        },
        build: |ctx| {
            let (title, multiplier) = ctx
                .surging_event()
                .map(|e| (e.event_title.as_str(), e.demand_multiplier.unwrap_or(1.0)))
                .unwrap_or(("", 1.0));
            rec(
                MarketingArea::Promotion,
                &format!("Capitalize on \"{title}\" with targeted promotion."),
                format!(
                    "The event raised demand by {} this round.",
                    format_percent((multiplier - 1.0) * 100.0)
                ),
                "Extra promotion raises short-term costs; missing the window leaves the extra demand to competitors.",
            )
        },
    },
    Rule {
        name: "recover_margin",
        fires: |ctx, list| {
            ctx.current.margin < CRITICAL_MARGIN && !has_area(list, MarketingArea::Price)
        },
        build: |ctx| {
            rec(
                MarketingArea::Price,
                "Increase your margin by reviewing costs and pricing.",
                format!(
                    "Current margin is {}, below the {} minimum for a healthy operation.",
                    format_percent(ctx.current.margin),
                    format_percent(CRITICAL_MARGIN)
                ),
                "Raising price or cutting costs may reduce volume or quality; a thin margin leaves no buffer for shocks.",
            )
        },
    },
    Rule {
        name: "invest_in_brand",
        fires: |ctx, list| {
            ctx.current.brand_perception < LOW_BRAND && !has_area(list, MarketingArea::Product)
        },
        build: |ctx| {
            rec(
                MarketingArea::Product,
                "Invest in brand and product quality.",
                format!(
                    "Brand perception is at {}, below {}.",
                    format_percent(ctx.current.brand_perception),
                    format_percent(LOW_BRAND)
                ),
                "Brand building is slow and costly, but low perception depresses demand and pricing power.",
            )
        },
    },
];

/// Rules used when a round has no breakdown, competitor or event data.
pub const FALLBACK_RULES: [Rule; 2] = [
    Rule {
        name: "widen_margin",
        fires: |ctx, _| ctx.current.margin < THIN_MARGIN,
        build: |ctx| {
            rec(
                MarketingArea::Price,
                "Review pricing and costs to widen your margin.",
                format!(
                    "Margin is {}, below {}.",
                    format_percent(ctx.current.margin),
                    format_percent(THIN_MARGIN)
                ),
                "A higher price or leaner costs improve margin but can cost volume or quality.",
            )
        },
    },
    Rule {
        name: "grow_share",
        fires: |ctx, _| ctx.current.market_share < LOW_SHARE,
        build: |ctx| {
            rec(
                MarketingArea::Promotion,
                "Strengthen promotion to grow your market share.",
                format!(
                    "Market share is {}, below {}.",
                    format_percent(ctx.current.market_share),
                    format_percent(LOW_SHARE)
                ),
                "More promotion raises costs now in exchange for volume later; staying small limits scale.",
            )
        },
    },
];

/// Recommendation used when no rule fires.
pub fn steady_course() -> FeedbackRecommendation {
    rec(
        MarketingArea::Product,
        "Maintain your current strategy and monitor the market.",
        "No critical issue was detected in this round's indicators.".to_string(),
        "Stability preserves what works, but standing still can let competitors catch up.",
    )
}

/// Run a rule table in order, falling back to [`steady_course`] when nothing fires.
pub fn apply_rules(rules: &[Rule], ctx: &RuleContext<'_>) -> Vec<FeedbackRecommendation> {
    let mut list = Vec::new();
    for rule in rules {
        if (rule.fires)(ctx, &list) {
            debug!(rule = rule.name, "recommendation rule fired");
            list.push((rule.build)(ctx));
        }
    }
    if list.is_empty() {
        list.push(steady_course());
    }
    list
}

/// Keep the first recommendation per area, preserving order.
pub fn dedupe_by_area(list: Vec<FeedbackRecommendation>) -> Vec<FeedbackRecommendation> {
    let mut seen: Vec<MarketingArea> = Vec::with_capacity(MarketingArea::ALL.len());
    list.into_iter()
        .filter(|r| {
            if seen.contains(&r.area) {
                false
            } else {
                seen.push(r.area);
                true
            }
        })
        .collect()
}

/// Prioritized, deduplicated recommendations for a round.
pub fn recommend(
    breakdown: Option<&SimulationBreakdown>,
    competitor: Option<&CompetitorResponse>,
    events: &[EventImpact],
    current: &RoundResult,
    deltas: &Deltas,
) -> Vec<FeedbackRecommendation> {
    let ctx = RuleContext {
        breakdown,
        competitor,
        events,
        current,
        deltas,
    };
    let mut list = dedupe_by_area(apply_rules(&ROUND_RULES, &ctx));
    list.truncate(MAX_RECOMMENDATIONS);
    list
}
