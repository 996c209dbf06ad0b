#![deny(warnings)]

//! Deterministic round-feedback engine.
//!
//! Given a team's current and previous round results plus the simulation's
//! effect breakdown, competitor reaction and market events, this crate builds
//! a causal narrative and a short list of prioritized recommendations:
//! - [`analyzer`]: round-over-round deltas
//! - [`narrative`]: what happened, why it happened, summary
//! - [`recommend`]: rule table for marketing-mix recommendations
//! - [`format`]: pt-BR money and percentage presentation
//!
//! Everything is synchronous and side-effect free apart from reading the
//! [`Clock`] for the `generatedAt` timestamp.

pub mod analyzer;
pub mod format;
pub mod narrative;
pub mod recommend;

use chrono::{DateTime, SecondsFormat, Utc};
use feedback_core::{EngineVersion, FeedbackInput, GeneratedFeedback, RoundResult};
use tracing::{debug, info};

pub use analyzer::{analyze, Deltas};

/// Source of the `generatedAt` timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant; for reproducible output.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed three-sentence explanation used when a round has no attribution data.
const PROFITABLE_WHY: [&str; 3] = [
    "Revenue exceeded total costs, so the round closed with a profit.",
    "Your price, product, distribution and promotion decisions were consistent with the demand you captured.",
    "A detailed effect breakdown is not available for this round.",
];
const UNPROFITABLE_WHY: [&str; 3] = [
    "Total costs exceeded revenue, so the round closed without a profit.",
    "Price, cost structure or promotion spend were out of balance with the demand you captured.",
    "A detailed effect breakdown is not available for this round.",
];

/// Feedback generator bound to a clock.
#[derive(Clone, Debug, Default)]
pub struct FeedbackEngine<C = SystemClock> {
    clock: C,
}

impl FeedbackEngine<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> FeedbackEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Full feedback for a round.
    pub fn round_feedback(&self, input: &FeedbackInput) -> GeneratedFeedback {
        let current = &input.current_result;
        let breakdown = input.simulation_breakdown.as_ref();
        let competitor = input.competitor_response.as_ref();
        let events = input.event_impacts.as_slice();

        let deltas = analyze(input.previous_result.as_ref(), current);
        debug!(?deltas, round = input.round_number, "round deltas");
        if let Some(decisions) = &input.decisions {
            debug!(
                price = decisions.price,
                promotion_budget = decisions.total_promotion_budget(),
                channels = decisions.distribution_channels.len(),
                "decisions under review"
            );
        }

        let feedback = GeneratedFeedback {
            summary: narrative::summary(
                current,
                &deltas,
                input.round_number,
                input.team_name.as_deref(),
            ),
            what_happened: narrative::what_happened(current, &deltas, input.round_number),
            why_it_happened: narrative::why_it_happened(breakdown, competitor, events, &deltas),
            recommendations: recommend::recommend(breakdown, competitor, events, current, &deltas),
            generated_at: self.timestamp(),
            engine_version: if breakdown.is_some() {
                EngineVersion::V2Deterministic
            } else {
                EngineVersion::V1Deterministic
            },
        };
        info!(
            team = input.team_name.as_deref().unwrap_or("-"),
            round = input.round_number,
            engine = %feedback.engine_version,
            recommendations = feedback.recommendations.len(),
            "generated round feedback"
        );
        feedback
    }

    /// Reduced feedback for rounds with no breakdown, competitor or event data.
    pub fn fallback_feedback(
        &self,
        current: &RoundResult,
        round_number: u32,
        team_name: Option<&str>,
    ) -> GeneratedFeedback {
        let deltas = Deltas::first_round();
        let why = if current.profit > 0.0 {
            PROFITABLE_WHY
        } else {
            UNPROFITABLE_WHY
        };
        let ctx = recommend::RuleContext {
            breakdown: None,
            competitor: None,
            events: &[],
            current,
            deltas: &deltas,
        };
        let feedback = GeneratedFeedback {
            summary: narrative::summary(current, &deltas, round_number, team_name),
            what_happened: narrative::what_happened(current, &deltas, round_number),
            why_it_happened: why.iter().map(|s| s.to_string()).collect(),
            recommendations: recommend::apply_rules(&recommend::FALLBACK_RULES, &ctx),
            generated_at: self.timestamp(),
            engine_version: EngineVersion::FallbackDeterministic,
        };
        info!(
            team = team_name.unwrap_or("-"),
            round = round_number,
            recommendations = feedback.recommendations.len(),
            "generated fallback feedback"
        );
        feedback
    }
}

/// [`FeedbackEngine::round_feedback`] with the system clock.
pub fn generate_round_feedback(input: &FeedbackInput) -> GeneratedFeedback {
    FeedbackEngine::new().round_feedback(input)
}

/// [`FeedbackEngine::fallback_feedback`] with the system clock.
pub fn generate_fallback_feedback(
    current: &RoundResult,
    round_number: u32,
    team_name: Option<&str>,
) -> GeneratedFeedback {
    FeedbackEngine::new().fallback_feedback(current, round_number, team_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use feedback_core::{
        CompetitorResponse, EventImpact, MarketingArea, ReactionLevel, SimulationBreakdown,
    };
    use proptest::prelude::*;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    fn current() -> RoundResult {
        RoundResult {
            revenue: 50_000.0,
            profit: 8_000.0,
            margin: 16.0,
            market_share: 12.0,
            roi: 20.0,
            brand_perception: 60.0,
            customer_satisfaction: 55.0,
            costs: 42_000.0,
        }
    }

    #[test]
    fn first_round_scenario() {
        let engine = FeedbackEngine::with_clock(clock());
        let fb = engine.round_feedback(&FeedbackInput::new(current(), 1));
        assert_eq!(fb.what_happened.len(), 3);
        assert!(fb.what_happened[0].contains("R$ 50.000,00"));
        assert!(fb.what_happened[1].contains("R$ 8.000,00"));
        assert!(fb.what_happened[1].contains("16.0%"));
        assert!(fb.what_happened[2].contains("12.0%"));
        assert_eq!(fb.why_it_happened, vec![narrative::FIRST_ROUND_WHY.to_string()]);
        assert_eq!(fb.engine_version, EngineVersion::V1Deterministic);
        assert_eq!(fb.generated_at, "2024-03-01T12:00:00.000Z");
    }

    #[test]
    fn revenue_growth_scenario() {
        let mut previous = current();
        previous.revenue = 40_000.0;
        let input = FeedbackInput::new(current(), 2).with_previous(previous);
        let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
        assert!(fb.what_happened[0].contains("grew 25.0%"));
    }

    #[test]
    fn breakdown_switches_engine_version() {
        let b = SimulationBreakdown {
            price_effect: Some(-0.08),
            promo_effect: Some(0.2),
            product_effect: Some(0.0),
            place_effect: Some(0.0),
            competitor_effect: Some(0.0),
            event_effect: Some(0.0),
            ..Default::default()
        };
        let mut c = current();
        c.margin = 20.0;
        let input = FeedbackInput::new(c, 3).with_breakdown(b);
        let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
        assert_eq!(fb.engine_version, EngineVersion::V2Deterministic);
        let areas: Vec<_> = fb.recommendations.iter().map(|r| r.area).collect();
        assert_eq!(areas, vec![MarketingArea::Price, MarketingArea::Promotion]);
    }

    #[test]
    fn aggressive_competitor_without_breakdown() {
        let input = FeedbackInput::new(current(), 2).with_competitor(CompetitorResponse {
            reaction_level: ReactionLevel::Aggressive,
            explanation: None,
        });
        let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
        let product: Vec<_> = fb
            .recommendations
            .iter()
            .filter(|r| r.area == MarketingArea::Product)
            .collect();
        assert_eq!(product.len(), 1);
        assert!(product[0].action.starts_with("Differentiate"));
    }

    #[test]
    fn balanced_breakdown_yields_single_bullet() {
        let b = SimulationBreakdown {
            price_effect: Some(0.01),
            product_effect: Some(-0.02),
            place_effect: Some(0.015),
            promo_effect: Some(0.02),
            competitor_effect: Some(-0.01),
            event_effect: Some(0.0),
            ..Default::default()
        };
        let input = FeedbackInput::new(current(), 2)
            .with_previous(current())
            .with_breakdown(b);
        let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
        assert_eq!(fb.why_it_happened, vec![narrative::BALANCED_EFFECTS.to_string()]);
    }

    #[test]
    fn fallback_feedback_shape() {
        let engine = FeedbackEngine::with_clock(clock());
        let fb = engine.fallback_feedback(&current(), 4, Some("Beta"));
        assert_eq!(fb.engine_version, EngineVersion::FallbackDeterministic);
        assert_eq!(fb.why_it_happened.len(), 3);
        assert_eq!(fb.why_it_happened[0], PROFITABLE_WHY[0]);
        assert!(fb.summary.starts_with("Team Beta"));
        assert_eq!(fb.recommendations.len(), 1);
        assert_eq!(fb.recommendations[0].area, MarketingArea::Product);

        let mut weak = current();
        weak.profit = -2_000.0;
        weak.margin = 4.0;
        weak.market_share = 3.0;
        let fb = engine.fallback_feedback(&weak, 4, None);
        assert_eq!(fb.why_it_happened[0], UNPROFITABLE_WHY[0]);
        let areas: Vec<_> = fb.recommendations.iter().map(|r| r.area).collect();
        assert_eq!(areas, vec![MarketingArea::Price, MarketingArea::Promotion]);
    }

    #[test]
    fn output_serializes_with_camel_case_keys() {
        let fb = FeedbackEngine::with_clock(clock()).round_feedback(&FeedbackInput::new(current(), 1));
        let v = serde_json::to_value(&fb).unwrap();
        assert_eq!(v["engineVersion"], "v1_deterministic");
        assert!(v["whatHappened"].is_array());
        assert!(v["whyItHappened"].is_array());
        assert_eq!(v["generatedAt"], "2024-03-01T12:00:00.000Z");
    }

    fn arb_result() -> impl Strategy<Value = RoundResult> {
        (
            0.0f64..1e7,
            -1e6f64..1e6,
            -50.0f64..80.0,
            0.0f64..60.0,
            0.0f64..100.0,
            0.0f64..1e7,
        )
            .prop_map(|(revenue, profit, margin, share, brand, costs)| RoundResult {
                revenue,
                profit,
                margin,
                market_share: share,
                roi: margin,
                brand_perception: brand,
                customer_satisfaction: brand,
                costs,
            })
    }

    fn arb_effect() -> impl Strategy<Value = Option<f64>> {
        proptest::option::of(-0.3f64..0.3)
    }

    fn arb_input() -> impl Strategy<Value = FeedbackInput> {
        (
            proptest::option::of(arb_result()),
            arb_result(),
            proptest::option::of((
                arb_effect(),
                arb_effect(),
                arb_effect(),
                arb_effect(),
                arb_effect(),
                arb_effect(),
            )),
            proptest::option::of(0u8..3),
            proptest::collection::vec((0.7f64..1.4, 0.7f64..1.4), 0..4),
            1u32..20,
        )
            .prop_map(|(previous, current, effects, reaction, events, round)| {
                let breakdown = effects.map(|(p, pr, pl, pm, c, e)| SimulationBreakdown {
                    price_effect: p,
                    product_effect: pr,
                    place_effect: pl,
                    promo_effect: pm,
                    competitor_effect: c,
                    event_effect: e,
                    ..Default::default()
                });
                let competitor = reaction.map(|r| CompetitorResponse {
                    reaction_level: match r {
                        0 => ReactionLevel::Passive,
                        1 => ReactionLevel::Moderate,
                        _ => ReactionLevel::Aggressive,
                    },
                    explanation: None,
                });
                FeedbackInput {
                    previous_result: previous,
                    current_result: current,
                    decisions: None,
                    simulation_breakdown: breakdown,
                    competitor_response: competitor,
                    event_impacts: events
                        .into_iter()
                        .enumerate()
                        .map(|(i, (rev, demand))| EventImpact {
                            event_type: "market".into(),
                            event_title: format!("Event {i}"),
                            revenue_multiplier: Some(rev),
                            demand_multiplier: Some(demand),
                            ..Default::default()
                        })
                        .collect(),
                    round_number: round,
                    team_name: None,
                }
            })
    }

    proptest! {
        #[test]
        fn deterministic_with_fixed_clock(input in arb_input()) {
            let engine = FeedbackEngine::with_clock(clock());
            prop_assert_eq!(engine.round_feedback(&input), engine.round_feedback(&input));
        }

        #[test]
        fn recommendation_areas_unique_and_capped(input in arb_input()) {
            let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
            prop_assert!(!fb.recommendations.is_empty());
            prop_assert!(fb.recommendations.len() <= recommend::MAX_RECOMMENDATIONS);
            for (i, a) in fb.recommendations.iter().enumerate() {
                for b in &fb.recommendations[i + 1..] {
                    prop_assert_ne!(a.area, b.area);
                }
            }
        }

        #[test]
        fn bullet_lists_never_empty(input in arb_input()) {
            let fb = FeedbackEngine::with_clock(clock()).round_feedback(&input);
            prop_assert!(!fb.what_happened.is_empty());
            prop_assert!(!fb.why_it_happened.is_empty());
            prop_assert!(!fb.summary.is_empty());
        }

        #[test]
        fn first_round_detection(current in arb_result()) {
            let d = analyze(None, &current);
            prop_assert!(d.is_first_round);
            prop_assert_eq!(d, Deltas::first_round());
        }

        #[test]
        fn fallback_always_recommends(current in arb_result(), round in 1u32..30) {
            let fb = FeedbackEngine::with_clock(clock()).fallback_feedback(&current, round, None);
            prop_assert!(!fb.recommendations.is_empty());
            prop_assert!(fb.recommendations.len() <= 2);
            prop_assert_eq!(fb.why_it_happened.len(), 3);
        }
    }
}
