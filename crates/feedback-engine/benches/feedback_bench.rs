use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feedback_core::{
    CompetitorResponse, EventImpact, FeedbackInput, ReactionLevel, RoundResult,
    SimulationBreakdown,
};
use feedback_engine::FeedbackEngine;

fn build_input() -> FeedbackInput {
    let current = RoundResult {
        revenue: 50_000.0,
        profit: 4_000.0,
        margin: 8.0,
        market_share: 12.0,
        roi: 15.0,
        brand_perception: 35.0,
        customer_satisfaction: 55.0,
        costs: 46_000.0,
    };
    let previous = RoundResult {
        revenue: 42_000.0,
        profit: 6_500.0,
        ..current.clone()
    };
    let breakdown = SimulationBreakdown {
        price_effect: Some(-0.08),
        product_effect: Some(-0.04),
        place_effect: Some(-0.035),
        promo_effect: Some(0.01),
        competitor_effect: Some(-0.06),
        event_effect: Some(0.07),
        ..Default::default()
    };
    let events = (0..4)
        .map(|i| EventImpact {
            event_type: "economic".into(),
            event_title: format!("Event {i}"),
            revenue_multiplier: Some(1.1),
            demand_multiplier: Some(1.15),
            ..Default::default()
        })
        .collect();
    FeedbackInput::new(current, 5)
        .with_previous(previous)
        .with_breakdown(breakdown)
        .with_competitor(CompetitorResponse {
            reaction_level: ReactionLevel::Aggressive,
            explanation: Some("Rivals cut prices.".into()),
        })
        .with_events(events)
        .with_team("Bench")
}

fn bench_round_feedback(c: &mut Criterion) {
    let engine = FeedbackEngine::new();
    let input = build_input();
    c.bench_function("round feedback, all signals", |b| {
        b.iter(|| black_box(engine.round_feedback(black_box(&input))))
    });
    c.bench_function("fallback feedback", |b| {
        b.iter(|| black_box(engine.fallback_feedback(black_box(&input.current_result), 5, None)))
    });
}

criterion_group!(benches, bench_round_feedback);
criterion_main!(benches);
