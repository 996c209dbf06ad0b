//! Narrative bullets: what happened, why it happened, and the one-line summary.
//!
//! Each list is assembled from an ordered table of bullet producers. Producers
//! return `None` when their condition does not hold, and the table order is the
//! output order.

use crate::analyzer::Deltas;
use crate::format::{format_currency, format_percent, format_points, format_signed_percent};
use feedback_core::{CompetitorResponse, EventImpact, ReactionLevel, RoundResult, SimulationBreakdown};
use tracing::debug;

/// Revenue change (percent) above which revenue "grew" and below whose negative it "fell".
pub const REVENUE_SWING_PCT: f64 = 5.0;
/// Profit change (percent) considered a big move in either direction.
pub const PROFIT_SWING_PCT: f64 = 10.0;
/// Market share change (points) worth reporting.
pub const SHARE_SWING_PTS: f64 = 2.0;
pub const BRAND_HIGH: f64 = 70.0;
pub const BRAND_LOW: f64 = 40.0;

/// Effects at or below this magnitude are noise.
pub const EFFECT_NOISE: f64 = 0.02;
/// Effects beyond this magnitude are strong; between noise and this they are moderate.
pub const EFFECT_STRONG: f64 = 0.05;
pub const MAX_EFFECT_BULLETS: usize = 3;
pub const MAX_EVENT_BULLETS: usize = 2;
pub const EVENT_BOOST: f64 = 1.05;
pub const EVENT_DRAG: f64 = 0.95;

pub const BALANCED_EFFECTS: &str = "4Ps effects were balanced this round.";
pub const FIRST_ROUND_WHY: &str =
    "This is the simulation's start: results reflect your initial positioning decisions.";
pub const LATER_ROUND_WHY: &str =
    "Results reflect a balanced combination of strategic and market factors.";

type Bullet = fn(&RoundResult, &Deltas, u32) -> Option<String>;

const FIRST_ROUND_BULLETS: [Bullet; 3] = [opening_revenue, opening_profit, opening_share];
const LATER_ROUND_BULLETS: [Bullet; 3] = [revenue_trend, profit_trend, share_trend];

fn opening_revenue(current: &RoundResult, _: &Deltas, round: u32) -> Option<String> {
    Some(format!(
        "Revenue in round {round} totaled {}.",
        format_currency(current.revenue)
    ))
}

fn opening_profit(current: &RoundResult, _: &Deltas, _: u32) -> Option<String> {
    if current.profit > 0.0 {
        Some(format!(
            "The company made a profit of {} with a {} margin.",
            format_currency(current.profit),
            format_percent(current.margin)
        ))
    } else {
        Some(format!(
            "The company recorded a loss of {} with a {} margin.",
            format_currency(current.profit.abs()),
            format_percent(current.margin)
        ))
    }
}

fn opening_share(current: &RoundResult, _: &Deltas, _: u32) -> Option<String> {
    Some(format!(
        "Your starting market share is {}.",
        format_percent(current.market_share)
    ))
}

fn revenue_trend(current: &RoundResult, d: &Deltas, _: u32) -> Option<String> {
    let revenue = format_currency(current.revenue);
    let bullet = if d.revenue_change > REVENUE_SWING_PCT {
        format!(
            "Revenue grew {} versus the previous round, reaching {revenue}.",
            format_percent(d.revenue_change)
        )
    } else if d.revenue_change < -REVENUE_SWING_PCT {
        format!(
            "Revenue fell {} versus the previous round, to {revenue}.",
            format_percent(d.revenue_change.abs())
        )
    } else {
        format!(
            "Revenue remained stable ({}) at {revenue}.",
            format_signed_percent(d.revenue_change)
        )
    };
    Some(bullet)
}

fn profit_trend(current: &RoundResult, d: &Deltas, _: u32) -> Option<String> {
    let profit = format_currency(current.profit);
    if current.profit > 0.0 && d.profit_change > PROFIT_SWING_PCT {
        Some(format!(
            "Profit rose {} to {profit}.",
            format_percent(d.profit_change)
        ))
    } else if current.profit < 0.0 {
        Some(format!(
            "The company recorded a loss of {} this round.",
            format_currency(current.profit.abs())
        ))
    } else if d.profit_change < -PROFIT_SWING_PCT {
        Some(format!(
            "Profit dropped {} to {profit}.",
            format_percent(d.profit_change.abs())
        ))
    } else {
        None
    }
}

fn share_trend(current: &RoundResult, d: &Deltas, _: u32) -> Option<String> {
    if d.market_share_change.abs() <= SHARE_SWING_PTS {
        return None;
    }
    let share = format_percent(current.market_share);
    if d.market_share_change > 0.0 {
        Some(format!(
            "You gained {} of market share, now at {share}.",
            format_points(d.market_share_change)
        ))
    } else {
        Some(format!(
            "You lost {} of market share, now at {share}.",
            format_points(d.market_share_change.abs())
        ))
    }
}

fn brand_addendum(current: &RoundResult) -> Option<String> {
    let brand = format_percent(current.brand_perception);
    if current.brand_perception > BRAND_HIGH {
        Some(format!(
            "Brand perception is high ({brand}), an asset worth leveraging."
        ))
    } else if current.brand_perception < BRAND_LOW {
        Some(format!("Brand perception is low ({brand}) and needs attention."))
    } else {
        None
    }
}

/// Ordered bullets describing the round's outcome.
pub fn what_happened(current: &RoundResult, deltas: &Deltas, round_number: u32) -> Vec<String> {
    let table = if deltas.is_first_round {
        &FIRST_ROUND_BULLETS
    } else {
        &LATER_ROUND_BULLETS
    };
    let mut bullets: Vec<String> = table
        .iter()
        .filter_map(|bullet| bullet(current, deltas, round_number))
        .collect();
    bullets.extend(brand_addendum(current));
    bullets
}

fn effect_bullets(breakdown: &SimulationBreakdown) -> Vec<String> {
    let mut effects = breakdown.effects().to_vec();
    // Stable sort: equal magnitudes keep the fixed lever order.
    effects.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    let bullets: Vec<String> = effects
        .into_iter()
        .filter(|(_, v)| v.abs() > EFFECT_NOISE)
        .take(MAX_EFFECT_BULLETS)
        .map(|(key, v)| {
            let impact = format_signed_percent(v * 100.0);
            let base = if v > EFFECT_STRONG {
                format!("{} had a positive impact of {impact} on results.", key.label())
            } else if v < -EFFECT_STRONG {
                format!("{} had a negative impact of {impact} on results.", key.label())
            } else {
                format!("{} had a moderate impact ({impact}) on results.", key.label())
            };
            match breakdown.explanation(key) {
                Some(why) => format!("{base} {why}"),
                None => base,
            }
        })
        .collect();
    if bullets.is_empty() {
        vec![BALANCED_EFFECTS.to_string()]
    } else {
        bullets
    }
}

fn competitor_bullet(competitor: &CompetitorResponse) -> Option<String> {
    match competitor.reaction_level {
        ReactionLevel::Aggressive => Some(match &competitor.explanation {
            Some(why) => format!("Competitors reacted aggressively: {why}"),
            None => "Competitors reacted aggressively and pressured your market share.".to_string(),
        }),
        ReactionLevel::Moderate => Some(
            "Competitors reacted moderately, adding some pressure on the market.".to_string(),
        ),
        ReactionLevel::Passive => None,
    }
}

fn event_bullet(event: &EventImpact) -> Option<String> {
    let multiplier = event.revenue_multiplier?;
    let change = format_signed_percent((multiplier - 1.0) * 100.0);
    let base = if multiplier > EVENT_BOOST {
        format!("The event \"{}\" boosted demand ({change}).", event.event_title)
    } else if multiplier < EVENT_DRAG {
        format!("The event \"{}\" reduced demand ({change}).", event.event_title)
    } else {
        return None;
    };
    Some(match &event.explanation {
        Some(why) => format!("{base} {why}"),
        None => base,
    })
}

/// Ordered causal bullets: lever effects, competitor reaction, then events.
pub fn why_it_happened(
    breakdown: Option<&SimulationBreakdown>,
    competitor: Option<&CompetitorResponse>,
    events: &[EventImpact],
    deltas: &Deltas,
) -> Vec<String> {
    let mut bullets = Vec::new();
    if let Some(b) = breakdown {
        bullets.extend(effect_bullets(b));
    }
    if let Some(c) = competitor {
        bullets.extend(competitor_bullet(c));
    }
    bullets.extend(
        events
            .iter()
            .take(MAX_EVENT_BULLETS)
            .filter_map(event_bullet),
    );
    if bullets.is_empty() {
        debug!("no causal signal, using fallback explanation");
        let fallback = if deltas.is_first_round {
            FIRST_ROUND_WHY
        } else {
            LATER_ROUND_WHY
        };
        bullets.push(fallback.to_string());
    }
    bullets
}

type SummaryRule = (
    fn(&RoundResult, &Deltas) -> bool,
    fn(&str, &RoundResult, &Deltas, u32) -> String,
);

const LATER_ROUND_SUMMARY: [SummaryRule; 4] = [
    (profit_surged, congratulate),
    (profit_slipping, warn_declining),
    (in_the_red, report_loss),
    (always, report_stable),
];

fn profit_surged(c: &RoundResult, d: &Deltas) -> bool {
    c.profit > 0.0 && d.profit_change > PROFIT_SWING_PCT
}

fn profit_slipping(c: &RoundResult, d: &Deltas) -> bool {
    c.profit > 0.0 && d.profit_change < -PROFIT_SWING_PCT
}

fn in_the_red(c: &RoundResult, _: &Deltas) -> bool {
    c.profit < 0.0
}

fn always(_: &RoundResult, _: &Deltas) -> bool {
    true
}

fn congratulate(who: &str, c: &RoundResult, d: &Deltas, round: u32) -> String {
    format!(
        "Congratulations, {who}! Profit grew {} to {} in round {round}.",
        format_percent(d.profit_change),
        format_currency(c.profit)
    )
}

fn warn_declining(who: &str, c: &RoundResult, d: &Deltas, round: u32) -> String {
    format!(
        "{who} stayed profitable in round {round} ({}), but profit fell {} versus the previous round.",
        format_currency(c.profit),
        format_percent(d.profit_change.abs())
    )
}

fn report_loss(who: &str, c: &RoundResult, _: &Deltas, round: u32) -> String {
    format!(
        "{who} posted a loss of {} in round {round}; reassess costs and pricing to recover.",
        format_currency(c.profit.abs())
    )
}

fn report_stable(who: &str, c: &RoundResult, _: &Deltas, round: u32) -> String {
    format!(
        "{who} showed stable performance in round {round}, with profit of {} and {} market share.",
        format_currency(c.profit),
        format_percent(c.market_share)
    )
}

/// One-sentence summary of the round for the team.
pub fn summary(
    current: &RoundResult,
    deltas: &Deltas,
    round_number: u32,
    team_name: Option<&str>,
) -> String {
    let who = match team_name {
        Some(name) => format!("Team {name}"),
        None => "Your company".to_string(),
    };
    if deltas.is_first_round {
        return if current.profit > 0.0 {
            format!(
                "{who} ended round {round_number} profitable, with {} in profit and {} market share.",
                format_currency(current.profit),
                format_percent(current.market_share)
            )
        } else {
            format!(
                "{who} ended round {round_number} with a loss of {}; review costs and pricing to reach profitability.",
                format_currency(current.profit.abs())
            )
        };
    }
    LATER_ROUND_SUMMARY
        .iter()
        .find(|(applies, _)| applies(current, deltas))
        .map(|(_, render)| render(&who, current, deltas, round_number))
        .unwrap_or_default()
}
