//! Human-readable renderings of channel query results.

use crate::model::{Channel, ChannelSummary, HealthCriteria, UnhealthyReason, SATS_PER_BTC};
use std::cmp::Ordering;
use std::fmt::Write;

const NO_CHANNELS: &str = "Your node has no open channels.";
/// Entries shown in each of the balanced / imbalanced rankings.
const RANKING_LEN: usize = 3;

/// `0.05000000 BTC (5,000,000 sats)`
pub fn format_sats(sats: u64) -> String {
    format!(
        "{:.8} BTC ({} sats)",
        sats as f64 / SATS_PER_BTC as f64,
        group_thousands(sats)
    )
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole-number share of `total`, rounded half away from zero. Zero when
/// there is no total.
pub fn percent(part: u64, total: u64) -> i64 {
    if total == 0 {
        return 0;
    }
    (part as f64 * 100.0 / total as f64).round() as i64
}

fn ratio_percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}

fn count_phrase(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

fn activity_phrase(active: usize, inactive: usize) -> String {
    let active_part = if active == 1 {
        "1 channel is active".to_string()
    } else {
        format!("{} channels are active", active)
    };
    let inactive_part = if inactive == 1 {
        "1 is inactive".to_string()
    } else {
        format!("{} are inactive", inactive)
    };
    format!("{} and {}.", active_part, inactive_part)
}

fn rebalance_phrase(amount: i64) -> String {
    match amount.cmp(&0) {
        Ordering::Greater => format!("receive {}", format_sats(amount.unsigned_abs())),
        Ordering::Less => format!("send {}", format_sats(amount.unsigned_abs())),
        Ordering::Equal => "no rebalance needed".to_string(),
    }
}

fn split_phrase(channel: &Channel) -> String {
    let capacity = channel.capacity().value();
    format!(
        "{}% local / {}% remote",
        percent(channel.local_balance().value(), capacity),
        percent(channel.remote_balance().value(), capacity)
    )
}

fn reason_phrase(channel: &Channel, criteria: &HealthCriteria) -> String {
    let health = channel.health(criteria);
    match health.reason {
        None => "healthy".to_string(),
        Some(UnhealthyReason::Inactive) => UnhealthyReason::Inactive.describe().to_string(),
        Some(reason) => format!(
            "{} ({}% local)",
            reason.describe(),
            ratio_percent(health.local_ratio)
        ),
    }
}

/// Channels ordered by descending capacity. Ties keep their input order.
pub fn by_capacity(channels: &[Channel]) -> Vec<&Channel> {
    let mut sorted: Vec<&Channel> = channels.iter().collect();
    sorted.sort_by(|a, b| b.capacity().cmp(&a.capacity()));
    sorted
}

fn balance_deviation(channel: &Channel) -> f64 {
    (0.5 - channel.local_ratio()).abs()
}

pub fn list_text(channels: &[Channel], summary: &ChannelSummary, active: Option<bool>) -> String {
    if summary.total_channels == 0 {
        return NO_CHANNELS.to_string();
    }

    let mut text = format!(
        "Your node has {} with a total capacity of {}. {}",
        count_phrase(summary.total_channels, "channel"),
        format_sats(summary.total_capacity),
        activity_phrase(summary.active_channels, summary.inactive_channels)
    );

    let ranked = by_capacity(channels);
    let shown: Vec<&Channel> = ranked
        .iter()
        .copied()
        .filter(|c| active.map_or(true, |want| c.is_active() == want))
        .collect();

    match active {
        Some(want) => {
            let (label, heading) = if want {
                ("active", "Active channels:")
            } else {
                ("inactive", "Inactive channels:")
            };
            if shown.is_empty() {
                let _ = write!(text, "\n\nNo {} channels.", label);
            } else {
                let _ = write!(text, "\n\n{}", heading);
                for (i, ch) in shown.iter().enumerate() {
                    let _ = write!(
                        text,
                        "\n{}. {}: {}",
                        i + 1,
                        ch.remote_alias(),
                        format_sats(ch.capacity().value())
                    );
                }
            }
        }
        None => {
            text.push('\n');
            for (i, ch) in shown.iter().enumerate() {
                let _ = write!(
                    text,
                    "\n{}. {}: {} ({})",
                    i + 1,
                    ch.remote_alias(),
                    format_sats(ch.capacity().value()),
                    if ch.is_active() { "active" } else { "inactive" }
                );
            }

            let inactive: Vec<&&Channel> = shown.iter().filter(|c| !c.is_active()).collect();
            if !inactive.is_empty() {
                text.push_str("\n\nInactive channels:");
                for (i, ch) in inactive.iter().enumerate() {
                    let _ = write!(
                        text,
                        "\n{}. {}: {}",
                        i + 1,
                        ch.remote_alias(),
                        format_sats(ch.capacity().value())
                    );
                }
            }
        }
    }

    text
}

pub fn liquidity_text(
    channels: &[Channel],
    summary: &ChannelSummary,
    criteria: &HealthCriteria,
    check_balance: bool,
) -> String {
    if summary.total_channels == 0 {
        return NO_CHANNELS.to_string();
    }

    let mut text = format!(
        "Your node has {} of total capacity. Local balance: {} ({}%). Remote balance: {} ({}%).",
        format_sats(summary.total_capacity),
        format_sats(summary.total_local_balance),
        percent(summary.total_local_balance, summary.total_capacity),
        format_sats(summary.total_remote_balance),
        percent(summary.total_remote_balance, summary.total_capacity),
    );

    let active: Vec<&Channel> = by_capacity(channels)
        .into_iter()
        .filter(|c| c.is_active())
        .collect();
    if active.is_empty() {
        text.push_str("\n\nNo active channels to compare.");
        return text;
    }

    let mut balanced = active.clone();
    balanced.sort_by(|a, b| {
        balance_deviation(a)
            .partial_cmp(&balance_deviation(b))
            .unwrap_or(Ordering::Equal)
    });
    let mut imbalanced = active.clone();
    imbalanced.sort_by(|a, b| {
        balance_deviation(b)
            .partial_cmp(&balance_deviation(a))
            .unwrap_or(Ordering::Equal)
    });

    text.push_str("\n\nMost balanced channels:");
    for (i, ch) in balanced.iter().take(RANKING_LEN).enumerate() {
        let _ = write!(text, "\n{}. {}: {}", i + 1, ch.remote_alias(), split_phrase(ch));
    }
    text.push_str("\n\nMost imbalanced channels:");
    for (i, ch) in imbalanced.iter().take(RANKING_LEN).enumerate() {
        let _ = write!(text, "\n{}. {}: {}", i + 1, ch.remote_alias(), split_phrase(ch));
    }

    if check_balance {
        let outside: Vec<&&Channel> = imbalanced
            .iter()
            .filter(|c| !criteria.is_channel_healthy(&c.local_balance(), &c.capacity()))
            .collect();
        if outside.is_empty() {
            let _ = write!(
                text,
                "\n\nAll active channels are within the {}%-{}% local balance band.",
                ratio_percent(criteria.min_local_ratio()),
                ratio_percent(criteria.max_local_ratio())
            );
        } else {
            let _ = write!(
                text,
                "\n\nSuggested rebalances (target {}% local):",
                ratio_percent(criteria.midpoint())
            );
            for (i, ch) in outside.iter().enumerate() {
                let amount =
                    criteria.calculate_rebalance_amount(&ch.local_balance(), &ch.capacity());
                let _ = write!(
                    text,
                    "\n{}. {}: {}",
                    i + 1,
                    ch.remote_alias(),
                    rebalance_phrase(amount)
                );
            }
        }
    }

    text
}

pub fn health_text(
    channels: &[Channel],
    summary: &ChannelSummary,
    criteria: &HealthCriteria,
) -> String {
    if summary.total_channels == 0 {
        return NO_CHANNELS.to_string();
    }

    let verb = if summary.total_channels == 1 { "is" } else { "are" };
    let mut text = format!(
        "Channel health: {} of {} {} healthy \
         (active, with {}%-{}% of capacity on the local side).",
        summary.healthy_channels,
        count_phrase(summary.total_channels, "channel"),
        verb,
        ratio_percent(criteria.min_local_ratio()),
        ratio_percent(criteria.max_local_ratio())
    );

    let unhealthy: Vec<&Channel> = by_capacity(channels)
        .into_iter()
        .filter(|c| c.is_unhealthy(criteria))
        .collect();
    if unhealthy.is_empty() {
        text.push_str(" No channels need attention.");
        return text;
    }

    text.push_str("\n\nNeeds attention:");
    for (i, ch) in unhealthy.iter().enumerate() {
        let _ = write!(
            text,
            "\n{}. {}: {}",
            i + 1,
            ch.remote_alias(),
            reason_phrase(ch, criteria)
        );
    }
    text
}

/// `channels` is the unhealthy subset; `summary` covers the whole node.
pub fn unhealthy_text(
    channels: &[Channel],
    summary: &ChannelSummary,
    criteria: &HealthCriteria,
) -> String {
    if summary.total_channels == 0 {
        return NO_CHANNELS.to_string();
    }
    if channels.is_empty() {
        return if summary.total_channels == 1 {
            "Your only channel is healthy.".to_string()
        } else {
            format!("All {} channels are healthy.", summary.total_channels)
        };
    }

    let mut text = format!(
        "Found {} out of {}:",
        count_phrase(channels.len(), "unhealthy channel"),
        summary.total_channels
    );
    for (i, ch) in by_capacity(channels).iter().enumerate() {
        let _ = write!(
            text,
            "\n{}. {}: {}",
            i + 1,
            ch.remote_alias(),
            reason_phrase(ch, criteria)
        );
        if ch.is_active() {
            let amount =
                criteria.calculate_rebalance_amount(&ch.local_balance(), &ch.capacity());
            let _ = write!(text, ". Suggested: {}", rebalance_phrase(amount));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::channel::tests::make_channel;

    #[test]
    fn test_format_sats() {
        assert_eq!(format_sats(5_000_000), "0.05000000 BTC (5,000,000 sats)");
        assert_eq!(format_sats(0), "0.00000000 BTC (0 sats)");
        assert_eq!(format_sats(999), "0.00000999 BTC (999 sats)");
        assert_eq!(format_sats(1_000), "0.00001000 BTC (1,000 sats)");
        assert_eq!(format_sats(123_456_789), "1.23456789 BTC (123,456,789 sats)");
    }

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        assert_eq!(percent(99, 200), 50); // 49.5
        assert_eq!(percent(1, 200), 1); // 0.5
        assert_eq!(percent(149, 1000), 15); // 14.9
        assert_eq!(percent(144, 1000), 14);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn test_list_single_channel_grammar() {
        let channels = vec![make_channel(1, 1_000_000, 500_000, true)];
        let summary = ChannelSummary::compute(&channels, &HealthCriteria::default());
        let text = list_text(&channels, &summary, None);
        assert!(text.starts_with(
            "Your node has 1 channel with a total capacity of 0.01000000 BTC (1,000,000 sats). \
             1 channel is active and 0 are inactive."
        ));
        assert!(!text.contains("Inactive channels:"));
    }

    #[test]
    fn test_list_active_filter() {
        let channels = vec![
            make_channel(1, 1_000_000, 500_000, true),
            make_channel(2, 3_000_000, 500_000, false),
        ];
        let summary = ChannelSummary::compute(&channels, &HealthCriteria::default());

        let text = list_text(&channels, &summary, Some(false));
        assert!(text.contains("Inactive channels:\n1. Unknown: 0.03000000 BTC"));
        assert!(!text.contains("0.01000000 BTC"));

        let only_active = vec![make_channel(1, 1_000_000, 500_000, true)];
        let summary = ChannelSummary::compute(&only_active, &HealthCriteria::default());
        let text = list_text(&only_active, &summary, Some(false));
        assert!(text.ends_with("No inactive channels."));
    }

    #[test]
    fn test_empty_node_texts() {
        let summary = ChannelSummary::default();
        let criteria = HealthCriteria::default();
        assert_eq!(list_text(&[], &summary, None), NO_CHANNELS);
        assert_eq!(liquidity_text(&[], &summary, &criteria, true), NO_CHANNELS);
        assert_eq!(health_text(&[], &summary, &criteria), NO_CHANNELS);
        assert_eq!(unhealthy_text(&[], &summary, &criteria), NO_CHANNELS);
    }

    #[test]
    fn test_liquidity_rankings_limited_to_three() {
        let channels: Vec<Channel> = (1..=5)
            .map(|n| make_channel(n, 1_000_000, 100_000 * n as i64, true))
            .collect();
        let summary = ChannelSummary::compute(&channels, &HealthCriteria::default());
        let text = liquidity_text(&channels, &summary, &HealthCriteria::default(), false);

        let balanced = text
            .split("Most balanced channels:")
            .nth(1)
            .unwrap()
            .split("\n\n")
            .next()
            .unwrap();
        assert_eq!(balanced.lines().filter(|l| !l.is_empty()).count(), 3);
        // 50% local is the most balanced of the five
        assert!(balanced.contains("1. Unknown: 50% local / 50% remote"));
        assert!(!text.contains("Suggested rebalances"));
    }

    #[test]
    fn test_liquidity_check_balance_suggestions() {
        let channels = vec![
            make_channel(1, 1_000_000, 500_000, true),
            make_channel(2, 1_000_000, 950_000, true),
            make_channel(3, 1_000_000, 50_000, true),
        ];
        let criteria = HealthCriteria::default();
        let summary = ChannelSummary::compute(&channels, &criteria);
        let text = liquidity_text(&channels, &summary, &criteria, true);
        assert!(text.contains("Suggested rebalances (target 50% local):"));
        assert!(text.contains("send 0.00450000 BTC (450,000 sats)"));
        assert!(text.contains("receive 0.00450000 BTC (450,000 sats)"));

        let balanced = vec![make_channel(1, 1_000_000, 500_000, true)];
        let summary = ChannelSummary::compute(&balanced, &criteria);
        let text = liquidity_text(&balanced, &summary, &criteria, true);
        assert!(text.ends_with("All active channels are within the 20%-80% local balance band."));
    }

    #[test]
    fn test_liquidity_without_active_channels() {
        let channels = vec![make_channel(1, 1_000_000, 500_000, false)];
        let summary = ChannelSummary::compute(&channels, &HealthCriteria::default());
        let text = liquidity_text(&channels, &summary, &HealthCriteria::default(), false);
        assert!(text.ends_with("No active channels to compare."));
    }

    #[test]
    fn test_unhealthy_all_healthy() {
        let channels = vec![
            make_channel(1, 1_000_000, 500_000, true),
            make_channel(2, 1_000_000, 400_000, true),
        ];
        let criteria = HealthCriteria::default();
        let summary = ChannelSummary::compute(&channels, &criteria);
        assert_eq!(unhealthy_text(&[], &summary, &criteria), "All 2 channels are healthy.");
        let text = health_text(&channels, &summary, &criteria);
        assert!(text.ends_with("No channels need attention."));
    }

    #[test]
    fn test_health_single_channel_grammar() {
        let criteria = HealthCriteria::default();
        let channels = vec![make_channel(1, 1_000_000, 500_000, true)];
        let summary = ChannelSummary::compute(&channels, &criteria);
        let text = health_text(&channels, &summary, &criteria);
        assert!(text.starts_with("Channel health: 1 of 1 channel is healthy"), "{}", text);

        let channels = vec![
            make_channel(1, 1_000_000, 500_000, true),
            make_channel(2, 1_000_000, 950_000, true),
        ];
        let summary = ChannelSummary::compute(&channels, &criteria);
        let text = health_text(&channels, &summary, &criteria);
        assert!(text.starts_with("Channel health: 1 of 2 channels are healthy"), "{}", text);
    }
}
