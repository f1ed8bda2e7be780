//! Fight segmentation: single-linkage clustering of kills on time.

use tracing::debug;

use super::AnalyticsError;
use crate::models::{Fight, KillEvent};

/// Split a map's kills into fights.
///
/// Kills are sorted by match time (stable, so simultaneous kills keep their
/// input order). A kill joins the current fight when it lands within
/// `threshold_seconds` of the fight's previous kill; otherwise it opens a
/// new fight.
pub fn segment_fights(
    mut kills: Vec<KillEvent>,
    threshold_seconds: f64,
) -> Result<Vec<Fight>, AnalyticsError> {
    if !threshold_seconds.is_finite() || threshold_seconds < 0.0 {
        return Err(AnalyticsError::InvalidParameter(format!(
            "fight threshold must be a non-negative number of seconds, got {}",
            threshold_seconds
        )));
    }

    kills.sort_by(|a, b| a.match_time.total_cmp(&b.match_time));

    let mut fights: Vec<Fight> = Vec::new();
    for kill in kills {
        match fights.last_mut() {
            Some(current) if kill.match_time - current.end <= threshold_seconds => {
                current.push(kill);
            }
            _ => fights.push(Fight::open(kill)),
        }
    }

    debug!(
        "Segmented {} kills into {} fights",
        fights.iter().map(|f| f.kills.len()).sum::<usize>(),
        fights.len()
    );
    Ok(fights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Combatant, Hero};
    use pretty_assertions::assert_eq;

    fn kill(t: f64) -> KillEvent {
        KillEvent::new(
            t,
            1,
            Combatant::new("A", Hero::Sojourn, "T1"),
            Combatant::new("B", Hero::Moira, "T2"),
        )
    }

    fn times(fight: &Fight) -> Vec<f64> {
        fight.kills.iter().map(|k| k.match_time).collect()
    }

    #[test]
    fn test_segmentation_scenario() {
        let kills = vec![kill(10.0), kill(12.0), kill(40.0), kill(41.0)];

        let fights = segment_fights(kills, 15.0).unwrap();
        assert_eq!(fights.len(), 2);
        assert_eq!(times(&fights[0]), vec![10.0, 12.0]);
        assert_eq!(times(&fights[1]), vec![40.0, 41.0]);
        assert_eq!((fights[1].start, fights[1].end), (40.0, 41.0));
    }

    #[test]
    fn test_unsorted_input() {
        let kills = vec![kill(41.0), kill(10.0), kill(40.0), kill(12.0)];

        let fights = segment_fights(kills, 15.0).unwrap();
        assert_eq!(times(&fights[0]), vec![10.0, 12.0]);
        assert_eq!(times(&fights[1]), vec![40.0, 41.0]);
    }

    #[test]
    fn test_gap_equal_to_threshold_joins() {
        let fights = segment_fights(vec![kill(0.0), kill(15.0), kill(30.1)], 15.0).unwrap();
        assert_eq!(fights.len(), 2);
        assert_eq!(times(&fights[0]), vec![0.0, 15.0]);
    }

    #[test]
    fn test_chained_kills_form_one_fight() {
        // Single linkage: each gap is small even though the span is large
        let kills: Vec<KillEvent> = (0..10).map(|i| kill(i as f64 * 10.0)).collect();
        let fights = segment_fights(kills, 10.0).unwrap();
        assert_eq!(fights.len(), 1);
        assert_eq!(fights[0].duration(), 90.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_fights(Vec::new(), 15.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(segment_fights(vec![kill(1.0)], -1.0).is_err());
        assert!(segment_fights(vec![kill(1.0)], f64::INFINITY).is_err());
    }

    #[test]
    fn test_fights_cover_sorted_stream_without_overlap() {
        let input_times = [55.0, 3.0, 120.0, 4.5, 19.0, 56.0, 140.0, 18.0, 2.0, 121.0];
        let kills: Vec<KillEvent> = input_times.iter().map(|t| kill(*t)).collect();

        let fights = segment_fights(kills, 5.0).unwrap();

        let mut sorted = input_times.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let rebuilt: Vec<f64> = fights.iter().flat_map(times).collect();
        assert_eq!(rebuilt, sorted);

        for pair in fights.windows(2) {
            assert!(pair[0].end < pair[1].start);
            assert!(pair[1].start - pair[0].end > 5.0);
        }
    }
}
