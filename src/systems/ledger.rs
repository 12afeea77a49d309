//! Bookkeeping that runs at the week boundary rather than during a resolve.

use tracing::info;

use crate::world::Farm;

/// Charges every leaching penalty scheduled during the week that just ended.
/// Returns the total debited.
pub fn settle_leaching(farm: &mut Farm) -> i64 {
    let mut total = 0;
    for kind in farm.unlocked_regions() {
        let Some(region) = farm.region_mut(kind) else {
            continue;
        };
        for index in region.unlocked_indices() {
            let Some(plot) = region.plot_mut(index) else {
                continue;
            };
            if plot.pending_leach_penalty > 0 {
                let penalty = i64::from(plot.pending_leach_penalty);
                info!(region = %kind, plot = index, penalty, "leaching penalty");
                total += penalty;
                plot.pending_leach_penalty = 0;
            }
        }
    }
    farm.charge(total);
    total
}

/// Clears per-week irrigation counters and queued water in every region.
pub fn reset_weekly_counters(farm: &mut Farm) {
    for kind in farm.unlocked_regions() {
        let Some(region) = farm.region_mut(kind) else {
            continue;
        };
        for index in region.unlocked_indices() {
            if let Some(plot) = region.plot_mut(index) {
                plot.reset_weekly_irrigation();
            }
        }
        region.clear_pending_irrigation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceParameters;
    use crate::catalog::RegionKind;

    #[test]
    fn settles_and_clears_penalties() {
        let mut farm = Farm::new(RegionKind::TropicalMonsoon, &BalanceParameters::default());
        farm.selected_mut().unwrap().pending_leach_penalty = 5;
        assert_eq!(settle_leaching(&mut farm), 5);
        assert_eq!(farm.gold(), 55);
        assert_eq!(settle_leaching(&mut farm), 0);
        assert_eq!(farm.gold(), 55);
    }

    #[test]
    fn weekly_reset_clears_irrigation() {
        let mut farm = Farm::new(RegionKind::TropicalMonsoon, &BalanceParameters::default());
        {
            let plot = farm.selected_mut().unwrap();
            plot.irrigation_events_this_week = 2;
            plot.irrigation_mm_this_week = 17.0;
        }
        farm.region_mut(RegionKind::TropicalMonsoon)
            .unwrap()
            .add_pending_irrigation(0, 17.0);
        reset_weekly_counters(&mut farm);
        let plot = farm.selected().unwrap();
        assert_eq!(plot.irrigation_events_this_week, 0);
        assert_eq!(plot.irrigation_mm_this_week, 0.0);
        assert_eq!(
            farm.region(RegionKind::TropicalMonsoon).unwrap().pending_irrigation(0),
            0.0
        );
    }
}
