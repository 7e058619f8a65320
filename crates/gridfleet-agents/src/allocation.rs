//! Task allocation policies.
//!
//! An [`Allocator`] turns the live pool into an ordered list of candidate
//! tasks for one idle agent. The caller walks the list and routes to the
//! first reachable candidate, so a single unreachable task never blocks
//! allocation of the reachable ones.
//!
//! All four policies share this one code path and differ only in which
//! tasks are eligible and how the eligible set is ranked:
//!
//! | Policy | Eligible | Ranking |
//! |---|---|---|
//! | `GreedyNearest` | whole pool | Manhattan, then row-major |
//! | `Regioned` | own region, whole pool if the region is empty | Manhattan, then row-major |
//! | `ClaimWithConflictResolution` | pool minus tasks held by others | Manhattan, then row-major |
//! | `FifoQueue` | whole pool | arrival order |
//!
//! Agents are served one at a time in fleet order, so under
//! `ClaimWithConflictResolution` an agent that loses a contested cell to a
//! lower-indexed agent simply re-selects from what remains.

use std::collections::BTreeSet;

use gridfleet_types::{AllocationPolicy, Position, RegionScheme};

use crate::task_pool::TaskPool;

/// Candidate selection for one fleet under one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    /// Active policy.
    policy: AllocationPolicy,
    /// Partition used by [`AllocationPolicy::Regioned`].
    scheme: RegionScheme,
    /// Number of agents sharing the grid (the number of regions).
    fleet_size: u32,
    /// Grid width, needed by the column and striped partitions.
    grid_width: u32,
}

impl Allocator {
    /// Create an allocator for a fleet of `fleet_size` agents on a grid of
    /// width `grid_width`.
    pub const fn new(
        policy: AllocationPolicy,
        scheme: RegionScheme,
        fleet_size: u32,
        grid_width: u32,
    ) -> Self {
        Self {
            policy,
            scheme,
            fleet_size,
            grid_width,
        }
    }

    /// The active policy.
    pub const fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Region index (`0..fleet_size`) owning `cell` under the configured
    /// scheme.
    pub fn region_of(&self, cell: Position) -> u32 {
        let k = self.fleet_size.max(1);
        match self.scheme {
            RegionScheme::ColumnBands => {
                let band = self.grid_width.checked_div(k).unwrap_or(0).max(1);
                cell.col
                    .checked_div(band)
                    .unwrap_or(0)
                    .min(k.saturating_sub(1))
            }
            RegionScheme::Parity => cell
                .row
                .saturating_add(cell.col)
                .checked_rem(k)
                .unwrap_or(0),
            RegionScheme::Striped => {
                let index = u64::from(cell.row)
                    .saturating_mul(u64::from(self.grid_width))
                    .saturating_add(u64::from(cell.col));
                let region = index.checked_rem(u64::from(k)).unwrap_or(0);
                u32::try_from(region).unwrap_or(0)
            }
        }
    }

    /// Candidate tasks for the agent in fleet slot `slot` standing at
    /// `origin`, best first.
    ///
    /// `reserved` holds tasks other agents are already heading for; it only
    /// matters under [`AllocationPolicy::ClaimWithConflictResolution`].
    /// `skipped` filters out tasks this agent recently found unreachable.
    pub fn candidates<F>(
        &self,
        slot: u32,
        origin: Position,
        pool: &TaskPool,
        reserved: &BTreeSet<Position>,
        skipped: F,
    ) -> Vec<Position>
    where
        F: Fn(Position) -> bool,
    {
        let eligible: BTreeSet<Position> = pool
            .peek_all()
            .iter()
            .copied()
            .filter(|&task| !skipped(task))
            .filter(|task| {
                self.policy != AllocationPolicy::ClaimWithConflictResolution
                    || !reserved.contains(task)
            })
            .collect();

        let eligible = if self.policy == AllocationPolicy::Regioned {
            let own: BTreeSet<Position> = eligible
                .iter()
                .copied()
                .filter(|&task| self.region_of(task) == slot)
                .collect();
            if own.is_empty() { eligible } else { own }
        } else {
            eligible
        };

        if self.policy == AllocationPolicy::FifoQueue {
            return pool
                .arrival_order()
                .filter(|task| eligible.contains(task))
                .collect();
        }

        let mut ranked: Vec<Position> = eligible.into_iter().collect();
        ranked.sort_by_key(|&task| (origin.manhattan(task), task));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: u32, col: u32) -> Position {
        Position::new(row, col)
    }

    fn none(_: Position) -> bool {
        false
    }

    #[test]
    fn greedy_prefers_nearest_then_row_major() {
        let pool = TaskPool::from_tasks([p(4, 4), p(2, 0), p(0, 2)]);
        let alloc = Allocator::new(AllocationPolicy::GreedyNearest, RegionScheme::ColumnBands, 1, 5);
        let ranked = alloc.candidates(0, p(0, 0), &pool, &BTreeSet::new(), none);
        // (0,2) and (2,0) are both 2 away; (0,2) is first in row-major order.
        assert_eq!(ranked, vec![p(0, 2), p(2, 0), p(4, 4)]);
    }

    #[test]
    fn greedy_ignores_reservations() {
        let pool = TaskPool::from_tasks([p(0, 1), p(3, 3)]);
        let alloc = Allocator::new(AllocationPolicy::GreedyNearest, RegionScheme::ColumnBands, 2, 4);
        let reserved = BTreeSet::from([p(0, 1)]);
        assert_eq!(alloc.candidates(1, p(0, 0), &pool, &reserved, none).first(), Some(&p(0, 1)));
    }

    #[test]
    fn claim_with_conflict_skips_held_tasks() {
        let pool = TaskPool::from_tasks([p(0, 1), p(3, 3)]);
        let alloc = Allocator::new(
            AllocationPolicy::ClaimWithConflictResolution,
            RegionScheme::ColumnBands,
            2,
            4,
        );
        let reserved = BTreeSet::from([p(0, 1)]);
        assert_eq!(alloc.candidates(1, p(0, 0), &pool, &reserved, none).first(), Some(&p(3, 3)));
    }

    #[test]
    fn skipped_tasks_are_excluded() {
        let pool = TaskPool::from_tasks([p(0, 1), p(3, 3)]);
        let alloc = Allocator::new(AllocationPolicy::GreedyNearest, RegionScheme::ColumnBands, 1, 4);
        let ranked = alloc.candidates(0, p(0, 0), &pool, &BTreeSet::new(), |t| t == p(0, 1));
        assert_eq!(ranked, vec![p(3, 3)]);
    }

    #[test]
    fn fifo_uses_arrival_order() {
        let pool = TaskPool::from_tasks([p(5, 5), p(0, 1), p(2, 2)]);
        let alloc = Allocator::new(AllocationPolicy::FifoQueue, RegionScheme::ColumnBands, 1, 6);
        let ranked = alloc.candidates(0, p(0, 0), &pool, &BTreeSet::new(), none);
        assert_eq!(ranked, vec![p(5, 5), p(0, 1), p(2, 2)]);
    }

    #[test]
    fn column_bands_split_width() {
        let alloc = Allocator::new(AllocationPolicy::Regioned, RegionScheme::ColumnBands, 3, 10);
        // Bands of 3 columns; the last band absorbs columns 6..10.
        assert_eq!(alloc.region_of(p(0, 0)), 0);
        assert_eq!(alloc.region_of(p(0, 2)), 0);
        assert_eq!(alloc.region_of(p(0, 3)), 1);
        assert_eq!(alloc.region_of(p(0, 6)), 2);
        assert_eq!(alloc.region_of(p(0, 9)), 2);
    }

    #[test]
    fn parity_and_striped_regions() {
        let parity = Allocator::new(AllocationPolicy::Regioned, RegionScheme::Parity, 2, 4);
        assert_eq!(parity.region_of(p(0, 0)), 0);
        assert_eq!(parity.region_of(p(0, 1)), 1);
        assert_eq!(parity.region_of(p(1, 1)), 0);

        let striped = Allocator::new(AllocationPolicy::Regioned, RegionScheme::Striped, 3, 4);
        // Row-major index 5 -> region 2.
        assert_eq!(striped.region_of(p(1, 1)), 2);
    }

    #[test]
    fn regioned_prefers_own_region_then_falls_back() {
        let alloc = Allocator::new(AllocationPolicy::Regioned, RegionScheme::ColumnBands, 2, 6);
        let pool = TaskPool::from_tasks([p(0, 1), p(0, 4)]);
        // Agent 1 owns columns 3..6 even though (0,1) is closer.
        assert_eq!(alloc.candidates(1, p(0, 0), &pool, &BTreeSet::new(), none).first(), Some(&p(0, 4)));

        let pool = TaskPool::from_tasks([p(0, 1)]);
        assert_eq!(alloc.candidates(1, p(0, 0), &pool, &BTreeSet::new(), none).first(), Some(&p(0, 1)));
    }

    #[test]
    fn empty_pool_has_no_candidates() {
        let alloc = Allocator::new(AllocationPolicy::GreedyNearest, RegionScheme::ColumnBands, 1, 3);
        assert!(alloc.candidates(0, p(0, 0), &TaskPool::new(), &BTreeSet::new(), none).is_empty());
    }
}
