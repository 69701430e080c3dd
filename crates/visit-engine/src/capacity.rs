//! Capacity pools and seat counting.
//!
//! Templates sharing a non-null capacity group at the same prison pool their
//! open/closed capacity, and bookings are counted jointly across the members'
//! occurrences. Pools are resolved once per query as explicit value objects
//! rather than re-derived at every capacity check.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::booking::{BookingRecord, Restriction};
use crate::expander::SessionOccurrence;
use crate::template::SessionTemplate;

/// Open/closed seat counts — used both for configured capacity and for the
/// single-slot capacity query result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCapacity {
    pub open: u32,
    pub closed: u32,
}

/// Seats currently in use for one occurrence (or its pool).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlotUsage {
    pub open: u32,
    pub closed: u32,
}

impl SlotUsage {
    pub fn for_restriction(&self, restriction: Restriction) -> u32 {
        match restriction {
            Restriction::Open => self.open,
            Restriction::Closed => self.closed,
            Restriction::Unknown => 0,
        }
    }
}

/// The pooled capacity a template's occurrences are checked against, with the
/// member templates whose bookings count toward it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityPool {
    pub capacity: SessionCapacity,
    pub members: BTreeSet<String>,
}

impl CapacityPool {
    /// Seats left in `restriction`'s channel given the counted usage.
    /// The UNKNOWN channel has no capacity of its own and is never available.
    pub fn remaining(&self, usage: &SlotUsage, restriction: Restriction) -> u32 {
        match restriction {
            Restriction::Open => self.capacity.open.saturating_sub(usage.open),
            Restriction::Closed => self.capacity.closed.saturating_sub(usage.closed),
            Restriction::Unknown => 0,
        }
    }
}

/// All pools for one query, resolved from the templates in scope.
#[derive(Debug, Clone, Default)]
pub struct CapacityPools {
    pools: Vec<CapacityPool>,
    by_template: BTreeMap<String, usize>,
}

impl CapacityPools {
    /// Group the given templates by capacity group. Templates without a group
    /// form single-member pools holding only their own capacity.
    pub fn resolve(templates: &[SessionTemplate]) -> Self {
        let mut pools: Vec<CapacityPool> = Vec::new();
        let mut by_template = BTreeMap::new();
        let mut by_group: BTreeMap<String, usize> = BTreeMap::new();

        for template in templates {
            let index = match &template.capacity_group {
                Some(group) => *by_group.entry(group.clone()).or_insert_with(|| {
                    pools.push(CapacityPool::default());
                    pools.len() - 1
                }),
                None => {
                    pools.push(CapacityPool::default());
                    pools.len() - 1
                }
            };
            let pool = &mut pools[index];
            pool.capacity.open += template.open_capacity;
            pool.capacity.closed += template.closed_capacity;
            pool.members.insert(template.reference.clone());
            by_template.insert(template.reference.clone(), index);
        }

        Self { pools, by_template }
    }

    pub fn for_template(&self, reference: &str) -> Option<&CapacityPool> {
        self.by_template.get(reference).map(|i| &self.pools[*i])
    }
}

/// Count the seats in use for an occurrence against its pool.
///
/// A record counts when its slot (prison, date, start, end) equals the
/// occurrence's, its template is a pool member, and it currently holds
/// capacity: a BOOKED or RESERVED visit, or a reserved-slot application that
/// is not yet completed. CANCELLED and CHANGING never count; neither do
/// speculative or completed applications. UNKNOWN-restriction records count
/// toward neither channel.
pub fn count_usage(
    occurrence: &SessionOccurrence,
    members: &BTreeSet<String>,
    records: &[BookingRecord],
) -> SlotUsage {
    let mut usage = SlotUsage::default();
    for record in records {
        if !record.holds_capacity()
            || !members.contains(&record.template_ref)
            || !record.matches_slot(
                &occurrence.prison_code,
                occurrence.date,
                occurrence.start_time,
                occurrence.end_time,
            )
        {
            continue;
        }
        match record.restriction {
            Restriction::Open => usage.open += 1,
            Restriction::Closed => usage.closed += 1,
            Restriction::Unknown => {}
        }
    }
    usage
}
