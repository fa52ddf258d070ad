//! Ordered streaming buffer of per-position observations.
//!
//! Reads arrive sorted by alignment start. Once a read starting at coordinate
//! `s` has been seen, no later read can touch a coordinate below `s`, so every
//! buffered slot left of `s` is final and can be flushed and evicted. Memory
//! is therefore bounded by the span of reads still in flight.

use std::collections::BTreeMap;

use log::trace;

use super::observation::Observation;
use super::PositionKey;
use crate::core::error::{DamconError, Result};
use crate::stream::AlignedRead;

/// All observations buffered for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Pileup {
    pub key: PositionKey,
    pub observations: Vec<Observation>,
}

impl Pileup {
    pub fn new(key: PositionKey, observations: Vec<Observation>) -> Self {
        Self { key, observations }
    }

    /// A slot no read covered.
    pub fn empty(key: PositionKey) -> Self {
        Self::new(key, Vec::new())
    }

    /// Raw coverage: the number of buffered observations.
    #[inline]
    pub fn depth(&self) -> usize {
        self.observations.len()
    }
}

/// Buffer keyed by [`PositionKey`], flushed strictly left to right.
#[derive(Debug, Default)]
pub struct PositionAccumulator {
    buffer: BTreeMap<PositionKey, Vec<Observation>>,
    /// Start of the most recently added read.
    last_read_start: u64,
    /// Every coordinate below this has been flushed and must not be touched again.
    flushed_before: u64,
}

impl PositionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Lowest coordinate that may still receive observations.
    #[inline]
    pub fn flushed_before(&self) -> u64 {
        self.flushed_before
    }

    /// Insert one observation at `key`.
    ///
    /// Fails when `key` lies left of what has already been flushed.
    pub fn insert(&mut self, key: PositionKey, observation: Observation) -> Result<()> {
        if key.coordinate < self.flushed_before {
            return Err(DamconError::UnsortedInput {
                previous: self.flushed_before,
                current: key.coordinate,
            });
        }
        self.buffer.entry(key).or_default().push(observation);
        Ok(())
    }

    /// Resolve every aligned coordinate of `read` and buffer the observations
    /// at their reference slots. Deleted coordinates are skipped.
    ///
    /// Returns the number of observations added. A read starting before the
    /// previously added read is an ordering violation.
    pub fn add_observations<R: AlignedRead>(&mut self, read: &R) -> Result<usize> {
        let start = read.alignment_start();
        if start < self.last_read_start {
            return Err(DamconError::UnsortedInput {
                previous: self.last_read_start,
                current: start,
            });
        }
        self.last_read_start = start;

        let mut added = 0;
        let end = read.alignment_end();
        if end < start {
            return Ok(0);
        }
        for coordinate in start..=end {
            let Some(resolved) = read.resolve(coordinate) else {
                continue;
            };
            let observation = Observation::new(
                resolved.base,
                resolved.read_offset,
                resolved.read_length,
                resolved.strand,
                resolved.read_group,
            );
            self.insert(PositionKey::reference(coordinate), observation)?;
            added += 1;
        }
        Ok(added)
    }

    /// Remove and return, in ascending key order, every slot whose coordinate
    /// is strictly below `coordinate`.
    pub fn drain_up_to(&mut self, coordinate: u64) -> Vec<Pileup> {
        if coordinate <= self.flushed_before {
            return Vec::new();
        }

        let retained = self.buffer.split_off(&PositionKey::reference(coordinate));
        let flushed = std::mem::replace(&mut self.buffer, retained);
        self.flushed_before = coordinate;

        trace!(
            "Flushed {} slot(s) below {}, {} still buffered",
            flushed.len(),
            coordinate,
            self.buffer.len()
        );

        flushed
            .into_iter()
            .map(|(key, observations)| Pileup::new(key, observations))
            .collect()
    }

    /// Drain slots below `coordinate` and run `process` on each, in key order.
    ///
    /// Every drained slot has already been evicted when `process` sees it.
    pub fn flush_up_to<T, F>(&mut self, coordinate: u64, process: F) -> Result<Vec<T>>
    where
        F: FnMut(Pileup) -> Result<T>,
    {
        self.drain_up_to(coordinate)
            .into_iter()
            .map(process)
            .collect()
    }

    /// Drain everything that is left.
    pub fn drain_all(&mut self) -> Vec<Pileup> {
        match self.buffer.keys().next_back() {
            Some(last) => {
                let bound = last.coordinate + 1;
                self.drain_up_to(bound)
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Base, Strand};
    use crate::stream::segment::AlignedSegment;
    use proptest::prelude::*;

    fn read(start: u64, bases: &[u8], cigar: &str) -> AlignedSegment {
        AlignedSegment::from_cigar_str(start, bases, cigar, Strand::Forward, None).unwrap()
    }

    fn obs(base: Base) -> Observation {
        Observation::new(base, 0, 1, Strand::Forward, None)
    }

    #[test]
    fn buffers_each_covered_coordinate() {
        let mut acc = PositionAccumulator::new();
        assert_eq!(acc.add_observations(&read(5, b"ACGT", "2M1D2M")).unwrap(), 4);
        assert_eq!(acc.add_observations(&read(6, b"CC", "2M")).unwrap(), 2);

        let flushed = acc.drain_all();
        let keys: Vec<u64> = flushed.iter().map(|p| p.key.coordinate).collect();
        assert_eq!(keys, vec![5, 6, 7, 8, 9]);
        assert_eq!(flushed[1].depth(), 2);
        assert_eq!(flushed[2].depth(), 1);
        assert!(acc.is_empty());
    }

    #[test]
    fn deletion_only_coordinates_are_not_buffered() {
        let mut acc = PositionAccumulator::new();
        acc.add_observations(&read(10, b"AT", "1M3D1M")).unwrap();
        let keys: Vec<u64> = acc.drain_all().iter().map(|p| p.key.coordinate).collect();
        assert_eq!(keys, vec![10, 14]);
    }

    #[test]
    fn flush_is_strictly_below_the_cursor() {
        let mut acc = PositionAccumulator::new();
        acc.add_observations(&read(1, b"AAAA", "4M")).unwrap();

        let flushed = acc.drain_up_to(3);
        assert_eq!(flushed.len(), 2);
        assert_eq!(flushed.last().unwrap().key, PositionKey::reference(2));
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.flushed_before(), 3);

        assert!(acc.drain_up_to(3).is_empty());
        assert!(acc.drain_up_to(2).is_empty());
    }

    #[test]
    fn out_of_order_reads_fail_fast() {
        let mut acc = PositionAccumulator::new();
        acc.add_observations(&read(20, b"AC", "2M")).unwrap();
        let err = acc.add_observations(&read(19, b"AC", "2M")).unwrap_err();
        assert!(matches!(
            err,
            DamconError::UnsortedInput {
                previous: 20,
                current: 19
            }
        ));
    }

    #[test]
    fn inserts_into_flushed_region_fail() {
        let mut acc = PositionAccumulator::new();
        acc.insert(PositionKey::reference(5), obs(Base::A)).unwrap();
        acc.drain_up_to(6);
        assert!(acc.insert(PositionKey::reference(5), obs(Base::C)).is_err());
        assert!(acc.insert(PositionKey::new(5, 1), obs(Base::C)).is_err());
        assert!(acc.insert(PositionKey::reference(6), obs(Base::C)).is_ok());
    }

    #[test]
    fn insertion_slots_stay_separate_and_ordered() {
        let mut acc = PositionAccumulator::new();
        acc.insert(PositionKey::new(7, 2), obs(Base::G)).unwrap();
        acc.insert(PositionKey::new(7, 0), obs(Base::A)).unwrap();
        acc.insert(PositionKey::new(7, 1), obs(Base::C)).unwrap();
        acc.insert(PositionKey::new(7, 1), obs(Base::T)).unwrap();
        acc.insert(PositionKey::new(8, 0), obs(Base::T)).unwrap();

        let flushed = acc.drain_up_to(8);
        let keys: Vec<PositionKey> = flushed.iter().map(|p| p.key).collect();
        assert_eq!(
            keys,
            vec![
                PositionKey::new(7, 0),
                PositionKey::new(7, 1),
                PositionKey::new(7, 2)
            ]
        );
        assert_eq!(flushed[1].depth(), 2);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn flush_runs_the_callback_in_key_order() {
        let mut acc = PositionAccumulator::new();
        acc.add_observations(&read(3, b"ACG", "3M")).unwrap();
        let seen = acc
            .flush_up_to(10, |pileup| Ok(pileup.observations[0].base))
            .unwrap();
        assert_eq!(seen, vec![Base::A, Base::C, Base::G]);
    }

    proptest! {
        #[test]
        fn sorted_reads_flush_every_slot_once_in_order(
            mut starts in prop::collection::vec(1u64..500, 1..40),
            len in 1u64..30,
            cursor_steps in prop::collection::vec(0u64..50, 1..10),
        ) {
            starts.sort_unstable();
            let bases = vec![b'A'; len as usize];
            let cigar = format!("{}M", len);

            let mut acc = PositionAccumulator::new();
            let mut flushed = Vec::new();
            let mut cursor = 0u64;
            let mut steps = cursor_steps.iter().cycle();
            for &start in &starts {
                // Only ever flush behind the next read start.
                cursor = (cursor + steps.next().copied().unwrap_or(0)).min(start);
                flushed.extend(acc.drain_up_to(cursor));
                acc.add_observations(&read(start, &bases, &cigar)).unwrap();
            }
            flushed.extend(acc.drain_all());

            let keys: Vec<PositionKey> = flushed.iter().map(|p| p.key).collect();
            let mut sorted = keys.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(&keys, &sorted);

            let total: usize = flushed.iter().map(|p| p.depth()).sum();
            prop_assert_eq!(total as u64, starts.len() as u64 * len);
        }
    }
}
