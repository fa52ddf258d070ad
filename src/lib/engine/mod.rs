//! Streaming reconstruction driver.
//!
//! [`Reconstructor`] pulls reads from a [`ReadStream`], buffers their
//! observations in a [`PositionAccumulator`], and flushes every slot the
//! stream has moved past through the [`PositionPipeline`]. Results reach
//! the [`PositionSink`]s in strict key order. Reference positions no read
//! covers are filled with empty pileups so sinks see the whole contig.

use log::{info, warn};

use crate::call::pipeline::{PositionPipeline, ReconstructedPosition};
use crate::core::error::Result;
use crate::core::progress::ProgressTracker;
use crate::position::accumulator::{Pileup, PositionAccumulator};
use crate::position::{Base, PositionKey};
use crate::reference::Reference;
use crate::stream::{AlignedRead, ReadStream};

/// Upper bound on slots handed to the pipeline at once.
pub const MAX_BATCH_SIZE: usize = 65_536;

/// Consumer of reconstructed positions, called in ascending key order.
pub trait PositionSink {
    fn accept(&mut self, position: &ReconstructedPosition) -> Result<()>;

    /// Called once after the last position.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Counters for the end-of-run log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub reads: u64,
    pub observations: u64,
    /// Reads starting past the end of the reference.
    pub reads_past_reference: u64,
    /// Reference positions emitted (insertion slots excluded).
    pub positions: u64,
    pub covered_positions: u64,
    pub corrected_positions: u64,
    pub no_calls: u64,
    pub insertion_slots: u64,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            "Processed {} read(s) contributing {} observation(s)",
            self.reads, self.observations
        );
        if self.reads_past_reference > 0 {
            warn!(
                "{} read(s) started past the end of the reference and were ignored",
                self.reads_past_reference
            );
        }
        info!(
            "Reconstructed {} position(s): {} covered, {} corrected, {} called N",
            self.positions, self.covered_positions, self.corrected_positions, self.no_calls
        );
        if self.insertion_slots > 0 {
            info!("{} insertion slot(s) reconstructed", self.insertion_slots);
        }
    }

    fn record(&mut self, position: &ReconstructedPosition) {
        if position.key.is_insertion() {
            self.insertion_slots += 1;
            return;
        }
        self.positions += 1;
        if position.is_covered() {
            self.covered_positions += 1;
        }
        if position.is_corrected() {
            self.corrected_positions += 1;
        }
        if position.call.is_no_call() {
            self.no_calls += 1;
        }
    }
}

/// Single-pass driver over one contig.
pub struct Reconstructor<'a> {
    reference: &'a Reference,
    pipeline: &'a PositionPipeline,
    accumulator: PositionAccumulator,
    /// Next reference coordinate not yet handed to the pipeline.
    next_coordinate: u64,
    parallel: bool,
    progress: ProgressTracker,
    summary: RunSummary,
    overhang_warned: bool,
}

impl<'a> Reconstructor<'a> {
    pub fn new(reference: &'a Reference, pipeline: &'a PositionPipeline) -> Self {
        Self {
            reference,
            pipeline,
            accumulator: PositionAccumulator::new(),
            next_coordinate: 1,
            parallel: false,
            progress: ProgressTracker::new("Reconstructed positions"),
            summary: RunSummary::default(),
            overhang_warned: false,
        }
    }

    /// Process flushed batches on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress = ProgressTracker::new("Reconstructed positions").with_interval(interval);
        self
    }

    /// Consume the whole stream and drive every sink to completion.
    pub fn run<S: ReadStream>(
        mut self,
        stream: &mut S,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<RunSummary> {
        while let Some(read) = stream.next_read() {
            self.add_read(&read?, sinks)?;
        }

        let remaining = self.accumulator.drain_all();
        let end = self.reference.len() + 1;
        self.emit(remaining, end, sinks)?;

        for sink in sinks.iter_mut() {
            sink.finish()?;
        }
        self.progress.finish();
        Ok(self.summary)
    }

    /// Flush everything left of the read, then buffer the read.
    pub fn add_read<R: AlignedRead>(
        &mut self,
        read: &R,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<()> {
        let start = read.alignment_start();
        if start > self.reference.len() {
            if self.summary.reads_past_reference == 0 {
                warn!(
                    "Reads start past the end of {} ({} bp); ignoring them",
                    self.reference.contig(),
                    self.reference.len()
                );
            }
            self.summary.reads_past_reference += 1;
            return Ok(());
        }

        self.flush_up_to(start, sinks)?;
        let added = self.accumulator.add_observations(read)?;
        self.summary.reads += 1;
        self.summary.observations += added as u64;
        Ok(())
    }

    /// Emit every slot strictly left of `coordinate`, uncovered ones included.
    pub fn flush_up_to(
        &mut self,
        coordinate: u64,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<()> {
        let drained = self.accumulator.drain_up_to(coordinate);
        let bound = coordinate.min(self.reference.len() + 1);
        self.emit(drained, bound, sinks)
    }

    /// Merge drained pileups with empty ones for uncovered coordinates below
    /// `bound`, then process and dispatch them in batches.
    fn emit(
        &mut self,
        drained: Vec<Pileup>,
        bound: u64,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<()> {
        let mut batch: Vec<(Pileup, Base)> = Vec::new();
        for pileup in drained {
            let coordinate = pileup.key.coordinate;
            if coordinate > self.reference.len() {
                if !self.overhang_warned {
                    warn!(
                        "Alignments extend past the end of {}; overhanging bases are ignored",
                        self.reference.contig()
                    );
                    self.overhang_warned = true;
                }
                continue;
            }

            // An insertion slot follows its reference slot.
            let fill_to = if pileup.key.is_insertion() {
                coordinate + 1
            } else {
                coordinate
            };
            self.fill_gap(fill_to, &mut batch, sinks)?;

            let reference_base = if pileup.key.is_insertion() {
                Base::N
            } else {
                self.next_coordinate = coordinate + 1;
                self.reference.base_at(coordinate)
            };
            batch.push((pileup, reference_base));
            if batch.len() >= MAX_BATCH_SIZE {
                self.dispatch(std::mem::take(&mut batch), sinks)?;
            }
        }

        self.fill_gap(bound, &mut batch, sinks)?;
        self.dispatch(batch, sinks)
    }

    /// Queue empty pileups for every coordinate from the cursor up to `to`.
    fn fill_gap(
        &mut self,
        to: u64,
        batch: &mut Vec<(Pileup, Base)>,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<()> {
        while self.next_coordinate < to {
            let coordinate = self.next_coordinate;
            batch.push((
                Pileup::empty(PositionKey::reference(coordinate)),
                self.reference.base_at(coordinate),
            ));
            self.next_coordinate += 1;
            if batch.len() >= MAX_BATCH_SIZE {
                self.dispatch(std::mem::take(batch), sinks)?;
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        batch: Vec<(Pileup, Base)>,
        sinks: &mut [&mut dyn PositionSink],
    ) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let results = self.pipeline.process_batch(batch, self.parallel)?;
        for position in &results {
            self.summary.record(position);
            for sink in sinks.iter_mut() {
                sink.accept(position)?;
            }
        }
        self.progress.record(results.len() as u64);
        Ok(())
    }
}
