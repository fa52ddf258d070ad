//! Streaming consensus FASTA writer.

use std::io::Write;

use crate::call::pipeline::ReconstructedPosition;
use crate::core::error::Result;
use crate::engine::PositionSink;

/// Bases per sequence line.
pub const LINE_WIDTH: usize = 70;

/// Writes one record whose sequence is the consensus call of every
/// reference slot. Insertion slots contribute only when they call a base.
pub struct ConsensusFastaWriter<W: Write> {
    writer: W,
    column: usize,
    bases: u64,
}

impl<W: Write> ConsensusFastaWriter<W> {
    pub fn new(mut writer: W, name: &str) -> Result<Self> {
        writeln!(writer, ">{}", name)?;
        Ok(Self {
            writer,
            column: 0,
            bases: 0,
        })
    }

    /// Number of bases written so far.
    pub fn len(&self) -> u64 {
        self.bases
    }

    pub fn is_empty(&self) -> bool {
        self.bases == 0
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn push(&mut self, base: u8) -> Result<()> {
        if self.column == LINE_WIDTH {
            self.writer.write_all(b"\n")?;
            self.column = 0;
        }
        self.writer.write_all(&[base])?;
        self.column += 1;
        self.bases += 1;
        Ok(())
    }
}

impl<W: Write> PositionSink for ConsensusFastaWriter<W> {
    fn accept(&mut self, position: &ReconstructedPosition) -> Result<()> {
        if position.key.is_insertion() && position.call.is_no_call() {
            return Ok(());
        }
        self.push(position.call.base.as_char() as u8)
    }

    fn finish(&mut self) -> Result<()> {
        if self.column > 0 {
            self.writer.write_all(b"\n")?;
            self.column = 0;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::position;
    use crate::position::{Base, PositionKey};

    #[test]
    fn wraps_lines_at_seventy() {
        let mut writer = ConsensusFastaWriter::new(Vec::new(), "sample_wc-upvote").unwrap();
        for coord in 1..=150 {
            writer
                .accept(&position(PositionKey::reference(coord), Base::A, Base::C))
                .unwrap();
        }
        writer.finish().unwrap();
        assert_eq!(writer.len(), 150);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">sample_wc-upvote");
        assert_eq!(lines[1].len(), 70);
        assert_eq!(lines[2].len(), 70);
        assert_eq!(lines[3], "C".repeat(10));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn exact_multiple_has_no_blank_line() {
        let mut writer = ConsensusFastaWriter::new(Vec::new(), "s").unwrap();
        for coord in 1..=70 {
            writer
                .accept(&position(PositionKey::reference(coord), Base::A, Base::G))
                .unwrap();
        }
        writer.finish().unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, format!(">s\n{}\n", "G".repeat(70)));
    }

    #[test]
    fn uncalled_insertions_are_skipped() {
        let mut writer = ConsensusFastaWriter::new(Vec::new(), "s").unwrap();
        writer
            .accept(&position(PositionKey::reference(1), Base::A, Base::A))
            .unwrap();
        writer
            .accept(&position(PositionKey::new(1, 1), Base::N, Base::N))
            .unwrap();
        writer
            .accept(&position(PositionKey::new(1, 2), Base::N, Base::T))
            .unwrap();
        writer
            .accept(&position(PositionKey::reference(2), Base::C, Base::N))
            .unwrap();
        writer.finish().unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), ">s\nATN\n");
    }
}
