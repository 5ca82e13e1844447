use strum::EnumCount;
use tracing::debug;

use crate::Opcode;

/// Number of executed instructions, per opcode.
#[derive(Debug, Clone)]
pub struct ExecutionStats {
    counts: [u64; Opcode::COUNT],
}

impl Default for ExecutionStats {
    fn default() -> Self {
        Self {
            counts: [0; Opcode::COUNT],
        }
    }
}

impl ExecutionStats {
    pub(crate) fn record(&mut self, opcode: Opcode) {
        self.counts[u8::from(opcode) as usize] += 1;
    }

    pub fn count(&self, opcode: Opcode) -> u64 {
        self.counts[u8::from(opcode) as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Opcodes that executed at least once, with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (Opcode, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .filter_map(|(index, count)| {
                let opcode = Opcode::try_from(index as u8).ok()?;
                Some((opcode, *count))
            })
    }

    pub(crate) fn log(&self) {
        for (opcode, count) in self.iter() {
            debug!(%opcode, count, "executed instructions");
        }
    }
}
