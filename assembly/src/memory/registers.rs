use std::ops::{Index, IndexMut};

use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// The general purpose registers, plus the stack pointer.
///
/// All registers are 32 bits wide and hold two's-complement values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum Register {
    /// Accumulator. Holds the program output when execution halts.
    Ax,
    Bx,
    /// Counter used by `LOOP`.
    Cx,
    /// Extension of `AX` for `IDIV` and `CQO`.
    Dx,
    Si,
    Di,
    Bp,
    /// Stack pointer, maintained by `PUSH`/`POP`/`CALL`/`RET`.
    Sp,
}

/// The register file. A plain value: copying it never shares storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterFile([i32; Register::COUNT]);

impl RegisterFile {
    pub const fn get(&self, register: Register) -> i32 {
        self.0[register as usize]
    }

    pub fn set(&mut self, register: Register, value: i32) {
        self.0[register as usize] = value;
    }

    /// Iterates over all registers in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, i32)> + '_ {
        Register::iter().map(|register| (register, self.get(register)))
    }
}

impl Index<Register> for RegisterFile {
    type Output = i32;

    fn index(&self, register: Register) -> &Self::Output {
        &self.0[register as usize]
    }
}

impl IndexMut<Register> for RegisterFile {
    fn index_mut(&mut self, register: Register) -> &mut Self::Output {
        &mut self.0[register as usize]
    }
}

// Serialized as a `{"AX": .., "BX": .., ...}` map in register order.
impl Serialize for RegisterFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Register::COUNT))?;
        for (register, value) in self.iter() {
            map.serialize_entry(<&'static str>::from(register), &value)?;
        }
        map.end()
    }
}
