use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Bit-packed node configuration flags.
///
/// The code is an opaque small integer, used as key of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Configuration(u8);

impl Configuration {
    pub const NONE: Self = Self(0);
    /// Results are retained in the frame cache
    pub const CACHING: Self = Self(1 << 0);
    /// Node computes from predecessors (as opposed to reading source data)
    pub const PROCESS: Self = Self(1 << 1);
    /// Outputs reuse the input buffers
    pub const INPLACE: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    pub const fn from_code(code: u8) -> Self {
        Self(code)
    }

    pub fn from_flags(caching: bool, process: bool, inplace: bool) -> Self {
        let mut config = Self::NONE;
        if caching {
            config = config | Self::CACHING;
        }
        if process {
            config = config | Self::PROCESS;
        }
        if inplace {
            config = config | Self::INPLACE;
        }
        config
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn contains(self, flags: Configuration) -> bool {
        self.0 & flags.0 == flags.0
    }

    /// All nominal flag combinations
    pub fn all_combinations() -> impl Iterator<Item = Configuration> {
        (0..=Self::ALL.0).map(Self)
    }
}

impl BitOr for Configuration {
    type Output = Configuration;

    fn bitor(self, rhs: Configuration) -> Configuration {
        Configuration(self.0 | rhs.0)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::CACHING, "CACHING"),
            (Self::PROCESS, "PROCESS"),
            (Self::INPLACE, "INPLACE"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| *name)
        .collect();

        if names.is_empty() {
            write!(f, "SOURCE")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}
