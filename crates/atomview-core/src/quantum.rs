//! Quantum numbers and basis selection for hydrogen-like orbitals.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AtomViewError, Result};

/// The quantum numbers `(n, l, m)` of a hydrogen-like orbital.
///
/// A `QuantumState` can only be obtained through [`QuantumState::new`], so every
/// value in circulation satisfies `n >= 1`, `0 <= l < n` and `-l <= m <= l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QuantumState {
    n: u32,
    l: u32,
    m: i32,
}

impl QuantumState {
    /// Creates a validated quantum state.
    ///
    /// Out-of-range numbers are rejected, never clamped.
    pub fn new(n: u32, l: u32, m: i32) -> Result<Self> {
        let l_signed = i64::from(l);
        if n == 0 || l >= n || i64::from(m).abs() > l_signed {
            return Err(AtomViewError::InvalidQuantumState { n, l, m });
        }
        Ok(Self { n, l, m })
    }

    /// Principal quantum number.
    #[must_use]
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Azimuthal quantum number.
    #[must_use]
    pub fn l(&self) -> u32 {
        self.l
    }

    /// Magnetic quantum number.
    #[must_use]
    pub fn m(&self) -> i32 {
        self.m
    }

    /// Absolute value of the magnetic quantum number.
    #[must_use]
    pub fn m_abs(&self) -> u32 {
        self.m.unsigned_abs()
    }

    /// Number of radial nodes, `n - l - 1`.
    #[must_use]
    pub fn radial_nodes(&self) -> u32 {
        self.n - self.l - 1
    }

    /// Spectroscopic label such as `2p` or `3d`.
    #[must_use]
    pub fn label(&self) -> String {
        const SUBSHELLS: &[u8] = b"spdfghiklmnoqrtuv";
        let letter = SUBSHELLS
            .get(self.l as usize)
            .map_or('?', |&b| char::from(b));
        format!("{}{}", self.n, letter)
    }
}

impl Default for QuantumState {
    /// The ground state, 1s.
    fn default() -> Self {
        Self { n: 1, l: 0, m: 0 }
    }
}

impl fmt::Display for QuantumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (n={}, l={}, m={})", self.label(), self.n, self.l, self.m)
    }
}

impl<'de> Deserialize<'de> for QuantumState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            n: u32,
            l: u32,
            m: i32,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.n, raw.l, raw.m).map_err(serde::de::Error::custom)
    }
}

/// Angular basis used when evaluating a wavefunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Basis {
    /// Complex spherical harmonics `Y_l^m` (Condon-Shortley phase).
    #[default]
    Complex,
    /// Real spherical harmonics: `p_x`, `p_y`, `p_z`, `d_xy`, ...
    Real,
}

impl Basis {
    /// Maps the host's "real" toggle onto a basis.
    #[must_use]
    pub fn from_real_flag(real: bool) -> Self {
        if real {
            Basis::Real
        } else {
            Basis::Complex
        }
    }

    /// Returns true for the real basis.
    #[must_use]
    pub fn is_real(self) -> bool {
        matches!(self, Basis::Real)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_states() {
        assert!(QuantumState::new(1, 0, 0).is_ok());
        assert!(QuantumState::new(2, 1, -1).is_ok());
        assert!(QuantumState::new(4, 3, 3).is_ok());
    }

    #[test]
    fn test_invalid_states() {
        assert!(matches!(
            QuantumState::new(0, 0, 0),
            Err(AtomViewError::InvalidQuantumState { n: 0, .. })
        ));
        assert!(QuantumState::new(2, 2, 0).is_err());
        assert!(QuantumState::new(3, 1, 2).is_err());
        assert!(QuantumState::new(3, 1, -2).is_err());
        assert!(QuantumState::new(3, 2, i32::MIN).is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(QuantumState::new(1, 0, 0).unwrap().label(), "1s");
        assert_eq!(QuantumState::new(3, 2, 1).unwrap().label(), "3d");
        assert_eq!(QuantumState::new(5, 3, 0).unwrap().label(), "5f");
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let ok: QuantumState = serde_json::from_str(r#"{"n":2,"l":1,"m":1}"#).unwrap();
        assert_eq!(ok.m(), 1);
        assert!(serde_json::from_str::<QuantumState>(r#"{"n":2,"l":2,"m":0}"#).is_err());
    }

    #[test]
    fn test_basis_from_flag() {
        assert_eq!(Basis::from_real_flag(true), Basis::Real);
        assert_eq!(Basis::from_real_flag(false), Basis::Complex);
        assert!(Basis::Real.is_real());
    }

    proptest! {
        #[test]
        fn prop_validation_matches_ranges(n in 0u32..12, l in 0u32..12, m in -12i32..12) {
            let legal = n >= 1 && l < n && m.unsigned_abs() <= l;
            prop_assert_eq!(QuantumState::new(n, l, m).is_ok(), legal);
        }
    }
}
