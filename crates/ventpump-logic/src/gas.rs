//! Gas quantities the regulator reads and moves.
//!
//! The regulator never owns a mixture. It reads pressure, volume and
//! temperature through [`GasMixture`] and hands back a mole count; the host
//! then calls [`GasMixture::remove`] and [`GasMixture::merge`] itself.
//!
//! [`IdealGasMixture`] is a single-species reference implementation used by
//! the engine crate and the tests.
//!
//! ```
//! use ventpump_logic::gas::{GasMixture, IdealGasMixture};
//!
//! let mut tank = IdealGasMixture::at_pressure(200.0, 10.0, 300.0);
//! let taken = tank.remove(0.5);
//! assert!((taken.total_moles() - 0.5).abs() < 1e-6);
//! assert!(tank.pressure() < 200.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::GAS_CONSTANT;

/// Quantity of gas with an ideal-gas pressure.
pub trait GasMixture: Clone {
    /// Pressure in kPa.
    fn pressure(&self) -> f32;
    /// Volume in litres.
    fn volume(&self) -> f32;
    /// Temperature in Kelvin. Always positive.
    fn temperature(&self) -> f32;
    /// Total moles held.
    fn total_moles(&self) -> f32;
    /// Extract up to `moles`, keeping temperature. Never leaves negative moles.
    fn remove(&mut self, moles: f32) -> Self;
    /// Combine `source` into `self`.
    fn merge(&mut self, source: Self);
    /// Scale every species by `ratio`.
    fn multiply(&mut self, ratio: f32);
    fn set_volume(&mut self, volume: f32);
}

/// Resolves the ambient mixture at a location.
pub trait AtmosphereEngine {
    type Location;
    type Mixture: GasMixture;

    /// `None` when the location is sealed or air-blocked.
    fn containing_mixture(&mut self, location: &Self::Location) -> Option<&mut Self::Mixture>;
}

/// Moles needed to change the pressure of `volume` at `temperature` by `pressure`.
pub fn moles_for_pressure(pressure: f32, volume: f32, temperature: f32) -> f32 {
    pressure * volume / (temperature * GAS_CONSTANT)
}

/// Single-species ideal gas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealGasMixture {
    pub moles: f32,
    pub volume: f32,
    pub temperature: f32,
}

impl IdealGasMixture {
    pub fn new(moles: f32, volume: f32, temperature: f32) -> Self {
        Self {
            moles: moles.max(0.0),
            volume: volume.max(0.0),
            temperature,
        }
    }

    /// Mixture holding exactly enough moles to read `pressure`.
    pub fn at_pressure(pressure: f32, volume: f32, temperature: f32) -> Self {
        Self::new(
            moles_for_pressure(pressure, volume, temperature),
            volume,
            temperature,
        )
    }

    /// Empty mixture of the given volume.
    pub fn vacuum(volume: f32, temperature: f32) -> Self {
        Self::new(0.0, volume, temperature)
    }
}

impl GasMixture for IdealGasMixture {
    fn pressure(&self) -> f32 {
        if self.volume <= 0.0 {
            return 0.0;
        }
        self.moles * GAS_CONSTANT * self.temperature / self.volume
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn total_moles(&self) -> f32 {
        self.moles
    }

    fn remove(&mut self, moles: f32) -> Self {
        let taken = moles.clamp(0.0, self.moles);
        self.moles -= taken;
        Self {
            moles: taken,
            volume: self.volume,
            temperature: self.temperature,
        }
    }

    fn merge(&mut self, source: Self) {
        let total = self.moles + source.moles;
        if total > 0.0 {
            // Same species on both sides, so heat capacity weighting is mole weighting.
            self.temperature =
                (self.moles * self.temperature + source.moles * source.temperature) / total;
        }
        self.moles = total;
    }

    fn multiply(&mut self, ratio: f32) {
        self.moles = (self.moles * ratio).max(0.0);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.max(0.0);
    }
}
