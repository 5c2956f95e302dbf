//! Oscillator (DCO) section of a source.

use std::fmt;

use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::{Coarse, EnvelopeLevel, EnvelopeTime, Fine, Key, Wave};
use crate::k5000::sysex::SystemExclusiveData;

/// Key scaling to pitch selector.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum KeyScalingToPitch {
    ZeroCent,
    TwentyFiveCent,
    ThirtyThreeCent,
    FiftyCent,
}

impl Default for KeyScalingToPitch {
    fn default() -> Self { KeyScalingToPitch::ZeroCent }
}

/// Pitch envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct PitchEnvelope {
    pub start: EnvelopeLevel,
    pub attack_time: EnvelopeTime,
    pub attack_level: EnvelopeLevel,
    pub decay_time: EnvelopeTime,
    pub time_vel_sens: EnvelopeLevel,
    pub level_vel_sens: EnvelopeLevel,
}

impl SystemExclusiveData for PitchEnvelope {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(PitchEnvelope {
            start: EnvelopeLevel::from_byte(data[0], 0)?,
            attack_time: EnvelopeTime::from_byte(data[1], 1)?,
            attack_level: EnvelopeLevel::from_byte(data[2], 2)?,
            decay_time: EnvelopeTime::from_byte(data[3], 3)?,
            time_vel_sens: EnvelopeLevel::from_byte(data[4], 4)?,
            level_vel_sens: EnvelopeLevel::from_byte(data[5], 5)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.start.as_byte(),
            self.attack_time.as_byte(),
            self.attack_level.as_byte(),
            self.decay_time.as_byte(),
            self.time_vel_sens.as_byte(),
            self.level_vel_sens.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 6;
}

/// Oscillator settings of a source.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Oscillator {
    pub wave: Wave,
    pub coarse: Coarse,
    pub fine: Fine,
    pub fixed_key: Key,  // 0 = off
    pub ks_to_pitch: KeyScalingToPitch,
    pub pitch_envelope: PitchEnvelope,
}

impl Oscillator {
    /// Makes a new oscillator on a PCM wave with default values.
    pub fn new() -> Self {
        Oscillator {
            wave: Wave::new(384),
            coarse: Default::default(),
            fine: Default::default(),
            fixed_key: Key::default(),
            ks_to_pitch: Default::default(),
            pitch_envelope: Default::default(),
        }
    }

    /// Makes a new oscillator on the additive engine with default values.
    pub fn additive() -> Self {
        Oscillator {
            wave: Wave::ADDITIVE,
            ..Oscillator::new()
        }
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Oscillator::new()
    }
}

impl fmt::Display for Oscillator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "wave = {}, coarse = {}, fine = {}", self.wave, self.coarse, self.fine)
    }
}

impl SystemExclusiveData for Oscillator {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(Oscillator {
            wave: Wave::from_bytes(data[0], data[1], 0)?,
            coarse: Coarse::from_byte(data[2], 2)?,
            fine: Fine::from_byte(data[3], 3)?,
            fixed_key: Key::from_byte(data[4], 4)?,
            ks_to_pitch: KeyScalingToPitch::try_from(data[5])
                .map_err(|_| ParseError::InvalidData(5))?,
            pitch_envelope: PitchEnvelope::from_bytes(&data[6..12]).map_err(|e| e.at(6))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.extend(self.wave.to_bytes());
        result.push(self.coarse.as_byte());
        result.push(self.fine.as_byte());
        result.push(self.fixed_key.as_byte());
        result.push(self.ks_to_pitch as u8);
        result.extend(self.pitch_envelope.to_bytes());

        result
    }

    const DATA_SIZE: usize = 12;
}
