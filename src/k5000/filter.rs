//! Filter (DCF) section of a source.

use std::fmt;

use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::{
    ControlTime,
    Cutoff,
    EnvelopeDepth,
    EnvelopeLevel,
    EnvelopeTime,
    FilterLevel,
    Resonance
};
use crate::k5000::control::VelocityCurve;
use crate::k5000::sysex::SystemExclusiveData;

/// Filter mode.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

impl Default for FilterMode {
    fn default() -> Self { FilterMode::LowPass }
}

/// Filter envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct FilterEnvelope {
    pub attack_time: EnvelopeTime,
    pub decay1_time: EnvelopeTime,
    pub decay1_level: EnvelopeLevel,
    pub decay2_time: EnvelopeTime,
    pub decay2_level: EnvelopeLevel,
    pub release_time: EnvelopeTime,
}

impl SystemExclusiveData for FilterEnvelope {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(FilterEnvelope {
            attack_time: EnvelopeTime::from_byte(data[0], 0)?,
            decay1_time: EnvelopeTime::from_byte(data[1], 1)?,
            decay1_level: EnvelopeLevel::from_byte(data[2], 2)?,
            decay2_time: EnvelopeTime::from_byte(data[3], 3)?,
            decay2_level: EnvelopeLevel::from_byte(data[4], 4)?,
            release_time: EnvelopeTime::from_byte(data[5], 5)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.attack_time.as_byte(),
            self.decay1_time.as_byte(),
            self.decay1_level.as_byte(),
            self.decay2_time.as_byte(),
            self.decay2_level.as_byte(),
            self.release_time.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 6;
}

/// Key scaling offsets to the filter envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct KeyScalingToEnvelope {
    pub attack_time: ControlTime,
    pub decay1_time: ControlTime,
}

impl SystemExclusiveData for KeyScalingToEnvelope {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(KeyScalingToEnvelope {
            attack_time: ControlTime::from_byte(data[0], 0)?,
            decay1_time: ControlTime::from_byte(data[1], 1)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.attack_time.as_byte(), self.decay1_time.as_byte()]
    }

    const DATA_SIZE: usize = 2;
}

/// Velocity offsets to the filter envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct VelocityToEnvelope {
    pub depth: EnvelopeDepth,
    pub attack_time: ControlTime,
    pub decay1_time: ControlTime,
}

impl SystemExclusiveData for VelocityToEnvelope {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(VelocityToEnvelope {
            depth: EnvelopeDepth::from_byte(data[0], 0)?,
            attack_time: ControlTime::from_byte(data[1], 1)?,
            decay1_time: ControlTime::from_byte(data[2], 2)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.depth.as_byte(),
            self.attack_time.as_byte(),
            self.decay1_time.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 3;
}

/// Filter settings of a source.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Filter {
    pub bypassed: bool,
    pub mode: FilterMode,
    pub velocity_curve: VelocityCurve,
    pub resonance: Resonance,
    pub level: FilterLevel,
    pub cutoff: Cutoff,
    pub ks_to_cutoff: EnvelopeDepth,
    pub vel_to_cutoff: EnvelopeDepth,
    pub envelope_depth: EnvelopeDepth,
    pub envelope: FilterEnvelope,
    pub ks_to_env: KeyScalingToEnvelope,
    pub vel_to_env: VelocityToEnvelope,
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?} cutoff = {} resonance = {}{}",
            self.mode, self.cutoff, self.resonance,
            if self.bypassed { " (bypassed)" } else { "" })
    }
}

impl SystemExclusiveData for Filter {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(Filter {
            bypassed: match data[0] {
                0 => false,
                1 => true,
                _ => return Err(ParseError::InvalidData(0)),
            },
            mode: FilterMode::try_from(data[1]).map_err(|_| ParseError::InvalidData(1))?,
            velocity_curve: VelocityCurve::try_from(data[2])
                .map_err(|_| ParseError::InvalidData(2))?,
            resonance: Resonance::from_byte(data[3], 3)?,
            level: FilterLevel::from_byte(data[4], 4)?,
            cutoff: Cutoff::from_byte(data[5], 5)?,
            ks_to_cutoff: EnvelopeDepth::from_byte(data[6], 6)?,
            vel_to_cutoff: EnvelopeDepth::from_byte(data[7], 7)?,
            envelope_depth: EnvelopeDepth::from_byte(data[8], 8)?,
            envelope: FilterEnvelope::from_bytes(&data[9..15]).map_err(|e| e.at(9))?,
            ks_to_env: KeyScalingToEnvelope::from_bytes(&data[15..17]).map_err(|e| e.at(15))?,
            vel_to_env: VelocityToEnvelope::from_bytes(&data[17..20]).map_err(|e| e.at(17))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.push(if self.bypassed { 1 } else { 0 });
        result.push(self.mode as u8);
        result.push(self.velocity_curve as u8);
        result.push(self.resonance.as_byte());
        result.push(self.level.as_byte());
        result.push(self.cutoff.as_byte());
        result.push(self.ks_to_cutoff.as_byte());
        result.push(self.vel_to_cutoff.as_byte());
        result.push(self.envelope_depth.as_byte());
        result.extend(self.envelope.to_bytes());
        result.extend(self.ks_to_env.to_bytes());
        result.extend(self.vel_to_env.to_bytes());

        result
    }

    const DATA_SIZE: usize = 20;
}
