//! Amplifier (DCA) section of a source.

use crate::ParseError;
use crate::k5000::{ControlTime, EnvelopeTime, KeyScalingDepth, Level};
use crate::k5000::control::VelocityCurve;
use crate::k5000::sysex::SystemExclusiveData;

/// Amplifier envelope. All segments are unsigned, unlike the filter's.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct AmpEnvelope {
    pub attack_time: EnvelopeTime,
    pub decay1_time: EnvelopeTime,
    pub decay1_level: Level,
    pub decay2_time: EnvelopeTime,
    pub decay2_level: Level,
    pub release_time: EnvelopeTime,
}

impl SystemExclusiveData for AmpEnvelope {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(AmpEnvelope {
            attack_time: EnvelopeTime::from_byte(data[0], 0)?,
            decay1_time: EnvelopeTime::from_byte(data[1], 1)?,
            decay1_level: Level::from_byte(data[2], 2)?,
            decay2_time: EnvelopeTime::from_byte(data[3], 3)?,
            decay2_level: Level::from_byte(data[4], 4)?,
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

/// Key scaling offsets to the amplifier envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct KeyScalingToGain {
    pub level: KeyScalingDepth,
    pub attack_time: ControlTime,
    pub decay1_time: ControlTime,
    pub release_time: ControlTime,
}

impl SystemExclusiveData for KeyScalingToGain {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(KeyScalingToGain {
            level: KeyScalingDepth::from_byte(data[0], 0)?,
            attack_time: ControlTime::from_byte(data[1], 1)?,
            decay1_time: ControlTime::from_byte(data[2], 2)?,
            release_time: ControlTime::from_byte(data[3], 3)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.level.as_byte(),
            self.attack_time.as_byte(),
            self.decay1_time.as_byte(),
            self.release_time.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 4;
}

/// Velocity sensitivity of the amplifier envelope.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct VelocitySensitivity {
    pub level: Level,
    pub attack_time: ControlTime,
    pub decay1_time: ControlTime,
    pub release_time: ControlTime,
}

impl SystemExclusiveData for VelocitySensitivity {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(VelocitySensitivity {
            level: Level::from_byte(data[0], 0)?,
            attack_time: ControlTime::from_byte(data[1], 1)?,
            decay1_time: ControlTime::from_byte(data[2], 2)?,
            release_time: ControlTime::from_byte(data[3], 3)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.level.as_byte(),
            self.attack_time.as_byte(),
            self.decay1_time.as_byte(),
            self.release_time.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 4;
}

/// Amplifier settings of a source.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Amplifier {
    pub velocity_curve: VelocityCurve,
    pub envelope: AmpEnvelope,
    pub ks_to_env: KeyScalingToGain,
    pub vel_sens: VelocitySensitivity,
}

impl SystemExclusiveData for Amplifier {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(Amplifier {
            velocity_curve: VelocityCurve::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            envelope: AmpEnvelope::from_bytes(&data[1..7]).map_err(|e| e.at(1))?,
            ks_to_env: KeyScalingToGain::from_bytes(&data[7..11]).map_err(|e| e.at(7))?,
            vel_sens: VelocitySensitivity::from_bytes(&data[11..15]).map_err(|e| e.at(11))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.push(self.velocity_curve as u8);
        result.extend(self.envelope.to_bytes());
        result.extend(self.ks_to_env.to_bytes());
        result.extend(self.vel_sens.to_bytes());

        result
    }

    const DATA_SIZE: usize = 15;
}
