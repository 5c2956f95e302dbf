//! LFO section of a source.

use std::fmt;

use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::{KeyScalingDepth, Level, LfoDepth, LfoSpeed};
use crate::k5000::sysex::SystemExclusiveData;

/// LFO waveform.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum LfoWaveform {
    Triangle,
    Square,
    Sawtooth,
    Sine,
    Random,
}

impl Default for LfoWaveform {
    fn default() -> Self { LfoWaveform::Triangle }
}

/// One LFO modulation target: depth plus key scaling.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct LfoModulation {
    pub depth: LfoDepth,
    pub key_scaling: KeyScalingDepth,
}

impl SystemExclusiveData for LfoModulation {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(LfoModulation {
            depth: LfoDepth::from_byte(data[0], 0)?,
            key_scaling: KeyScalingDepth::from_byte(data[1], 1)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.depth.as_byte(), self.key_scaling.as_byte()]
    }

    const DATA_SIZE: usize = 2;
}

/// LFO settings of a source. Vibrato modulates pitch, growl the
/// filter, and tremolo the amplifier.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Lfo {
    pub waveform: LfoWaveform,
    pub speed: LfoSpeed,
    pub delay_onset: Level,
    pub fade_in_time: Level,
    pub fade_in_to_speed: LfoSpeed,
    pub vibrato: LfoModulation,
    pub growl: LfoModulation,
    pub tremolo: LfoModulation,
}

impl fmt::Display for Lfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}, speed = {}, vibrato = {}, growl = {}, tremolo = {}",
            self.waveform, self.speed,
            self.vibrato.depth, self.growl.depth, self.tremolo.depth)
    }
}

impl SystemExclusiveData for Lfo {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(Lfo {
            waveform: LfoWaveform::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            speed: LfoSpeed::from_byte(data[1], 1)?,
            delay_onset: Level::from_byte(data[2], 2)?,
            fade_in_time: Level::from_byte(data[3], 3)?,
            fade_in_to_speed: LfoSpeed::from_byte(data[4], 4)?,
            vibrato: LfoModulation::from_bytes(&data[5..7]).map_err(|e| e.at(5))?,
            growl: LfoModulation::from_bytes(&data[7..9]).map_err(|e| e.at(7))?,
            tremolo: LfoModulation::from_bytes(&data[9..11]).map_err(|e| e.at(9))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.push(self.waveform as u8);
        result.push(self.speed.as_byte());
        result.push(self.delay_onset.as_byte());
        result.push(self.fade_in_time.as_byte());
        result.push(self.fade_in_to_speed.as_byte());
        result.extend(self.vibrato.to_bytes());
        result.extend(self.growl.to_bytes());
        result.extend(self.tremolo.to_bytes());

        result
    }

    const DATA_SIZE: usize = 11;
}
