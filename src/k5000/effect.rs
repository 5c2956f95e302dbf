//! Effect section of the common block.

use std::fmt;

use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::{ControlDepth, EffectDepth, EffectParameter};
use crate::k5000::control::ControlSource;
use crate::k5000::sysex::SystemExclusiveData;

/// Effect algorithm (1...4, stored as 0...3).
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum EffectAlgorithm {
    Algorithm1,
    Algorithm2,
    Algorithm3,
    Algorithm4,
}

impl Default for EffectAlgorithm {
    fn default() -> Self { EffectAlgorithm::Algorithm1 }
}

impl fmt::Display for EffectAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Algorithm {}", *self as u8 + 1)
    }
}

/// Effect type. The first eleven double as the reverb types.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum Effect {
    Hall1,
    Hall2,
    Hall3,
    Room1,
    Room2,
    Room3,
    Plate1,
    Plate2,
    Plate3,
    Reverse,
    LongDelay,
    EarlyReflection1,
    EarlyReflection2,
    TapDelay1,
    TapDelay2,
    SingleDelay,
    DualDelay,
    StereoDelay,
    CrossDelay,
    AutoPan,
    AutoPanAndDelay,
    Chorus1,
    Chorus2,
    Chorus1AndDelay,
    Chorus2AndDelay,
    Flanger1,
    Flanger2,
    Flanger1AndDelay,
    Flanger2AndDelay,
    Ensemble,
    EnsembleAndDelay,
    Celeste,
    CelesteAndDelay,
    Tremolo,
    TremoloAndDelay,
    Phaser1,
    Phaser2,
    Phaser1AndDelay,
    Phaser2AndDelay,
    Rotary,
    AutoWah,
    Bandpass,
    Exciter,
    Enhancer,
    Overdrive,
    Distortion,
    OverdriveAndDelay,
    DistortionAndDelay,
}

impl Default for Effect {
    fn default() -> Self { Effect::Hall1 }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One effect slot: type, dry/wet depth, and four parameters.
///
/// The parameters mean different things for each effect type; the
/// codec only preserves their encoding.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct EffectDefinition {
    pub effect: Effect,
    pub depth: EffectDepth,
    pub parameter1: EffectParameter,
    pub parameter2: EffectParameter,
    pub parameter3: EffectParameter,
    pub parameter4: EffectParameter,
}

impl fmt::Display for EffectDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, depth = {}, params = {}/{}/{}/{}",
            self.effect, self.depth,
            self.parameter1, self.parameter2, self.parameter3, self.parameter4)
    }
}

impl SystemExclusiveData for EffectDefinition {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(EffectDefinition {
            effect: Effect::try_from(data[0]).map_err(|_| ParseError::InvalidData(0))?,
            depth: EffectDepth::from_byte(data[1], 1)?,
            parameter1: EffectParameter::from_byte(data[2], 2)?,
            parameter2: EffectParameter::from_byte(data[3], 3)?,
            parameter3: EffectParameter::from_byte(data[4], 4)?,
            parameter4: EffectParameter::from_byte(data[5], 5)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.effect as u8,
            self.depth.as_byte(),
            self.parameter1.as_byte(),
            self.parameter2.as_byte(),
            self.parameter3.as_byte(),
            self.parameter4.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 6;
}

/// Effect settings of the common block: the algorithm selector,
/// the reverb, and the four effect slots.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct EffectSettings {
    pub algorithm: EffectAlgorithm,
    pub reverb: EffectDefinition,
    pub effect1: EffectDefinition,
    pub effect2: EffectDefinition,
    pub effect3: EffectDefinition,
    pub effect4: EffectDefinition,
}

impl fmt::Display for EffectSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\nreverb = {}\neffect1 = {}\neffect2 = {}\neffect3 = {}\neffect4 = {}",
            self.algorithm, self.reverb,
            self.effect1, self.effect2, self.effect3, self.effect4)
    }
}

impl SystemExclusiveData for EffectSettings {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(EffectSettings {
            algorithm: EffectAlgorithm::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            reverb: EffectDefinition::from_bytes(&data[1..7]).map_err(|e| e.at(1))?,
            effect1: EffectDefinition::from_bytes(&data[7..13]).map_err(|e| e.at(7))?,
            effect2: EffectDefinition::from_bytes(&data[13..19]).map_err(|e| e.at(13))?,
            effect3: EffectDefinition::from_bytes(&data[19..25]).map_err(|e| e.at(19))?,
            effect4: EffectDefinition::from_bytes(&data[25..31]).map_err(|e| e.at(25))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.push(self.algorithm as u8);
        result.extend(self.reverb.to_bytes());
        result.extend(self.effect1.to_bytes());
        result.extend(self.effect2.to_bytes());
        result.extend(self.effect3.to_bytes());
        result.extend(self.effect4.to_bytes());

        result
    }

    const DATA_SIZE: usize = 31;
}

/// Modulation destination inside the effect section.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum EffectDestination {
    Effect1DryWet,
    Effect1Parameter,
    Effect2DryWet,
    Effect2Parameter,
    Effect3DryWet,
    Effect3Parameter,
    Effect4DryWet,
    Effect4Parameter,
}

impl Default for EffectDestination {
    fn default() -> Self { EffectDestination::Effect1DryWet }
}

/// One effect modulation route: physical source, destination, depth.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct EffectControlRoute {
    pub source: ControlSource,
    pub destination: EffectDestination,
    pub depth: ControlDepth,
}

impl SystemExclusiveData for EffectControlRoute {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(EffectControlRoute {
            source: ControlSource::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            destination: EffectDestination::try_from(data[1])
                .map_err(|_| ParseError::InvalidData(1))?,
            depth: ControlDepth::from_byte(data[2], 2)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.source as u8, self.destination as u8, self.depth.as_byte()]
    }

    const DATA_SIZE: usize = 3;
}

/// Effect control block with its two modulation routes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct EffectControl {
    pub route1: EffectControlRoute,
    pub route2: EffectControlRoute,
}

impl SystemExclusiveData for EffectControl {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(EffectControl {
            route1: EffectControlRoute::from_bytes(&data[0..3])?,
            route2: EffectControlRoute::from_bytes(&data[3..6]).map_err(|e| e.at(3))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();
        result.extend(self.route1.to_bytes());
        result.extend(self.route2.to_bytes());
        result
    }

    const DATA_SIZE: usize = 6;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ranged;

    #[test]
    fn test_effect_definition_from_bytes() {
        let data = vec![0x10, 0x00, 0x58, 0x33, 0x69, 0x22];
        let effect = EffectDefinition::from_bytes(&data).unwrap();
        assert_eq!(effect.effect, Effect::DualDelay);
        assert_eq!(effect.parameter3.value(), 0x69);
    }

    #[test]
    fn test_effect_definition_rejects_unknown_type() {
        let data = vec![0x30, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(
            EffectDefinition::from_bytes(&data),
            Err(ParseError::InvalidData(0))
        );
    }

    #[test]
    fn test_effect_settings_round_trip() {
        let settings = EffectSettings {
            algorithm: EffectAlgorithm::Algorithm2,
            reverb: EffectDefinition {
                effect: Effect::Room1,
                depth: EffectDepth::new(30),
                parameter1: EffectParameter::new(13),
                ..Default::default()
            },
            effect1: EffectDefinition {
                effect: Effect::Chorus1,
                depth: EffectDepth::new(64),
                ..Default::default()
            },
            ..Default::default()
        };

        let data = settings.to_bytes();
        assert_eq!(data.len(), EffectSettings::DATA_SIZE);
        assert_eq!(EffectSettings::from_bytes(&data).unwrap(), settings);
    }

    #[test]
    fn test_effect_settings_offset_in_nested_error() {
        let mut data = EffectSettings::default().to_bytes();
        data[13] = 0x7f;  // effect 2 type
        assert_eq!(
            EffectSettings::from_bytes(&data),
            Err(ParseError::InvalidData(13))
        );
    }

    #[test]
    fn test_effect_control_round_trip() {
        let control = EffectControl {
            route1: EffectControlRoute {
                source: ControlSource::Wheel,
                destination: EffectDestination::Effect1Parameter,
                depth: ControlDepth::new(0),
            },
            route2: EffectControlRoute {
                source: ControlSource::ChannelPressure,
                destination: EffectDestination::Effect2Parameter,
                depth: ControlDepth::new(-20),
            },
        };

        let data = control.to_bytes();
        assert_eq!(data.len(), EffectControl::DATA_SIZE);
        assert_eq!(EffectControl::from_bytes(&data).unwrap(), control);
    }
}
