//! One source of a single patch: control block plus the DCO, DCF,
//! DCA, and LFO sub-records.

use std::fmt;

use crate::ParseError;
use crate::k5000::{
    BenderCutoff,
    BenderPitch,
    EffectPath,
    Key,
    KeyOnDelay,
    Volume
};
use crate::k5000::amp::Amplifier;
use crate::k5000::control::{ModulationSettings, PanSettings, VelocitySwitchSettings};
use crate::k5000::filter::Filter;
use crate::k5000::lfo::Lfo;
use crate::k5000::osc::Oscillator;
use crate::k5000::sysex::SystemExclusiveData;

/// Maximum number of sources in a single patch.
pub const MAX_SOURCE_COUNT: u8 = 6;

/// Control settings of a source.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SourceControl {
    pub zone_low: Key,
    pub zone_high: Key,
    pub velocity_switch: VelocitySwitchSettings,
    pub effect_path: EffectPath,
    pub volume: Volume,
    pub bender_pitch: BenderPitch,
    pub bender_cutoff: BenderCutoff,
    pub modulation: ModulationSettings,
    pub key_on_delay: KeyOnDelay,
    pub pan: PanSettings,
}

impl Default for SourceControl {
    fn default() -> Self {
        use crate::Ranged;

        SourceControl {
            zone_low: Key::new(0),
            zone_high: Key::new(127),
            velocity_switch: Default::default(),
            effect_path: Default::default(),
            volume: Volume::new(100),
            bender_pitch: Default::default(),
            bender_cutoff: Default::default(),
            modulation: Default::default(),
            key_on_delay: Default::default(),
            pan: Default::default(),
        }
    }
}

impl fmt::Display for SourceControl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "zone = {}...{}, volume = {}, velocity switch = {}",
            self.zone_low.name(), self.zone_high.name(),
            self.volume, self.velocity_switch)
    }
}

impl SystemExclusiveData for SourceControl {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(SourceControl {
            zone_low: Key::from_byte(data[0], 0)?,
            zone_high: Key::from_byte(data[1], 1)?,
            velocity_switch: VelocitySwitchSettings::from_bytes(&data[2..3])
                .map_err(|e| e.at(2))?,
            effect_path: EffectPath::from_byte(data[3], 3)?,
            volume: Volume::from_byte(data[4], 4)?,
            bender_pitch: BenderPitch::from_byte(data[5], 5)?,
            bender_cutoff: BenderCutoff::from_byte(data[6], 6)?,
            modulation: ModulationSettings::from_bytes(&data[7..25]).map_err(|e| e.at(7))?,
            key_on_delay: KeyOnDelay::from_byte(data[25], 25)?,
            pan: PanSettings::from_bytes(&data[26..28]).map_err(|e| e.at(26))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.push(self.zone_low.as_byte());
        result.push(self.zone_high.as_byte());
        result.extend(self.velocity_switch.to_bytes());
        result.push(self.effect_path.as_byte());
        result.push(self.volume.as_byte());
        result.push(self.bender_pitch.as_byte());
        result.push(self.bender_cutoff.as_byte());
        result.extend(self.modulation.to_bytes());
        result.push(self.key_on_delay.as_byte());
        result.extend(self.pan.to_bytes());

        result
    }

    const DATA_SIZE: usize = 28;
}

/// Source. The order of the sources in a patch is significant:
/// it maps to the physical source slots of the instrument.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct Source {
    pub control: SourceControl,
    pub oscillator: Oscillator,
    pub filter: Filter,
    pub amplifier: Amplifier,
    pub lfo: Lfo,
}

impl Source {
    /// Makes a new PCM source with default values.
    pub fn pcm() -> Source {
        Default::default()
    }

    /// Makes a new ADD source with default values.
    pub fn additive() -> Source {
        Source {
            oscillator: Oscillator::additive(),
            ..Default::default()
        }
    }

    /// Returns `true` if this source runs on the additive engine.
    pub fn is_additive(&self) -> bool {
        self.oscillator.wave.is_additive()
    }

    /// Returns `true` if this source plays a PCM wave.
    pub fn is_pcm(&self) -> bool {
        !self.is_additive()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}\nDCF: {}\nLFO: {}",
            self.control, self.oscillator, self.filter, self.lfo)
    }
}

impl SystemExclusiveData for Source {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(Source {
            control: SourceControl::from_bytes(&data[..28])?,
            oscillator: Oscillator::from_bytes(&data[28..40]).map_err(|e| e.at(28))?,
            filter: Filter::from_bytes(&data[40..60]).map_err(|e| e.at(40))?,
            amplifier: Amplifier::from_bytes(&data[60..75]).map_err(|e| e.at(60))?,
            lfo: Lfo::from_bytes(&data[75..86]).map_err(|e| e.at(75))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.extend(self.control.to_bytes());
        result.extend(self.oscillator.to_bytes());
        result.extend(self.filter.to_bytes());
        result.extend(self.amplifier.to_bytes());
        result.extend(self.lfo.to_bytes());

        result
    }

    const DATA_SIZE: usize = 86;
}

/// Decodes exactly `count` source records laid out back to back.
///
/// The count comes from the common block and must be 1...6. A buffer
/// with fewer than `count` records fails with `TruncatedInput` before
/// anything is read.
pub fn decode_sources(data: &[u8], count: u8) -> Result<Vec<Source>, ParseError> {
    if count < 1 || count > MAX_SOURCE_COUNT {
        return Err(ParseError::InvalidSourceCount(count));
    }

    let needed = count as usize * Source::DATA_SIZE;
    if data.len() < needed {
        return Err(ParseError::TruncatedInput(needed, data.len()));
    }

    let mut sources = Vec::<Source>::with_capacity(count as usize);
    let mut offset = 0;
    for _ in 0..count {
        let source = Source::from_bytes(&data[offset..offset + Source::DATA_SIZE])
            .map_err(|e| e.at(offset))?;
        sources.push(source);
        offset += Source::DATA_SIZE;
    }

    Ok(sources)
}

/// Encodes the sources back to back, in slot order.
pub fn encode_sources(sources: &[Source]) -> Vec<u8> {
    let mut result: Vec<u8> = Vec::with_capacity(sources.len() * Source::DATA_SIZE);
    for source in sources {
        result.extend(source.to_bytes());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ranged;

    #[test]
    fn test_source_data_size() {
        assert_eq!(Source::pcm().to_bytes().len(), Source::DATA_SIZE);
        assert_eq!(
            SourceControl::DATA_SIZE + Oscillator::DATA_SIZE + Filter::DATA_SIZE
                + Amplifier::DATA_SIZE + Lfo::DATA_SIZE,
            Source::DATA_SIZE
        );
    }

    #[test]
    fn test_source_round_trip() {
        let source = Source::additive();
        let data = source.to_bytes();
        assert_eq!(Source::from_bytes(&data).unwrap(), source);
    }

    #[test]
    fn test_decode_sources_count_bounds() {
        let data = vec![0u8; 7 * Source::DATA_SIZE];
        assert_eq!(decode_sources(&data, 0), Err(ParseError::InvalidSourceCount(0)));
        assert_eq!(decode_sources(&data, 7), Err(ParseError::InvalidSourceCount(7)));
    }

    #[test]
    fn test_decode_sources_all_valid_counts() {
        let one = Source::pcm().to_bytes();
        for count in 1..=MAX_SOURCE_COUNT {
            let mut data = Vec::new();
            for _ in 0..count {
                data.extend(&one);
            }
            let sources = decode_sources(&data, count).unwrap();
            assert_eq!(sources.len(), count as usize);
        }
    }

    #[test]
    fn test_decode_sources_truncated() {
        let mut data = encode_sources(&[Source::pcm(), Source::pcm()]);
        data.truncate(data.len() - 1);
        assert_eq!(
            decode_sources(&data, 2),
            Err(ParseError::TruncatedInput(2 * Source::DATA_SIZE, 2 * Source::DATA_SIZE - 1))
        );
    }

    #[test]
    fn test_encode_sources_preserves_order() {
        let mut loud = Source::pcm();
        loud.control.volume = Volume::new(127);

        let data = encode_sources(&[loud, Source::pcm()]);
        let sources = decode_sources(&data, 2).unwrap();
        assert_eq!(sources[0], loud);
        assert_ne!(sources[1], loud);
    }
}
