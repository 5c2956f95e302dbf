//! The single patch: common block, sources, and the dump aggregate.

use std::fmt;

use bit::BitIndex;
use log::{debug, warn};

use crate::{
    ParseError,
    Ranged
};
use crate::k5000::{GeqLevel, MacroDepth, PortamentoSpeed, Volume};
use crate::k5000::control::{
    AmplitudeModulation,
    ControlDestination,
    MacroController,
    Polyphony,
    SwitchControl
};
use crate::k5000::effect::{EffectControl, EffectSettings};
use crate::k5000::source::{decode_sources, encode_sources, Source, MAX_SOURCE_COUNT};
use crate::k5000::sysex::{self, DumpHeader, SystemExclusiveData};

/// Number of characters in a patch name.
pub const NAME_LENGTH: usize = 8;

// Patch names use the printable ASCII subset of the device character set.
fn name_from_bytes(data: &[u8], base: usize) -> Result<String, ParseError> {
    for (i, b) in data.iter().enumerate() {
        if !(0x20..=0x7e).contains(b) {
            return Err(ParseError::InvalidData(base + i));
        }
    }
    Ok(String::from_utf8(data.to_vec()).expect("name bytes are ASCII"))
}

fn name_to_bytes(name: &str) -> Vec<u8> {
    let mut result = format!("{:<8}", name).into_bytes();
    result.truncate(NAME_LENGTH);
    result
}

/// Single patch common data, a fixed 81-byte block.
#[derive(Debug, Clone, PartialEq)]
pub struct Common {
    pub effects: EffectSettings,
    pub geq: [GeqLevel; 7],
    pub name: String,
    pub volume: Volume,
    pub polyphony: Polyphony,
    pub source_count: u8,
    pub source_mutes: [bool; 6],
    pub amplitude_modulation: AmplitudeModulation,
    pub effect_control: EffectControl,
    pub portamento_enabled: bool,
    pub portamento_speed: PortamentoSpeed,
    pub macros: [MacroController; 4],
    pub switches: SwitchControl,
}

impl Default for Common {
    fn default() -> Self {
        Common {
            effects: Default::default(),
            geq: [GeqLevel::new(0); 7],
            name: "NewSound".to_string(),
            volume: Volume::new(115),
            polyphony: Polyphony::Poly1,
            source_count: 2,
            source_mutes: [false, false, true, true, true, true],
            amplitude_modulation: Default::default(),
            effect_control: Default::default(),
            portamento_enabled: false,
            portamento_speed: Default::default(),
            macros: [Default::default(); 4],
            switches: Default::default(),
        }
    }
}

impl fmt::Display for Common {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
            "{}\nVolume: {:3}  Sources: {}  Poly: {}  AM: {}\n\nEffect settings:\n{}\n",
            self.name, self.volume, self.source_count, self.polyphony,
            self.amplitude_modulation, self.effects)
    }
}

impl SystemExclusiveData for Common {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }

        let effects = EffectSettings::from_bytes(&data[0..31])?;

        let mut geq = [GeqLevel::new(0); 7];
        for (i, band) in geq.iter_mut().enumerate() {
            *band = GeqLevel::from_byte(data[31 + i], 31 + i)?;
        }

        // data[38] is the drum mark, always zero for a single patch

        let name = name_from_bytes(&data[39..47], 39)?;
        let volume = Volume::from_byte(data[47], 47)?;
        let polyphony = Polyphony::try_from(data[48])
            .map_err(|_| ParseError::InvalidData(48))?;

        // data[49] is unused

        let source_count = data[50];

        let mutes_byte = data[51];
        let mut source_mutes = [false; 6];
        for (i, mute) in source_mutes.iter_mut().enumerate() {
            *mute = mutes_byte.bit(i);
        }

        let amplitude_modulation = AmplitudeModulation::try_from(data[52])
            .map_err(|_| ParseError::InvalidData(52))?;

        let effect_control = EffectControl::from_bytes(&data[53..59])
            .map_err(|e| e.at(53))?;

        let portamento_enabled = match data[59] {
            0 => false,
            1 => true,
            _ => return Err(ParseError::InvalidData(59)),
        };
        let portamento_speed = PortamentoSpeed::from_byte(data[60], 60)?;

        // The macro destination pairs come first, then all the depth
        // pairs, unlike the inline layout inside a source.
        let mut macros: [MacroController; 4] = [Default::default(); 4];
        for (i, m) in macros.iter_mut().enumerate() {
            let dest_offset = 61 + 2 * i;
            let depth_offset = 69 + 2 * i;
            *m = MacroController {
                destination1: ControlDestination::try_from(data[dest_offset])
                    .map_err(|_| ParseError::InvalidData(dest_offset))?,
                depth1: MacroDepth::from_byte(data[depth_offset], depth_offset)?,
                destination2: ControlDestination::try_from(data[dest_offset + 1])
                    .map_err(|_| ParseError::InvalidData(dest_offset + 1))?,
                depth2: MacroDepth::from_byte(data[depth_offset + 1], depth_offset + 1)?,
            };
        }

        let switches = SwitchControl::from_bytes(&data[77..81]).map_err(|e| e.at(77))?;

        Ok(Common {
            effects,
            geq,
            name,
            volume,
            polyphony,
            source_count,
            source_mutes,
            amplitude_modulation,
            effect_control,
            portamento_enabled,
            portamento_speed,
            macros,
            switches,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.effects.to_bytes();

        result.extend(self.geq.iter().map(|band| band.as_byte()));
        result.push(0);  // drum mark
        result.extend(name_to_bytes(&self.name));
        result.push(self.volume.as_byte());
        result.push(self.polyphony as u8);
        result.push(0);  // unused
        result.push(self.source_count);

        let mut mute_byte = 0x00u8;
        for (i, muted) in self.source_mutes.iter().enumerate() {
            mute_byte.set_bit(i, *muted);
        }
        result.push(mute_byte);

        result.push(self.amplitude_modulation as u8);
        result.extend(self.effect_control.to_bytes());
        result.push(if self.portamento_enabled { 1 } else { 0 });
        result.push(self.portamento_speed.as_byte());

        for m in &self.macros {
            result.push(m.destination1 as u8);
            result.push(m.destination2 as u8);
        }
        for m in &self.macros {
            result.push(m.depth1.as_byte());
            result.push(m.depth2.as_byte());
        }

        result.extend(self.switches.to_bytes());

        result
    }

    const DATA_SIZE: usize = 81;
}

/// Single patch: common block plus 1...6 sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SinglePatch {
    pub common: Common,
    pub sources: Vec<Source>,
}

impl SinglePatch {
    /// Returns a single patch with the given number of default PCM
    /// and ADD sources.
    pub fn new(pcm_count: u8, additive_count: u8) -> SinglePatch {
        let mut sources = Vec::<Source>::new();
        for _ in 0..pcm_count {
            sources.push(Source::pcm());
        }
        for _ in 0..additive_count {
            sources.push(Source::additive());
        }

        SinglePatch {
            common: Common {
                source_count: pcm_count + additive_count,
                ..Default::default()
            },
            sources,
        }
    }

    /// Size of this patch's body in bytes (common block and sources,
    /// not counting the checksum byte).
    pub fn body_size(&self) -> usize {
        Common::DATA_SIZE + self.sources.len() * Source::DATA_SIZE
    }

    // Guards against emitting a corrupt frame from values that the
    // type system does not already constrain.
    fn validate(&self) -> Result<(), ParseError> {
        let count = self.common.source_count;
        if count < 1 || count > MAX_SOURCE_COUNT {
            return Err(ParseError::InvalidSourceCount(count));
        }
        if self.sources.len() != count as usize {
            return Err(ParseError::InvalidSourceCount(self.sources.len() as u8));
        }
        for b in name_to_bytes(&self.common.name) {
            if !(0x20..=0x7e).contains(&b) {
                return Err(ParseError::FieldOutOfRange("name", b as i32));
            }
        }
        Ok(())
    }

    /// Decodes a patch body: the common block, then exactly as many
    /// sources as its source count declares.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        let common = Common::from_bytes(data)?;
        let sources = decode_sources(&data[Common::DATA_SIZE..], common.source_count)
            .map_err(|e| e.at(Common::DATA_SIZE))?;
        Ok(SinglePatch { common, sources })
    }

    /// Encodes the patch body. Fails rather than emit a frame that
    /// could not be decoded back.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ParseError> {
        self.validate()?;
        let mut result = self.common.to_bytes();
        result.extend(encode_sources(&self.sources));
        Ok(result)
    }
}

impl Default for SinglePatch {
    fn default() -> Self {
        SinglePatch::new(2, 0)
    }
}

impl fmt::Display for SinglePatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.common)?;
        for (i, source) in self.sources.iter().enumerate() {
            writeln!(f, "Source {}:\n{}\n", i + 1, source)?;
        }
        Ok(())
    }
}

/// A complete single-patch dump message: envelope, checksum, and patch.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleDump {
    pub header: DumpHeader,
    pub patch: SinglePatch,
    /// Set when the stored checksum disagreed with the computed one
    /// (computed, stored); the patch data is still available.
    pub checksum_warning: Option<(u8, u8)>,
}

impl SingleDump {
    /// Parses a dump message. A checksum mismatch is recorded in
    /// `checksum_warning` so the caller can inspect a possibly
    /// corrupt patch.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        Self::parse(data, false)
    }

    /// Parses a dump message, rejecting it on a checksum mismatch.
    pub fn from_bytes_strict(data: &[u8]) -> Result<Self, ParseError> {
        Self::parse(data, true)
    }

    fn parse(data: &[u8], strict: bool) -> Result<Self, ParseError> {
        let (header, payload) = sysex::unwrap(data)?;

        if payload.is_empty() {
            return Err(ParseError::TruncatedInput(
                1 + Common::DATA_SIZE + Source::DATA_SIZE, 0));
        }
        let stored = payload[0];
        let patch = SinglePatch::from_bytes(&payload[1..]).map_err(|e| e.at(1))?;

        // The checksum covers exactly the common block and the sources;
        // any trailing bank data in the payload is not part of it.
        let computed = sysex::patch_checksum(&payload[1..1 + patch.body_size()]);
        let checksum_warning = if computed == stored {
            None
        }
        else if strict {
            return Err(ParseError::ChecksumMismatch(computed, stored));
        }
        else {
            warn!("patch checksum mismatch: computed {:02X}H, stored {:02X}H",
                computed, stored);
            Some((computed, stored))
        };

        debug!("decoded single patch '{}' with {} sources",
            patch.common.name, patch.sources.len());

        Ok(SingleDump { header, patch, checksum_warning })
    }

    /// Emits the complete dump message, recomputing the checksum after
    /// the body bytes are final and wrapping the envelope last.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ParseError> {
        let body = self.patch.to_bytes()?;
        let mut payload = Vec::with_capacity(1 + body.len());
        payload.push(sysex::patch_checksum(&body));
        payload.extend(body);
        Ok(sysex::wrap(&self.header, &payload))
    }
}

impl fmt::Display for SingleDump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}\n{}", self.header, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare_slices;
    use crate::k5000::{BenderPitch, Coarse, Cutoff, EnvelopeTime, Key, Level, Resonance, Wave};
    use crate::k5000::amp::AmpEnvelope;
    use crate::k5000::sysex::{BankIdentifier, PatchSelector};
    use crate::k5000::MIDIChannel;

    static COMMON_DATA: [u8; 81] = [
        0x00,  // effect algorithm
        0x00, 0x02, 0x02, 0x0d, 0x41, 0x0a,  // reverb: type, dry/wet, params 1-4
        0x10, 0x00, 0x58, 0x33, 0x69, 0x22,  // effect 1 (as above)
        0x1d, 0x00, 0x4a, 0x00, 0x00, 0x00,  // effect 2
        0x24, 0x00, 0x04, 0x3a, 0x04, 0x38,  // effect 3
        0x2a, 0x00, 0x0c, 0x0c, 0x63, 0x00,  // effect 4
        0x42, 0x41, 0x40, 0x40, 0x3f, 0x3e, 0x41,  // GEQ
        0x00,  // drum mark
        0x57, 0x69, 0x7a, 0x6f, 0x6f, 0x49, 0x6e, 0x69,  // name "WizooIni"
        0x73,  // volume
        0x00,  // polyphony
        0x00,  // unused
        0x02,  // source count
        0x01,  // source mutes
        0x00,  // amplitude modulation
        0x02, 0x01, 0x40,  // effect control route 1
        0x01, 0x03, 0x40,  // effect control route 2
        0x00, 0x00,  // portamento flag and speed
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,  // macro destinations
        0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x40,  // macro depths
        0x00, 0x00, 0x00, 0x00,  // SW1, SW2, F.SW1, F.SW2
    ];

    // An upright-piano-ish patch with four PCM sources, used by the
    // end-to-end dump tests.
    fn make_uprite() -> SinglePatch {
        let mut patch = SinglePatch::new(4, 0);
        patch.common.name = "UpRite".to_string();
        patch.common.volume = Volume::new(120);

        // Give the sources distinct zones and levels so slot order
        // is observable in the encoded bytes.
        let zones = [(0, 59), (60, 127), (0, 59), (60, 127)];
        for (i, source) in patch.sources.iter_mut().enumerate() {
            source.control.zone_low = Key::new(zones[i].0);
            source.control.zone_high = Key::new(zones[i].1);
            source.control.volume = Volume::new(100 - 10 * i as i32);
            source.control.bender_pitch = BenderPitch::new(2);
            source.oscillator.wave = Wave::new(15 + i as u16);
            source.oscillator.coarse = Coarse::new(if i < 2 { 0 } else { -12 });
            source.filter.cutoff = Cutoff::new(100);
            source.filter.resonance = Resonance::new(2);
            source.amplifier.envelope = AmpEnvelope {
                attack_time: EnvelopeTime::new(0),
                decay1_time: EnvelopeTime::new(100),
                decay1_level: Level::new(120),
                decay2_time: EnvelopeTime::new(110),
                decay2_level: Level::new(0),
                release_time: EnvelopeTime::new(12),
            };
        }

        patch
    }

    fn uprite_header() -> DumpHeader {
        DumpHeader {
            channel: MIDIChannel::new(1),
            bank: BankIdentifier::A,
            selector: PatchSelector::One(0x00),
        }
    }

    #[test]
    fn test_common_from_bytes() {
        let common = Common::from_bytes(&COMMON_DATA).unwrap();
        assert_eq!(common.name, "WizooIni");
        assert_eq!(common.source_count, 2);
        assert_eq!(common.geq.map(|band| band.value()), [2, 1, 0, 0, -1, -2, 1]);
        assert_eq!(common.source_mutes, [true, false, false, false, false, false]);
    }

    #[test]
    fn test_common_round_trip() {
        let common = Common::from_bytes(&COMMON_DATA).unwrap();
        assert_eq!(common.to_bytes(), COMMON_DATA.to_vec());
    }

    #[test]
    fn test_name_is_padded_to_eight_bytes() {
        let common = Common {
            name: "Lead".to_string(),
            ..Default::default()
        };
        let data = common.to_bytes();
        assert_eq!(&data[39..47], &[0x4c, 0x65, 0x61, 0x64, 0x20, 0x20, 0x20, 0x20]);
    }

    #[test]
    fn test_long_name_is_truncated() {
        let common = Common {
            name: "Evolution".to_string(),
            ..Default::default()
        };
        let data = common.to_bytes();
        assert_eq!(data.len(), Common::DATA_SIZE);
        assert_eq!(&data[39..47], "Evolutio".as_bytes());
    }

    #[test]
    fn test_patch_rejects_source_count_mismatch() {
        let mut patch = SinglePatch::new(2, 0);
        patch.common.source_count = 3;
        assert_eq!(patch.to_bytes(), Err(ParseError::InvalidSourceCount(2)));
    }

    #[test]
    fn test_patch_rejects_source_count_out_of_bounds() {
        let mut patch = SinglePatch::new(2, 0);
        patch.common.source_count = 0;
        patch.sources.clear();
        assert_eq!(patch.to_bytes(), Err(ParseError::InvalidSourceCount(0)));
    }

    #[test]
    fn test_patch_rejects_non_ascii_name() {
        let mut patch = SinglePatch::new(1, 0);
        patch.common.source_count = 1;
        patch.common.name = "Grün".to_string();
        assert!(matches!(
            patch.to_bytes(),
            Err(ParseError::FieldOutOfRange("name", _))
        ));
    }

    #[test]
    fn test_patch_from_bytes_truncated() {
        let patch = make_uprite();
        let data = patch.to_bytes().unwrap();
        // Lose the tail of the last source.
        let short = &data[..Common::DATA_SIZE + 3 * Source::DATA_SIZE + 10];
        assert_eq!(
            SinglePatch::from_bytes(short),
            Err(ParseError::TruncatedInput(4 * Source::DATA_SIZE, 3 * Source::DATA_SIZE + 10))
        );
    }

    #[test]
    fn test_dump_round_trip() {
        let dump = SingleDump {
            header: uprite_header(),
            patch: make_uprite(),
            checksum_warning: None,
        };

        let message = dump.to_bytes().unwrap();
        let decoded = SingleDump::from_bytes(&message).unwrap();

        assert_eq!(decoded.header, dump.header);
        assert_eq!(decoded.checksum_warning, None);
        assert_eq!(decoded.patch.sources, dump.patch.sources);
        // The name comes back with its wire padding.
        assert_eq!(decoded.patch.common.name, "UpRite  ");
    }

    #[test]
    fn test_uprite_end_to_end() {
        let dump = SingleDump {
            header: uprite_header(),
            patch: make_uprite(),
            checksum_warning: None,
        };
        let message = dump.to_bytes().unwrap();

        let decoded = SingleDump::from_bytes(&message).unwrap();
        assert_eq!(decoded.patch.common.source_count, 4);
        assert_eq!(decoded.patch.common.name, "UpRite  ");
        assert_eq!(decoded.patch.sources.len(), 4);

        // Decoding and re-encoding must reproduce the identical bytes.
        let reencoded = decoded.to_bytes().unwrap();
        assert_eq!(compare_slices(&message, &reencoded), None);
        assert_eq!(message, reencoded);

        // And the decode of the re-encoding is a fixpoint.
        assert_eq!(SingleDump::from_bytes(&reencoded).unwrap(), decoded);
    }

    #[test]
    fn test_dump_strict_rejects_bad_checksum() {
        let dump = SingleDump {
            header: uprite_header(),
            patch: make_uprite(),
            checksum_warning: None,
        };
        let mut message = dump.to_bytes().unwrap();
        message[9] ^= 0x01;  // the checksum byte, just after the 9-byte header

        assert!(matches!(
            SingleDump::from_bytes_strict(&message),
            Err(ParseError::ChecksumMismatch(_, _))
        ));
    }

    #[test]
    fn test_dump_lenient_keeps_patch_on_bad_checksum() {
        let dump = SingleDump {
            header: uprite_header(),
            patch: make_uprite(),
            checksum_warning: None,
        };
        let mut message = dump.to_bytes().unwrap();
        message[9] ^= 0x01;

        let decoded = SingleDump::from_bytes(&message).unwrap();
        let (computed, stored) = decoded.checksum_warning.unwrap();
        assert_ne!(computed, stored);
        assert_eq!(decoded.patch.common.name, "UpRite  ");
    }

    #[test]
    fn test_block_dump_with_tone_map_passes_through() {
        let mut map = [0u8; sysex::TONE_MAP_SIZE];
        map[0] = 0x08;  // tone 4 present
        let dump = SingleDump {
            header: DumpHeader {
                channel: MIDIChannel::new(1),
                bank: BankIdentifier::A,
                selector: PatchSelector::Block(map),
            },
            patch: make_uprite(),
            checksum_warning: None,
        };

        let message = dump.to_bytes().unwrap();
        let decoded = SingleDump::from_bytes(&message).unwrap();
        assert_eq!(decoded.header.selector, PatchSelector::Block(map));
        assert_eq!(decoded.to_bytes().unwrap(), message);
    }

    #[test]
    fn test_checksum_matches_formula() {
        let patch = make_uprite();
        let body = patch.to_bytes().unwrap();

        let mut sum: u32 = 0;
        for b in &body {
            sum += *b as u32;
        }
        assert_eq!(sysex::patch_checksum(&body), ((sum + 0xa5) & 0x7f) as u8);
    }
}
