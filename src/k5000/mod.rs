use std::fmt;
use rand::Rng;

use crate::{
    Ranged,
    ParseError
};

pub mod sysex;
pub mod effect;
pub mod control;
pub mod osc;
pub mod filter;
pub mod amp;
pub mod lfo;
pub mod source;
pub mod single;

/// MIDI channel (1...16), stored in SysEx as 0...15.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MIDIChannel(i32);

crate::ranged_impl!(MIDIChannel, 1, 16, 1, -1);

/// Volume (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Volume(i32);

crate::ranged_impl!(Volume, 0, 127, 0, 0);

/// Generic positive level (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Level(i32);

crate::ranged_impl!(Level, 0, 127, 0, 0);

/// Key (MIDI note, 0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Key(i32);

crate::ranged_impl!(Key, 0, 127, 0, 0);

impl Key {
    /// The note name of this key, with C4 = MIDI note 60.
    pub fn name(&self) -> String {
        let notes = [ "C", "C#", "D", "Eb", "E", "F", "F#", "G", "G#", "A", "Bb", "B" ];
        let octave = self.value() / 12 - 1;
        format!("{}{}", notes[(self.value() % 12) as usize], octave)
    }
}

/// Effect dry/wet depth (0...100).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EffectDepth(i32);

crate::ranged_impl!(EffectDepth, 0, 100, 0, 0);

/// Effect parameter value (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EffectParameter(i32);

crate::ranged_impl!(EffectParameter, 0, 127, 0, 0);

/// Graphic EQ band level (-6...+6), stored as 58...70.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GeqLevel(i32);

crate::ranged_impl!(GeqLevel, -6, 6, 0, 64);

/// Effect path for a source (0...3).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EffectPath(i32);

crate::ranged_impl!(EffectPath, 0, 3, 0, 0);

/// Bender pitch depth in semitones (0...24).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BenderPitch(i32);

crate::ranged_impl!(BenderPitch, 0, 24, 0, 0);

/// Bender cutoff depth (0...31).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct BenderCutoff(i32);

crate::ranged_impl!(BenderCutoff, 0, 31, 0, 0);

/// Key-on delay (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct KeyOnDelay(i32);

crate::ranged_impl!(KeyOnDelay, 0, 127, 0, 0);

/// Pan position (-63...+63), stored as 1...127.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PanValue(i32);

crate::ranged_impl!(PanValue, -63, 63, 0, 64);

/// Macro controller parameter depth (-31...+31), stored as 33...95.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MacroDepth(i32);

crate::ranged_impl!(MacroDepth, -31, 31, 0, 64);

/// Assignable controller depth (-63...+63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ControlDepth(i32);

crate::ranged_impl!(ControlDepth, -63, 63, 0, 64);

/// Velocity switch threshold step (0...31).
///
/// The wire format stores a table index, not a MIDI velocity; see
/// [`VelocityThreshold::midi_value`] for the mapping.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct VelocityThreshold(i32);

crate::ranged_impl!(VelocityThreshold, 0, 31, 0, 0);

static VELOCITY_THRESHOLD_TABLE: [u8; 32] = [
    4, 8, 12, 16, 20, 24, 28, 32,
    36, 40, 44, 48, 52, 56, 60, 64,
    68, 72, 76, 80, 84, 88, 92, 96,
    100, 104, 108, 112, 116, 120, 124, 127
];

impl VelocityThreshold {
    /// The MIDI velocity this threshold step corresponds to.
    pub fn midi_value(&self) -> u8 {
        VELOCITY_THRESHOLD_TABLE[self.value() as usize]
    }
}

/// Coarse tune in semitones (-24...+24), stored as 0...48.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Coarse(i32);

crate::ranged_impl!(Coarse, -24, 24, 0, 24);

/// Fine tune (-63...+63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Fine(i32);

crate::ranged_impl!(Fine, -63, 63, 0, 64);

/// Envelope segment time (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EnvelopeTime(i32);

crate::ranged_impl!(EnvelopeTime, 0, 127, 0, 0);

/// Signed envelope level (-63...+63), stored as 1...127.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EnvelopeLevel(i32);

crate::ranged_impl!(EnvelopeLevel, -63, 63, 0, 64);

/// Envelope modulation depth (-63...+63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EnvelopeDepth(i32);

crate::ranged_impl!(EnvelopeDepth, -63, 63, 0, 64);

/// Signed control time offset (-63...+63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ControlTime(i32);

crate::ranged_impl!(ControlTime, -63, 63, 0, 64);

/// Filter cutoff (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Cutoff(i32);

crate::ranged_impl!(Cutoff, 0, 127, 0, 0);

/// Filter resonance (0...31).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Resonance(i32);

crate::ranged_impl!(Resonance, 0, 31, 0, 0);

/// Filter level (0...31).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FilterLevel(i32);

crate::ranged_impl!(FilterLevel, 0, 31, 0, 0);

/// LFO speed (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LfoSpeed(i32);

crate::ranged_impl!(LfoSpeed, 0, 127, 0, 0);

/// LFO modulation depth (0...63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LfoDepth(i32);

crate::ranged_impl!(LfoDepth, 0, 63, 0, 0);

/// Key scaling depth (-63...+63).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct KeyScalingDepth(i32);

crate::ranged_impl!(KeyScalingDepth, -63, 63, 0, 64);

/// Portamento speed (0...127).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PortamentoSpeed(i32);

crate::ranged_impl!(PortamentoSpeed, 0, 127, 0, 0);

/// Wave kit number, 10 bits on the wire split over two data bytes
/// (MSB 3 bits, LSB 7 bits). Wave number 512 selects the additive
/// engine for a source; smaller numbers are PCM waves.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Wave(u16);

impl Wave {
    /// The wave number that puts a source on the additive engine.
    pub const ADDITIVE: Wave = Wave(512);

    pub fn new(number: u16) -> Self {
        if number < 1024 {
            Wave(number)
        }
        else {
            panic!("expected wave number in range [0...1023], got {}", number);
        }
    }

    pub fn number(&self) -> u16 { self.0 }

    /// Returns `true` if this wave selects the additive engine.
    pub fn is_additive(&self) -> bool {
        self.0 == Wave::ADDITIVE.0
    }

    /// Makes a wave number from its MSB and LSB data bytes at `offset`.
    pub fn from_bytes(msb: u8, lsb: u8, offset: usize) -> Result<Self, ParseError> {
        if msb > 0b111 {
            return Err(ParseError::InvalidData(offset));
        }
        if lsb > 0x7f {
            return Err(ParseError::InvalidData(offset + 1));
        }
        Ok(Wave(((msb as u16) << 7) | lsb as u16))
    }

    /// Gets the MSB and LSB data bytes for this wave number.
    pub fn to_bytes(&self) -> [u8; 2] {
        [((self.0 >> 7) & 0b111) as u8, (self.0 & 0x7f) as u8]
    }

    pub fn random() -> Self {
        let mut rng = rand::rng();
        Wave::new(rng.random_range(0..=512))
    }
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_additive() {
            write!(f, "ADD")
        }
        else {
            write!(f, "PCM {}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use bit::BitIndex;

    use super::*;

    #[test]
    fn test_bit_range() {
        let b: u8 = 0b01100000;

        // If this succeeds, the range upper bound is not included,
        // i.e. 5..7 means bits 5 and 6.
        assert_eq!(b.bit_range(5..7), 0b11);
    }

    #[test]
    fn test_channel_as_byte() {
        assert_eq!(MIDIChannel::new(1).as_byte(), 0x00);
        assert_eq!(MIDIChannel::new(16).as_byte(), 0x0f);
    }

    #[test]
    fn test_channel_from_byte() {
        let channel = MIDIChannel::from_byte(0x0f, 0).unwrap();
        assert_eq!(channel.value(), 16);
    }

    #[test]
    fn test_coarse_bias() {
        assert_eq!(Coarse::new(-24).as_byte(), 0);
        assert_eq!(Coarse::new(24).as_byte(), 48);
        assert_eq!(Coarse::from_byte(24, 0).unwrap().value(), 0);
    }

    #[test]
    fn test_geq_level_out_of_range() {
        // 0x30 = 48 would be -16 dB, well outside -6...+6
        assert_eq!(GeqLevel::from_byte(0x30, 33), Err(ParseError::InvalidData(33)));
    }

    #[test]
    fn test_wave_from_bytes() {
        // 512 = 0b100_0000000, so MSB 4 and LSB 0
        let wave = Wave::from_bytes(0x04, 0x00, 0).unwrap();
        assert!(wave.is_additive());

        let pcm = Wave::from_bytes(0x01, 0x22, 0).unwrap();
        assert_eq!(pcm.number(), 162);
    }

    #[test]
    fn test_wave_to_bytes() {
        assert_eq!(Wave::ADDITIVE.to_bytes(), [0x04, 0x00]);
        assert_eq!(Wave::new(162).to_bytes(), [0x01, 0x22]);
    }

    #[test]
    fn test_wave_msb_overflow() {
        assert_eq!(Wave::from_bytes(0x08, 0x00, 28), Err(ParseError::InvalidData(28)));
    }

    #[test]
    fn test_random_values_stay_in_range() {
        for _ in 0..100 {
            assert!(MacroDepth::contains(MacroDepth::random().value()));
            assert!(LfoDepth::contains(LfoDepth::random().value()));
        }
    }

    #[test]
    fn test_key_name() {
        assert_eq!(Key::new(60).name(), "C4");
        assert_eq!(Key::new(127).name(), "G9");
    }

    #[test]
    fn test_velocity_threshold_table() {
        assert_eq!(VelocityThreshold::new(0).midi_value(), 4);
        assert_eq!(VelocityThreshold::new(31).midi_value(), 127);
    }
}
