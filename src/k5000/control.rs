//! Controllers, macros, and the other selector fields shared by the
//! common block and the source control block.

use std::fmt;

use bit::BitIndex;
use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::{ControlDepth, MacroDepth, PanValue, VelocityThreshold};
use crate::k5000::sysex::SystemExclusiveData;

/// Velocity switch kind. The wire value 3 is unused by the instrument
/// but representable in the 2-bit field.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum VelocitySwitchKind {
    Off,
    Loud,
    Soft,
    Unknown,
}

impl Default for VelocitySwitchKind {
    fn default() -> Self { VelocitySwitchKind::Off }
}

impl fmt::Display for VelocitySwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Velocity switch settings, packed into one byte:
/// bits 5...6 are the kind, bits 0...4 the threshold step.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct VelocitySwitchSettings {
    pub kind: VelocitySwitchKind,
    pub threshold: VelocityThreshold,
}

impl fmt::Display for VelocitySwitchSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at velocity {}", self.kind, self.threshold.midi_value())
    }
}

impl SystemExclusiveData for VelocitySwitchSettings {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(VelocitySwitchSettings {
            // Both sub-fields cover their full bit range, so any
            // 7-bit byte decodes.
            kind: VelocitySwitchKind::try_from(data[0].bit_range(5..7))
                .map_err(|_| ParseError::InvalidData(0))?,
            threshold: VelocityThreshold::from_byte(data[0].bit_range(0..5), 0)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut b = self.threshold.as_byte();
        b.set_bit_range(5..7, self.kind as u8);
        vec![b]
    }

    const DATA_SIZE: usize = 1;
}

/// Physical control source for assignable modulation.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlSource {
    Bender,
    ChannelPressure,
    Wheel,
    Expression,
    MidiVolume,
    PanPot,
    GeneralController1,
    GeneralController2,
    GeneralController3,
    GeneralController4,
    GeneralController5,
    GeneralController6,
    GeneralController7,
    GeneralController8,
}

impl Default for ControlSource {
    fn default() -> Self { ControlSource::Bender }
}

/// Modulation destination inside a source.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlDestination {
    PitchOffset,
    CutoffOffset,
    Level,
    VibratoDepthOffset,
    GrowlDepthOffset,
    TremoloDepthOffset,
    LfoSpeedOffset,
    AttackTimeOffset,
    Decay1TimeOffset,
    ReleaseTimeOffset,
    VelocityOffset,
    ResonanceOffset,
    PanPotOffset,
    FormantFilterBiasOffset,
    FormantFilterEnvelopeLfoDepthOffset,
    FormantFilterEnvelopeLfoSpeedOffset,
    HarmonicLowOffset,
    HarmonicHighOffset,
    HarmonicEvenOffset,
    HarmonicOddOffset,
}

impl Default for ControlDestination {
    fn default() -> Self { ControlDestination::PitchOffset }
}

impl fmt::Display for ControlDestination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Macro controller: two destination/depth pairs.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct MacroController {
    pub destination1: ControlDestination,
    pub depth1: MacroDepth,
    pub destination2: ControlDestination,
    pub depth2: MacroDepth,
}

impl fmt::Display for MacroController {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dest1={} Depth={} Dest2={} Depth={}",
            self.destination1, self.depth1, self.destination2, self.depth2)
    }
}

impl SystemExclusiveData for MacroController {
    // This is the inline layout used inside a source's modulation
    // block. The common block splits the same pairs into separate
    // destination and depth runs; see `Common`.
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(MacroController {
            destination1: ControlDestination::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            depth1: MacroDepth::from_byte(data[1], 1)?,
            destination2: ControlDestination::try_from(data[2])
                .map_err(|_| ParseError::InvalidData(2))?,
            depth2: MacroDepth::from_byte(data[3], 3)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.destination1 as u8,
            self.depth1.as_byte(),
            self.destination2 as u8,
            self.depth2.as_byte(),
        ]
    }

    const DATA_SIZE: usize = 4;
}

/// Assignable controller: source, destination, and depth.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct AssignableController {
    pub source: ControlSource,
    pub destination: ControlDestination,
    pub depth: ControlDepth,
}

impl SystemExclusiveData for AssignableController {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(AssignableController {
            source: ControlSource::try_from(data[0])
                .map_err(|_| ParseError::InvalidData(0))?,
            destination: ControlDestination::try_from(data[1])
                .map_err(|_| ParseError::InvalidData(1))?,
            depth: ControlDepth::from_byte(data[2], 2)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.source as u8, self.destination as u8, self.depth.as_byte()]
    }

    const DATA_SIZE: usize = 3;
}

/// Per-source modulation routing: three macro pairs for the fixed
/// physical controllers, plus two freely assignable controllers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct ModulationSettings {
    pub pressure: MacroController,
    pub wheel: MacroController,
    pub expression: MacroController,
    pub assignable1: AssignableController,
    pub assignable2: AssignableController,
}

impl SystemExclusiveData for ModulationSettings {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(ModulationSettings {
            pressure: MacroController::from_bytes(&data[..4])?,
            wheel: MacroController::from_bytes(&data[4..8]).map_err(|e| e.at(4))?,
            expression: MacroController::from_bytes(&data[8..12]).map_err(|e| e.at(8))?,
            // NOTE: only three bytes each, not four like the macros
            assignable1: AssignableController::from_bytes(&data[12..15]).map_err(|e| e.at(12))?,
            assignable2: AssignableController::from_bytes(&data[15..18]).map_err(|e| e.at(15))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result: Vec<u8> = Vec::new();

        result.extend(self.pressure.to_bytes());
        result.extend(self.wheel.to_bytes());
        result.extend(self.expression.to_bytes());
        result.extend(self.assignable1.to_bytes());
        result.extend(self.assignable2.to_bytes());

        result
    }

    const DATA_SIZE: usize = 18;
}

/// Pan mode.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum PanKind {
    Normal,
    Random,
    KeyScale,
    NegativeKeyScale,
}

impl Default for PanKind {
    fn default() -> Self { PanKind::Normal }
}

/// Pan settings for a source.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct PanSettings {
    pub kind: PanKind,
    pub value: PanValue,
}

impl SystemExclusiveData for PanSettings {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(PanSettings {
            kind: PanKind::try_from(data[0]).map_err(|_| ParseError::InvalidData(0))?,
            value: PanValue::from_byte(data[1], 1)?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![self.kind as u8, self.value.as_byte()]
    }

    const DATA_SIZE: usize = 2;
}

/// Function assignable to the panel and foot switches.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum Switch {
    Off,
    HarmMax,
    HarmBright,
    HarmDark,
    HarmSaw,
    SelectLoud,
    AddLoud,
    AddFifth,
    AddOdd,
    AddEven,
    He1,
    He2,
    HarmonicEnvelopeLoop,
    FfMax,
    FfComb,
    FfHiCut,
    FfComb2,
}

impl Default for Switch {
    fn default() -> Self { Switch::Off }
}

/// Switch assignments of the common block.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct SwitchControl {
    pub switch1: Switch,
    pub switch2: Switch,
    pub footswitch1: Switch,
    pub footswitch2: Switch,
}

impl SystemExclusiveData for SwitchControl {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::DATA_SIZE {
            return Err(ParseError::TruncatedInput(Self::DATA_SIZE, data.len()));
        }
        Ok(SwitchControl {
            switch1: Switch::try_from(data[0]).map_err(|_| ParseError::InvalidData(0))?,
            switch2: Switch::try_from(data[1]).map_err(|_| ParseError::InvalidData(1))?,
            footswitch1: Switch::try_from(data[2]).map_err(|_| ParseError::InvalidData(2))?,
            footswitch2: Switch::try_from(data[3]).map_err(|_| ParseError::InvalidData(3))?,
        })
    }

    fn to_bytes(&self) -> Vec<u8> {
        vec![
            self.switch1 as u8,
            self.switch2 as u8,
            self.footswitch1 as u8,
            self.footswitch2 as u8,
        ]
    }

    const DATA_SIZE: usize = 4;
}

/// Polyphony mode of a patch.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum Polyphony {
    Poly1,
    Poly2,
    Solo1,
    Solo2,
}

impl Default for Polyphony {
    fn default() -> Self { Polyphony::Poly1 }
}

impl fmt::Display for Polyphony {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Polyphony::Poly1 => "POLY1",
            Polyphony::Poly2 => "POLY2",
            Polyphony::Solo1 => "SOLO1",
            Polyphony::Solo2 => "SOLO2",
        })
    }
}

/// Amplitude modulation routing between adjacent sources.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum AmplitudeModulation {
    Off,
    Source2,
    Source3,
    Source4,
    Source5,
    Source6,
}

impl Default for AmplitudeModulation {
    fn default() -> Self { AmplitudeModulation::Off }
}

impl fmt::Display for AmplitudeModulation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            AmplitudeModulation::Off => "OFF",
            AmplitudeModulation::Source2 => "1->2",
            AmplitudeModulation::Source3 => "2->3",
            AmplitudeModulation::Source4 => "3->4",
            AmplitudeModulation::Source5 => "4->5",
            AmplitudeModulation::Source6 => "5->6",
        })
    }
}

/// Velocity curve (1...12, stored as 0...11).
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum VelocityCurve {
    Curve1,
    Curve2,
    Curve3,
    Curve4,
    Curve5,
    Curve6,
    Curve7,
    Curve8,
    Curve9,
    Curve10,
    Curve11,
    Curve12,
}

impl Default for VelocityCurve {
    fn default() -> Self { VelocityCurve::Curve1 }
}

impl fmt::Display for VelocityCurve {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Curve {}", *self as u8 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ranged;

    #[test]
    fn test_velocity_switch_byte() {
        let settings = VelocitySwitchSettings {
            kind: VelocitySwitchKind::Loud,
            threshold: VelocityThreshold::new(9),
        };
        // kind 1 in bits 5-6, threshold step 9 in bits 0-4
        assert_eq!(settings.to_bytes(), vec![0b0010_1001]);
    }

    #[test]
    fn test_velocity_switch_round_trip() {
        let settings = VelocitySwitchSettings {
            kind: VelocitySwitchKind::Soft,
            threshold: VelocityThreshold::new(31),
        };
        let decoded = VelocitySwitchSettings::from_bytes(&settings.to_bytes()).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_macro_controller_from_bytes() {
        let data = vec![0x01, 0x4f, 0x03, 0x40];
        let mac = MacroController::from_bytes(&data).unwrap();
        assert_eq!(mac.destination1, ControlDestination::CutoffOffset);
        assert_eq!(mac.depth1.value(), 15);
        assert_eq!(mac.destination2, ControlDestination::VibratoDepthOffset);
        assert_eq!(mac.depth2.value(), 0);
    }

    #[test]
    fn test_macro_controller_rejects_bad_destination() {
        let data = vec![0x7f, 0x40, 0x00, 0x40];
        assert_eq!(
            MacroController::from_bytes(&data),
            Err(ParseError::InvalidData(0))
        );
    }

    #[test]
    fn test_modulation_settings_round_trip() {
        let settings = ModulationSettings {
            pressure: MacroController {
                destination1: ControlDestination::CutoffOffset,
                depth1: MacroDepth::new(15),
                destination2: ControlDestination::VibratoDepthOffset,
                depth2: MacroDepth::new(0),
            },
            wheel: Default::default(),
            expression: Default::default(),
            assignable1: AssignableController {
                source: ControlSource::Wheel,
                destination: ControlDestination::PanPotOffset,
                depth: ControlDepth::new(-10),
            },
            assignable2: Default::default(),
        };

        let data = settings.to_bytes();
        assert_eq!(data.len(), ModulationSettings::DATA_SIZE);
        assert_eq!(ModulationSettings::from_bytes(&data).unwrap(), settings);
    }

    #[test]
    fn test_switch_control_rejects_bad_switch() {
        let data = vec![0x00, 0x11, 0x00, 0x00];
        assert_eq!(
            SwitchControl::from_bytes(&data),
            Err(ParseError::InvalidData(1))
        );
    }
}
