//! Frame envelope and checksum for K5000 System Exclusive dumps.

use std::fmt;

use bit::BitIndex;
use num_enum::TryFromPrimitive;

use crate::ParseError;
use crate::k5000::MIDIChannel;

/// Parsing and generating MIDI System Exclusive data.
pub trait SystemExclusiveData: Sized {
    fn from_bytes(data: &[u8]) -> Result<Self, ParseError>;
    fn to_bytes(&self) -> Vec<u8>;
    const DATA_SIZE: usize;
}

/// System Exclusive initiator.
pub const INITIATOR: u8 = 0xf0;

/// System Exclusive terminator.
pub const TERMINATOR: u8 = 0xf7;

/// Kawai manufacturer identifier.
pub const KAWAI_ID: u8 = 0x40;

// Constant header bytes of every K5000 dump command
// ("5th" and "6th" in the K5000 MIDI spec).
const GROUP: u8 = 0x00;
const MACHINE_ID: u8 = 0x0a;

// Patch kind for a single patch ("7th" byte). Multi/combi and drum
// dumps use other values and are not single-patch messages.
const KIND_SINGLE: u8 = 0x00;

// Dump functions: one patch, or a block of patches.
const FUNCTION_ONE: u8 = 0x20;
const FUNCTION_BLOCK: u8 = 0x21;

/// Number of bytes in a block dump tone map.
pub const TONE_MAP_SIZE: usize = 19;

/// K5000 patch bank identifier. There is no bank C.
#[derive(Debug, Eq, PartialEq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum BankIdentifier {
    A = 0x00,
    B = 0x01,
    D = 0x02,  // K5000S/R only
    E = 0x03,
    F = 0x04,
}

impl fmt::Display for BankIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Selects the patch a dump carries: one tone number, or the 19-byte
/// tone map of a block dump. The tone map is carried through untouched;
/// use [`ToneMap`] to interpret it.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PatchSelector {
    One(u8),
    Block([u8; TONE_MAP_SIZE]),
}

impl PatchSelector {
    fn function(&self) -> u8 {
        match self {
            PatchSelector::One(_) => FUNCTION_ONE,
            PatchSelector::Block(_) => FUNCTION_BLOCK,
        }
    }
}

/// Dump command header for a single-patch message.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DumpHeader {
    pub channel: MIDIChannel,
    pub bank: BankIdentifier,
    pub selector: PatchSelector,
}

impl DumpHeader {
    /// Header length in bytes, from the channel byte up to the payload.
    pub fn size(&self) -> usize {
        6 + match self.selector {
            PatchSelector::One(_) => 1,
            PatchSelector::Block(_) => TONE_MAP_SIZE,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut result = vec![
            self.channel.as_byte(),
            self.selector.function(),
            GROUP,
            MACHINE_ID,
            KIND_SINGLE,
            self.bank as u8,
        ];

        match self.selector {
            PatchSelector::One(tone) => result.push(tone),
            PatchSelector::Block(map) => result.extend(map),
        }

        result
    }
}

impl fmt::Display for DumpHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.selector {
            PatchSelector::One(tone) => write!(
                f, "One Single, Bank {}, tone {}, channel {}",
                self.bank, tone + 1, self.channel),
            PatchSelector::Block(_) => write!(
                f, "Block Single, Bank {}, channel {}",
                self.bank, self.channel),
        }
    }
}

/// Strips the frame envelope from a single-patch dump message.
///
/// Returns the parsed dump header and the payload between the header
/// and the terminator (checksum byte followed by the patch body).
pub fn unwrap(data: &[u8]) -> Result<(DumpHeader, &[u8]), ParseError> {
    // Shortest conceivable frame: one-patch header with empty payload.
    if data.len() < 10 {
        return Err(ParseError::TruncatedInput(10, data.len()));
    }
    if data[0] != INITIATOR {
        return Err(ParseError::MalformedFrame(0));
    }
    if data[1] != KAWAI_ID {
        return Err(ParseError::MalformedFrame(1));
    }
    if data[data.len() - 1] != TERMINATOR {
        return Err(ParseError::MalformedFrame(data.len() - 1));
    }

    let channel = MIDIChannel::from_byte(data[2], 2)
        .map_err(|_| ParseError::MalformedFrame(2))?;

    if data[4] != GROUP {
        return Err(ParseError::MalformedFrame(4));
    }
    if data[5] != MACHINE_ID {
        return Err(ParseError::MalformedFrame(5));
    }
    if data[6] != KIND_SINGLE {
        return Err(ParseError::MalformedFrame(6));
    }

    let bank = BankIdentifier::try_from(data[7])
        .map_err(|_| ParseError::MalformedFrame(7))?;

    let selector = match data[3] {
        FUNCTION_ONE => {
            if data[8] > 0x7f {
                return Err(ParseError::MalformedFrame(8));
            }
            PatchSelector::One(data[8])
        },
        FUNCTION_BLOCK => {
            if data.len() < 8 + TONE_MAP_SIZE + 1 {
                return Err(ParseError::TruncatedInput(8 + TONE_MAP_SIZE + 1, data.len()));
            }
            let mut map = [0u8; TONE_MAP_SIZE];
            map.copy_from_slice(&data[8..8 + TONE_MAP_SIZE]);
            PatchSelector::Block(map)
        },
        _ => return Err(ParseError::MalformedFrame(3)),
    };

    let header = DumpHeader { channel, bank, selector };
    Ok((header, &data[2 + header.size()..data.len() - 1]))
}

/// Applies the frame envelope around a payload. Exact inverse of
/// [`unwrap`]: `unwrap(&wrap(&h, payload))` gives back `(h, payload)`.
pub fn wrap(header: &DumpHeader, payload: &[u8]) -> Vec<u8> {
    let mut result = vec![INITIATOR, KAWAI_ID];
    result.extend(header.to_bytes());
    result.extend(payload);
    result.push(TERMINATOR);
    result
}

/// Computes the single-patch checksum over the patch body (common block
/// and sources, excluding the checksum byte itself).
pub fn patch_checksum(data: &[u8]) -> u8 {
    let mut sum: u32 = 0;
    for b in data {
        sum += *b as u32;
    }
    ((sum + 0xa5) & 0x7f) as u8
}

/// Checks a stored checksum byte against the patch body it covers.
pub fn verify_checksum(stored: u8, data: &[u8]) -> bool {
    patch_checksum(data) == stored
}

/// Maximum number of tones in a bank, and in a tone map.
pub const MAX_TONE_COUNT: usize = 128;

/// Presence bitmap of a block dump, seven tones per data byte.
///
/// The codec carries the map bytes through [`PatchSelector::Block`]
/// untouched; this type is for callers that need to know which tones
/// a block actually contains.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ToneMap {
    included: [bool; MAX_TONE_COUNT],
}

impl ToneMap {
    pub fn new() -> Self {
        ToneMap { included: [false; MAX_TONE_COUNT] }
    }

    pub fn from_bytes(data: &[u8; TONE_MAP_SIZE]) -> Self {
        let mut included = [false; MAX_TONE_COUNT];
        for (tone, slot) in included.iter_mut().enumerate() {
            *slot = data[tone / 7].bit(tone % 7);
        }
        ToneMap { included }
    }

    pub fn to_bytes(&self) -> [u8; TONE_MAP_SIZE] {
        let mut result = [0u8; TONE_MAP_SIZE];
        for (tone, included) in self.included.iter().enumerate() {
            result[tone / 7].set_bit(tone % 7, *included);
        }
        result
    }

    pub fn is_included(&self, tone_number: u8) -> bool {
        self.included[tone_number as usize]
    }

    pub fn set_included(&mut self, tone_number: u8, included: bool) {
        self.included[tone_number as usize] = included;
    }

    pub fn included_count(&self) -> usize {
        self.included.into_iter().filter(|b| *b).count()
    }
}

impl Default for ToneMap {
    fn default() -> Self {
        ToneMap::new()
    }
}

impl fmt::Display for ToneMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut output = String::from("");
        for (tone, included) in self.included.iter().enumerate() {
            if *included {
                output.push_str(&format!("{} ", tone + 1));
            }
        }
        write!(f, "{}", output)
    }
}
