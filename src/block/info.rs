//! Descriptive blocks: nothing here changes the signal.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::cursor::ByteCursor;
use crate::error::{Result, TapeError};
use crate::field::{latin1, FieldRead};
use crate::tap::serialize_len;

use super::{BlockDecode, BlockKind, LengthBound};

/// Signature following the glue block's tag, the tag itself completing
/// "ZXTape!".
pub const GLUE_SIGNATURE: &[u8; 7] = b"XTape!\x1A";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextDescription {
    pub text: String,
}

/// A text an emulator may show for a while.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    /// 0 means wait for the user.
    pub duration_secs: u8,
    pub text:          String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ArchiveInfoKind {
    Title,
    Publisher,
    Authors,
    Year,
    Language,
    SoftwareType,
    Price,
    Protection,
    Origin,
    Comment,
    Other(u8),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub kind: ArchiveInfoKind,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    pub entries: Vec<ArchiveEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum HardwareCompatibility {
    Runs,
    UsesSpecial,
    RunsIgnoringSpecial,
    DoesNotRun,
    Other(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HardwareInfo {
    pub hw_type:       u8,
    pub hw_id:         u8,
    pub compatibility: HardwareCompatibility,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HardwareType {
    pub entries: Vec<HardwareInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomInfo {
    #[serde(serialize_with = "serialize_identifier")]
    pub identifier: [u8; 10],
    #[serde(serialize_with = "serialize_len")]
    pub data:       Vec<u8>,
}

/// Marks the start of a second TZX image appended to the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GlueBlock {
    pub major: u8,
    pub minor: u8,
}

fn serialize_identifier<S: Serializer>(id: &[u8; 10], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(latin1(id).trim_end())
}

// ── ArchiveInfoKind / HardwareCompatibility ──────────────────────────────────

impl From<u8> for ArchiveInfoKind {
    fn from(id: u8) -> Self {
        match id {
            0x00 => ArchiveInfoKind::Title,
            0x01 => ArchiveInfoKind::Publisher,
            0x02 => ArchiveInfoKind::Authors,
            0x03 => ArchiveInfoKind::Year,
            0x04 => ArchiveInfoKind::Language,
            0x05 => ArchiveInfoKind::SoftwareType,
            0x06 => ArchiveInfoKind::Price,
            0x07 => ArchiveInfoKind::Protection,
            0x08 => ArchiveInfoKind::Origin,
            0xFF => ArchiveInfoKind::Comment,
            other => ArchiveInfoKind::Other(other),
        }
    }
}

impl fmt::Display for ArchiveInfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArchiveInfoKind::Title        => "Title",
            ArchiveInfoKind::Publisher    => "Publisher",
            ArchiveInfoKind::Authors      => "Author(s)",
            ArchiveInfoKind::Year         => "Year",
            ArchiveInfoKind::Language     => "Language",
            ArchiveInfoKind::SoftwareType => "Type",
            ArchiveInfoKind::Price        => "Price",
            ArchiveInfoKind::Protection   => "Protection",
            ArchiveInfoKind::Origin       => "Origin",
            ArchiveInfoKind::Comment      => "Comment",
            ArchiveInfoKind::Other(id)    => return write!(f, "Info {:#04x}", id),
        };
        f.write_str(label)
    }
}

impl From<u8> for HardwareCompatibility {
    fn from(info: u8) -> Self {
        match info {
            0 => HardwareCompatibility::Runs,
            1 => HardwareCompatibility::UsesSpecial,
            2 => HardwareCompatibility::RunsIgnoringSpecial,
            3 => HardwareCompatibility::DoesNotRun,
            other => HardwareCompatibility::Other(other),
        }
    }
}

impl HardwareInfo {
    /// Category of `hw_type`, e.g. "Computers" or "Joysticks".
    pub fn type_name(&self) -> Option<&'static str> {
        const NAMES: [&str; 17] = [
            "Computers", "External storage", "ROM/RAM type add-ons", "Sound devices",
            "Joysticks", "Mice", "Other controllers", "Serial ports", "Parallel ports",
            "Printers", "Modems", "Digitizers", "Network adapters", "Keyboards & keypads",
            "AD/DA converters", "EPROM programmers", "Graphics",
        ];
        NAMES.get(usize::from(self.hw_type)).copied()
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

impl BlockDecode for TextDescription {
    const KIND: BlockKind = BlockKind::TextDescription;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(TextDescription { text: cur.read_text_u8()? })
    }
}

impl BlockDecode for Message {
    const KIND: BlockKind = BlockKind::Message;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let duration_secs = cur.read_u8()?;
        let text = cur.read_text_u8()?;
        Ok(Message { duration_secs, text })
    }
}

impl BlockDecode for ArchiveInfo {
    const KIND: BlockKind = BlockKind::ArchiveInfo;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u16_le()?;
        let bound = LengthBound::new(&*cur, Self::KIND, declared.into());
        let count = cur.read_u8()?;
        let entries = (0..count)
            .map(|_| -> Result<ArchiveEntry> {
                let kind = cur.read_u8()?.into();
                let text = cur.read_text_u8()?;
                Ok(ArchiveEntry { kind, text })
            })
            .collect::<Result<Vec<_>>>()?;
        bound.finish(cur)?;
        Ok(ArchiveInfo { entries })
    }
}

impl BlockDecode for HardwareType {
    const KIND: BlockKind = BlockKind::HardwareType;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let count = cur.read_u8()?;
        let entries = (0..count)
            .map(|_| -> Result<HardwareInfo> {
                let [hw_type, hw_id, info] = cur.read_fixed::<3>()?;
                Ok(HardwareInfo { hw_type, hw_id, compatibility: info.into() })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(HardwareType { entries })
    }
}

impl BlockDecode for CustomInfo {
    const KIND: BlockKind = BlockKind::CustomInfo;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let identifier = cur.read_fixed::<10>()?;
        let length = cur.read_u32_le()?;
        let data = cur.read_vec(length as usize)?;
        Ok(CustomInfo { identifier, data })
    }
}

impl BlockDecode for GlueBlock {
    const KIND: BlockKind = BlockKind::GlueBlock;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let offset = cur.position();
        if cur.read_fixed::<7>()? != *GLUE_SIGNATURE {
            return Err(TapeError::MalformedHeader { offset });
        }
        let major = cur.read_u8()?;
        let minor = cur.read_u8()?;
        Ok(GlueBlock { major, minor })
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

impl fmt::Display for TextDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" for {} s", self.text, self.duration_secs)
    }
}

impl fmt::Display for ArchiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.entries.iter().find(|e| e.kind == ArchiveInfoKind::Title);
        match title {
            Some(entry) => write!(f, "\"{}\", {} entries", entry.text, self.entries.len()),
            None        => write!(f, "{} entries", self.entries.len()),
        }
    }
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} entries", self.entries.len())
    }
}

impl fmt::Display for CustomInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\", {} byte(s)", latin1(&self.identifier).trim_end(), self.data.len())
    }
}

impl fmt::Display for GlueBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{:02}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;

    fn decode<T: BlockDecode>(payload: &[u8]) -> Result<T> {
        T::decode_payload(&mut SliceCursor::new(payload))
    }

    #[test]
    fn texts() {
        let text = decode::<TextDescription>(b"\x0CSide A\xA9 1984").unwrap();
        assert_eq!(text.text, "Side A\u{a9} 1984");

        let msg = decode::<Message>(b"\x05\x0APress PLAY").unwrap();
        assert_eq!(msg.duration_secs, 5);
        assert_eq!(msg.text, "Press PLAY");
        assert_eq!(msg.to_string(), "\"Press PLAY\" for 5 s");
    }

    #[test]
    fn archive_info() {
        let payload = b"\x12\x00\x03\x00\x07Manic M\x03\x041983\xFF\x00";
        let info = decode::<ArchiveInfo>(payload).unwrap();
        assert_eq!(info.entries, vec![
            ArchiveEntry { kind: ArchiveInfoKind::Title, text: "Manic M".into() },
            ArchiveEntry { kind: ArchiveInfoKind::Year, text: "1983".into() },
            ArchiveEntry { kind: ArchiveInfoKind::Comment, text: String::new() },
        ]);
        assert_eq!(info.to_string(), "\"Manic M\", 3 entries");
        assert_eq!(ArchiveInfoKind::from(0x42).to_string(), "Info 0x42");
    }

    #[test]
    fn hardware_type() {
        let info = decode::<HardwareType>(&[0x02, 0x00, 0x05, 0x03, 0x04, 0x01, 0x00]).unwrap();
        assert_eq!(info.entries[0].compatibility, HardwareCompatibility::DoesNotRun);
        assert_eq!(info.entries[0].type_name(), Some("Computers"));
        assert_eq!(info.entries[1], HardwareInfo {
            hw_type: 4, hw_id: 1, compatibility: HardwareCompatibility::Runs,
        });
        assert_eq!(info.entries[1].type_name(), Some("Joysticks"));
    }

    #[test]
    fn custom_info() {
        let payload = b"POKEs     \x03\x00\x00\x00abc";
        let info = decode::<CustomInfo>(payload).unwrap();
        assert_eq!(&info.identifier, b"POKEs     ");
        assert_eq!(info.data, b"abc");
        assert_eq!(info.to_string(), "\"POKEs\", 3 byte(s)");
    }

    #[test]
    fn glue_block() {
        let glue = decode::<GlueBlock>(b"XTape!\x1A\x01\x14").unwrap();
        assert_eq!(glue, GlueBlock { major: 1, minor: 20 });
        assert_eq!(glue.to_string(), "v1.20");
        match decode::<GlueBlock>(b"XTope!\x1A\x01\x14") {
            Err(TapeError::MalformedHeader { offset: 0 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
