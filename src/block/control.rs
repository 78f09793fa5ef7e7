//! Blocks steering playback: pauses, groups, jumps, loops, calls and
//! selections. Offsets are relative block indices; 0 would be the block
//! itself.

use std::fmt;

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::field::FieldRead;

use super::{BlockDecode, BlockKind, LengthBound};

/// Silence; a pause of 0 stops the tape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PauseTapeCommand {
    pub pause: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupStart {
    pub name: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupEnd;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct JumpTo {
    pub offset: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LoopStart {
    pub repetitions: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoopEnd;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallSequence {
    pub offsets: Vec<i16>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReturnFromSequence;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectEntry {
    pub offset:      i16,
    pub description: String,
}

/// A menu of places on the tape to continue from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Select {
    pub entries: Vec<SelectEntry>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StopTapeWhen48k;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SetSignalLevel {
    /// 0 for low, 1 for high.
    pub level: u8,
}

impl PauseTapeCommand {
    pub fn is_stop(&self) -> bool {
        self.pause == 0
    }
}

impl BlockDecode for PauseTapeCommand {
    const KIND: BlockKind = BlockKind::PauseTapeCommand;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(PauseTapeCommand { pause: cur.read_u16_le()? })
    }
}

impl BlockDecode for GroupStart {
    const KIND: BlockKind = BlockKind::GroupStart;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(GroupStart { name: cur.read_text_u8()? })
    }
}

impl BlockDecode for GroupEnd {
    const KIND: BlockKind = BlockKind::GroupEnd;

    fn decode_payload<C: ByteCursor + ?Sized>(_: &mut C) -> Result<Self> {
        Ok(GroupEnd)
    }
}

impl BlockDecode for JumpTo {
    const KIND: BlockKind = BlockKind::JumpTo;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(JumpTo { offset: cur.read_i16_le()? })
    }
}

impl BlockDecode for LoopStart {
    const KIND: BlockKind = BlockKind::LoopStart;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        Ok(LoopStart { repetitions: cur.read_u16_le()? })
    }
}

impl BlockDecode for LoopEnd {
    const KIND: BlockKind = BlockKind::LoopEnd;

    fn decode_payload<C: ByteCursor + ?Sized>(_: &mut C) -> Result<Self> {
        Ok(LoopEnd)
    }
}

impl BlockDecode for CallSequence {
    const KIND: BlockKind = BlockKind::CallSequence;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let count = cur.read_u16_le()?;
        let offsets = (0..count)
            .map(|_| cur.read_i16_le())
            .collect::<Result<Vec<_>>>()?;
        Ok(CallSequence { offsets })
    }
}

impl BlockDecode for ReturnFromSequence {
    const KIND: BlockKind = BlockKind::ReturnFromSequence;

    fn decode_payload<C: ByteCursor + ?Sized>(_: &mut C) -> Result<Self> {
        Ok(ReturnFromSequence)
    }
}

impl BlockDecode for Select {
    const KIND: BlockKind = BlockKind::Select;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u16_le()?;
        let bound = LengthBound::new(&*cur, Self::KIND, declared.into());
        let count = cur.read_u8()?;
        let entries = (0..count)
            .map(|_| -> Result<SelectEntry> {
                let offset = cur.read_i16_le()?;
                let description = cur.read_text_u8()?;
                Ok(SelectEntry { offset, description })
            })
            .collect::<Result<Vec<_>>>()?;
        bound.finish(cur)?;
        Ok(Select { entries })
    }
}

impl BlockDecode for StopTapeWhen48k {
    const KIND: BlockKind = BlockKind::StopTapeWhen48k;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u32_le()?;
        LengthBound::new(&*cur, Self::KIND, declared).finish(cur)?;
        Ok(StopTapeWhen48k)
    }
}

impl BlockDecode for SetSignalLevel {
    const KIND: BlockKind = BlockKind::SetSignalLevel;

    fn decode_payload<C: ByteCursor + ?Sized>(cur: &mut C) -> Result<Self> {
        let declared = cur.read_u32_le()?;
        let bound = LengthBound::new(&*cur, Self::KIND, declared);
        bound.require(1)?;
        let level = cur.read_u8()?;
        bound.finish(cur)?;
        Ok(SetSignalLevel { level })
    }
}

impl fmt::Display for PauseTapeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_stop() {
            f.write_str("stop the tape")
        } else {
            write!(f, "{} ms", self.pause)
        }
    }
}

impl fmt::Display for GroupStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.name)
    }
}

impl fmt::Display for JumpTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.offset)
    }
}

impl fmt::Display for LoopStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} time(s)", self.repetitions)
    }
}

impl fmt::Display for CallSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offsets: Vec<String> = self.offsets.iter().map(|o| format!("{:+}", o)).collect();
        write!(f, "[{}]", offsets.join(", "))
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} option(s)", self.entries.len())
    }
}

impl fmt::Display for SetSignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.level == 0 { "low" } else { "high" })
    }
}

macro_rules! empty_display {
    ($($kind:ident),*) => {$(
        impl fmt::Display for $kind {
            fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
                Ok(())
            }
        }
    )*};
}

empty_display!(GroupEnd, LoopEnd, ReturnFromSequence, StopTapeWhen48k);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;
    use crate::error::TapeError;

    fn decode<T: BlockDecode>(payload: &[u8]) -> Result<T> {
        let mut cur = SliceCursor::new(payload);
        let block = T::decode_payload(&mut cur)?;
        assert!(cur.at_end()?, "{} left bytes behind", T::KIND);
        Ok(block)
    }

    #[test]
    fn pause_and_stop() {
        let pause = decode::<PauseTapeCommand>(&[0xE8, 0x03]).unwrap();
        assert_eq!(pause.pause, 1000);
        assert!(!pause.is_stop());
        assert_eq!(pause.to_string(), "1000 ms");
        let stop = decode::<PauseTapeCommand>(&[0, 0]).unwrap();
        assert!(stop.is_stop());
    }

    #[test]
    fn groups_jumps_and_loops() {
        assert_eq!(decode::<GroupStart>(b"\x04Demo").unwrap().name, "Demo");
        assert_eq!(decode::<GroupEnd>(&[]).unwrap(), GroupEnd);
        let jump = decode::<JumpTo>(&[0xFE, 0xFF]).unwrap();
        assert_eq!(jump.offset, -2);
        assert_eq!(jump.to_string(), "-2");
        assert_eq!(decode::<LoopStart>(&[0x03, 0x00]).unwrap().repetitions, 3);
        assert_eq!(decode::<LoopEnd>(&[]).unwrap(), LoopEnd);
    }

    #[test]
    fn call_sequence() {
        let call = decode::<CallSequence>(&[0x02, 0x00, 0x05, 0x00, 0xFD, 0xFF]).unwrap();
        assert_eq!(call.offsets, vec![5, -3]);
        assert_eq!(call.to_string(), "[+5, -3]");
        assert_eq!(decode::<ReturnFromSequence>(&[]).unwrap(), ReturnFromSequence);
    }

    #[test]
    fn select() {
        let payload = b"\x0F\x00\x02\x01\x00\x04Game\x02\x00\x04Demo";
        let select = decode::<Select>(payload).unwrap();
        assert_eq!(select.entries, vec![
            SelectEntry { offset: 1, description: "Game".into() },
            SelectEntry { offset: 2, description: "Demo".into() },
        ]);
    }

    #[test]
    fn select_longer_than_declared() {
        let payload = b"\x05\x00\x01\x01\x00\x04Game";
        match decode::<Select>(payload) {
            Err(TapeError::BlockLengthMismatch { kind: BlockKind::Select, declared: 5, needed: 8 }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stop_when_48k_and_signal_level() {
        assert_eq!(decode::<StopTapeWhen48k>(&[0, 0, 0, 0]).unwrap(), StopTapeWhen48k);
        // A non-zero length is skipped over.
        assert_eq!(decode::<StopTapeWhen48k>(&[2, 0, 0, 0, 0xAA, 0xBB]).unwrap(), StopTapeWhen48k);
        assert_eq!(decode::<SetSignalLevel>(&[1, 0, 0, 0, 1]).unwrap().level, 1);
        assert!(matches!(
            decode::<SetSignalLevel>(&[0, 0, 0, 0, 1]),
            Err(TapeError::BlockLengthMismatch { declared: 0, needed: 1, .. })
        ));
    }
}
