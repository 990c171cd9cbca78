/* Storage geometry of a slot field inside a struct's data or pointer section */

use capn_schema::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWidth {
    Void,
    Bit,
    /* Data section bytes */
    Bytes(u32),
    Pointer,
}

/// Storage class used to share union case arms. Members of the same class
/// stored at the same offset overlay each other in the generated C union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaseClass {
    Bool,
    Enum,
    Bits8,
    Bits16,
    Bits32,
    Bits64,
    Text,
    Data,
    Pointer,
}

impl CaseClass {
    pub fn of(ty: &Type) -> Option<CaseClass> {
        let class = match ty {
            Type::Void => return None,
            Type::Bool => CaseClass::Bool,
            Type::Enum(_) => CaseClass::Enum,
            Type::Int8 | Type::Uint8 => CaseClass::Bits8,
            Type::Int16 | Type::Uint16 => CaseClass::Bits16,
            Type::Int32 | Type::Uint32 | Type::Float32 => CaseClass::Bits32,
            Type::Int64 | Type::Uint64 | Type::Float64 => CaseClass::Bits64,
            Type::Text => CaseClass::Text,
            Type::Data => CaseClass::Data,
            Type::Struct(_) | Type::Interface(_) | Type::AnyPointer(_) | Type::List(_) => {
                CaseClass::Pointer
            }
        };
        Some(class)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    pub width: SlotWidth,
    /* Slot offset in units of the slot's own width */
    pub offset: u32,
}

impl SlotLayout {
    pub fn new(ty: &Type, offset: u32) -> Self {
        let width = match ty {
            Type::Void => SlotWidth::Void,
            Type::Bool => SlotWidth::Bit,
            Type::Int8 | Type::Uint8 => SlotWidth::Bytes(1),
            Type::Int16 | Type::Uint16 | Type::Enum(_) => SlotWidth::Bytes(2),
            Type::Int32 | Type::Uint32 | Type::Float32 => SlotWidth::Bytes(4),
            Type::Int64 | Type::Uint64 | Type::Float64 => SlotWidth::Bytes(8),
            _ => SlotWidth::Pointer,
        };
        Self { width, offset }
    }

    pub fn bits(&self) -> u32 {
        match self.width {
            SlotWidth::Void => 0,
            SlotWidth::Bit => 1,
            SlotWidth::Bytes(n) => n * 8,
            SlotWidth::Pointer => 64,
        }
    }

    /// Byte offset handed to `capn_readN`/`capn_writeN`. For bools this is
    /// the byte holding the bit.
    pub fn byte_offset(&self) -> u32 {
        match self.width {
            SlotWidth::Bit => self.offset / 8,
            SlotWidth::Bytes(n) => n * self.offset,
            SlotWidth::Void | SlotWidth::Pointer => 0,
        }
    }

    pub fn bit_shift(&self) -> u32 {
        match self.width {
            SlotWidth::Bit => self.offset % 8,
            _ => 0,
        }
    }

    pub fn pointer_index(&self) -> Option<u32> {
        matches!(self.width, SlotWidth::Pointer).then_some(self.offset)
    }

    /* Mask selecting the slot's bits from a default value */
    pub fn value_mask(&self) -> u64 {
        match self.bits() {
            0 => 0,
            64 => u64::MAX,
            n => (1u64 << n) - 1,
        }
    }

    /// Persist `value` into a data section: the stored bits are
    /// `value ^ default`. Returns `None` when the slot is outside `data`.
    pub fn store_bits(&self, data: &mut [u8], value: u64, default: u64) -> Option<()> {
        match self.width {
            SlotWidth::Void => Some(()),
            SlotWidth::Pointer => None,
            SlotWidth::Bit => {
                let byte = data.get_mut(self.byte_offset() as usize)?;
                let bit = 1u8 << self.bit_shift();
                if (value & 1) != (default & 1) {
                    *byte |= bit;
                } else {
                    *byte &= !bit;
                }
                Some(())
            }
            SlotWidth::Bytes(n) => {
                let start = self.byte_offset() as usize;
                let dst = data.get_mut(start..start + n as usize)?;
                let raw = (value ^ default).to_le_bytes();
                dst.copy_from_slice(&raw[..n as usize]);
                Some(())
            }
        }
    }

    /// Read a value back: `raw ^ default`, truncated to the slot width.
    pub fn load_bits(&self, data: &[u8], default: u64) -> Option<u64> {
        match self.width {
            SlotWidth::Void => Some(0),
            SlotWidth::Pointer => None,
            SlotWidth::Bit => {
                let byte = *data.get(self.byte_offset() as usize)?;
                let raw = u64::from((byte >> self.bit_shift()) & 1);
                Some(raw ^ (default & 1))
            }
            SlotWidth::Bytes(n) => {
                let start = self.byte_offset() as usize;
                let src = data.get(start..start + n as usize)?;
                let mut raw = [0u8; 8];
                raw[..n as usize].copy_from_slice(src);
                Some((u64::from_le_bytes(raw) ^ default) & self.value_mask())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ty: Type, offset: u32, value: u64, default: u64) -> (Vec<u8>, u64) {
        let layout = SlotLayout::new(&ty, offset);
        let mut data = vec![0u8; 16];
        layout.store_bits(&mut data, value, default).unwrap();
        let back = layout.load_bits(&data, default).unwrap();
        (data, back)
    }

    #[test]
    fn test_point_defaults() {
        /* y: int32 = 5 holding 3 persists 6 */
        let (data, back) = round_trip(Type::Int32, 1, 3, 5);
        assert_eq!(&data[4..8], &6u32.to_le_bytes());
        assert_eq!(back, 3);

        let (data, back) = round_trip(Type::Int32, 0, 3, 0);
        assert_eq!(&data[0..4], &3u32.to_le_bytes());
        assert_eq!(back, 3);
    }

    #[test]
    fn test_zeroed_section_decodes_to_default() {
        let data = [0u8; 16];
        for (ty, default) in [
            (Type::Uint8, 0x7fu64),
            (Type::Int16, 0xfffbu64),
            (Type::Uint32, 123u64),
            (Type::Float64, 1.5f64.to_bits()),
            (Type::Bool, 1u64),
        ] {
            let layout = SlotLayout::new(&ty, 1);
            assert_eq!(layout.load_bits(&data, default), Some(default), "{:?}", ty);
        }
    }

    #[test]
    fn test_scalar_round_trips() {
        let cases = [
            (Type::Bool, 13, 1u64, 1u64),
            (Type::Bool, 13, 0, 1),
            (Type::Int8, 3, 0xfe, 0x01),
            (Type::Uint16, 2, 0xbeef, 0),
            (Type::Float32, 1, 2.5f32.to_bits() as u64, 1.0f32.to_bits() as u64),
            (Type::Int64, 1, (-7i64) as u64, 9),
            (Type::Uint64, 0, u64::MAX, u64::MAX),
        ];
        for (ty, offset, value, default) in cases {
            let (_, back) = round_trip(ty.clone(), offset, value, default);
            let mask = SlotLayout::new(&ty, offset).value_mask();
            assert_eq!(back, value & mask, "{:?}", ty);
        }
    }

    #[test]
    fn test_bool_geometry() {
        let layout = SlotLayout::new(&Type::Bool, 13);
        assert_eq!(layout.byte_offset(), 1);
        assert_eq!(layout.bit_shift(), 5);

        let mut data = [0u8; 2];
        layout.store_bits(&mut data, 1, 0).unwrap();
        assert_eq!(data, [0, 0x20]);
    }

    #[test]
    fn test_case_classes() {
        assert_eq!(CaseClass::of(&Type::Float32), CaseClass::of(&Type::Int32));
        assert_ne!(CaseClass::of(&Type::Uint16), CaseClass::of(&Type::Bool));
        assert_eq!(CaseClass::of(&Type::Void), None);
        assert_eq!(CaseClass::of(&Type::list_of(Type::Text)), Some(CaseClass::Pointer));
        assert_eq!(SlotLayout::new(&Type::Text, 2).pointer_index(), Some(2));
    }
}
