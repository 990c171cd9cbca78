/* Scratch segment holding materialized default values.
 *
 * Word 0 is reserved for a root pointer, so generated code indexes the
 * emitted `capn_buf` from byte 8 onwards. */

use thiserror::Error;

pub const CAPN_NULL: u8 = 0;
pub const CAPN_STRUCT: u8 = 1;
pub const CAPN_LIST: u8 = 2;
pub const CAPN_PTR_LIST: u8 = 3;
pub const CAPN_BIT_LIST: u8 = 4;

const WORD: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("message of {0} bytes is not a whole number of words")]
    Unaligned(usize),
    #[error("message is too short to hold a root pointer")]
    Truncated,
    #[error("far pointers are not supported in default values")]
    FarPointer,
    #[error("capability pointers cannot be materialized")]
    Capability,
    #[error("pointer target at word {0} lies outside the message")]
    OutOfRange(i64),
    #[error("composite list tag does not match its word count")]
    BadComposite,
}

/// Mirror of the runtime's `capn_ptr` for an object inside the scratch
/// segment. `data_offset` is relative to the start of the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapnPtr {
    pub kind: u8,
    pub has_ptr_tag: bool,
    pub is_list_member: bool,
    pub is_composite_list: bool,
    pub datasz: u32,
    pub ptrs: u32,
    pub len: u32,
    pub data_offset: usize,
}

impl CapnPtr {
    /* Offset into the emitted capn_buf */
    pub fn buf_offset(&self) -> usize {
        self.data_offset - WORD
    }

    /* Initializer fields in runtime order, up to the data pointer */
    pub fn c_fields(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.kind,
            u8::from(self.has_ptr_tag),
            u8::from(self.is_list_member),
            u8::from(self.is_composite_list),
            self.datasz,
            self.ptrs,
            self.len
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScratchSegment {
    bytes: Vec<u8>,
}

impl Default for ScratchSegment {
    fn default() -> Self {
        Self { bytes: vec![0; WORD] }
    }
}

impl ScratchSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /* True while only the root word is present */
    pub fn is_empty(&self) -> bool {
        self.bytes.len() <= WORD
    }

    /* Bytes emitted as capn_buf */
    pub fn payload(&self) -> &[u8] {
        &self.bytes[WORD..]
    }

    fn alloc(&mut self, size: usize) -> usize {
        let start = self.bytes.len();
        let words = size.div_ceil(WORD);
        self.bytes.resize(start + words * WORD, 0);
        start
    }

    /// Text is stored as a byte list including the NUL terminator.
    pub fn append_text(&mut self, text: &str) -> CapnPtr {
        let start = self.alloc(text.len() + 1);
        self.bytes[start..start + text.len()].copy_from_slice(text.as_bytes());
        CapnPtr {
            kind: CAPN_LIST,
            datasz: 1,
            len: text.len() as u32 + 1,
            data_offset: start,
            ..CapnPtr::default()
        }
    }

    pub fn append_data(&mut self, data: &[u8]) -> CapnPtr {
        let start = self.alloc(data.len());
        self.bytes[start..start + data.len()].copy_from_slice(data);
        CapnPtr {
            kind: CAPN_LIST,
            datasz: 1,
            len: data.len() as u32,
            data_offset: start,
            ..CapnPtr::default()
        }
    }

    /// Copy a single-segment message (word 0 is the root pointer) and
    /// describe its root object. A null root yields `None` and copies nothing.
    pub fn append_message(&mut self, message: &[u8]) -> Result<Option<CapnPtr>, BlobError> {
        if message.len() % WORD != 0 {
            return Err(BlobError::Unaligned(message.len()));
        }
        if message.len() < WORD {
            return Err(BlobError::Truncated);
        }
        let root = read_word(message, 0);
        if root == 0 {
            return Ok(None);
        }
        if is_empty_struct(root) {
            /* zero-sized struct: offset -1, no body. One zero word keeps
             * the data pointer inside capn_buf. */
            let start = self.alloc(WORD);
            return Ok(Some(CapnPtr {
                kind: CAPN_STRUCT,
                data_offset: start,
                ..CapnPtr::default()
            }));
        }

        let words = (message.len() / WORD) as i64;
        let mut ptr = decode_root(root, message, words)?;

        let base = self.alloc(message.len() - WORD);
        self.bytes[base..base + message.len() - WORD].copy_from_slice(&message[WORD..]);
        /* message word w (w >= 1) lands at base + (w - 1) * 8 */
        ptr.data_offset = base + ptr.data_offset - WORD;
        Ok(Some(ptr))
    }
}

fn read_word(message: &[u8], word: usize) -> u64 {
    let mut raw = [0u8; WORD];
    raw.copy_from_slice(&message[word * WORD..(word + 1) * WORD]);
    u64::from_le_bytes(raw)
}

fn is_empty_struct(root: u64) -> bool {
    root & 3 == 0 && root >> 32 == 0
}

/* Decode the root pointer; data_offset is returned relative to the message */
fn decode_root(root: u64, message: &[u8], words: i64) -> Result<CapnPtr, BlobError> {
    let offset = ((root as u32 as i32) >> 2) as i64;
    let target = 1 + offset;
    if target < 1 || target > words {
        return Err(BlobError::OutOfRange(target));
    }
    let mut ptr = CapnPtr::default();
    let end = match root & 3 {
        0 => {
            ptr.kind = CAPN_STRUCT;
            ptr.datasz = ((root >> 32) & 0xffff) as u32 * 8;
            ptr.ptrs = ((root >> 48) & 0xffff) as u32;
            target * 8 + i64::from(ptr.datasz) + 8 * i64::from(ptr.ptrs)
        }
        1 => {
            ptr.kind = CAPN_LIST;
            let count = (root >> 35) as u32;
            ptr.len = count;
            let start = target * 8;
            match (root >> 32) & 7 {
                0 => start,
                1 => {
                    ptr.kind = CAPN_BIT_LIST;
                    ptr.datasz = count.div_ceil(8);
                    start + i64::from(ptr.datasz)
                }
                2 => {
                    ptr.datasz = 1;
                    start + i64::from(count)
                }
                3 => {
                    ptr.datasz = 2;
                    start + 2 * i64::from(count)
                }
                4 => {
                    ptr.datasz = 4;
                    start + 4 * i64::from(count)
                }
                5 => {
                    ptr.datasz = 8;
                    start + 8 * i64::from(count)
                }
                6 => {
                    ptr.kind = CAPN_PTR_LIST;
                    start + 8 * i64::from(count)
                }
                _ => {
                    /* composite: `count` is the word count after the tag */
                    if target >= words {
                        return Err(BlobError::OutOfRange(target));
                    }
                    let tag = read_word(message, target as usize);
                    ptr.datasz = ((tag >> 32) & 0xffff) as u32 * 8;
                    ptr.ptrs = ((tag >> 48) & 0xffff) as u32;
                    ptr.len = (tag as u32) >> 2;
                    ptr.is_composite_list = true;
                    let element = u64::from(ptr.datasz) + 8 * u64::from(ptr.ptrs);
                    if element * u64::from(ptr.len) != 8 * u64::from(count) {
                        return Err(BlobError::BadComposite);
                    }
                    ptr.data_offset = (target as usize + 1) * WORD;
                    let end = (target + 1) * 8 + 8 * i64::from(count);
                    if end > words * 8 {
                        return Err(BlobError::OutOfRange(target));
                    }
                    return Ok(ptr);
                }
            }
        }
        2 => return Err(BlobError::FarPointer),
        _ => return Err(BlobError::Capability),
    };
    if end > words * 8 {
        return Err(BlobError::OutOfRange(target));
    }
    ptr.data_offset = target as usize * WORD;
    Ok(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[u64]) -> Vec<u8> {
        ws.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_text_is_nul_terminated_and_padded() {
        let mut seg = ScratchSegment::new();
        let ptr = seg.append_text("hello");
        assert_eq!(ptr.len, 6);
        assert_eq!(ptr.buf_offset(), 0);
        assert_eq!(seg.payload(), b"hello\0\0\0");

        let next = seg.append_text("world!!!");
        assert_eq!(next.buf_offset(), 8);
        assert_eq!(seg.len(), 8 + 8 + 16);
    }

    #[test]
    fn test_struct_message_is_relocated() {
        let mut seg = ScratchSegment::new();
        seg.append_data(&[1, 2, 3]);

        /* root: struct at offset 0, 1 data word, 0 pointers */
        let message = words(&[1u64 << 32, 42]);
        let ptr = seg.append_message(&message).unwrap().unwrap();
        assert_eq!(ptr.kind, CAPN_STRUCT);
        assert_eq!(ptr.datasz, 8);
        assert_eq!(ptr.ptrs, 0);
        assert_eq!(ptr.buf_offset(), 8);
        assert_eq!(&seg.payload()[8..16], &42u64.to_le_bytes());
    }

    #[test]
    fn test_zero_sized_struct_root() {
        let mut seg = ScratchSegment::new();
        let ptr = seg
            .append_message(&words(&[0xffff_fffc]))
            .unwrap()
            .unwrap();
        assert_eq!(ptr.kind, CAPN_STRUCT);
        assert_eq!((ptr.datasz, ptr.ptrs), (0, 0));
        assert_eq!(ptr.buf_offset(), 0);
        assert_eq!(seg.payload(), &[0u8; 8]);

        /* words after an empty struct root are not copied */
        let ptr = seg.append_message(&words(&[0xffff_fffc, 7])).unwrap().unwrap();
        assert_eq!(ptr.buf_offset(), 8);
    }

    #[test]
    fn test_list_messages() {
        /* list of 3 x 16-bit elements */
        let message = words(&[1 | (3u64 << 32) | (3u64 << 35), 0x0003_0002_0001]);
        let ptr = ScratchSegment::new().append_message(&message).unwrap().unwrap();
        assert_eq!((ptr.kind, ptr.datasz, ptr.len), (CAPN_LIST, 2, 3));

        /* composite list: tag says 2 elements of 1 data word */
        let message = words(&[1 | (7u64 << 32) | (2u64 << 35), (2u64 << 2) | (1u64 << 32), 5, 6]);
        let ptr = ScratchSegment::new().append_message(&message).unwrap().unwrap();
        assert!(ptr.is_composite_list);
        assert_eq!((ptr.datasz, ptr.len), (8, 2));
        assert_eq!(ptr.buf_offset(), 8);

        let bits = words(&[1 | (1u64 << 32) | (10u64 << 35), 0x3ff]);
        let ptr = ScratchSegment::new().append_message(&bits).unwrap().unwrap();
        assert_eq!((ptr.kind, ptr.datasz, ptr.len), (CAPN_BIT_LIST, 2, 10));
    }

    #[test]
    fn test_rejected_messages() {
        let mut seg = ScratchSegment::new();
        assert_eq!(seg.append_message(&words(&[0])).unwrap(), None);
        assert_eq!(seg.append_message(&words(&[2])), Err(BlobError::FarPointer));
        assert_eq!(seg.append_message(&words(&[3])), Err(BlobError::Capability));
        assert_eq!(seg.append_message(&[1, 2, 3]), Err(BlobError::Unaligned(3)));
        assert_eq!(
            seg.append_message(&words(&[2u64 << 32])),
            Err(BlobError::OutOfRange(1))
        );
        assert!(seg.is_empty());
    }
}
