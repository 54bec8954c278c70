use crate::crypto::{KEY_SIZE, NONCE_SIZE};
use crate::error::HorcruxError;
use crate::shamir::Share;

/// File marker at the start of every horcrux.
pub const MAGIC: [u8; 4] = *b"HRCX";
/// Current on-disk format version.
pub const FORMAT_VERSION: u8 = 1;
/// Length of the blake3 checksums embedded in the format.
pub const CHECKSUM_SIZE: usize = 32;
/// Length of the random group identifier.
pub const GROUP_ID_SIZE: usize = 16;

/// Metadata shared identically by every horcrux produced in one split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDescriptor {
    /// Random 128-bit identifier tying a group of horcruxes together.
    pub group_id: [u8; GROUP_ID_SIZE],
    /// Total number of horcruxes created (N).
    pub total: u8,
    /// Minimum number needed to reconstruct (K).
    pub threshold: u8,
    /// File name of the original plaintext.
    pub file_name: String,
    /// Length of the original plaintext in bytes.
    pub file_size: u64,
    /// blake3 hash of the original plaintext, checked after decryption.
    pub content_checksum: [u8; CHECKSUM_SIZE],
}

impl GroupDescriptor {
    /// Short hex form of the group id for error messages and display.
    pub fn group_hex(&self) -> String {
        self.group_id.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// One persisted horcrux: group metadata, this fragment's key share, and the
/// full ciphertext (duplicated across the group so any K files suffice alone).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub descriptor: GroupDescriptor,
    pub share: Share,
    pub nonce: [u8; NONCE_SIZE],
    pub ciphertext: Vec<u8>,
}

/// Serialize a fragment to its on-disk byte layout.
///
/// Layout (little-endian): magic, version, group id, N, K, share index,
/// share value (u16 length prefix), file name (u16 length prefix), plaintext
/// size (u64), plaintext checksum, nonce, ciphertext (u64 length prefix),
/// then a blake3 checksum over all preceding bytes.
pub fn encode(fragment: &Fragment) -> Vec<u8> {
    let d = &fragment.descriptor;
    let name_bytes = d.file_name.as_bytes();

    let mut buf = Vec::with_capacity(
        4 + 1
            + GROUP_ID_SIZE
            + 3
            + 2
            + fragment.share.data.len()
            + 2
            + name_bytes.len()
            + 8
            + CHECKSUM_SIZE
            + NONCE_SIZE
            + 8
            + fragment.ciphertext.len()
            + CHECKSUM_SIZE,
    );

    buf.extend_from_slice(&MAGIC);
    buf.push(FORMAT_VERSION);
    buf.extend_from_slice(&d.group_id);
    buf.push(d.total);
    buf.push(d.threshold);
    buf.push(fragment.share.id);
    buf.extend_from_slice(&(fragment.share.data.len() as u16).to_le_bytes());
    buf.extend_from_slice(&fragment.share.data);
    buf.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
    buf.extend_from_slice(name_bytes);
    buf.extend_from_slice(&d.file_size.to_le_bytes());
    buf.extend_from_slice(&d.content_checksum);
    buf.extend_from_slice(&fragment.nonce);
    buf.extend_from_slice(&(fragment.ciphertext.len() as u64).to_le_bytes());
    buf.extend_from_slice(&fragment.ciphertext);

    let checksum = blake3::hash(&buf);
    buf.extend_from_slice(checksum.as_bytes());

    buf
}

/// Parse a fragment from its on-disk bytes.
///
/// The magic and the trailing codec checksum are verified before any field
/// is parsed, so file corruption is reported as [`HorcruxError::CorruptFragment`]
/// without ever reaching the cryptographic layer.
pub fn decode(bytes: &[u8]) -> Result<Fragment, HorcruxError> {
    if bytes.len() < MAGIC.len() + 1 + CHECKSUM_SIZE {
        return Err(HorcruxError::CorruptFragment(
            "file too short to be a horcrux".into(),
        ));
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(HorcruxError::CorruptFragment(
            "missing horcrux magic marker".into(),
        ));
    }

    let (body, stored) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
    let computed = blake3::hash(body);
    if computed.as_bytes() != stored {
        return Err(HorcruxError::CorruptFragment("checksum mismatch".into()));
    }

    let version = body[MAGIC.len()];
    if version != FORMAT_VERSION {
        return Err(HorcruxError::UnsupportedVersion(version));
    }

    let mut r = Reader::new(&body[MAGIC.len() + 1..]);

    let group_id: [u8; GROUP_ID_SIZE] = r.take_array()?;
    let total = r.take_u8()?;
    let threshold = r.take_u8()?;
    if threshold < 2 || threshold > total {
        return Err(HorcruxError::CorruptFragment(format!(
            "invalid threshold metadata ({threshold} of {total})"
        )));
    }
    let share_id = r.take_u8()?;
    if share_id == 0 {
        return Err(HorcruxError::CorruptFragment(
            "share index must be non-zero".into(),
        ));
    }

    let share_len = r.take_u16()? as usize;
    if share_len != KEY_SIZE {
        return Err(HorcruxError::CorruptFragment(format!(
            "unexpected share length {share_len}"
        )));
    }
    let share_data = r.take_bytes(share_len)?.to_vec();

    let name_len = r.take_u16()? as usize;
    let file_name = std::str::from_utf8(r.take_bytes(name_len)?)
        .map_err(|_| HorcruxError::CorruptFragment("file name is not valid UTF-8".into()))?
        .to_string();

    let file_size = r.take_u64()?;
    let content_checksum: [u8; CHECKSUM_SIZE] = r.take_array()?;
    let nonce: [u8; NONCE_SIZE] = r.take_array()?;

    let ciphertext_len = r.take_u64()? as usize;
    let ciphertext = r.take_bytes(ciphertext_len)?.to_vec();

    if !r.is_empty() {
        return Err(HorcruxError::CorruptFragment(
            "trailing bytes after ciphertext".into(),
        ));
    }

    Ok(Fragment {
        descriptor: GroupDescriptor {
            group_id,
            total,
            threshold,
            file_name,
            file_size,
            content_checksum,
        },
        share: Share {
            id: share_id,
            data: share_data,
        },
        nonce,
        ciphertext,
    })
}

/// Bounds-checked cursor over the fragment body.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], HorcruxError> {
        if self.bytes.len() < len {
            return Err(HorcruxError::CorruptFragment("truncated horcrux".into()));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], HorcruxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take_bytes(N)?);
        Ok(out)
    }

    fn take_u8(&mut self) -> Result<u8, HorcruxError> {
        Ok(self.take_bytes(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, HorcruxError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    fn take_u64(&mut self) -> Result<u64, HorcruxError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fragment() -> Fragment {
        Fragment {
            descriptor: GroupDescriptor {
                group_id: [7u8; GROUP_ID_SIZE],
                total: 5,
                threshold: 3,
                file_name: "secret.txt".to_string(),
                file_size: 10,
                content_checksum: *blake3::hash(b"0123456789").as_bytes(),
            },
            share: Share {
                id: 2,
                data: vec![0xab; KEY_SIZE],
            },
            nonce: [9u8; NONCE_SIZE],
            ciphertext: vec![1, 2, 3, 4, 5, 6, 7, 8],
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let fragment = sample_fragment();
        let bytes = encode(&fragment);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, fragment);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_fragment());
        bytes[0] = b'X';
        assert!(matches!(
            decode(&bytes),
            Err(HorcruxError::CorruptFragment(_))
        ));
    }

    #[test]
    fn test_any_byte_flip_is_detected() {
        let bytes = encode(&sample_fragment());
        // Flip a byte in each region: version, metadata, share, ciphertext
        for idx in [4, 10, 30, bytes.len() - CHECKSUM_SIZE - 2] {
            let mut tampered = bytes.clone();
            tampered[idx] ^= 0xff;
            assert!(
                matches!(decode(&tampered), Err(HorcruxError::CorruptFragment(_))),
                "byte flip at {idx} not caught"
            );
        }
    }

    #[test]
    fn test_unsupported_version() {
        let fragment = sample_fragment();
        let mut bytes = encode(&fragment);
        // Patch the version and rebuild the trailing checksum so only the
        // version check can fail
        bytes[4] = 99;
        let body_len = bytes.len() - CHECKSUM_SIZE;
        let checksum = blake3::hash(&bytes[..body_len]);
        bytes[body_len..].copy_from_slice(checksum.as_bytes());

        assert!(matches!(
            decode(&bytes),
            Err(HorcruxError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_truncated_file() {
        let bytes = encode(&sample_fragment());
        assert!(matches!(
            decode(&bytes[..10]),
            Err(HorcruxError::CorruptFragment(_))
        ));
        assert!(matches!(decode(&[]), Err(HorcruxError::CorruptFragment(_))));
    }
}
