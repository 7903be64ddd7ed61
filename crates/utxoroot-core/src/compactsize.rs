use crate::error::SnapshotError;
use crate::wire_read::Reader;

pub fn read_compact_size(r: &mut Reader<'_>) -> Result<(u64, usize), SnapshotError> {
    let start = r.offset();
    let tag = r.read_u8()?;

    let (v, minimal_ok) = match tag {
        0x00..=0xfc => (tag as u64, true),
        0xfd => {
            let v = r.read_u16_le()? as u64;
            (v, v >= 0xfd)
        }
        0xfe => {
            let v = r.read_u32_le()? as u64;
            (v, v > 0xffff)
        }
        0xff => {
            let v = r.read_u64_le()?;
            (v, v > 0xffff_ffff)
        }
    };

    if !minimal_ok {
        return Err(SnapshotError::parse("non-minimal CompactSize"));
    }

    Ok((v, r.offset() - start))
}

pub fn encode_compact_size(n: u64, out: &mut Vec<u8>) {
    match n {
        0x00..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&n.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_size_boundaries() {
        let cases = [
            (0u64, 1usize),
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x1_0000, 5),
            (0x1_0000_0000, 9),
        ];
        for (n, len) in cases {
            let mut out = Vec::new();
            encode_compact_size(n, &mut out);
            assert_eq!(out.len(), len, "n={n:#x}");
            let mut r = Reader::new(&out);
            assert_eq!(read_compact_size(&mut r).unwrap(), (n, len));
        }
    }

    #[test]
    fn compact_size_rejects_non_minimal() {
        let mut r = Reader::new(&[0xfd, 0x10, 0x00]);
        let err = read_compact_size(&mut r).unwrap_err();
        assert_eq!(err.msg, "non-minimal CompactSize");
    }
}
