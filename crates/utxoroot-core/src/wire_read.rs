use crate::error::SnapshotError;

/// Bounds-checked little-endian cursor over a stored value.
pub struct Reader<'a> {
    b: &'a [u8],
    off: usize,
}

impl<'a> Reader<'a> {
    pub fn new(b: &'a [u8]) -> Self {
        Self { b, off: 0 }
    }

    pub fn offset(&self) -> usize {
        self.off
    }

    pub fn remaining(&self) -> usize {
        self.b.len() - self.off
    }

    fn take<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], SnapshotError> {
        if N > self.remaining() {
            return Err(SnapshotError::parse(format!("unexpected EOF ({what})")));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.b[self.off..self.off + N]);
        self.off += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, SnapshotError> {
        let [v] = self.take::<1>("u8")?;
        Ok(v)
    }

    pub fn read_u16_le(&mut self) -> Result<u16, SnapshotError> {
        Ok(u16::from_le_bytes(self.take("u16le")?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, SnapshotError> {
        Ok(u32::from_le_bytes(self.take("u32le")?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, SnapshotError> {
        Ok(u64::from_le_bytes(self.take("u64le")?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64, SnapshotError> {
        Ok(i64::from_le_bytes(self.take("i64le")?))
    }

    pub fn read_hash32(&mut self) -> Result<[u8; 32], SnapshotError> {
        self.take("hash32")
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], SnapshotError> {
        if n > self.remaining() {
            return Err(SnapshotError::parse("unexpected EOF (bytes)"));
        }
        let v = &self.b[self.off..self.off + n];
        self.off += n;
        Ok(v)
    }
}
