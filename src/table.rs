use crate::fused::{quantize_row, FUSED_OVERHEAD};
use crate::tensor::Tensor;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const T_MAGIC: &[u8; 8] = b"FUSED8R1"; // fused 8-bit rowwise table v1
pub const TABLE_VERSION: u32 = 1;

/// Fused 8-bit rowwise table as stored on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedTable {
    pub rows: usize,
    pub row_width: usize,
    pub bytes: Vec<u8>,
}

impl FusedTable {
    /// Quantizes float rows (all the same length) with the reference quantizer.
    pub fn from_f32_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let dim = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if dim == 0 { bail!("table rows must have at least one value"); }
        let mut bytes = Vec::with_capacity(rows.len() * (dim + FUSED_OVERHEAD));
        for (i, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != dim { bail!("row {} has {} values, expected {}", i, r.len(), dim); }
            bytes.extend(quantize_row(r));
        }
        Ok(Self { rows: rows.len(), row_width: dim + FUSED_OVERHEAD, bytes })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Format:
        // magic: 8 bytes b"FUSED8R1"
        // u32 version, u32 rows, u32 row_width (LE)
        // u8 rows[rows * row_width]
        let f = File::open(&path).with_context(|| format!("open fused table: {}", path.as_ref().display()))?;
        let mut r = BufReader::new(f);
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).context("read magic")?;
        if &magic != T_MAGIC { bail!("bad fused table magic"); }
        let mut b4 = [0u8; 4];
        r.read_exact(&mut b4).context("read version")?;
        let version = u32::from_le_bytes(b4);
        if version != TABLE_VERSION { bail!("unsupported fused table version {}", version); }
        r.read_exact(&mut b4).context("read rows")?;
        let rows = u32::from_le_bytes(b4) as usize;
        r.read_exact(&mut b4).context("read row_width")?;
        let row_width = u32::from_le_bytes(b4) as usize;
        if row_width <= FUSED_OVERHEAD { bail!("row_width {} leaves no room for quantized values", row_width); }
        let n = rows
            .checked_mul(row_width)
            .with_context(|| format!("table size {} x {} overflows", rows, row_width))?;
        // Read no more than the file holds; the header alone never sizes an allocation.
        let mut bytes = Vec::new();
        r.take(n as u64)
            .read_to_end(&mut bytes)
            .with_context(|| format!("read {} x {} table bytes", rows, row_width))?;
        if bytes.len() != n {
            bail!("truncated fused table: expected {} body bytes, found {}", n, bytes.len());
        }
        Ok(Self { rows, row_width, bytes })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = File::create(&path).with_context(|| format!("create fused table: {}", path.as_ref().display()))?;
        let mut w = BufWriter::new(f);
        w.write_all(T_MAGIC)?;
        w.write_all(&TABLE_VERSION.to_le_bytes())?;
        w.write_all(&u32::try_from(self.rows).context("rows exceed u32")?.to_le_bytes())?;
        w.write_all(&u32::try_from(self.row_width).context("row_width exceeds u32")?.to_le_bytes())?;
        w.write_all(&self.bytes)?;
        w.flush().context("flush fused table")?;
        Ok(())
    }

    /// DATA tensor of shape `[rows, row_width]`.
    pub fn into_tensor(self) -> Result<Tensor<u8>> {
        Ok(Tensor::new(vec![self.rows, self.row_width], self.bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1.0f32, 2.0], vec![3.0]];
        assert!(FusedTable::from_f32_rows(&rows).is_err());
    }

    #[test]
    fn builder_sets_width() {
        let t = FusedTable::from_f32_rows(&[[0.0f32, 1.0, 2.0]]).unwrap();
        assert_eq!((t.rows, t.row_width, t.bytes.len()), (1, 11, 11));
    }
}
