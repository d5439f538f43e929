//! Local archive of delivered documents.
//!
//! An archive is a flat sequence of frames:
//! `[len: u32 LE][crc32: u32 LE][payload: bincode(RecordFrame)]`.
//! The first frame of a file is a [`RecordFrame::Header`]; every run appends
//! one [`RecordFrame::Document`].
use anyhow::{bail, Context, Result};
use crc32fast::Hasher as Crc32;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::record::{DailyDocument, FileHeader, RecordFrame};

pub const ARCHIVE_VERSION: u16 = 1;

fn now_unix_ns() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}

fn crc32(payload: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(payload);
    hasher.finalize()
}

pub fn write_frame<W: Write>(w: &mut W, frame: &RecordFrame) -> Result<()> {
    let payload = bincode::serialize(frame)?;
    let len = u32::try_from(payload.len()).context("frame larger than 4 GiB")?;
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&crc32(&payload).to_le_bytes())?;
    w.write_all(&payload)?;
    Ok(())
}

/// Appends documents to an archive file, writing the header on first use.
pub struct ArchiveWriter {
    path: PathBuf,
    w: BufWriter<File>,
}

impl ArchiveWriter {
    pub fn open_append(path: impl AsRef<Path>, source: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create archive dir {parent:?}"))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open archive {path:?}"))?;
        let is_new = file.metadata()?.len() == 0;
        let mut w = BufWriter::new(file);
        if is_new {
            write_frame(
                &mut w,
                &RecordFrame::Header(FileHeader {
                    version: ARCHIVE_VERSION,
                    created_unix_ns: now_unix_ns(),
                    source: source.to_string(),
                }),
            )?;
            w.flush()?;
        }
        Ok(Self { path, w })
    }

    pub fn append(&mut self, doc: &DailyDocument) -> Result<()> {
        write_frame(&mut self.w, &RecordFrame::Document(doc.clone()))
            .with_context(|| format!("append to {:?}", self.path))?;
        self.w.flush()?;
        Ok(())
    }
}

/// Reads frames back in order, verifying each CRC.
pub struct ArchiveReader<R> {
    r: R,
    frames: usize,
}

impl ArchiveReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {path:?}"))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(r: R) -> Self {
        Self { r, frames: 0 }
    }

    /// Frames successfully read so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Frame length prefix; `None` only when EOF falls on a frame boundary.
    fn read_len(&mut self) -> Result<Option<u32>> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.r.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => bail!("truncated frame {}", self.frames),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(u32::from_le_bytes(buf)))
    }

    /// Next frame, `None` at a clean end of file.
    pub fn next_frame(&mut self) -> Result<Option<RecordFrame>> {
        let Some(len) = self.read_len()? else {
            return Ok(None);
        };
        let len = len as usize;
        let mut buf = [0u8; 4];
        self.r
            .read_exact(&mut buf)
            .with_context(|| format!("truncated frame {}", self.frames))?;
        let crc_on_file = u32::from_le_bytes(buf);
        let mut payload = vec![0u8; len];
        self.r
            .read_exact(&mut payload)
            .with_context(|| format!("truncated frame {}", self.frames))?;
        let crc_calc = crc32(&payload);
        if crc_calc != crc_on_file {
            bail!(
                "CRC mismatch at frame {}: file={:#x}, calc={:#x}",
                self.frames,
                crc_on_file,
                crc_calc
            );
        }
        let frame: RecordFrame = bincode::deserialize(&payload).context("bincode decode")?;
        self.frames += 1;
        Ok(Some(frame))
    }
}

impl<R: Read> Iterator for ArchiveReader<R> {
    type Item = Result<RecordFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
