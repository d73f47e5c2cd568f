use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use memmap2::{MmapMut, MmapOptions};
use serde::Deserialize;
use tracing::debug;

use crate::error::StorageError;

const MAGIC: &[u8; 8] = b"WAYFDA01";

/// Number of user header slots persisted with every data access
pub const HEADER_INTS: usize = 20;

/// Magic, segment size, capacity and the header slots, padded to 100 bytes.
const HEADER_SIZE: u64 = 100;

pub const DEFAULT_SEGMENT_SIZE: usize = 1 << 20;
const MIN_SEGMENT_SIZE: usize = 1 << 7;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataAccessKind {
    /// Heap segments, nothing is written to disk
    Ram,
    /// Heap segments, written to a file on flush
    #[default]
    RamStore,
    /// Segments are memory-mapped windows of a file
    Mmap,
}

impl DataAccessKind {
    pub fn name(&self) -> &'static str {
        match self {
            DataAccessKind::Ram => "ram",
            DataAccessKind::RamStore => "ram_store",
            DataAccessKind::Mmap => "mmap",
        }
    }

    fn needs_file(&self) -> bool {
        !matches!(self, DataAccessKind::Ram)
    }
}

enum Segments {
    Heap(Vec<Box<[u8]>>),
    Mapped { file: File, maps: Vec<MmapMut> },
}

/// Growable byte store split into fixed-size segments.
///
/// Ints are little-endian and must be read and written at 4-aligned positions,
/// shorts at 2-aligned positions. Segments are a power of two of at least 128
/// bytes so an aligned value never spans two segments.
pub struct DataAccess {
    name: String,
    path: Option<PathBuf>,
    kind: DataAccessKind,
    segment_size: usize,
    segment_power: u32,
    header: [i32; HEADER_INTS],
    segments: Option<Segments>,
}

impl DataAccess {
    pub fn new(
        name: &str,
        path: Option<PathBuf>,
        kind: DataAccessKind,
        segment_size: usize,
    ) -> Result<Self, StorageError> {
        if segment_size < MIN_SEGMENT_SIZE || !segment_size.is_power_of_two() {
            return Err(StorageError::InvalidSegmentSize(segment_size));
        }

        if kind.needs_file() && path.is_none() {
            return Err(StorageError::MissingLocation {
                name: name.to_string(),
                kind: kind.name(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            path,
            kind,
            segment_size,
            segment_power: segment_size.trailing_zeros(),
            header: [0; HEADER_INTS],
            segments: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DataAccessKind {
        self.kind
    }

    pub fn segment_size(&self) -> usize {
        self.segment_size
    }

    pub fn segments_count(&self) -> usize {
        match &self.segments {
            Some(Segments::Heap(segments)) => segments.len(),
            Some(Segments::Mapped { maps, .. }) => maps.len(),
            None => 0,
        }
    }

    pub fn capacity(&self) -> u64 {
        (self.segments_count() * self.segment_size) as u64
    }

    /// Allocates the first segments. An existing file is truncated.
    pub fn create(&mut self, initial_bytes: u64) -> Result<(), StorageError> {
        self.segments = Some(match self.kind {
            DataAccessKind::Ram | DataAccessKind::RamStore => Segments::Heap(Vec::new()),
            DataAccessKind::Mmap => {
                let path = self.file_path()?;
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                file.set_len(HEADER_SIZE)?;
                Segments::Mapped {
                    file,
                    maps: Vec::new(),
                }
            }
        });

        self.ensure_capacity(initial_bytes.max(self.segment_size as u64))?;
        Ok(())
    }

    /// Grows to hold at least `bytes`. Returns true if new segments were added.
    pub fn ensure_capacity(&mut self, bytes: u64) -> Result<bool, StorageError> {
        let segment_size = self.segment_size;
        let required = bytes.div_ceil(segment_size as u64) as usize;
        let current = self.segments_count();
        if required <= current {
            return Ok(false);
        }

        match self.segments.as_mut() {
            None => return Err(StorageError::Uninitialized(self.name.clone())),
            Some(Segments::Heap(segments)) => {
                segments.resize_with(required, || vec![0; segment_size].into_boxed_slice());
            }
            Some(Segments::Mapped { file, maps }) => {
                file.set_len(HEADER_SIZE + (required * segment_size) as u64)?;
                for index in current..required {
                    maps.push(map_segment(file, index, segment_size)?);
                }
            }
        }

        Ok(true)
    }

    /// Loads a previously flushed file. Returns false if there is no file.
    pub fn load_existing(&mut self) -> Result<bool, StorageError> {
        if !self.kind.needs_file() {
            return Ok(false);
        }

        let path = self.file_path()?.to_path_buf();
        if !path.exists() {
            return Ok(false);
        }

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let (segment_size, segments_count) = self.read_header(&mut file, &path)?;

        if segment_size != self.segment_size {
            debug!(
                "{}: using stored segment size {} instead of {}",
                self.name, segment_size, self.segment_size
            );
            self.segment_size = segment_size;
            self.segment_power = segment_size.trailing_zeros();
        }

        let expected_len = HEADER_SIZE + (segments_count * segment_size) as u64;
        if file.metadata()?.len() < expected_len {
            return Err(StorageError::InvalidHeader {
                path,
                reason: format!("file is shorter than {} bytes", expected_len),
            });
        }

        self.segments = Some(match self.kind {
            DataAccessKind::Ram => unreachable!("ram data access has no file"),
            DataAccessKind::RamStore => {
                let mut reader = BufReader::new(file);
                let mut segments = Vec::with_capacity(segments_count);
                for _ in 0..segments_count {
                    let mut segment = vec![0; segment_size].into_boxed_slice();
                    reader.read_exact(&mut segment)?;
                    segments.push(segment);
                }
                Segments::Heap(segments)
            }
            DataAccessKind::Mmap => {
                let mut maps = Vec::with_capacity(segments_count);
                for index in 0..segments_count {
                    maps.push(map_segment(&file, index, segment_size)?);
                }
                Segments::Mapped { file, maps }
            }
        });

        debug!(
            "Loaded {} with {} segments from {}",
            self.name,
            segments_count,
            path.display()
        );

        Ok(true)
    }

    pub fn flush(&mut self) -> Result<(), StorageError> {
        let header = self.encode_header();
        match (&mut self.segments, self.kind) {
            (None, _) => Err(StorageError::Uninitialized(self.name.clone())),
            (Some(_), DataAccessKind::Ram) => Ok(()),
            (Some(Segments::Heap(segments)), _) => {
                let path = self.path.as_deref().ok_or_else(|| StorageError::MissingLocation {
                    name: self.name.clone(),
                    kind: self.kind.name(),
                })?;
                let mut writer = BufWriter::new(File::create(path)?);
                writer.write_all(&header)?;
                for segment in segments.iter() {
                    writer.write_all(segment)?;
                }
                writer.flush()?;
                Ok(())
            }
            (Some(Segments::Mapped { file, maps }), _) => {
                for map in maps.iter() {
                    map.flush()?;
                }
                file.seek(SeekFrom::Start(0))?;
                file.write_all(&header)?;
                file.sync_all()?;
                Ok(())
            }
        }
    }

    /// Syncs mapped segments and releases them. Every segment is synced and
    /// released even if one fails, the first failure is returned.
    pub fn close(self) -> Result<(), StorageError> {
        let synced = match &self.segments {
            Some(Segments::Mapped { maps, .. }) => maps
                .iter()
                .map(|map| map.flush())
                .fold(Ok(()), |first, result| first.and(result)),
            _ => Ok(()),
        };
        debug!("Closed {}", self.name);
        drop(self);
        synced.map_err(StorageError::from)
    }

    pub fn set_header(&mut self, index: usize, value: i32) {
        self.header[index] = value;
    }

    pub fn header(&self, index: usize) -> i32 {
        self.header[index]
    }

    #[inline]
    pub fn get_int(&self, pos: u64) -> i32 {
        let (segment, index) = self.locate(pos);
        let bytes = &self.segment(segment)[index..index + 4];
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[inline]
    pub fn set_int(&mut self, pos: u64, value: i32) {
        let (segment, index) = self.locate(pos);
        self.segment_mut(segment)[index..index + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn get_short(&self, pos: u64) -> i16 {
        let (segment, index) = self.locate(pos);
        let bytes = &self.segment(segment)[index..index + 2];
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    #[inline]
    pub fn set_short(&mut self, pos: u64, value: i16) {
        let (segment, index) = self.locate(pos);
        self.segment_mut(segment)[index..index + 2].copy_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn get_byte(&self, pos: u64) -> u8 {
        let (segment, index) = self.locate(pos);
        self.segment(segment)[index]
    }

    #[inline]
    pub fn set_byte(&mut self, pos: u64, value: u8) {
        let (segment, index) = self.locate(pos);
        self.segment_mut(segment)[index] = value;
    }

    /// Copies `out.len()` bytes starting at `pos`, possibly across segments
    pub fn get_bytes(&self, pos: u64, out: &mut [u8]) {
        let mut copied = 0;
        while copied < out.len() {
            let (segment, index) = self.locate(pos + copied as u64);
            let len = (self.segment_size - index).min(out.len() - copied);
            out[copied..copied + len].copy_from_slice(&self.segment(segment)[index..index + len]);
            copied += len;
        }
    }

    pub fn set_bytes(&mut self, pos: u64, bytes: &[u8]) {
        let mut copied = 0;
        while copied < bytes.len() {
            let (segment, index) = self.locate(pos + copied as u64);
            let len = (self.segment_size - index).min(bytes.len() - copied);
            self.segment_mut(segment)[index..index + len]
                .copy_from_slice(&bytes[copied..copied + len]);
            copied += len;
        }
    }

    #[inline]
    fn locate(&self, pos: u64) -> (usize, usize) {
        (
            (pos >> self.segment_power) as usize,
            (pos & (self.segment_size as u64 - 1)) as usize,
        )
    }

    #[inline]
    fn segment(&self, index: usize) -> &[u8] {
        match &self.segments {
            Some(Segments::Heap(segments)) => &segments[index],
            Some(Segments::Mapped { maps, .. }) => &maps[index],
            None => panic!("Data access {} is not readable", self.name),
        }
    }

    #[inline]
    fn segment_mut(&mut self, index: usize) -> &mut [u8] {
        match &mut self.segments {
            Some(Segments::Heap(segments)) => &mut segments[index],
            Some(Segments::Mapped { maps, .. }) => &mut maps[index],
            None => panic!("Data access {} is not writable", self.name),
        }
    }

    fn file_path(&self) -> Result<&Path, StorageError> {
        self.path
            .as_deref()
            .ok_or_else(|| StorageError::MissingLocation {
                name: self.name.clone(),
                kind: self.kind.name(),
            })
    }

    fn encode_header(&self) -> [u8; HEADER_SIZE as usize] {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        bytes[0..8].copy_from_slice(MAGIC);
        bytes[8..12].copy_from_slice(&(self.segment_size as u32).to_le_bytes());
        bytes[12..16].copy_from_slice(&(self.segments_count() as u32).to_le_bytes());
        for (slot, value) in self.header.iter().enumerate() {
            let offset = 16 + slot * 4;
            bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    fn read_header(&mut self, file: &mut File, path: &Path) -> Result<(usize, usize), StorageError> {
        let mut bytes = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut bytes)
            .map_err(|_| StorageError::InvalidHeader {
                path: path.to_path_buf(),
                reason: String::from("file is too short"),
            })?;

        if &bytes[0..8] != MAGIC {
            return Err(StorageError::InvalidHeader {
                path: path.to_path_buf(),
                reason: String::from("bad magic"),
            });
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let segment_size = read_u32(8) as usize;
        if segment_size < MIN_SEGMENT_SIZE || !segment_size.is_power_of_two() {
            return Err(StorageError::InvalidHeader {
                path: path.to_path_buf(),
                reason: format!("invalid segment size {}", segment_size),
            });
        }
        let segments_count = read_u32(12) as usize;

        for slot in 0..HEADER_INTS {
            self.header[slot] = read_u32(16 + slot * 4) as i32;
        }

        Ok((segment_size, segments_count))
    }
}

fn map_segment(file: &File, index: usize, segment_size: usize) -> Result<MmapMut, StorageError> {
    // SAFETY: the file is owned by this data access and only accessed through
    // the maps for its whole lifetime.
    let map = unsafe {
        MmapOptions::new()
            .offset(HEADER_SIZE + (index * segment_size) as u64)
            .len(segment_size)
            .map_mut(file)?
    };
    Ok(map)
}
