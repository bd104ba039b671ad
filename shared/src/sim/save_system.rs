use std::{
    fs::{self, File},
    io::{self, Read},
    path::Path,
};

use log::{info, warn};

use lockstep_serde::{ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr};

use crate::{
    constants::{SAVE_MAGIC, SAVE_VERSION},
    sim::{error::SaveError, state_hasher::point_hash},
    Tick,
};

/// Encoded size of `SaveHeader`
pub const SAVE_HEADER_BYTES: usize = 44;

/// Fixed-size header at the start of every save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveHeader {
    pub magic: u32,
    pub version: u32,
    pub save_tick: Tick,
    pub tick_rate: u32,
    pub seed: u32,
    /// Point hash over the ECS and auxiliary sections
    pub state_hash: u64,
    pub ecs_data_size: u32,
    pub aux_data_size: u32,
    pub metadata_size: u32,
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: SAVE_VERSION,
            save_tick: 0,
            tick_rate: 30,
            seed: 0,
            state_hash: 0,
            ecs_data_size: 0,
            aux_data_size: 0,
            metadata_size: 0,
        }
    }
}

impl SaveHeader {
    fn payload_size(&self) -> usize {
        self.ecs_data_size as usize + self.aux_data_size as usize + self.metadata_size as usize
    }
}

impl Serde for SaveHeader {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.magic.ser(writer);
        self.version.ser(writer);
        self.save_tick.ser(writer);
        self.tick_rate.ser(writer);
        self.seed.ser(writer);
        self.state_hash.ser(writer);
        self.ecs_data_size.ser(writer);
        self.aux_data_size.ser(writer);
        self.metadata_size.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            magic: u32::de(reader)?,
            version: u32::de(reader)?,
            save_tick: u64::de(reader)?,
            tick_rate: u32::de(reader)?,
            seed: u32::de(reader)?,
            state_hash: u64::de(reader)?,
            ecs_data_size: u32::de(reader)?,
            aux_data_size: u32::de(reader)?,
            metadata_size: u32::de(reader)?,
        })
    }

    fn byte_length(&self) -> u32 {
        <Self as ConstByteLength>::const_byte_length()
    }
}

impl ConstByteLength for SaveHeader {
    fn const_byte_length() -> u32 {
        SAVE_HEADER_BYTES as u32
    }
}

/// Everything a save is written from
#[derive(Clone, Debug, Default)]
pub struct SaveData<'a> {
    pub tick: Tick,
    pub tick_rate: u32,
    pub seed: u32,
    pub ecs_data: &'a [u8],
    pub aux_data: &'a [u8],
    /// Free-form text such as a save name
    pub metadata: &'a str,
}

/// A decoded, hash-verified save
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveFile {
    pub header: SaveHeader,
    pub ecs_data: Vec<u8>,
    pub aux_data: Vec<u8>,
    pub metadata: String,
}

/// Encodes a save: header, ECS bytes, auxiliary bytes, metadata, back to back
pub fn encode(data: &SaveData) -> Vec<u8> {
    let header = SaveHeader {
        save_tick: data.tick,
        tick_rate: data.tick_rate,
        seed: data.seed,
        state_hash: point_hash(data.ecs_data, data.aux_data),
        ecs_data_size: data.ecs_data.len() as u32,
        aux_data_size: data.aux_data.len() as u32,
        metadata_size: data.metadata.len() as u32,
        ..SaveHeader::default()
    };

    let mut writer = ByteWriter::with_capacity(SAVE_HEADER_BYTES + header.payload_size());
    header.ser(&mut writer);
    writer.write_bytes(data.ecs_data);
    writer.write_bytes(data.aux_data);
    writer.write_bytes(data.metadata.as_bytes());
    writer.to_bytes()
}

/// Decodes and verifies a save produced by `encode`
pub fn decode(bytes: &[u8]) -> Result<SaveFile, SaveError> {
    let header = decode_header(bytes)?;

    let mut reader = ByteReader::new(&bytes[SAVE_HEADER_BYTES..]);
    let ecs_data = read_section(&mut reader, "ecs data", header.ecs_data_size)?.to_vec();
    let aux_data = read_section(&mut reader, "aux data", header.aux_data_size)?.to_vec();
    let metadata = read_section(&mut reader, "metadata", header.metadata_size)?;
    let metadata = String::from_utf8(metadata.to_vec()).map_err(|_| SaveError::InvalidMetadata)?;

    let computed = point_hash(&ecs_data, &aux_data);
    if computed != header.state_hash {
        return Err(SaveError::HashMismatch {
            stored: header.state_hash,
            computed,
        });
    }

    Ok(SaveFile {
        header,
        ecs_data,
        aux_data,
        metadata,
    })
}

/// Parses the header and checks magic and version. The payload is not inspected.
pub fn decode_header(bytes: &[u8]) -> Result<SaveHeader, SaveError> {
    let truncated = || SaveError::Truncated {
        section: "header",
        needed: SAVE_HEADER_BYTES,
        available: bytes.len(),
    };

    let mut reader = ByteReader::new(bytes);
    let magic = u32::de(&mut reader).map_err(|_| truncated())?;
    if magic != SAVE_MAGIC {
        return Err(SaveError::InvalidFormat {
            found: magic,
            expected: SAVE_MAGIC,
        });
    }

    let header = SaveHeader::de(&mut ByteReader::new(bytes)).map_err(|_| truncated())?;
    if header.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            found: header.version,
            expected: SAVE_VERSION,
        });
    }
    Ok(header)
}

fn read_section<'b>(
    reader: &mut ByteReader<'b>,
    section: &'static str,
    size: u32,
) -> Result<&'b [u8], SaveError> {
    let available = reader.remaining();
    reader
        .read_bytes(size as usize)
        .map_err(|_| SaveError::Truncated {
            section,
            needed: size as usize,
            available,
        })
}

fn open_error(path: &Path, source: io::Error) -> SaveError {
    if source.kind() == io::ErrorKind::NotFound {
        SaveError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        SaveError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File-backed saves. Holds the contents of the last successful `load`.
#[derive(Default)]
pub struct SaveSystem {
    loaded: SaveFile,
}

impl SaveSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, path: impl AsRef<Path>, data: &SaveData) -> Result<(), SaveError> {
        let path = path.as_ref();
        let bytes = encode(data);
        fs::write(path, &bytes).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "SaveSystem: saved tick {} to {} ({} bytes)",
            data.tick,
            path.display(),
            bytes.len()
        );
        Ok(())
    }

    /// Reads and verifies a save. On failure the previously loaded save is kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| open_error(path, source))?;
        match decode(&bytes) {
            Ok(file) => {
                info!(
                    "SaveSystem: loaded tick {} from {}",
                    file.header.save_tick,
                    path.display()
                );
                self.loaded = file;
                Ok(())
            }
            Err(error) => {
                warn!("SaveSystem: failed to load {}: {}", path.display(), error);
                Err(error)
            }
        }
    }

    /// Checks that the file exists and carries a supported header, without
    /// reading the payload
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<SaveHeader, SaveError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| open_error(path, source))?;

        let mut bytes = Vec::with_capacity(SAVE_HEADER_BYTES);
        file.take(SAVE_HEADER_BYTES as u64)
            .read_to_end(&mut bytes)
            .map_err(|source| SaveError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        decode_header(&bytes)
    }

    pub fn header(&self) -> &SaveHeader {
        &self.loaded.header
    }

    pub fn ecs_data(&self) -> &[u8] {
        &self.loaded.ecs_data
    }

    pub fn aux_data(&self) -> &[u8] {
        &self.loaded.aux_data
    }

    pub fn metadata(&self) -> &str {
        &self.loaded.metadata
    }

    pub fn clear(&mut self) {
        self.loaded = SaveFile::default();
    }
}
