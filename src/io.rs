// io.rs

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// A possibly gzip-compressed input file.
pub struct InputStream {
    filepath: PathBuf,
}

impl InputStream {
    pub fn new(filepath: &Path) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    fn is_gzipped(file: &mut File) -> io::Result<bool> {
        let mut header = [0u8; 2];
        // Files shorter than the magic number can't be gzipped
        let gzipped = match file.read_exact(&mut header) {
            Ok(()) => header == GZIP_MAGIC,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
            Err(e) => return Err(e),
        };
        file.rewind()?;
        Ok(gzipped)
    }

    pub fn reader(&self) -> io::Result<BufReader<Box<dyn Read>>> {
        let mut file = File::open(&self.filepath)?;
        let reader: Box<dyn Read> = if Self::is_gzipped(&mut file)? {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, reader))
    }
}

#[derive(Clone)]
pub struct OutputStreamBuilder {
    filepath: Option<PathBuf>,
    buffer_size: usize,
    compression_level: Compression,
}

impl Default for OutputStreamBuilder {
    fn default() -> Self {
        Self {
            filepath: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            compression_level: Compression::default(),
        }
    }
}

impl OutputStreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filepath(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.filepath = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> OutputStream {
        OutputStream {
            filepath: self.filepath,
            buffer_size: self.buffer_size,
            compression_level: self.compression_level,
        }
    }
}

/// An output file, or stdout if no path is given. Paths ending in `.gz`
/// are gzip compressed.
pub struct OutputStream {
    filepath: Option<PathBuf>,
    buffer_size: usize,
    compression_level: Compression,
}

impl OutputStream {
    pub fn new(filepath: Option<impl AsRef<Path>>) -> Self {
        OutputStreamBuilder::new().filepath(filepath).build()
    }

    fn should_compress(&self) -> bool {
        self.filepath
            .as_ref()
            .is_some_and(|p| p.extension().is_some_and(|ext| ext == "gz"))
    }

    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        match &self.filepath {
            Some(path) => {
                let file = File::create(path)?;
                let writer: Box<dyn Write> = if self.should_compress() {
                    Box::new(BufWriter::with_capacity(
                        self.buffer_size,
                        GzEncoder::new(file, self.compression_level),
                    ))
                } else {
                    Box::new(BufWriter::with_capacity(self.buffer_size, file))
                };
                Ok(writer)
            }
            None => Ok(Box::new(BufWriter::with_capacity(
                self.buffer_size,
                io::stdout(),
            ))),
        }
    }
}
