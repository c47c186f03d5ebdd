//! Persistent tally counter (tasbih).
//!
//! The count is a single integer stored in a plain file under the user's data
//! directory. Writers take an exclusive lock on the file itself so two terminals
//! tapping at once cannot interleave a read-modify-write.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("no data directory available for the tally file")]
    NoDataDir,
    #[error("failed to access tally file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the count lives.
pub trait CounterStore {
    fn get_count(&self) -> Result<u64, TallyError>;
    fn set_count(&mut self, count: u64) -> Result<(), TallyError>;

    /// Replace the count with `f(count)` and return the new value.
    ///
    /// Stores shared between processes override this to hold a lock across the
    /// read and the write.
    fn update(&mut self, f: &mut dyn FnMut(u64) -> u64) -> Result<u64, TallyError> {
        let next = f(self.get_count()?);
        self.set_count(next)?;
        Ok(next)
    }
}

impl<S: CounterStore + ?Sized> CounterStore for &mut S {
    fn get_count(&self) -> Result<u64, TallyError> {
        (**self).get_count()
    }

    fn set_count(&mut self, count: u64) -> Result<(), TallyError> {
        (**self).set_count(count)
    }

    fn update(&mut self, f: &mut dyn FnMut(u64) -> u64) -> Result<u64, TallyError> {
        (**self).update(f)
    }
}

/// Count persisted to `$XDG_DATA_HOME/miqat/tally`.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location.
    pub fn default_location() -> Result<Self, TallyError> {
        let dir = dirs::data_dir().ok_or(TallyError::NoDataDir)?;
        Ok(Self::new(dir.join("miqat").join("tally")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TallyError {
        TallyError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn open_locked(&self) -> Result<File, TallyError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.lock_exclusive().map_err(|e| self.io_error(e))?;
        Ok(file)
    }
}

fn parse_count(text: &str) -> u64 {
    text.trim().parse().unwrap_or(0)
}

impl CounterStore for FileCounterStore {
    fn get_count(&self) -> Result<u64, TallyError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_count(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn set_count(&mut self, count: u64) -> Result<(), TallyError> {
        let mut file = self.open_locked()?;
        let result: std::io::Result<()> = (|| {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            writeln!(file, "{count}")?;
            file.flush()
        })();
        let _ = FileExt::unlock(&file);
        result.map_err(|e| self.io_error(e))
    }

    fn update(&mut self, f: &mut dyn FnMut(u64) -> u64) -> Result<u64, TallyError> {
        let mut file = self.open_locked()?;
        let result: std::io::Result<u64> = (|| {
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            let next = f(parse_count(&text));
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            writeln!(file, "{next}")?;
            file.flush()?;
            Ok(next)
        })();
        let _ = FileExt::unlock(&file);
        result.map_err(|e| self.io_error(e))
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    count: u64,
}

impl MemoryCounterStore {
    pub fn new(count: u64) -> Self {
        Self { count }
    }
}

impl CounterStore for MemoryCounterStore {
    fn get_count(&self) -> Result<u64, TallyError> {
        Ok(self.count)
    }

    fn set_count(&mut self, count: u64) -> Result<(), TallyError> {
        self.count = count;
        Ok(())
    }
}

/// Counter operations over any store.
pub struct Tally<S> {
    store: S,
}

impl<S: CounterStore> Tally<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn count(&self) -> Result<u64, TallyError> {
        self.store.get_count()
    }

    pub fn increment(&mut self) -> Result<u64, TallyError> {
        self.store.update(&mut |n| n.saturating_add(1))
    }

    /// Never goes below zero.
    pub fn decrement(&mut self) -> Result<u64, TallyError> {
        self.store.update(&mut |n| n.saturating_sub(1))
    }

    pub fn reset(&mut self) -> Result<u64, TallyError> {
        self.store.set_count(0)?;
        Ok(0)
    }
}
