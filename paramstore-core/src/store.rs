//! Persistent parameter store
//!
//! Owns the runtime parameter array and its persisted record. The record is
//! read and validated once at startup, rewritten in full only when it has to
//! be initialized or recovered, and afterwards patched one field at a time.
//!
//! # Lifecycle
//!
//! ```text
//! Unloaded ──load()──┬── Uninitialized ──reset──┐
//!                    ├── Corrupted ─────reset──┤
//!                    └── Valid ────────────────┴──▶ Ready
//! ```
//!
//! In `Ready` only [`ParameterStore::apply_remote_update`] (partial write) and
//! an explicit [`ParameterStore::reset`] touch the device. Corruption is only
//! detected by `load()`.
//!
//! # Write ordering
//!
//! An update writes the 4 parameter bytes first and the 2 checksum bytes
//! last. Power loss between the two leaves a record whose checksum does not
//! match, so the next `load()` classifies it as corrupted and resets it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::record::{self, RecordBytes, RecordStatus, CHECKSUM_LEN, PARAM_SIZE};
use crate::traits::{NvStorage, StorageError};

/// Parameter store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Parameter index outside `0..len` (caller contract violation)
    IndexOutOfRange {
        /// Rejected index
        index: isize,
        /// Number of parameters in the store
        len: usize,
    },
    /// Operation requires a loaded store
    NotLoaded,
    /// Storage device cannot hold the record at the configured offset
    RegionTooSmall,
    /// Storage device read or write failed
    Storage(StorageError),
}

impl From<StorageError> for StoreError {
    fn from(e: StorageError) -> Self {
        StoreError::Storage(e)
    }
}

/// Store lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreState {
    /// Record not read yet
    Unloaded,
    /// Runtime array defined and matched to the record
    Ready,
}

impl StoreState {
    /// Check if the runtime array is defined
    pub fn is_ready(&self) -> bool {
        matches!(self, StoreState::Ready)
    }
}

/// How `load()` brought the store to `Ready`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LoadOutcome {
    /// Region was never initialized; defaults written
    Initialized,
    /// Record was corrupted; previous values discarded and defaults written
    Recovered,
    /// Valid record loaded as-is
    Loaded,
}

impl LoadOutcome {
    /// Check whether the record was rewritten with defaults
    pub fn was_reset(&self) -> bool {
        matches!(self, LoadOutcome::Initialized | LoadOutcome::Recovered)
    }
}

impl From<RecordStatus> for LoadOutcome {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Uninitialized => LoadOutcome::Initialized,
            RecordStatus::Corrupted => LoadOutcome::Recovered,
            RecordStatus::Valid => LoadOutcome::Loaded,
        }
    }
}

/// Result of a successful `load()`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadReport<const N: usize> {
    /// Path taken through the load state machine
    pub outcome: LoadOutcome,
    /// Parameter values now in effect
    pub params: [f32; N],
}

/// Checksum-guarded parameter store over a storage device
///
/// `N` is the number of parameters, fixed at build time and shared with the
/// telemetry link's parameter table.
///
/// # Example
///
/// ```
/// use paramstore_core::{LoadOutcome, ParameterStore, RamStorage, StoreConfig};
///
/// let mut store: ParameterStore<_, 4> =
///     ParameterStore::new(RamStorage::<64>::new(), StoreConfig::default()).unwrap();
///
/// let report = store.load().unwrap();
/// assert_eq!(report.outcome, LoadOutcome::Initialized);
///
/// store.apply_remote_update(2, 3.5).unwrap();
/// assert_eq!(store.snapshot(), [0.0, 0.0, 3.5, 0.0]);
/// ```
#[derive(Debug)]
pub struct ParameterStore<S: NvStorage, const N: usize> {
    /// Storage device holding the record
    storage: S,
    /// Record location
    config: StoreConfig,
    /// Runtime parameter values
    params: [f32; N],
    /// Record bytes as last written (or about to be written)
    image: RecordBytes,
    /// Lifecycle state
    state: StoreState,
    /// Device known to hold exactly `image`
    persisted: bool,
}

impl<S: NvStorage, const N: usize> ParameterStore<S, N> {
    /// Record size in bytes
    pub const RECORD_LEN: usize = record::record_len(N);

    /// Create a store over `storage`
    ///
    /// Nothing is read until [`load`](Self::load) is called.
    ///
    /// # Errors
    /// `RegionTooSmall` if the record does not fit at `config.base_offset`.
    pub fn new(storage: S, config: StoreConfig) -> Result<Self, StoreError> {
        record::assert_param_count::<N>();

        storage
            .check_range(config.base_offset, Self::RECORD_LEN)
            .map_err(|_| StoreError::RegionTooSmall)?;

        Ok(Self {
            storage,
            config,
            params: [0.0; N],
            image: RecordBytes::new(),
            state: StoreState::Unloaded,
            persisted: false,
        })
    }

    /// Read, validate and if necessary repair the persisted record
    ///
    /// An uninitialized or corrupted record is replaced by zeroed defaults;
    /// neither case is an error. The returned parameters are the values now
    /// in effect.
    ///
    /// # Errors
    /// `Storage` if the device cannot be read (the store becomes `Unloaded`,
    /// also when it was `Ready` before), or if writing the defaults fails (the
    /// store is `Ready` with zeroed values that are not persisted).
    pub fn load(&mut self) -> Result<LoadReport<N>, StoreError> {
        let mut image = RecordBytes::new();
        // Capacity is guaranteed by the parameter count bound
        let _ = image.resize_default(Self::RECORD_LEN);
        if let Err(e) = self.storage.read(self.config.base_offset, &mut image) {
            error!("Parameter storage read failed: {:?}", e);
            self.state = StoreState::Unloaded;
            self.persisted = false;
            return Err(e.into());
        }

        let status = record::classify(&image, N);
        match status {
            RecordStatus::Uninitialized => {
                info!("Parameter storage not initialized, initializing...");
                self.reset()?;
            }
            RecordStatus::Corrupted => {
                warn!("Parameter storage corrupted, resetting...");
                self.reset()?;
            }
            RecordStatus::Valid => {
                self.params = record::decode_params(&image);
                self.image = image;
                self.state = StoreState::Ready;
                self.persisted = true;
                debug!("Loaded {} parameters from storage", N);
            }
        }

        Ok(LoadReport {
            outcome: status.into(),
            params: self.params,
        })
    }

    /// Overwrite the record with zeroed parameters and a fresh checksum
    ///
    /// Writes the full record. Repeated calls produce identical bytes.
    ///
    /// # Errors
    /// `Storage` if the write fails; the runtime array is zeroed regardless.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.params = [0.0; N];
        self.image = record::encode_record(&self.params);
        self.state = StoreState::Ready;
        self.persisted = false;

        self.storage
            .write(self.config.base_offset, &self.image)
            .inspect_err(|e| error!("Parameter storage reset failed: {:?}", e))?;

        self.persisted = true;
        info!("Parameter storage reset to defaults");
        Ok(())
    }

    /// Set one parameter and persist it with a partial write
    ///
    /// Updates the runtime array, recomputes the checksum over the whole
    /// record image, then writes the 4 parameter bytes followed by the 2
    /// checksum bytes.
    ///
    /// # Errors
    /// - `IndexOutOfRange` if `index >= N`; nothing is changed.
    /// - `NotLoaded` before `load()`; nothing is changed.
    /// - `Storage` if a write fails; the new value stays in effect in memory
    ///   and [`is_persisted`](Self::is_persisted) reports `false`. There is no
    ///   retry.
    pub fn apply_remote_update(&mut self, index: usize, value: f32) -> Result<(), StoreError> {
        if index >= N {
            return Err(StoreError::IndexOutOfRange {
                index: isize::try_from(index).unwrap_or(isize::MAX),
                len: N,
            });
        }
        if self.state != StoreState::Ready {
            return Err(StoreError::NotLoaded);
        }

        self.params[index] = value;
        record::write_param(&mut self.image, index, value);
        record::seal(&mut self.image, N);

        let field = record::param_offset(index);
        let checksum = record::checksum_offset(N);

        if let Err(e) = self
            .write_image_range(field, PARAM_SIZE)
            .and_then(|()| self.write_image_range(checksum, CHECKSUM_LEN))
        {
            error!("Failed to persist parameter {}: {:?}", index, e);
            self.persisted = false;
            return Err(e.into());
        }

        debug!("Parameter {} persisted", index);
        Ok(())
    }

    /// Rewrite the full record from the in-memory image
    ///
    /// Brings the device back in line after a failed partial write. Not meant
    /// for the periodic update path.
    ///
    /// # Errors
    /// `NotLoaded` before `load()`, `Storage` if the write fails.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.state != StoreState::Ready {
            return Err(StoreError::NotLoaded);
        }

        self.storage.write(self.config.base_offset, &self.image)?;
        self.persisted = true;
        Ok(())
    }

    /// Copy of the current parameter values
    pub fn snapshot(&self) -> [f32; N] {
        self.params
    }

    /// Current parameter values
    pub fn params(&self) -> &[f32; N] {
        &self.params
    }

    /// Value of parameter `index`
    pub fn get(&self, index: usize) -> Option<f32> {
        self.params.get(index).copied()
    }

    /// Number of parameters
    pub const fn len(&self) -> usize {
        N
    }

    /// Always `false`; a store holds at least one parameter
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Lifecycle state
    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Check whether the device holds exactly the in-memory record
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Record bytes as last sealed (empty before `load()`)
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Record location
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Storage device
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable storage device
    ///
    /// Writing through this bypasses the store; call `load()` afterwards.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Release the storage device
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Write `len` bytes of the image starting at record offset `start`
    fn write_image_range(&mut self, start: usize, len: usize) -> Result<(), StorageError> {
        let bytes = self
            .image
            .get(start..start + len)
            .ok_or(StorageError::OutOfBounds)?;
        self.storage.write(self.config.base_offset + start as u32, bytes)
    }
}
