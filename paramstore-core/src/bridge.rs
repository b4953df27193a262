//! TelemetrySyncBridge: keeps the telemetry link and the parameter store in step

use crate::store::{LoadOutcome, ParameterStore, StoreError};
use crate::traits::{NvStorage, ParamUpdate, TelemetryLink};

/// Error type for bridge operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Error from the parameter store
    Store(StoreError),
}

impl From<StoreError> for BridgeError {
    fn from(e: StoreError) -> Self {
        BridgeError::Store(e)
    }
}

/// A bridge that feeds the store's parameters to a telemetry link and
/// forwards remote parameter changes back into the store
///
/// The store and the link never see each other; the bridge owns both.
/// Call [`start`](Self::start) once before the control loop and
/// [`update`](Self::update) once per tick
pub struct TelemetrySyncBridge<S: NvStorage, L, const N: usize> {
    store: ParameterStore<S, N>,
    link: L,
}

impl<S: NvStorage, L: TelemetryLink, const N: usize> TelemetrySyncBridge<S, L, N> {
    /// Create a new bridge from a store and a telemetry link
    pub fn new(store: ParameterStore<S, N>, link: L) -> Self {
        Self { store, link }
    }

    /// Load the store and publish its parameters to the link
    ///
    /// If loading fails after the store already has usable defaults (the
    /// defaults could not be written), the defaults are still published
    /// before the error is returned
    pub fn start(&mut self) -> Result<LoadOutcome, BridgeError> {
        match self.store.load() {
            Ok(report) => {
                self.link.set_parameter_table(&report.params);
                info!("Published {} parameters to telemetry", N);
                Ok(report.outcome)
            }
            Err(e) => {
                if self.store.state().is_ready() {
                    self.link.set_parameter_table(self.store.params());
                }
                Err(e.into())
            }
        }
    }

    /// Apply at most one pending remote parameter update
    ///
    /// Returns the update that was applied, or `None` if the link had
    /// nothing pending. An update with a negative or too-large index is
    /// rejected without touching the store. Before the store is loaded this
    /// fails with `NotLoaded` and the link is not polled
    pub fn update(&mut self) -> Result<Option<ParamUpdate>, BridgeError> {
        // Leave pending events on the link until the store can take them
        if !self.store.state().is_ready() {
            return Err(StoreError::NotLoaded.into());
        }

        let Some(update) = self.link.poll_updated_parameter() else {
            return Ok(None);
        };

        let index = usize::try_from(update.index).map_err(|_| StoreError::IndexOutOfRange {
            index: update.index as isize,
            len: N,
        })?;

        self.store.apply_remote_update(index, update.value)?;
        Ok(Some(update))
    }

    /// Get a reference to the parameter store
    pub fn store(&self) -> &ParameterStore<S, N> {
        &self.store
    }

    /// Get a mutable reference to the parameter store
    pub fn store_mut(&mut self) -> &mut ParameterStore<S, N> {
        &mut self.store
    }

    /// Get a reference to the telemetry link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Get a mutable reference to the telemetry link
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Decompose the bridge into its store and link
    pub fn into_parts(self) -> (ParameterStore<S, N>, L) {
        (self.store, self.link)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::StoreConfig;
    use crate::storage::RamStorage;
    use crate::store::StoreState;
    use crate::traits::StorageError;
    use std::collections::VecDeque;
    use std::vec::Vec;

    // Simple mock telemetry link
    #[derive(Default)]
    struct MockLink {
        table: Vec<f32>,
        table_pushes: usize,
        pending: VecDeque<ParamUpdate>,
    }

    impl MockLink {
        fn with_updates(updates: &[ParamUpdate]) -> Self {
            Self {
                pending: updates.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl TelemetryLink for MockLink {
        fn set_parameter_table(&mut self, params: &[f32]) {
            self.table = params.to_vec();
            self.table_pushes += 1;
        }

        fn poll_updated_parameter(&mut self) -> Option<ParamUpdate> {
            self.pending.pop_front()
        }
    }

    fn bridge_with(link: MockLink) -> TelemetrySyncBridge<RamStorage<64>, MockLink, 4> {
        let store = ParameterStore::new(RamStorage::new(), StoreConfig::default()).unwrap();
        TelemetrySyncBridge::new(store, link)
    }

    #[test]
    fn test_start_publishes_table_once() {
        let mut bridge = bridge_with(MockLink::default());

        assert_eq!(bridge.start(), Ok(LoadOutcome::Initialized));
        assert_eq!(bridge.link().table, [0.0; 4]);
        assert_eq!(bridge.link().table_pushes, 1);

        bridge.update().unwrap();
        assert_eq!(bridge.link().table_pushes, 1);
    }

    #[test]
    fn test_update_without_event() {
        let mut bridge = bridge_with(MockLink::default());
        bridge.start().unwrap();
        bridge.store_mut().storage_mut().clear_journal();

        assert_eq!(bridge.update(), Ok(None));
        assert_eq!(bridge.store().storage().journal().count(), 0);
    }

    #[test]
    fn test_one_event_per_cycle() {
        let updates = [ParamUpdate::new(0, 1.0), ParamUpdate::new(3, 4.0)];
        let mut bridge = bridge_with(MockLink::with_updates(&updates));
        bridge.start().unwrap();

        assert_eq!(bridge.update(), Ok(Some(updates[0])));
        assert_eq!(bridge.store().snapshot(), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(bridge.link().pending.len(), 1);

        assert_eq!(bridge.update(), Ok(Some(updates[1])));
        assert_eq!(bridge.store().snapshot(), [1.0, 0.0, 0.0, 4.0]);
        assert_eq!(bridge.update(), Ok(None));
    }

    #[test]
    fn test_negative_index_rejected() {
        let mut bridge = bridge_with(MockLink::with_updates(&[ParamUpdate::new(-1, 5.0)]));
        bridge.start().unwrap();
        let before = bridge.store().storage().as_bytes().to_vec();

        assert_eq!(
            bridge.update(),
            Err(BridgeError::Store(StoreError::IndexOutOfRange { index: -1, len: 4 }))
        );
        assert_eq!(bridge.store().snapshot(), [0.0; 4]);
        assert_eq!(bridge.store().storage().as_bytes(), &before[..]);
    }

    #[test]
    fn test_index_past_end_rejected() {
        let mut bridge = bridge_with(MockLink::with_updates(&[ParamUpdate::new(4, 5.0)]));
        bridge.start().unwrap();

        assert_eq!(
            bridge.update(),
            Err(BridgeError::Store(StoreError::IndexOutOfRange { index: 4, len: 4 }))
        );
        assert_eq!(bridge.store().snapshot(), [0.0; 4]);
    }

    #[test]
    fn test_update_before_start() {
        let mut bridge = bridge_with(MockLink::with_updates(&[ParamUpdate::new(0, 5.0)]));
        assert_eq!(bridge.update(), Err(BridgeError::Store(StoreError::NotLoaded)));
    }

    #[test]
    fn test_event_kept_until_loaded() {
        let mut bridge = bridge_with(MockLink::with_updates(&[ParamUpdate::new(1, 5.0)]));

        assert_eq!(bridge.update(), Err(BridgeError::Store(StoreError::NotLoaded)));
        assert_eq!(bridge.link().pending.len(), 1);

        bridge.start().unwrap();
        assert_eq!(bridge.update(), Ok(Some(ParamUpdate::new(1, 5.0))));
        assert_eq!(bridge.store().get(1), Some(5.0));
        assert!(bridge.link().pending.is_empty());
    }

    #[test]
    fn test_start_publishes_defaults_when_persist_fails() {
        let mut storage = RamStorage::<64>::new();
        storage.fail_writes_after(0);
        let store = ParameterStore::new(storage, StoreConfig::default()).unwrap();
        let mut bridge: TelemetrySyncBridge<_, _, 4> =
            TelemetrySyncBridge::new(store, MockLink::default());

        assert_eq!(
            bridge.start(),
            Err(BridgeError::Store(StoreError::Storage(StorageError::WriteFailed)))
        );
        assert_eq!(bridge.store().state(), StoreState::Ready);
        assert_eq!(bridge.link().table, [0.0; 4]);
    }

    #[test]
    fn test_start_read_failure_publishes_nothing() {
        let mut storage = RamStorage::<64>::new();
        storage.set_fail_reads(true);
        let store = ParameterStore::new(storage, StoreConfig::default()).unwrap();
        let mut bridge: TelemetrySyncBridge<_, _, 4> =
            TelemetrySyncBridge::new(store, MockLink::default());

        assert!(bridge.start().is_err());
        assert_eq!(bridge.link().table_pushes, 0);
    }

    #[test]
    fn test_into_parts() {
        let mut bridge = bridge_with(MockLink::with_updates(&[ParamUpdate::new(2, 3.5)]));
        bridge.start().unwrap();
        bridge.update().unwrap();

        let (store, link) = bridge.into_parts();
        assert_eq!(store.get(2), Some(3.5));
        assert!(link.pending.is_empty());
    }
}
