//! ConnectionManager - the set of live connections, keyed by address.
//!
//! Each address owns a `OnceCell`, so concurrent `connect` calls for the
//! same network share a single dial while different networks dial in
//! parallel. Shutdown is final: it cancels dials in flight and later
//! connects fail with [`ManagerError::ShutDown`].

use crate::error::ManagerError;
use crate::network::address::NetworkAddress;
use crate::network::connection::{ConnectOptions, Connection, ConnectionSettings};
use crate::raw_log::RawLog;
use dashmap::DashMap;
use futures_util::future::join_all;
use hatcog_proto::Line;
use std::sync::Arc;
use tokio::sync::{OnceCell, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Slot = Arc<OnceCell<Arc<Connection>>>;

pub struct ConnectionManager {
    connections: DashMap<String, Slot>,
    lines: mpsc::Sender<Line>,
    settings: Arc<ConnectionSettings>,
    raw_log: Arc<dyn RawLog>,
    default_options: ConnectOptions,
    shutdown: CancellationToken,
}

impl ConnectionManager {
    /// Every connection forwards parsed lines into `lines`.
    pub fn new(
        lines: mpsc::Sender<Line>,
        settings: ConnectionSettings,
        raw_log: Arc<dyn RawLog>,
    ) -> Self {
        Self {
            connections: DashMap::new(),
            lines,
            settings: Arc::new(settings),
            raw_log,
            default_options: ConnectOptions::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Options used by [`connect`](Self::connect).
    pub fn with_default_options(mut self, options: ConnectOptions) -> Self {
        self.default_options = options;
        self
    }

    /// Ensure a connection to `address` exists, using the default options.
    pub async fn connect(&self, address: &str) -> Result<(), ManagerError> {
        self.connect_with(address, self.default_options.clone())
            .await
    }

    /// Ensure a connection to `address` exists.
    ///
    /// Does nothing if one is already up. A failed dial leaves no trace in
    /// the map and a later call tries again.
    pub async fn connect_with(
        &self,
        address: &str,
        options: ConnectOptions,
    ) -> Result<(), ManagerError> {
        if self.shutdown.is_cancelled() {
            return Err(ManagerError::ShutDown(address.to_owned()));
        }
        NetworkAddress::parse(address)?;

        let slot = self
            .connections
            .entry(address.to_owned())
            .or_default()
            .value()
            .clone();

        let init = slot.get_or_try_init(|| {
            Connection::connect(
                address,
                options,
                Arc::clone(&self.settings),
                Arc::clone(&self.raw_log),
                self.lines.clone(),
            )
        });
        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                info!(address, "Dial abandoned by shutdown");
                return Err(ManagerError::ShutDown(address.to_owned()));
            }
            result = init => result,
        };

        let conn = match result {
            Ok(conn) => conn,
            Err(e) => {
                self.forget_empty_slot(address, &slot);
                return Err(e.into());
            }
        };

        // Shutdown began after the dial finished but may have missed it.
        if self.shutdown.is_cancelled() {
            warn!(address, "Connection finished after shutdown, closing it");
            if let Err(e) = conn.close().await {
                debug!(address, error = %e, "Read task ended with error");
            }
            return Err(ManagerError::ShutDown(address.to_owned()));
        }

        Ok(())
    }

    /// Drop `slot` after a failed dial unless another caller is waiting on it.
    fn forget_empty_slot(&self, address: &str, slot: &Slot) {
        // Map entry plus our clone; any waiter holds a third reference.
        self.connections.remove_if(address, |_, current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) == 2
        });
    }

    /// The live connection for `address`, if any.
    pub fn get(&self, address: &str) -> Result<Arc<Connection>, ManagerError> {
        self.connections
            .get(address)
            .and_then(|slot| slot.get().cloned())
            .ok_or_else(|| ManagerError::UnknownNetwork(address.to_owned()))
    }

    pub fn is_connected(&self, address: &str) -> bool {
        self.get(address).is_ok()
    }

    /// Addresses with a live connection.
    pub fn addresses(&self) -> Vec<String> {
        self.connections
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub async fn identify(&self, address: &str, password: &str) -> Result<(), ManagerError> {
        Ok(self.get(address)?.identify(password).await?)
    }

    pub async fn send_message(
        &self,
        address: &str,
        target: &str,
        text: &str,
    ) -> Result<(), ManagerError> {
        Ok(self.get(address)?.send_message(target, text).await?)
    }

    pub async fn send_action(
        &self,
        address: &str,
        target: &str,
        text: &str,
    ) -> Result<(), ManagerError> {
        Ok(self.get(address)?.send_action(target, text).await?)
    }

    pub async fn run_command(&self, address: &str, text: &str) -> Result<(), ManagerError> {
        Ok(self.get(address)?.run_command(text).await?)
    }

    pub async fn send_raw(&self, address: &str, text: &str) -> Result<(), ManagerError> {
        Ok(self.get(address)?.send_raw(text).await?)
    }

    /// Close every connection and empty the map.
    ///
    /// Returns once all read tasks have stopped. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let keys: Vec<String> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let removed: Vec<(String, Slot)> = keys
            .into_iter()
            .filter_map(|key| self.connections.remove(&key))
            .collect();

        let open: Vec<Arc<Connection>> = removed
            .iter()
            .filter_map(|(_, slot)| slot.get().cloned())
            .collect();
        if open.is_empty() {
            return;
        }

        info!(count = open.len(), "Closing connections");
        let results = join_all(open.iter().map(|conn| conn.close())).await;
        for (conn, result) in open.iter().zip(results) {
            match result {
                Ok(()) => info!(address = conn.address(), "Connection closed"),
                Err(e) => info!(
                    address = conn.address(),
                    error = %e,
                    code = e.error_code(),
                    "Connection closed after transport error"
                ),
            }
        }
    }
}
