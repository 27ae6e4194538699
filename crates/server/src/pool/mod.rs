// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Server Worker pool.
//!
//! A fixed arena of Worker Description Entries (WDEs) is allocated at
//! startup and reused across clients. Each WDE is on exactly one of the
//! free chain, the assigned chain, or the (terminal) shutdown set. The
//! free and assigned chains each have their own lock cell and the two are
//! never held together.

mod chain;

pub use chain::IndexChain;

use parking_lot::Mutex;
use rdgate_core::{DebugFlags, ShutdownState};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};

use crate::logging::ClientTraceFile;

/// Socket ownership transferred from an ICL to a worker.
pub struct ClientHandoff {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub socket_id: u64,
    pub icl_number: usize,
    pub transport_mode: char,
}

/// Mutable client identity, owned by the assigned worker. The console
/// handler reads it for identification only.
#[derive(Debug, Default, Clone)]
pub struct ClientInfo {
    pub user_id: String,
    pub locale: String,
    pub peer_ip: Option<IpAddr>,
    pub hostname: String,
    pub thread_name: String,
}

/// Worker Description Entry: one per worker slot, reused across clients.
pub struct Wde {
    pub id: u32,
    /// Out-of-band wake-up target (the Pass_Event channel).
    pub event: Notify,
    handoff: mpsc::Sender<ClientHandoff>,
    shutdown: AtomicU8,
    pub working_on_client: AtomicBool,
    pub open_db_thread: AtomicBool,
    /// True while the worker is blocked in the transport rather than
    /// running application code; a fault handler uses this to choose
    /// between unwinding the worker and aborting the server.
    pub in_network_call: AtomicBool,
    /// Client socket id, zero when none. Identification only; the socket
    /// itself is owned by the worker task.
    pub socket_id: AtomicU64,
    pub transport_mode: AtomicU32,
    pub client: Mutex<ClientInfo>,
    pub trace_file: Mutex<Option<Arc<ClientTraceFile>>>,
    pub debug_overrides: AtomicU32,
    pub first_request_ms: AtomicU64,
    pub last_request_ms: AtomicU64,
    pub task_code: AtomicU32,
    pub xa_token: AtomicU64,
    pub xa_reuse: AtomicU32,
}

impl Wde {
    fn new(id: u32, handoff: mpsc::Sender<ClientHandoff>) -> Self {
        Self {
            id,
            event: Notify::new(),
            handoff,
            shutdown: AtomicU8::new(ShutdownState::Active.as_u8()),
            working_on_client: AtomicBool::new(false),
            open_db_thread: AtomicBool::new(false),
            in_network_call: AtomicBool::new(false),
            socket_id: AtomicU64::new(0),
            transport_mode: AtomicU32::new(0),
            client: Mutex::new(ClientInfo::default()),
            trace_file: Mutex::new(None),
            debug_overrides: AtomicU32::new(0),
            first_request_ms: AtomicU64::new(0),
            last_request_ms: AtomicU64::new(0),
            task_code: AtomicU32::new(0),
            xa_token: AtomicU64::new(0),
            xa_reuse: AtomicU32::new(0),
        }
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.shutdown.load(Ordering::Acquire))
    }

    /// Advance the per-worker shutdown state (monotonic) and return the
    /// state that now holds.
    pub fn request_shutdown(&self, requested: ShutdownState) -> ShutdownState {
        let mut current = self.shutdown_state();
        loop {
            let advanced = current.advanced_to(requested);
            if advanced == current {
                return current;
            }
            match self.shutdown.compare_exchange(
                current.as_u8(),
                advanced.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return advanced,
                Err(seen) => current = ShutdownState::from_u8(seen),
            }
        }
    }

    /// Deliver a user event: a blocked receive on this worker returns with
    /// the user-event status.
    pub fn pass_event(&self) {
        self.event.notify_waiters();
        self.event.notify_one();
    }

    pub fn debug_override_flags(&self) -> DebugFlags {
        DebugFlags(self.debug_overrides.load(Ordering::Relaxed))
    }

    /// Reset per-client fields when the worker returns to the free chain.
    fn reset_for_free(&self) {
        self.working_on_client.store(false, Ordering::Release);
        self.open_db_thread.store(false, Ordering::Release);
        self.in_network_call.store(false, Ordering::Release);
        self.socket_id.store(0, Ordering::Release);
        self.transport_mode.store(0, Ordering::Release);
        self.first_request_ms.store(0, Ordering::Release);
        self.last_request_ms.store(0, Ordering::Release);
        self.task_code.store(0, Ordering::Release);
        self.xa_token.store(0, Ordering::Release);
        self.xa_reuse.store(0, Ordering::Release);
        self.debug_overrides.store(0, Ordering::Release);
        *self.client.lock() = ClientInfo::default();
        *self.trace_file.lock() = None;
        self.shutdown
            .store(ShutdownState::Active.as_u8(), Ordering::Release);
    }

    /// Hand a client socket to this worker's activity.
    pub fn bequeath(&self, handoff: ClientHandoff) -> Result<(), ClientHandoff> {
        self.handoff.try_send(handoff).map_err(|e| match e {
            mpsc::error::TrySendError::Full(h) | mpsc::error::TrySendError::Closed(h) => h,
        })
    }
}

/// Free/assigned/shutdown occupancy, for DISPLAY and the pool invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolCounts {
    pub free: usize,
    pub assigned: usize,
    pub shutdown: usize,
}

/// The arena plus its two chains.
pub struct WdePool {
    slots: Vec<Arc<Wde>>,
    free: Mutex<IndexChain>,
    assigned: Mutex<IndexChain>,
    shutdown_count: AtomicUsize,
    total_assignments: AtomicU64,
}

impl WdePool {
    /// Build the pool. Returns the per-worker handoff receivers; the
    /// lifecycle spawns one worker activity around each.
    pub fn new(max_workers: u32) -> (Self, Vec<(u32, mpsc::Receiver<ClientHandoff>)>) {
        let mut slots = Vec::with_capacity(max_workers as usize);
        let mut receivers = Vec::with_capacity(max_workers as usize);
        let mut free = IndexChain::new(max_workers);
        for id in 0..max_workers {
            let (tx, rx) = mpsc::channel(1);
            slots.push(Arc::new(Wde::new(id, tx)));
            receivers.push((id, rx));
            free.push_front(id);
        }
        (
            Self {
                slots,
                free: Mutex::new(free),
                assigned: Mutex::new(IndexChain::new(max_workers)),
                shutdown_count: AtomicUsize::new(0),
                total_assignments: AtomicU64::new(0),
            },
            receivers,
        )
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn wde(&self, id: u32) -> Option<&Arc<Wde>> {
        self.slots.get(id as usize)
    }

    /// Lease a free WDE for a new client: dequeue under the free-chain
    /// lock, populate, then enqueue at the assigned-chain head.
    pub fn lease(
        &self,
        socket_id: u64,
        peer: SocketAddr,
        transport_mode: char,
        now_ms: u64,
    ) -> Option<Arc<Wde>> {
        let id = self.free.lock().pop_front()?;
        let wde = Arc::clone(&self.slots[id as usize]);

        wde.socket_id.store(socket_id, Ordering::Release);
        wde.transport_mode
            .store(transport_mode as u32, Ordering::Release);
        wde.working_on_client.store(true, Ordering::Release);
        wde.first_request_ms.store(now_ms, Ordering::Release);
        wde.last_request_ms.store(now_ms, Ordering::Release);
        {
            let mut client = wde.client.lock();
            *client = ClientInfo {
                peer_ip: Some(peer.ip()),
                ..ClientInfo::default()
            };
        }
        self.total_assignments.fetch_add(1, Ordering::Relaxed);

        self.assigned.lock().push_front(id);
        Some(wde)
    }

    /// Return a worker to the free chain: remove from the assigned chain,
    /// reset, push onto the free chain. The mirror of [`Self::lease`].
    pub fn release(&self, id: u32) {
        if !self.assigned.lock().remove(id) {
            return;
        }
        if let Some(wde) = self.slots.get(id as usize) {
            wde.reset_for_free();
        }
        self.free.lock().push_front(id);
    }

    /// Remove a worker that is terminating instead of returning to the
    /// pool. Terminal: the slot never rejoins either chain.
    pub fn retire(&self, id: u32) {
        let removed = {
            let mut assigned = self.assigned.lock();
            assigned.remove(id)
        } || {
            let mut free = self.free.lock();
            free.remove(id)
        };
        if removed {
            self.shutdown_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn counts(&self) -> PoolCounts {
        PoolCounts {
            free: self.free.lock().len(),
            assigned: self.assigned.lock().len(),
            shutdown: self.shutdown_count.load(Ordering::Acquire),
        }
    }

    pub fn total_assignments(&self) -> u64 {
        self.total_assignments.load(Ordering::Relaxed)
    }

    /// Ids currently on the assigned chain, head first.
    pub fn assigned_ids(&self) -> Vec<u32> {
        self.assigned.lock().ids()
    }

    /// Locate an assigned worker by client socket id.
    pub fn find_by_socket_id(&self, socket_id: u64) -> Option<Arc<Wde>> {
        self.assigned_ids()
            .into_iter()
            .map(|id| Arc::clone(&self.slots[id as usize]))
            .find(|wde| wde.socket_id.load(Ordering::Acquire) == socket_id)
    }

    /// Locate an assigned worker by database thread name.
    pub fn find_by_thread_name(&self, thread_name: &str) -> Option<Arc<Wde>> {
        self.assigned_ids()
            .into_iter()
            .map(|id| Arc::clone(&self.slots[id as usize]))
            .find(|wde| wde.client.lock().thread_name.eq_ignore_ascii_case(thread_name))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
