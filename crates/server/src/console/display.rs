// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DISPLAY STATUS renderings.

use crate::console::command::{DisplayWhat, WorkerTarget};
use crate::sgs::ServerGlobalState;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Render a DISPLAY STATUS reply.
pub fn render(sgs: &Arc<ServerGlobalState>, what: &DisplayWhat) -> String {
    match what {
        DisplayWhat::Status => status(sgs),
        DisplayWhat::All => {
            let mut out = status(sgs);
            out.push('\n');
            out.push_str(&configuration(sgs));
            out.push('\n');
            out.push_str(&workers(sgs));
            out
        }
        DisplayWhat::Configuration => configuration(sgs),
        DisplayWhat::Workers => workers(sgs),
        DisplayWhat::Worker(target) => one_worker(sgs, target),
    }
}

fn status(sgs: &Arc<ServerGlobalState>) -> String {
    let counts = sgs.pool.counts();
    let mut lines = vec![
        format!(
            "{} level {} run {} (original {})",
            sgs.config.server_name,
            sgs.server_level,
            sgs.generated_run_id,
            sgs.original_run_id
        ),
        format!("engine level {}", sgs.engine_level),
        format!("state {}", sgs.server_shutdown()),
        format!("uptime {} s", sgs.uptime_secs()),
        format!(
            "workers: {} free, {} assigned, {} shut down (of {})",
            counts.free,
            counts.assigned,
            counts.shutdown,
            sgs.pool.capacity()
        ),
        format!(
            "clients {} requests {} last task {} at {}",
            sgs.counters.clients.load(Ordering::Relaxed),
            sgs.counters.requests.load(Ordering::Relaxed),
            sgs.counters.last_task_code.load(Ordering::Relaxed),
            sgs.counters.last_request_ms.load(Ordering::Relaxed),
        ),
    ];
    for slot in &sgs.icls {
        let bound = slot
            .bound
            .lock()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "closed".to_string());
        lines.push(format!(
            "ICL {} mode {} {} state {} last status {}",
            slot.endpoint.number,
            slot.endpoint.mode,
            bound,
            slot.shutdown_state(),
            slot.last_status.load(Ordering::Relaxed),
        ));
    }
    lines.join("\n")
}

fn configuration(sgs: &Arc<ServerGlobalState>) -> String {
    let c = &sgs.config;
    [
        format!("server_name {}", c.server_name),
        format!("app_group {} ({})", c.app_group_name, c.app_group_number),
        format!("max_activities {}", c.max_activities),
        format!("max_queued {}", c.max_queued_clients),
        format!("host_port {}", c.host_port),
        format!(
            "listens_on {}",
            c.listen_hosts
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        ),
        format!(
            "modes {}",
            c.transport_modes.iter().collect::<String>()
        ),
        format!("keep_alive {}", c.keep_alive),
        format!(
            "receive_timeout {} ms (effective {})",
            c.server_receive_timeout_ms,
            sgs.effective_receive_timeout_ms.load(Ordering::Relaxed)
        ),
        format!(
            "send_timeout {} ms (effective {})",
            c.server_send_timeout_ms,
            sgs.effective_send_timeout_ms.load(Ordering::Relaxed)
        ),
        format!("locale {}", c.server_locale),
        format!("keyin {}", sgs.keyin_name),
        format!("xa_thread_reuse {}", c.xa_thread_reuse),
    ]
    .join("\n")
}

fn workers(sgs: &Arc<ServerGlobalState>) -> String {
    let ids = sgs.pool.assigned_ids();
    if ids.is_empty() {
        return "no assigned workers".to_string();
    }
    let mut lines = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(wde) = sgs.pool.wde(id) {
            lines.push(worker_line(sgs, wde.id));
        }
    }
    lines.join("\n")
}

fn one_worker(sgs: &Arc<ServerGlobalState>, target: &WorkerTarget) -> String {
    match super::shutdown::find_worker(sgs, target) {
        Some(wde) => worker_line(sgs, wde.id),
        None => "no assigned worker matches that id".to_string(),
    }
}

fn worker_line(sgs: &Arc<ServerGlobalState>, id: u32) -> String {
    let Some(wde) = sgs.pool.wde(id) else {
        return format!("worker {id}: gone");
    };
    let client = wde.client.lock().clone();
    format!(
        "worker {} socket {} user {} thread {} peer {} state {} task {} first {} last {}",
        wde.id,
        wde.socket_id.load(Ordering::Relaxed),
        or_dash(&client.user_id),
        or_dash(&client.thread_name),
        client
            .peer_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string()),
        wde.shutdown_state(),
        wde.task_code.load(Ordering::Relaxed),
        wde.first_request_ms.load(Ordering::Relaxed),
        wde.last_request_ms.load(Ordering::Relaxed),
    )
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
