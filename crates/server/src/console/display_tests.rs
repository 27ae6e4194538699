// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::console::command::DisplayWhat;
use crate::test_support::sgs_with_config;

#[tokio::test]
async fn status_names_identity_and_pool() {
    let t = sgs_with_config("");
    let text = render(&t.sgs, &DisplayWhat::Status);
    assert!(text.contains("TESTGATE"));
    assert!(text.contains("run "));
    assert!(text.contains("2 free, 0 assigned"));
    assert!(text.contains("state active"));
    assert!(text.contains("ICL 0 mode A"));
}

#[tokio::test]
async fn configuration_lists_the_installed_values() {
    let t = sgs_with_config("");
    let text = render(&t.sgs, &DisplayWhat::Configuration);
    assert!(text.contains("app_group TESTGRP"));
    assert!(text.contains("max_activities 2"));
    assert!(text.contains("listens_on 127.0.0.1"));
    assert!(text.contains("keyin "));
}

#[tokio::test]
async fn workers_render_per_assigned_entry() {
    let t = sgs_with_config("");
    assert_eq!(render(&t.sgs, &DisplayWhat::Workers), "no assigned workers");

    let wde = t
        .sgs
        .pool
        .lease(77, "10.0.0.9:1234".parse().unwrap(), 'A', t.sgs.now_ms())
        .unwrap();
    wde.client.lock().user_id = "OPER1".to_string();

    let text = render(&t.sgs, &DisplayWhat::Workers);
    assert!(text.contains("socket 77"));
    assert!(text.contains("user OPER1"));
    assert!(text.contains("10.0.0.9"));

    let text = render(
        &t.sgs,
        &DisplayWhat::Worker(super::super::command::WorkerTarget::SocketId(77)),
    );
    assert!(text.contains("socket 77"));
}

#[tokio::test]
async fn display_all_concatenates_sections() {
    let t = sgs_with_config("");
    let text = render(&t.sgs, &DisplayWhat::All);
    assert!(text.contains("TESTGATE"));
    assert!(text.contains("max_activities"));
    assert!(text.contains("no assigned workers"));
}
