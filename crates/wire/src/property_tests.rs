// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests: arbitrary headers and bodies survive encode/decode.

use crate::{
    DebugInfoArea, DebugInfoTrailer, RequestPacket, ResponsePacket, TaskStatus, DEBUG_PREFIX_MAX,
};
use proptest::prelude::*;
use rdgate_core::{DebugFlags, TaskCode};

const ALL_TASK_CODES: &[u16] = &[
    101, 102, 103, 104, 105, 106, 107, 108, 201, 202, 203, 204, 205, 206, 301, 302, 303, 304, 305,
    401, 402, 403, 404, 501, 502, 503, 504, 505, 506, 507, 508, 509, 510, 511, 512, 513, 514, 515,
    516, 601, 602, 603,
];

fn arb_task_code() -> impl Strategy<Value = TaskCode> {
    proptest::sample::select(ALL_TASK_CODES)
        .prop_filter_map("known task code", TaskCode::from_u16)
}

proptest! {
    #[test]
    fn request_header_round_trips(
        code in arb_task_code(),
        flags in any::<u32>(),
        prefix in "[a-z0-9-]{0,64}",
        xa_token in any::<u64>(),
        body in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        // Arbitrary body bytes are opaque to the header machinery.
        let mut packet = RequestPacket::without_body(code)
            .with_debug(DebugFlags(flags), prefix.clone())
            .with_xa_token(xa_token);
        packet.body = body.clone();

        let bytes = packet.encode().unwrap();
        let back = RequestPacket::decode(&bytes).unwrap();

        prop_assert_eq!(back.header.task_code, code);
        prop_assert_eq!(back.header.debug_flags.bits(), flags);
        prop_assert_eq!(back.header.debug_prefix.len().min(DEBUG_PREFIX_MAX), back.header.debug_prefix.len());
        prop_assert_eq!(&back.header.debug_prefix, &prefix);
        prop_assert_eq!(back.header.xa_token, xa_token);
        prop_assert_eq!(back.body, body);
    }

    #[test]
    fn request_debug_info_round_trips(
        code in arb_task_code(),
        name in proptest::option::of("[A-Z0-9*\\-\\[\\]]{1,32}"),
        erase in any::<bool>(),
    ) {
        let packet = RequestPacket::without_body(code).with_debug_info(DebugInfoArea {
            trace_file_name: name.clone(),
            erase_trace_file: erase,
        });
        let back = RequestPacket::decode(&packet.encode().unwrap()).unwrap();
        let area = back.debug_info.unwrap();
        prop_assert_eq!(area.trace_file_name, name);
        prop_assert_eq!(area.erase_trace_file, erase);
    }

    #[test]
    fn response_header_round_trips(
        status in any::<i32>(),
        task_code in any::<u16>(),
        body in proptest::collection::vec(any::<u8>(), 0..256),
        trailer in proptest::option::of(("[A-Z0-9*\\-]{1,24}", "[A-Z0-9]{6}")),
    ) {
        let mut packet = ResponsePacket::empty(task_code).with_status(TaskStatus(status));
        packet.body = body.clone();
        if let Some((file, run)) = &trailer {
            packet = packet.with_trailer(DebugInfoTrailer {
                trace_file_name: file.clone(),
                generated_run_id: run.clone(),
            });
        }

        let back = ResponsePacket::decode(&packet.encode().unwrap()).unwrap();
        prop_assert_eq!(back.status.0, status);
        prop_assert_eq!(back.task_code, task_code);
        prop_assert_eq!(back.body, body);
        prop_assert_eq!(back.trailer.is_some(), trailer.is_some());
    }
}
