// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-class handlers invoked by the dispatcher.
//!
//! Every handler returns a complete response packet on its own authority;
//! an `Err` carries an engine status the dispatcher shapes into an error
//! response. Body decode failures answer with a bad-request-body response
//! and leave the channel intact.

use crate::dispatch::SessionCtx;
use crate::messages::{localized, MsgId};
use crate::pool::Wde;
use crate::sgs::ServerGlobalState;
use crate::uasm::AccessDecision;
use rdgate_core::{DebugFlags, TaskClass, TaskCode};
use rdgate_engine::{
    DictionaryArgs, DictionaryQuery, EngineError, StatementOptions, ThreadId, ThreadOptions,
};
use rdgate_wire::{
    AccessKind, AutocommitBody, BeginThreadBody, BeginThreadReplyBody, BlobDataBody,
    BlobDataReplyBody, BlobTruncateBody, BlobWriteBody, ExecuteBody, ExecuteReplyBody, FetchBody,
    LobHandleBody, LobHandleReplyBody, MetadataArgs, NextResultReplyBody, RequestPacket,
    ResponsePacket, RowsBody, TaskStatus, UseridPasswordBody,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Route one request to its class handler.
pub(super) async fn dispatch(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
    flags: DebugFlags,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;
    match task.class() {
        TaskClass::ConnectionLifecycle => lifecycle_task(sgs, wde, session, packet).await,
        TaskClass::Statement => statement_task(sgs, wde, session, packet, flags).await,
        TaskClass::Cursor => cursor_task(sgs, session, packet).await,
        TaskClass::Metadata => metadata_task(sgs, session, packet).await,
        TaskClass::Blob => blob_task(sgs, session, packet).await,
        TaskClass::ResultSet => result_set_task(sgs, session, packet).await,
    }
}

async fn lifecycle_task(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;
    match task {
        TaskCode::UseridPassword => {
            let body: UseridPasswordBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            match sgs.access.lock().check(&body.user_id, &body.password) {
                AccessDecision::Allowed => {
                    wde.client.lock().user_id = body.user_id.to_ascii_uppercase();
                    Ok(ResponsePacket::empty(task.as_u16()))
                }
                AccessDecision::Denied => Ok(ResponsePacket::error(
                    task.as_u16(),
                    TaskStatus::ACCESS_DENIED,
                    localized(&session.locale, MsgId::AccessDenied),
                )),
            }
        }

        TaskCode::BeginThread | TaskCode::XaBeginThread => {
            let body: BeginThreadBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            begin_thread(sgs, wde, session, packet, task, body).await
        }

        TaskCode::EndThread => {
            let thread = open_thread(session)?;
            sgs.engine.end_thread(thread).await?;
            session.thread = None;
            wde.open_db_thread.store(false, Ordering::Release);
            Ok(ResponsePacket::empty(task.as_u16()))
        }

        TaskCode::CommitThread => {
            let thread = open_thread(session)?;
            sgs.engine.commit(thread).await?;
            Ok(ResponsePacket::empty(task.as_u16()))
        }

        TaskCode::RollbackThread => {
            let thread = open_thread(session)?;
            sgs.engine.rollback(thread).await?;
            Ok(ResponsePacket::empty(task.as_u16()))
        }

        TaskCode::SetAutocommit => {
            let body: AutocommitBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            let thread = open_thread(session)?;
            sgs.engine.set_autocommit(thread, body.on).await?;
            session.autocommit = body.on;
            Ok(ResponsePacket::empty(task.as_u16()))
        }

        TaskCode::KeepAlive => Ok(ResponsePacket::empty(task.as_u16())),

        _ => Ok(internal_error(task, session)),
    }
}

async fn begin_thread(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
    task: TaskCode,
    body: BeginThreadBody,
) -> Result<ResponsePacket, EngineError> {
    if sgs.access.lock().check(&body.user_id, &body.password) == AccessDecision::Denied {
        return Ok(ResponsePacket::error(
            task.as_u16(),
            TaskStatus::ACCESS_DENIED,
            localized(&session.locale, MsgId::AccessDenied),
        ));
    }

    let xa = task == TaskCode::XaBeginThread;

    // XA thread reuse: the same engine thread serves consecutive XA
    // transactions up to the configured cap, then is recycled.
    if let Some(existing) = session.thread {
        if xa {
            let reuse = wde.xa_reuse.fetch_add(1, Ordering::AcqRel) + 1;
            if reuse < sgs.config.xa_thread_reuse {
                wde.xa_token
                    .store(packet.header.xa_token, Ordering::Release);
                return begin_thread_reply(sgs, wde, session, task, &body);
            }
            wde.xa_reuse.store(0, Ordering::Release);
        }
        sgs.engine.end_thread(existing).await?;
        session.thread = None;
        wde.open_db_thread.store(false, Ordering::Release);
    }

    let socket_id = wde.socket_id.load(Ordering::Acquire);
    let thread_name = format!(
        "{}{:04}",
        sgs.config.thread_name_prefix,
        socket_id % 10_000
    );
    let thread = sgs
        .engine
        .begin_thread(ThreadOptions {
            thread_name: thread_name.clone(),
            user_id: body.user_id.clone(),
            update_access: body.access == AccessKind::Update,
            autocommit: body.autocommit,
        })
        .await?;

    session.thread = Some(thread);
    session.autocommit = body.autocommit;
    session.xa_mode = xa;
    if let Some(locale) = &body.locale {
        session.locale = locale.clone();
    }
    wde.open_db_thread.store(true, Ordering::Release);
    if xa {
        wde.xa_token
            .store(packet.header.xa_token, Ordering::Release);
    }
    {
        let mut client = wde.client.lock();
        client.user_id = body.user_id.to_ascii_uppercase();
        client.thread_name = thread_name;
        client.locale = session.locale.clone();
    }

    begin_thread_reply(sgs, wde, session, task, &body)
}

fn begin_thread_reply(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &SessionCtx,
    task: TaskCode,
    body: &BeginThreadBody,
) -> Result<ResponsePacket, EngineError> {
    let keep_alive = sgs
        .config
        .keep_alive
        .approve(body.keep_alive.unwrap_or(sgs.config.keep_alive.initial()));
    let reply = BeginThreadReplyBody {
        thread_name: wde.client.lock().thread_name.clone(),
        server_level: sgs.server_level.clone(),
        engine_level: sgs.engine_level.clone(),
        feature_flags: sgs.feature_flags,
        keep_alive,
        generated_run_id: sgs.generated_run_id.as_str().to_string(),
    };
    Ok(ok_response(task, session, &reply))
}

async fn statement_task(
    sgs: &Arc<ServerGlobalState>,
    wde: &Arc<Wde>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
    flags: DebugFlags,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;

    if task == TaskCode::CompleteStatement {
        return Ok(ResponsePacket::empty(task.as_u16()));
    }

    let body: ExecuteBody = match decode_body(packet, session) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    let thread = open_thread(session)?;

    if flags.sql() {
        if let Some(file) = wde.trace_file.lock().as_ref() {
            file.write_line(&format!("SQL: {}", body.sql));
            if flags.contains(DebugFlags::SQL_PARAMS) && !body.params.is_empty() {
                for (i, value) in body.params.iter().enumerate() {
                    file.write_line(&format!("  $P{}: {value}", i + 1));
                }
            }
        }
    }

    if task == TaskCode::ExecuteBatch {
        let counts = sgs.engine.execute_batch(thread, &body.sql, &body.batch).await?;
        let reply = ExecuteReplyBody {
            batch_counts: counts,
            ..ExecuteReplyBody::default()
        };
        return Ok(ok_response(task, session, &reply));
    }

    let sections = sgs.engine.supports_sql_sections();

    // Any cursor drop the request names happens exactly once, before the
    // first execution attempt.
    if let Some(cursor) = body.drop_cursor {
        match sgs.engine.drop_cursor(thread, cursor).await {
            Ok(()) => {}
            Err(e) if e.code == EngineError::NO_SUCH_CURSOR => {}
            Err(e) => return Err(e),
        }
    }

    let opts = if sections {
        StatementOptions {
            perform_cursor_drop: false,
            ..StatementOptions::first_attempt()
        }
    } else {
        StatementOptions {
            perform_cursor_drop: false,
            ..StatementOptions::no_sections()
        }
    };

    let outcome = match sgs
        .engine
        .execute(
            thread,
            &body.sql,
            &body.params,
            body.section.as_ref(),
            opts,
            session.fetch_block_rows,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(e) if sections && e.is_section_invalid() => {
            // The first attempt's response is released; re-execute from
            // the SQL text with the embedded section ignored and without
            // repeating cursor-drop side effects.
            sgs.engine
                .execute(
                    thread,
                    &body.sql,
                    &body.params,
                    body.section.as_ref(),
                    StatementOptions::text_only_retry(),
                    session.fetch_block_rows,
                )
                .await?
        }
        Err(e) => return Err(e),
    };

    let reply = ExecuteReplyBody {
        update_count: outcome.update_count,
        cursor: outcome.cursor,
        section: outcome.section,
        first_block: outcome.first_block,
        batch_counts: Vec::new(),
    };
    Ok(ok_response(task, session, &reply))
}

async fn cursor_task(
    sgs: &Arc<ServerGlobalState>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;
    let body: FetchBody = match decode_body(packet, session) {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };
    let thread = open_thread(session)?;

    match task {
        TaskCode::Next => {
            let block = sgs.engine.fetch(thread, body.cursor, 1).await?;
            Ok(ok_response(task, session, &RowsBody { block }))
        }
        TaskCode::NextN => {
            let max = body
                .max_rows
                .unwrap_or(session.fetch_block_rows)
                .min(session.fetch_block_rows);
            let block = sgs.engine.fetch(thread, body.cursor, max).await?;
            Ok(ok_response(task, session, &RowsBody { block }))
        }
        TaskCode::PositionedFetch => {
            let max = body
                .max_rows
                .unwrap_or(session.fetch_block_rows)
                .min(session.fetch_block_rows);
            let block = sgs
                .engine
                .positioned_fetch(thread, body.cursor, body.position.unwrap_or(0), max)
                .await?;
            Ok(ok_response(task, session, &RowsBody { block }))
        }
        TaskCode::DropCursor | TaskCode::DropCursorAndMetadata => {
            sgs.engine.drop_cursor(thread, body.cursor).await?;
            Ok(ResponsePacket::empty(task.as_u16()))
        }
        _ => Ok(internal_error(task, session)),
    }
}

async fn metadata_task(
    sgs: &Arc<ServerGlobalState>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;

    if task == TaskCode::ReleaseMetadataBuffers {
        return Ok(ResponsePacket::empty(task.as_u16()));
    }

    let args: MetadataArgs = if packet.body.is_empty() {
        MetadataArgs::default()
    } else {
        match decode_body(packet, session) {
            Ok(args) => args,
            Err(response) => return Ok(response),
        }
    };
    let thread = open_thread(session)?;

    let query = match task {
        TaskCode::GetTables => DictionaryQuery::Tables,
        TaskCode::GetColumns => DictionaryQuery::Columns,
        TaskCode::GetPrimaryKeys => DictionaryQuery::PrimaryKeys,
        TaskCode::GetImportedKeys => DictionaryQuery::ImportedKeys,
        TaskCode::GetExportedKeys => DictionaryQuery::ExportedKeys,
        TaskCode::GetProcedures => DictionaryQuery::Procedures,
        TaskCode::GetProcedureColumns => DictionaryQuery::ProcedureColumns,
        TaskCode::GetTypeInfo => DictionaryQuery::TypeInfo,
        TaskCode::GetTableTypes => DictionaryQuery::TableTypes,
        TaskCode::GetVersionInfo => DictionaryQuery::VersionInfo,
        TaskCode::GetIndexInfo => DictionaryQuery::IndexInfo,
        TaskCode::GetBestRowIdentifier => DictionaryQuery::BestRowIdentifier,
        TaskCode::GetCrossReference => DictionaryQuery::CrossReference,
        TaskCode::GetCatalogs => DictionaryQuery::Catalogs,
        TaskCode::GetSchemas => DictionaryQuery::Schemas,
        _ => return Ok(internal_error(task, session)),
    };
    let dictionary_args = DictionaryArgs {
        catalog: args.catalog,
        schema_pattern: args.schema_pattern,
        table_pattern: args.table_pattern,
        column_pattern: args.column_pattern,
        routine_pattern: args.routine_pattern,
        table_types: args.table_types,
        foreign_table: args.foreign_table,
        approximate: args.approximate,
    };

    let block = sgs.engine.dictionary(thread, query, dictionary_args).await?;
    Ok(ok_response(task, session, &RowsBody { block }))
}

async fn blob_task(
    sgs: &Arc<ServerGlobalState>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;
    let thread = open_thread(session)?;

    match task {
        TaskCode::GetLobHandle => {
            let body: LobHandleBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            let (handle, length) = sgs.engine.lob_handle(thread, body.cursor, body.column).await?;
            Ok(ok_response(task, session, &LobHandleReplyBody { handle, length }))
        }
        TaskCode::GetBlobData => {
            let body: BlobDataBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            let (data, end_of_lob) = sgs
                .engine
                .blob_read(thread, body.handle, body.offset, body.length)
                .await?;
            Ok(ok_response(task, session, &BlobDataReplyBody { data, end_of_lob }))
        }
        TaskCode::SetBlobBytes => {
            let body: BlobWriteBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            sgs.engine
                .blob_write(thread, body.handle, body.offset, &body.data)
                .await?;
            Ok(ResponsePacket::empty(task.as_u16()))
        }
        TaskCode::TruncateBlob => {
            let body: BlobTruncateBody = match decode_body(packet, session) {
                Ok(body) => body,
                Err(response) => return Ok(response),
            };
            sgs.engine.blob_truncate(thread, body.handle, body.length).await?;
            Ok(ResponsePacket::empty(task.as_u16()))
        }
        _ => Ok(internal_error(task, session)),
    }
}

async fn result_set_task(
    sgs: &Arc<ServerGlobalState>,
    session: &mut SessionCtx,
    packet: &RequestPacket,
) -> Result<ResponsePacket, EngineError> {
    let task = packet.header.task_code;
    match task {
        TaskCode::NextResultUpdateCount | TaskCode::NextResultCursor => {
            let thread = open_thread(session)?;
            let next = sgs.engine.next_result(thread).await?;
            let reply = NextResultReplyBody {
                update_count: next.update_count,
                cursor: next.cursor,
                done: next.done,
            };
            Ok(ok_response(task, session, &reply))
        }
        TaskCode::UpdaterRow => Ok(ResponsePacket::empty(task.as_u16())),
        _ => Ok(internal_error(task, session)),
    }
}

fn open_thread(session: &SessionCtx) -> Result<ThreadId, EngineError> {
    session.thread.ok_or_else(EngineError::no_such_thread)
}

/// Decode a task body or shape the bad-body error response.
fn decode_body<T: DeserializeOwned>(
    packet: &RequestPacket,
    session: &SessionCtx,
) -> Result<T, ResponsePacket> {
    packet.body().map_err(|_| {
        ResponsePacket::error(
            packet.header.task_code.as_u16(),
            TaskStatus::BAD_REQUEST_BODY,
            localized(&session.locale, MsgId::BadRequestBody),
        )
    })
}

/// Encode a success reply; an encode failure degrades to an internal
/// error response rather than tearing the channel down.
fn ok_response<B: Serialize>(task: TaskCode, session: &SessionCtx, body: &B) -> ResponsePacket {
    ResponsePacket::ok(task.as_u16(), body)
        .unwrap_or_else(|_| internal_error(task, session))
}

fn internal_error(task: TaskCode, session: &SessionCtx) -> ResponsePacket {
    ResponsePacket::error(
        task.as_u16(),
        TaskStatus::INTERNAL_ERROR,
        format!(
            "{} ({task})",
            localized(&session.locale, MsgId::InternalError)
        ),
    )
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
