/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Value-format helpers for structured log fields.

pub const NONE: &str = "none";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";
const PREVIEW_MAX_CHARS: usize = 64;

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Formats an endpoint URI field, using [`NONE`] for an empty URI.
pub fn format_uri(uri: &str) -> &str {
    if uri.is_empty() {
        NONE
    } else {
        uri
    }
}

/// Shortened single-line body for trace output.
pub fn format_body_preview(body: &str) -> String {
    let mut preview: String = body
        .chars()
        .take(PREVIEW_MAX_CHARS)
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect();
    if body.chars().count() > PREVIEW_MAX_CHARS {
        preview.push_str("...");
    }
    preview
}
