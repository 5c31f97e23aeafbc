// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generated image retrieval
//!
//! Provides GET /output/{filename}.

pub mod handler;

pub use handler::{get_output_handler, OUTPUT_CONTENT_TYPE};
