// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod output_store;

// Re-export main types for convenience
pub use output_store::{OutputStore, StorageError, FILENAME_EXTENSION, FILENAME_PREFIX};
