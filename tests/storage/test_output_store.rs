// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OutputStore on a real filesystem

use chrono::{NaiveDate, NaiveDateTime};
use image::{Rgb, RgbImage};
use inpaint_node::storage::{OutputStore, StorageError};
use tempfile::TempDir;

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 15)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap()
}

#[tokio::test]
async fn test_new_creates_nested_directory() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b").join("output");

    let store = OutputStore::new(&root).await.unwrap();

    assert!(root.is_dir());
    assert_eq!(store.root(), root.as_path());
}

#[tokio::test]
async fn test_new_accepts_existing_directory() {
    let dir = TempDir::new().unwrap();
    OutputStore::new(dir.path()).await.unwrap();
    OutputStore::new(dir.path()).await.unwrap();
}

#[tokio::test]
async fn test_same_second_gets_suffix() {
    let dir = TempDir::new().unwrap();
    let store = OutputStore::new(dir.path()).await.unwrap();

    let first = store.save_bytes_at(b"one", at()).await.unwrap();
    let second = store.save_bytes_at(b"two", at()).await.unwrap();
    let third = store.save_bytes_at(b"three", at()).await.unwrap();

    assert_eq!(first, "inpainted_20251015_143000.png");
    assert_eq!(second, "inpainted_20251015_143000_1.png");
    assert_eq!(third, "inpainted_20251015_143000_2.png");

    // Earlier outputs are untouched
    assert_eq!(store.read(&first).await.unwrap(), b"one");
    assert_eq!(store.read(&second).await.unwrap(), b"two");
}

#[tokio::test]
async fn test_save_png_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = OutputStore::new(dir.path()).await.unwrap();
    let image = RgbImage::from_fn(17, 9, |x, y| Rgb([x as u8, y as u8, 42]));

    let filename = store.save_png(&image).await.unwrap();
    assert!(filename.starts_with("inpainted_"));

    let bytes = store.read(&filename).await.unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded, image);
}

#[tokio::test]
async fn test_read_missing_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = OutputStore::new(dir.path()).await.unwrap();

    let result = store.read("inpainted_20000101_000000.png").await;
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn test_read_rejects_path_components() {
    let dir = TempDir::new().unwrap();
    let store = OutputStore::new(dir.path().join("out")).await.unwrap();
    std::fs::write(dir.path().join("secret.png"), b"secret").unwrap();

    for name in ["../secret.png", "..", ".", "", "a/b.png", "a\\b.png"] {
        let result = store.read(name).await;
        assert!(
            matches!(result, Err(StorageError::InvalidFilename(_))),
            "{:?} should be rejected",
            name
        );
    }
}
