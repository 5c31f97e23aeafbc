// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Compute backend selection for the diffusion pipeline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Device requested by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Pick the best backend present on this host
    Auto,
    Cuda,
    Mps,
    Cpu,
}

/// Backend the pipeline runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    Cuda,
    Mps,
    Cpu,
}

/// Tensor precision the pipeline is loaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Float16,
    Float32,
}

/// Snapshot of accelerators visible to this process
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceProbe {
    pub cuda: bool,
    pub mps: bool,
}

impl DeviceProbe {
    /// Probe the running host
    pub fn from_system() -> Self {
        Self {
            cuda: cuda_available(),
            mps: mps_available(),
        }
    }
}

impl DevicePreference {
    /// Resolve against the running host
    pub fn resolve(self) -> ComputeDevice {
        self.resolve_with(&DeviceProbe::from_system())
    }

    /// Resolve against a given probe; explicit choices are honoured as-is
    pub fn resolve_with(self, probe: &DeviceProbe) -> ComputeDevice {
        match self {
            DevicePreference::Auto => ComputeDevice::select(probe),
            DevicePreference::Cuda => ComputeDevice::Cuda,
            DevicePreference::Mps => ComputeDevice::Mps,
            DevicePreference::Cpu => ComputeDevice::Cpu,
        }
    }
}

impl ComputeDevice {
    /// CUDA, then MPS, then CPU
    pub fn select(probe: &DeviceProbe) -> Self {
        if probe.cuda {
            ComputeDevice::Cuda
        } else if probe.mps {
            ComputeDevice::Mps
        } else {
            ComputeDevice::Cpu
        }
    }

    /// Half precision on accelerators, full precision on CPU
    pub fn precision(&self) -> Precision {
        match self {
            ComputeDevice::Cpu => Precision::Float32,
            ComputeDevice::Cuda | ComputeDevice::Mps => Precision::Float16,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeDevice::Cuda => "cuda",
            ComputeDevice::Mps => "mps",
            ComputeDevice::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float16 => "float16",
            Precision::Float32 => "float32",
        }
    }
}

fn cuda_available() -> bool {
    // CUDA_VISIBLE_DEVICES="" or "-1" hides every GPU
    if let Ok(visible) = std::env::var("CUDA_VISIBLE_DEVICES") {
        let visible = visible.trim();
        if visible.is_empty() || visible == "-1" {
            return false;
        }
    }
    Path::new("/proc/driver/nvidia/version").exists() || Path::new("/dev/nvidiactl").exists()
}

fn mps_available() -> bool {
    cfg!(all(target_os = "macos", target_arch = "aarch64"))
}
