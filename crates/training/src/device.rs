use crate::{TrainError, TrainResult};
use burn::tensor::backend::Backend;
use std::fmt;

/// Where a run executes: host CPU or an accelerator by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cpu,
    Accelerator(usize),
}

impl ComputeDevice {
    /// Negative indices select the CPU; anything else names an accelerator.
    pub fn from_index(index: i64) -> Self {
        usize::try_from(index)
            .map(ComputeDevice::Accelerator)
            .unwrap_or(ComputeDevice::Cpu)
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu => f.write_str("cpu"),
            ComputeDevice::Accelerator(i) => write!(f, "accelerator:{i}"),
        }
    }
}

pub type TrainDevice = <crate::TrainBackend as Backend>::Device;

#[cfg(not(feature = "backend-wgpu"))]
pub fn resolve_device(device: ComputeDevice) -> TrainResult<TrainDevice> {
    match device {
        ComputeDevice::Cpu => Ok(burn_ndarray::NdArrayDevice::Cpu),
        ComputeDevice::Accelerator(i) => Err(TrainError::Device(format!(
            "accelerator {i} requested but backend-wgpu feature not enabled; rebuild with --features backend-wgpu or pass a negative --gpu for cpu"
        ))),
    }
}

#[cfg(feature = "backend-wgpu")]
pub fn resolve_device(device: ComputeDevice) -> TrainResult<TrainDevice> {
    Ok(match device {
        ComputeDevice::Cpu => burn_wgpu::WgpuDevice::Cpu,
        ComputeDevice::Accelerator(i) => burn_wgpu::WgpuDevice::DiscreteGpu(i),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_of_index_picks_device() {
        assert_eq!(ComputeDevice::from_index(-1), ComputeDevice::Cpu);
        assert_eq!(ComputeDevice::from_index(-7), ComputeDevice::Cpu);
        assert_eq!(ComputeDevice::from_index(0), ComputeDevice::Accelerator(0));
        assert_eq!(ComputeDevice::from_index(3), ComputeDevice::Accelerator(3));
    }

    #[cfg(not(feature = "backend-wgpu"))]
    #[test]
    fn ndarray_build_rejects_accelerators() {
        assert!(resolve_device(ComputeDevice::Cpu).is_ok());
        assert!(matches!(
            resolve_device(ComputeDevice::Accelerator(0)),
            Err(TrainError::Device(_))
        ));
    }
}
