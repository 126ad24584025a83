use std::path::Path;

use crate::api::kernel_dto::KernelDto;
use crate::domain::kernel_model::KernelModel;
use crate::error::Result;
use crate::loader::parser::parse_json_file;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads a kernel configuration file: plant model, scheduler settings and the
/// routes of the configured vehicles.
pub fn generate_kernel_model(file_path: impl AsRef<Path>) -> Result<KernelModel> {
    let kernel_dto: KernelDto = parse_json_file(file_path.as_ref())?;
    log::info!("Kernel configuration '{}' parsed successfully.", file_path.as_ref().display());

    let kernel_model = KernelModel::try_from(kernel_dto)?;
    log::info!("Kernel model with {} vehicle(s) constructed successfully.", kernel_model.vehicles.len());

    Ok(kernel_model)
}
