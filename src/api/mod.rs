pub mod kernel_dto;
pub mod plant_model_dto;
