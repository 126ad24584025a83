use crate::api::kernel_dto::SchedulerConfigDto;

const DEFAULT_DEFERRED_QUEUE_WARN_THRESHOLD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Freeing a resource the client does not hold is an error instead of a logged no-op.
    pub strict_free: bool,

    /// A retry sweep that leaves more deferred requests than this is logged as warning.
    pub deferred_queue_warn_threshold: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { strict_free: false, deferred_queue_warn_threshold: DEFAULT_DEFERRED_QUEUE_WARN_THRESHOLD }
    }
}

impl From<SchedulerConfigDto> for SchedulerConfig {
    fn from(dto: SchedulerConfigDto) -> Self {
        Self {
            strict_free: dto.strict_free,
            deferred_queue_warn_threshold: dto.deferred_queue_warn_threshold.unwrap_or(DEFAULT_DEFERRED_QUEUE_WARN_THRESHOLD),
        }
    }
}
