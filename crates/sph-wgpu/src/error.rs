//! Errors raised while binding a pipeline to a wgpu device

/// A pipeline does not fit the device it is bound to
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("buffer '{name}' is {size} bytes, the device allows {limit}")]
    BufferTooLarge { name: String, size: u64, limit: u64 },

    #[error("texture '{name}' is {width}x{height}, the device allows {limit} per side")]
    TextureTooLarge { name: String, width: u32, height: u32, limit: u32 },

    #[error("pass '{pass}' dispatches {work_groups:?} work groups, the device allows {limit} per dimension")]
    DispatchTooLarge { pass: String, work_groups: [u32; 3], limit: u32 },

    #[error("pass '{pass}' uses work group size {size:?}, beyond the device's {limit} of {max}")]
    WorkGroupTooLarge { pass: String, size: [u32; 3], limit: &'static str, max: u32 },

    #[error("pass '{pass}' writes attachment slot {slot}, the device allows {limit} color attachments")]
    TargetSlotOutOfRange { pass: String, slot: u32, limit: u32 },

    #[error("pass '{pass}' binds {count} {kind}, the device allows {limit} per shader stage")]
    TooManyBindings { pass: String, kind: &'static str, count: usize, limit: u32 },

    #[error("pass '{pass}' targets unknown texture '{texture}'")]
    UnknownTexture { pass: String, texture: String },

    #[error("pass '{pass}' targets '{texture}' at {width}x{height}, other targets are {expected_width}x{expected_height}")]
    TargetSizeMismatch {
        pass: String,
        texture: String,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}
