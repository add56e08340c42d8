//! Host-side view of the particle buffer

use sph_pipeline::config::PARTICLE_RECORD_SIZE;

/// One particle as laid out in the `particles` buffer by the built-in programs
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleRecord {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub acceleration: [f32; 3],
    /// Velocity at the start of the current step
    pub previous_velocity: [f32; 3],
    /// Acceleration at the start of the current step
    pub previous_acceleration: [f32; 3],
    pub mass: f32,
    pub smoothing_length: f32,
    pub density: f32,
    pub pressure: f32,
    /// gradH correction factor
    pub omega: f32,
    /// 0 between steps, 1 between the predictor and corrector halves
    pub phase: f32,
}

const _: () = assert!(std::mem::size_of::<ParticleRecord>() as u64 == PARTICLE_RECORD_SIZE);

impl ParticleRecord {
    /// Decodes a read-back particle buffer
    ///
    /// Returns `None` unless `bytes` holds a whole number of records. The
    /// input needs no particular alignment.
    pub fn from_bytes(bytes: &[u8]) -> Option<Vec<Self>> {
        let record_size = std::mem::size_of::<Self>();
        if bytes.len() % record_size != 0 {
            return None;
        }
        Some(bytes.chunks_exact(record_size).map(bytemuck::pod_read_unaligned).collect())
    }

    pub fn speed(&self) -> f32 {
        self.velocity.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}
