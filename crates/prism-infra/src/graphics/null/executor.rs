// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The queue worker of the Null backend.
//!
//! Command lists run on a dedicated thread in submission order. Resource
//! memory lives in [`NullStorage`], so transfers, clears and mip generation
//! have observable results. Draws and dispatches only update counters.

use super::command::{Command, PassTargets};
use super::image::depth_stencil_mask;
use super::storage::NullStorage;
use crossbeam_channel::Receiver;
use prism_core::renderer::{
    BackendOwned, ClearFlags, ClearValue, QueryHeapId, QueryType, QueueTimeline, ResourceError,
};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Counters of the work a Null queue has executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Command buffers executed.
    pub submissions: u64,
    /// Draw calls, indirect draws counted per command.
    pub draws: u64,
    /// Vertices (or indices) processed, all instances included.
    pub vertices: u64,
    /// Instances drawn.
    pub instances: u64,
    /// Dispatch calls.
    pub dispatches: u64,
    /// Work groups dispatched.
    pub work_groups: u64,
    /// Render passes opened.
    pub render_passes: u64,
    /// Swap chain presents.
    pub presents: u64,
    /// Fences signaled.
    pub fences_signaled: u64,
}

/// A unit of work for the worker. Each carries the timeline ticket it completes.
#[derive(Debug)]
pub(crate) enum Job {
    Execute { commands: Vec<Command>, ticket: u64 },
    Signal { ticket: u64 },
    Present { ticket: u64 },
}

/// Per-command-list state.
#[derive(Default)]
struct Frame {
    targets: Option<PassTargets>,
    vertices: u64,
    occlusion: HashMap<(QueryHeapId, u32), u64>,
    timers: HashMap<(QueryHeapId, u32), Instant>,
}

pub(crate) struct Executor {
    storage: Arc<NullStorage>,
    timeline: QueueTimeline,
    stats: Arc<Mutex<ExecutionStats>>,
}

impl Executor {
    pub fn new(
        storage: Arc<NullStorage>,
        timeline: QueueTimeline,
        stats: Arc<Mutex<ExecutionStats>>,
    ) -> Self {
        Self {
            storage,
            timeline,
            stats,
        }
    }

    /// Starts the worker. It stops once every sender of `jobs` is dropped.
    pub fn spawn(self, jobs: Receiver<Job>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("prism-null-queue".into())
            .spawn(move || self.run(jobs))
    }

    fn run(self, jobs: Receiver<Job>) {
        log::debug!("Null queue worker started.");
        for job in jobs.iter() {
            let ticket = match job {
                Job::Execute { commands, ticket } => {
                    let mut frame = Frame::default();
                    self.execute(&commands, &mut frame);
                    if frame.targets.is_some() {
                        log::warn!("Command list {ticket} ended inside a render pass");
                    }
                    self.stats().submissions += 1;
                    ticket
                }
                Job::Signal { ticket } => {
                    self.stats().fences_signaled += 1;
                    ticket
                }
                Job::Present { ticket } => {
                    self.stats().presents += 1;
                    ticket
                }
            };
            self.timeline.complete(ticket);
        }
        log::debug!("Null queue worker stopped.");
    }

    fn stats(&self) -> MutexGuard<'_, ExecutionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, commands: &[Command], frame: &mut Frame) {
        for command in commands {
            if let Err(err) = self.apply(command, frame) {
                log::error!("Null queue failed to execute a command: {err}");
            }
        }
    }

    fn apply(&self, command: &Command, frame: &mut Frame) -> Result<(), ResourceError> {
        let storage = &self.storage;
        match command {
            Command::UpdateBuffer { dst, offset, data } => {
                storage.write_buffer(dst.raw_id(), *offset, data)?;
            }
            Command::CopyBuffer {
                dst,
                dst_offset,
                src,
                src_offset,
                size,
            } => {
                let data = storage.read_buffer(src.raw_id(), *src_offset, *size)?;
                storage.write_buffer(dst.raw_id(), *dst_offset, &data)?;
            }
            Command::CopyBufferFromTexture {
                dst,
                dst_offset,
                src,
                region,
            } => {
                let data = storage.read_texture(src.raw_id(), region)?;
                storage.write_buffer(dst.raw_id(), *dst_offset, &data)?;
            }
            Command::CopyTextureFromBuffer {
                dst,
                region,
                src,
                src_offset,
            } => {
                let size = region.byte_size(dst.format());
                let data = storage.read_buffer(src.raw_id(), *src_offset, size)?;
                storage.write_texture(dst.raw_id(), region, &data)?;
            }
            Command::CopyTexture {
                dst,
                dst_region,
                src,
                src_region,
            } => {
                let data = storage.read_texture(src.raw_id(), src_region)?;
                storage.write_texture(dst.raw_id(), dst_region, &data)?;
            }
            Command::FillBuffer { dst, range, value } => {
                let pattern = value.to_le_bytes();
                storage.with_buffer(dst.raw_id(), |bytes| {
                    let range = range.start as usize..range.end as usize;
                    for (i, byte) in bytes[range].iter_mut().enumerate() {
                        *byte = pattern[i % 4];
                    }
                })?;
            }
            Command::GenerateMips { texture } => {
                storage.with_texture(texture.raw_id(), |image| image.generate_mips())?;
            }
            Command::BeginRenderPass { targets } => {
                frame.targets = Some(targets.clone());
                self.stats().render_passes += 1;
            }
            Command::EndRenderPass => {
                if let Some(targets) = frame.targets.take() {
                    self.resolve(&targets)?;
                }
            }
            Command::Clear {
                color,
                flags,
                value,
            } => match frame.targets.as_ref() {
                Some(targets) => self.clear(targets, *color, *flags, value)?,
                None => log::warn!("Clear outside of a render pass was ignored"),
            },
            Command::Draw {
                vertices,
                instances,
            } => self.count_draw(frame, *vertices, *instances),
            Command::DrawIndirect {
                buffer,
                offset,
                num_commands,
                stride,
                ..
            } => {
                for n in 0..u64::from(*num_commands) {
                    let at = offset + n * u64::from(*stride);
                    let args = storage.read_buffer(buffer.raw_id(), at, 8)?;
                    let [count, instances]: [u32; 2] = bytemuck::pod_read_unaligned(&args);
                    self.count_draw(frame, u64::from(count), u64::from(instances));
                }
            }
            Command::Dispatch { groups } => self.count_dispatch(*groups),
            Command::DispatchIndirect { buffer, offset } => {
                let args = storage.read_buffer(buffer.raw_id(), *offset, 12)?;
                self.count_dispatch(bytemuck::pod_read_unaligned(&args));
            }
            Command::BeginQuery { heap, index } => {
                let key = (heap.id(), *index);
                heap.reset(*index..*index + 1);
                match heap.ty() {
                    QueryType::Occlusion => {
                        frame.occlusion.insert(key, frame.vertices);
                    }
                    QueryType::TimeElapsed => {
                        frame.timers.insert(key, Instant::now());
                    }
                    QueryType::Timestamp => {}
                }
            }
            Command::EndQuery { heap, index } => {
                let key = (heap.id(), *index);
                let value = match heap.ty() {
                    QueryType::Timestamp => SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_nanos() as u64)
                        .unwrap_or_default(),
                    QueryType::Occlusion => frame
                        .occlusion
                        .remove(&key)
                        .map(|start| frame.vertices - start)
                        .unwrap_or_default(),
                    QueryType::TimeElapsed => frame
                        .timers
                        .remove(&key)
                        .map(|start| start.elapsed().as_nanos() as u64)
                        .unwrap_or_default(),
                };
                heap.store(*index, value);
            }
            Command::Execute(commands) => self.execute(commands, frame),
        }
        Ok(())
    }

    fn count_draw(&self, frame: &mut Frame, vertices: u64, instances: u64) {
        let total = vertices * instances;
        frame.vertices += total;
        let mut stats = self.stats();
        stats.draws += 1;
        stats.vertices += total;
        stats.instances += instances;
    }

    fn count_dispatch(&self, [x, y, z]: [u32; 3]) {
        let mut stats = self.stats();
        stats.dispatches += 1;
        stats.work_groups += u64::from(x) * u64::from(y) * u64::from(z);
    }

    fn clear(
        &self,
        targets: &PassTargets,
        color: Option<u32>,
        flags: ClearFlags,
        value: &ClearValue,
    ) -> Result<(), ResourceError> {
        if flags.contains(ClearFlags::COLOR) {
            let views = match color {
                Some(index) => targets.colors.get(index as usize..=index as usize).unwrap_or(&[]),
                None => &targets.colors[..],
            };
            for view in views {
                let Some(texel) = view.texture.format().encode_color(value.color) else {
                    continue;
                };
                let mask = 0..texel.len();
                self.storage.with_texture(view.texture.raw_id(), |image| {
                    image.fill(view.mip_level, view.array_layer, targets.resolution, &texel, mask)
                })?;
            }
        }
        if flags.intersects(ClearFlags::DEPTH_STENCIL) {
            if let Some(view) = &targets.depth_stencil {
                let format = view.texture.format();
                let mask = depth_stencil_mask(
                    format,
                    flags.contains(ClearFlags::DEPTH) && format.has_depth(),
                    flags.contains(ClearFlags::STENCIL) && format.has_stencil(),
                );
                if let Some(texel) = format.encode_depth_stencil(value.depth, value.stencil) {
                    self.storage.with_texture(view.texture.raw_id(), |image| {
                        image.fill(view.mip_level, view.array_layer, targets.resolution, &texel, mask)
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Copies multisampled color attachments into their resolve attachments.
    fn resolve(&self, targets: &PassTargets) -> Result<(), ResourceError> {
        for (color, resolve) in targets.colors.iter().zip(&targets.resolves) {
            let data = self
                .storage
                .read_texture(color.texture.raw_id(), &color.region(targets.resolution))?;
            self.storage.write_texture(
                resolve.texture.raw_id(),
                &resolve.region(targets.resolution),
                &data,
            )?;
        }
        Ok(())
    }
}
