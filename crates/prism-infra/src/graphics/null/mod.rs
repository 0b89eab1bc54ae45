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

//! The Null backend.
//!
//! A CPU-only implementation of every render-system contract. Resource memory
//! is real host memory and command buffers execute on a queue worker thread,
//! but nothing is rasterized. It backs headless tools and every test in the
//! workspace.

mod command;
mod device;
mod executor;
mod image;
mod queue;
mod storage;
mod swap_chain;
mod system;

pub use self::command::NullCommandBuffer;
pub use self::executor::ExecutionStats;
pub use self::queue::NullCommandQueue;
pub use self::swap_chain::NullSwapChain;
pub use self::system::{null_capabilities, NullRenderSystem, NULL_BACKEND_NAME};
