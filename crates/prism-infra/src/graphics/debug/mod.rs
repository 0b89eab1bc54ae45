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

//! The validating debug layer.
//!
//! [`DebugRenderSystem`] wraps any render system. The wrappers check the
//! arguments and recording state of every call against what the native APIs
//! require, report findings to a [`prism_core::telemetry::RenderingDebugger`]
//! and feed its frame profiles while a capture session is open.

mod command;
mod queue;
mod swap_chain;
mod system;

pub use self::command::DebugCommandBuffer;
pub use self::queue::DebugCommandQueue;
pub use self::swap_chain::DebugSwapChain;
pub use self::system::DebugRenderSystem;
