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

//! Backend-agnostic object model.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`core`]**: Object ownership, reports and rendering capabilities.
//! - **[`resource`]**: Buffers, textures, samplers and the generic resource variant.
//! - **[`shader`]**: Shaders and their reflected interface.
//! - **[`pipeline`]**: Pipeline layouts, resource heaps, pipeline states and caches.
//! - **[`pass`]**: Render passes and texture render targets.
//! - **[`command`]**: The command-buffer state machine, fences, queries and the queue timeline.
//! - **[`util`]**: Enums and flags shared by the other modules.

pub mod command;
pub mod core;
pub mod pass;
pub mod pipeline;
pub mod resource;
pub mod shader;
pub mod util;

pub use self::command::*;
pub use self::core::*;
pub use self::pass::*;
pub use self::pipeline::*;
pub use self::resource::*;
pub use self::shader::*;
pub use self::util::*;
