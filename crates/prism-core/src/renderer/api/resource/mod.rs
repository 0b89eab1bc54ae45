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

//! Buffers, textures, samplers and the generic resource variant.

mod buffer;
mod flags;
#[allow(clippy::module_inception)]
mod resource;
mod sampler;
mod texture;
mod vertex;
mod view;

pub use self::buffer::*;
pub use self::flags::*;
pub use self::resource::*;
pub use self::sampler::*;
pub use self::texture::*;
pub use self::vertex::*;
pub use self::view::*;
