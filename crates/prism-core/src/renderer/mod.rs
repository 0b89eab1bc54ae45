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

//! The backend-agnostic rendering contracts of Prism.
//!
//! This module defines the object model every backend presents: descriptors
//! and reference-counted handles in [`api`], the factory and recording
//! contracts in [`traits`] (like [`RenderSystem`] and [`CommandBuffer`]), the
//! error hierarchy in [`error`] and the validation shared by all backends in
//! [`validation`].
//!
//! Concrete backends live in the `prism-infra` crate and implement these
//! traits. Applications only ever talk to the traits.

pub mod api;
pub mod error;
pub mod traits;
pub mod validation;

pub use self::api::*;
pub use self::error::{CommandError, LoadError, PipelineError, RenderError, ResourceError, ShaderError};
pub use self::traits::*;
