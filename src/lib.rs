// SPDX-License-Identifier: MIT
//! devstack — provisions and supervises a local AI chat development stack:
//! a Vite front-end, a Python backend, a local Ollama runtime, and a
//! remote OpenAI-compatible API.

pub mod activate;
pub mod deps;
pub mod doctor;
pub mod envfile;
pub mod error;
pub mod install;
pub mod interact;
pub mod platform;
pub mod prefetch;
pub mod scripts;
pub mod setup;
pub mod supervise;
pub mod verify;
