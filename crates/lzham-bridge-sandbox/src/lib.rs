//! Wasmtime sandbox backend for lzham-bridge.
//!
//! This crate runs the codec's WebAssembly build in an isolated guest:
//! - [`SandboxEngine`]: Configured Wasmtime engine
//! - [`CompiledModule`]: Compiled guest module wrapper
//! - [`SandboxInstance`]: One call's isolated instance
//! - [`SandboxCodec`]: The backend, plus its lazily built process-wide copy
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                SandboxCodec::global()                   │
//! │  (Built once on first use, shared read-only)            │
//! │  - SandboxEngine                                        │
//! │  - CompiledModule                                       │
//! │  - InstancePre (imports resolved, WASI shims linked)    │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          Store<GuestContext> + Instance                 │
//! │  (Per call, isolated, dropped on return)                │
//! │  - Linear memory holding the call's GuestLayout         │
//! │  - Memory limit                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
mod embedded;
pub mod engine;
pub mod instance;
pub mod layout;
pub mod linker;
pub mod module;
pub mod store;

pub use codec::SandboxCodec;
pub use engine::SandboxEngine;
pub use instance::SandboxInstance;
pub use layout::{GuestLayout, MAX_ERROR_MESSAGE_LEN};
pub use module::CompiledModule;
pub use store::GuestContext;
