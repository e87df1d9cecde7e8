//! `nextbox-core` provisions disposable Next.js development sandboxes on a remote provider.
//!
//! # Overview
//!
//! A provisioning run creates a fresh sandbox from a Node.js base image, bootstraps a Next.js
//! application inside it, overwrites the application's landing page with a fixed CRUD page,
//! starts the development server in a detached session and resolves the public preview URL.
//!
//! # Modules
//!
//! - [`config`] - Provider credentials and the provisioning plan
//! - [`provider`] - The sandbox provider abstraction and the Daytona REST client
//! - [`management`] - The provisioning sequence and the injected page source

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod config;
pub mod management;
pub mod provider;

pub use error::*;
