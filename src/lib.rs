//! # Theme Overlay Library
//!
//! This library lets many site projects share a common base of template
//! partials, layouts and assets (the "core") while each site can override any
//! single file without forking the core. It is used by the `theme-overlay`
//! command-line tool and can be embedded in any build tool that drives a
//! templating host.
//!
//! ## Quick Example
//!
//! ```no_run
//! use theme_overlay::config::ThemeConfig;
//! use theme_overlay::host::RecordingHost;
//! use theme_overlay::plugin;
//!
//! let mut config = ThemeConfig::new("node_modules/theme-core/src");
//! config.site_input_dir = "src".into();
//!
//! let mut host = RecordingHost::new();
//! let paths = plugin::setup(&mut host, &config).unwrap();
//!
//! // Before each build: sync includes and layouts, then run pipeline steps.
//! let ctx = host.run_before_build().unwrap();
//! assert_eq!(ctx.failure_count(), 0);
//! println!("core layouts: {}", paths.core_layouts.display());
//! ```
//!
//! ## Core Concepts
//!
//! - **Logical keys (`path`)**: a template path without its extension.
//!   `post.njk` and `post.md` are the same overridable unit.
//! - **Tiers (`resolver`)**: site, optional overlay, and core. The first tier
//!   holding a key wins, whatever the extension.
//! - **Search paths (`search_paths`)**: ordered roots for engines with
//!   multi-root lookup, site before core.
//! - **Layout aliases (`alias`)**: `key -> target` registrations for core
//!   layouts the site does not override.
//! - **Synchronization (`sync`)**: physical copies of core files inside the
//!   site tree, either mirrored into a namespace or merged once with a
//!   manifest that tracks what was copied.
//! - **Change detection (`cache`)**: a marker timestamp that lets unchanged
//!   mirror passes be skipped.
//! - **Host (`host`)**: the trait through which all of the above reaches the
//!   templating host, plus build lifecycle hooks.
//!
//! ## Execution Flow
//!
//! [`plugin::setup`] runs once at configuration time. It registers search
//! paths and layout aliases and installs a before-build hook that:
//!
//! 1.  **Merges includes**: copies core includes the site lacks and removes
//!     copies core no longer ships.
//! 2.  **Mirrors layouts**: replaces the layouts namespace with the current
//!     core layouts when core changed.
//! 3.  **Runs pipeline steps**: external CSS/JS programs.

pub mod alias;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod error;
pub mod filesystem;
pub mod host;
pub mod output;
pub mod path;
pub mod pipeline;
pub mod plugin;
pub mod resolver;
pub mod search_paths;
pub mod suggestions;
pub mod sync;

#[cfg(test)]
mod path_proptest;
