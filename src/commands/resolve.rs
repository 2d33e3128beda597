//! # Resolve Command Implementation
//!
//! Answers "which file will the host use for this template?" by walking the
//! tier stack for a logical key.

use anyhow::Result;
use clap::{Args, ValueEnum};
use theme_overlay::error::Error;
use theme_overlay::filesystem::FileTree;
use theme_overlay::path::LogicalKey;
use theme_overlay::plugin::tier_stack;
use theme_overlay::resolver::TemplateKind;
use theme_overlay::suggestions;

use super::GlobalArgs;

/// Template namespace to search
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Layout,
    Include,
}

impl From<KindArg> for TemplateKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Layout => TemplateKind::Layout,
            KindArg::Include => TemplateKind::Include,
        }
    }
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Template key, e.g. `blog/post` (an extension is ignored)
    pub key: String,

    /// Namespace to look in
    #[arg(long, value_enum, default_value = "layout")]
    pub kind: KindArg,
}

/// Execute the resolve command
pub fn execute(global: &GlobalArgs, args: ResolveArgs) -> Result<()> {
    let config = global.load()?;
    let key = LogicalKey::parse(&args.key)?;
    let kind = TemplateKind::from(args.kind);
    let stack = tier_stack(&config);

    match stack.resolve_required(kind, &key) {
        Ok(resolved) => {
            println!("{}: {}", resolved.tier, resolved.path.display());
            Ok(())
        }
        Err(Error::TemplateNotFound { .. }) => {
            let known = known_keys(&stack, kind);
            let known: Vec<&str> = known.iter().map(LogicalKey::as_str).collect();
            Err(suggestions::template_not_found(key.as_str(), &known))
        }
        Err(e) => Err(e.into()),
    }
}

/// Keys available in any tier, for suggestions.
fn known_keys(stack: &theme_overlay::resolver::TierStack, kind: TemplateKind) -> Vec<LogicalKey> {
    let mut keys: Vec<LogicalKey> = stack
        .tiers()
        .iter()
        .filter_map(|tier| FileTree::new(tier.dir(kind)).list_templates().ok())
        .flatten()
        .filter_map(|rel| LogicalKey::from_relative(&rel))
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
