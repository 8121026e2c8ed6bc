//! Declared parameter listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use trivox_core::{ParamDescriptor, ParamUnit, gain_to_decibels};
use trivox_synth::params;

#[derive(Args)]
pub struct ParamsArgs {
    /// Only list parameters in this group (e.g. "Amp Envelope")
    #[arg(long)]
    group: Option<String>,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let selected: Vec<(usize, &ParamDescriptor)> = params::descriptors()
        .iter()
        .enumerate()
        .filter(|(_, d)| {
            args.group
                .as_deref()
                .is_none_or(|g| d.group.eq_ignore_ascii_case(g))
        })
        .collect();

    if selected.is_empty() {
        anyhow::bail!(
            "no parameters in group '{}'",
            args.group.as_deref().unwrap_or_default()
        );
    }

    println!(
        "  {:>3}  {:28}  {:14}  {:20}  {}",
        "#", "String id", "Group", "Range", "Default"
    );
    println!(
        "  {:>3}  {:28}  {:14}  {:20}  {}",
        "-", "---------", "-----", "-----", "-------"
    );
    for (index, desc) in selected {
        println!(
            "  {:>3}  {:28}  {:14}  {:20}  {}",
            index,
            desc.string_id,
            desc.group,
            range_label(desc),
            default_label(desc)
        );
    }
    Ok(())
}

fn range_label(desc: &ParamDescriptor) -> String {
    if desc.choices.is_empty() {
        format!("{}-{}{}", desc.min, desc.max, desc.unit.suffix())
    } else {
        desc.choices.join("/")
    }
}

fn default_label(desc: &ParamDescriptor) -> String {
    match (desc.choice_label(desc.default), desc.unit) {
        (Some(label), _) => label.to_string(),
        (None, ParamUnit::Gain) => format!(
            "{} ({:.1} dB)",
            desc.default,
            gain_to_decibels(desc.default, MIN_DB)
        ),
        (None, _) => format!("{}{}", desc.default, desc.unit.suffix()),
    }
}

/// Floor for dB labels.
const MIN_DB: f32 = -96.0;
