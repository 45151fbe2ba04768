//! Mixer command handlers.

use tabled::Tabled;

use patchbay_core::{Mixer, MixerChannel, Session};

use crate::cli::{ChannelArgs, ChannelCommand, GlobalOpts, MixersArgs, MixersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MixerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Out Ch")]
    output_channels: u32,
    #[tabled(rename = "Inputs")]
    inputs: usize,
}

impl From<&Mixer> for MixerRow {
    fn from(m: &Mixer) -> Self {
        Self {
            id: m.id.clone(),
            name: m.display_name.clone(),
            output_channels: m.output_channels,
            inputs: m.channels.len(),
        }
    }
}

fn channel_line(c: &MixerChannel) -> String {
    format!(
        "  {:<10} vol {:>4.0}%  {}",
        c.id,
        c.volume * 100.0,
        c.input.as_deref().unwrap_or("(unrouted)")
    )
}

fn detail(m: &Mixer) -> String {
    let mut lines = vec![
        format!("ID:       {}", m.id),
        format!("Name:     {}", m.display_name),
        format!("Outputs:  {} channels", m.output_channels),
    ];
    if m.channels.is_empty() {
        lines.push("Inputs:   -".into());
    } else {
        lines.push("Inputs:".into());
        lines.extend(m.channels.iter().map(channel_line));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: MixersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MixersCommand::List => {
            let mixers = session.list_mixers().await?;
            let out = output::render_list(global.output, &mixers, |m| MixerRow::from(m), |m| {
                m.id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MixersCommand::Get { id } => {
            let mixer = session.get_mixer(&id).await?;
            let out = output::render_single(global.output, &mixer, detail, |m| m.id.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MixersCommand::Create { name, channels } => {
            let created = session.create_mixer(&name, channels).await?;
            let out = output::render_list(global.output, &created, |m| MixerRow::from(m), |m| {
                m.id.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MixersCommand::Rename { id, name } => {
            session.rename_mixer(&id, &name).await?;
            if !global.quiet {
                eprintln!("✓ Renamed mixer '{id}' to '{name}'");
            }
            Ok(())
        }

        MixersCommand::Delete { id } => {
            if !util::confirm(&format!("Delete mixer '{id}'?"), global.yes)? {
                return Ok(());
            }
            session.delete_mixer(&id).await?;
            if !global.quiet {
                eprintln!("✓ Deleted mixer '{id}'");
            }
            Ok(())
        }

        MixersCommand::Channel(args) => handle_channel(session, args, global).await,
    }
}

async fn handle_channel(
    session: &Session,
    args: ChannelArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ChannelCommand::Add { mixer } => {
            let channel = session.add_mixer_channel(&mixer).await?;
            output::print_output(&channel, global.quiet);
            Ok(())
        }

        ChannelCommand::Set {
            mixer,
            channel,
            input,
            volume,
        } => {
            session
                .update_mixer_channel(&mixer, &channel, input, volume)
                .await?;
            if !global.quiet {
                eprintln!("✓ Updated channel '{channel}' on mixer '{mixer}'");
            }
            Ok(())
        }

        ChannelCommand::Remove { mixer, channel } => {
            if !util::confirm(
                &format!("Remove channel '{channel}' from mixer '{mixer}'?"),
                global.yes,
            )? {
                return Ok(());
            }
            session.remove_mixer_channel(&mixer, &channel).await?;
            if !global.quiet {
                eprintln!("✓ Removed channel '{channel}' from mixer '{mixer}'");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_shows_routing_and_volume() {
        let mixer = Mixer {
            id: "mx-1".into(),
            display_name: "Studio".into(),
            output_channels: 2,
            channels: vec![
                MixerChannel {
                    id: "c1".into(),
                    volume: 0.5,
                    input: Some("mic".into()),
                },
                MixerChannel {
                    id: "c2".into(),
                    volume: 1.0,
                    input: None,
                },
            ],
        };

        let text = detail(&mixer);
        assert!(text.contains("Outputs:  2 channels"));
        assert!(text.contains("c1         vol   50%  mic"));
        assert!(text.contains("(unrouted)"));
        assert_eq!(MixerRow::from(&mixer).inputs, 2);
    }
}
