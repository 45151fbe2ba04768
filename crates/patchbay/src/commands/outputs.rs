//! Output command handlers.

use std::sync::Arc;

use dialoguer::{Input, Select};
use secrecy::SecretString;
use serde_json::Value;
use tabled::Tabled;

use patchbay_core::{
    CoreError, NewOutputWorkflow, Output, OutputId, OutputSelection, OutputVariant, Session,
    WorkflowOutcome,
};

use crate::cli::{CreateOutput, GlobalOpts, OutputFormat, OutputsArgs, OutputsCommand};
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl From<&Arc<Output>> for OutputRow {
    fn from(o: &Arc<Output>) -> Self {
        Self {
            id: id_of(o),
            kind: o.kind().map_or_else(|| "-".into(), ToString::to_string),
            name: o.display_name().unwrap_or("-").to_owned(),
            details: summary(o),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    name: String,
}

fn id_of(o: &Arc<Output>) -> String {
    o.id().map_or_else(String::new, ToString::to_string)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One-line description of the variant-specific fields.
fn summary(o: &Output) -> String {
    match o.variant() {
        OutputVariant::Device { name } => name.unwrap_or("-").to_owned(),
        OutputVariant::Multiplex {
            parent_id,
            channels,
        } => format!(
            "parent {} channels {}",
            parent_id.unwrap_or("?"),
            channels.map_or_else(|| "?".into(), text)
        ),
        OutputVariant::Icecast { endpoint } => endpoint.unwrap_or("-").to_owned(),
        OutputVariant::Unknown { parameters, .. } => {
            format!("{} parameters", parameters.len())
        }
    }
}

fn detail(o: &Arc<Output>) -> String {
    let mut lines = vec![
        format!("ID:         {}", o.id().map_or("-", OutputId::as_str)),
        format!(
            "Type:       {}",
            o.kind().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Name:       {}", o.display_name().unwrap_or("-")),
    ];
    if o.parameters().is_empty() {
        lines.push("Parameters: -".into());
    } else {
        lines.push("Parameters:".into());
        for (key, value) in o.parameters() {
            lines.push(format!("  {key}: {}", text(value)));
        }
    }
    lines.join("\n")
}

/// Parameter keys whose values are never printed.
const SECRET_KEYS: &[&str] = &["password"];
const MASK: &str = "********";

/// Copy of `o` with secret parameters masked; `o` itself when it has none.
fn redacted(o: &Arc<Output>) -> Arc<Output> {
    if !SECRET_KEYS.iter().any(|k| o.parameters().contains_key(*k)) {
        return Arc::clone(o);
    }
    let mut raw = Output::clone(o).into_raw();
    for key in SECRET_KEYS {
        if let Some(value) = raw.get_mut(*key) {
            *value = Value::String(MASK.into());
        }
    }
    Arc::new(Output::from_raw(raw))
}

fn render_outputs(format: OutputFormat, outputs: &[Arc<Output>]) -> Result<String, CliError> {
    let shown: Vec<Arc<Output>> = outputs.iter().map(redacted).collect();
    output::render_list(format, &shown, |o| OutputRow::from(o), id_of)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: OutputsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        OutputsCommand::List => {
            session.connect().await?;
            let snap = session.outputs_snapshot();
            let out = render_outputs(global.output, &snap)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OutputsCommand::Devices => {
            let devices = session
                .client()
                .list_output_devices()
                .await
                .map_err(CoreError::from)?;
            let out = output::render_list(
                global.output,
                &devices,
                |name| DeviceRow { name: name.clone() },
                Clone::clone,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OutputsCommand::Get { id } => {
            session.connect().await?;
            let found = find(session, &id)?;
            let out = output::render_single(global.output, &redacted(&found), detail, id_of)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OutputsCommand::Create { variant } => create(session, variant, global).await,

        OutputsCommand::Delete { id } => {
            session.connect().await?;
            find(session, &id)?;

            if !util::confirm(&format!("Delete output '{id}'?"), global.yes)? {
                return Ok(());
            }
            session.delete_output(&OutputId::new(id.as_str())).await?;
            if !global.quiet {
                eprintln!("✓ Deleted output '{id}'");
            }
            Ok(())
        }

        OutputsCommand::Watch => watch(session, global).await,
    }
}

fn find(session: &Session, id: &str) -> Result<Arc<Output>, CliError> {
    session
        .store()
        .get(&OutputId::new(id))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "output".into(),
            identifier: id.into(),
            list_command: "outputs list".into(),
        })
}

// ── Create ──────────────────────────────────────────────────────────

async fn create(
    session: &Session,
    variant: Option<CreateOutput>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    session.connect().await?;
    let mut workflow = session.new_output_workflow().await?;

    let picked = match variant {
        Some(args) => selection_from_args(args, &workflow)?,
        None => prompt_selection(&workflow)?,
    };
    let Some(selection) = picked else {
        workflow.cancel()?;
        if !global.quiet {
            eprintln!("Cancelled");
        }
        return Ok(());
    };

    match workflow.submit(selection).await? {
        WorkflowOutcome::Created(created) => {
            let created = session.store().merge(created);
            if !global.quiet && created.is_empty() {
                eprintln!("Backend created no outputs");
            }
            let out = render_outputs(global.output, &created)?;
            output::print_output(&out, global.quiet);
        }
        WorkflowOutcome::Cancelled => {}
    }
    Ok(())
}

/// `None` when an interactive device pick is backed out of.
fn selection_from_args(
    args: CreateOutput,
    workflow: &NewOutputWorkflow,
) -> Result<Option<OutputSelection>, CliError> {
    Ok(Some(match args {
        CreateOutput::Device { name: Some(name) } => OutputSelection::Device { name },
        CreateOutput::Device { name: None } => {
            util::require_terminal("device selection")?;
            return pick_device(workflow);
        }
        CreateOutput::Multiplex { parent, channels } => OutputSelection::Multiplex {
            parent_id: OutputId::new(parent),
            channels,
        },
        CreateOutput::Icecast { endpoint, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            OutputSelection::Icecast {
                endpoint,
                password: SecretString::from(password),
            }
        }
    }))
}

fn prompt_password() -> Result<String, CliError> {
    util::require_terminal("icecast password prompt")?;
    rpassword::prompt_password("Icecast source password: ").map_err(prompt_err)
}

/// Walk the user through the creation dialog. `None` when they back out.
fn prompt_selection(workflow: &NewOutputWorkflow) -> Result<Option<OutputSelection>, CliError> {
    util::require_terminal("interactive output creation")?;

    let kinds = ["Sound device", "Multiplex of a device", "Icecast stream"];
    let Some(kind) = Select::new()
        .with_prompt("Output type (Esc to cancel)")
        .items(&kinds[..])
        .default(0)
        .interact_opt()
        .map_err(prompt_err)?
    else {
        return Ok(None);
    };

    match kind {
        0 => pick_device(workflow),

        1 => {
            let parents: Vec<(OutputId, String)> = workflow
                .parents()
                .iter()
                .filter_map(|o| o.id().map(|id| (id.clone(), format!("{} ({id})", o.label()))))
                .collect();
            if parents.is_empty() {
                return Err(CliError::Validation {
                    field: "parent".into(),
                    reason: "no device outputs to multiplex; create one first".into(),
                });
            }
            let labels: Vec<&str> = parents.iter().map(|(_, l)| l.as_str()).collect();
            let Some((parent_id, _)) = Select::new()
                .with_prompt("Parent output")
                .items(labels.as_slice())
                .default(0)
                .interact_opt()
                .map_err(prompt_err)?
                .and_then(|i| parents.get(i))
            else {
                return Ok(None);
            };

            let channels: String = Input::new()
                .with_prompt("Channels (e.g. 0,1)")
                .interact_text()
                .map_err(prompt_err)?;

            Ok(Some(OutputSelection::Multiplex {
                parent_id: parent_id.clone(),
                channels,
            }))
        }

        _ => {
            let endpoint: String = Input::new()
                .with_prompt("Icecast mount URL")
                .validate_with(|s: &String| -> Result<(), String> {
                    url::Url::parse(s).map(|_| ()).map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;
            let password = prompt_password()?;

            Ok(Some(OutputSelection::Icecast {
                endpoint,
                password: SecretString::from(password),
            }))
        }
    }
}

fn pick_device(workflow: &NewOutputWorkflow) -> Result<Option<OutputSelection>, CliError> {
    let devices = workflow.devices();
    if devices.is_empty() {
        return Err(CliError::Validation {
            field: "device".into(),
            reason: "the backend reports no available devices".into(),
        });
    }
    let picked = Select::new()
        .with_prompt("Device (Esc to cancel)")
        .items(devices)
        .default(0)
        .interact_opt()
        .map_err(prompt_err)?;
    Ok(picked
        .and_then(|i| devices.get(i))
        .map(|name| OutputSelection::Device { name: name.clone() }))
}

// ── Watch ───────────────────────────────────────────────────────────

async fn watch(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.connect().await?;
    let mut stream = session.outputs();
    print_snapshot(global, stream.current())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = stream.changed() => match next {
                Some(snap) => print_snapshot(global, &snap)?,
                None => break,
            },
        }
    }
    Ok(())
}

fn print_snapshot(global: &GlobalOpts, snap: &[Arc<Output>]) -> Result<(), CliError> {
    if global.output == OutputFormat::Table && !global.quiet {
        eprintln!(
            "── {} outputs @ {}",
            snap.len(),
            chrono::Local::now().format("%H:%M:%S")
        );
    }
    // Streamed JSON is one document per line.
    let format = match global.output {
        OutputFormat::Json => OutputFormat::JsonCompact,
        other => other,
    };
    let out = render_outputs(format, snap)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
