//! Volume CLI commands: ls, create, edit, info, rm, render, generate.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::cli::display::{
    action_success, colorize_value, list_table, output, render_list, truncate, CommandOutput,
    DetailView,
};
use crate::cli::types::{CreateArgs, EditArgs, GenerateArgs, NameArgs, RenderArgs, RmArgs};
use crate::cli::{parse_pairs, CliContext};
use crate::domain::models::{AppConfig, VolumeMetadata};
use crate::services::{parse_create_options, VolumeCatalog};

#[derive(Debug, Serialize)]
pub struct VolumeListOutput {
    pub volumes: Vec<VolumeMetadata>,
    pub total: usize,
}

impl CommandOutput for VolumeListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "version", "env", "keys", "files"]);
        for v in &self.volumes {
            table.add_row(vec![
                v.id.clone(),
                v.name.clone(),
                v.version.clone(),
                v.env.clone(),
                v.keys.to_string(),
                v.files.to_string(),
            ]);
        }
        render_list("volume", table, self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct TemplateOutput {
    pub name: String,
    pub sha256: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct VolumeDetailOutput {
    #[serde(flatten)]
    pub metadata: VolumeMetadata,
    pub keys: BTreeMap<String, String>,
    pub templates: Vec<TemplateOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&AppConfig> for VolumeDetailOutput {
    fn from(config: &AppConfig) -> Self {
        Self {
            metadata: config.metadata(),
            keys: config.bindings().into_iter().collect(),
            templates: config
                .templates()
                .iter()
                .map(|t| TemplateOutput {
                    name: t.name().to_string(),
                    sha256: t.content_hash().to_string(),
                    size: t.body().len(),
                })
                .collect(),
            note: None,
        }
    }
}

impl CommandOutput for VolumeDetailOutput {
    fn to_human(&self) -> String {
        let m = &self.metadata;
        let mut view = DetailView::new(&m.id)
            .field("Name", &m.name)
            .field("Version", &m.version)
            .field("Env", &m.env)
            .section(&format!("Keys ({})", self.keys.len()));
        for (key, value) in &self.keys {
            view = view.item(&format!("{key} = {}", colorize_value(&truncate(value, 60))));
        }
        view = view.section(&format!("Templates ({})", self.templates.len()));
        for t in &self.templates {
            view = view.item(&format!("{} ({} bytes, {})", t.name, t.size, &t.sha256[..12]));
        }

        let mut out = view.render();
        if let Some(note) = &self.note {
            out.push_str("\n\n");
            out.push_str(note);
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub struct ActionOutput {
    pub success: bool,
    pub message: String,
}

impl CommandOutput for ActionOutput {
    fn to_human(&self) -> String {
        action_success(&self.message)
    }
}

#[derive(Debug, Serialize)]
pub struct RenderOutput {
    pub id: String,
    pub files: BTreeMap<String, String>,
}

impl CommandOutput for RenderOutput {
    fn to_human(&self) -> String {
        if self.files.is_empty() {
            return format!("{} has no templates.", self.id);
        }
        self.files
            .iter()
            .map(|(name, body)| format!("==> {name} <==\n{body}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn ls(ctx: &CliContext) -> Result<()> {
    let out = list_volumes(ctx)?;
    output(&out, ctx.json);
    Ok(())
}

pub fn list_volumes(ctx: &CliContext) -> Result<VolumeListOutput> {
    let catalog = VolumeCatalog::new(ctx.backend.clone());
    let volumes: Vec<VolumeMetadata> = catalog
        .list()
        .context("Failed to list volumes")?
        .values()
        .map(AppConfig::metadata)
        .collect();
    Ok(VolumeListOutput {
        total: volumes.len(),
        volumes,
    })
}

pub fn create(ctx: &CliContext, args: CreateArgs) -> Result<()> {
    let out = create_volume(ctx, &args)?;
    output(&out, ctx.json);
    Ok(())
}

pub fn create_volume(ctx: &CliContext, args: &CreateArgs) -> Result<VolumeDetailOutput> {
    let mut config = AppConfig::open(&args.name, ctx.backend.clone())
        .with_context(|| format!("Failed to open volume {}", args.name))?;
    if config.exists()? {
        bail!("volume {} already exists; use 'voletc edit' to change it", args.name);
    }

    let data = parse_create_options(parse_pairs(&args.pairs)?)?;
    config.set(data)?;

    let mut out = VolumeDetailOutput::from(&config);
    if args.dry_run {
        out.note = Some("dry run: nothing written".to_string());
    } else {
        config.commit().context("Failed to commit volume")?;
    }
    Ok(out)
}

pub fn edit(ctx: &CliContext, args: EditArgs) -> Result<()> {
    let out = edit_volume(ctx, &args)?;
    output(&out, ctx.json);
    Ok(())
}

pub fn edit_volume(ctx: &CliContext, args: &EditArgs) -> Result<VolumeDetailOutput> {
    if args.pairs.is_empty() {
        bail!("nothing to change: pass at least one key=value");
    }
    let catalog = VolumeCatalog::new(ctx.backend.clone());
    let mut config = catalog.get(&args.name)?;

    let data = parse_create_options(parse_pairs(&args.pairs)?)?;
    config.set(data)?;

    let mut out = VolumeDetailOutput::from(&config);
    if args.dry_run {
        out.note = Some("dry run: nothing written".to_string());
    } else {
        config.commit().context("Failed to commit volume")?;
    }
    Ok(out)
}

pub fn info(ctx: &CliContext, args: NameArgs) -> Result<()> {
    let catalog = VolumeCatalog::new(ctx.backend.clone());
    let config = catalog.get(&args.name)?;
    output(&VolumeDetailOutput::from(&config), ctx.json);
    Ok(())
}

pub fn rm(ctx: &CliContext, args: RmArgs) -> Result<()> {
    if !args.yes && !confirm(&format!("Remove volume {}?", args.name))? {
        println!("Aborted.");
        return Ok(());
    }
    let out = remove_volume(ctx, &args)?;
    output(&out, ctx.json);
    Ok(())
}

pub fn remove_volume(ctx: &CliContext, args: &RmArgs) -> Result<ActionOutput> {
    let catalog = VolumeCatalog::new(ctx.backend.clone());
    let config = catalog.get(&args.name)?;

    let message = if args.purge_templates {
        if config.destroy_purging_templates()? {
            format!("Removed {} and its templates", args.name)
        } else {
            format!("Removed {} (templates still used by other environments)", args.name)
        }
    } else {
        config.destroy()?;
        format!("Removed {}", args.name)
    };

    Ok(ActionOutput {
        success: true,
        message,
    })
}

pub fn render(ctx: &CliContext, args: RenderArgs) -> Result<()> {
    let out = render_volume(ctx, &args)?;
    output(&out, ctx.json);
    Ok(())
}

/// Render in memory; an unknown volume renders from the given pairs alone.
pub fn render_volume(ctx: &CliContext, args: &RenderArgs) -> Result<RenderOutput> {
    let mut config = AppConfig::open(&args.name, ctx.backend.clone())?;
    let data = parse_create_options(parse_pairs(&args.pairs)?)?;
    config.set(data)?;

    let files = config
        .render_all()?
        .into_iter()
        .map(|(name, body)| (name, String::from_utf8_lossy(&body).into_owned()))
        .collect();
    Ok(RenderOutput {
        id: config.qualified_name(),
        files,
    })
}

pub fn generate(ctx: &CliContext, args: GenerateArgs) -> Result<()> {
    let catalog = VolumeCatalog::new(ctx.backend.clone());
    let mut config = catalog.get(&args.name)?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create {}", args.dir.display()))?;
    config
        .generate(&args.dir)
        .with_context(|| format!("Failed to generate {}", args.name))?;

    let out = ActionOutput {
        success: true,
        message: format!(
            "Generated {} file(s) for {} in {}",
            config.templates().len(),
            args.name,
            args.dir.display()
        ),
    };
    output(&out, ctx.json);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
