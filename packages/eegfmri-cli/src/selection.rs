//! Turns command-line arguments and menu answers into a query and a step selection.

use crate::cli::Cli;
use crate::menu::{InteractiveMenu, Prompt};
use eegfmri_clean::{
    CleanError, Dataset, DatasetQuery, Entity, EntityFilter, PipelineConfig, Result, Step,
    StepSelection,
};
use std::path::PathBuf;

/// Entities offered in interactive mode when no filter was given for them.
const MENU_ENTITIES: [Entity; 4] = [Entity::Subject, Entity::Session, Entity::Task, Entity::Run];

/// Where cleaned outputs go: `--output-dir`, else the configured or default derivatives root.
pub fn derivatives_root(cli: &Cli, config: &PipelineConfig) -> PathBuf {
    cli.output_dir
        .clone()
        .unwrap_or_else(|| config.derivatives_root(&cli.root))
}

/// Build the file query from command-line filters. Outputs are never indexed as inputs.
pub fn build_query(cli: &Cli, config: &PipelineConfig) -> Result<DatasetQuery> {
    DatasetQuery::new(&cli.root)
        .with_data_folder(cli.datafolder.map(Into::into))
        .with_excluded_dir(derivatives_root(cli, config))
        .with_recording_extensions(config.recording_extensions.clone())
        .with_filter_str(Entity::Subject, cli.subject.as_deref())?
        .with_filter_str(Entity::Session, cli.session.as_deref())?
        .with_filter_str(Entity::Task, cli.task.as_deref())?
        .with_filter_str(Entity::Run, cli.run.as_deref())?
        .with_filter_str(Entity::Datatype, Some(cli.datatype.as_str()))?
        .with_filter_str(Entity::Suffix, Some(cli.suffix.as_str()))?
        .with_filter_str(Entity::Description, cli.description.as_deref())?
        .with_filter_str(Entity::Extension, cli.extension.as_deref())
}

/// Steps from flags, or from the step menu in interactive mode with flags preselected.
pub fn resolve_steps(cli: &Cli, prompt: &mut dyn Prompt) -> Result<StepSelection> {
    let flags = StepSelection::from_flags(cli.gradient, cli.bcg, cli.qc);
    if !cli.interactive {
        return flags.validate();
    }

    let entries: Vec<String> = Step::ALL
        .iter()
        .map(|step| format!("{} ({})", step.metadata().title, step.name()))
        .collect();
    let indices = prompt.multi_select(
        "Select the cleaning steps (space: toggle, enter: confirm)",
        &entries,
        &flags.indices(),
    )?;

    let mut selection = StepSelection::default();
    for index in indices {
        let step = Step::ALL
            .get(index)
            .copied()
            .ok_or_else(|| CleanError::Menu(format!("invalid menu index {}", index)))?;
        selection.set(step, true);
    }
    selection.validate()
}

/// Ask for the values of every menu entity the command line left open.
pub fn refine_interactively(
    prompt: &mut dyn Prompt,
    dataset: &Dataset,
    mut query: DatasetQuery,
) -> Result<DatasetQuery> {
    for entity in MENU_ENTITIES {
        if query.filter(entity).is_some() {
            continue;
        }
        let values = dataset.entity_values(entity);
        if values.is_empty() {
            log::debug!("No {} values in dataset, skipping menu", entity);
            continue;
        }

        let chosen = InteractiveMenu::for_entity(entity, values).run(prompt, &[])?;
        if chosen.is_empty() {
            return Err(CleanError::Configuration(format!(
                "No {} selected",
                entity
            )));
        }
        log::info!("Selected {}: {}", entity, chosen.join(", "));
        query = query.with_filter(entity, EntityFilter::from_values(chosen));
    }
    Ok(query)
}
