mod app;
mod cli;
mod completions;
mod debounce;
mod domain;
mod imports;
mod notify;
mod repo;
mod search;
mod store;
mod sync;
mod tree;
mod ui;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{CatSubcommands, Commands};

    let cli = cli::Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        let shell = match args.shell.as_deref() {
            Some(name) => completions::parse_shell_name(name).ok_or_else(|| {
                app::AppError::InvalidArgument(format!("unsupported shell '{name}'"))
            })?,
            None => completions::detect_current_shell().ok_or_else(|| {
                app::AppError::InvalidArgument(
                    "could not detect the current shell; pass one explicitly".to_string(),
                )
            })?,
        };
        completions::generate_completions(shell, &mut std::io::stdout());
        return Ok(());
    }

    let mut app = app::App::open(&cli.db)?;
    let palette = ui::Palette::auto();

    match cli.command {
        Commands::Add(args) => {
            let prompt = app.create_prompt(app::NewPromptInput {
                title: args.title,
                content: args.content.unwrap_or_default(),
                category_id: args.category,
                tags: args.tags,
                is_guide: args.guide,
            })?;
            println!("added {} {}", palette.id(&prompt.id), prompt.title);
        }
        Commands::Edit(args) => {
            let guide = if args.guide {
                Some(true)
            } else if args.no_guide {
                Some(false)
            } else {
                None
            };
            let patch = app::UpdatePromptPatch {
                title: args.title,
                content: args.content,
                category: args.category,
                uncategorize: args.uncategorize,
                add_tags: args.add_tags,
                remove_tags: args.remove_tags,
                guide,
            };
            let prompt = app.update_prompt(&args.id, patch)?;
            println!("updated {} {}", palette.id(&prompt.id), prompt.title);
        }
        Commands::Rm(args) => {
            let prompt = app.remove_prompt(&args.id)?;
            println!(
                "removed {} from its category (now uncategorized)",
                palette.id(&prompt.id)
            );
        }
        Commands::Purge(args) => {
            app.purge_prompt(&args.id)?;
            println!("purged {}", palette.id(&args.id));
        }
        Commands::Show(args) => match app.show_prompt(&args.id) {
            Some(prompt) => {
                if args.json {
                    print_json(&prompt);
                } else {
                    ui::print_prompt_show(&prompt);
                }
            }
            None => return Err(app::AppError::NotFound(format!("prompt '{}'", args.id))),
        },
        Commands::Ls(args) => {
            let snapshot = app.tree_snapshot();
            if args.json {
                print_json(&snapshot);
            } else {
                ui::print_tree(&snapshot);
            }
        }
        Commands::Search(args) => {
            let results = app.search(&args.term);
            if args.json {
                print_json(&results);
            } else {
                ui::print_search_results(&args.term, &results);
            }
        }
        Commands::Cat(args) => match args.command {
            CatSubcommands::Add(cat_args) => {
                let category = app.create_category(app::CategoryInput {
                    name: Some(cat_args.name),
                    description: cat_args.description,
                    icon: cat_args.icon,
                    sort_order: cat_args.sort_order,
                })?;
                println!("created {} {}", palette.id(&category.id), category.name);
            }
            CatSubcommands::Set(cat_args) => {
                let category = app.update_category(
                    &cat_args.id,
                    app::CategoryInput {
                        name: cat_args.name,
                        description: cat_args.description,
                        icon: cat_args.icon,
                        sort_order: cat_args.sort_order,
                    },
                )?;
                println!("updated {} {}", palette.id(&category.id), category.name);
            }
            CatSubcommands::Rm(cat_args) => {
                app.remove_category(&cat_args.id)?;
                println!(
                    "deleted category {}; its prompts are now uncategorized",
                    palette.id(&cat_args.id)
                );
            }
            CatSubcommands::Ls(cat_args) => {
                let categories = app.list_categories();
                if let Some(fault) = categories.fault.as_deref() {
                    eprintln!("warning: store read degraded: {fault}");
                }
                if cat_args.json {
                    print_json(&categories.value);
                } else {
                    ui::print_categories(&categories.value);
                }
            }
        },
        Commands::Export(args) => match args.output {
            Some(path) => {
                let document = app.export_to_file(&path)?;
                println!(
                    "exported {} prompt(s), {} categorie(s) to {}",
                    document.prompts.len(),
                    document.categories.len(),
                    path.display()
                );
            }
            None => print_json(&app.export_document()?),
        },
        Commands::Import(args) => {
            let summary = app.import_from_file(&args.file)?;
            if args.json {
                print_json(&summary);
            } else {
                println!(
                    "imported {} prompt(s) ({} skipped), {} categorie(s)",
                    summary.prompts_imported, summary.prompts_skipped, summary.categories_imported
                );
            }
        }
        Commands::Stats(args) => {
            let stats = app.stats(args.top);
            if args.json {
                print_json(&stats.value);
            } else {
                ui::print_stats(&stats.value, stats.fault.as_deref());
            }
        }
        Commands::Pull(args) => {
            let outcome = app.pull()?;
            if args.json {
                print_json(&outcome);
            }
            if !outcome.success {
                return Err(sync_failure("pull", &outcome));
            }
        }
        Commands::Push(args) => {
            let outcome = app.push()?;
            if args.json {
                print_json(&outcome);
            }
            if !outcome.success {
                return Err(sync_failure("push", &outcome));
            }
        }
        Commands::Reset(args) => {
            if !args.force {
                return Err(app::AppError::InvalidArgument(
                    "reset wipes all local data; pass --force to confirm".to_string(),
                ));
            }
            app.reset()?;
            println!("cleared all data and reseeded the default dataset");
        }
        Commands::Completions(_) => {
            unreachable!("completions are handled before app initialization")
        }
    }

    Ok(())
}

fn sync_failure(action: &str, outcome: &sync::SyncOutcome) -> app::AppError {
    let detail = outcome
        .error
        .as_deref()
        .unwrap_or("remote sync failed")
        .to_string();
    let code = outcome.error_code.as_deref().unwrap_or("UNKNOWN");
    app::AppError::InvalidArgument(format!("{action} failed ({code}): {detail}"))
}
