//! Category management CLI commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use catalog_core::config::{AppConfig, DeletePolicy};
use catalog_core::error::AppError;
use catalog_core::types::{CategoryId, PageRequest};
use catalog_entity::{Category, CategoryNode, CategoryQuery, EntityKind, NewCategory, ParentFilter};
use catalog_service::RequestContext;

/// Arguments for category commands
#[derive(Debug, Args)]
pub struct CategoryArgs {
    /// Category subcommand
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category subcommands
#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// List categories of one kind
    List {
        /// Entity kind (lodging, product, service, business, filing)
        #[arg(short, long)]
        kind: String,
        /// Only direct children of this category
        #[arg(short, long, conflicts_with = "roots")]
        parent_id: Option<String>,
        /// Only root categories
        #[arg(long)]
        roots: bool,
        /// Include inactive categories
        #[arg(long)]
        all: bool,
        /// Free-text search over name, description and web tags
        #[arg(short, long)]
        search: Option<String>,
        /// Sort expression, e.g. "name desc"
        #[arg(long)]
        sort: Option<String>,
        /// Page number
        #[arg(long, default_value = "1")]
        page: u64,
        /// Page size
        #[arg(long, default_value = "50")]
        page_size: u64,
    },
    /// Show one category with its path from the root
    Show {
        /// Category ID
        id: String,
    },
    /// Create a new category
    Create {
        /// Entity kind
        #[arg(short, long)]
        kind: String,
        /// Category name
        #[arg(short, long)]
        name: String,
        /// Parent category ID (omit for root)
        #[arg(short, long)]
        parent_id: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Highlight in listings
        #[arg(long)]
        featured: bool,
        /// Show in the main menu
        #[arg(long)]
        menu: bool,
    },
    /// Show the category tree of one kind
    Tree {
        /// Entity kind
        #[arg(short, long)]
        kind: String,
        /// Include inactive categories
        #[arg(long)]
        all: bool,
    },
    /// Hide a category
    Deactivate {
        /// Category ID
        id: String,
    },
    /// Show a hidden category again
    Reactivate {
        /// Category ID
        id: String,
    },
    /// Move a category under another parent
    Move {
        /// Category ID
        id: String,
        /// New parent ID (omit to move to the root)
        #[arg(short, long)]
        parent_id: Option<String>,
        /// Expected version (defaults to the current one)
        #[arg(long)]
        version: Option<i64>,
    },
    /// Delete a category
    Delete {
        /// Category ID
        id: String,
        /// What happens to sub-categories and linked entities
        #[arg(long, value_enum)]
        policy: Option<DeletePolicyArg>,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Delete policy as accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeletePolicyArg {
    /// Refuse while sub-categories or linked entities exist
    Restrict,
    /// Move sub-categories to the root
    ReparentToRoot,
    /// Move sub-categories to the deleted category's parent
    ReparentToParent,
}

impl From<DeletePolicyArg> for DeletePolicy {
    fn from(arg: DeletePolicyArg) -> Self {
        match arg {
            DeletePolicyArg::Restrict => Self::Restrict,
            DeletePolicyArg::ReparentToRoot => Self::ReparentToRoot,
            DeletePolicyArg::ReparentToParent => Self::ReparentToParent,
        }
    }
}

/// Category display row
#[derive(Debug, Serialize, Tabled)]
struct CategoryRow {
    /// Category ID
    id: String,
    /// Name
    name: String,
    /// Parent ID
    parent: String,
    /// Active flag
    active: bool,
    /// Featured flag
    featured: bool,
    /// Version
    version: i64,
    /// Updated at
    updated_at: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            parent: c.parent_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
            active: c.active,
            featured: c.featured,
            version: c.version,
            updated_at: c.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute category commands
pub async fn execute(
    args: &CategoryArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (db, catalog) = super::connect_catalog(config).await?;
    let ctx = RequestContext::new("cli");

    match &args.command {
        CategoryCommand::List {
            kind,
            parent_id,
            roots,
            all,
            search,
            sort,
            page,
            page_size,
        } => {
            let parent = match (parent_id, roots) {
                (Some(id), _) => ParentFilter::Of(parse_id(id)?),
                (None, true) => ParentFilter::Root,
                (None, false) => ParentFilter::Any,
            };
            let mut query = CategoryQuery {
                parent,
                active: (!all).then_some(true),
                search: search.clone(),
                page: PageRequest::new(*page, *page_size),
                ..CategoryQuery::for_kind(kind.parse()?)
            };
            if let Some(expr) = sort {
                query = query.sorted_by(expr)?;
            }

            let result = catalog.categories.list(&query).await?;
            let rows: Vec<CategoryRow> = result.items.iter().map(CategoryRow::from).collect();
            output::print_list(&rows, format);
            if format == OutputFormat::Table && result.total_pages > 1 {
                println!(
                    "Page {} of {} ({} categories)",
                    result.page, result.total_pages, result.total_items
                );
            }
        }
        CategoryCommand::Show { id } => {
            let id = parse_id(id)?;
            let category = catalog.categories.get_with_files(id).await?;
            let path: Vec<String> = catalog
                .trees
                .breadcrumbs(id)
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect();
            match format {
                OutputFormat::Json => output::print_json(&category),
                OutputFormat::Table => {
                    output::print_kv("ID", &category.id.to_string());
                    output::print_kv("Kind", category.kind.as_str());
                    output::print_kv("Path", &path.join(" / "));
                    output::print_kv("Active", &category.active.to_string());
                    output::print_kv("Version", &category.version.to_string());
                    output::print_kv("Web tags", &category.web_tag_slugs().join(", "));
                    output::print_kv("Attachments", &category.files.len().to_string());
                }
            }
        }
        CategoryCommand::Create {
            kind,
            name,
            parent_id,
            description,
            featured,
            menu,
        } => {
            let mut new = NewCategory::new(kind.parse::<EntityKind>()?, name.as_str());
            new.parent_id = parent_id.as_deref().map(parse_id).transpose()?;
            new.description = description.clone();
            new.featured = *featured;
            new.display_in_main_menu = *menu;

            let category = catalog.categories.create(&ctx, new).await?;
            output::print_success(&format!(
                "Category '{}' created (id: {})",
                category.name, category.id
            ));
        }
        CategoryCommand::Tree { kind, all } => {
            let nodes = catalog.trees.tree(kind.parse()?, !all).await?;
            match format {
                OutputFormat::Json => output::print_json(&nodes),
                OutputFormat::Table => {
                    if nodes.is_empty() {
                        println!("No categories.");
                    }
                    for node in &nodes {
                        print_node(node);
                    }
                }
            }
        }
        CategoryCommand::Deactivate { id } => {
            let category = catalog.categories.deactivate(&ctx, parse_id(id)?).await?;
            output::print_success(&format!("Category '{}' deactivated", category.name));
        }
        CategoryCommand::Reactivate { id } => {
            let category = catalog.categories.reactivate(&ctx, parse_id(id)?).await?;
            output::print_success(&format!("Category '{}' reactivated", category.name));
        }
        CategoryCommand::Move {
            id,
            parent_id,
            version,
        } => {
            let id = parse_id(id)?;
            let new_parent = parent_id.as_deref().map(parse_id).transpose()?;
            let version = match version {
                Some(v) => *v,
                None => catalog.categories.get(id).await?.version,
            };
            let category = catalog
                .categories
                .reparent(&ctx, id, new_parent, version)
                .await?;
            output::print_success(&format!(
                "Category '{}' moved (version {})",
                category.name, category.version
            ));
        }
        CategoryCommand::Delete { id, policy, force } => {
            let id = parse_id(id)?;
            let category = catalog.categories.get(id).await?;

            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!("Delete category '{}'?", category.name))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                if !confirm {
                    output::print_warning("Cancelled.");
                    db.close().await;
                    return Ok(());
                }
            }

            let outcome = catalog
                .categories
                .delete(&ctx, id, policy.map(DeletePolicy::from))
                .await?;
            match format {
                OutputFormat::Json => output::print_json(&outcome),
                OutputFormat::Table => {
                    output::print_success(&format!("Category '{}' deleted", category.name));
                    output::print_kv("Moved sub-categories", &outcome.moved_children.to_string());
                    output::print_kv("Removed entity links", &outcome.removed_links.to_string());
                    output::print_kv(
                        "Removed attachments",
                        &outcome.removed_attachments.to_string(),
                    );
                }
            }
        }
    }

    db.close().await;
    Ok(())
}

fn parse_id(raw: &str) -> Result<CategoryId, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::validation(format!("Invalid category ID '{raw}': {e}")))
}

fn print_node(node: &CategoryNode) {
    let indent = "  ".repeat(node.depth as usize);
    let marker = if node.active { "" } else { " (inactive)" };
    println!(
        "{indent}├── {} [{} entities]{marker}",
        node.name, node.entity_count
    );
    for child in &node.children {
        print_node(child);
    }
}
